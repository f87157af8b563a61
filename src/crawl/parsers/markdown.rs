use super::{Parser, ParsedContent, header};
use crate::error::Result;
use pulldown_cmark::{Options, Parser as CmarkParser, html};

/// Markdown engine: header block or front matter, body rendered to HTML.
pub struct MarkdownParser {
    options: Options,
}

impl Default for MarkdownParser {
    fn default() -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        options.insert(Options::ENABLE_HEADING_ATTRIBUTES);
        Self { options }
    }
}

impl Parser for MarkdownParser {
    fn name(&self) -> &'static str {
        "markdown"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["md", "markdown"]
    }

    fn parse(&self, content: &str, path: &str) -> Result<ParsedContent> {
        let (header, body) = header::split_header(content, path)?;

        let mut rendered = String::with_capacity(body.len() * 3 / 2);
        html::push_html(&mut rendered, CmarkParser::new_ext(body, self.options));

        Ok(ParsedContent { header, body: rendered })
    }
}
