use super::{Parser, ParsedContent, header};
use crate::error::Result;

/// Raw HTML engine: the body after the header is passed through untouched.
pub struct HtmlParser;

impl Parser for HtmlParser {
    fn name(&self) -> &'static str {
        "html"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["html", "htm"]
    }

    fn parse(&self, content: &str, path: &str) -> Result<ParsedContent> {
        let (header, body) = header::split_header(content, path)?;
        Ok(ParsedContent {
            header,
            body: body.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_html_body_passthrough() {
        let content = "title=Contact\nstatus=published\n~~~~~~\n<div class=\"x\">Mail us</div>\n";
        let result = HtmlParser.parse(content, "contact.html").unwrap();
        assert_eq!(result.header["status"], json!("published"));
        assert_eq!(result.body, "<div class=\"x\">Mail us</div>\n");
    }
}
