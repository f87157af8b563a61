pub mod header;
pub mod html;
pub mod markdown;
pub mod yaml;

pub use header::Header;

use crate::error::Result;

/// A source file split into header attributes and an HTML body.
#[derive(Debug, Clone, Default)]
pub struct ParsedContent {
    pub header: Header,
    pub body: String,
}

/// A markup engine turning one source file into header + body.
pub trait Parser: Send + Sync {
    /// Short engine name used in logs.
    fn name(&self) -> &'static str;

    /// Lowercase file extensions this parser owns, without the dot.
    fn extensions(&self) -> &'static [&'static str];

    /// Check if this parser can handle the given file extension
    fn can_parse(&self, extension: &str) -> bool {
        self.extensions().contains(&extension)
    }

    /// Parse document content into header and rendered body
    fn parse(&self, content: &str, path: &str) -> Result<ParsedContent>;
}

/// Extension → parser table, fixed at startup.
pub struct ParserRegistry {
    parsers: Vec<Box<dyn Parser>>,
}

impl ParserRegistry {
    /// Registry with every built-in engine.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(markdown::MarkdownParser::default()));
        registry.register(Box::new(html::HtmlParser));
        registry.register(Box::new(yaml::YamlParser));
        registry
    }

    /// Registry with no engines.
    pub fn empty() -> Self {
        Self { parsers: Vec::new() }
    }

    /// Register a parser. Earlier registrations win for shared extensions.
    pub fn register(&mut self, parser: Box<dyn Parser>) {
        for ext in parser.extensions() {
            if let Some(existing) = self.find_parser(ext) {
                log::warn!(
                    "Extension .{} already handled by {}; {} will not see it",
                    ext,
                    existing.name(),
                    parser.name()
                );
            }
        }
        self.parsers.push(parser);
    }

    /// Find a parser that can handle the given extension
    pub fn find_parser(&self, extension: &str) -> Option<&dyn Parser> {
        self.parsers
            .iter()
            .find(|p| p.can_parse(extension))
            .map(|p| p.as_ref())
    }

    pub fn supports(&self, extension: &str) -> bool {
        self.find_parser(extension).is_some()
    }

    /// Every registered extension, in registration order.
    pub fn extensions(&self) -> Vec<&'static str> {
        self.parsers.iter().flat_map(|p| p.extensions().iter().copied()).collect()
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Shadow;

    impl Parser for Shadow {
        fn name(&self) -> &'static str {
            "shadow"
        }
        fn extensions(&self) -> &'static [&'static str] {
            &["md", "txt"]
        }
        fn parse(&self, content: &str, _path: &str) -> Result<ParsedContent> {
            Ok(ParsedContent { header: Header::new(), body: content.to_string() })
        }
    }

    #[test]
    fn test_parser_registry() {
        let registry = ParserRegistry::new();

        assert!(registry.supports("md"));
        assert!(registry.supports("markdown"));
        assert!(registry.supports("html"));
        assert!(registry.supports("yaml"));
        assert!(registry.supports("yml"));
        assert!(!registry.supports("txt"));
        assert!(!registry.supports("png"));
    }

    #[test]
    fn test_first_registration_wins() {
        let mut registry = ParserRegistry::new();
        registry.register(Box::new(Shadow));
        assert_eq!(registry.find_parser("md").unwrap().name(), "markdown");
        assert_eq!(registry.find_parser("txt").unwrap().name(), "shadow");
        assert!(registry.extensions().contains(&"txt"));
    }

    #[test]
    fn test_empty_registry() {
        let registry = ParserRegistry::empty();
        assert!(registry.find_parser("md").is_none());
        assert!(registry.extensions().is_empty());
    }
}
