use super::{Parser, ParsedContent, header};
use crate::error::{KilnError, Result};
use serde_json::Value;

/// YAML engine: the file is one mapping; its `body` key holds the content.
pub struct YamlParser;

impl Parser for YamlParser {
    fn name(&self) -> &'static str {
        "yaml"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["yaml", "yml"]
    }

    fn parse(&self, content: &str, path: &str) -> Result<ParsedContent> {
        let mut header = header::parse_yaml_header(content, path)?;

        let body = match header.remove("body") {
            None => String::new(),
            Some(Value::String(s)) => s,
            Some(other) => {
                return Err(KilnError::Parse(format!(
                    "'body' in {} must be a string, found {}",
                    path, other
                )))
            }
        };

        Ok(ParsedContent { header, body })
    }
}
