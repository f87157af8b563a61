//! Content headers shared by the markup parsers.
//!
//! Two layouts are recognised at the top of a file:
//!
//! ```text
//! title=Hello              ---
//! type=post                title: Hello
//! status=published         type: post
//! ~~~~~~                   ---
//! body...                  body...
//! ```
//!
//! A file with neither layout has an empty header and its whole text is the body.

use std::collections::BTreeMap;

use serde_json::Value;
use serde_yaml_ng::Value as YamlValue;

use crate::error::{KilnError, Result};

/// Line terminating a `key=value` header block.
pub const HEADER_SEPARATOR: &str = "~~~~~~";

/// Header attributes keyed by trimmed name, case preserved.
pub type Header = BTreeMap<String, Value>;

/// Split `content` into its header and body.
pub fn split_header<'a>(content: &'a str, path: &str) -> Result<(Header, &'a str)> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);

    if let Some(rest) = strip_line(content, "---") {
        if let Some((yaml, body)) = split_at_line(rest, "---") {
            let header = parse_yaml_header(yaml, path)?;
            return Ok((header, body));
        }
    }

    if let Some((block, body)) = split_at_line(content, HEADER_SEPARATOR) {
        if let Some(header) = parse_properties(block) {
            return Ok((header, body));
        }
    }

    Ok((Header::new(), content))
}

/// Parse a YAML mapping into header attributes.
pub fn parse_yaml_header(yaml: &str, path: &str) -> Result<Header> {
    if yaml.trim().is_empty() {
        return Ok(Header::new());
    }
    let value: YamlValue = serde_yaml_ng::from_str(yaml)
        .map_err(|e| KilnError::Parse(format!("YAML header error in {}: {}", path, e)))?;

    match value {
        YamlValue::Mapping(map) => {
            let mut header = Header::new();
            for (key, value) in map {
                let key = match key {
                    YamlValue::String(s) => s,
                    YamlValue::Number(n) => n.to_string(),
                    YamlValue::Bool(b) => b.to_string(),
                    _ => {
                        return Err(KilnError::Parse(format!(
                            "unsupported header key type in {}",
                            path
                        )))
                    }
                };
                header.insert(key.trim().to_string(), yaml_to_json(value));
            }
            Ok(header)
        }
        YamlValue::Null => Ok(Header::new()),
        _ => Err(KilnError::Parse(format!("header in {} is not a mapping", path))),
    }
}

/// `key=value` lines; `None` when any non-blank line lacks an `=`.
fn parse_properties(block: &str) -> Option<Header> {
    let mut header = Header::new();
    for line in block.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (key, value) = line.split_once('=')?;
        let key = key.trim().to_string();
        if key.is_empty() {
            return None;
        }
        header.insert(key, Value::String(value.trim().to_string()));
    }
    Some(header)
}

pub fn yaml_to_json(value: YamlValue) -> Value {
    match value {
        YamlValue::Null => Value::Null,
        YamlValue::Bool(b) => Value::Bool(b),
        YamlValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                n.as_f64()
                    .and_then(serde_json::Number::from_f64)
                    .map(Value::Number)
                    .unwrap_or(Value::Null)
            }
        }
        YamlValue::String(s) => Value::String(s),
        YamlValue::Sequence(seq) => Value::Array(seq.into_iter().map(yaml_to_json).collect()),
        YamlValue::Mapping(map) => {
            let object = map
                .into_iter()
                .map(|(k, v)| {
                    let key = match k {
                        YamlValue::String(s) => s,
                        YamlValue::Number(n) => n.to_string(),
                        YamlValue::Bool(b) => b.to_string(),
                        _ => "key".to_string(),
                    };
                    (key, yaml_to_json(v))
                })
                .collect();
            Value::Object(object)
        }
        YamlValue::Tagged(tagged) => yaml_to_json(tagged.value),
    }
}

/// Strip a first line equal to `marker` (ignoring trailing whitespace).
fn strip_line<'a>(content: &'a str, marker: &str) -> Option<&'a str> {
    let (first, rest) = match content.find('\n') {
        Some(i) => (&content[..i], &content[i + 1..]),
        None => (content, ""),
    };
    (first.trim_end() == marker).then_some(rest)
}

/// Split at the first line equal to `marker`; the marker line belongs to neither half.
fn split_at_line<'a>(content: &'a str, marker: &str) -> Option<(&'a str, &'a str)> {
    let mut offset = 0;
    for line in content.split_inclusive('\n') {
        if line.trim_end() == marker {
            return Some((&content[..offset], &content[offset + line.len()..]));
        }
        offset += line.len();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_properties_header() {
        let content = "title=Hello World\ntype=post\nstatus = published\ntags=a, b\n~~~~~~\n\nBody text\n";
        let (header, body) = split_header(content, "a.md").unwrap();
        assert_eq!(header["title"], json!("Hello World"));
        assert_eq!(header["status"], json!("published"));
        assert_eq!(header["tags"], json!("a, b"));
        assert_eq!(body, "\nBody text\n");
    }

    #[test]
    fn test_properties_value_may_contain_equals() {
        let content = "Title=a=b\n~~~~~~\nx";
        let (header, body) = split_header(content, "a.md").unwrap();
        assert_eq!(header["Title"], json!("a=b"));
        assert_eq!(body, "x");
    }

    #[test]
    fn test_yaml_front_matter() {
        let content = "---\ntitle: Hello\ntags: [rust, blog]\ncount: 3\n---\n# Body\n";
        let (header, body) = split_header(content, "a.md").unwrap();
        assert_eq!(header["title"], json!("Hello"));
        assert_eq!(header["tags"], json!(["rust", "blog"]));
        assert_eq!(header["count"], json!(3));
        assert_eq!(body, "# Body\n");
    }

    #[test]
    fn test_crlf_front_matter() {
        let content = "---\r\ntitle: Hello\r\n---\r\nbody";
        let (header, body) = split_header(content, "a.md").unwrap();
        assert_eq!(header["title"], json!("Hello"));
        assert_eq!(body, "body");
    }

    #[test]
    fn test_no_header() {
        let content = "# Just markdown\n\nNo header = here\n";
        let (header, body) = split_header(content, "a.md").unwrap();
        assert!(header.is_empty());
        assert_eq!(body, content);
    }

    #[test]
    fn test_separator_without_properties_is_body() {
        let content = "Some prose line\n~~~~~~\nmore";
        let (header, body) = split_header(content, "a.md").unwrap();
        assert!(header.is_empty());
        assert_eq!(body, content);
    }

    #[test]
    fn test_invalid_yaml_header() {
        let content = "---\ntitle: [unclosed\n---\nbody";
        assert!(matches!(split_header(content, "a.md"), Err(KilnError::Parse(_))));
    }
}
