use chrono::{DateTime, TimeZone, Utc};
use sha2::{Digest, Sha256};
use std::path::Path;
use std::time::SystemTime;

use crate::error::{KilnError, Result};

/// SHA-256 of the raw file bytes, hex encoded.
pub fn compute_file_hash(path: &Path) -> Result<String> {
    let content = std::fs::read(path)?;
    Ok(hash_bytes(&content))
}

pub fn hash_bytes(content: &[u8]) -> String {
    format!("{:x}", Sha256::digest(content))
}

/// How output paths are derived from source URIs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriOptions {
    /// Appended to the extension-less path; may be empty.
    pub output_extension: String,
    /// Sources under this prefix are written as `<stem>/index<ext>`.
    pub no_extension_prefix: Option<String>,
}

impl Default for UriOptions {
    fn default() -> Self {
        Self {
            output_extension: ".html".to_string(),
            no_extension_prefix: None,
        }
    }
}

/// Normalize a relative path to `/` separators with no leading `./` or `/`.
pub fn normalize_source_uri(relative_path: &str) -> String {
    let normalized = relative_path.replace('\\', "/");
    normalized
        .split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// `(output_uri, output_uri_no_ext)` for a source URI.
///
/// ```text
/// "blog/first.md"                   -> ("blog/first.html", "blog/first")
/// "blog/first.md", prefix "blog"    -> ("blog/first/index.html", "blog/first/")
/// "about.md", extension ""          -> ("about", "about")
/// ```
pub fn output_uris(source_uri: &str, options: &UriOptions) -> (String, String) {
    let stem = strip_extension(source_uri);

    let extensionless = options
        .no_extension_prefix
        .as_deref()
        .map(|p| p.trim_matches('/'))
        .map(|p| p.is_empty() || stem == p || stem.starts_with(&format!("{}/", p)))
        .unwrap_or(false);

    if extensionless {
        (
            format!("{}/index{}", stem, options.output_extension),
            format!("{}/", stem),
        )
    } else {
        (format!("{}{}", stem, options.output_extension), stem.to_string())
    }
}

fn strip_extension(uri: &str) -> &str {
    let file_start = uri.rfind('/').map(|i| i + 1).unwrap_or(0);
    match uri[file_start..].rfind('.') {
        Some(dot) if dot > 0 => &uri[..file_start + dot],
        _ => uri,
    }
}

pub fn system_time_to_utc(time: SystemTime) -> Result<DateTime<Utc>> {
    let since_epoch = time
        .duration_since(std::time::UNIX_EPOCH)
        .map_err(|_| KilnError::InvalidInput("file modification time before 1970".to_string()))?;
    Utc.timestamp_opt(since_epoch.as_secs() as i64, since_epoch.subsec_nanos())
        .single()
        .ok_or_else(|| KilnError::InvalidInput("file modification time out of range".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use std::fs;

    #[test]
    fn test_compute_file_hash() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("test.md");
        fs::write(&file_path, "test content").unwrap();

        let hash = compute_file_hash(&file_path).unwrap();
        assert_eq!(hash.len(), 64);
        assert_eq!(hash, hash_bytes(b"test content"));
        assert_ne!(hash, hash_bytes(b"test content\n"));
    }

    #[test]
    fn test_normalize_source_uri() {
        assert_eq!(normalize_source_uri("blog\\2024\\post.md"), "blog/2024/post.md");
        assert_eq!(normalize_source_uri("./about.md"), "about.md");
        assert_eq!(normalize_source_uri("/a//b.md"), "a/b.md");
    }

    #[test]
    fn test_output_uris_default() {
        let opts = UriOptions::default();
        assert_eq!(
            output_uris("blog/first.md", &opts),
            ("blog/first.html".to_string(), "blog/first".to_string())
        );
        assert_eq!(
            output_uris("v1.2/notes.md", &opts),
            ("v1.2/notes.html".to_string(), "v1.2/notes".to_string())
        );
        assert_eq!(
            output_uris(".hidden", &opts),
            (".hidden.html".to_string(), ".hidden".to_string())
        );
    }

    #[test]
    fn test_output_uris_empty_extension() {
        let opts = UriOptions { output_extension: String::new(), no_extension_prefix: None };
        assert_eq!(output_uris("about.md", &opts), ("about".to_string(), "about".to_string()));
    }

    #[test]
    fn test_output_uris_no_extension_prefix() {
        let opts = UriOptions {
            output_extension: ".html".to_string(),
            no_extension_prefix: Some("/blog/".to_string()),
        };
        assert_eq!(
            output_uris("blog/first.md", &opts),
            ("blog/first/index.html".to_string(), "blog/first/".to_string())
        );
        assert_eq!(
            output_uris("blogroll.md", &opts),
            ("blogroll.html".to_string(), "blogroll".to_string())
        );
    }

    #[test]
    fn test_system_time_to_utc() {
        let t = std::time::UNIX_EPOCH + std::time::Duration::from_secs(86_400);
        assert_eq!(system_time_to_utc(t).unwrap(), Utc.with_ymd_and_hms(1970, 1, 2, 0, 0, 0).unwrap());
    }
}
