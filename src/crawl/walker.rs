use walkdir::{DirEntry, WalkDir};
use std::path::{Path, PathBuf};
use crate::crawl::metadata::normalize_source_uri;
use crate::crawl::parsers::ParserRegistry;
use crate::error::{KilnError, Result};

/// Metadata for a discovered source file
#[derive(Debug, Clone)]
pub struct FileMetadata {
    /// `/`-separated path relative to the content root; the document's identity.
    pub relative_path: String,
    pub absolute_path: PathBuf,
    /// Lowercased, without the dot.
    pub extension: String,
    pub file_size: u64,
    pub modified: std::time::SystemTime,
}

impl FileMetadata {
    /// Describe `absolute_path`, which must live under `root`.
    pub fn from_path(absolute_path: &Path, root: &Path) -> Result<Self> {
        let relative = absolute_path.strip_prefix(root).map_err(|_| {
            KilnError::InvalidInput(format!(
                "{} is outside the content root {}",
                absolute_path.display(),
                root.display()
            ))
        })?;
        let metadata = std::fs::metadata(absolute_path)?;

        Ok(Self {
            relative_path: normalize_source_uri(&relative.to_string_lossy()),
            absolute_path: absolute_path.to_path_buf(),
            extension: absolute_path
                .extension()
                .and_then(|s| s.to_str())
                .unwrap_or("")
                .to_lowercase(),
            file_size: metadata.len(),
            modified: metadata.modified()?,
        })
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .map(|s| s.starts_with('.') || s.ends_with('~'))
            .unwrap_or(false)
}

/// Discover every content file under `root` that a registered parser accepts.
///
/// Hidden files and directories (leading `.`) and editor backups (trailing
/// `~`) are skipped. Results are sorted by relative path.
pub fn discover_files(root: &Path, registry: &ParserRegistry) -> Result<Vec<FileMetadata>> {
    if !root.is_dir() {
        return Err(KilnError::Config(format!(
            "content folder is not a directory: {}",
            root.display()
        )));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_entry(|e| !is_hidden(e))
    {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                log::warn!("Skipping unreadable entry under {}: {}", root.display(), e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let file = FileMetadata::from_path(entry.path(), root)?;
        if !registry.supports(&file.extension) {
            log::debug!("No parser for {}, ignoring", file.relative_path);
            continue;
        }
        files.push(file);
    }

    files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    log::info!("Discovered {} content files in {}", files.len(), root.display());
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use std::fs;

    #[test]
    fn test_discover_files() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::create_dir_all(root.join("blog/2024")).unwrap();
        fs::create_dir_all(root.join(".git")).unwrap();
        fs::write(root.join("about.md"), "# About").unwrap();
        fs::write(root.join("contact.html"), "<p>hi</p>").unwrap();
        fs::write(root.join("data.yml"), "title: x").unwrap();
        fs::write(root.join("blog/2024/first.MD"), "# First").unwrap();
        fs::write(root.join("blog/2024/first.md~"), "backup").unwrap();
        fs::write(root.join(".draft.md"), "hidden").unwrap();
        fs::write(root.join(".git/HEAD.md"), "nope").unwrap();
        fs::write(root.join("image.png"), b"\x89PNG\r\n\x1a\n").unwrap();

        let files = discover_files(root, &ParserRegistry::new()).unwrap();
        let uris: Vec<&str> = files.iter().map(|f| f.relative_path.as_str()).collect();
        assert_eq!(uris, vec!["about.md", "blog/2024/first.MD", "contact.html", "data.yml"]);
        assert_eq!(files[1].extension, "md");
    }

    #[test]
    fn test_discover_files_empty() {
        let temp_dir = TempDir::new().unwrap();
        let files = discover_files(temp_dir.path(), &ParserRegistry::new()).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_discover_files_missing_root() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope");
        assert!(matches!(
            discover_files(&missing, &ParserRegistry::new()),
            Err(KilnError::Config(_))
        ));
    }

    #[test]
    fn test_file_metadata_outside_root() {
        let root = TempDir::new().unwrap();
        let other = TempDir::new().unwrap();
        let path = other.path().join("a.md");
        fs::write(&path, "x").unwrap();
        assert!(FileMetadata::from_path(&path, root.path()).is_err());
    }
}
