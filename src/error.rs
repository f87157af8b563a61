use thiserror::Error;

/// Main error type for Kiln
#[derive(Error, Debug)]
pub enum KilnError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// File system I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Extension map (de)serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Document not found
    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    /// Content header or body could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// Malformed pagination input or path fragment
    #[error("Pagination error: {0}")]
    Pagination(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Aggregate of every per-page failure collected during one render pass
    #[error("Render failed for {count} page(s):\n{}", messages.join("\n"))]
    Render { count: usize, messages: Vec<String> },
}

/// Convenient Result type using KilnError
pub type Result<T> = std::result::Result<T, KilnError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = KilnError::Config("Test error".to_string());
        assert!(err.to_string().contains("Configuration error"));
        assert!(err.to_string().contains("Test error"));
    }

    #[test]
    fn test_error_from_rusqlite() {
        let rusqlite_err = rusqlite::Error::InvalidQuery;
        let kiln_err: KilnError = rusqlite_err.into();
        assert!(matches!(kiln_err, KilnError::Database(_)));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let kiln_err: KilnError = io_err.into();
        assert!(matches!(kiln_err, KilnError::Io(_)));
    }

    #[test]
    fn test_render_error_lists_every_message() {
        let err = KilnError::Render {
            count: 2,
            messages: vec!["a.md: boom".to_string(), "b.md: bang".to_string()],
        };
        let text = err.to_string();
        assert!(text.contains("2 page(s)"));
        assert!(text.contains("a.md: boom"));
        assert!(text.contains("b.md: bang"));
    }
}
