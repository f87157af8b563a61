use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::crawl::UriOptions;
use crate::document::RawStatus;
use crate::types::DocumentTypes;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub site: SiteConfig,
    #[serde(default)]
    pub content: ContentConfig,
    #[serde(default)]
    pub render: RenderConfig,
}

/// Where content comes from and where everything goes
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    pub content_folder: PathBuf,
    pub output_folder: PathBuf,
    pub db_path: PathBuf,
    #[serde(default = "default_migrations_dir")]
    pub migrations_dir: PathBuf,
    /// Log level used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// How source files become documents
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    /// Type for files whose header has none.
    pub default_type: Option<String>,
    /// Status for files whose header has none.
    pub default_status: Option<String>,
    /// chrono format for header dates.
    pub date_format: String,
    /// Types registered on top of `page` and `post`.
    pub custom_types: Vec<String>,
    /// Types listed on the index and as tagged posts.
    pub post_types: Vec<String>,
    /// Sources under this prefix get extension-less URLs.
    pub uri_no_extension_prefix: Option<String>,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            default_type: None,
            default_status: None,
            date_format: "%Y-%m-%d".to_string(),
            custom_types: Vec::new(),
            post_types: vec!["post".to_string()],
            uri_no_extension_prefix: None,
        }
    }
}

/// Output layout for the render pass
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub output_extension: String,
    pub index_file: String,
    pub paginate_index: bool,
    pub posts_per_page: usize,
    pub render_tags: bool,
    pub tag_path: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            output_extension: ".html".to_string(),
            index_file: "index.html".to_string(),
            paginate_index: true,
            posts_per_page: 10,
            render_tags: true,
            tag_path: "tags".to_string(),
        }
    }
}

fn default_migrations_dir() -> PathBuf {
    PathBuf::from("migrations")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from file
    ///
    /// Loads environment variables from .env file (if present) before loading config.
    /// Looks for config file in this order:
    /// 1. Path specified in KILN_CONFIG environment variable
    /// 2. ./kiln.toml in current directory
    pub fn load() -> Result<Self> {
        let _ = dotenv::dotenv();

        let config_path = std::env::var("KILN_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("kiln.toml"));

        Self::load_from(&config_path)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        Self::from_toml(&config_str)
            .with_context(|| format!("Invalid config file: {}", config_path.display()))
    }

    /// Parse and validate a TOML document.
    pub fn from_toml(config_str: &str) -> Result<Self> {
        let config: Config = toml::from_str(config_str).context("Failed to parse kiln.toml")?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        let content = &self.site.content_folder;
        if !content.exists() {
            anyhow::bail!(
                "content_folder path does not exist: {}. Set content_folder in kiln.toml to your sources.",
                content.display()
            );
        }
        if !content.is_dir() {
            anyhow::bail!("content_folder must be a directory, not a file: {}", content.display());
        }

        self.site
            .log_level
            .parse::<log::LevelFilter>()
            .with_context(|| format!("site.log_level '{}' is not a log level", self.site.log_level))?;

        if self.render.posts_per_page == 0 {
            anyhow::bail!("render.posts_per_page must be greater than 0");
        }

        if self.content.date_format.trim().is_empty() {
            anyhow::bail!("content.date_format must not be empty");
        }

        if let Some(status) = &self.content.default_status {
            status
                .parse::<RawStatus>()
                .with_context(|| format!("content.default_status '{}' is not a known status", status))?;
        }

        if let Some(doc_type) = &self.content.default_type {
            if !self.document_types().contains(doc_type) {
                anyhow::bail!(
                    "content.default_type '{}' is not registered; add it to content.custom_types",
                    doc_type
                );
            }
        }

        Ok(())
    }

    /// Start `env_logger`. `RUST_LOG` takes precedence over `site.log_level`.
    pub fn init_logging(&self) {
        let env = env_logger::Env::default().default_filter_or(self.site.log_level.as_str());
        if env_logger::Builder::from_env(env).try_init().is_err() {
            log::debug!("Logger already initialised");
        }
    }

    pub fn content_folder(&self) -> &Path {
        &self.site.content_folder
    }

    pub fn output_folder(&self) -> &Path {
        &self.site.output_folder
    }

    /// Get database path
    pub fn db_path(&self) -> &Path {
        &self.site.db_path
    }

    pub fn migrations_dir(&self) -> &Path {
        &self.site.migrations_dir
    }

    /// Built-in types plus `content.custom_types`.
    pub fn document_types(&self) -> DocumentTypes {
        DocumentTypes::with_custom(&self.content.custom_types)
    }

    /// Parsed default status; `None` when unset.
    pub fn default_status(&self) -> Option<RawStatus> {
        self.content
            .default_status
            .as_deref()
            .and_then(|s| s.parse().ok())
    }

    pub fn uri_options(&self) -> UriOptions {
        UriOptions {
            output_extension: self.render.output_extension.clone(),
            no_extension_prefix: self.content.uri_no_extension_prefix.clone(),
        }
    }
}
