//! A configured site: store, type registry and parsers wired from [`Config`].

use std::time::Instant;

use chrono::{DateTime, Utc};

use crate::config::Config;
use crate::crawl::{CrawlReport, ParseContext, ParserRegistry, crawl};
use crate::error::Result;
use crate::render::{RenderReport, Renderer, render_pass};
use crate::store::ContentStore;
use crate::types::DocumentTypes;

#[derive(Debug, Clone, Copy, Default)]
pub struct BakeOptions {
    /// Drop every stored record first so all files are NEW.
    pub force: bool,
    /// Stop after the crawl.
    pub crawl_only: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BakeReport {
    pub crawl: CrawlReport,
    pub render: Option<RenderReport>,
}

pub struct Site {
    config: Config,
    store: ContentStore,
    types: DocumentTypes,
    registry: ParserRegistry,
}

impl Site {
    /// Open the store (running migrations) and register configured types.
    pub async fn open(config: Config) -> Result<Self> {
        let store = ContentStore::open(config.db_path(), config.migrations_dir())
            .await?
            .with_post_types(config.content.post_types.iter().cloned());

        let mut types = DocumentTypes::new();
        types.subscribe(|name| log::info!("Registered document type '{}'", name));
        for name in &config.content.custom_types {
            types.register(name);
        }

        Ok(Self {
            config,
            store,
            types,
            registry: ParserRegistry::new(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &ContentStore {
        &self.store
    }

    pub fn types(&self) -> &DocumentTypes {
        &self.types
    }

    /// Crawl the content folder, resolving scheduled statuses against `now`.
    pub async fn crawl(&self, now: DateTime<Utc>) -> Result<CrawlReport> {
        let uri_options = self.config.uri_options();
        let ctx = ParseContext {
            types: &self.types,
            default_type: self.config.content.default_type.as_deref(),
            default_status: self.config.default_status(),
            date_format: &self.config.content.date_format,
            uri_options: &uri_options,
            now,
        };
        crawl(&self.store, self.config.content_folder(), &self.registry, &ctx).await
    }

    pub async fn render(&self, renderer: &dyn Renderer) -> Result<RenderReport> {
        render_pass(&self.store, &self.types, renderer, &self.config.render).await
    }

    /// Crawl then render.
    pub async fn bake(&self, renderer: &dyn Renderer, options: BakeOptions) -> Result<BakeReport> {
        let start = Instant::now();
        if options.force {
            let cleared = self.store.clear().await?;
            log::info!("Force mode: cleared {} stored document(s)", cleared);
        }

        let crawl = self.crawl(Utc::now()).await?;
        if options.crawl_only {
            return Ok(BakeReport { crawl, render: None });
        }

        let render = self.render(renderer).await?;
        log::info!("Bake finished in {:?}", start.elapsed());
        Ok(BakeReport {
            crawl,
            render: Some(render),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::FileRenderer;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn site_config(temp: &TempDir) -> Config {
        let root = temp.path();
        fs::create_dir_all(root.join("content/blog")).unwrap();
        let migrations = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("migrations");
        let toml = format!(
            r#"
[site]
content_folder = "{}"
output_folder = "{}"
db_path = "{}"
migrations_dir = "{}"

[content]
custom_types = ["note"]
uri_no_extension_prefix = "blog"

[render]
posts_per_page = 1
"#,
            root.join("content").display(),
            root.join("output").display(),
            root.join("kiln.db").display(),
            migrations.display(),
        );
        Config::from_toml(&toml.replace('\\', "/")).unwrap()
    }

    #[tokio::test]
    async fn test_bake_end_to_end() {
        let temp = TempDir::new().unwrap();
        let config = site_config(&temp);
        let content = config.content_folder().to_path_buf();
        fs::write(
            content.join("blog/first.md"),
            "title=First\ntype=post\nstatus=published\ndate=2024-01-01\ntags=rust\n~~~~~~\nHello *world*\n",
        )
        .unwrap();
        fs::write(
            content.join("blog/second.md"),
            "---\ntitle: Second\ntype: post\nstatus: published\ndate: 2024-02-01\ntags: [rust, web]\n---\nAgain\n",
        )
        .unwrap();
        fs::write(
            content.join("about.html"),
            "title=About\ntype=page\nstatus=published\n~~~~~~\n<p>about</p>\n",
        )
        .unwrap();

        let site = Site::open(config).await.unwrap();
        assert!(site.types().contains("note"));
        let renderer = FileRenderer::new(site.config().output_folder());

        let report = site.bake(&renderer, BakeOptions::default()).await.unwrap();
        assert_eq!(report.crawl.new, 3);
        let render = report.render.unwrap();
        assert_eq!(render.documents, 3);
        assert_eq!(render.index_pages, 2);
        assert_eq!(render.tag_pages, 2);

        let out = site.config().output_folder();
        let first = fs::read_to_string(out.join("blog/first/index.html")).unwrap();
        assert!(first.contains("<em>world</em>"));
        assert!(first.contains("href=\"/blog/second/index.html\""));
        assert!(out.join("about.html").exists());
        assert!(out.join("index.html").exists());
        assert!(out.join("2/index.html").exists());
        assert!(out.join("tags/web.html").exists());

        let again = site.bake(&renderer, BakeOptions::default()).await.unwrap();
        assert_eq!(again.crawl.identical, 3);
        assert_eq!(again.render.unwrap().documents, 0);
    }

    #[tokio::test]
    async fn test_force_and_crawl_only() {
        let temp = TempDir::new().unwrap();
        let config = site_config(&temp);
        fs::write(
            config.content_folder().join("a.md"),
            "title=A\ntype=post\nstatus=draft\n~~~~~~\nx\n",
        )
        .unwrap();
        let site = Site::open(config).await.unwrap();
        let renderer = FileRenderer::new(site.config().output_folder());
        let options = BakeOptions { force: false, crawl_only: true };

        let first = site.bake(&renderer, options).await.unwrap();
        assert_eq!(first.crawl.new, 1);
        assert!(first.render.is_none());

        let forced = site
            .bake(&renderer, BakeOptions { force: true, crawl_only: true })
            .await
            .unwrap();
        assert_eq!(forced.crawl.new, 1);
        assert_eq!(forced.crawl.identical, 0);
    }
}
