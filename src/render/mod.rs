//! Render pass: hand every unrendered document, the index listing and the
//! tag pages to a [`Renderer`].
//!
//! Failures are collected rather than propagated so every page is attempted
//! once; the pass then fails with a single aggregate [`KilnError::Render`].

mod file;

pub use file::FileRenderer;

use std::collections::BTreeMap;
use std::time::Instant;

use serde::Serialize;

use crate::config::RenderConfig;
use crate::document::Document;
use crate::error::{KilnError, Result};
use crate::store::ContentStore;
use crate::types::DocumentTypes;
use crate::views::{Neighbors, PageContext, Paginator, TagEntry, build_tag_index, link};

/// What kind of page a [`RenderContext`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PageKind {
    Document,
    Index,
    Tag,
}

/// Everything a template needs for one output page.
#[derive(Debug, Clone, Serialize)]
pub struct RenderContext<'a> {
    pub kind: PageKind,
    /// Destination relative to the output folder.
    pub output_uri: String,
    pub document: Option<&'a Document>,
    pub neighbors: Neighbors,
    /// Documents listed on an index page.
    pub listing: &'a [Document],
    pub pagination: Option<PageContext>,
    pub tag: Option<&'a TagEntry>,
}

impl<'a> RenderContext<'a> {
    fn document(doc: &'a Document, neighbors: Neighbors) -> Self {
        Self {
            kind: PageKind::Document,
            output_uri: doc.output_uri.clone(),
            document: Some(doc),
            neighbors,
            listing: &[],
            pagination: None,
            tag: None,
        }
    }

    fn index(output_uri: String, listing: &'a [Document], pagination: Option<PageContext>) -> Self {
        Self {
            kind: PageKind::Index,
            output_uri,
            document: None,
            neighbors: Neighbors::default(),
            listing,
            pagination,
            tag: None,
        }
    }

    fn tag(entry: &'a TagEntry) -> Self {
        Self {
            kind: PageKind::Tag,
            output_uri: entry.uri.clone(),
            document: None,
            neighbors: Neighbors::default(),
            listing: &[],
            pagination: None,
            tag: Some(entry),
        }
    }
}

/// Template stage. An error leaves the page unrendered and is reported at the end of the pass.
pub trait Renderer: Send + Sync {
    fn render(&self, ctx: &RenderContext<'_>) -> anyhow::Result<()>;
}

/// Pages produced by one successful pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderReport {
    pub documents: usize,
    pub index_pages: usize,
    pub tag_pages: usize,
}

#[derive(Default)]
struct Failures(Vec<String>);

impl Failures {
    fn record(&mut self, page: &str, err: impl std::fmt::Display) {
        log::error!("✗ render {}: {}", page, err);
        self.0.push(format!("{}: {}", page, err));
    }
}

/// Render everything the store says is pending, then the listings.
pub async fn render_pass(
    store: &ContentStore,
    types: &DocumentTypes,
    renderer: &dyn Renderer,
    config: &RenderConfig,
) -> Result<RenderReport> {
    let start = Instant::now();
    let mut report = RenderReport::default();
    let mut failures = Failures::default();

    let mut by_type: BTreeMap<String, Vec<Document>> = BTreeMap::new();
    for doc in store.unrendered_content().await? {
        by_type.entry(doc.doc_type.clone()).or_default().push(doc);
    }

    for (doc_type, pending) in &by_type {
        if !types.contains(doc_type) {
            log::warn!(
                "Not rendering {} document(s) of unregistered type '{}'",
                pending.len(),
                doc_type
            );
            continue;
        }
        // One snapshot per type keeps neighbours consistent across the pass.
        let snapshot = store.get_all_content(doc_type).await?;
        for doc in pending {
            let ctx = RenderContext::document(doc, link(&snapshot, doc));
            if let Err(e) = renderer.render(&ctx) {
                failures.record(&doc.source_uri, format!("{:#}", e));
                continue;
            }
            match store.mark_content_as_rendered(doc).await {
                Ok(()) => {
                    report.documents += 1;
                    log::debug!("✓ {} -> {}", doc.source_uri, doc.output_uri);
                }
                Err(e) => failures.record(&doc.source_uri, e),
            }
        }
    }

    let posts = published_posts(store).await?;
    report.index_pages = render_index(&posts, renderer, config, &mut failures)?;

    if config.render_tags {
        let tags = store.all_tags().await?;
        let entries = build_tag_index(store, &tags, &config.tag_path, &config.output_extension).await?;
        for entry in &entries {
            match renderer.render(&RenderContext::tag(entry)) {
                Ok(()) => report.tag_pages += 1,
                Err(e) => failures.record(&entry.uri, format!("{:#}", e)),
            }
        }
    }

    log::info!(
        "Render complete in {:?}: documents={}, index pages={}, tag pages={}, failed={}",
        start.elapsed(),
        report.documents,
        report.index_pages,
        report.tag_pages,
        failures.0.len(),
    );

    if failures.0.is_empty() {
        Ok(report)
    } else {
        Err(KilnError::Render {
            count: failures.0.len(),
            messages: failures.0,
        })
    }
}

/// Published documents of every post type, newest first.
async fn published_posts(store: &ContentStore) -> Result<Vec<Document>> {
    let mut posts = Vec::new();
    for doc_type in store.post_types() {
        posts.extend(store.get_published_content(doc_type).await?);
    }
    posts.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.source_uri.cmp(&b.source_uri)));
    Ok(posts)
}

fn render_index(
    posts: &[Document],
    renderer: &dyn Renderer,
    config: &RenderConfig,
    failures: &mut Failures,
) -> Result<usize> {
    if !config.paginate_index {
        let ctx = RenderContext::index(config.index_file.clone(), posts, None);
        return Ok(match renderer.render(&ctx) {
            Ok(()) => 1,
            Err(e) => {
                failures.record(&config.index_file, format!("{:#}", e));
                0
            }
        });
    }

    let paginator = Paginator::new(posts.len(), config.posts_per_page)?;
    let mut rendered = 0;
    for page in 1..=paginator.number_of_pages().max(1) {
        let label = format!("{} page {}", config.index_file, page);
        let (pagination, range) = match paginator
            .page_context(page, &config.index_file)
            .and_then(|ctx| Ok((ctx, paginator.item_range(page)?)))
        {
            Ok(v) => v,
            Err(e) => {
                failures.record(&label, e);
                continue;
            }
        };
        let ctx = RenderContext::index(pagination.current.clone(), &posts[range], Some(pagination));
        match renderer.render(&ctx) {
            Ok(()) => rendered += 1,
            Err(e) => failures.record(&label, format!("{:#}", e)),
        }
    }
    Ok(rendered)
}
