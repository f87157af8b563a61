//! Crawl pass: walk the content tree, re-parse what changed, prune what vanished.

pub mod assemble;
pub mod detector;
pub mod metadata;
pub mod parsers;
pub mod walker;

pub use assemble::{ParseContext, parse_document};
pub use detector::{ChangeDetector, Classification};
pub use metadata::{UriOptions, compute_file_hash};
pub use parsers::{ParsedContent, Parser, ParserRegistry};
pub use walker::{FileMetadata, discover_files};

use std::collections::HashSet;
use std::path::Path;
use std::time::Instant;

use crate::error::Result;
use crate::store::ContentStore;

/// Per-outcome file counts for one crawl.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlReport {
    pub new: usize,
    pub updated: usize,
    pub identical: usize,
    /// Parsed but deliberately skipped (no type, unknown status, ...).
    pub skipped: usize,
    /// Unreadable or malformed.
    pub failed: usize,
    pub pruned: usize,
}

impl CrawlReport {
    /// Whether the store changed.
    pub fn has_changes(&self) -> bool {
        self.new + self.updated + self.pruned > 0
    }

    pub fn total(&self) -> usize {
        self.new + self.updated + self.identical + self.skipped + self.failed
    }
}

/// Crawl `content_root` into `store`.
///
/// Files are handled one at a time. Skipped and failed files count as absent,
/// so a previously stored record for them is pruned at the end.
pub async fn crawl(
    store: &ContentStore,
    content_root: &Path,
    registry: &ParserRegistry,
    ctx: &ParseContext<'_>,
) -> Result<CrawlReport> {
    let start = Instant::now();
    let files = discover_files(content_root, registry)?;
    let detector = ChangeDetector::load(store, ctx.now).await?;
    log::info!(
        "Crawling {} files ({} stored records)",
        files.len(),
        detector.stored_count()
    );

    let mut report = CrawlReport::default();
    let mut seen: HashSet<String> = HashSet::with_capacity(files.len());

    for file in &files {
        let hash = match compute_file_hash(&file.absolute_path) {
            Ok(h) => h,
            Err(e) => {
                report.failed += 1;
                log::warn!("✗ {}: {}", file.relative_path, e);
                continue;
            }
        };

        let classification = detector.classify(&file.relative_path, &hash, ctx.types);
        log::debug!("{}: {}", file.relative_path, classification);
        if !classification.needs_parse() {
            report.identical += 1;
            seen.insert(file.relative_path.clone());
            continue;
        }

        match parse_document(registry, file, &hash, ctx) {
            Ok(Some(doc)) => {
                store.upsert(&doc).await?;
                seen.insert(doc.source_uri.clone());
                match classification {
                    Classification::New => report.new += 1,
                    _ => report.updated += 1,
                }
                log::info!("✓ {} ({}, {})", file.relative_path, classification, doc.status);
            }
            Ok(None) => report.skipped += 1,
            Err(e) => {
                report.failed += 1;
                log::warn!("✗ {}: {}", file.relative_path, e);
            }
        }
    }

    let pruned = store.prune_missing(&seen).await?;
    for uri in &pruned {
        log::info!("Pruned {}", uri);
    }
    report.pruned = pruned.len();

    log::info!(
        "Crawl complete in {:?}: new={}, updated={}, identical={}, skipped={}, failed={}, pruned={}",
        start.elapsed(),
        report.new,
        report.updated,
        report.identical,
        report.skipped,
        report.failed,
        report.pruned,
    );
    Ok(report)
}
