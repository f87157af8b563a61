//! File watcher: re-bake the site when files under the content folder change.
//!
//! Bakes are serialized. Change batches that arrive while a bake is running
//! wait in the channel and are merged into a single follow-up bake.

mod watcher;

pub use watcher::is_relevant;

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};

use crate::bake::{BakeOptions, Site};
use crate::error::{KilnError, Result};
use crate::render::Renderer;

/// Merge `first` with every batch already queued behind it.
pub fn coalesce(first: Vec<PathBuf>, rx: &mpsc::Receiver<Vec<PathBuf>>) -> BTreeSet<PathBuf> {
    let mut changes: BTreeSet<PathBuf> = first.into_iter().collect();
    while let Ok(more) = rx.try_recv() {
        changes.extend(more);
    }
    changes
}

/// Bake once, then re-bake on every coalesced change set.
///
/// Fails if the watcher cannot start or stops while the site is being watched.
pub async fn run_watcher(site: Site, renderer: &dyn Renderer, debounce_ms: u64) -> Result<()> {
    let root = site.config().content_folder().to_path_buf();
    let (tx, rx) = mpsc::channel();
    let (ready_tx, ready_rx) = mpsc::channel();
    let rx = Arc::new(Mutex::new(rx));

    let watch_root = root.clone();
    std::thread::spawn(move || watcher::run_watcher_thread(&watch_root, debounce_ms, tx, ready_tx));

    tokio::task::spawn_blocking(move || {
        ready_rx
            .recv()
            .map_err(|_| KilnError::Config("watcher thread exited before starting".to_string()))?
    })
    .await
    .map_err(|e| KilnError::Config(format!("watcher task join: {}", e)))??;
    log::info!("Watching {}", root.display());

    rebake(&site, renderer, "initial build").await;

    loop {
        let rx_clone = rx.clone();
        let changes = tokio::task::spawn_blocking(move || {
            let rx = rx_clone
                .lock()
                .map_err(|_| KilnError::Config("watcher channel lock poisoned".to_string()))?;
            Ok::<_, KilnError>(rx.recv().ok().map(|first| coalesce(first, &rx)))
        })
        .await
        .map_err(|e| KilnError::Config(format!("watcher task join: {}", e)))??;

        let Some(changes) = changes else {
            return Err(KilnError::Config("watcher stopped unexpectedly".to_string()));
        };

        for path in &changes {
            let shown = path.strip_prefix(&root).unwrap_or(path);
            log::debug!("watch: changed {}", shown.display());
        }
        rebake(&site, renderer, &format!("{} changed path(s)", changes.len())).await;
    }
}

async fn rebake(site: &Site, renderer: &dyn Renderer, reason: &str) {
    let start = std::time::Instant::now();
    match site.bake(renderer, BakeOptions::default()).await {
        Ok(report) if report.crawl.has_changes() => log::info!(
            "watch: rebuilt after {} (new={}, updated={}, pruned={}) in {:?}",
            reason,
            report.crawl.new,
            report.crawl.updated,
            report.crawl.pruned,
            start.elapsed()
        ),
        Ok(_) => log::info!("watch: {} left the store unchanged", reason),
        Err(e) => log::error!("watch: bake after {} failed: {}", reason, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::render::FileRenderer;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_coalesce_merges_queued_batches() {
        let (tx, rx) = mpsc::channel();
        tx.send(vec![PathBuf::from("b.md"), PathBuf::from("c.md")]).unwrap();
        tx.send(vec![PathBuf::from("a.md"), PathBuf::from("b.md")]).unwrap();

        let changes = coalesce(vec![PathBuf::from("a.md")], &rx);
        let names: Vec<&str> = changes.iter().map(|p| p.to_str().unwrap()).collect();
        assert_eq!(names, vec!["a.md", "b.md", "c.md"]);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_coalesce_with_empty_queue() {
        let (_tx, rx) = mpsc::channel::<Vec<PathBuf>>();
        let changes = coalesce(vec![PathBuf::from("x.md")], &rx);
        assert_eq!(changes.len(), 1);
    }

    #[tokio::test]
    async fn test_run_watcher_fails_when_watch_cannot_start() {
        let temp = TempDir::new().unwrap();
        let content = temp.path().join("content");
        fs::create_dir_all(&content).unwrap();
        let migrations = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("migrations");
        let toml = format!(
            "[site]\ncontent_folder = \"{}\"\noutput_folder = \"{}\"\ndb_path = \"{}\"\nmigrations_dir = \"{}\"\n",
            content.display(),
            temp.path().join("out").display(),
            temp.path().join("kiln.db").display(),
            migrations.display(),
        );
        let config = Config::from_toml(&toml.replace('\\', "/")).unwrap();
        let site = Site::open(config).await.unwrap();
        fs::remove_dir_all(&content).unwrap();

        let renderer = FileRenderer::new(temp.path().join("out"));
        let err = run_watcher(site, &renderer, 50).await.unwrap_err();
        assert!(err.to_string().contains("cannot watch"));
        assert!(!temp.path().join("out").exists());
    }
}
