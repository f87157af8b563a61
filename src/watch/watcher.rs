//! Watcher thread: notify + debounce, send batches of changed paths to main.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use notify::{RecursiveMode, Watcher};

use crate::error::{KilnError, Result};

/// Whether a change under `root` can affect the site.
///
/// Hidden entries and editor backups never do, matching the crawl's walker.
pub fn is_relevant(path: &Path, root: &Path) -> bool {
    let Ok(relative) = path.strip_prefix(root) else {
        return false;
    };
    relative.components().all(|c| {
        let name = c.as_os_str().to_string_lossy();
        !name.starts_with('.') && !name.ends_with('~')
    })
}

/// Watch `root` and send each quiet-period batch of changed paths over `tx`.
///
/// The outcome of starting the watcher is reported once over `ready`. A batch
/// is sent once no event has arrived for `debounce_ms`. The thread exits when
/// the receiver is dropped.
pub fn run_watcher_thread(
    root: &Path,
    debounce_ms: u64,
    tx: mpsc::Sender<Vec<PathBuf>>,
    ready: mpsc::Sender<Result<()>>,
) {
    let root = root.to_path_buf();
    let debounce = Duration::from_millis(debounce_ms);

    let (event_tx, event_rx) = mpsc::channel::<Vec<PathBuf>>();

    let _watcher = match start_watcher(&root, event_tx) {
        Ok(w) => {
            let _ = ready.send(Ok(()));
            w
        }
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };

    let mut pending: HashMap<PathBuf, Instant> = HashMap::new();

    loop {
        match event_rx.recv_timeout(debounce) {
            Ok(paths) => {
                let now = Instant::now();
                for p in paths.into_iter().filter(|p| is_relevant(p, &root)) {
                    pending.insert(p, now);
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                let now = Instant::now();
                let quiet = pending.values().all(|t| now.duration_since(*t) >= debounce);
                if pending.is_empty() || !quiet {
                    continue;
                }
                let mut batch: Vec<PathBuf> = pending.drain().map(|(p, _)| p).collect();
                batch.sort();
                if tx.send(batch).is_err() {
                    return;
                }
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => return,
        }
    }
}

fn start_watcher(root: &Path, event_tx: mpsc::Sender<Vec<PathBuf>>) -> Result<notify::RecommendedWatcher> {
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        match res {
            Ok(ev) => {
                let _ = event_tx.send(ev.paths);
            }
            Err(e) => log::warn!("watch event error: {}", e),
        }
    })
    .map_err(|e| KilnError::Config(format!("cannot start watcher: {}", e)))?;

    watcher
        .watch(root, RecursiveMode::Recursive)
        .map_err(|e| KilnError::Config(format!("cannot watch {}: {}", root.display(), e)))?;
    Ok(watcher)
}
