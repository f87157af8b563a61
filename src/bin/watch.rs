//! Watch the content folder and re-bake the site on every change.

use anyhow::Result;
use clap::Parser;
use kiln::render::FileRenderer;
use kiln::watch::run_watcher;
use kiln::{Config, Site};

#[derive(Parser, Debug)]
#[command(name = "watch")]
#[command(about = "Watch the content folder and rebuild the site on changes")]
struct Args {
    /// Quiet period in milliseconds before a burst of changes triggers a rebuild
    #[arg(long, default_value = "500")]
    debounce_ms: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::load()?;
    config.init_logging();
    log::info!("Starting kiln file watcher");
    log::info!("Content folder: {}", config.content_folder().display());
    log::info!("Debounce: {} ms", args.debounce_ms);

    let renderer = FileRenderer::new(config.output_folder());
    let site = Site::open(config).await?;

    log::info!("Watching for changes (Ctrl+C to stop)");
    run_watcher(site, &renderer, args.debounce_ms).await?;
    Ok(())
}
