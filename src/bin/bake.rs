use anyhow::Result;
use clap::Parser;
use kiln::render::FileRenderer;
use kiln::{BakeOptions, Config, Site};

#[derive(Parser, Debug)]
#[command(name = "bake")]
#[command(about = "Crawl the content folder and render changed pages (incremental by default)")]
struct Args {
    /// Forget every stored document and rebuild from scratch
    #[arg(short, long)]
    force: bool,

    /// Update the store but skip rendering
    #[arg(long)]
    crawl_only: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::load()?;
    config.init_logging();
    log::info!("Configuration loaded successfully");
    log::info!("Content folder: {}", config.content_folder().display());
    log::info!("Database path: {}", config.db_path().display());
    if args.force {
        log::info!("Mode: full rebuild (all files)");
    }

    let renderer = FileRenderer::new(config.output_folder());
    let site = Site::open(config).await?;
    let report = site
        .bake(
            &renderer,
            BakeOptions {
                force: args.force,
                crawl_only: args.crawl_only,
            },
        )
        .await?;

    let crawl = &report.crawl;
    log::info!("=== Bake Complete ===");
    log::info!("Files discovered: {}", crawl.total());
    log::info!("  New: {}", crawl.new);
    log::info!("  Updated: {}", crawl.updated);
    log::info!("  Identical (skipped): {}", crawl.identical);
    log::info!("  Skipped by header: {}", crawl.skipped);
    log::info!("  Failed: {}", crawl.failed);
    log::info!("Records pruned: {}", crawl.pruned);
    if let Some(render) = &report.render {
        log::info!(
            "Pages rendered: {} documents, {} index, {} tag",
            render.documents,
            render.index_pages,
            render.tag_pages
        );
    }
    if crawl.failed > 0 {
        log::warn!("Some files failed to parse. Check logs above for details.");
    }

    Ok(())
}
