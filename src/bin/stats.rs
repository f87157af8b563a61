use kiln::{Config, ContentStore, db::Db};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    config.init_logging();
    let db = Db::new(config.db_path());
    db.migrate(config.migrations_dir()).await?;
    let store = ContentStore::new(db).with_post_types(config.content.post_types.iter().cloned());

    println!("\n=== Kiln Content Statistics ===\n");

    let stats = store.stats().await?;
    if stats.is_empty() {
        println!("No documents stored.");
        println!("\nRun `bake` to crawl {}.", config.content_folder().display());
        return Ok(());
    }

    println!("{:-<56}", "");
    println!(
        "{:<20} {:>8} {:>10} {:>8} {:>8}",
        "Type", "Total", "Published", "Draft", "Pending"
    );
    println!("{:-<56}", "");

    let mut totals = (0, 0, 0);
    for s in &stats {
        println!(
            "{:<20} {:>8} {:>10} {:>8} {:>8}",
            s.doc_type,
            s.published + s.draft,
            s.published,
            s.draft,
            s.unrendered
        );
        totals.0 += s.published;
        totals.1 += s.draft;
        totals.2 += s.unrendered;
    }
    println!("{:-<56}", "");
    println!(
        "{:<20} {:>8} {:>10} {:>8} {:>8}",
        "all",
        totals.0 + totals.1,
        totals.0,
        totals.1,
        totals.2
    );

    let types = config.document_types();
    let unknown: Vec<&str> = stats
        .iter()
        .map(|s| s.doc_type.as_str())
        .filter(|t| !types.contains(t))
        .collect();
    if !unknown.is_empty() {
        println!("\nTypes no longer registered: {}", unknown.join(", "));
    }

    let tags = store.all_tags().await?;
    println!("\nTags across published documents: {}", tags.len());
    for tag in &tags {
        let posts = store.get_published_posts_by_tag(tag).await?;
        let docs = store.get_published_documents_by_tag(tag).await?;
        println!("  {:<24} {:>4} posts {:>4} documents", tag, posts.len(), docs.len());
    }

    println!();

    Ok(())
}
