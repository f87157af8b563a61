use anyhow::Result;
use kiln::db::{Db, migrate};
use kiln::error::KilnError;
use kiln::render::FileRenderer;
use kiln::{BakeOptions, Config, Site};

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(|s| s.as_str()).unwrap_or("bake");

    let config = Config::load()?;
    config.init_logging();

    match command {
        "verify" => run_schema_verification(&config).await?,
        "bake" => run_bake(config).await?,
        other => {
            anyhow::bail!("Unknown command '{}'. Usage: kiln [bake|verify]", other);
        }
    }

    Ok(())
}

async fn run_bake(config: Config) -> Result<()> {
    log::info!("Starting kiln v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Content folder: {}", config.content_folder().display());
    log::info!("Output folder: {}", config.output_folder().display());

    let renderer = FileRenderer::new(config.output_folder());
    let site = Site::open(config).await?;
    site.bake(&renderer, BakeOptions::default()).await?;
    Ok(())
}

/// Run database schema verification
async fn run_schema_verification(config: &Config) -> Result<()> {
    log::info!("Starting kiln v{} (schema verification)", env!("CARGO_PKG_VERSION"));
    log::info!("Database path: {}", config.db_path().display());

    let db = Db::new(config.db_path());
    db.migrate(config.migrations_dir()).await?;
    log::info!("Database initialized successfully");

    verify_database_schema(&db).await?;
    Ok(())
}

/// Verify that all expected database objects exist
async fn verify_database_schema(db: &Db) -> Result<()> {
    db.with_connection(|conn| {
        let mut stmt = conn.prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")?;
        let tables: Vec<String> = stmt.query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;

        let expected_tables = ["document_tags", "documents", "schema_migrations"];
        let mut all_tables_exist = true;
        for table in &expected_tables {
            if tables.iter().any(|t| t == table) {
                log::debug!("✓ Table exists: {}", table);
            } else {
                log::error!("Missing table: {}", table);
                all_tables_exist = false;
            }
        }
        if !all_tables_exist {
            return Err(KilnError::Config("Not all required tables exist".to_string()));
        }

        let applied = migrate::get_applied_migrations(conn)?;
        if applied.len() < 2 {
            return Err(KilnError::Config(format!("Expected at least 2 migrations, found {}", applied.len())));
        }
        log::debug!("✓ {} migrations applied", applied.len());

        let mut stmt = conn.prepare("SELECT name FROM sqlite_master WHERE type='index' AND name LIKE 'idx_%' ORDER BY name")?;
        let indexes: Vec<String> = stmt.query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;
        for index_name in ["idx_documents_type_date", "idx_documents_rendered", "idx_document_tags_tag"] {
            if indexes.iter().any(|i| i == index_name) {
                log::debug!("✓ Query index exists: {}", index_name);
            } else {
                log::warn!("Query index not found: {} (migration 002 may not be applied)", index_name);
            }
        }

        let journal_mode: String = conn.query_row("PRAGMA journal_mode", [], |row| row.get(0))?;
        if journal_mode.to_uppercase() != "WAL" {
            return Err(KilnError::Config(format!("Journal mode is not WAL: {}", journal_mode)));
        }

        let foreign_keys: i32 = conn.query_row("PRAGMA foreign_keys", [], |row| row.get(0))?;
        if foreign_keys != 1 {
            return Err(KilnError::Config("Foreign keys not enabled".to_string()));
        }

        let integrity: String = conn.query_row("PRAGMA integrity_check", [], |row| row.get(0))?;
        if integrity != "ok" {
            return Err(KilnError::Config(format!("Database integrity check failed: {}", integrity)));
        }
        log::info!("✓ Database integrity: OK");

        Ok(())
    }).await?;

    log::info!("✓ Database schema verification complete");
    Ok(())
}
