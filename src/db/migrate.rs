use rusqlite::{Connection, params};
use std::fs;
use std::path::Path;
use crate::error::{KilnError, Result};

/// One versioned SQL file from the migrations directory.
struct Migration {
    version: u32,
    name: String,
    sql: String,
}

fn ensure_migrations_table(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;
    Ok(())
}

/// Names of applied migrations, in version order.
pub fn get_applied_migrations(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM schema_migrations ORDER BY version")?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;
    Ok(names)
}

/// Load `NNN_name.sql` files, sorted by version.
fn load_migrations(migrations_dir: &Path) -> Result<Vec<Migration>> {
    let entries = fs::read_dir(migrations_dir).map_err(|e| {
        KilnError::Config(format!(
            "cannot read migrations directory {}: {}",
            migrations_dir.display(),
            e
        ))
    })?;

    let mut migrations = Vec::new();
    for entry in entries.filter_map(|e| e.ok()) {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) != Some("sql") {
            continue;
        }
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| KilnError::Config("Invalid migration filename".to_string()))?;

        let version_str = filename.split('_').next().unwrap_or_default();
        let version: u32 = version_str
            .parse()
            .map_err(|_| KilnError::Config(format!("Invalid migration version in {}", filename)))?;

        migrations.push(Migration {
            version,
            name: filename.trim_end_matches(".sql").to_string(),
            sql: fs::read_to_string(&path)?,
        });
    }

    migrations.sort_by_key(|m| m.version);
    for pair in migrations.windows(2) {
        if pair[0].version == pair[1].version {
            return Err(KilnError::Config(format!(
                "Duplicate migration version {} ({} and {})",
                pair[0].version, pair[0].name, pair[1].name
            )));
        }
    }
    Ok(migrations)
}

/// Run all pending migrations, each in its own transaction.
pub fn run_migrations(conn: &mut Connection, migrations_dir: &Path) -> Result<()> {
    ensure_migrations_table(conn)?;

    let applied = get_applied_migrations(conn)?;
    let migrations = load_migrations(migrations_dir)?;
    let mut count = 0;

    for migration in migrations {
        if applied.contains(&migration.name) {
            log::debug!("Migration {} already applied, skipping", migration.name);
            continue;
        }

        log::info!("Applying migration: {} (version {})", migration.name, migration.version);

        let tx = conn.transaction()?;
        tx.execute_batch(&migration.sql).map_err(|e| {
            KilnError::Config(format!("Failed to execute migration {}: {}", migration.name, e))
        })?;
        tx.execute(
            "INSERT INTO schema_migrations (version, name) VALUES (?1, ?2)",
            params![migration.version, migration.name],
        )?;
        tx.commit()?;
        count += 1;
    }

    if count > 0 {
        log::info!("Applied {} migration(s)", count);
    }
    Ok(())
}
