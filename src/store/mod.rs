//! The document store: one SQLite row per content item, keyed by source URI.
//!
//! Every mutation is one of upsert (NEW/UPDATED), mark-rendered, or prune.
//! Listing queries share a single ordering, newest first with ties broken by
//! `source_uri`, so repeated queries within a run always agree.

mod row;

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::Path;

use rusqlite::params;
use serde::Serialize;

use crate::db::Db;
use crate::document::{Document, RawStatus, Status};
use crate::error::{KilnError, Result};
use row::{DOCUMENT_COLUMNS, DOCUMENT_ORDER, date_from_millis, query_documents};

/// What the change detector needs to know about a stored record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredState {
    pub content_hash: String,
    pub doc_type: String,
    pub raw_status: RawStatus,
    pub status: Status,
    pub date: chrono::DateTime<chrono::Utc>,
}

/// Per-type counters reported by the stats tool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TypeStats {
    pub doc_type: String,
    pub published: usize,
    pub draft: usize,
    pub unrendered: usize,
}

/// Persistent content store.
#[derive(Debug, Clone)]
pub struct ContentStore {
    db: Db,
    post_types: Vec<String>,
}

impl ContentStore {
    /// Wrap an already migrated database. Post-like types default to `post`.
    pub fn new(db: Db) -> Self {
        Self {
            db,
            post_types: vec!["post".to_string()],
        }
    }

    /// Open the database at `db_path` and apply pending migrations.
    pub async fn open(db_path: &Path, migrations_dir: &Path) -> Result<Self> {
        let db = Db::new(db_path);
        db.migrate(migrations_dir).await?;
        Ok(Self::new(db))
    }

    /// Types counted as posts by [`ContentStore::get_published_posts_by_tag`].
    pub fn with_post_types<I, S>(mut self, post_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.post_types = post_types.into_iter().map(Into::into).collect();
        self
    }

    pub fn post_types(&self) -> &[String] {
        &self.post_types
    }

    pub fn db(&self) -> &Db {
        &self.db
    }

    /// Insert or wholesale replace the record for `doc.source_uri`.
    ///
    /// The stored record is always `cached` and never `rendered`; tags are
    /// replaced along with every other attribute.
    pub async fn upsert(&self, doc: &Document) -> Result<()> {
        if doc.content_hash.is_empty() {
            return Err(KilnError::InvalidInput(format!(
                "refusing to store {} without a content hash",
                doc.source_uri
            )));
        }
        let doc = doc.clone();
        let extra_json = serde_json::to_string(doc.extra())?;

        self.db.with_connection(move |conn| {
            let tx = conn.transaction()?;
            tx.execute(
                r#"
                INSERT INTO documents (
                    source_uri, output_uri, output_uri_no_ext, doc_type, raw_status,
                    status, date_ms, title, body, content_hash, cached, rendered, extra_json
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, 1, 0, ?11)
                ON CONFLICT(source_uri) DO UPDATE SET
                    output_uri = excluded.output_uri,
                    output_uri_no_ext = excluded.output_uri_no_ext,
                    doc_type = excluded.doc_type,
                    raw_status = excluded.raw_status,
                    status = excluded.status,
                    date_ms = excluded.date_ms,
                    title = excluded.title,
                    body = excluded.body,
                    content_hash = excluded.content_hash,
                    cached = 1,
                    rendered = 0,
                    extra_json = excluded.extra_json
                "#,
                params![
                    doc.source_uri,
                    doc.output_uri,
                    doc.output_uri_no_ext,
                    doc.doc_type,
                    doc.raw_status.as_str(),
                    doc.status.as_str(),
                    doc.date.timestamp_millis(),
                    doc.title,
                    doc.body,
                    doc.content_hash,
                    extra_json,
                ],
            )?;
            tx.execute(
                "DELETE FROM document_tags WHERE source_uri = ?1",
                params![doc.source_uri],
            )?;
            {
                let mut stmt = tx.prepare(
                    "INSERT OR IGNORE INTO document_tags (source_uri, tag) VALUES (?1, ?2)",
                )?;
                for tag in &doc.tags {
                    stmt.execute(params![doc.source_uri, tag])?;
                }
            }
            tx.commit()?;
            Ok(())
        })
        .await
    }

    /// Snapshot of every stored record's change-detection state, keyed by source URI.
    pub async fn stored_states(&self) -> Result<HashMap<String, StoredState>> {
        self.db.with_connection(|conn| {
            let mut stmt = conn.prepare(
                "SELECT source_uri, content_hash, doc_type, raw_status, status, date_ms FROM documents",
            )?;
            let rows = stmt
                .query_map([], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, i64>(5)?,
                    ))
                })?
                .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;

            let mut states = HashMap::with_capacity(rows.len());
            for (uri, content_hash, doc_type, raw_status, status, date_ms) in rows {
                states.insert(uri, StoredState {
                    content_hash,
                    doc_type,
                    raw_status: raw_status.parse()?,
                    status: status.parse()?,
                    date: date_from_millis(date_ms)?,
                });
            }
            Ok(states)
        })
        .await
    }

    /// Every document of `doc_type`, newest first.
    pub async fn get_all_content(&self, doc_type: &str) -> Result<Vec<Document>> {
        self.query(
            format!("SELECT {} FROM documents d WHERE d.doc_type = ?1 {}", DOCUMENT_COLUMNS, DOCUMENT_ORDER),
            vec![doc_type.to_string()],
        )
        .await
    }

    /// Published documents of `doc_type`, newest first.
    pub async fn get_published_content(&self, doc_type: &str) -> Result<Vec<Document>> {
        self.query(
            format!(
                "SELECT {} FROM documents d WHERE d.doc_type = ?1 AND d.status = 'published' {}",
                DOCUMENT_COLUMNS, DOCUMENT_ORDER
            ),
            vec![doc_type.to_string()],
        )
        .await
    }

    /// Published documents of the post-like types carrying `tag`.
    pub async fn get_published_posts_by_tag(&self, tag: &str) -> Result<Vec<Document>> {
        if self.post_types.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = (0..self.post_types.len())
            .map(|i| format!("?{}", i + 2))
            .collect::<Vec<_>>()
            .join(",");
        let sql = format!(
            "SELECT {} FROM documents d \
             WHERE d.status = 'published' AND d.doc_type IN ({}) \
             AND EXISTS (SELECT 1 FROM document_tags t WHERE t.source_uri = d.source_uri AND t.tag = ?1) {}",
            DOCUMENT_COLUMNS, placeholders, DOCUMENT_ORDER
        );
        let mut params = vec![tag.to_string()];
        params.extend(self.post_types.iter().cloned());
        self.query(sql, params).await
    }

    /// Published documents of any type carrying `tag`.
    pub async fn get_published_documents_by_tag(&self, tag: &str) -> Result<Vec<Document>> {
        self.query(
            format!(
                "SELECT {} FROM documents d WHERE d.status = 'published' \
                 AND EXISTS (SELECT 1 FROM document_tags t WHERE t.source_uri = d.source_uri AND t.tag = ?1) {}",
                DOCUMENT_COLUMNS, DOCUMENT_ORDER
            ),
            vec![tag.to_string()],
        )
        .await
    }

    /// Look a document up by source or output URI.
    ///
    /// More than one match means two sources write the same output; the
    /// first by source URI wins and a warning is logged.
    pub async fn get_document_by_uri(&self, uri: &str) -> Result<Option<Document>> {
        let mut matches = self
            .query(
                format!(
                    "SELECT {} FROM documents d WHERE d.source_uri = ?1 OR d.output_uri = ?1 \
                     ORDER BY d.source_uri ASC",
                    DOCUMENT_COLUMNS
                ),
                vec![uri.to_string()],
            )
            .await?;
        if matches.len() > 1 {
            let sources: Vec<&str> = matches.iter().map(|d| d.source_uri.as_str()).collect();
            log::warn!(
                "Store consistency: {} documents match uri {} ({})",
                matches.len(),
                uri,
                sources.join(", ")
            );
        }
        if matches.is_empty() {
            Ok(None)
        } else {
            Ok(Some(matches.swap_remove(0)))
        }
    }

    /// Documents not yet rendered, newest first.
    pub async fn unrendered_content(&self) -> Result<Vec<Document>> {
        self.query(
            format!("SELECT {} FROM documents d WHERE d.rendered = 0 {}", DOCUMENT_COLUMNS, DOCUMENT_ORDER),
            Vec::new(),
        )
        .await
    }

    /// Flag `doc` as rendered. Calling it again is a no-op.
    pub async fn mark_content_as_rendered(&self, doc: &Document) -> Result<()> {
        let source_uri = doc.source_uri.clone();
        let found = self
            .db
            .with_connection(move |conn| {
                let n = conn.execute(
                    "UPDATE documents SET rendered = 1 WHERE source_uri = ?1",
                    params![source_uri],
                )?;
                Ok(n)
            })
            .await?;
        if found == 0 {
            return Err(KilnError::DocumentNotFound(doc.source_uri.clone()));
        }
        Ok(())
    }

    /// Distinct tags across published documents.
    pub async fn all_tags(&self) -> Result<BTreeSet<String>> {
        self.db.with_connection(|conn| {
            let mut stmt = conn.prepare(
                "SELECT DISTINCT t.tag FROM document_tags t \
                 JOIN documents d ON d.source_uri = t.source_uri \
                 WHERE d.status = 'published'",
            )?;
            let tags = stmt
                .query_map([], |row| row.get::<_, String>(0))?
                .collect::<std::result::Result<BTreeSet<_>, rusqlite::Error>>()?;
            Ok(tags)
        })
        .await
    }

    /// Delete every record whose source URI is not in `current`. Returns the deleted URIs.
    pub async fn prune_missing(&self, current: &HashSet<String>) -> Result<Vec<String>> {
        let current = current.clone();
        self.db.with_connection(move |conn| {
            let stored = {
                let mut stmt = conn.prepare("SELECT source_uri FROM documents ORDER BY source_uri")?;
                let uris = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;
                uris
            };
            let orphans: Vec<String> = stored.into_iter().filter(|u| !current.contains(u)).collect();
            if orphans.is_empty() {
                return Ok(orphans);
            }
            let tx = conn.transaction()?;
            {
                let mut stmt = tx.prepare("DELETE FROM documents WHERE source_uri = ?1")?;
                for uri in &orphans {
                    stmt.execute(params![uri])?;
                }
            }
            tx.commit()?;
            Ok(orphans)
        })
        .await
    }

    /// Number of stored documents.
    pub async fn count(&self) -> Result<usize> {
        self.db.with_connection(|conn| {
            let n: i64 = conn.query_row("SELECT COUNT(*) FROM documents", [], |r| r.get(0))?;
            Ok(n as usize)
        })
        .await
    }

    /// Published/draft/unrendered counts for every stored type.
    pub async fn stats(&self) -> Result<Vec<TypeStats>> {
        self.db.with_connection(|conn| {
            let mut stmt = conn.prepare(
                "SELECT doc_type, \
                        SUM(CASE WHEN status = 'published' THEN 1 ELSE 0 END), \
                        SUM(CASE WHEN status = 'draft' THEN 1 ELSE 0 END), \
                        SUM(CASE WHEN rendered = 0 THEN 1 ELSE 0 END) \
                 FROM documents GROUP BY doc_type ORDER BY doc_type",
            )?;
            let stats = stmt
                .query_map([], |row| {
                    Ok(TypeStats {
                        doc_type: row.get(0)?,
                        published: row.get::<_, i64>(1)? as usize,
                        draft: row.get::<_, i64>(2)? as usize,
                        unrendered: row.get::<_, i64>(3)? as usize,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;
            Ok(stats)
        })
        .await
    }

    /// Remove every record, forcing the next crawl to see all files as NEW.
    pub async fn clear(&self) -> Result<usize> {
        self.db.with_connection(|conn| {
            let n = conn.execute("DELETE FROM documents", [])?;
            Ok(n)
        })
        .await
    }

    async fn query(&self, sql: String, params: Vec<String>) -> Result<Vec<Document>> {
        self.db
            .with_connection(move |conn| query_documents(conn, &sql, &params))
            .await
    }
}
