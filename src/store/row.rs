//! Mapping between `documents` rows and [`Document`].

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use rusqlite::{Connection, Row, params};
use serde_json::Value;

use crate::document::{Document, RawStatus, Status};
use crate::error::{KilnError, Result};

/// Column list shared by every document query; `d` is the documents alias.
pub(crate) const DOCUMENT_COLUMNS: &str = "d.source_uri, d.output_uri, d.output_uri_no_ext, \
     d.doc_type, d.raw_status, d.status, d.date_ms, d.title, d.body, d.content_hash, \
     d.cached, d.rendered, d.extra_json";

/// Listing order: newest first, ties broken by source URI.
pub(crate) const DOCUMENT_ORDER: &str = "ORDER BY d.date_ms DESC, d.source_uri ASC";

/// Raw column values, before status and JSON decoding.
pub(crate) struct DocumentRow {
    source_uri: String,
    output_uri: String,
    output_uri_no_ext: String,
    doc_type: String,
    raw_status: String,
    status: String,
    date_ms: i64,
    title: Option<String>,
    body: String,
    content_hash: String,
    cached: bool,
    rendered: bool,
    extra_json: String,
}

impl DocumentRow {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            source_uri: row.get(0)?,
            output_uri: row.get(1)?,
            output_uri_no_ext: row.get(2)?,
            doc_type: row.get(3)?,
            raw_status: row.get(4)?,
            status: row.get(5)?,
            date_ms: row.get(6)?,
            title: row.get(7)?,
            body: row.get(8)?,
            content_hash: row.get(9)?,
            cached: row.get(10)?,
            rendered: row.get(11)?,
            extra_json: row.get(12)?,
        })
    }

    pub(crate) fn into_document(self) -> Result<Document> {
        let raw_status: RawStatus = self.raw_status.parse()?;
        let status: Status = self.status.parse()?;
        let date = date_from_millis(self.date_ms)?;
        let extra: BTreeMap<String, Value> = serde_json::from_str(&self.extra_json)?;

        // `now` only feeds status resolution, which is overwritten with the stored value.
        let mut doc = Document::new(
            self.source_uri,
            self.doc_type,
            raw_status,
            date,
            self.content_hash,
            date,
        );
        doc.status = status;
        doc.output_uri = self.output_uri;
        doc.output_uri_no_ext = self.output_uri_no_ext;
        doc.title = self.title;
        doc.body = self.body;
        doc.cached = self.cached;
        doc.rendered = self.rendered;
        doc.set_extra_map(extra)?;
        Ok(doc)
    }
}

pub(crate) fn date_from_millis(ms: i64) -> Result<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .ok_or_else(|| KilnError::InvalidInput(format!("stored date out of range: {}", ms)))
}

/// Run a document query and attach each document's tags.
pub(crate) fn query_documents(
    conn: &Connection,
    sql: &str,
    params: &[String],
) -> Result<Vec<Document>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(rusqlite::params_from_iter(params.iter()), DocumentRow::from_row)?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;

    let mut tag_stmt =
        conn.prepare_cached("SELECT tag FROM document_tags WHERE source_uri = ?1 ORDER BY tag")?;
    let mut docs = Vec::with_capacity(rows.len());
    for row in rows {
        let mut doc = row.into_document()?;
        doc.tags = tag_stmt
            .query_map(params![doc.source_uri], |r| r.get::<_, String>(0))?
            .collect::<std::result::Result<BTreeSet<_>, rusqlite::Error>>()?;
        docs.push(doc);
    }
    Ok(docs)
}
