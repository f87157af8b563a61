//! Turn a parsed file into a [`Document`], or decide to skip it.
//!
//! Skipping is a content decision (no type, no status, unknown type) and is
//! logged at warn level; only malformed content is an error.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

use crate::crawl::metadata::{UriOptions, output_uris, system_time_to_utc};
use crate::crawl::parsers::{ParsedContent, ParserRegistry};
use crate::crawl::walker::FileMetadata;
use crate::document::{CORE_KEYS, Document, RawStatus};
use crate::error::{KilnError, Result};
use crate::types::DocumentTypes;

/// Inputs shared by every file of one crawl.
#[derive(Debug, Clone, Copy)]
pub struct ParseContext<'a> {
    pub types: &'a DocumentTypes,
    pub default_type: Option<&'a str>,
    pub default_status: Option<RawStatus>,
    /// chrono format for header dates; RFC 3339 is always accepted too.
    pub date_format: &'a str,
    pub uri_options: &'a UriOptions,
    /// Reference time for resolving `published-date`.
    pub now: DateTime<Utc>,
}

/// Parse one source file. `Ok(None)` means the file is deliberately skipped.
pub fn parse_document(
    registry: &ParserRegistry,
    file: &FileMetadata,
    content_hash: &str,
    ctx: &ParseContext<'_>,
) -> Result<Option<Document>> {
    let parser = match registry.find_parser(&file.extension) {
        Some(p) => p,
        None => {
            log::debug!("No parser for {}, skipping", file.relative_path);
            return Ok(None);
        }
    };

    let bytes = std::fs::read(&file.absolute_path)?;
    let content = String::from_utf8(bytes)
        .map_err(|_| KilnError::Parse(format!("{} is not valid UTF-8", file.relative_path)))?;

    let parsed = parser.parse(&content, &file.relative_path)?;
    assemble(parsed, file, content_hash, ctx)
}

/// Apply defaults and validation to parsed header + body.
pub fn assemble(
    parsed: ParsedContent,
    file: &FileMetadata,
    content_hash: &str,
    ctx: &ParseContext<'_>,
) -> Result<Option<Document>> {
    let uri = file.relative_path.as_str();
    let mut core: BTreeMap<String, Value> = BTreeMap::new();
    let mut extra: Vec<(String, Value)> = Vec::new();

    for (key, value) in parsed.header {
        let lower = key.to_ascii_lowercase();
        match lower.as_str() {
            "title" | "date" | "type" | "status" | "tags" => {
                core.insert(lower, value);
            }
            _ if CORE_KEYS.contains(&lower.as_str()) => {
                log::debug!("{}: ignoring reserved header key '{}'", uri, key);
            }
            _ => extra.push((key, value)),
        }
    }

    let doc_type = match string_value(core.get("type")).or(ctx.default_type.map(str::to_string)) {
        Some(t) => t,
        None => {
            log::warn!("Skipping {}: no type in header and no default type configured", uri);
            return Ok(None);
        }
    };
    if !ctx.types.contains(&doc_type) {
        log::warn!("Skipping {}: unknown document type '{}'", uri, doc_type);
        return Ok(None);
    }

    let raw_status = match string_value(core.get("status")) {
        Some(s) => match s.parse::<RawStatus>() {
            Ok(status) => status,
            Err(_) => {
                log::warn!("Skipping {}: unrecognised status '{}'", uri, s);
                return Ok(None);
            }
        },
        None => match ctx.default_status {
            Some(status) => status,
            None => {
                log::warn!("Skipping {}: no status in header and no default status configured", uri);
                return Ok(None);
            }
        },
    };

    let date = match core.get("date") {
        Some(value) => parse_date(value, ctx.date_format)
            .map_err(|e| KilnError::Parse(format!("{}: {}", uri, e)))?,
        None => system_time_to_utc(file.modified)?,
    };

    let mut doc = Document::new(uri, doc_type, raw_status, date, content_hash, ctx.now);
    let (output_uri, output_uri_no_ext) = output_uris(uri, ctx.uri_options);
    doc.output_uri = output_uri;
    doc.output_uri_no_ext = output_uri_no_ext;
    doc.title = string_value(core.get("title"));
    doc.tags = parse_tags(core.get("tags"));
    doc.body = parsed.body;

    for (key, value) in extra {
        if value.is_null() {
            continue;
        }
        doc.set_extra(&key, value)
            .map_err(|e| KilnError::Parse(format!("{}: {}", uri, e)))?;
    }

    Ok(Some(doc))
}

/// Non-empty string form of a scalar header value.
fn string_value(value: Option<&Value>) -> Option<String> {
    let s = match value? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!s.is_empty()).then_some(s)
}

/// Tags from a comma-separated string or a list; blanks dropped, case kept.
fn parse_tags(value: Option<&Value>) -> std::collections::BTreeSet<String> {
    let raw: Vec<String> = match value {
        Some(Value::String(s)) => s.split(',').map(str::to_string).collect(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| string_value(Some(v)))
            .collect(),
        Some(other) => string_value(Some(other)).into_iter().collect(),
        None => Vec::new(),
    };
    raw.into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Header date: RFC 3339, then `format` as date-time, then as date (midnight UTC).
pub fn parse_date(value: &Value, format: &str) -> Result<DateTime<Utc>> {
    let s = match value {
        Value::String(s) => s.trim(),
        other => {
            return Err(KilnError::Parse(format!("date must be a string, found {}", other)));
        }
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
        return Ok(dt.and_utc());
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, format) {
        if let Some(dt) = d.and_hms_opt(0, 0, 0) {
            return Ok(dt.and_utc());
        }
    }
    Err(KilnError::Parse(format!("unparseable date '{}' (expected {})", s, format)))
}
