//! The stored document record and its navigation projection.
//!
//! Core fields are fixed; anything else a header carries lands in a
//! separate extension map that is validated when written.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{KilnError, Result};

/// Header keys that map onto core fields and may not appear in the extension map.
pub const CORE_KEYS: &[&str] = &[
    "title",
    "date",
    "type",
    "status",
    "tags",
    "body",
    "uri",
    "sourceuri",
    "source_uri",
    "output_uri",
    "content_hash",
    "cached",
    "rendered",
];

/// Status as written in the content header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RawStatus {
    Draft,
    Published,
    /// Published once `date` has passed.
    PublishedDate,
}

impl RawStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RawStatus::Draft => "draft",
            RawStatus::Published => "published",
            RawStatus::PublishedDate => "published-date",
        }
    }

    /// Resolve against `now`. Never yields anything but draft or published.
    pub fn resolve(&self, date: DateTime<Utc>, now: DateTime<Utc>) -> Status {
        match self {
            RawStatus::Draft => Status::Draft,
            RawStatus::Published => Status::Published,
            RawStatus::PublishedDate if date <= now => Status::Published,
            RawStatus::PublishedDate => Status::Draft,
        }
    }
}

impl FromStr for RawStatus {
    type Err = KilnError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "draft" => Ok(RawStatus::Draft),
            "published" => Ok(RawStatus::Published),
            "published-date" | "published-on-date" => Ok(RawStatus::PublishedDate),
            other => Err(KilnError::InvalidInput(format!("unknown status: {}", other))),
        }
    }
}

impl fmt::Display for RawStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status after date-based resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Draft,
    Published,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Draft => "draft",
            Status::Published => "published",
        }
    }

    pub fn is_published(&self) -> bool {
        matches!(self, Status::Published)
    }
}

impl FromStr for Status {
    type Err = KilnError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "draft" => Ok(Status::Draft),
            "published" => Ok(Status::Published),
            other => Err(KilnError::InvalidInput(format!("unknown resolved status: {}", other))),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One stored content item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub source_uri: String,
    pub output_uri: String,
    pub output_uri_no_ext: String,
    pub doc_type: String,
    pub raw_status: RawStatus,
    pub status: Status,
    pub date: DateTime<Utc>,
    pub title: Option<String>,
    pub body: String,
    pub tags: BTreeSet<String>,
    pub content_hash: String,
    pub cached: bool,
    pub rendered: bool,
    extra: BTreeMap<String, Value>,
}

impl Document {
    /// Build a freshly parsed, not yet stored document.
    ///
    /// `status` is resolved from `raw_status` against `now`.
    pub fn new(
        source_uri: impl Into<String>,
        doc_type: impl Into<String>,
        raw_status: RawStatus,
        date: DateTime<Utc>,
        content_hash: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            source_uri: source_uri.into(),
            output_uri: String::new(),
            output_uri_no_ext: String::new(),
            doc_type: doc_type.into(),
            raw_status,
            status: raw_status.resolve(date, now),
            date,
            title: None,
            body: String::new(),
            tags: BTreeSet::new(),
            content_hash: content_hash.into(),
            cached: false,
            rendered: false,
            extra: BTreeMap::new(),
        }
    }

    pub fn is_published(&self) -> bool {
        self.status.is_published()
    }

    /// Custom header attributes.
    pub fn extra(&self) -> &BTreeMap<String, Value> {
        &self.extra
    }

    pub fn get_extra(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    /// Set a custom attribute.
    ///
    /// Keys must be identifier-like and must not shadow a core field; null
    /// values are rejected.
    pub fn set_extra(&mut self, key: &str, value: Value) -> Result<()> {
        validate_extra_key(key)?;
        if value.is_null() {
            return Err(KilnError::InvalidInput(format!(
                "extension attribute '{}' has a null value",
                key
            )));
        }
        self.extra.insert(key.to_string(), value);
        Ok(())
    }

    /// Replace the whole extension map, validating every entry.
    pub fn set_extra_map(&mut self, extra: BTreeMap<String, Value>) -> Result<()> {
        self.extra.clear();
        for (key, value) in extra {
            self.set_extra(&key, value)?;
        }
        Ok(())
    }

    pub fn nav_link(&self) -> NavLink {
        NavLink::from(self)
    }
}

fn extra_key_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9_.:\-]*$").expect("extension key pattern is valid")
    })
}

fn validate_extra_key(key: &str) -> Result<()> {
    if !extra_key_pattern().is_match(key) {
        return Err(KilnError::InvalidInput(format!(
            "invalid extension attribute key: '{}'",
            key
        )));
    }
    if CORE_KEYS.contains(&key.to_ascii_lowercase().as_str()) {
        return Err(KilnError::InvalidInput(format!(
            "extension attribute '{}' shadows a core field",
            key
        )));
    }
    Ok(())
}

/// Minimal read-only view of a document used for links between documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavLink {
    pub output_uri: String,
    pub output_uri_no_ext: String,
    pub title: Option<String>,
}

impl From<&Document> for NavLink {
    fn from(doc: &Document) -> Self {
        Self {
            output_uri: doc.output_uri.clone(),
            output_uri_no_ext: doc.output_uri_no_ext.clone(),
            title: doc.title.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_published_date_resolves_against_now() {
        let now = at(10);
        assert_eq!(RawStatus::PublishedDate.resolve(at(9), now), Status::Published);
        assert_eq!(RawStatus::PublishedDate.resolve(now, now), Status::Published);
        assert_eq!(
            RawStatus::PublishedDate.resolve(now + Duration::seconds(1), now),
            Status::Draft
        );
        assert_eq!(RawStatus::Draft.resolve(at(1), now), Status::Draft);
        assert_eq!(RawStatus::Published.resolve(at(20), now), Status::Published);
    }

    #[test]
    fn test_raw_status_parsing_accepts_both_spellings() {
        assert_eq!("published-date".parse::<RawStatus>().unwrap(), RawStatus::PublishedDate);
        assert_eq!("Published-On-Date".parse::<RawStatus>().unwrap(), RawStatus::PublishedDate);
        assert_eq!(" draft ".parse::<RawStatus>().unwrap(), RawStatus::Draft);
        assert!("archived".parse::<RawStatus>().is_err());
    }

    #[test]
    fn test_extra_validation() {
        let mut doc = Document::new("a.md", "post", RawStatus::Published, at(1), "h", at(2));
        doc.set_extra("summary", json!("short")).unwrap();
        doc.set_extra("og.image", json!("/img.png")).unwrap();
        assert_eq!(doc.get_extra("summary"), Some(&json!("short")));

        assert!(doc.set_extra("title", json!("x")).is_err());
        assert!(doc.set_extra("Tags", json!("x")).is_err());
        assert!(doc.set_extra("bad key", json!("x")).is_err());
        assert!(doc.set_extra("", json!("x")).is_err());
        assert!(doc.set_extra("nothing", Value::Null).is_err());
        assert_eq!(doc.extra().len(), 2);
    }

    #[test]
    fn test_nav_link_carries_only_projection() {
        let mut doc = Document::new("blog/a.md", "post", RawStatus::Published, at(1), "h", at(2));
        doc.output_uri = "blog/a.html".to_string();
        doc.output_uri_no_ext = "blog/a".to_string();
        doc.title = Some("A".to_string());
        let link = doc.nav_link();
        assert_eq!(link.output_uri, "blog/a.html");
        assert_eq!(link.output_uri_no_ext, "blog/a");
        assert_eq!(link.title.as_deref(), Some("A"));
    }
}
