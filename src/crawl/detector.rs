//! Change detection: decide per file whether it needs parsing.
//!
//! The detector works from a snapshot of stored hashes taken once at the
//! start of a crawl, so classifying never touches the store.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};

use crate::document::{RawStatus, Status};
use crate::error::Result;
use crate::store::{ContentStore, StoredState};
use crate::types::DocumentTypes;

/// Outcome of comparing a file against its stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    /// No stored record for this URI.
    New,
    /// Stored hash differs, a scheduled publication came due, or the stored
    /// type is no longer registered.
    Updated,
    /// Stored hash matches; nothing to do.
    Identical,
}

impl Classification {
    /// Whether the file must be parsed and upserted.
    pub fn needs_parse(&self) -> bool {
        !matches!(self, Classification::Identical)
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Classification::New => "new",
            Classification::Updated => "updated",
            Classification::Identical => "identical",
        })
    }
}

/// Snapshot of stored state used to classify the files of one crawl.
#[derive(Debug, Clone)]
pub struct ChangeDetector {
    stored: HashMap<String, StoredState>,
    now: DateTime<Utc>,
}

impl ChangeDetector {
    pub fn new(stored: HashMap<String, StoredState>, now: DateTime<Utc>) -> Self {
        Self { stored, now }
    }

    /// Snapshot the store.
    pub async fn load(store: &ContentStore, now: DateTime<Utc>) -> Result<Self> {
        Ok(Self::new(store.stored_states().await?, now))
    }

    /// A record whose type left `types` is re-parsed so the crawl can skip it.
    pub fn classify(&self, source_uri: &str, current_hash: &str, types: &DocumentTypes) -> Classification {
        match self.stored.get(source_uri) {
            None => Classification::New,
            Some(state) if state.content_hash != current_hash => Classification::Updated,
            Some(state) if self.publication_due(state) => Classification::Updated,
            Some(state) if !types.contains(&state.doc_type) => Classification::Updated,
            Some(_) => Classification::Identical,
        }
    }

    pub fn stored_count(&self) -> usize {
        self.stored.len()
    }

    fn publication_due(&self, state: &StoredState) -> bool {
        state.raw_status == RawStatus::PublishedDate
            && state.status == Status::Draft
            && state.date <= self.now
    }
}
