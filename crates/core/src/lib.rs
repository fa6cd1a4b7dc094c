//! Canteen core types: the lightweight search index and the records it points at.

#![forbid(unsafe_code)]

use serde::{Deserialize, Deserializer, Serialize};
use smallvec::SmallVec;

pub type RecordId = String;

/// Lightweight, client-cached projection of a venue used only for matching.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SearchRecord {
    #[serde(deserialize_with = "de_id")]
    pub id: RecordId,
    pub name: String,
    /// Category (e.g. "mainfood", "drinks"). Used for post-filtering, never for scoring.
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub location_description: Option<String>,
    #[serde(default)]
    pub tags: SmallVec<[String; 4]>,
    #[serde(default)]
    pub menu_text: Option<String>,
}

impl SearchRecord {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self { id: id.into(), name: name.into(), kind: kind.into(), ..Default::default() }
    }

    pub fn with_location(mut self, loc: impl Into<String>) -> Self {
        self.location_description = Some(loc.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_menu(mut self, menu: impl Into<String>) -> Self {
        self.menu_text = Some(menu.into());
        self
    }

    /// Location text when present and not blank.
    pub fn location(&self) -> Option<&str> {
        self.location_description.as_deref().filter(|s| !s.trim().is_empty())
    }

    /// Menu text when present and not blank.
    pub fn menu(&self) -> Option<&str> {
        self.menu_text.as_deref().filter(|s| !s.trim().is_empty())
    }
}

/// Per-search relevance of one record. Score is in `0..=100`, higher is better.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoredMatch {
    pub id: RecordId,
    pub score: u8,
}

/// Full entity as returned by the backend. Only `id` is interpreted here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FullRecord {
    #[serde(deserialize_with = "de_id")]
    pub id: RecordId,
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl FullRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(), fields: serde_json::Map::new() }
    }

    pub fn field_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(|v| v.as_str())
    }
}

/// Server-side pagination block of the list endpoint.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Pagination {
    pub page: usize,
    pub limit: usize,
    pub total: usize,
    pub total_pages: usize,
}

/// Where the records of a snapshot came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum IndexSource {
    #[default]
    Empty,
    Cache,
    Network,
}

/// Immutable in-memory copy of the search index. Replaced wholesale, never patched.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct IndexSnapshot {
    pub epoch: u64,
    pub records: Vec<SearchRecord>,
    pub source: IndexSource,
    /// Unix seconds at which the snapshot was installed.
    pub loaded_at: i64,
}

impl IndexSnapshot {
    pub fn is_loaded(&self) -> bool { self.source != IndexSource::Empty }
}

pub mod prelude {
    pub use super::{FullRecord, IndexSnapshot, IndexSource, Pagination, RecordId, ScoredMatch, SearchRecord};
}

// Ids arrive as strings from most endpoints but some serialize integer primary keys.
fn de_id<'de, D: Deserializer<'de>>(d: D) -> Result<RecordId, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Str(String),
        Int(i64),
        Uint(u64),
    }
    Ok(match RawId::deserialize(d)? {
        RawId::Str(s) => s,
        RawId::Int(n) => n.to_string(),
        RawId::Uint(n) => n.to_string(),
    })
}
