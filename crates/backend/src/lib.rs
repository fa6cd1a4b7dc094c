//! Canteen backend client: the REST endpoints that serve the search index and full records.
//!
//! The backend itself (routes, schema, auth) lives elsewhere; this crate only
//! speaks its envelope format.

#![forbid(unsafe_code)]

use canteen_core::{FullRecord, Pagination, SearchRecord};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

pub mod http;
pub mod mock;

pub use http::{Endpoint, HttpBackend};
pub use mock::MockBackend;

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("transport: {0}")]
    Transport(String),
    #[error("status {status} from {url}")]
    Status { status: u16, url: String },
    #[error("malformed response: {0}")]
    Malformed(String),
}

pub type BackendResult<T> = Result<T, BackendError>;

/// One page from the list endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ListPage {
    pub items: Vec<FullRecord>,
    pub pagination: Pagination,
}

/// Endpoints consumed by the search core.
#[async_trait::async_trait]
pub trait IndexBackend: Send + Sync {
    /// `GET <base>/search-data`: the whole lightweight index.
    async fn fetch_search_data(&self) -> BackendResult<Vec<SearchRecord>>;

    /// `GET <base>?ids=a,b,c`: full records for an id set, in no particular order.
    async fn fetch_by_ids(&self, ids: &[String]) -> BackendResult<Vec<FullRecord>>;

    /// `GET <base>?type=t&page=p&limit=n`: server-side pagination for the no-keyword path.
    async fn list_page(&self, kind: Option<&str>, page: usize, limit: usize) -> BackendResult<ListPage>;
}

/// Where the backend lives and which key its payloads use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    pub base_url: String,
    pub entity: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self { base_url: "http://localhost:3000/api/restaurants".to_string(), entity: "restaurants".to_string() }
    }
}

impl BackendConfig {
    /// `CANTEEN_API_BASE` / `CANTEEN_ENTITY` over the defaults.
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            base_url: std::env::var("CANTEEN_API_BASE").unwrap_or(d.base_url),
            entity: std::env::var("CANTEEN_ENTITY").unwrap_or(d.entity),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<serde_json::Value>,
}

/// Decode `{ status: "success", data: { <entity>: [...], pagination? } }`.
pub fn decode_envelope<T: DeserializeOwned>(body: &str, entity: &str) -> BackendResult<(Vec<T>, Option<Pagination>)> {
    let env: Envelope = serde_json::from_str(body).map_err(|e| BackendError::Malformed(e.to_string()))?;
    if env.status != "success" {
        let msg = env.message.unwrap_or_default();
        return Err(BackendError::Malformed(format!("status {:?}: {}", env.status, msg)));
    }
    let mut data = match env.data {
        Some(serde_json::Value::Object(map)) => map,
        _ => return Err(BackendError::Malformed("missing data object".into())),
    };
    let items = data
        .remove(entity)
        .ok_or_else(|| BackendError::Malformed(format!("missing data.{}", entity)))?;
    let items: Vec<T> = serde_json::from_value(items).map_err(|e| BackendError::Malformed(e.to_string()))?;
    let pagination = match data.remove("pagination") {
        Some(p) => Some(serde_json::from_value(p).map_err(|e| BackendError::Malformed(e.to_string()))?),
        None => None,
    };
    Ok((items, pagination))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_search_data() {
        let body = r#"{"status":"success","data":{"restaurants":[{"id":"1","name":"兰州拉面","type":"mainfood","tags":["面食"]}]}}"#;
        let (items, pag): (Vec<SearchRecord>, _) = decode_envelope(body, "restaurants").unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "兰州拉面");
        assert!(pag.is_none());
    }

    #[test]
    fn decodes_pagination() {
        let body = r#"{"status":"success","data":{"restaurants":[{"id":3,"name":"X"}],"pagination":{"page":2,"limit":10,"total":11,"totalPages":2}}}"#;
        let (items, pag): (Vec<FullRecord>, _) = decode_envelope(body, "restaurants").unwrap();
        assert_eq!(items[0].id, "3");
        assert_eq!(pag, Some(Pagination { page: 2, limit: 10, total: 11, total_pages: 2 }));
    }

    #[test]
    fn rejects_error_status_and_missing_entity() {
        let err = decode_envelope::<FullRecord>(r#"{"status":"error","message":"boom"}"#, "restaurants").unwrap_err();
        assert!(matches!(err, BackendError::Malformed(_)));
        let err = decode_envelope::<FullRecord>(r#"{"status":"success","data":{"jobs":[]}}"#, "restaurants").unwrap_err();
        assert!(err.to_string().contains("data.restaurants"));
        let err = decode_envelope::<FullRecord>("<html>", "restaurants").unwrap_err();
        assert!(matches!(err, BackendError::Malformed(_)));
    }
}
