use std::time::Instant;

use canteen_core::{FullRecord, SearchRecord};
use tracing::{debug, info};

use crate::{decode_envelope, BackendConfig, BackendError, BackendResult, IndexBackend, ListPage};

/// One `GET` target: the URL and its query pairs (reqwest does the encoding).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub url: String,
    pub query: Vec<(&'static str, String)>,
}

impl Endpoint {
    fn base(cfg: &BackendConfig) -> &str { cfg.base_url.trim_end_matches('/') }

    /// `<base>/search-data`
    pub fn search_data(cfg: &BackendConfig) -> Self {
        Self { url: format!("{}/search-data", Self::base(cfg)), query: Vec::new() }
    }

    /// `<base>?ids=a,b,c`
    pub fn by_ids(cfg: &BackendConfig, ids: &[String]) -> Self {
        Self { url: Self::base(cfg).to_string(), query: vec![("ids", ids.join(","))] }
    }

    /// `<base>?type=t&page=p&limit=n`; `type` is omitted without a filter.
    pub fn list(cfg: &BackendConfig, kind: Option<&str>, page: usize, limit: usize) -> Self {
        let mut query = Vec::with_capacity(3);
        if let Some(k) = kind.filter(|k| !k.is_empty()) {
            query.push(("type", k.to_string()));
        }
        query.push(("page", page.to_string()));
        query.push(("limit", limit.to_string()));
        Self { url: Self::base(cfg).to_string(), query }
    }
}

/// reqwest-backed client. Transport defaults apply; no extra timeouts.
pub struct HttpBackend {
    client: reqwest::Client,
    cfg: BackendConfig,
}

impl HttpBackend {
    pub fn new(cfg: BackendConfig) -> Self {
        Self { client: reqwest::Client::new(), cfg }
    }

    pub fn from_env() -> Self { Self::new(BackendConfig::from_env()) }

    pub fn config(&self) -> &BackendConfig { &self.cfg }

    async fn get_body(&self, ep: &Endpoint) -> BackendResult<String> {
        let t0 = Instant::now();
        let url = ep.url.as_str();
        let response = self
            .client
            .get(url)
            .query(&ep.query)
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Status { status: status.as_u16(), url: url.to_string() });
        }
        let body = response.text().await.map_err(|e| BackendError::Transport(e.to_string()))?;
        debug!(url = %url, bytes = body.len(), took_ms = %t0.elapsed().as_millis(), "backend: GET ok");
        Ok(body)
    }
}

#[async_trait::async_trait]
impl IndexBackend for HttpBackend {
    async fn fetch_search_data(&self) -> BackendResult<Vec<SearchRecord>> {
        let body = self.get_body(&Endpoint::search_data(&self.cfg)).await?;
        let (records, _) = decode_envelope::<SearchRecord>(&body, &self.cfg.entity)?;
        info!(records = records.len(), "backend: search data fetched");
        Ok(records)
    }

    async fn fetch_by_ids(&self, ids: &[String]) -> BackendResult<Vec<FullRecord>> {
        if ids.is_empty() { return Ok(Vec::new()); }
        let body = self.get_body(&Endpoint::by_ids(&self.cfg, ids)).await?;
        let (items, _) = decode_envelope::<FullRecord>(&body, &self.cfg.entity)?;
        Ok(items)
    }

    async fn list_page(&self, kind: Option<&str>, page: usize, limit: usize) -> BackendResult<ListPage> {
        let body = self.get_body(&Endpoint::list(&self.cfg, kind, page, limit)).await?;
        let (items, pagination) = decode_envelope::<FullRecord>(&body, &self.cfg.entity)?;
        Ok(ListPage { items, pagination: pagination.unwrap_or_default() })
    }
}
