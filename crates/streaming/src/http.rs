use std::time::Duration;

use foundation::bounds::Region;
use reqwest::Client;
use tracing::debug;

use crate::protocol::{RawPlace, SEARCH_PATH, SearchRequest, SearchResponse};
use crate::search::{BoxFuture, RegionSearch, SearchError};

/// Default request timeout for region searches.
pub const DEFAULT_SEARCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Region search over HTTP: `POST {base}/api/locations/search`.
#[derive(Debug, Clone)]
pub struct HttpRegionSearch {
    http: Client,
    url: String,
    timeout: Duration,
}

impl HttpRegionSearch {
    pub fn new(base_url: &str) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: &str) -> Self {
        Self {
            http,
            url: format!("{}{SEARCH_PATH}", base_url.trim_end_matches('/')),
            timeout: DEFAULT_SEARCH_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn post(&self, region: Region) -> Result<Vec<RawPlace>, SearchError> {
        debug!("POST {} bounds={region:?}", self.url);
        let resp = self
            .http
            .post(&self.url)
            .timeout(self.timeout)
            .json(&SearchRequest { bounds: region })
            .send()
            .await
            .map_err(|e| SearchError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SearchError::Status {
                status: status.as_u16(),
            });
        }

        let body: SearchResponse = resp
            .json()
            .await
            .map_err(|e| SearchError::Decode(e.to_string()))?;
        Ok(body.locations)
    }
}

impl RegionSearch for HttpRegionSearch {
    fn search_region(&self, region: Region) -> BoxFuture<'_, Result<Vec<RawPlace>, SearchError>> {
        Box::pin(self.post(region))
    }
}
