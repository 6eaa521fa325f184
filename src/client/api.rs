use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use std::fs::OpenOptions;
use std::io::Write;
use std::time::Duration;
use tokio::time::sleep;

use crate::config::ApiConfig;
use crate::models::{Item, ItemPrice, Recipe};
use crate::{v_debug, v_info};

/// Result of a batched id fetch: the subset that resolved plus the ids of
/// every chunk that still failed after retries. Partial failure is normal
/// operation here, not an error.
#[derive(Debug, Clone)]
pub struct FetchBatch<T> {
    pub resolved: Vec<T>,
    pub failed_ids: Vec<u32>,
}

impl<T> FetchBatch<T> {
    pub fn empty() -> Self {
        FetchBatch { resolved: Vec::new(), failed_ids: Vec::new() }
    }
}

#[derive(Clone)]
pub struct GameApiClient {
    client: reqwest::Client,
    base_url: String,
    max_ids_per_request: usize,
    max_retries: u32,
    retry_backoff_ms: u64,
    api_logging: bool,
}

impl GameApiClient {
    pub fn new() -> Self {
        Self::from_config(&crate::config::CraftConfig::default().api)
    }

    pub fn from_config(config: &ApiConfig) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .unwrap_or_default();

        GameApiClient {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_ids_per_request: config.max_ids_per_request.clamp(1, crate::MAX_IDS_PER_REQUEST),
            max_retries: config.max_retries,
            retry_backoff_ms: config.retry_backoff_ms,
            api_logging: false,
        }
    }

    pub fn set_api_logging(&mut self, logging: bool) {
        self.api_logging = logging;
    }

    fn log_api_call(&self, url: &str, response_status: u16, note: &str) {
        if !self.api_logging {
            return;
        }

        let timestamp = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
        let log_entry = format!("[{}] GET {} -> {} {}\n", timestamp, url, response_status, note);

        if let Ok(mut file) = OpenOptions::new()
            .create(true)
            .append(true)
            .open("api_debug.log")
        {
            let _ = file.write_all(log_entry.as_bytes());
        }
    }

    /// GET a JSON payload with bounded exponential-backoff retry.
    ///
    /// A 404 on an ids endpoint means none of the requested ids exist, which
    /// callers treat as an empty (successful) result.
    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<Option<T>, Box<dyn std::error::Error>> {
        let mut last_error = String::new();

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.retry_backoff_ms * (1u64 << (attempt - 1).min(6));
                v_debug!("   ⏳ Retry {}/{} for {} in {}ms", attempt, self.max_retries, url, delay);
                sleep(Duration::from_millis(delay)).await;
            }

            match self.client.get(url).send().await {
                Ok(response) => {
                    let status = response.status();

                    if status == StatusCode::NOT_FOUND {
                        self.log_api_call(url, status.as_u16(), "no matching ids");
                        return Ok(None);
                    }

                    // 206 Partial Content: the API resolved a subset of ids
                    if status.is_success() {
                        let body = response.text().await?;
                        self.log_api_call(url, status.as_u16(), "");
                        return Ok(Some(serde_json::from_str(&body)?));
                    }

                    self.log_api_call(url, status.as_u16(), "request failed");
                    last_error = format!("API request failed with status: {}", status);

                    // Client errors other than rate limiting won't improve on retry
                    if status.is_client_error() && status != StatusCode::TOO_MANY_REQUESTS {
                        break;
                    }
                }
                Err(e) => {
                    last_error = format!("Network error: {}", e);
                }
            }
        }

        Err(last_error.into())
    }

    /// Fetch an ids endpoint in chunks of at most `max_ids_per_request`.
    /// Chunks that exhaust their retries contribute their ids to
    /// `failed_ids` instead of aborting the whole fetch.
    async fn fetch_chunked<T: DeserializeOwned>(&self, path: &str, ids: &[u32]) -> Result<FetchBatch<T>, Box<dyn std::error::Error>> {
        let mut unique_ids: Vec<u32> = ids.to_vec();
        unique_ids.sort_unstable();
        unique_ids.dedup();

        let mut batch = FetchBatch::empty();

        for chunk in unique_ids.chunks(self.max_ids_per_request) {
            let csv = chunk.iter().map(|id| id.to_string()).collect::<Vec<_>>().join(",");
            let url = format!("{}/{}?ids={}", self.base_url, path, csv);

            match self.get_json::<Vec<T>>(&url).await {
                Ok(Some(mut resolved)) => batch.resolved.append(&mut resolved),
                Ok(None) => {} // none of the chunk's ids exist
                Err(e) => {
                    v_info!("   ⚠️ Batch of {} ids failed for /{}: {}", chunk.len(), path, e);
                    batch.failed_ids.extend_from_slice(chunk);
                }
            }
        }

        Ok(batch)
    }

    // Item detail operations
    pub async fn get_items(&self, ids: &[u32]) -> Result<FetchBatch<Item>, Box<dyn std::error::Error>> {
        self.fetch_chunked("items", ids).await
    }

    // Recipe operations
    pub async fn get_recipes(&self, ids: &[u32]) -> Result<FetchBatch<Recipe>, Box<dyn std::error::Error>> {
        self.fetch_chunked("recipes", ids).await
    }

    /// Recipe ids that produce the given item.
    pub async fn search_recipes_by_output(&self, item_id: u32) -> Result<Vec<u32>, Box<dyn std::error::Error>> {
        let url = format!("{}/recipes/search?output={}", self.base_url, item_id);
        Ok(self.get_json(&url).await?.unwrap_or_default())
    }

    /// Recipe ids that consume the given item as an ingredient.
    pub async fn search_recipes_by_input(&self, item_id: u32) -> Result<Vec<u32>, Box<dyn std::error::Error>> {
        let url = format!("{}/recipes/search?input={}", self.base_url, item_id);
        Ok(self.get_json(&url).await?.unwrap_or_default())
    }

    // Trading post operations
    pub async fn get_prices(&self, ids: &[u32]) -> Result<FetchBatch<ItemPrice>, Box<dyn std::error::Error>> {
        self.fetch_chunked("commerce/prices", ids).await
    }
}

impl Default for GameApiClient {
    fn default() -> Self {
        Self::new()
    }
}
