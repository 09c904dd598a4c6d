//! Authenticated HTTP client for the catalog API
//!
//! Pure read-only gateway: four request/response calls, no state. Failures
//! surface immediately as [`InstallError::MetadataFetch`]; retries and
//! backoff are not part of this boundary.

use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::json;
use tracing::{debug, warn};

use crate::catalog::types::{Envelope, FileRecord, ModSummary};
use crate::config::InstallConfig;
use crate::error::{InstallError, Result};
use crate::selection::ResolveContext;

/// Metadata gateway over the catalog's v1 REST endpoints
#[derive(Debug, Clone)]
pub struct CatalogClient {
    http: Client,
    base_url: String,
    page_size: u32,
}

impl CatalogClient {
    pub fn new(config: &InstallConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if !config.api_key.is_empty() {
            match HeaderValue::from_str(&config.api_key) {
                Ok(value) => {
                    headers.insert("x-api-key", value);
                }
                // Let the API reject the unauthenticated request with context
                // instead of failing construction.
                Err(_) => warn!("API key contains invalid header characters, sending no key"),
            }
        }

        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .default_headers(headers)
            .build()
            .map_err(|e| InstallError::MetadataFetch {
                context: "creating HTTP client".to_string(),
                source: e,
            })?;

        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            page_size: config.page_size,
        })
    }

    /// List a mod's files under the active game-version/loader filter,
    /// in the catalog's own default-sort order
    pub async fn list_files(&self, mod_id: i64, ctx: &ResolveContext) -> Result<Vec<FileRecord>> {
        let mut url = format!("{}/v1/mods/{}/files", self.base_url, mod_id);
        let mut query = Vec::new();
        if let Some(ref version) = ctx.game_version {
            query.push(("gameVersion", version.clone()));
        }
        if let Some(loader) = ctx.loader {
            query.push(("modLoaderType", loader.as_query_name().to_string()));
        }
        query.push(("index", "0".to_string()));
        query.push(("pageSize", self.page_size.to_string()));

        let pairs: Vec<String> = query.iter().map(|(k, v)| format!("{k}={v}")).collect();
        url.push('?');
        url.push_str(&pairs.join("&"));

        debug!("Listing files for mod {}: {}", mod_id, url);
        let envelope: Envelope<Vec<FileRecord>> = self
            .get_json(&url, &format!("listing files for mod {mod_id}"))
            .await?;
        Ok(envelope.data)
    }

    /// Fetch file records for an id set in one batched call
    pub async fn get_files_by_ids(&self, file_ids: &[i64]) -> Result<Vec<FileRecord>> {
        let url = format!("{}/v1/mods/files", self.base_url);
        let context = format!("fetching {} file records", file_ids.len());

        debug!("Batch-fetching {} file records", file_ids.len());
        let response = self
            .http
            .post(&url)
            .json(&json!({ "fileIds": file_ids }))
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| InstallError::MetadataFetch {
                context: context.clone(),
                source: e,
            })?;

        let envelope: Envelope<Vec<FileRecord>> =
            response
                .json()
                .await
                .map_err(|e| InstallError::MetadataFetch { context, source: e })?;
        Ok(envelope.data)
    }

    /// Resolve the download URL for one (mod, file) pair
    pub async fn get_download_url(&self, mod_id: i64, file_id: i64) -> Result<String> {
        let url = format!(
            "{}/v1/mods/{}/files/{}/download-url",
            self.base_url, mod_id, file_id
        );
        let envelope: Envelope<String> = self
            .get_json(
                &url,
                &format!("resolving download url for file {file_id} of mod {mod_id}"),
            )
            .await?;
        Ok(envelope.data)
    }

    /// Fetch a mod's summary record (name for progress identity)
    pub async fn get_mod(&self, mod_id: i64) -> Result<ModSummary> {
        let url = format!("{}/v1/mods/{}", self.base_url, mod_id);
        let envelope: Envelope<ModSummary> = self
            .get_json(&url, &format!("fetching mod {mod_id}"))
            .await?;
        Ok(envelope.data)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str, context: &str) -> Result<T> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| InstallError::MetadataFetch {
                context: context.to_string(),
                source: e,
            })?;

        response.json().await.map_err(|e| InstallError::MetadataFetch {
            context: context.to_string(),
            source: e,
        })
    }
}
