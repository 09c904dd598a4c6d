//! Configuration for an install run

use std::time::Duration;

/// Configuration shared by the catalog client and the download engine
#[derive(Debug, Clone)]
pub struct InstallConfig {
    /// Base URL of the catalog API (overridable so tests can point at a mock server)
    pub api_base_url: String,
    /// API key sent as the `x-api-key` header on every catalog request
    pub api_key: String,
    pub user_agent: String,
    pub timeout: Duration,
    /// Page size used when listing a mod's files
    pub page_size: u32,
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.curseforge.com".to_string(),
            api_key: String::new(),
            user_agent: "curseloader/0.1.0".to_string(),
            timeout: Duration::from_secs(30),
            page_size: 50,
        }
    }
}

impl InstallConfig {
    pub fn with_api_key<S: Into<String>>(mut self, api_key: S) -> Self {
        self.api_key = api_key.into();
        self
    }

    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.api_base_url = base_url.into();
        self
    }
}
