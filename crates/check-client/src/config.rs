//! Client configuration

use crate::{ApiError, ApiResult};
use serde::{Deserialize, Serialize};
use url::Url;

/// Where the check server lives
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL for API calls and relative PDF paths
    pub api_base_url: String,
}

impl ClientConfig {
    /// Parsed base URL
    pub fn base_url(&self) -> ApiResult<Url> {
        Url::parse(self.api_base_url.trim())
            .map_err(|e| ApiError::InvalidBaseUrl(format!("{}: {e}", self.api_base_url)))
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:5000".to_string(),
        }
    }
}
