//! TCGdex API client for set listings and card images
//!
//! Two read-only endpoints are consumed: the list of all known sets and the
//! per-set card listing. Uses async reqwest for non-blocking HTTP requests.

use serde::Deserialize;

use crate::error::{CatalogError, Result};

/// Production API endpoint (English catalog)
pub const DEFAULT_BASE_URL: &str = "https://api.tcgdex.net/v2/en";

const USER_AGENT: &str = "poke_catalog/1.0";

/// One set as returned by the set-list endpoint
#[derive(Debug, Deserialize, Clone)]
pub struct SetResume {
    pub id: String,
    pub name: String,
}

/// Full set detail including its card listing
#[derive(Debug, Deserialize, Clone)]
pub struct SetDetail {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub cards: Vec<CardResume>,
}

/// One card within a set listing
#[derive(Debug, Deserialize, Clone)]
pub struct CardResume {
    pub id: String,
    #[serde(rename = "localId")]
    pub local_id: String,
    pub name: String,
    /// Asset base URL; the quality/extension suffix is appended by the caller
    #[serde(default)]
    pub image: Option<String>,
}

impl CardResume {
    /// Full URL of the high-quality JPEG for this card, if it has an image
    pub fn image_url(&self) -> Option<String> {
        self.image.as_ref().map(|base| format!("{}/high.jpg", base))
    }
}

/// TCGdex HTTP client with an injectable base URL
pub struct TcgdexClient {
    client: reqwest::Client,
    base_url: String,
}

impl Default for TcgdexClient {
    fn default() -> Self {
        Self::new()
    }
}

impl TcgdexClient {
    /// Create a client against the production API
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Create a client against an arbitrary base URL
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Fetch the list of all known sets
    pub async fn fetch_sets(&self) -> Result<Vec<SetResume>> {
        let url = format!("{}/sets", self.base_url);
        log::debug!("Fetching set list: {}", url);

        let response = self
            .client
            .get(&url)
            .header("User-Agent", USER_AGENT)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(response.json::<Vec<SetResume>>().await?)
        } else {
            Err(CatalogError::HttpStatus(response.status()))
        }
    }

    /// Fetch a set with its card listing
    pub async fn fetch_set(&self, set_id: &str) -> Result<SetDetail> {
        let url = format!("{}/sets/{}", self.base_url, set_id);
        log::debug!("Fetching set detail: {}", url);

        let response = self
            .client
            .get(&url)
            .header("User-Agent", USER_AGENT)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(response.json::<SetDetail>().await?)
        } else {
            Err(CatalogError::HttpStatus(response.status()))
        }
    }

    /// Fetch image bytes from a URL
    pub async fn fetch_image(&self, url: &str) -> Result<Vec<u8>> {
        log::debug!("Fetching image: {}", url);

        let response = self
            .client
            .get(url)
            .header("User-Agent", USER_AGENT)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(response.bytes().await?.to_vec())
        } else {
            Err(CatalogError::ImageDownloadFailed(format!(
                "{} returned {}",
                url,
                response.status()
            )))
        }
    }
}

#[cfg(test)]
#[path = "tcgdex_tests.rs"]
mod tests;
