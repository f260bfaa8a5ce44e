// src/fetch/mod.rs
pub mod text;
pub mod urls;

use reqwest::Client;
use tracing::{info, instrument};

use crate::{
    config::{FetchConfig, ParseOptions},
    error::{Error, RetrievalError},
    process::{self, Dataset},
};

/// Client for the provider's factor library: one cookie-keeping HTTP
/// session plus the parser settings applied to everything it reads.
#[derive(Debug, Clone)]
pub struct FactorLibrary {
    client: Client,
    fetch: FetchConfig,
    parse: ParseOptions,
}

impl FactorLibrary {
    pub fn new(fetch: FetchConfig, parse: ParseOptions) -> Result<Self, RetrievalError> {
        let client = Client::builder()
            .cookie_store(true)
            .timeout(fetch.timeout)
            .build()
            .map_err(|source| RetrievalError::Transport {
                url: fetch.base_url.clone(),
                source,
            })?;
        Ok(Self::with_client(client, fetch, parse))
    }

    pub fn with_client(client: Client, fetch: FetchConfig, parse: ParseOptions) -> Self {
        Self {
            client,
            fetch,
            parse,
        }
    }

    pub fn fetch_config(&self) -> &FetchConfig {
        &self.fetch
    }

    pub fn parse_options(&self) -> &ParseOptions {
        &self.parse
    }

    /// Download URL of `symbol`.
    pub fn build_url(&self, symbol: &str) -> String {
        format!("{}{}", self.fetch.download_prefix(), symbol)
    }

    /// Raw export text of `symbol`.
    #[instrument(level = "info", skip(self))]
    pub async fn fetch(&self, symbol: &str) -> Result<String, RetrievalError> {
        let url = self.build_url(symbol);
        let text = text::fetch_text(&self.client, &url, &self.fetch).await?;
        info!(bytes = text.len(), "downloaded");
        Ok(text)
    }

    /// Every symbol currently linked from the research page.
    pub async fn list_symbols(&self) -> Result<Vec<String>, RetrievalError> {
        urls::fetch_symbols(&self.client, &self.fetch).await
    }

    /// Fetch and parse `symbol`.
    pub async fn read(&self, symbol: &str) -> Result<Dataset, Error> {
        let raw = self.fetch(symbol).await?;
        Ok(process::parse(symbol, &raw, &self.parse)?)
    }
}
