// src/fetch/urls.rs
use reqwest::Client;
use scraper::{Html, Selector};
use url::Url;

use super::text::fetch_text;
use crate::{config::FetchConfig, error::RetrievalError};

/// Pull symbol names out of the provider's research page: every link that
/// resolves under `download_prefix`, with the prefix stripped. First
/// occurrence wins, page order is kept.
pub fn extract_symbols(html: &str, page_url: &Url, download_prefix: &str) -> Vec<String> {
    let selector = Selector::parse("a[href]").expect("Invalid CSS selector for links");
    let mut symbols: Vec<String> = Vec::new();

    for href in Html::parse_document(html)
        .select(&selector)
        .filter_map(|e| e.value().attr("href"))
    {
        let Ok(resolved) = page_url.join(href) else {
            continue;
        };
        let Some(symbol) = resolved.as_str().strip_prefix(download_prefix) else {
            continue;
        };
        if !symbol.is_empty() && !symbols.iter().any(|s| s == symbol) {
            symbols.push(symbol.to_string());
        }
    }

    symbols
}

/// Fetch the research page and list every published symbol.
pub async fn fetch_symbols(client: &Client, cfg: &FetchConfig) -> Result<Vec<String>, RetrievalError> {
    let page = cfg.listing_url();
    let page_url = Url::parse(&page).map_err(|source| RetrievalError::InvalidUrl {
        url: page.clone(),
        source,
    })?;
    let html = fetch_text(client, &page, cfg).await?;
    Ok(extract_symbols(&html, &page_url, &cfg.download_prefix()))
}
