//! Image search backends scraped from public search engines.
//!
//! Each backend issues one GET against an unofficial search page with a
//! browser-like user agent and pulls candidate image URLs out of the markup.
//! There is no contract with either site, so every failure (network, non-2xx,
//! markup drift) collapses to an empty result rather than an error.
//!
//! | Backend | Module | Extraction |
//! |---------|--------|------------|
//! | Bing Images (primary) | [`bing`] | `a.iusc` metadata JSON, regex fallback |
//! | Yahoo Images (secondary) | [`yahoo`] | `img.process` elements, generic `img` fallback |

use crate::models::{ImageCandidate, ImageSource};
use reqwest::Client;
use std::error::Error;
use std::time::Duration;

pub mod bing;
pub mod yahoo;

/// Most candidates any backend returns for one query.
pub const MAX_RESULTS_PER_BACKEND: usize = 5;

pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// A search engine that turns a text query into candidate image URLs.
pub trait ImageBackend {
    fn source(&self) -> ImageSource;

    /// Up to [`MAX_RESULTS_PER_BACKEND`] unvalidated candidates. Never fails.
    async fn search(&self, query: &str) -> Vec<ImageCandidate>;
}

/// HTTP client shared by the backends.
pub fn browser_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(BROWSER_USER_AGENT)
        .timeout(timeout)
        .build()
}

/// GET a search page, treating non-2xx as an error.
pub(crate) async fn fetch_page(client: &Client, url: &str) -> Result<String, Box<dyn Error>> {
    let response = client.get(url).send().await?.error_for_status()?;
    Ok(response.text().await?)
}

/// Tag the first few extracted URLs with their source and rank.
pub(crate) fn into_candidates(urls: Vec<String>, query: &str, source: ImageSource) -> Vec<ImageCandidate> {
    urls.into_iter()
        .take(MAX_RESULTS_PER_BACKEND)
        .enumerate()
        .map(|(i, url)| ImageCandidate::ranked(url, query, i + 1, source))
        .collect()
}
