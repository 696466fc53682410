//! Bing Images scraper (primary backend).
//!
//! Result tiles on `https://www.bing.com/images/search` are `a.iusc` anchors
//! whose `m` attribute holds a JSON blob; its `murl` field is the full-size
//! image URL. When the tiles are missing (Bing serves several layouts) the raw
//! HTML is scanned for HTML-escaped `murl` entries instead.

use super::{ImageBackend, MAX_RESULTS_PER_BACKEND, browser_client, fetch_page, into_candidates};
use crate::models::{ImageCandidate, ImageSource};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

static TILE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a.iusc[m]").expect("static selector"));
static ESCAPED_MURL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"murl&quot;:&quot;(.*?)&quot;").expect("static regex"));

const SEARCH_URL: &str = "https://www.bing.com/images/search";

#[derive(Debug, Clone)]
pub struct BingBackend {
    client: Client,
}

impl BingBackend {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: browser_client(timeout)?,
        })
    }

    fn search_url(query: &str) -> String {
        format!("{}?q={}&first=1", SEARCH_URL, urlencoding::encode(query))
    }
}

impl ImageBackend for BingBackend {
    fn source(&self) -> ImageSource {
        ImageSource::Bing
    }

    #[instrument(level = "info", skip(self))]
    async fn search(&self, query: &str) -> Vec<ImageCandidate> {
        let html = match fetch_page(&self.client, &Self::search_url(query)).await {
            Ok(html) => html,
            Err(e) => {
                warn!(error = %e, "Bing search request failed");
                return Vec::new();
            }
        };

        let urls = extract_image_urls(&html);
        if urls.is_empty() {
            warn!("No image URLs found on Bing results page");
            return Vec::new();
        }
        info!(count = urls.len().min(MAX_RESULTS_PER_BACKEND), "Found Bing images");
        into_candidates(urls, query, ImageSource::Bing)
    }
}

/// Full-size image URLs from a Bing results page, in page order.
pub fn extract_image_urls(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut urls: Vec<String> = document
        .select(&TILE_SELECTOR)
        .filter_map(|tile| tile.value().attr("m"))
        .filter_map(|meta| serde_json::from_str::<serde_json::Value>(meta).ok())
        .filter_map(|meta| meta.get("murl").and_then(|u| u.as_str()).map(str::to_string))
        .collect();

    if urls.is_empty() {
        debug!("No iusc tiles; falling back to escaped murl scan");
        urls = ESCAPED_MURL
            .captures_iter(html)
            .map(|c| c[1].to_string())
            .collect();
    }
    urls
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_murl_from_tiles() {
        let html = r#"<html><body>
            <a class="iusc" m="{&quot;murl&quot;:&quot;https://img.example/a.jpg&quot;,&quot;turl&quot;:&quot;https://tse.example/t&quot;}">x</a>
            <a class="iusc" m="{&quot;murl&quot;:&quot;https://img.example/b.png&quot;}">y</a>
            <a class="other" m="{&quot;murl&quot;:&quot;https://img.example/ignored.jpg&quot;}">z</a>
        </body></html>"#;
        assert_eq!(
            extract_image_urls(html),
            vec!["https://img.example/a.jpg", "https://img.example/b.png"]
        );
    }

    #[test]
    fn test_falls_back_to_escaped_scan() {
        let html = r#"<script>var d = "murl&quot;:&quot;https://img.example/c.jpg&quot;,";</script>"#;
        assert_eq!(extract_image_urls(html), vec!["https://img.example/c.jpg"]);
    }

    #[test]
    fn test_no_results() {
        assert!(extract_image_urls("<html><body>nothing</body></html>").is_empty());
    }

    #[test]
    fn test_search_url_encodes_query() {
        assert_eq!(
            BingBackend::search_url("coffee & tea"),
            "https://www.bing.com/images/search?q=coffee%20%26%20tea&first=1"
        );
    }
}
