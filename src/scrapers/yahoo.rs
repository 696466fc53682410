//! Yahoo Images scraper (secondary backend).
//!
//! Yahoo marks its result thumbnails with a `process` class and lazily loads
//! some of them through `data-src`. If neither is present, any `<img src>` on
//! the page is taken, minus obvious icons and logos.

use super::{ImageBackend, MAX_RESULTS_PER_BACKEND, browser_client, fetch_page, into_candidates};
use crate::models::{ImageCandidate, ImageSource};
use once_cell::sync::Lazy;
use reqwest::Client;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

static RESULT_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"img[class^="process"]"#).expect("static selector"));
static ANY_IMG_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("img[src]").expect("static selector"));

const SEARCH_URL: &str = "https://images.search.yahoo.com/search/images";

#[derive(Debug, Clone)]
pub struct YahooBackend {
    client: Client,
}

impl YahooBackend {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: browser_client(timeout)?,
        })
    }

    fn search_url(query: &str) -> String {
        format!("{}?p={}", SEARCH_URL, urlencoding::encode(query))
    }
}

impl ImageBackend for YahooBackend {
    fn source(&self) -> ImageSource {
        ImageSource::Yahoo
    }

    #[instrument(level = "info", skip(self))]
    async fn search(&self, query: &str) -> Vec<ImageCandidate> {
        let html = match fetch_page(&self.client, &Self::search_url(query)).await {
            Ok(html) => html,
            Err(e) => {
                warn!(error = %e, "Yahoo search request failed");
                return Vec::new();
            }
        };

        let urls = extract_image_urls(&html);
        if urls.is_empty() {
            warn!("No image URLs found on Yahoo results page");
            return Vec::new();
        }
        info!(count = urls.len().min(MAX_RESULTS_PER_BACKEND), "Found Yahoo images");
        into_candidates(urls, query, ImageSource::Yahoo)
    }
}

/// Image URLs from a Yahoo results page, in page order.
pub fn extract_image_urls(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);

    let src: Vec<String> = document
        .select(&RESULT_SELECTOR)
        .filter_map(|img| img.value().attr("src"))
        .map(str::to_string)
        .collect();
    if !src.is_empty() {
        return src;
    }

    let lazy: Vec<String> = document
        .select(&RESULT_SELECTOR)
        .filter_map(|img| img.value().attr("data-src"))
        .map(str::to_string)
        .collect();
    if !lazy.is_empty() {
        return lazy;
    }

    debug!("No process-class thumbnails; scanning every img");
    document
        .select(&ANY_IMG_SELECTOR)
        .filter_map(|img| img.value().attr("src"))
        .filter(|url| {
            let lower = url.to_lowercase();
            !lower.contains("icon") && !lower.contains("logo")
        })
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefers_process_thumbnails() {
        let html = r#"<html><body>
            <img src="https://s.yimg.example/logo.png">
            <img class="process" src="https://tse.example/1.jpg">
            <img class="processed lazy" src="https://tse.example/2.jpg">
        </body></html>"#;
        assert_eq!(
            extract_image_urls(html),
            vec!["https://tse.example/1.jpg", "https://tse.example/2.jpg"]
        );
    }

    #[test]
    fn test_uses_data_src_when_lazy() {
        let html = r#"<img class="process" data-src="https://tse.example/lazy.jpg">"#;
        assert_eq!(extract_image_urls(html), vec!["https://tse.example/lazy.jpg"]);
    }

    #[test]
    fn test_generic_fallback_skips_icons_and_logos() {
        let html = r#"<html><body>
            <img src="https://s.example/favicon-icon.png">
            <img src="https://s.example/Yahoo_Logo.png">
            <img src="https://photos.example/beach.jpg">
        </body></html>"#;
        assert_eq!(extract_image_urls(html), vec!["https://photos.example/beach.jpg"]);
    }

    #[test]
    fn test_search_url() {
        assert_eq!(
            YahooBackend::search_url("green tea"),
            "https://images.search.yahoo.com/search/images?p=green%20tea"
        );
    }
}
