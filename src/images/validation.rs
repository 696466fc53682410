//! Memoized validation of candidate image URLs.
//!
//! A URL passes when it is an http(s) link that does not look like an icon or
//! placeholder and, unless it sits on a known-reliable image host, answers a
//! HEAD request with `200`, an `image/*` content type and at least
//! `min_bytes` of payload (from `Content-Length`, or a ranged GET when the
//! header is absent). Any network error fails closed.
//!
//! Verdicts are cached per URL in a [`ValidationCache`] that is owned by the
//! validator and shared by handle, so tests can seed or inspect it. The cache
//! grows without bound for the life of the process, which is fine for one
//! batch run.

use reqwest::Client;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE, RANGE};
use std::collections::HashMap;
use std::error::Error;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

/// URL → verdict. Unbounded, no expiry.
pub type ValidationCache = Arc<Mutex<HashMap<String, bool>>>;

/// Substrings (matched against the lowercased URL) that disqualify a URL.
const DENYLIST: &[&str] = &[
    ".gif",
    ".svg",
    ".webp",
    ".ico",
    "icon",
    "placeholder",
    "blank",
    "transparent",
    "logo",
    "button",
    "favicon",
    "pixel.",
    "spacer",
    "spinner",
    "loading",
    "1x1",
    "avatar",
    "profile-pic",
];

/// Hosts trusted without a network check when the path is a jpg/jpeg/png.
const RELIABLE_HOSTS: &[&str] = &[
    "cdn.pixabay.com",
    "images.unsplash.com",
    "img.freepik.com",
    "upload.wikimedia.org",
    "i.pinimg.com",
    "cdn.statically.io",
];

const RASTER_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png"];

/// What a HEAD request told us.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeHead {
    pub status: u16,
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
}

/// Lightweight network checks against an image URL.
pub trait UrlProbe {
    async fn head(&self, url: &str) -> Result<ProbeHead, Box<dyn Error>>;

    /// Bytes received from a ranged GET of the first `limit` bytes.
    async fn read_prefix(&self, url: &str, limit: u64) -> Result<u64, Box<dyn Error>>;
}

/// Outcome of the checks that need no network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuickVerdict {
    Reject,
    Accept,
    NeedsProbe,
}

/// Classify `url` using only its text.
pub fn quick_verdict(url: &str) -> QuickVerdict {
    let lower = url.to_lowercase();
    if !(lower.starts_with("http://") || lower.starts_with("https://")) {
        return QuickVerdict::Reject;
    }
    if DENYLIST.iter().any(|pattern| lower.contains(pattern)) {
        return QuickVerdict::Reject;
    }
    if is_reliable_raster(&lower) {
        return QuickVerdict::Accept;
    }
    QuickVerdict::NeedsProbe
}

fn is_reliable_raster(lower_url: &str) -> bool {
    let Ok(parsed) = Url::parse(lower_url) else {
        return false;
    };
    let Some(host) = parsed.host_str() else {
        return false;
    };
    let trusted = RELIABLE_HOSTS
        .iter()
        .any(|h| host == *h || host.ends_with(&format!(".{h}")));
    trusted && RASTER_EXTENSIONS.iter().any(|ext| parsed.path().ends_with(ext))
}

/// Memoizing URL validator.
#[derive(Debug)]
pub struct UrlValidator<P> {
    probe: P,
    cache: ValidationCache,
    min_bytes: u64,
}

impl<P: UrlProbe> UrlValidator<P> {
    pub fn new(probe: P, min_bytes: u64) -> Self {
        Self::with_cache(probe, min_bytes, ValidationCache::default())
    }

    /// Build around an existing cache, e.g. one shared with another validator.
    pub fn with_cache(probe: P, min_bytes: u64, cache: ValidationCache) -> Self {
        Self {
            probe,
            cache,
            min_bytes,
        }
    }

    #[cfg(test)]
    pub fn cache(&self) -> ValidationCache {
        Arc::clone(&self.cache)
    }

    #[cfg(test)]
    pub fn probe(&self) -> &P {
        &self.probe
    }

    fn cached(&self, url: &str) -> Option<bool> {
        self.cache
            .lock()
            .ok()
            .and_then(|cache| cache.get(url).copied())
    }

    fn remember(&self, url: &str, verdict: bool) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(url.to_string(), verdict);
        }
    }

    /// Whether `url` is a usable article image. At most one network check per URL.
    #[instrument(level = "debug", skip(self))]
    pub async fn is_valid(&self, url: &str) -> bool {
        if let Some(verdict) = self.cached(url) {
            return verdict;
        }

        let verdict = match quick_verdict(url) {
            QuickVerdict::Reject => false,
            QuickVerdict::Accept => true,
            QuickVerdict::NeedsProbe => self.check_remote(url).await,
        };
        debug!(verdict, "Validated image URL");
        self.remember(url, verdict);
        verdict
    }

    async fn check_remote(&self, url: &str) -> bool {
        let head = match self.probe.head(url).await {
            Ok(head) => head,
            Err(e) => {
                debug!(error = %e, "HEAD failed");
                return false;
            }
        };

        if head.status != 200 {
            return false;
        }
        let is_image = head
            .content_type
            .as_deref()
            .is_some_and(|ct| ct.trim().to_lowercase().starts_with("image/"));
        if !is_image {
            return false;
        }

        match head.content_length {
            Some(len) => len >= self.min_bytes,
            None => match self.probe.read_prefix(url, self.min_bytes).await {
                Ok(received) => received >= self.min_bytes,
                Err(e) => {
                    debug!(error = %e, "Ranged GET failed");
                    false
                }
            },
        }
    }
}

/// [`UrlProbe`] over HTTP with a short timeout.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: Client,
}

impl HttpProbe {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(crate::scrapers::BROWSER_USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

impl UrlProbe for HttpProbe {
    async fn head(&self, url: &str) -> Result<ProbeHead, Box<dyn Error>> {
        let response = self.client.head(url).send().await?;
        let headers = response.headers();
        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let content_length = headers
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());
        Ok(ProbeHead {
            status: response.status().as_u16(),
            content_type,
            content_length,
        })
    }

    async fn read_prefix(&self, url: &str, limit: u64) -> Result<u64, Box<dyn Error>> {
        let mut response = self
            .client
            .get(url)
            .header(RANGE, format!("bytes=0-{}", limit.saturating_sub(1)))
            .send()
            .await?
            .error_for_status()?;

        let mut received = 0u64;
        while received < limit {
            match response.chunk().await? {
                Some(chunk) => received += chunk.len() as u64,
                None => break,
            }
        }
        Ok(received)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::Cell;

    /// Probe returning a fixed answer and counting calls.
    #[derive(Debug)]
    pub(crate) struct FixedProbe {
        pub head: Option<ProbeHead>,
        pub prefix: Option<u64>,
        pub head_calls: Cell<usize>,
        pub prefix_calls: Cell<usize>,
    }

    impl FixedProbe {
        pub(crate) fn image(len: Option<u64>) -> Self {
            Self {
                head: Some(ProbeHead {
                    status: 200,
                    content_type: Some("image/jpeg".to_string()),
                    content_length: len,
                }),
                prefix: Some(8192),
                head_calls: Cell::new(0),
                prefix_calls: Cell::new(0),
            }
        }

        pub(crate) fn unreachable() -> Self {
            Self {
                head: None,
                prefix: None,
                head_calls: Cell::new(0),
                prefix_calls: Cell::new(0),
            }
        }
    }

    impl UrlProbe for FixedProbe {
        async fn head(&self, _url: &str) -> Result<ProbeHead, Box<dyn Error>> {
            self.head_calls.set(self.head_calls.get() + 1);
            self.head.clone().ok_or_else(|| "connection refused".into())
        }

        async fn read_prefix(&self, _url: &str, _limit: u64) -> Result<u64, Box<dyn Error>> {
            self.prefix_calls.set(self.prefix_calls.get() + 1);
            self.prefix.ok_or_else(|| "reset".into())
        }
    }

    #[test]
    fn test_quick_verdicts() {
        assert_eq!(quick_verdict("ftp://x.example/a.jpg"), QuickVerdict::Reject);
        assert_eq!(quick_verdict("/relative/a.jpg"), QuickVerdict::Reject);
        assert_eq!(quick_verdict("https://x.example/anim.GIF"), QuickVerdict::Reject);
        assert_eq!(quick_verdict("https://x.example/site-logo.png"), QuickVerdict::Reject);
        assert_eq!(quick_verdict("https://x.example/u/avatar/12.jpg"), QuickVerdict::Reject);
        assert_eq!(
            quick_verdict("https://cdn.pixabay.com/photo/2015/09/03/blog-920730_1280.jpg"),
            QuickVerdict::Accept
        );
        assert_eq!(
            quick_verdict("https://upload.wikimedia.org/wikipedia/commons/a/ab/Cup.PNG"),
            QuickVerdict::Accept
        );
        assert_eq!(
            quick_verdict("https://cdn.pixabay.com/photo/clip.mp4"),
            QuickVerdict::NeedsProbe
        );
        assert_eq!(
            quick_verdict("https://cdn.pixabay.com.evil.example/a.jpg"),
            QuickVerdict::NeedsProbe
        );
        assert_eq!(quick_verdict("https://photos.example/a.jpg"), QuickVerdict::NeedsProbe);
    }

    #[tokio::test]
    async fn test_accepts_large_image() {
        let v = UrlValidator::new(FixedProbe::image(Some(120_000)), 8192);
        assert!(v.is_valid("https://photos.example/a.jpg").await);
        assert_eq!(v.probe().prefix_calls.get(), 0);
    }

    #[tokio::test]
    async fn test_rejects_small_image() {
        let v = UrlValidator::new(FixedProbe::image(Some(512)), 8192);
        assert!(!v.is_valid("https://photos.example/tiny.jpg").await);
    }

    #[tokio::test]
    async fn test_rejects_non_image_and_non_200() {
        let mut html = FixedProbe::image(Some(100_000));
        html.head.as_mut().unwrap().content_type = Some("text/html".into());
        assert!(!UrlValidator::new(html, 8192).is_valid("https://a.example/x.jpg").await);

        let mut moved = FixedProbe::image(Some(100_000));
        moved.head.as_mut().unwrap().status = 404;
        assert!(!UrlValidator::new(moved, 8192).is_valid("https://a.example/x.jpg").await);
    }

    #[tokio::test]
    async fn test_ranged_read_when_length_missing() {
        let mut probe = FixedProbe::image(None);
        probe.prefix = Some(4000);
        let v = UrlValidator::new(probe, 8192);
        assert!(!v.is_valid("https://photos.example/b.jpg").await);
        assert_eq!(v.probe().prefix_calls.get(), 1);

        let v = UrlValidator::new(FixedProbe::image(None), 8192);
        assert!(v.is_valid("https://photos.example/c.jpg").await);
    }

    #[tokio::test]
    async fn test_network_error_fails_closed() {
        let v = UrlValidator::new(FixedProbe::unreachable(), 8192);
        assert!(!v.is_valid("https://photos.example/d.jpg").await);
    }

    #[tokio::test]
    async fn test_memoizes_network_checks() {
        let v = UrlValidator::new(FixedProbe::image(Some(50_000)), 8192);
        let url = "https://photos.example/e.jpg";
        assert!(v.is_valid(url).await);
        assert!(v.is_valid(url).await);
        assert_eq!(v.probe().head_calls.get(), 1);
        assert_eq!(v.cache().lock().unwrap().get(url), Some(&true));
    }

    #[tokio::test]
    async fn test_injected_cache_short_circuits() {
        let cache = ValidationCache::default();
        cache
            .lock()
            .unwrap()
            .insert("https://photos.example/known.jpg".to_string(), false);
        let v = UrlValidator::with_cache(FixedProbe::image(Some(50_000)), 8192, cache);
        assert!(!v.is_valid("https://photos.example/known.jpg").await);
        assert_eq!(v.probe().head_calls.get(), 0);
    }
}
