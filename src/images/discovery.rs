//! Tiered image search across the two scraped backends.
//!
//! 1. Primary backend; enough valid hits ends the search.
//! 2. Secondary backend, appended to the primary's hits.
//! 3. Too few hits overall: reformulated queries against the primary only.
//! 4. Whatever was collected is returned, possibly nothing.

use super::validation::{UrlProbe, UrlValidator};
use crate::config::ImageSettings;
use crate::error::ImageError;
use crate::models::ImageCandidate;
use crate::scrapers::ImageBackend;
use futures::stream::{self, StreamExt};
use tracing::{debug, info, instrument};

/// What placeholder substitution needs from image search.
pub trait ImageFinder {
    async fn find_images(&self, query: &str) -> Result<Vec<ImageCandidate>, ImageError>;
}

/// Tier thresholds. See [`ImageSettings`] for their meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscoveryThresholds {
    pub primary_sufficient: usize,
    pub min_before_reformulation: usize,
    pub reformulation_target: usize,
    pub max_candidates: usize,
}

impl Default for DiscoveryThresholds {
    fn default() -> Self {
        Self {
            primary_sufficient: 3,
            min_before_reformulation: 2,
            reformulation_target: 3,
            max_candidates: 5,
        }
    }
}

impl From<&ImageSettings> for DiscoveryThresholds {
    fn from(settings: &ImageSettings) -> Self {
        Self {
            primary_sufficient: settings.primary_sufficient,
            min_before_reformulation: settings.min_before_reformulation,
            reformulation_target: settings.reformulation_target,
            max_candidates: settings.max_candidates,
        }
    }
}

/// Alternative phrasings tried against the primary backend.
pub fn reformulations(query: &str) -> Vec<String> {
    let words: Vec<&str> = query.split_whitespace().collect();
    let first = |n: usize| words.iter().take(n).copied().collect::<Vec<_>>().join(" ");
    vec![
        first(3),
        format!("{query} high quality image"),
        format!("{query} featured image"),
        format!("{} guide image", first(2)),
    ]
}

#[derive(Debug)]
pub struct ImageDiscovery<A, B, P> {
    primary: A,
    secondary: B,
    validator: UrlValidator<P>,
    thresholds: DiscoveryThresholds,
}

impl<A, B, P> ImageDiscovery<A, B, P>
where
    A: ImageBackend,
    B: ImageBackend,
    P: UrlProbe,
{
    pub fn new(primary: A, secondary: B, validator: UrlValidator<P>) -> Self {
        Self {
            primary,
            secondary,
            validator,
            thresholds: DiscoveryThresholds::default(),
        }
    }

    pub fn with_thresholds(mut self, thresholds: DiscoveryThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    async fn keep_valid(&self, candidates: Vec<ImageCandidate>) -> Vec<ImageCandidate> {
        let validator = &self.validator;
        stream::iter(candidates)
            .filter_map(|candidate| async move {
                if validator.is_valid(&candidate.url).await {
                    debug!(url = %candidate.url, source = %candidate.source, "Valid image");
                    Some(candidate)
                } else {
                    debug!(url = %candidate.url, source = %candidate.source, "Skipped invalid image");
                    None
                }
            })
            .collect()
            .await
    }

    /// Valid candidates for `query`, best effort. Never fails.
    #[instrument(level = "info", skip(self))]
    pub async fn search(&self, query: &str) -> Vec<ImageCandidate> {
        let t = self.thresholds;

        let mut found = self.keep_valid(self.primary.search(query).await).await;
        if found.len() >= t.primary_sufficient {
            info!(count = found.len(), source = %self.primary.source(), "Primary backend sufficient");
            return found;
        }

        let secondary = self.keep_valid(self.secondary.search(query).await).await;
        found.extend(secondary);

        if found.len() < t.min_before_reformulation {
            'queries: for alt in reformulations(query) {
                if found.len() >= t.reformulation_target {
                    break;
                }
                if alt.trim().is_empty() {
                    continue;
                }
                debug!(%alt, "Trying reformulated query");
                for candidate in self.primary.search(&alt).await {
                    if found.iter().any(|c| c.url == candidate.url) {
                        continue;
                    }
                    if self.validator.is_valid(&candidate.url).await {
                        found.push(candidate);
                        if found.len() >= t.max_candidates {
                            break 'queries;
                        }
                    }
                }
            }
        }

        info!(count = found.len(), "Image search finished");
        found
    }
}

impl<A, B, P> ImageFinder for ImageDiscovery<A, B, P>
where
    A: ImageBackend,
    B: ImageBackend,
    P: UrlProbe,
{
    async fn find_images(&self, query: &str) -> Result<Vec<ImageCandidate>, ImageError> {
        Ok(self.search(query).await)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::images::validation::tests::FixedProbe;
    use crate::models::ImageSource;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// Backend answering from a query → URLs table and logging queries.
    pub(crate) struct CannedBackend {
        source: ImageSource,
        answers: HashMap<String, Vec<String>>,
        pub queries: RefCell<Vec<String>>,
    }

    impl CannedBackend {
        pub(crate) fn new(source: ImageSource, answers: Vec<(&str, Vec<&str>)>) -> Self {
            Self {
                source,
                answers: answers
                    .into_iter()
                    .map(|(q, urls)| (q.to_string(), urls.into_iter().map(str::to_string).collect()))
                    .collect(),
                queries: RefCell::new(Vec::new()),
            }
        }
    }

    impl ImageBackend for CannedBackend {
        fn source(&self) -> ImageSource {
            self.source
        }

        async fn search(&self, query: &str) -> Vec<ImageCandidate> {
            self.queries.borrow_mut().push(query.to_string());
            self.answers
                .get(query)
                .map(|urls| {
                    urls.iter()
                        .enumerate()
                        .map(|(i, u)| ImageCandidate::ranked(u.as_str(), query, i + 1, self.source))
                        .collect()
                })
                .unwrap_or_default()
        }
    }

    fn discovery(
        bing: Vec<(&str, Vec<&str>)>,
        yahoo: Vec<(&str, Vec<&str>)>,
    ) -> ImageDiscovery<CannedBackend, CannedBackend, FixedProbe> {
        ImageDiscovery::new(
            CannedBackend::new(ImageSource::Bing, bing),
            CannedBackend::new(ImageSource::Yahoo, yahoo),
            UrlValidator::new(FixedProbe::image(Some(50_000)), 8192),
        )
    }

    #[test]
    fn test_reformulations() {
        assert_eq!(
            reformulations("cold brew coffee at home"),
            vec![
                "cold brew coffee",
                "cold brew coffee at home high quality image",
                "cold brew coffee at home featured image",
                "cold brew guide image",
            ]
        );
    }

    #[tokio::test]
    async fn test_primary_sufficient_skips_secondary() {
        let d = discovery(
            vec![("tea", vec!["https://a.example/1.jpg", "https://a.example/2.jpg", "https://a.example/3.jpg"])],
            vec![("tea", vec!["https://b.example/1.jpg"])],
        );
        let found = d.search("tea").await;
        assert_eq!(found.len(), 3);
        assert!(found.iter().all(|c| c.source == ImageSource::Bing));
        assert!(d.secondary.queries.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_secondary_results_are_appended() {
        let d = discovery(
            vec![("tea", vec!["https://a.example/1.jpg", "https://a.example/logo.png"])],
            vec![("tea", vec!["https://b.example/1.jpg", "https://b.example/2.jpg"])],
        );
        let found = d.search("tea").await;
        let urls: Vec<&str> = found.iter().map(|c| c.url.as_str()).collect();
        assert_eq!(
            urls,
            vec!["https://a.example/1.jpg", "https://b.example/1.jpg", "https://b.example/2.jpg"]
        );
        assert_eq!(d.primary.queries.borrow().len(), 1);
    }

    #[tokio::test]
    async fn test_reformulates_when_too_few() {
        let d = discovery(
            vec![
                ("green tea leaves", vec!["https://a.example/icon.png"]),
                ("green tea leaves high quality image", vec!["https://a.example/hq1.jpg", "https://a.example/hq2.jpg"]),
                ("green tea leaves featured image", vec!["https://a.example/f1.jpg"]),
            ],
            vec![],
        );
        let found = d.search("green tea leaves").await;
        let urls: Vec<&str> = found.iter().map(|c| c.url.as_str()).collect();
        assert_eq!(
            urls,
            vec!["https://a.example/hq1.jpg", "https://a.example/hq2.jpg", "https://a.example/f1.jpg"]
        );
        // the query itself, first three words (same text), high quality, featured; stops at 3
        assert_eq!(d.primary.queries.borrow().len(), 4);
    }

    #[tokio::test]
    async fn test_reformulation_caps_total() {
        let many = vec![
            "https://a.example/1.jpg",
            "https://a.example/2.jpg",
            "https://a.example/3.jpg",
            "https://a.example/4.jpg",
            "https://a.example/5.jpg",
            "https://a.example/6.jpg",
        ];
        let d = discovery(vec![("mug", vec![]), ("mug high quality image", many)], vec![])
            .with_thresholds(DiscoveryThresholds {
                reformulation_target: 10,
                ..DiscoveryThresholds::default()
            });
        assert_eq!(d.search("mug").await.len(), 5);
    }

    #[tokio::test]
    async fn test_nothing_found_is_empty() {
        let d = discovery(vec![], vec![]);
        assert!(d.find_images("nothing at all").await.unwrap().is_empty());
    }
}
