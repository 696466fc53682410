//! Data models shared by the pipeline stages.
//!
//! - [`ImageCandidate`]: a transient search hit from one of the image backends
//! - [`LinkRecord`]: one previously generated article in the Link Graph
//! - [`RelatedArticle`]: a link suggestion handed to the body prompt
//! - [`GeneratedArticle`]: the finished value returned by the assembler
//! - [`ArticleSummary`]: the metadata row written to the generated-articles index

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which search backend produced an [`ImageCandidate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImageSource {
    Bing,
    Yahoo,
}

impl fmt::Display for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageSource::Bing => f.write_str("Bing"),
            ImageSource::Yahoo => f.write_str("Yahoo"),
        }
    }
}

/// A candidate illustration. Produced per query and never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageCandidate {
    pub url: String,
    pub title: String,
    pub source: ImageSource,
}

impl ImageCandidate {
    /// Build a candidate titled after the query and its 1-based rank.
    pub fn ranked(url: impl Into<String>, query: &str, rank: usize, source: ImageSource) -> Self {
        Self {
            url: url.into(),
            title: format!("{} image {}", query, rank),
            source,
        }
    }
}

/// A previously generated article, keyed by `permalink`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRecord {
    pub title: String,
    pub subject: String,
    pub permalink: String,
    /// ISO-8601 creation time. Immutable once written.
    pub timestamp: String,
}

impl LinkRecord {
    /// The category used for grouping: the first word of the subject.
    pub fn category(&self) -> Option<&str> {
        self.subject.split_whitespace().next()
    }
}

/// A related article suggested for internal linking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelatedArticle {
    pub title: String,
    pub permalink: String,
    /// Number of subject words shared with the query subject.
    pub score: usize,
}

/// A finished article. Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedArticle {
    pub title: String,
    pub subject: String,
    pub permalink: String,
    pub category: Option<String>,
    /// Body with images resolved and the content-break marker inserted.
    pub article_body: String,
    /// Front matter followed by the body; ready to publish.
    pub markdown_document: String,
}

/// One row of the generated-articles index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleSummary {
    pub subject: String,
    pub title: String,
    pub file: String,
    pub permalink: String,
    pub category: String,
    pub created_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranked_candidate_title() {
        let c = ImageCandidate::ranked("https://x/a.jpg", "coffee beans", 2, ImageSource::Yahoo);
        assert_eq!(c.title, "coffee beans image 2");
        assert_eq!(c.source.to_string(), "Yahoo");
    }

    #[test]
    fn test_link_record_roundtrip_field_names() {
        let json = r#"{
            "title": "Brew Better Coffee",
            "subject": "coffee brewing",
            "permalink": "/brew-better-coffee",
            "timestamp": "2025-05-06T14:30:00"
        }"#;
        let record: LinkRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.permalink, "/brew-better-coffee");
        assert_eq!(record.category(), Some("coffee"));
    }

    #[test]
    fn test_category_of_blank_subject() {
        let record = LinkRecord {
            title: "t".into(),
            subject: "   ".into(),
            permalink: "/t".into(),
            timestamp: String::new(),
        };
        assert_eq!(record.category(), None);
    }

    #[test]
    fn test_article_summary_serialization() {
        let summary = ArticleSummary {
            subject: "coffee".into(),
            title: "Coffee".into(),
            file: "_posts/2025-05-06-coffee.md".into(),
            permalink: "/coffee".into(),
            category: "coffee".into(),
            created_at: "2025-05-06T10:00:00+00:00".into(),
        };
        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("\"file\":\"_posts/2025-05-06-coffee.md\""));
    }
}
