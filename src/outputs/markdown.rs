//! Jekyll-style markdown posts: a YAML front matter block followed by the body.
//!
//! ```text
//! ---
//! title: Brew Better Coffee at Home
//! date: 2025-05-06T14:30:00+00:00
//! author: Editorial Team
//! layout: post
//! image: https://img.example/cup.jpg
//! lang: en
//! tag:
//! - brew better coffee
//! - coffee
//! permalink: /brew-better-coffee-at-home
//! categories:
//! - coffee
//! ---
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument};

pub const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S+00:00";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrontMatter {
    pub title: String,
    pub date: String,
    pub author: String,
    pub layout: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// ISO 639-1 code of the article language.
    pub lang: String,
    pub tag: Vec<String>,
    pub permalink: String,
    #[serde(default)]
    pub categories: Vec<String>,
}

pub fn format_date(at: DateTime<Utc>) -> String {
    at.format(DATE_FORMAT).to_string()
}

/// Serialize `front_matter` between `---` fences, followed by a blank line.
pub fn render_front_matter(front_matter: &FrontMatter) -> Result<String, serde_yaml::Error> {
    let yaml = serde_yaml::to_string(front_matter)?;
    Ok(format!("---\n{yaml}---\n\n"))
}

/// File name of a post: `{YYYY-MM-DD}-{slug}.md`.
pub fn post_filename(date: NaiveDate, slug: &str) -> String {
    format!("{}-{}.md", date.format("%Y-%m-%d"), slug)
}

/// Write `document` into `output_dir`, creating the directory if needed.
#[instrument(level = "info", skip_all, fields(output_dir = %output_dir.display(), %slug))]
pub async fn write_post(
    output_dir: &Path,
    date: NaiveDate,
    slug: &str,
    document: &str,
) -> std::io::Result<PathBuf> {
    fs::create_dir_all(output_dir).await?;
    let path = output_dir.join(post_filename(date, slug));
    fs::write(&path, document).await?;
    info!(path = %path.display(), bytes = document.len(), "Wrote post");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> FrontMatter {
        FrontMatter {
            title: "Article About coffee brewing".into(),
            date: format_date(Utc.with_ymd_and_hms(2025, 5, 6, 14, 30, 0).unwrap()),
            author: "Editorial Team".into(),
            layout: "post".into(),
            image: None,
            lang: "en".into(),
            tag: vec!["article about coffee".into(), "coffee".into()],
            permalink: "/article-about-coffee-brewing".into(),
            categories: vec!["coffee".into()],
        }
    }

    #[test]
    fn test_front_matter_is_fenced_yaml() {
        let rendered = render_front_matter(&sample()).unwrap();
        assert!(rendered.starts_with("---\n"));
        assert!(rendered.ends_with("---\n\n"));
        assert!(rendered.contains("permalink: /article-about-coffee-brewing"));
        assert!(!rendered.contains("image:"));

        let inner = rendered
            .trim_start_matches("---\n")
            .trim_end_matches("---\n\n");
        let parsed: FrontMatter = serde_yaml::from_str(inner).unwrap();
        assert_eq!(parsed, sample());
        assert_eq!(parsed.date, "2025-05-06T14:30:00+00:00");
    }

    #[test]
    fn test_front_matter_with_image() {
        let fm = FrontMatter {
            image: Some("https://img.example/cup.jpg".into()),
            ..sample()
        };
        let rendered = render_front_matter(&fm).unwrap();
        assert!(rendered.contains("image: https://img.example/cup.jpg"));
    }

    #[test]
    fn test_post_filename() {
        let date = NaiveDate::from_ymd_opt(2025, 5, 6).unwrap();
        assert_eq!(post_filename(date, "brew-better"), "2025-05-06-brew-better.md");
    }

    #[tokio::test]
    async fn test_write_post_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("_posts");
        let date = NaiveDate::from_ymd_opt(2025, 5, 6).unwrap();
        let path = write_post(&out, date, "tea", "---\n---\n\nBody").await.unwrap();
        assert_eq!(path, out.join("2025-05-06-tea.md"));
        assert_eq!(std::fs::read_to_string(path).unwrap(), "---\n---\n\nBody");
    }
}
