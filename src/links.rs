//! Link Graph Store: previously generated articles used for internal linking.
//!
//! The collection is an ordered list of [`LinkRecord`]s keyed by permalink,
//! kept in memory and written through to a JSON file after every mutation
//! (whole-file overwrite, no locking; one writer at a time).
//!
//! Relatedness is plain word overlap between lowercase subject word sets.

use crate::error::StoreError;
use crate::models::{LinkRecord, RelatedArticle};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

/// Fields that may change after creation. `None` leaves the field alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkUpdate {
    pub title: Option<String>,
    pub subject: Option<String>,
}

/// Aggregate counts over the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LinkStatistics {
    pub total: usize,
    pub categories: BTreeMap<String, usize>,
    pub dates: BTreeMap<String, usize>,
}

#[derive(Debug)]
pub struct LinkGraphStore {
    path: PathBuf,
    records: Vec<LinkRecord>,
}

fn words(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

impl LinkGraphStore {
    /// Load from `path`. A missing, unreadable or corrupt file yields an empty store.
    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let records = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<Vec<LinkRecord>>(&raw) {
                Ok(records) => records,
                Err(e) => {
                    warn!(error = %e, "Link store is corrupt; starting empty");
                    Vec::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                warn!(error = %e, "Link store is unreadable; starting empty");
                Vec::new()
            }
        };
        info!(count = records.len(), "Loaded link store");
        Self { path, records }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn all(&self) -> &[LinkRecord] {
        &self.records
    }

    pub fn get(&self, permalink: &str) -> Option<&LinkRecord> {
        self.records.iter().find(|r| r.permalink == permalink)
    }

    fn persist(&self) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(&self.records)?;
        std::fs::write(&self.path, json).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;
        debug!(count = self.records.len(), "Persisted link store");
        Ok(())
    }

    /// Append a record stamped with the current time.
    ///
    /// Returns `Ok(false)` without touching anything when the permalink exists.
    pub fn add(&mut self, title: &str, subject: &str, permalink: &str) -> Result<bool, StoreError> {
        self.add_at(title, subject, permalink, Local::now())
    }

    pub fn add_at(
        &mut self,
        title: &str,
        subject: &str,
        permalink: &str,
        at: DateTime<Local>,
    ) -> Result<bool, StoreError> {
        if self.get(permalink).is_some() {
            debug!(%permalink, "Permalink already recorded");
            return Ok(false);
        }
        self.records.push(LinkRecord {
            title: title.to_string(),
            subject: subject.to_string(),
            permalink: permalink.to_string(),
            timestamp: at.to_rfc3339(),
        });
        if let Err(e) = self.persist() {
            self.records.pop();
            return Err(e);
        }
        info!(%permalink, "Recorded article in link store");
        Ok(true)
    }

    /// Up to `max` records sharing subject words with `subject`, most overlap first.
    ///
    /// Ties keep storage order. `exclude_permalink` never appears in the result.
    pub fn related(
        &self,
        subject: &str,
        exclude_permalink: Option<&str>,
        max: usize,
    ) -> Vec<RelatedArticle> {
        let wanted = words(subject);
        let mut scored: Vec<RelatedArticle> = self
            .records
            .iter()
            .filter(|r| Some(r.permalink.as_str()) != exclude_permalink)
            .filter_map(|r| {
                let score = words(&r.subject).intersection(&wanted).count();
                (score > 0).then(|| RelatedArticle {
                    title: r.title.clone(),
                    permalink: r.permalink.clone(),
                    score,
                })
            })
            .collect();
        scored.sort_by(|a, b| b.score.cmp(&a.score));
        scored.truncate(max);
        scored
    }

    pub fn delete(&mut self, permalink: &str) -> Result<bool, StoreError> {
        let Some(index) = self.records.iter().position(|r| r.permalink == permalink) else {
            return Ok(false);
        };
        self.records.remove(index);
        self.persist()?;
        info!(%permalink, "Deleted article from link store");
        Ok(true)
    }

    /// Change title and/or subject. Permalink and timestamp never change.
    pub fn update(&mut self, permalink: &str, fields: LinkUpdate) -> Result<bool, StoreError> {
        let Some(record) = self.records.iter_mut().find(|r| r.permalink == permalink) else {
            return Ok(false);
        };
        if let Some(title) = fields.title {
            record.title = title;
        }
        if let Some(subject) = fields.subject {
            record.subject = subject;
        }
        self.persist()?;
        info!(%permalink, "Updated article in link store");
        Ok(true)
    }

    /// Records whose first subject word equals `category`, ignoring case.
    pub fn by_category(&self, category: &str) -> Vec<&LinkRecord> {
        let wanted = category.to_lowercase();
        self.records
            .iter()
            .filter(|r| r.category().is_some_and(|c| c.to_lowercase() == wanted))
            .collect()
    }

    pub fn statistics(&self) -> LinkStatistics {
        let mut stats = LinkStatistics {
            total: self.records.len(),
            ..LinkStatistics::default()
        };
        for record in &self.records {
            let category = record.category().unwrap_or("uncategorized").to_string();
            *stats.categories.entry(category).or_default() += 1;

            if let Ok(ts) = DateTime::parse_from_rfc3339(&record.timestamp) {
                *stats
                    .dates
                    .entry(ts.format("%Y-%m-%d").to_string())
                    .or_default() += 1;
            } else if let Ok(ts) =
                chrono::NaiveDateTime::parse_from_str(&record.timestamp, "%Y-%m-%dT%H:%M:%S%.f")
            {
                *stats
                    .dates
                    .entry(ts.format("%Y-%m-%d").to_string())
                    .or_default() += 1;
            }
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn store_in(dir: &tempfile::TempDir) -> LinkGraphStore {
        LinkGraphStore::load(dir.path().join("article_links.json"))
    }

    fn seeded(dir: &tempfile::TempDir, rows: &[(&str, &str, &str)]) -> LinkGraphStore {
        let mut store = store_in(dir);
        for (title, subject, permalink) in rows {
            assert!(store.add(title, subject, permalink).unwrap());
        }
        store
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(store_in(&dir).is_empty());
    }

    #[test]
    fn test_corrupt_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("article_links.json"), "{not json").unwrap();
        assert!(store_in(&dir).is_empty());
    }

    #[test]
    fn test_add_persists_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        seeded(&dir, &[("Brew", "coffee brewing", "/brew")]);
        let reloaded = store_in(&dir);
        assert_eq!(reloaded.len(), 1);
        let record = reloaded.get("/brew").unwrap();
        assert_eq!(record.subject, "coffee brewing");
        assert!(DateTime::parse_from_rfc3339(&record.timestamp).is_ok());
    }

    #[test]
    fn test_duplicate_permalink_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = seeded(&dir, &[("First", "coffee", "/same")]);
        assert!(!store.add("Second", "tea", "/same").unwrap());
        assert_eq!(store.len(), 1);
        let reloaded = store_in(&dir);
        assert_eq!(reloaded.get("/same").unwrap().title, "First");
        assert_eq!(reloaded.get("/same").unwrap().subject, "coffee");
    }

    #[test]
    fn test_related_single_overlap() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded(
            &dir,
            &[
                ("Scrape With Python", "python web scraping", "/scrape-with-python"),
                ("Best Scraping Tools", "web scraping tools", "/best-scraping-tools"),
            ],
        );
        let related = store.related("python tutorials", None, 3);
        assert_eq!(related.len(), 1);
        assert_eq!(related[0].permalink, "/scrape-with-python");
        assert_eq!(related[0].score, 1);
    }

    #[test]
    fn test_related_sorted_excluded_and_capped() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded(
            &dir,
            &[
                ("A", "coffee", "/a"),
                ("B", "cold brew coffee", "/b"),
                ("C", "Coffee Brew", "/c"),
                ("D", "tea", "/d"),
                ("E", "brew", "/e"),
                ("F", "cold brew coffee guide", "/self"),
            ],
        );
        let related = store.related("cold brew coffee", Some("/self"), 3);
        let permalinks: Vec<&str> = related.iter().map(|r| r.permalink.as_str()).collect();
        assert_eq!(permalinks, vec!["/b", "/c", "/a"]);
        assert!(related.windows(2).all(|w| w[0].score >= w[1].score));
        assert!(related.iter().all(|r| r.permalink != "/self" && r.score > 0));

        assert!(store.related("", None, 3).is_empty());
        assert!(store.related("coffee", None, 0).is_empty());
    }

    #[test]
    fn test_delete() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = seeded(&dir, &[("A", "coffee", "/a"), ("B", "tea", "/b")]);
        assert!(store.delete("/a").unwrap());
        assert!(!store.delete("/a").unwrap());
        assert_eq!(store_in(&dir).all().len(), 1);
    }

    #[test]
    fn test_update_keeps_permalink_and_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = seeded(&dir, &[("Old", "coffee", "/a")]);
        let before = store.get("/a").unwrap().timestamp.clone();
        let changed = store
            .update(
                "/a",
                LinkUpdate {
                    title: Some("New".into()),
                    subject: None,
                },
            )
            .unwrap();
        assert!(changed);
        let reloaded = store_in(&dir);
        let record = reloaded.get("/a").unwrap();
        assert_eq!(record.title, "New");
        assert_eq!(record.subject, "coffee");
        assert_eq!(record.timestamp, before);
        assert!(!store.update("/missing", LinkUpdate::default()).unwrap());
    }

    #[test]
    fn test_by_category_and_statistics() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        let day1 = Local.with_ymd_and_hms(2025, 5, 6, 10, 0, 0).unwrap();
        let day2 = Local.with_ymd_and_hms(2025, 5, 7, 10, 0, 0).unwrap();
        store.add_at("A", "Coffee brewing", "/a", day1).unwrap();
        store.add_at("B", "coffee beans", "/b", day1).unwrap();
        store.add_at("C", "tea", "/c", day2).unwrap();

        assert_eq!(store.by_category("COFFEE").len(), 2);

        let stats = store.statistics();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.categories.get("Coffee"), Some(&1));
        assert_eq!(stats.categories.get("coffee"), Some(&1));
        assert_eq!(stats.dates.get("2025-05-06"), Some(&2));
        assert_eq!(stats.dates.get("2025-05-07"), Some(&1));
    }

    #[test]
    fn test_write_failure_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = LinkGraphStore::load(dir.path().join("missing-dir/links.json"));
        assert!(matches!(
            store.add("A", "coffee", "/a"),
            Err(StoreError::Io { .. })
        ));
    }
}
