//! Pipeline configuration loaded from an optional YAML file.
//!
//! Every field has a default, so an absent file or a partial file is fine.
//! Command-line flags override the few values that are commonly changed per
//! run (domain, category); everything else lives here.
//!
//! ```yaml
//! domain: myblog.example
//! author: Editorial Team
//! models: [gemini-1.5-flash, gemini-2.0-flash]
//! generation:
//!   max_retries: 3
//!   rate_limit_delay_ms: 1500
//! images:
//!   primary_sufficient: 3
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, instrument};

pub const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// Site domain used in the body prompt and internal links.
    pub domain: String,
    /// Author written into the front matter.
    pub author: String,
    /// Jekyll layout tag.
    pub layout: String,
    /// Category used when the caller does not supply one.
    pub default_category: Option<String>,
    /// Model rotation sequence.
    pub models: Vec<String>,
    /// Pin title generation to a model instead of the rotation cursor.
    pub title_model: Option<String>,
    /// Pin body generation to a model instead of the rotation cursor.
    pub body_model: Option<String>,
    pub api_base_url: String,
    pub generation: GenerationSettings,
    pub images: ImageSettings,
    /// Link Graph collection file.
    pub links_file: PathBuf,
    /// Metadata index of generated articles.
    pub articles_index: PathBuf,
    /// Pause between keywords in a batch.
    pub batch_delay_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            domain: "example.com".to_string(),
            author: "Editorial Team".to_string(),
            layout: "post".to_string(),
            default_category: None,
            models: vec![
                "gemini-1.5-flash".to_string(),
                "gemini-2.0-flash".to_string(),
            ],
            title_model: None,
            body_model: None,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            generation: GenerationSettings::default(),
            images: ImageSettings::default(),
            links_file: PathBuf::from("article_links.json"),
            articles_index: PathBuf::from("generated_articles.json"),
            batch_delay_ms: 1500,
        }
    }
}

/// Parameters for calls to the text endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GenerationSettings {
    pub temperature: f32,
    pub title_max_tokens: u32,
    pub body_max_tokens: u32,
    pub max_retries: usize,
    pub request_timeout_secs: u64,
    pub rate_limit_delay_ms: u64,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            title_max_tokens: 256,
            body_max_tokens: 8192,
            max_retries: 3,
            request_timeout_secs: 30,
            rate_limit_delay_ms: 1500,
        }
    }
}

impl GenerationSettings {
    pub fn rate_limit_delay(&self) -> Duration {
        Duration::from_millis(self.rate_limit_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Thresholds and timeouts for image discovery.
///
/// The tier thresholds were picked empirically, so they are tunable rather
/// than baked in.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ImageSettings {
    /// Valid hits from the primary backend that end the search immediately.
    pub primary_sufficient: usize,
    /// Below this many combined hits the reformulated queries are tried.
    pub min_before_reformulation: usize,
    /// Reformulation stops once this many hits are collected.
    pub reformulation_target: usize,
    /// Hard cap on hits collected during reformulation.
    pub max_candidates: usize,
    pub search_timeout_secs: u64,
    pub probe_timeout_secs: u64,
    /// Smallest acceptable image size in bytes.
    pub min_image_bytes: u64,
    /// Guaranteed-good images used when every search tier comes back empty.
    pub stock_images: Vec<String>,
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self {
            primary_sufficient: 3,
            min_before_reformulation: 2,
            reformulation_target: 3,
            max_candidates: 5,
            search_timeout_secs: 10,
            probe_timeout_secs: 3,
            min_image_bytes: 8192,
            stock_images: vec![
                "https://cdn.pixabay.com/photo/2015/09/03/08/10/blog-920730_1280.jpg".to_string(),
                "https://cdn.pixabay.com/photo/2015/01/08/18/24/programming-593312_1280.jpg"
                    .to_string(),
                "https://cdn.pixabay.com/photo/2014/05/02/21/49/blogger-336371_1280.jpg"
                    .to_string(),
                "https://cdn.pixabay.com/photo/2015/07/17/22/43/student-849825_1280.jpg"
                    .to_string(),
                "https://cdn.pixabay.com/photo/2015/01/20/13/13/ipad-605439_1280.jpg".to_string(),
            ],
        }
    }
}

impl ImageSettings {
    pub fn search_timeout(&self) -> Duration {
        Duration::from_secs(self.search_timeout_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }
}

impl AppConfig {
    /// Load from `path`, or return the defaults when no path is given.
    #[instrument(level = "info")]
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                let config = Self::from_yaml(&raw)?;
                info!(path = %path.display(), "Loaded configuration");
                config
            }
            None => {
                info!("No config file given; using defaults");
                Self::default()
            }
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, ConfigError> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(raw)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.models.is_empty() {
            return Err(ConfigError::Invalid("models must not be empty".to_string()));
        }
        if self.images.stock_images.is_empty() {
            return Err(ConfigError::Invalid(
                "images.stock_images must not be empty".to_string(),
            ));
        }
        if self.images.max_candidates == 0 {
            return Err(ConfigError::Invalid(
                "images.max_candidates must be at least 1".to_string(),
            ));
        }
        if self.generation.max_retries == 0 {
            return Err(ConfigError::Invalid(
                "generation.max_retries must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }
}
