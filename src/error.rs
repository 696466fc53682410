//! Error types shared across the generation pipeline.
//!
//! Every external boundary converts its failures into one of these types
//! before handing control back to the caller:
//!
//! - [`AttemptError`]: why a single call to the text endpoint failed
//! - [`GenerationError`]: why a whole `generate` call gave up
//! - [`StoreError`]: a Link Graph write that could not be persisted
//! - [`ConfigError`]: a configuration file that could not be used
//! - [`ImageError`]: an unexpected failure while resolving one placeholder
//! - [`LanguageError`]: a detector that could not decide

use std::path::PathBuf;
use thiserror::Error;

/// Classification of one failed call to the generative text endpoint.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AttemptError {
    /// HTTP 429. The client rotates and then waits before the next attempt.
    #[error("rate limited by the text endpoint")]
    RateLimited,

    /// Any other non-2xx status.
    #[error("text endpoint returned HTTP {0}")]
    Status(u16),

    /// Connection, DNS, TLS or timeout failure.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The body was not the JSON shape we expect.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// A well-formed response without any candidate text.
    #[error("response contained no candidates")]
    EmptyResponse,
}

impl AttemptError {
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, AttemptError::RateLimited)
    }
}

/// Failure of a complete `generate` call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    /// The credential pool is empty. Raised before any network attempt.
    #[error("no API keys available")]
    NoCredentials,

    /// The model rotation sequence is empty. Raised before any network attempt.
    #[error("no models configured")]
    NoModels,

    /// Every attempt failed.
    #[error("generation failed after {attempts} attempts: {last_error}")]
    Exhausted {
        attempts: usize,
        last_error: AttemptError,
    },
}

impl GenerationError {
    /// Configuration failures are fatal for the whole pipeline, not just one step.
    pub fn is_configuration(&self) -> bool {
        matches!(self, GenerationError::NoCredentials | GenerationError::NoModels)
    }
}

/// Failure to persist the Link Graph collection.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to write link store {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize link store: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Failure to load or accept a configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Unexpected failure while resolving a single image placeholder.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImageError {
    #[error("image lookup failed: {0}")]
    Lookup(String),
}

/// The language detector could not produce an answer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LanguageError {
    #[error("cannot detect language of empty text")]
    EmptyInput,

    #[error("language could not be determined")]
    Undetermined,
}
