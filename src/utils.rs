//! Utility functions for string manipulation and file system operations.
//!
//! This module provides helper functions used throughout the application:
//! - String truncation and secret masking for logging
//! - Slugification for permalinks and file names
//! - Line-oriented flat files (API keys, keywords)
//! - File system validation for output directories

use std::error::Error;
use std::fs as stdfs;
use std::path::Path;
use tokio::fs;
use tracing::{debug, info, instrument};

/// Truncate a string for logging purposes.
///
/// Long strings are cut to at most `max` bytes on a character boundary, with
/// the number of dropped bytes appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Show only the first four characters of a secret.
pub fn mask_secret(secret: &str) -> String {
    let head: String = secret.chars().take(4).collect();
    format!("{head}…")
}

/// Convert a title to a URL-safe slug.
///
/// Lowercases, drops everything that is not alphanumeric, whitespace or a
/// hyphen, turns whitespace into hyphens and collapses repeated hyphens.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(slugify("Hello World"), "hello-world");
/// assert_eq!(slugify("Brew: A Guide!"), "brew-a-guide");
/// ```
pub fn slugify(title: &str) -> String {
    let cleaned: String = title
        .to_lowercase()
        .chars()
        .filter_map(|c| {
            if c.is_alphanumeric() {
                Some(c)
            } else if c.is_whitespace() || c == '-' || c == '_' {
                Some('-')
            } else {
                None
            }
        })
        .collect();

    cleaned
        .split('-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Permalink for a title: a leading slash followed by its slug.
pub fn permalink_for(title: &str) -> String {
    format!("/{}", slugify(title))
}

/// Read a newline-delimited file, trimming lines and skipping blanks.
///
/// A missing file reads as empty; other I/O errors propagate.
#[instrument(level = "debug", skip_all, fields(path = %path.display()))]
pub fn read_lines(path: &Path) -> std::io::Result<Vec<String>> {
    match stdfs::read_to_string(path) {
        Ok(raw) => Ok(raw
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("File not found; treating as empty");
            Ok(Vec::new())
        }
        Err(e) => Err(e),
    }
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if needed, then writes and removes a probe file.
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn ensure_writable_dir(path: &str) -> Result<(), Box<dyn Error>> {
    if let Err(e) = fs::create_dir_all(path).await {
        return Err(Box::new(e));
    }
    let probe_path = format!("{}/..__probe_write__", path.trim_end_matches('/'));
    match stdfs::File::create(&probe_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&probe_path);
            info!("Output directory is writable");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}
