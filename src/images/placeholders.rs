//! Replace `[IMAGE: description]` markers with markdown image references.
//!
//! Every marker is resolved: by a search hit, by one of the degraded or backup
//! queries, and finally by a stock image picked by the marker's position so
//! neighbouring fallbacks differ. Only an unexpected lookup failure leaves a
//! visible HTML comment in place of the marker.

use super::discovery::ImageFinder;
use crate::error::ImageError;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{error, info, instrument, warn};

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[IMAGE:\s*([^\]]*)\]").expect("static regex"));

/// Descriptions of every marker in `body`, in order.
pub fn placeholder_descriptions(body: &str) -> Vec<String> {
    PLACEHOLDER
        .captures_iter(body)
        .map(|c| c[1].trim().to_string())
        .collect()
}

/// Queries tried in order for one marker, before the stock tier.
fn queries_for(subject: &str, description: &str) -> Vec<String> {
    let candidates = [
        format!("{subject} {description}"),
        description.to_string(),
        subject.to_string(),
        format!("{subject} image"),
        format!("{subject} {description} tutorial image"),
        format!("{subject} {description} high quality"),
        "professional blogging image".to_string(),
        "content marketing illustration".to_string(),
    ];
    let mut queries: Vec<String> = Vec::with_capacity(candidates.len());
    for q in candidates {
        let q = q.split_whitespace().collect::<Vec<_>>().join(" ");
        if !q.is_empty() && !queries.contains(&q) {
            queries.push(q);
        }
    }
    queries
}

/// Pick an image URL for one marker.
async fn resolve_marker<F: ImageFinder>(
    finder: &F,
    subject: &str,
    description: &str,
    ordinal: usize,
    stock_images: &[String],
) -> Result<String, ImageError> {
    for (tier, query) in queries_for(subject, description).iter().enumerate() {
        let images = finder.find_images(query).await?;
        if let Some(first) = images.into_iter().next() {
            info!(%description, %query, tier, source = %first.source, "Resolved image placeholder");
            return Ok(first.url);
        }
    }

    if stock_images.is_empty() {
        return Err(ImageError::Lookup("stock image pool is empty".to_string()));
    }
    let url = stock_images[ordinal % stock_images.len()].clone();
    warn!(%description, ordinal, %url, "No search results; using stock image");
    Ok(url)
}

/// Replace every image marker in `body`.
///
/// Markers are resolved one at a time, in document order.
#[instrument(level = "info", skip_all, fields(%subject))]
pub async fn replace_image_placeholders<F: ImageFinder>(
    finder: &F,
    body: &str,
    subject: &str,
    stock_images: &[String],
) -> String {
    let markers: Vec<(std::ops::Range<usize>, String)> = PLACEHOLDER
        .captures_iter(body)
        .filter_map(|c| {
            let whole = c.get(0)?;
            Some((whole.range(), c[1].trim().to_string()))
        })
        .collect();

    if markers.is_empty() {
        return body.to_string();
    }
    info!(count = markers.len(), "Resolving image placeholders");

    let mut out = String::with_capacity(body.len());
    let mut cursor = 0;
    for (ordinal, (range, description)) in markers.into_iter().enumerate() {
        out.push_str(&body[cursor..range.start]);
        match resolve_marker(finder, subject, &description, ordinal, stock_images).await {
            Ok(url) => out.push_str(&format!("![{description}]({url})")),
            Err(e) => {
                error!(%description, error = %e, "Failed to resolve image placeholder");
                out.push_str(&format!("<!-- Error finding image: {description} - {e} -->"));
            }
        }
        cursor = range.end;
    }
    out.push_str(&body[cursor..]);
    out
}
