//! Image discovery: validation, tiered search and placeholder substitution.
//!
//! - [`validation`]: memoized URL checks (`is_valid`) backed by a [`UrlProbe`]
//! - [`discovery`]: the tiered `find_images` search over two backends
//! - [`placeholders`]: replaces `[IMAGE: ...]` markers in generated text
//!
//! [`UrlProbe`]: validation::UrlProbe

pub mod discovery;
pub mod placeholders;
pub mod validation;

pub use discovery::{DiscoveryThresholds, ImageDiscovery, ImageFinder};
pub use placeholders::replace_image_placeholders;
pub use validation::{HttpProbe, UrlValidator};
