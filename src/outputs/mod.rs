//! Flat-file outputs of a generation batch.
//!
//! - [`markdown`]: front matter rendering and post files
//! - [`json`]: the generated-articles metadata index
//!
//! # Output Structure
//!
//! ```text
//! _posts/
//! ├── 2025-05-06-brew-better-coffee-at-home.md
//! └── 2025-05-06-cold-brew-guide.md
//! generated_articles.json
//! article_links.json        # Link Graph Store, written by `links`
//! ```

pub mod json;
pub mod markdown;
