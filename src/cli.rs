//! Command-line interface definitions.
//!
//! Options can come from flags or environment variables; anything site-wide
//! (domain, models, thresholds) lives in the optional YAML config file.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Generate SEO articles with a generative text model.
///
/// # Examples
///
/// ```sh
/// # One article per line of keyword.txt, keys from apikey.txt
/// seo_article_forge generate
///
/// # Two explicit keywords, keys from the environment
/// GEMINI_API_KEYS=key1,key2 seo_article_forge generate -k "cold brew" -k "pour over"
///
/// # Inspect the link store
/// seo_article_forge links stats
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a config.yaml file
    #[arg(short, long, global = true, env = "SEO_FORGE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate one article per keyword
    Generate(GenerateArgs),
    /// Check every API key with a minimal request
    CheckKeys(KeyArgs),
    /// Inspect or edit the link store
    Links {
        #[command(subcommand)]
        action: LinksAction,
    },
}

/// Where API keys come from. Inline keys are used first, then the file.
#[derive(Args, Debug, Clone)]
pub struct KeyArgs {
    /// File with one API key per line
    #[arg(long, default_value = "apikey.txt")]
    pub api_keys_file: PathBuf,

    /// API keys, comma separated
    #[arg(long = "api-key", env = "GEMINI_API_KEYS", value_delimiter = ',')]
    pub api_keys: Vec<String>,
}

#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    /// File with one keyword per line
    #[arg(long, default_value = "keyword.txt")]
    pub keywords_file: PathBuf,

    /// Keyword to generate; repeatable. Replaces the keywords file when given.
    #[arg(short, long = "keyword")]
    pub keywords: Vec<String>,

    #[command(flatten)]
    pub keys: KeyArgs,

    /// Output directory for the markdown posts
    #[arg(short, long, default_value = "_posts")]
    pub output_dir: PathBuf,

    /// Category for every article in this batch
    #[arg(long)]
    pub category: Option<String>,

    /// Site domain, overriding the config file
    #[arg(long)]
    pub domain: Option<String>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum LinksAction {
    /// List every recorded article
    List {
        /// Only records whose category (first subject word) matches
        #[arg(long)]
        category: Option<String>,
    },
    /// Totals per category and per day
    Stats,
    /// Remove a record
    Delete { permalink: String },
    /// Change the title or subject of a record
    Update {
        permalink: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        subject: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_defaults() {
        let cli = Cli::parse_from(["seo_article_forge", "generate"]);
        let Command::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        assert_eq!(args.keywords_file, PathBuf::from("keyword.txt"));
        assert_eq!(args.keys.api_keys_file, PathBuf::from("apikey.txt"));
        assert_eq!(args.output_dir, PathBuf::from("_posts"));
        assert!(args.keywords.is_empty());
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_generate_flags() {
        let cli = Cli::parse_from([
            "seo_article_forge",
            "generate",
            "-k",
            "cold brew",
            "--keyword",
            "pour over",
            "--api-key",
            "a,b",
            "-o",
            "/tmp/posts",
            "--category",
            "coffee",
            "--config",
            "site.yaml",
        ]);
        assert_eq!(cli.config, Some(PathBuf::from("site.yaml")));
        let Command::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        assert_eq!(args.keywords, vec!["cold brew", "pour over"]);
        assert_eq!(args.keys.api_keys, vec!["a", "b"]);
        assert_eq!(args.output_dir, PathBuf::from("/tmp/posts"));
        assert_eq!(args.category.as_deref(), Some("coffee"));
    }

    #[test]
    fn test_links_subcommands() {
        let cli = Cli::parse_from(["seo_article_forge", "links", "delete", "/old-post"]);
        let Command::Links { action } = cli.command else {
            panic!("expected links");
        };
        assert_eq!(
            action,
            LinksAction::Delete {
                permalink: "/old-post".into()
            }
        );

        let cli = Cli::parse_from([
            "seo_article_forge",
            "links",
            "update",
            "/p",
            "--title",
            "New Title",
        ]);
        let Command::Links { action } = cli.command else {
            panic!("expected links");
        };
        assert_eq!(
            action,
            LinksAction::Update {
                permalink: "/p".into(),
                title: Some("New Title".into()),
                subject: None,
            }
        );
    }
}
