//! # SEO Article Forge
//!
//! Generates long-form, SEO-oriented markdown articles from keywords with a
//! Gemini-style text model, illustrates them with images found on public
//! search engines and links them to previously generated articles.
//!
//! ## Usage
//!
//! ```sh
//! seo_article_forge generate --keywords-file keyword.txt --api-keys-file apikey.txt
//! seo_article_forge check-keys
//! seo_article_forge links stats
//! ```
//!
//! ## Architecture
//!
//! Keywords are processed one after another. For each keyword the
//! [`assembler::Assembler`] runs:
//! 1. **Language**: detect the keyword language (English when unsure)
//! 2. **Title**: ask the model for a title (fallback title on failure)
//! 3. **Links**: pick related articles from the link store
//! 4. **Body**: ask the model for the article (the only fatal step)
//! 5. **Images**: replace `[IMAGE: ...]` markers with searched or stock images
//! 6. **Document**: front matter plus body, recorded in the link store
//!
//! The batch then writes each post and appends to the generated-articles index.

use chrono::Utc;
use clap::Parser;
use itertools::Itertools;
use rand::Rng;
use std::error::Error;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod assembler;
mod cli;
mod config;
mod error;
mod images;
mod language;
mod links;
mod models;
mod outputs;
mod prompts;
mod scrapers;
mod seo;
mod utils;

use api::{GeminiTransport, TextGenerator, validate_key};
use assembler::{Assembler, AssemblerSettings};
use cli::{Cli, Command, GenerateArgs, KeyArgs, LinksAction};
use config::AppConfig;
use images::{DiscoveryThresholds, HttpProbe, ImageDiscovery, UrlValidator};
use language::WhatlangDetector;
use links::{LinkGraphStore, LinkUpdate};
use models::ArticleSummary;
use outputs::{json, markdown};
use scrapers::{bing::BingBackend, yahoo::YahooBackend};
use utils::{ensure_writable_dir, mask_secret, read_lines};

/// Longest title the SEO report accepts without suggesting a shorter one.
const SEO_TITLE_MAX: usize = 60;
/// Upper bound of the random pause added to the batch delay.
const BATCH_JITTER_MS: u64 = 250;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let config = AppConfig::load(args.config.as_deref())?;

    match args.command {
        Command::Generate(generate) => run_generate(config, generate).await,
        Command::CheckKeys(keys) => run_check_keys(&config, &keys).await,
        Command::Links { action } => run_links(&config, action),
    }
}

/// Inline keys first, then the keys file; blanks and duplicates dropped.
fn load_keys(args: &KeyArgs) -> Result<Vec<String>, Box<dyn Error>> {
    let from_file = read_lines(&args.api_keys_file)?;
    Ok(args
        .api_keys
        .iter()
        .map(|k| k.trim().to_string())
        .chain(from_file)
        .filter(|k| !k.is_empty())
        .unique()
        .collect())
}

fn load_keywords(args: &GenerateArgs) -> Result<Vec<String>, Box<dyn Error>> {
    if !args.keywords.is_empty() {
        return Ok(args
            .keywords
            .iter()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect());
    }
    Ok(read_lines(&args.keywords_file)?)
}

#[instrument(level = "info", skip_all, fields(output_dir = %args.output_dir.display()))]
async fn run_generate(mut config: AppConfig, args: GenerateArgs) -> Result<(), Box<dyn Error>> {
    let start_time = std::time::Instant::now();
    if let Some(domain) = &args.domain {
        config.domain = domain.clone();
    }

    let keywords = load_keywords(&args)?;
    if keywords.is_empty() {
        error!(path = %args.keywords_file.display(), "No keywords to generate");
        return Err("no keywords given".into());
    }
    let keys = load_keys(&args.keys)?;
    if keys.is_empty() {
        error!(path = %args.keys.api_keys_file.display(), "No API keys found");
        return Err("no API keys available".into());
    }
    info!(keywords = keywords.len(), keys = keys.len(), models = config.models.len(), "Starting batch");

    if let Err(e) = ensure_writable_dir(&args.output_dir.to_string_lossy()).await {
        error!(error = %e, "Output directory is not writable (fix perms or choose a different path)");
        return Err(e);
    }

    // ---- Components ----
    let transport = GeminiTransport::new(&config.api_base_url, config.generation.request_timeout())?;
    let generator = TextGenerator::new(transport, keys, config.models.clone())
        .with_rate_limit_delay(config.generation.rate_limit_delay());

    let search_timeout = config.images.search_timeout();
    let validator = UrlValidator::new(
        HttpProbe::new(config.images.probe_timeout())?,
        config.images.min_image_bytes,
    );
    let discovery = ImageDiscovery::new(
        BingBackend::new(search_timeout)?,
        YahooBackend::new(search_timeout)?,
        validator,
    )
    .with_thresholds(DiscoveryThresholds::from(&config.images));

    let store = LinkGraphStore::load(&config.links_file);
    info!(records = store.len(), path = %store.path().display(), "Loaded link store");

    let mut assembler = Assembler::new(
        generator,
        discovery,
        WhatlangDetector,
        store,
        AssemblerSettings::from(&config),
    );

    // ---- Batch ----
    let mut summaries: Vec<ArticleSummary> = Vec::new();
    let mut failures: Vec<(String, String)> = Vec::new();

    for (i, keyword) in keywords.iter().enumerate() {
        if i > 0 {
            let jitter = rand::rng().random_range(0..=BATCH_JITTER_MS);
            let pause = config.batch_delay() + Duration::from_millis(jitter);
            debug!(?pause, "Pausing between keywords");
            tokio::time::sleep(pause).await;
        }
        info!(index = i + 1, total = keywords.len(), %keyword, "Generating article");

        let article = match assembler.generate(keyword, args.category.as_deref()).await {
            Ok(article) => article,
            Err(failure) => {
                failures.push((keyword.clone(), failure.to_string()));
                continue;
            }
        };

        let created = Utc::now();
        let slug = article.permalink.trim_start_matches('/');
        let path = match markdown::write_post(
            &args.output_dir,
            created.date_naive(),
            slug,
            &article.markdown_document,
        )
        .await
        {
            Ok(path) => path,
            Err(e) => {
                error!(%keyword, error = %e, "Failed to write post");
                failures.push((keyword.clone(), format!("could not write post: {e}")));
                continue;
            }
        };

        for rec in seo::recommendations(&article.title, &article.article_body, keyword) {
            info!(%keyword, recommendation = %rec, "SEO");
        }
        if article.title.chars().count() > SEO_TITLE_MAX {
            info!(
                %keyword,
                suggested = %seo::optimize_title(&article.title, SEO_TITLE_MAX),
                "SEO: shorter title"
            );
        }

        summaries.push(ArticleSummary {
            subject: article.subject.clone(),
            title: article.title.clone(),
            file: path.display().to_string(),
            permalink: article.permalink.clone(),
            category: article.category.clone().unwrap_or_default(),
            created_at: markdown::format_date(created),
        });
    }

    if !summaries.is_empty() {
        if let Err(e) = json::append_to_index(&config.articles_index, &summaries).await {
            error!(path = %config.articles_index.display(), error = %e, "Failed to update articles index");
        }
    }

    for (keyword, reason) in &failures {
        warn!(%keyword, %reason, "Keyword failed");
    }
    let rotation = assembler.generator().rotation();
    info!(
        total = keywords.len(),
        successful = summaries.len(),
        failed = failures.len(),
        links = assembler.store().len(),
        key_index = rotation.key_index(),
        model_index = rotation.model_index(),
        elapsed_secs = start_time.elapsed().as_secs(),
        "Batch finished"
    );
    Ok(())
}

#[instrument(level = "info", skip_all)]
async fn run_check_keys(config: &AppConfig, args: &KeyArgs) -> Result<(), Box<dyn Error>> {
    let keys = load_keys(args)?;
    if keys.is_empty() {
        error!(path = %args.api_keys_file.display(), "No API keys found");
        return Err("no API keys available".into());
    }
    let model = config.models.first().ok_or("no models configured")?;
    let transport = GeminiTransport::new(&config.api_base_url, config.generation.request_timeout())?;

    let mut valid = 0usize;
    for key in &keys {
        let ok = validate_key(&transport, key, model).await;
        if ok {
            valid += 1;
        }
        println!("{}\t{}", mask_secret(key), if ok { "valid" } else { "invalid" });
    }
    info!(total = keys.len(), valid, %model, "Key check finished");
    Ok(())
}

fn run_links(config: &AppConfig, action: LinksAction) -> Result<(), Box<dyn Error>> {
    let mut store = LinkGraphStore::load(&config.links_file);
    match action {
        LinksAction::List { category } => {
            if store.is_empty() {
                println!("link store {} is empty", store.path().display());
                return Ok(());
            }
            let records = match &category {
                Some(c) => store.by_category(c),
                None => store.all().iter().collect(),
            };
            for r in records {
                println!("{}\t{}\t{}\t({})", r.timestamp, r.permalink, r.title, r.subject);
            }
        }
        LinksAction::Stats => {
            println!("{}", serde_json::to_string_pretty(&store.statistics())?);
        }
        LinksAction::Delete { permalink } => {
            if store.delete(&permalink)? {
                println!("deleted {permalink}");
            } else {
                println!("no record with permalink {permalink}");
            }
        }
        LinksAction::Update {
            permalink,
            title,
            subject,
        } => {
            if store.update(&permalink, LinkUpdate { title, subject })? {
                println!("updated {permalink}");
            } else {
                println!("no record with permalink {permalink}");
            }
        }
    }
    Ok(())
}
