//! Article Assembler: turns one subject into a finished markdown document.
//!
//! Each request walks a fixed sequence of [`Stage`]s:
//!
//! ```text
//! DetectingLanguage -> GeneratingTitle -> ComputingRelatedLinks -> GeneratingBody
//!   -> ResolvingImages -> ComposingDocument -> Recording -> Done
//! ```
//!
//! Any stage may end in `Failed`, but only two actually do: an empty credential
//! pool (caught while generating the title) and a body that could not be
//! generated. Everything else degrades: an undetectable language becomes
//! English, a failed title becomes "Article About {subject}", unresolved images
//! become stock images and a Link Graph write failure is only logged.
//!
//! Requests are driven one at a time through `&mut self`; the rotation cursors
//! and the link store are never shared between concurrent requests.

use crate::api::{GenerationParams, GenerativeTransport, TextGenerator};
use crate::config::{AppConfig, GenerationSettings};
use crate::images::{ImageFinder, replace_image_placeholders};
use crate::images::placeholders::placeholder_descriptions;
use crate::language::{LanguageDetector, language_code};
use crate::links::LinkGraphStore;
use crate::models::GeneratedArticle;
use crate::outputs::markdown::{FrontMatter, format_date, render_front_matter};
use crate::prompts::{BodyPrompt, body_prompt, title_prompt};
use crate::seo::{extract_featured_image, generate_tags};
use crate::utils::{permalink_for, truncate_for_log};
use chrono::{DateTime, Utc};
use std::fmt;
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

pub const FALLBACK_LANGUAGE: &str = "English";
pub const CONTENT_BREAK: &str = "<!--more-->";
const MAX_RELATED: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    DetectingLanguage,
    GeneratingTitle,
    ComputingRelatedLinks,
    GeneratingBody,
    ResolvingImages,
    ComposingDocument,
    Recording,
    Done,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::DetectingLanguage => "detecting language",
            Stage::GeneratingTitle => "generating title",
            Stage::ComputingRelatedLinks => "computing related links",
            Stage::GeneratingBody => "generating body",
            Stage::ResolvingImages => "resolving images",
            Stage::ComposingDocument => "composing document",
            Stage::Recording => "recording",
            Stage::Done => "done",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Why a request produced no article. `stage` is where it stopped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("article generation failed while {stage}: {reason}")]
pub struct ArticleFailure {
    pub stage: Stage,
    pub reason: String,
}

/// Site and generation settings the assembler needs from [`AppConfig`].
#[derive(Debug, Clone)]
pub struct AssemblerSettings {
    pub domain: String,
    pub author: String,
    pub layout: String,
    pub default_category: Option<String>,
    pub title_model: Option<String>,
    pub body_model: Option<String>,
    pub generation: GenerationSettings,
    pub stock_images: Vec<String>,
}

impl From<&AppConfig> for AssemblerSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            domain: config.domain.clone(),
            author: config.author.clone(),
            layout: config.layout.clone(),
            default_category: config.default_category.clone(),
            title_model: config.title_model.clone(),
            body_model: config.body_model.clone(),
            generation: config.generation.clone(),
            stock_images: config.images.stock_images.clone(),
        }
    }
}

/// Stage bookkeeping for one request.
struct Progress<'a> {
    subject: &'a str,
    stage: Stage,
}

impl<'a> Progress<'a> {
    fn start(subject: &'a str) -> Self {
        debug!(%subject, stage = %Stage::DetectingLanguage, "Starting article");
        Self {
            subject,
            stage: Stage::DetectingLanguage,
        }
    }

    fn enter(&mut self, next: Stage) {
        debug!(subject = %self.subject, from = %self.stage, to = %next, "Stage transition");
        self.stage = next;
    }

    fn fail(&mut self, reason: impl Into<String>) -> ArticleFailure {
        let failure = ArticleFailure {
            stage: self.stage,
            reason: reason.into(),
        };
        error!(subject = %self.subject, stage = %self.stage, reason = %failure.reason, "Article failed");
        self.stage = Stage::Failed;
        failure
    }
}

/// First non-empty line of a model reply with quotes removed.
pub fn clean_title(raw: &str) -> Option<String> {
    let title = raw
        .trim()
        .lines()
        .next()
        .unwrap_or_default()
        .replace('"', "")
        .trim()
        .to_string();
    (!title.is_empty()).then_some(title)
}

pub fn fallback_title(subject: &str) -> String {
    format!("Article About {subject}")
}

/// Insert [`CONTENT_BREAK`] after the first paragraph. Single-paragraph bodies are left alone.
pub fn insert_content_break(body: &str) -> String {
    match body.split_once("\n\n") {
        Some((first, rest)) => format!("{first}\n\n{CONTENT_BREAK}\n\n{rest}"),
        None => body.to_string(),
    }
}

pub struct Assembler<T, F, D> {
    generator: TextGenerator<T>,
    finder: F,
    detector: D,
    store: LinkGraphStore,
    settings: AssemblerSettings,
}

impl<T, F, D> Assembler<T, F, D>
where
    T: GenerativeTransport,
    F: ImageFinder,
    D: LanguageDetector,
{
    pub fn new(
        generator: TextGenerator<T>,
        finder: F,
        detector: D,
        store: LinkGraphStore,
        settings: AssemblerSettings,
    ) -> Self {
        Self {
            generator,
            finder,
            detector,
            store,
            settings,
        }
    }

    pub fn store(&self) -> &LinkGraphStore {
        &self.store
    }

    pub fn generator(&self) -> &TextGenerator<T> {
        &self.generator
    }

    /// Generate one article for `subject`.
    ///
    /// `category` overrides the configured default; without either, the first
    /// word of the subject is used.
    pub async fn generate(
        &mut self,
        subject: &str,
        category: Option<&str>,
    ) -> Result<GeneratedArticle, ArticleFailure> {
        self.generate_at(subject, category, Utc::now()).await
    }

    /// [`Self::generate`] with an explicit front matter timestamp.
    #[instrument(level = "info", skip_all, fields(%subject))]
    pub async fn generate_at(
        &mut self,
        subject: &str,
        category: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<GeneratedArticle, ArticleFailure> {
        let mut progress = Progress::start(subject);
        let subject = subject.trim();
        if subject.is_empty() {
            return Err(progress.fail("subject is empty"));
        }

        let language = match self.detector.detect(subject) {
            Ok(language) => language,
            Err(e) => {
                warn!(%subject, error = %e, fallback = FALLBACK_LANGUAGE, "Language detection failed");
                FALLBACK_LANGUAGE.to_string()
            }
        };
        info!(%subject, %language, "Detected language");

        progress.enter(Stage::GeneratingTitle);
        let title_params = GenerationParams {
            temperature: self.settings.generation.temperature,
            max_output_tokens: self.settings.generation.title_max_tokens,
        };
        let title = match self
            .generator
            .generate(
                &title_prompt(subject, &language),
                self.settings.title_model.as_deref(),
                title_params,
                self.settings.generation.max_retries,
            )
            .await
        {
            Ok(raw) => clean_title(&raw).unwrap_or_else(|| {
                warn!(%subject, raw = %truncate_for_log(&raw, 200), "Model returned an empty title; using fallback");
                fallback_title(subject)
            }),
            Err(e) if e.is_configuration() => return Err(progress.fail(e.to_string())),
            Err(e) => {
                warn!(%subject, error = %e, "Title generation failed; using fallback");
                fallback_title(subject)
            }
        };
        info!(%title, "Title ready");

        progress.enter(Stage::ComputingRelatedLinks);
        let permalink = permalink_for(&title);
        let related = self.store.related(subject, Some(&permalink), MAX_RELATED);
        info!(%permalink, related = related.len(), "Related articles selected");

        progress.enter(Stage::GeneratingBody);
        let prompt = body_prompt(&BodyPrompt {
            title: &title,
            subject,
            domain: &self.settings.domain,
            permalink: &permalink,
            language: &language,
            related: &related,
        });
        let body_params = GenerationParams {
            temperature: self.settings.generation.temperature,
            max_output_tokens: self.settings.generation.body_max_tokens,
        };
        let body = match self
            .generator
            .generate(
                &prompt,
                self.settings.body_model.as_deref(),
                body_params,
                self.settings.generation.max_retries,
            )
            .await
        {
            Ok(body) if !body.trim().is_empty() => body,
            Ok(_) => return Err(progress.fail("model returned an empty article body")),
            Err(e) => return Err(progress.fail(e.to_string())),
        };
        info!(chars = body.chars().count(), "Body generated");

        progress.enter(Stage::ResolvingImages);
        let markers = placeholder_descriptions(&body);
        debug!(?markers, "Image placeholders found");
        let body =
            replace_image_placeholders(&self.finder, &body, subject, &self.settings.stock_images)
                .await;

        progress.enter(Stage::ComposingDocument);
        let article_body = insert_content_break(&body);
        let category = category
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .or_else(|| self.settings.default_category.clone())
            .or_else(|| subject.split_whitespace().next().map(str::to_string));
        let front_matter = FrontMatter {
            title: title.clone(),
            date: format_date(now),
            author: self.settings.author.clone(),
            layout: self.settings.layout.clone(),
            image: extract_featured_image(&article_body),
            lang: language_code(&language).to_string(),
            tag: generate_tags(&title, subject),
            permalink: permalink.clone(),
            categories: category.iter().cloned().collect(),
        };
        let header = match render_front_matter(&front_matter) {
            Ok(header) => header,
            Err(e) => return Err(progress.fail(format!("could not render front matter: {e}"))),
        };
        let markdown_document = format!("{header}{article_body}");

        progress.enter(Stage::Recording);
        match self.store.add(&title, subject, &permalink) {
            Ok(true) => {}
            Ok(false) => info!(%permalink, "Permalink already in link store; keeping the first record"),
            Err(e) => error!(%permalink, error = %e, "Failed to record article in link store"),
        }

        progress.enter(Stage::Done);
        info!(%title, %permalink, "Article assembled");
        Ok(GeneratedArticle {
            title,
            subject: subject.to_string(),
            permalink,
            category,
            article_body,
            markdown_document,
        })
    }
}
