//! SEO helpers: tag extraction, featured image lookup and a content report.

use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;

pub const MAX_TAGS: usize = 5;

/// English and Indonesian filler words never used in tags.
const STOP_WORDS: &[&str] = &[
    "yang", "untuk", "dengan", "adalah", "dari", "cara", "tips", "trik", "dan", "atau", "jika",
    "maka", "namun", "tetapi", "juga", "oleh", "the", "and", "that", "this", "with", "for",
    "from", "how", "what", "when", "why", "where", "who", "will", "your", "their", "our", "its",
    "a", "an", "of", "to", "in", "on", "is", "are",
];

static MARKDOWN_IMAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"!\[[^\]]*\]\(([^)\s]+)").expect("static regex"));
static HTML_IMAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)<img[^>]*?\ssrc=["']([^"']+)["']"#).expect("static regex"));

fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.contains(&word)
}

/// Lowercase and replace punctuation with spaces.
fn normalize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() || c.is_whitespace() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Contiguous `n`-word phrases of `words` with no stop word in them.
fn phrases(words: &[String], n: usize) -> Vec<Vec<String>> {
    words
        .windows(n)
        .filter(|w| w.iter().all(|word| !is_stop_word(word)))
        .map(|w| w.to_vec())
        .unique()
        .collect()
}

/// Up to five tags from the title and subject, longer phrases first.
///
/// Two three-word and two two-word title phrases, then single words longer
/// than three characters from the title and the subject that no chosen phrase
/// already contains as a substring. Falls back to the subject's first word.
pub fn generate_tags(title: &str, subject: &str) -> Vec<String> {
    let title_words = normalize(title);
    let subject_words = normalize(subject);

    let mut chosen: Vec<Vec<String>> = Vec::new();
    chosen.extend(phrases(&title_words, 3).into_iter().take(2));
    chosen.extend(phrases(&title_words, 2).into_iter().take(2));

    // A word is covered when it appears anywhere inside a chosen phrase,
    // including as part of a longer word ("coffee" in "coffeehouse culture").
    let covered: Vec<String> = chosen.iter().map(|words| words.join(" ")).collect();
    let singles: Vec<Vec<String>> = title_words
        .iter()
        .chain(subject_words.iter())
        .filter(|w| w.chars().count() > 3 && !is_stop_word(w))
        .filter(|w| !covered.iter().any(|phrase| phrase.contains(w.as_str())))
        .unique()
        .map(|w| vec![w.clone()])
        .collect();
    let remaining = MAX_TAGS.saturating_sub(chosen.len());
    chosen.extend(singles.into_iter().take(remaining));

    let tags: Vec<String> = chosen.iter().map(|words| words.join(" ")).take(MAX_TAGS).collect();
    if !tags.is_empty() {
        return tags;
    }
    subject
        .split_whitespace()
        .next()
        .map(|first| vec![first.to_string()])
        .unwrap_or_default()
}

/// First image URL in the body: markdown images first, then HTML `<img>`.
pub fn extract_featured_image(body: &str) -> Option<String> {
    MARKDOWN_IMAGE
        .captures(body)
        .or_else(|| HTML_IMAGE.captures(body))
        .map(|c| c[1].to_string())
}

/// Occurrences of `keyword` per hundred words, case-insensitive.
pub fn keyword_density(text: &str, keyword: &str) -> f64 {
    let total = text.split_whitespace().count();
    if total == 0 || keyword.trim().is_empty() {
        return 0.0;
    }
    let hits = text.to_lowercase().matches(&keyword.to_lowercase()).count();
    hits as f64 / total as f64 * 100.0
}

/// Shorten `title` to `max_len` characters at a word boundary, adding an ellipsis.
pub fn optimize_title(title: &str, max_len: usize) -> String {
    if title.chars().count() <= max_len {
        return title.to_string();
    }
    let chars: Vec<char> = title.chars().collect();
    let cutoff = (1..=max_len)
        .rev()
        .find(|&i| matches!(chars[i], ' ' | '-' | ':' | ',' | '.'));
    let kept: String = chars[..cutoff.unwrap_or(max_len)].iter().collect();
    format!("{}...", kept.trim_end())
}

/// Human-readable suggestions for improving an article.
pub fn recommendations(title: &str, content: &str, keyword: &str) -> Vec<String> {
    let mut out = Vec::new();
    if title.chars().count() > 60 {
        out.push("Title is too long. Consider shortening it to under 60 characters.".to_string());
    }
    if !title.to_lowercase().contains(&keyword.to_lowercase()) {
        out.push(format!("Add the keyword '{keyword}' to the title."));
    }
    let words = content.split_whitespace().count();
    if words < 1000 {
        out.push(format!(
            "Content is too short ({words} words). Aim for at least 1000 words."
        ));
    }
    let density = keyword_density(content, keyword);
    if density < 0.5 {
        out.push(format!("Keyword density is too low ({density:.1}%). Aim for 1-2%."));
    } else if density > 3.0 {
        out.push(format!(
            "Keyword density is too high ({density:.1}%). Aim for 1-2% to avoid keyword stuffing."
        ));
    }
    if !content.contains("##") {
        out.push("Add H2 headings to structure your content.".to_string());
    }
    if !content.contains("![") && !content.to_lowercase().contains("<img") {
        out.push("Add images to make your content more engaging.".to_string());
    }
    out
}
