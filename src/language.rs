//! Language detection for keywords.
//!
//! The detector only reports; deciding what to do when it cannot answer is
//! the assembler's job (it falls back to English).

use crate::error::LanguageError;
use tracing::debug;

pub trait LanguageDetector {
    /// Human-readable English name of the language of `text`, e.g. "Spanish".
    fn detect(&self, text: &str) -> Result<String, LanguageError>;
}

/// [`LanguageDetector`] backed by `whatlang` trigram models.
///
/// Only reliable guesses are reported; anything else is [`LanguageError::Undetermined`].
#[derive(Debug, Clone, Copy, Default)]
pub struct WhatlangDetector;

impl LanguageDetector for WhatlangDetector {
    fn detect(&self, text: &str) -> Result<String, LanguageError> {
        if text.trim().is_empty() {
            return Err(LanguageError::EmptyInput);
        }
        // Short keywords almost always come back as a low-confidence guess.
        match whatlang::detect(text) {
            Some(info) if info.is_reliable() => Ok(info.lang().eng_name().to_string()),
            Some(info) => {
                debug!(guess = %info.lang().eng_name(), confidence = info.confidence(), "Unreliable language guess");
                Err(LanguageError::Undetermined)
            }
            None => Err(LanguageError::Undetermined),
        }
    }
}

/// ISO 639-1 code for a language name, defaulting to `en`.
pub fn language_code(language_name: &str) -> &'static str {
    match language_name.trim().to_lowercase().as_str() {
        "english" => "en",
        "spanish" => "es",
        "french" => "fr",
        "german" => "de",
        "italian" => "it",
        "portuguese" => "pt",
        "russian" => "ru",
        "chinese" | "mandarin" => "zh",
        "japanese" => "ja",
        "korean" => "ko",
        "arabic" => "ar",
        "hindi" => "hi",
        "indonesian" => "id",
        "dutch" => "nl",
        "turkish" => "tr",
        _ => "en",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_longer_text() {
        let lang = WhatlangDetector
            .detect("Ceci est un texte écrit en français pour tester la détection de la langue.")
            .unwrap();
        assert_eq!(lang, "French");
    }

    #[test]
    fn test_short_keywords_are_undetermined() {
        for keyword in ["coffee brewing", "python tutorials", "green tea"] {
            assert_eq!(
                WhatlangDetector.detect(keyword),
                Err(LanguageError::Undetermined),
                "{keyword}"
            );
        }
    }

    #[test]
    fn test_empty_input_is_error() {
        assert_eq!(WhatlangDetector.detect("   "), Err(LanguageError::EmptyInput));
    }

    #[test]
    fn test_language_code() {
        assert_eq!(language_code("Spanish"), "es");
        assert_eq!(language_code(" indonesian "), "id");
        assert_eq!(language_code("Klingon"), "en");
    }
}
