//! Language detection from file and folder names, and track naming.

mod table;

pub use table::Language;

use crate::config::DisplayLanguage;
use dubmerge_av::merge::{LanguageResolver, LanguageTag};
use table::LANGUAGES;
use unic_langid::LanguageIdentifier;

const WORD_SEPARATORS: [char; 4] = [' ', '.', '-', '_'];

/// Find a language by any of its codes or names (case-insensitive).
pub fn lookup(text: &str) -> Option<&'static Language> {
    let needle = text.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }
    LANGUAGES.iter().find(|l| {
        needle == l.iso1
            || needle == l.iso2t
            || needle == l.iso2b
            || needle == l.english.to_lowercase()
            || needle == l.native.to_lowercase()
    })
}

/// Find a language by canonical tag.
pub fn by_tag(tag: &LanguageTag) -> Option<&'static Language> {
    LANGUAGES.iter().find(|l| l.iso2t == tag.as_str())
}

fn tag_of(language: &Language) -> LanguageTag {
    LanguageTag::new(language.iso2t)
}

/// Detects languages in free text such as folder names and file stems.
#[derive(Debug, Clone, Copy, Default)]
pub struct LanguageDetector;

impl LanguageDetector {
    pub fn new() -> Self {
        Self
    }

    /// Detect the language named by `text`.
    ///
    /// The whole text is tried first, as a code, a name or a locale tag like
    /// `de-DE` or `pt_BR`. Then each word is tried in order. Two-letter codes
    /// only count as words when written in capitals or in lower case as the
    /// last word (`Show.de`), so `It` or `no` in a title do not read as
    /// Italian or Norwegian.
    pub fn detect(&self, text: &str) -> Option<LanguageTag> {
        let text = text.trim();
        if let Some(language) = lookup(text).or_else(|| parse_locale(text)) {
            return Some(tag_of(language));
        }

        let words: Vec<&str> = text.split(WORD_SEPARATORS).filter(|w| !w.is_empty()).collect();
        let last = words.len().saturating_sub(1);
        words
            .iter()
            .enumerate()
            .find_map(|(i, word)| {
                let language = lookup(word)?;
                let accepted = word.len() != 2
                    || word.chars().all(|c| c.is_ascii_uppercase())
                    || (i == last && word.chars().all(|c| c.is_ascii_lowercase()));
                accepted.then_some(language)
            })
            .map(tag_of)
    }
}

fn parse_locale(text: &str) -> Option<&'static Language> {
    if !text.contains(['-', '_']) {
        return None;
    }
    let id: LanguageIdentifier = text.replace('_', "-").parse().ok()?;
    lookup(id.language.as_str())
}

/// Track titles and codes for language tags.
#[derive(Debug, Clone, Copy, Default)]
pub struct LanguageNames {
    display: DisplayLanguage,
}

impl LanguageNames {
    pub fn new(display: DisplayLanguage) -> Self {
        Self { display }
    }
}

impl LanguageResolver for LanguageNames {
    fn display_name(&self, tag: &LanguageTag) -> String {
        match (by_tag(tag), self.display) {
            (Some(l), DisplayLanguage::English) => l.english.to_string(),
            (Some(l), DisplayLanguage::Native) => l.native.to_string(),
            (None, _) => tag.to_string(),
        }
    }

    fn iso_code(&self, tag: &LanguageTag) -> String {
        by_tag(tag)
            .map(|l| l.iso1.to_string())
            .unwrap_or_else(|| tag.to_string())
    }
}
