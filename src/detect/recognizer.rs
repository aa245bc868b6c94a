//! Pluggable entity recognizer for unstructured PII
//!
//! The recognizer is a black-box classifier behind the [`EntityRecognizer`]
//! trait: given a text unit and a language it returns PERSON candidates with
//! confidence scores. The engine never assumes a recognizer is deterministic
//! across versions, nor that its spans are disjoint; the merger cleans up.
//!
//! [`LexiconRecognizer`] is the built-in backend: a per-language given-name
//! lexicon seeded from common English and Russian first names, extended over
//! adjacent titlecase words to capture surnames. Heavier model-backed
//! recognizers plug in through the same trait.

use crate::error::{Error, Result};
use crate::types::{EntityType, Finding, Language, NER_DEFAULT_SCORE};
use async_trait::async_trait;
use regex::Regex;
use std::collections::HashSet;

/// Pluggable recognizer interface for unstructured PII.
#[async_trait]
pub trait EntityRecognizer: Send + Sync {
    /// Recognize PERSON entities in the text.
    ///
    /// Implementations may return zero, one, or many spans, possibly
    /// overlapping among themselves.
    async fn recognize(&self, text: &str, language: Language) -> Result<Vec<Finding>>;

    /// Whether this recognizer supports the given language.
    fn supports(&self, language: Language) -> bool;

    /// Human-readable backend name (used in logs).
    fn name(&self) -> &str;
}

/// Common English given names.
const EN_GIVEN_NAMES: &[&str] = &[
    "Alice", "Andrew", "Anna", "Anthony", "Barbara", "Bob", "Charles", "Daniel", "David", "Emily",
    "Emma", "Elizabeth", "George", "Helen", "Jack", "James", "Jane", "Jennifer", "Jessica", "John",
    "Joseph", "Karen", "Kevin", "Laura", "Linda", "Margaret", "Maria", "Mark", "Mary", "Matthew",
    "Michael", "Nancy", "Olivia", "Patricia", "Paul", "Peter", "Richard", "Robert", "Sarah",
    "Steven", "Susan", "Thomas", "William",
];

/// Common Russian given names.
const RU_GIVEN_NAMES: &[&str] = &[
    "Александр",
    "Алексей",
    "Анастасия",
    "Андрей",
    "Анна",
    "Дмитрий",
    "Екатерина",
    "Елена",
    "Иван",
    "Ирина",
    "Мария",
    "Михаил",
    "Наталья",
    "Николай",
    "Ольга",
    "Павел",
    "Пётр",
    "Сергей",
    "Татьяна",
    "Юлия",
];

/// Lexicon-based PERSON recognizer.
///
/// A titlecase word found in the language's given-name lexicon opens a span;
/// immediately following titlecase words (single space apart) extend it, so
/// "John Doe" is one span. All-caps tokens and mid-word capitals never match,
/// which keeps the recognizer inert on already-redacted text like `<PERSON>`
/// or `[REDACTED]`.
pub struct LexiconRecognizer {
    word: Regex,
    en_names: HashSet<&'static str>,
    ru_names: HashSet<&'static str>,
}

impl LexiconRecognizer {
    /// Build the recognizer with the built-in lexicons.
    pub fn new() -> Result<Self> {
        let word = Regex::new(r"\b\p{Lu}\p{Ll}+\b")
            .map_err(|e| Error::Config(format!("invalid word pattern: {}", e)))?;
        Ok(Self {
            word,
            en_names: EN_GIVEN_NAMES.iter().copied().collect(),
            ru_names: RU_GIVEN_NAMES.iter().copied().collect(),
        })
    }

    fn lexicon(&self, language: Language) -> &HashSet<&'static str> {
        match language {
            Language::En => &self.en_names,
            Language::Ru => &self.ru_names,
        }
    }

    fn recognize_sync(&self, text: &str, language: Language) -> Vec<Finding> {
        let lexicon = self.lexicon(language);
        let words: Vec<(usize, usize, &str)> = self
            .word
            .find_iter(text)
            .map(|m| (m.start(), m.end(), m.as_str()))
            .collect();

        let mut findings = Vec::new();
        let mut i = 0;
        while i < words.len() {
            let (start, mut end, w) = words[i];
            if !lexicon.contains(w) {
                i += 1;
                continue;
            }

            // Extend over adjacent titlecase words (surname continuation)
            let mut j = i + 1;
            while j < words.len() {
                let (next_start, next_end, _) = words[j];
                if &text[end..next_start] != " " {
                    break;
                }
                end = next_end;
                j += 1;
            }

            findings.push(Finding::new(
                EntityType::Person,
                start,
                end,
                NER_DEFAULT_SCORE,
            ));
            i = j;
        }

        findings
    }
}

#[async_trait]
impl EntityRecognizer for LexiconRecognizer {
    async fn recognize(&self, text: &str, language: Language) -> Result<Vec<Finding>> {
        Ok(self.recognize_sync(text, language))
    }

    fn supports(&self, _language: Language) -> bool {
        true
    }

    fn name(&self) -> &str {
        "lexicon"
    }
}
