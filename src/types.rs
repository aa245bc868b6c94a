//! Shared data model for detection and redaction
//!
//! A [`Finding`] describes one detected PII span in a single text unit.
//! Offsets are byte offsets into the original text, half-open `[start, end)`,
//! and always refer to the *input* text, never to a replacement.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Confidence score assigned to regex-based detections.
pub const REGEX_SCORE: f64 = 1.0;

/// Default confidence score for recognizer (NER) detections.
pub const NER_DEFAULT_SCORE: f64 = 0.85;

/// Category of detected PII.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityType {
    /// Email address
    Email,
    /// Phone number (international formats)
    Phone,
    /// Payment card number (Luhn-validated)
    Card,
    /// Person name (via the entity recognizer)
    Person,
}

impl EntityType {
    /// All entity types the engine can emit.
    pub const ALL: [EntityType; 4] = [
        EntityType::Email,
        EntityType::Phone,
        EntityType::Card,
        EntityType::Person,
    ];

    /// Merge priority: lower wins on overlap ties. Card outranks Phone so
    /// card numbers are never consumed as phone numbers.
    pub fn priority(&self) -> u8 {
        match self {
            EntityType::Email => 0,
            EntityType::Card => 1,
            EntityType::Phone => 2,
            EntityType::Person => 3,
        }
    }

    /// Typed placeholder tag for the `placeholder` redaction action.
    pub fn placeholder(&self) -> &'static str {
        match self {
            EntityType::Email => "<EMAIL>",
            EntityType::Phone => "<PHONE>",
            EntityType::Card => "<CARD>",
            EntityType::Person => "<PERSON>",
        }
    }

    /// Parse from the wire/config spelling ("EMAIL", "phone", ...).
    pub fn parse(s: &str) -> Option<EntityType> {
        match s.to_ascii_uppercase().as_str() {
            "EMAIL" => Some(EntityType::Email),
            "PHONE" => Some(EntityType::Phone),
            "CARD" => Some(EntityType::Card),
            "PERSON" => Some(EntityType::Person),
            _ => None,
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EntityType::Email => "EMAIL",
            EntityType::Phone => "PHONE",
            EntityType::Card => "CARD",
            EntityType::Person => "PERSON",
        };
        f.write_str(s)
    }
}

/// Language for the entity recognizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// English
    En,
    /// Russian
    Ru,
}

impl Language {
    /// Parse a language code, failing with `UnsupportedLanguage` otherwise.
    pub fn parse(code: &str) -> Result<Language> {
        match code {
            "en" => Ok(Language::En),
            "ru" => Ok(Language::Ru),
            other => Err(Error::UnsupportedLanguage(other.to_string())),
        }
    }

    /// Two-letter code for this language.
    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Ru => "ru",
        }
    }
}

/// Half-open byte range `[start, end)` into a single text unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    /// Start byte offset (inclusive)
    pub start: usize,
    /// End byte offset (exclusive)
    pub end: usize,
}

impl Span {
    /// Create a new span. Callers must uphold `start < end`.
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start < end, "span must be non-empty");
        Self { start, end }
    }

    /// Length of the span in bytes.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether the span is empty (never true for well-formed spans).
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// A single detected PII span.
///
/// Immutable once produced; describes the input span, not the replacement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    /// Category of the detected entity
    pub entity_type: EntityType,
    /// Location in the original text unit
    pub span: Span,
    /// Detection confidence in `[0, 1]`
    pub score: f64,
    /// Dotted/bracketed access path from the JSON root; `None` for flat text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl Finding {
    /// Create a finding for flat text (no JSON path).
    pub fn new(entity_type: EntityType, start: usize, end: usize, score: f64) -> Self {
        Self {
            entity_type,
            span: Span::new(start, end),
            score,
            path: None,
        }
    }

    /// Return a copy annotated with a JSON access path.
    pub fn at_path(mut self, path: &str) -> Self {
        self.path = Some(path.to_string());
        self
    }
}
