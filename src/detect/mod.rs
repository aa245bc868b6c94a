//! PII detection
//!
//! Two kinds of detectors feed the pipeline:
//! - Pattern detectors: stateless regex matchers for structured PII
//!   (EMAIL, PHONE, CARD with Luhn validation)
//! - Entity recognizer: a pluggable, language-selected classifier for
//!   unstructured PII (PERSON)
//!
//! Their raw candidates are combined by the merger into one ordered,
//! non-overlapping span list per text unit.

pub mod merge;
pub mod patterns;
pub mod recognizer;

pub use merge::merge_findings;
pub use patterns::PatternDetector;
pub use recognizer::{EntityRecognizer, LexiconRecognizer};
