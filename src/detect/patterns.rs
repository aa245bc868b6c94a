//! Regex pattern detectors for structured PII
//!
//! Each detector is a pure function over the input text: no side effects,
//! no detector consults another's output, and "no match" is an empty result,
//! not an error. Candidate spans may overlap across detectors; overlap
//! resolution happens later in the merger.

use crate::error::{Error, Result};
use crate::types::{EntityType, Finding, REGEX_SCORE};
use regex::Regex;

/// Phone digit-count bounds to cut false positives. ITU-T E.164 caps
/// international numbers at 15 digits.
const MIN_PHONE_DIGITS: usize = 10;
const MAX_PHONE_DIGITS: usize = 15;

/// Stateless regex detector for EMAIL, PHONE, and CARD.
///
/// Patterns are compiled once at construction. The PHONE pattern is
/// intentionally permissive over digit runs; the digit-count filter and the
/// merge priority (CARD before PHONE) keep it in check.
pub struct PatternDetector {
    email: Regex,
    phone: Regex,
    card: Regex,
}

impl PatternDetector {
    /// Compile the detector patterns.
    pub fn new() -> Result<Self> {
        let email = Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b")
            .map_err(|e| Error::Config(format!("invalid EMAIL pattern: {}", e)))?;

        // Optional +country, optional (area) or bare area code, then 2-4
        // digit groups separated by -, ., or space.
        let phone = Regex::new(
            r"(?x)
            (?: \+\d{1,3}[-.\s]? )?
            (?:
                \(\d{1,4}\)[-.\s]?
                |
                \d{1,4}[-.\s]
            )?
            \d{2,4}[-.\s]?\d{2,4}[-.\s]?\d{2,4}
            ",
        )
        .map_err(|e| Error::Config(format!("invalid PHONE pattern: {}", e)))?;

        // 13-19 digits with optional single separators (covers 16-digit
        // groupings as well as 15-digit Amex and 13-digit legacy Visa).
        // The regex crate has no lookaround, so digit-adjacency is rejected
        // in code below.
        let card = Regex::new(r"\d(?:[-\s]?\d){12,18}")
            .map_err(|e| Error::Config(format!("invalid CARD pattern: {}", e)))?;

        Ok(Self { email, phone, card })
    }

    /// Detect all structured PII candidates in the text.
    ///
    /// Results are concatenated detector-by-detector and are not yet
    /// deduplicated or ordered; that is the merger's job.
    pub fn detect(&self, text: &str) -> Vec<Finding> {
        let mut findings = Vec::new();

        for mat in self.email.find_iter(text) {
            findings.push(Finding::new(
                EntityType::Email,
                mat.start(),
                mat.end(),
                REGEX_SCORE,
            ));
        }

        for mat in self.phone.find_iter(text) {
            // A partial match inside a longer digit run is not a phone
            if has_adjacent_digit(text, mat.start(), mat.end()) {
                continue;
            }
            let digits = count_digits(mat.as_str());
            if !(MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&digits) {
                continue;
            }
            findings.push(Finding::new(
                EntityType::Phone,
                mat.start(),
                mat.end(),
                REGEX_SCORE,
            ));
        }

        for mat in self.card.find_iter(text) {
            if has_adjacent_digit(text, mat.start(), mat.end()) {
                continue;
            }
            if !luhn_valid(mat.as_str()) {
                continue;
            }
            findings.push(Finding::new(
                EntityType::Card,
                mat.start(),
                mat.end(),
                REGEX_SCORE,
            ));
        }

        findings
    }
}

fn count_digits(s: &str) -> usize {
    s.chars().filter(|c| c.is_ascii_digit()).count()
}

/// Equivalent of `(?<!\d)...(?!\d)`: a candidate embedded in a longer
/// digit run is neither a card number nor a phone.
fn has_adjacent_digit(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    matches!(before, Some(c) if c.is_ascii_digit())
        || matches!(after, Some(c) if c.is_ascii_digit())
}

/// Luhn checksum over the digits of `s`, ignoring separators.
///
/// Doubles every second digit from the rightmost, sums the digits of
/// products greater than 9, and requires the total to be divisible by 10.
pub fn luhn_valid(s: &str) -> bool {
    let digits: Vec<u32> = s.chars().filter_map(|c| c.to_digit(10)).collect();
    if digits.len() < 13 || digits.len() > 19 {
        return false;
    }

    let sum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| {
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 {
                    doubled - 9
                } else {
                    doubled
                }
            } else {
                d
            }
        })
        .sum();

    sum % 10 == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> PatternDetector {
        PatternDetector::new().unwrap()
    }

    fn spans_of(findings: &[Finding], ty: EntityType) -> Vec<(usize, usize)> {
        findings
            .iter()
            .filter(|f| f.entity_type == ty)
            .map(|f| (f.span.start, f.span.end))
            .collect()
    }

    #[test]
    fn test_luhn_accepts_valid_cards() {
        assert!(luhn_valid("4111111111111111"));
        assert!(luhn_valid("4111-1111-1111-1111"));
        assert!(luhn_valid("5500 0000 0000 0004"));
        assert!(luhn_valid("378282246310005")); // Amex
    }

    #[test]
    fn test_luhn_rejects_invalid_checksum() {
        assert!(!luhn_valid("4111111111111112"));
        assert!(!luhn_valid("1234567812345678"));
    }

    #[test]
    fn test_luhn_rejects_bad_lengths() {
        assert!(!luhn_valid("411111111111")); // 12 digits
        assert!(!luhn_valid("41111111111111111111")); // 20 digits
    }

    #[test]
    fn test_detect_email() {
        let findings = detector().detect("Contact me at john@example.com please");
        let spans = spans_of(&findings, EntityType::Email);
        assert_eq!(spans, vec![(14, 30)]);
        assert_eq!(findings[0].score, 1.0);
    }

    #[test]
    fn test_detect_card_valid_luhn() {
        let findings = detector().detect("Card: 4111-1111-1111-1111");
        let cards = spans_of(&findings, EntityType::Card);
        assert_eq!(cards, vec![(6, 25)]);
    }

    #[test]
    fn test_card_failing_luhn_not_emitted() {
        let findings = detector().detect("Number 4111111111111112 here");
        assert!(spans_of(&findings, EntityType::Card).is_empty());
        // Not reported as a phone either: the run is 16 digits, and any
        // partial phone match inside it has an adjacent digit
        assert!(spans_of(&findings, EntityType::Phone).is_empty());
    }

    #[test]
    fn test_card_inside_longer_digit_run_ignored() {
        // 20-digit run: the 19-digit prefix candidate is followed by a
        // digit, so it is not a card number
        let findings = detector().detect("id 41111111111111110000");
        assert!(spans_of(&findings, EntityType::Card).is_empty());
    }

    #[test]
    fn test_detect_phone_international() {
        let findings = detector().detect("Call +1-555-123-4567 today");
        let phones = spans_of(&findings, EntityType::Phone);
        assert_eq!(phones, vec![(5, 20)]);
    }

    #[test]
    fn test_detect_phone_parenthesized_area_code() {
        let findings = detector().detect("Office: (555) 123-4567");
        let phones = spans_of(&findings, EntityType::Phone);
        assert_eq!(phones.len(), 1);
        assert_eq!(phones[0], (8, 22));
    }

    #[test]
    fn test_short_digit_runs_are_not_phones() {
        let findings = detector().detect("Room 101, floor 3, year 2024");
        assert!(spans_of(&findings, EntityType::Phone).is_empty());
    }

    #[test]
    fn test_phone_boundary_pins_exact_span() {
        // Permissive pattern: the trailing period is punctuation, not part
        // of the match; digits immediately after punctuation still count.
        let findings = detector().detect("Dial 555-123-4567.");
        let phones = spans_of(&findings, EntityType::Phone);
        assert_eq!(phones, vec![(5, 17)]);
    }

    #[test]
    fn test_no_match_is_empty_not_error() {
        let findings = detector().detect("nothing sensitive here");
        assert!(findings.is_empty());
    }

    #[test]
    fn test_card_also_seen_by_phone_pattern() {
        // A plain 13-digit run passes the phone filter; the merger resolves
        // the conflict in favor of CARD.
        let findings = detector().detect("4222222222222");
        assert!(!spans_of(&findings, EntityType::Card).is_empty());
    }
}
