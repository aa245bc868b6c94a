//! Redaction engine: policy actions over one text unit
//!
//! Output is assembled from non-overlapping segments (unredacted gaps plus
//! replacement tokens) in a single linear pass over the ascending, disjoint
//! findings. Replacement tokens change the length of the output, so offsets
//! are only ever resolved against the *original* text and the segments are
//! concatenated once; the input is never mutated in place.

use crate::config::TokensConfig;
use crate::error::{Error, Result};
use crate::policy::{Action, Policy};
use crate::types::Finding;
use sha2::{Digest, Sha256};

/// Short one-way fingerprint of a substring for the `hash` action.
///
/// Stable within a process run for the same input, so downstream
/// deduplication and analytics keep working; not reversible.
pub fn fingerprint(s: &str) -> String {
    let digest = Sha256::digest(s.as_bytes());
    let hex = format!("{:x}", digest);
    format!("[{}]", &hex[..8])
}

/// Apply per-category policy actions to the findings of one text unit.
///
/// `findings` must be ascending and pairwise disjoint (the merger's output).
/// Every finding is reported back, including `keep` findings, which leave
/// the output untouched so callers can still see what would have been
/// redacted.
pub fn apply_policy(
    text: &str,
    findings: &[Finding],
    policy: &Policy,
    tokens: &TokensConfig,
) -> Result<(String, Vec<Finding>)> {
    let mut output = String::with_capacity(text.len());
    let mut applied = Vec::with_capacity(findings.len());
    let mut last_end = 0;

    for finding in findings {
        debug_assert!(finding.span.start >= last_end, "findings must be disjoint");

        let action = policy.action_for(finding.entity_type).ok_or_else(|| {
            Error::Policy(format!(
                "policy '{}' has no action for {}",
                policy.id, finding.entity_type
            ))
        })?;

        output.push_str(&text[last_end..finding.span.start]);
        let original = &text[finding.span.start..finding.span.end];
        match action {
            Action::Mask => output.push_str(&tokens.mask_token),
            Action::Placeholder => output.push_str(finding.entity_type.placeholder()),
            Action::Hash => output.push_str(&fingerprint(original)),
            Action::Drop => {}
            Action::Keep => output.push_str(original),
        }

        applied.push(finding.clone());
        last_end = finding.span.end;
    }

    output.push_str(&text[last_end..]);
    Ok((output, applied))
}

/// Replace every finding with one fixed token (the `/mask` and `/redact`
/// style modes). Same segment-assembly pass as [`apply_policy`].
pub fn apply_uniform(text: &str, findings: &[Finding], token: &str) -> String {
    let mut output = String::with_capacity(text.len());
    let mut last_end = 0;

    for finding in findings {
        debug_assert!(finding.span.start >= last_end, "findings must be disjoint");
        output.push_str(&text[last_end..finding.span.start]);
        output.push_str(token);
        last_end = finding.span.end;
    }

    output.push_str(&text[last_end..]);
    output
}
