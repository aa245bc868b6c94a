//! Redaction pipeline facade
//!
//! [`Masker`] wires the pattern detectors, the entity recognizer, the
//! merger, and the redaction engine into one request-scoped operation:
//! payload in, redacted payload plus findings out. It knows nothing about
//! HTTP, authentication, or transport; the boundary layer resolves the
//! caller's policy and identity before invoking it.
//!
//! ```text
//! payload ──► validate ──► [walker] ──► detectors ─┐
//!                                 │                ├─► merger ─► redactor
//!                                 └──► recognizer ─┘
//! ```
//!
//! Per-leaf work inside a JSON tree shares no mutable state, so leaves are
//! processed fork-join. The recognizer is the only potentially slow step
//! and runs under a timeout; failures are handled according to the
//! policy's fail mode and are never retried here.

use crate::config::MaskerConfig;
use crate::detect::{merge_findings, EntityRecognizer, LexiconRecognizer, PatternDetector};
use crate::error::{Error, Result};
use crate::policy::{Action, FailMode, Policy};
use crate::redact::{apply_policy, apply_uniform, collect_string_leaves, rebuild_with_leaves};
use crate::types::{EntityType, Finding, Language};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// How detected spans are rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Report findings only; the payload passes through unchanged
    Detect,
    /// Replace every finding with the mask token (`***`)
    #[default]
    Mask,
    /// Replace every finding with the redact token (`[REDACTED]`)
    Redact,
    /// Replace every finding with its typed tag (`<EMAIL>`, ...)
    Placeholder,
    /// Apply the per-category action from the resolved policy
    Policy,
}

/// One redaction request. Exactly one of `text`/`json` must be set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedactRequest {
    /// Flat text payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// JSON tree payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json: Option<Value>,

    /// Language for the entity recognizer
    #[serde(default = "default_language")]
    pub language: Language,

    /// Optional entity-type filter; `None` means all types
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entities: Option<Vec<EntityType>>,

    /// Rewrite mode
    #[serde(default)]
    pub mode: Mode,
}

fn default_language() -> Language {
    Language::En
}

impl RedactRequest {
    /// Request over flat text with the given mode.
    pub fn text(text: impl Into<String>, mode: Mode) -> Self {
        Self {
            text: Some(text.into()),
            json: None,
            language: Language::En,
            entities: None,
            mode,
        }
    }

    /// Request over a JSON tree with the given mode.
    pub fn json(value: Value, mode: Mode) -> Self {
        Self {
            text: None,
            json: Some(value),
            language: Language::En,
            entities: None,
            mode,
        }
    }

    /// Restrict detection to the given entity types.
    pub fn with_entities(mut self, entities: Vec<EntityType>) -> Self {
        self.entities = Some(entities);
        self
    }

    /// Set the recognizer language.
    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }
}

/// Redacted payload, mirroring the input shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Output {
    /// Flat text result
    Text(String),
    /// JSON tree isomorphic to the input
    Json(Value),
}

impl Output {
    /// The text result, if this was a text request.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Output::Text(s) => Some(s),
            Output::Json(_) => None,
        }
    }

    /// The JSON result, if this was a JSON request.
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Output::Text(_) => None,
            Output::Json(v) => Some(v),
        }
    }
}

/// Result of one redaction request.
#[derive(Debug, Clone, Serialize)]
pub struct RedactionResult {
    /// Redacted payload
    pub output: Output,
    /// Findings in ascending span order (per text unit), describing input
    /// spans, with JSON paths where applicable
    pub findings: Vec<Finding>,
    /// Wall-clock processing time
    pub processing_time: Duration,
    /// True when a fail-open policy skipped recognizer coverage for at
    /// least one text unit, so callers can audit degraded coverage
    pub recognizer_degraded: bool,
}

/// The detection/merge/redaction engine.
pub struct Masker {
    config: MaskerConfig,
    detector: PatternDetector,
    recognizer: Arc<dyn EntityRecognizer>,
}

impl Masker {
    /// Create an engine with a custom recognizer backend.
    pub fn new(config: MaskerConfig, recognizer: Arc<dyn EntityRecognizer>) -> Result<Self> {
        Ok(Self {
            config,
            detector: PatternDetector::new()?,
            recognizer,
        })
    }

    /// Create an engine with the built-in lexicon recognizer.
    pub fn with_defaults(config: MaskerConfig) -> Result<Self> {
        let recognizer = Arc::new(LexiconRecognizer::new()?);
        Self::new(config, recognizer)
    }

    /// Run the full pipeline for one request under the resolved policy.
    ///
    /// The policy is consumed as an immutable value for this call only;
    /// it is never cached across requests.
    pub async fn redact(&self, request: &RedactRequest, policy: &Policy) -> Result<RedactionResult> {
        let started = Instant::now();

        if request.mode == Mode::Policy {
            policy.validate()?;
        }
        if !self.recognizer.supports(request.language) {
            return Err(Error::UnsupportedLanguage(request.language.code().to_string()));
        }

        let (output, findings, degraded) = match (&request.text, &request.json) {
            (Some(_), Some(_)) => {
                return Err(Error::InvalidInput(
                    "exactly one of 'text' and 'json' must be set, got both".to_string(),
                ))
            }
            (None, None) => {
                return Err(Error::InvalidInput(
                    "exactly one of 'text' and 'json' must be set, got neither".to_string(),
                ))
            }
            (Some(text), None) => {
                if text.len() > self.config.limits.max_text_size {
                    return Err(Error::InputTooLarge(format!(
                        "text is {} bytes, limit {}",
                        text.len(),
                        self.config.limits.max_text_size
                    )));
                }
                let (redacted, findings, degraded) = self.process_unit(text, request, policy).await?;
                (Output::Text(redacted), findings, degraded)
            }
            (None, Some(tree)) => {
                let (tree, findings, degraded) = self.process_tree(tree, request, policy).await?;
                (Output::Json(tree), findings, degraded)
            }
        };

        let processing_time = started.elapsed();
        tracing::debug!(
            findings = findings.len(),
            degraded,
            elapsed_ms = processing_time.as_millis() as u64,
            "redaction complete"
        );

        Ok(RedactionResult {
            output,
            findings,
            processing_time,
            recognizer_degraded: degraded,
        })
    }

    /// Detect/merge/redact one text unit. Returns the rewritten text, the
    /// merged findings (input offsets), and whether NER coverage degraded.
    async fn process_unit(
        &self,
        text: &str,
        request: &RedactRequest,
        policy: &Policy,
    ) -> Result<(String, Vec<Finding>, bool)> {
        let mut candidates = self.detector.detect(text);
        let mut degraded = false;

        // The recognizer only ever contributes PERSON spans; skip the call
        // when the filter excludes them.
        let person_wanted = request
            .entities
            .as_ref()
            .map_or(true, |allowed| allowed.contains(&EntityType::Person));

        if person_wanted {
            match self.recognize_with_timeout(text, request.language).await {
                Ok(found) => candidates.extend(found),
                Err(err) => match policy.fail_mode {
                    FailMode::Closed => return Err(err),
                    FailMode::Open => {
                        tracing::warn!(
                            backend = self.recognizer.name(),
                            error = %err,
                            "recognizer unavailable, degrading to detector-only coverage"
                        );
                        degraded = true;
                    }
                },
            }
        }

        let merged = merge_findings(candidates, request.entities.as_deref());

        let tokens = &self.config.tokens;
        let output = match request.mode {
            Mode::Detect => text.to_string(),
            Mode::Mask => apply_uniform(text, &merged, &tokens.mask_token),
            Mode::Redact => apply_uniform(text, &merged, &tokens.redact_token),
            Mode::Placeholder => {
                let uniform = Policy::uniform("placeholder", Action::Placeholder, policy.fail_mode);
                apply_policy(text, &merged, &uniform, tokens)?.0
            }
            Mode::Policy => apply_policy(text, &merged, policy, tokens)?.0,
        };

        Ok((output, merged, degraded))
    }

    /// Walk a JSON tree, processing its string leaves fork-join.
    async fn process_tree(
        &self,
        tree: &Value,
        request: &RedactRequest,
        policy: &Policy,
    ) -> Result<(Value, Vec<Finding>, bool)> {
        let serialized_len = serde_json::to_string(tree)?.len();
        if serialized_len > self.config.limits.max_payload_size {
            return Err(Error::InputTooLarge(format!(
                "payload is {} bytes, limit {}",
                serialized_len, self.config.limits.max_payload_size
            )));
        }

        let leaves = collect_string_leaves(tree, self.config.limits.max_json_depth)?;

        let processed = futures::future::try_join_all(
            leaves
                .iter()
                .map(|leaf| self.process_unit(&leaf.text, request, policy)),
        )
        .await?;

        let mut replacements = Vec::with_capacity(processed.len());
        let mut findings = Vec::new();
        let mut degraded = false;
        for (leaf, (redacted, leaf_findings, leaf_degraded)) in leaves.iter().zip(processed) {
            replacements.push(redacted);
            degraded |= leaf_degraded;
            findings.extend(leaf_findings.into_iter().map(|f| f.at_path(&leaf.path)));
        }

        let rebuilt = rebuild_with_leaves(tree, &replacements);
        Ok((rebuilt, findings, degraded))
    }

    async fn recognize_with_timeout(&self, text: &str, language: Language) -> Result<Vec<Finding>> {
        let timeout = self.config.recognizer.timeout;
        match tokio::time::timeout(timeout, self.recognizer.recognize(text, language)).await {
            Ok(Ok(findings)) => Ok(findings),
            Ok(Err(err)) => Err(Error::RecognizerFailure(err.to_string())),
            Err(_) => Err(Error::RecognizerTimeout(timeout)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;

    fn masker() -> Masker {
        Masker::with_defaults(MaskerConfig::default()).unwrap()
    }

    fn default_policy() -> Policy {
        Policy::builtin_default()
    }

    struct FailingRecognizer;

    #[async_trait]
    impl EntityRecognizer for FailingRecognizer {
        async fn recognize(&self, _text: &str, _language: Language) -> Result<Vec<Finding>> {
            Err(Error::RecognizerFailure("model crashed".to_string()))
        }

        fn supports(&self, language: Language) -> bool {
            language == Language::En
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    struct SlowRecognizer;

    #[async_trait]
    impl EntityRecognizer for SlowRecognizer {
        async fn recognize(&self, _text: &str, _language: Language) -> Result<Vec<Finding>> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(vec![])
        }

        fn supports(&self, _language: Language) -> bool {
            true
        }

        fn name(&self) -> &str {
            "slow"
        }
    }

    #[tokio::test]
    async fn test_placeholder_scenario() {
        let request = RedactRequest::text("Contact John Doe at john@example.com", Mode::Placeholder);
        let result = masker().redact(&request, &default_policy()).await.unwrap();

        assert_eq!(
            result.output.as_text().unwrap(),
            "Contact <PERSON> at <EMAIL>"
        );
        assert_eq!(result.findings.len(), 2);

        let email = result
            .findings
            .iter()
            .find(|f| f.entity_type == EntityType::Email)
            .unwrap();
        assert_eq!((email.span.start, email.span.end), (20, 36));
        assert!(!result.recognizer_degraded);
    }

    #[tokio::test]
    async fn test_mask_json_scenario() {
        let request = RedactRequest::json(
            json!({"user": {"name": "John Doe", "email": "john@example.com"}}),
            Mode::Mask,
        );
        let result = masker().redact(&request, &default_policy()).await.unwrap();

        assert_eq!(
            result.output.as_json().unwrap(),
            &json!({"user": {"name": "***", "email": "***"}})
        );

        let paths: Vec<&str> = result
            .findings
            .iter()
            .map(|f| f.path.as_deref().unwrap())
            .collect();
        assert_eq!(paths, vec!["user.name", "user.email"]);
    }

    #[tokio::test]
    async fn test_entity_filter_leaves_person_intact() {
        let request = RedactRequest::text("John Doe's email is john@example.com", Mode::Mask)
            .with_entities(vec![EntityType::Email]);
        let result = masker().redact(&request, &default_policy()).await.unwrap();

        assert_eq!(result.output.as_text().unwrap(), "John Doe's email is ***");
        assert_eq!(result.findings.len(), 1);
        assert_eq!(result.findings[0].entity_type, EntityType::Email);
    }

    #[tokio::test]
    async fn test_policy_mode_applies_per_category_actions() {
        let request = RedactRequest::text(
            "John Doe, card 4111-1111-1111-1111, mail john@example.com",
            Mode::Policy,
        );
        let result = masker().redact(&request, &default_policy()).await.unwrap();

        // Default policy: PERSON placeholder, CARD drop, EMAIL mask
        assert_eq!(
            result.output.as_text().unwrap(),
            "<PERSON>, card , mail ***"
        );
    }

    #[tokio::test]
    async fn test_detect_mode_leaves_payload_unchanged() {
        let text = "mail john@example.com";
        let request = RedactRequest::text(text, Mode::Detect);
        let result = masker().redact(&request, &default_policy()).await.unwrap();
        assert_eq!(result.output.as_text().unwrap(), text);
        assert_eq!(result.findings.len(), 1);
    }

    #[tokio::test]
    async fn test_redaction_is_idempotent() {
        let policy = default_policy();
        for mode in [Mode::Mask, Mode::Redact, Mode::Placeholder] {
            let first = masker()
                .redact(
                    &RedactRequest::text("Call John Doe at +1-555-123-4567", mode),
                    &policy,
                )
                .await
                .unwrap();
            let first_text = first.output.as_text().unwrap().to_string();

            let second = masker()
                .redact(&RedactRequest::text(first_text.clone(), mode), &policy)
                .await
                .unwrap();
            assert_eq!(second.output.as_text().unwrap(), first_text);
            assert!(second.findings.is_empty());
        }
    }

    #[tokio::test]
    async fn test_drop_policy_is_idempotent() {
        let policy = Policy::uniform("drop-all", Action::Drop, FailMode::Closed);
        let first = masker()
            .redact(
                &RedactRequest::text("Call John Doe at +1-555-123-4567", Mode::Policy),
                &policy,
            )
            .await
            .unwrap();
        let first_text = first.output.as_text().unwrap().to_string();
        assert_eq!(first_text, "Call  at ");

        let second = masker()
            .redact(&RedactRequest::text(first_text.clone(), Mode::Policy), &policy)
            .await
            .unwrap();
        assert_eq!(second.output.as_text().unwrap(), first_text);
        assert!(second.findings.is_empty());
    }

    #[tokio::test]
    async fn test_tree_redaction_is_idempotent() {
        let tree = json!({
            "user": {"name": "John Doe", "email": "john@example.com"},
            "note": "card 4111-1111-1111-1111"
        });
        let policy = default_policy();
        let first = masker()
            .redact(&RedactRequest::json(tree, Mode::Policy), &policy)
            .await
            .unwrap();
        let first_tree = first.output.as_json().unwrap().clone();

        let second = masker()
            .redact(&RedactRequest::json(first_tree.clone(), Mode::Policy), &policy)
            .await
            .unwrap();
        assert_eq!(second.output.as_json().unwrap(), &first_tree);
        assert!(second.findings.is_empty());
    }

    #[tokio::test]
    async fn test_structure_preserved_for_non_string_leaves() {
        let tree = json!({
            "age": 30,
            "active": true,
            "score": 99.5,
            "note": null,
            "email": "john@example.com"
        });
        let request = RedactRequest::json(tree.clone(), Mode::Mask);
        let result = masker().redact(&request, &default_policy()).await.unwrap();

        let out = result.output.as_json().unwrap();
        assert_eq!(out["age"], tree["age"]);
        assert_eq!(out["active"], tree["active"]);
        assert_eq!(out["score"], tree["score"]);
        assert_eq!(out["note"], tree["note"]);
        assert_eq!(out["email"], "***");
    }

    #[tokio::test]
    async fn test_both_payloads_rejected() {
        let mut request = RedactRequest::text("hi", Mode::Mask);
        request.json = Some(json!({}));
        let err = masker()
            .redact(&request, &default_policy())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_neither_payload_rejected() {
        let request = RedactRequest {
            text: None,
            json: None,
            language: Language::En,
            entities: None,
            mode: Mode::Mask,
        };
        let err = masker()
            .redact(&request, &default_policy())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_oversized_text_rejected() {
        let mut config = MaskerConfig::default();
        config.limits.max_text_size = 16;
        let masker = Masker::with_defaults(config).unwrap();

        let err = masker
            .redact(
                &RedactRequest::text("x".repeat(17), Mode::Mask),
                &default_policy(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InputTooLarge(_)));
    }

    #[tokio::test]
    async fn test_fail_closed_propagates_recognizer_failure() {
        let masker = Masker::new(MaskerConfig::default(), Arc::new(FailingRecognizer)).unwrap();
        let mut policy = default_policy();
        policy.fail_mode = FailMode::Closed;

        let err = masker
            .redact(
                &RedactRequest::text("mail john@example.com", Mode::Policy),
                &policy,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::RecognizerFailure(_)));
    }

    #[tokio::test]
    async fn test_fail_open_degrades_to_detector_findings() {
        let masker = Masker::new(MaskerConfig::default(), Arc::new(FailingRecognizer)).unwrap();
        let mut policy = default_policy();
        policy.fail_mode = FailMode::Open;

        let result = masker
            .redact(
                &RedactRequest::text("John Doe: john@example.com", Mode::Mask),
                &policy,
            )
            .await
            .unwrap();

        // Regex findings still redacted, name passes through, result flagged
        assert_eq!(result.output.as_text().unwrap(), "John Doe: ***");
        assert!(result.recognizer_degraded);
        assert_eq!(result.findings.len(), 1);
    }

    #[tokio::test]
    async fn test_recognizer_timeout() {
        let mut config = MaskerConfig::default();
        config.recognizer.timeout = Duration::from_millis(20);
        let masker = Masker::new(config, Arc::new(SlowRecognizer)).unwrap();
        let policy = default_policy();

        let err = masker
            .redact(
                &RedactRequest::text("mail john@example.com", Mode::Policy),
                &policy,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::RecognizerTimeout(_)));
    }

    #[tokio::test]
    async fn test_filtered_person_skips_recognizer() {
        // With PERSON filtered out, a broken recognizer is never consulted
        let masker = Masker::new(MaskerConfig::default(), Arc::new(FailingRecognizer)).unwrap();
        let request = RedactRequest::text("mail john@example.com", Mode::Mask)
            .with_entities(vec![EntityType::Email]);

        let result = masker.redact(&request, &default_policy()).await.unwrap();
        assert_eq!(result.output.as_text().unwrap(), "mail ***");
        assert!(!result.recognizer_degraded);
    }

    #[tokio::test]
    async fn test_unsupported_language_surfaces() {
        let masker = Masker::new(MaskerConfig::default(), Arc::new(FailingRecognizer)).unwrap();
        let request = RedactRequest::text("hi", Mode::Mask).with_language(Language::Ru);
        let err = masker
            .redact(&request, &default_policy())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedLanguage(_)));
    }

    #[tokio::test]
    async fn test_incomplete_policy_rejected_up_front() {
        let policy = Policy {
            id: "partial".to_string(),
            version: 1,
            categories: Default::default(),
            fail_mode: FailMode::Closed,
            default_action: None,
        };
        let err = masker()
            .redact(&RedactRequest::text("hi", Mode::Policy), &policy)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Policy(_)));
    }

    #[tokio::test]
    async fn test_card_not_reported_as_phone() {
        let request = RedactRequest::text("pay 4111 1111 1111 1111 now", Mode::Detect);
        let result = masker().redact(&request, &default_policy()).await.unwrap();
        assert_eq!(result.findings.len(), 1);
        assert_eq!(result.findings[0].entity_type, EntityType::Card);
    }

    #[tokio::test]
    async fn test_processing_time_reported() {
        let request = RedactRequest::text("plain", Mode::Detect);
        let result = masker().redact(&request, &default_policy()).await.unwrap();
        assert!(result.processing_time >= Duration::ZERO);
    }
}
