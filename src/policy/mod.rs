//! Redaction policies
//!
//! A policy maps each PII category to a redaction action and carries the
//! failure-mode setting for recognizer errors. Exactly one resolved policy
//! is handed to the engine per request, as an immutable value; the engine
//! never mutates or caches it across requests.

pub mod store;

pub use store::PolicyStore;

use crate::error::{Error, Result};
use crate::types::EntityType;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Redaction action applied to a detected span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Replace the span with the mask token (`***`)
    Mask,
    /// Replace the span with a typed tag (`<EMAIL>`, `<PERSON>`, ...)
    Placeholder,
    /// Replace the span with a short one-way fingerprint (`[a1b2c3d4]`)
    Hash,
    /// Remove the span entirely
    Drop,
    /// Leave the span untouched but still report the finding
    Keep,
}

/// Behavior when the recognizer fails or times out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailMode {
    /// Fail the whole request; never forward possibly-unredacted text
    #[default]
    Closed,
    /// Degrade to detector-only coverage and flag the result
    Open,
}

/// A resolved redaction policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    /// Policy identifier
    pub id: String,
    /// Schema version
    pub version: u32,
    /// Action per PII category
    pub categories: HashMap<EntityType, Action>,
    /// Recognizer failure behavior
    pub fail_mode: FailMode,
    /// Fallback action for categories missing from the mapping, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_action: Option<Action>,
}

impl Policy {
    /// Built-in default policy: mask emails and phones, drop card numbers,
    /// placeholder person names, fail closed.
    pub fn builtin_default() -> Self {
        Self {
            id: "default".to_string(),
            version: 1,
            categories: HashMap::from([
                (EntityType::Email, Action::Mask),
                (EntityType::Phone, Action::Mask),
                (EntityType::Card, Action::Drop),
                (EntityType::Person, Action::Placeholder),
            ]),
            fail_mode: FailMode::Closed,
            default_action: None,
        }
    }

    /// Policy applying one action to every category.
    pub fn uniform(id: impl Into<String>, action: Action, fail_mode: FailMode) -> Self {
        Self {
            id: id.into(),
            version: 1,
            categories: EntityType::ALL.iter().map(|&ty| (ty, action)).collect(),
            fail_mode,
            default_action: None,
        }
    }

    /// Action for an entity type, falling back to the default action.
    pub fn action_for(&self, entity_type: EntityType) -> Option<Action> {
        self.categories
            .get(&entity_type)
            .copied()
            .or(self.default_action)
    }

    /// Reject incomplete policies: every category the engine can emit must
    /// resolve to an action, either directly or through the default.
    pub fn validate(&self) -> Result<()> {
        if self.default_action.is_some() {
            return Ok(());
        }
        let missing: Vec<String> = EntityType::ALL
            .iter()
            .filter(|ty| !self.categories.contains_key(ty))
            .map(|ty| ty.to_string())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::Policy(format!(
                "policy '{}' has no action for: {}",
                self.id,
                missing.join(", ")
            )))
        }
    }
}

/// On-disk policy document shape (parsed from YAML).
///
/// Category keys and action names are matched case-insensitively; unknown
/// actions degrade to `mask`, unknown categories are skipped with a warning.
#[derive(Debug, Deserialize)]
pub(crate) struct PolicyFile {
    #[serde(default = "default_version")]
    version: u32,
    #[serde(default)]
    categories: HashMap<String, String>,
    #[serde(default)]
    fail_mode: FailMode,
    #[serde(default)]
    default_action: Option<Action>,
}

fn default_version() -> u32 {
    1
}

impl PolicyFile {
    pub(crate) fn into_policy(self, id: &str) -> Policy {
        let mut categories = HashMap::new();
        for (key, action) in self.categories {
            let Some(ty) = EntityType::parse(&key) else {
                tracing::warn!(policy = id, category = %key, "unknown PII category in policy, skipping");
                continue;
            };
            let action = match action.to_ascii_lowercase().as_str() {
                "mask" => Action::Mask,
                "placeholder" => Action::Placeholder,
                "hash" => Action::Hash,
                "drop" => Action::Drop,
                "keep" => Action::Keep,
                other => {
                    tracing::warn!(policy = id, action = %other, "unknown action in policy, using mask");
                    Action::Mask
                }
            };
            categories.insert(ty, action);
        }

        Policy {
            id: id.to_string(),
            version: self.version,
            categories,
            fail_mode: self.fail_mode,
            default_action: self.default_action,
        }
    }
}
