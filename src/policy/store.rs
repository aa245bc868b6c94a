//! Policy store: named policies loaded from a directory of YAML files
//!
//! Each `<id>.yaml` file in the directory becomes a named policy; files
//! that fail to parse are skipped with a warning rather than taking the
//! whole store down. Lookup of an unknown id falls back to the built-in
//! default policy.

use super::{Policy, PolicyFile};
use crate::error::Result;
use std::collections::HashMap;
use std::path::Path;

/// In-memory store of named redaction policies.
pub struct PolicyStore {
    policies: HashMap<String, Policy>,
    default: Policy,
}

impl PolicyStore {
    /// Create a store holding only the built-in default policy.
    pub fn new() -> Self {
        Self {
            policies: HashMap::new(),
            default: Policy::builtin_default(),
        }
    }

    /// Load all `*.yaml` / `*.yml` policies from a directory.
    ///
    /// A missing directory yields an empty store; unparseable files are
    /// skipped.
    pub fn load(dir: &Path) -> Result<Self> {
        let mut store = Self::new();
        if !dir.exists() {
            return Ok(store);
        }

        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            let is_yaml = matches!(
                path.extension().and_then(|e| e.to_str()),
                Some("yaml") | Some("yml")
            );
            if !is_yaml {
                continue;
            }
            let Some(id) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            let contents = std::fs::read_to_string(&path)?;
            match serde_yaml::from_str::<PolicyFile>(&contents) {
                Ok(file) => {
                    store.policies.insert(id.to_string(), file.into_policy(id));
                }
                Err(e) => {
                    tracing::warn!(policy = id, error = %e, "skipping unparseable policy file");
                }
            }
        }

        tracing::debug!(count = store.policies.len(), "loaded policies");
        Ok(store)
    }

    /// Get a policy by id, falling back to the default policy.
    pub fn get(&self, id: &str) -> &Policy {
        self.policies.get(id).unwrap_or(&self.default)
    }

    /// The built-in default policy.
    pub fn default_policy(&self) -> &Policy {
        &self.default
    }

    /// Ids of all loaded named policies.
    pub fn list(&self) -> Vec<&str> {
        self.policies.keys().map(|s| s.as_str()).collect()
    }
}

impl Default for PolicyStore {
    fn default() -> Self {
        Self::new()
    }
}
