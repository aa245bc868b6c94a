//! Masker configuration management

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main masker configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MaskerConfig {
    /// Request size and depth ceilings
    #[serde(default)]
    pub limits: LimitsConfig,

    /// Replacement tokens
    #[serde(default)]
    pub tokens: TokensConfig,

    /// Entity recognizer settings
    #[serde(default)]
    pub recognizer: RecognizerConfig,

    /// Admission control (rate limiting) settings
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Directory holding named policy YAML files, if any
    #[serde(default)]
    pub policies_dir: Option<PathBuf>,
}

/// Input size and depth ceilings.
///
/// The boundary layer is expected to enforce payload limits before the
/// engine is invoked; these are the engine's own defensive ceilings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Maximum size of a single text unit in bytes
    pub max_text_size: usize,

    /// Maximum serialized size of a JSON payload in bytes
    pub max_payload_size: usize,

    /// Maximum JSON nesting depth
    pub max_json_depth: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_text_size: 32 * 1024,
            max_payload_size: 64 * 1024,
            max_json_depth: 64,
        }
    }
}

/// Replacement tokens for the fixed-token redaction modes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokensConfig {
    /// Token used by the `mask` action
    pub mask_token: String,

    /// Token used by the uniform redact mode
    pub redact_token: String,
}

impl Default for TokensConfig {
    fn default() -> Self {
        Self {
            mask_token: "***".to_string(),
            redact_token: "[REDACTED]".to_string(),
        }
    }
}

/// Entity recognizer settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognizerConfig {
    /// Timeout for a single recognizer call
    #[serde(with = "duration_secs")]
    pub timeout: Duration,
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
        }
    }
}

/// Admission control settings.
///
/// Defaults: 60 requests/min per identity, 1000 requests/min globally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Per-identity bucket capacity
    pub per_identity_capacity: u32,

    /// Per-identity refill rate in tokens per second
    pub per_identity_refill_rate: f64,

    /// Global bucket capacity
    pub global_capacity: u32,

    /// Global refill rate in tokens per second
    pub global_refill_rate: f64,

    /// Idle time after which an identity bucket is evicted
    #[serde(with = "duration_secs")]
    pub bucket_ttl: Duration,

    /// Minimum interval between eviction sweeps
    #[serde(with = "duration_secs")]
    pub cleanup_interval: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            per_identity_capacity: 60,
            per_identity_refill_rate: 1.0,
            global_capacity: 1000,
            global_refill_rate: 1000.0 / 60.0,
            bucket_ttl: Duration::from_secs(600),
            cleanup_interval: Duration::from_secs(300),
        }
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(d)?;
        Ok(Duration::from_secs_f64(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits() {
        let config = MaskerConfig::default();
        assert_eq!(config.limits.max_text_size, 32 * 1024);
        assert_eq!(config.limits.max_payload_size, 64 * 1024);
        assert_eq!(config.limits.max_json_depth, 64);
    }

    #[test]
    fn test_default_rate_limits() {
        let config = RateLimitConfig::default();
        assert_eq!(config.per_identity_capacity, 60);
        assert_eq!(config.global_capacity, 1000);
        // Both scopes refill their full capacity over one minute
        assert!((config.per_identity_refill_rate * 60.0 - 60.0).abs() < 1e-9);
        assert!((config.global_refill_rate * 60.0 - 1000.0).abs() < 1e-6);
    }

    #[test]
    fn test_config_yaml_roundtrip() {
        let config = MaskerConfig::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: MaskerConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.tokens.mask_token, "***");
        assert_eq!(parsed.recognizer.timeout, Duration::from_secs(10));
    }
}
