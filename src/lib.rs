//! Masker - PII redaction and text anonymization engine
//!
//! Masker is a request-time privacy filter: it accepts text or JSON, finds
//! spans that look like personally identifiable information, and rewrites
//! them according to a configurable policy before the payload continues
//! downstream (typically to a third-party language model).
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       Boundary layer                          │
//! │   (HTTP routing, auth, policy resolution: out of scope)       │
//! └───────────────┬──────────────────────────────┬───────────────┘
//!                 │ identity                     │ payload + policy
//! ┌───────────────▼───────────────┐  ┌───────────▼───────────────┐
//! │     Admission Controller      │  │          Masker           │
//! │  per-identity + global token  │  │  ┌─────────────────────┐  │
//! │  buckets, lazy eviction       │  │  │  Structural Walker  │  │
//! └───────────────────────────────┘  │  │  (string leaves)    │  │
//!                                    │  └──────────┬──────────┘  │
//!                                    │  ┌──────────▼──────────┐  │
//!                                    │  │ Pattern Detectors + │  │
//!                                    │  │ Entity Recognizer   │  │
//!                                    │  └──────────┬──────────┘  │
//!                                    │  ┌──────────▼──────────┐  │
//!                                    │  │  Merger → Redactor  │  │
//!                                    │  └─────────────────────┘  │
//!                                    └───────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`detect`]: regex pattern detectors, the pluggable entity recognizer,
//!   and the span merger
//! - [`redact`]: policy-action application and the JSON structural walker
//! - [`policy`]: redaction policies and the YAML policy store
//! - [`limit`]: dual-scope token-bucket admission control
//! - [`engine`]: the request-scoped pipeline facade
//! - [`config`]: configuration management

pub mod config;
pub mod detect;
pub mod engine;
pub mod error;
pub mod limit;
pub mod policy;
pub mod redact;
pub mod types;

pub use config::MaskerConfig;
pub use engine::{Masker, Mode, Output, RedactRequest, RedactionResult};
pub use error::{Error, Result};
pub use limit::{AdmissionController, AdmissionDecision, LimitScope};
pub use policy::{Action, FailMode, Policy, PolicyStore};
pub use types::{EntityType, Finding, Language, Span};
