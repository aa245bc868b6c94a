//! Admission control: dual-scope token-bucket rate limiting
//!
//! Every request is checked against two scopes, both of which must accept:
//! a per-identity bucket (created lazily, evicted after inactivity) and one
//! process-wide global bucket. The controller is an explicitly owned,
//! dependency-injected component, constructed once at process start and
//! handed to request handlers, so tests can build isolated instances.
//!
//! Identity strings must come from a trusted, server-assigned source;
//! resolving them (and never trusting spoofable forwarding headers) is the
//! boundary layer's job. The controller only requires a pre-validated
//! identity string.
//!
//! State is process-local and in-memory by design: it resets on restart,
//! which is acceptable because it only bounds short-term burst behavior.

use crate::config::RateLimitConfig;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// A single token bucket.
///
/// Refill happens lazily on each consume attempt: elapsed time since the
/// last refill is converted to tokens, capped at capacity.
#[derive(Debug)]
pub struct TokenBucket {
    tokens: f64,
    capacity: u32,
    refill_rate: f64,
    last_refill: Instant,
}

impl TokenBucket {
    /// Create a full bucket.
    pub fn new(capacity: u32, refill_rate: f64) -> Self {
        Self {
            tokens: capacity as f64,
            capacity,
            refill_rate,
            last_refill: Instant::now(),
        }
    }

    /// Try to consume one token at the given instant.
    ///
    /// Returns `Err(retry_after)` with an estimate of how long until a
    /// token becomes available.
    pub fn consume_at(&mut self, now: Instant) -> Result<(), Duration> {
        let elapsed = now.saturating_duration_since(self.last_refill);
        self.tokens =
            (self.tokens + elapsed.as_secs_f64() * self.refill_rate).min(self.capacity as f64);
        self.last_refill = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            Ok(())
        } else if self.refill_rate > 0.0 {
            let needed = 1.0 - self.tokens;
            Err(Duration::from_secs_f64(needed / self.refill_rate))
        } else {
            // A bucket that never refills reports an unbounded wait
            Err(Duration::MAX)
        }
    }

    /// Whole tokens currently available.
    pub fn remaining(&self) -> u32 {
        self.tokens as u32
    }

    fn idle_since(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_refill)
    }
}

/// Which scope rejected a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitScope {
    /// The caller's own bucket
    Identity,
    /// The process-wide bucket
    Global,
}

/// Outcome of an admission check. Rejection is an ordinary outcome, not an
/// error, and carries enough state for the boundary layer to set a retry
/// hint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AdmissionDecision {
    /// Both scopes accepted; `remaining` is the identity bucket's balance
    Allowed {
        /// Whole tokens left in the identity bucket
        remaining: u32,
    },
    /// One scope rejected
    Limited {
        /// The scope that ran out of tokens
        scope: LimitScope,
        /// Estimated wait until the scope would accept again
        retry_after: Duration,
    },
}

impl AdmissionDecision {
    /// Whether the request was admitted.
    pub fn is_allowed(&self) -> bool {
        matches!(self, AdmissionDecision::Allowed { .. })
    }

    /// Retry hint for rejected requests.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            AdmissionDecision::Allowed { .. } => None,
            AdmissionDecision::Limited { retry_after, .. } => Some(*retry_after),
        }
    }

    /// Convert a rejection into the crate error, for callers that want to
    /// bail out of a request pipeline with `?`.
    pub fn require(&self) -> crate::Result<()> {
        match self {
            AdmissionDecision::Allowed { .. } => Ok(()),
            AdmissionDecision::Limited { retry_after, .. } => Err(crate::Error::RateLimited {
                retry_after: *retry_after,
            }),
        }
    }
}

struct IdentityTable {
    buckets: HashMap<String, TokenBucket>,
    last_cleanup: Instant,
}

/// Dual-scope admission controller.
///
/// The identity table and the global bucket sit behind separate locks so
/// the global check, taken by every request, never contends with table
/// bookkeeping.
pub struct AdmissionController {
    config: RateLimitConfig,
    identities: Mutex<IdentityTable>,
    global: Mutex<TokenBucket>,
}

impl AdmissionController {
    /// Create a controller with the given limits.
    pub fn new(config: RateLimitConfig) -> Self {
        let global = TokenBucket::new(config.global_capacity, config.global_refill_rate);
        Self {
            config,
            identities: Mutex::new(IdentityTable {
                buckets: HashMap::new(),
                last_cleanup: Instant::now(),
            }),
            global: Mutex::new(global),
        }
    }

    /// Check admission for a pre-validated caller identity.
    pub fn check(&self, identity: &str) -> AdmissionDecision {
        self.check_at(identity, Instant::now())
    }

    /// Check admission at a given instant (injectable for tests).
    pub fn check_at(&self, identity: &str, now: Instant) -> AdmissionDecision {
        // Global scope first: it bounds the whole process
        {
            let mut global = self.global.lock().expect("global bucket lock poisoned");
            if let Err(retry_after) = global.consume_at(now) {
                tracing::warn!(retry_after_secs = retry_after.as_secs_f64(), "global rate limit exceeded");
                return AdmissionDecision::Limited {
                    scope: LimitScope::Global,
                    retry_after,
                };
            }
        }

        let mut table = self.identities.lock().expect("identity table lock poisoned");
        let bucket = table.buckets.entry(identity.to_string()).or_insert_with(|| {
            TokenBucket::new(
                self.config.per_identity_capacity,
                self.config.per_identity_refill_rate,
            )
        });

        let decision = match bucket.consume_at(now) {
            Ok(()) => AdmissionDecision::Allowed {
                remaining: bucket.remaining(),
            },
            Err(retry_after) => {
                tracing::warn!(
                    retry_after_secs = retry_after.as_secs_f64(),
                    "identity rate limit exceeded"
                );
                AdmissionDecision::Limited {
                    scope: LimitScope::Identity,
                    retry_after,
                }
            }
        };

        self.cleanup_locked(&mut table, now);
        decision
    }

    /// Number of identity buckets currently tracked.
    pub fn tracked_identities(&self) -> usize {
        self.identities
            .lock()
            .expect("identity table lock poisoned")
            .buckets
            .len()
    }

    /// Evict buckets idle beyond the retention window, at most once per
    /// cleanup interval, to bound memory under many distinct identities.
    fn cleanup_locked(&self, table: &mut IdentityTable, now: Instant) {
        if now.saturating_duration_since(table.last_cleanup) < self.config.cleanup_interval {
            return;
        }
        let ttl = self.config.bucket_ttl;
        let before = table.buckets.len();
        table.buckets.retain(|_, bucket| bucket.idle_since(now) <= ttl);
        table.last_cleanup = now;

        let evicted = before - table.buckets.len();
        if evicted > 0 {
            tracing::info!(evicted, "cleaned up inactive rate limit buckets");
        }
    }
}
