//! Reconnect policy and backoff calculation.
//!
//! The actual async reconnect loop lives in `beacon-monitor` (which has
//! access to tokio); this module contains the portable, sync-only building
//! blocks:
//!
//! - [`ReconnectPolicy`]: backoff parameters (base, cap, attempt budget)
//! - [`backoff_delay`]: deterministic exponential backoff
//!
//! Delays are deliberately jitter-free: reconnect schedules must be exactly
//! reproducible (base 2000 ms doubling to a 10 s cap gives 2 s, 4 s, 8 s for
//! the default three attempts).

use serde::{Deserialize, Serialize};

use crate::constants::{
    RECONNECT_BASE_DELAY_MS, RECONNECT_MAX_ATTEMPTS, RECONNECT_MAX_DELAY_MS,
};

// ─────────────────────────────────────────────────────────────────────────────
// Policy
// ─────────────────────────────────────────────────────────────────────────────

/// Parameters governing the reconnect loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconnectPolicy {
    /// Base delay for exponential backoff in ms (default: 2000).
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Maximum delay between attempts in ms (default: 10000).
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    /// Attempts before transitioning to a terminal connection error
    /// (default: 3).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

fn default_base_delay_ms() -> u64 {
    RECONNECT_BASE_DELAY_MS
}
fn default_max_delay_ms() -> u64 {
    RECONNECT_MAX_DELAY_MS
}
fn default_max_attempts() -> u32 {
    RECONNECT_MAX_ATTEMPTS
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            base_delay_ms: RECONNECT_BASE_DELAY_MS,
            max_delay_ms: RECONNECT_MAX_DELAY_MS,
            max_attempts: RECONNECT_MAX_ATTEMPTS,
        }
    }
}

impl ReconnectPolicy {
    /// Delay before the given zero-based attempt.
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> u64 {
        backoff_delay(attempt, self.base_delay_ms, self.max_delay_ms)
    }

    /// Whether the attempt budget is exhausted.
    #[must_use]
    pub fn exhausted(&self, attempts_made: u32) -> bool {
        attempts_made >= self.max_attempts
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Backoff calculation
// ─────────────────────────────────────────────────────────────────────────────

/// Calculate a deterministic exponential backoff delay.
///
/// Formula: `min(max_delay, base_delay * 2^attempt)`
///
/// # Arguments
///
/// * `attempt` — zero-based attempt index (0 for the first retry)
/// * `base_delay_ms` — base delay in milliseconds
/// * `max_delay_ms` — maximum delay cap
#[must_use]
pub fn backoff_delay(attempt: u32, base_delay_ms: u64, max_delay_ms: u64) -> u64 {
    let exponential = base_delay_ms.saturating_mul(1u64 << attempt.min(31));
    exponential.min(max_delay_ms)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    // -- ReconnectPolicy --

    #[test]
    fn policy_defaults() {
        let policy = ReconnectPolicy::default();
        assert_eq!(policy.base_delay_ms, 2000);
        assert_eq!(policy.max_delay_ms, 10_000);
        assert_eq!(policy.max_attempts, 3);
    }

    #[test]
    fn policy_serde_roundtrip() {
        let policy = ReconnectPolicy {
            base_delay_ms: 500,
            max_delay_ms: 4000,
            max_attempts: 5,
        };
        let json = serde_json::to_string(&policy).unwrap();
        let back: ReconnectPolicy = serde_json::from_str(&json).unwrap();
        assert_eq!(policy, back);
    }

    #[test]
    fn policy_serde_defaults() {
        let policy: ReconnectPolicy = serde_json::from_str("{}").unwrap();
        assert_eq!(policy, ReconnectPolicy::default());
    }

    #[test]
    fn policy_exhausted_at_budget() {
        let policy = ReconnectPolicy::default();
        assert!(!policy.exhausted(0));
        assert!(!policy.exhausted(2));
        assert!(policy.exhausted(3));
        assert!(policy.exhausted(4));
    }

    // -- backoff_delay --

    #[test]
    fn backoff_default_schedule() {
        // The schedule the streaming-HTTP path relies on: 2 s, 4 s, 8 s.
        assert_eq!(backoff_delay(0, 2000, 10_000), 2000);
        assert_eq!(backoff_delay(1, 2000, 10_000), 4000);
        assert_eq!(backoff_delay(2, 2000, 10_000), 8000);
    }

    #[test]
    fn backoff_caps_at_max() {
        assert_eq!(backoff_delay(3, 2000, 10_000), 10_000);
        assert_eq!(backoff_delay(10, 2000, 10_000), 10_000);
    }

    #[test]
    fn backoff_high_attempt_no_overflow() {
        let delay = backoff_delay(100, 2000, 10_000);
        assert_eq!(delay, 10_000);
    }

    #[test]
    fn policy_delay_for_attempt_uses_own_fields() {
        let policy = ReconnectPolicy {
            base_delay_ms: 100,
            max_delay_ms: 350,
            max_attempts: 3,
        };
        assert_eq!(policy.delay_for_attempt(0), 100);
        assert_eq!(policy.delay_for_attempt(1), 200);
        assert_eq!(policy.delay_for_attempt(2), 350);
    }

    proptest! {
        #[test]
        fn backoff_never_exceeds_cap(attempt in 0u32..64, base in 1u64..100_000, cap in 1u64..1_000_000) {
            prop_assert!(backoff_delay(attempt, base, cap) <= cap);
        }

        #[test]
        fn backoff_monotonic_until_cap(attempt in 0u32..30, base in 1u64..10_000) {
            let cap = u64::MAX;
            prop_assert!(backoff_delay(attempt + 1, base, cap) >= backoff_delay(attempt, base, cap));
        }
    }
}
