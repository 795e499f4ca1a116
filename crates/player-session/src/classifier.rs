//! Error/Retry Classifier: maps engine faults onto the per-session state
//! machine `Attached -> (Retrying <-> Attached) | Destroyed`.

use std::time::Duration;

use crate::error::{Fault, FaultKind};

/// Bounded linear backoff for transient network faults.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retry budget per attach attempt (not counting the initial load).
    pub max_retries: u32,
    /// Base unit of the backoff; delay for attempt `n` is `base_delay * n`.
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Delay before retry `attempt` (1-indexed). Linear, uncapped within the
    /// budget; saturates instead of overflowing for absurd inputs.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.base_delay.checked_mul(attempt).unwrap_or(Duration::MAX)
    }
}

/// Why an engine instance is being destroyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestroyReason {
    Fatal,
    RetriesExhausted,
}

impl std::fmt::Display for DestroyReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fatal => write!(f, "fatal fault"),
            Self::RetriesExhausted => write!(f, "retry budget exhausted"),
        }
    }
}

/// Where a consumed fault drives the session next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// Transient network fault with budget left: restart the load after `delay`.
    Retry { attempt: u32, delay: Duration },
    /// Fatal fault, or transient fault after the budget ran out.
    Destroy { reason: DestroyReason },
    /// Non-fatal fault outside the retry taxonomy: log it and stay attached.
    Ignore,
}

/// Classify one fault against the current retry count. Faults are consumed
/// once; the caller owns the counter and advances it on `Retry`.
pub fn classify(fault: &Fault, retry_count: u32, policy: &RetryPolicy) -> Disposition {
    if fault.fatal {
        return Disposition::Destroy {
            reason: DestroyReason::Fatal,
        };
    }
    match fault.kind {
        FaultKind::Network if retry_count < policy.max_retries => {
            let attempt = retry_count + 1;
            Disposition::Retry {
                attempt,
                delay: policy.delay_for_attempt(attempt),
            }
        }
        FaultKind::Network => Disposition::Destroy {
            reason: DestroyReason::RetriesExhausted,
        },
        FaultKind::Media | FaultKind::Other => Disposition::Ignore,
    }
}

/// Observable per-session lifecycle, published by the fault supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Attached,
    Retrying,
    Destroyed,
}
