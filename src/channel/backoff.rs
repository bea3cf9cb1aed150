//! Reconnect pacing shared by the ingest and command channels.
//!
//! Both channel kinds run the same lifecycle (connect, fail, wait, retry) and
//! differ only in how the wait between attempts grows. That difference lives
//! in [`ReconnectPolicy`]; the mutable pacing state a channel owns lives in
//! [`Backoff`].

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How a channel paces its reconnect attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconnectPolicy {
    /// Delay doubles after each consecutive failure, bounded by `cap`,
    /// and resets to `initial` on a successful connect.
    Exponential { initial: Duration, cap: Duration },

    /// Constant delay between attempts.
    Fixed { delay: Duration },
}

impl ReconnectPolicy {
    /// Default policy for ingest stream channels: 1s doubling up to 10s.
    pub fn default_ingest() -> Self {
        ReconnectPolicy::Exponential {
            initial: Duration::from_secs(1),
            cap: Duration::from_secs(10),
        }
    }

    /// Default policy for the robot command channel: a flat 2s.
    pub fn default_robot() -> Self {
        ReconnectPolicy::Fixed { delay: Duration::from_secs(2) }
    }
}

/// Mutable reconnect pacing state owned by a single channel.
///
/// Never shared between channels: each channel's failure streak is its own.
#[derive(Debug, Clone)]
pub struct Backoff {
    policy: ReconnectPolicy,
    current: Duration,
}

impl Backoff {
    /// Create pacing state at the policy's initial delay.
    pub fn new(policy: ReconnectPolicy) -> Self {
        let current = match policy {
            ReconnectPolicy::Exponential { initial, .. } => initial,
            ReconnectPolicy::Fixed { delay } => delay,
        };
        Self { policy, current }
    }

    /// Delay to wait for the failure just observed.
    ///
    /// Advances the exponential schedule as a side effect, so the Nth
    /// consecutive call yields `min(initial * 2^(N-1), cap)`. Fixed policies
    /// always yield the same delay.
    pub fn next_delay(&mut self) -> Duration {
        match self.policy {
            ReconnectPolicy::Fixed { delay } => delay,
            ReconnectPolicy::Exponential { cap, .. } => {
                let delay = self.current;
                self.current = (delay * 2).min(cap);
                delay
            }
        }
    }

    /// Reset the schedule after a successful connect.
    pub fn reset(&mut self) {
        *self = Backoff::new(self.policy);
    }

    /// Delay the next failure would incur.
    pub fn current(&self) -> Duration {
        self.current
    }
}
