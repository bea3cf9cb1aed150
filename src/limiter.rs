//! Production rate limiting.

use tokio::time::{Duration, Instant, sleep_until};

/// Enforces a minimum interval between accepted production ticks.
///
/// The limiter only delays; it never rejects a tick. The inter-tick interval
/// is a lower bound: slow encoding or sending downstream lengthens the cycle
/// but never shortens the next wait. Timestamps come from the monotonic clock
/// so wall-clock adjustments cannot distort the schedule.
#[derive(Debug)]
pub struct RateLimiter {
    interval: Option<Duration>,
    last_tick: Option<Instant>,
}

impl RateLimiter {
    /// Create a limiter for the given rate. `target_hz == 0` disables
    /// limiting entirely.
    pub fn new(target_hz: u32) -> Self {
        let interval =
            (target_hz > 0).then(|| Duration::from_secs_f64(1.0 / f64::from(target_hz)));
        Self { interval, last_tick: None }
    }

    /// Suspend until at least `1/target_hz` has elapsed since the last
    /// accepted tick, then accept this one.
    ///
    /// The first tick is accepted immediately. Callers must invoke this once
    /// per produced frame and never for polls that yielded nothing, so idle
    /// polling does not advance the schedule.
    pub async fn throttle(&mut self) {
        let Some(interval) = self.interval else {
            return;
        };

        if let Some(last) = self.last_tick {
            sleep_until(last + interval).await;
        }
        self.last_tick = Some(Instant::now());
    }
}
