//! Poll scheduling
//!
//! The interval comes entirely from the server; no local minimum is applied.

use std::time::{Duration, Instant};

/// Whether a poll is due at `now` given the last poll and the interval
///
/// Due once strictly more than `poll_interval_secs` seconds have elapsed on
/// the monotonic clock; always due if no poll has happened yet.
pub fn is_due(now: Instant, last_poll: Option<Instant>, poll_interval_secs: u32) -> bool {
    match last_poll {
        None => true,
        Some(last) => {
            let interval = Duration::from_millis(u64::from(poll_interval_secs) * 1000);
            now.saturating_duration_since(last) > interval
        }
    }
}

/// Tracks when the next reconciliation poll should run
#[derive(Debug, Clone, Default)]
pub struct PollScheduler {
    last_poll: Option<Instant>,
    forced: bool,
}

impl PollScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_poll(&self) -> Option<Instant> {
        self.last_poll
    }

    /// Check whether a poll should run now
    pub fn is_due(&self, now: Instant, poll_interval_secs: u32) -> bool {
        self.forced || is_due(now, self.last_poll, poll_interval_secs)
    }

    /// Record that a poll ran at `at`, clearing any forced poll
    pub fn record_poll(&mut self, at: Instant) {
        self.last_poll = Some(at);
        self.forced = false;
    }

    /// Make the next check due regardless of the interval
    pub fn force_immediate(&mut self) {
        self.forced = true;
    }
}
