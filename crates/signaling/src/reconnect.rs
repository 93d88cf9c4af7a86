//! Fixed-interval reconnect policy.
//!
//! No backoff growth. The attempt ceiling defaults to none, so a paired
//! device keeps retrying for as long as the session runs.

use std::time::Duration;

pub const DEFAULT_RECONNECT_INTERVAL: Duration = Duration::from_millis(3000);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectPolicy {
    interval: Duration,
    max_attempts: Option<u32>,
    attempts: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::fixed(DEFAULT_RECONNECT_INTERVAL)
    }
}

impl ReconnectPolicy {
    pub fn fixed(interval: Duration) -> Self {
        Self {
            interval,
            max_attempts: None,
            attempts: 0,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Consecutive failed attempts since the last successful connect
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Delay before the next attempt, or `None` once the ceiling is hit
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.max_attempts.is_some_and(|max| self.attempts >= max) {
            return None;
        }
        self.attempts += 1;
        Some(self.interval)
    }

    pub fn reset(&mut self) {
        self.attempts = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_interval_forever() {
        let mut policy = ReconnectPolicy::default();
        for _ in 0..1000 {
            assert_eq!(policy.next_delay(), Some(Duration::from_secs(3)));
        }
        assert_eq!(policy.attempts(), 1000);
        policy.reset();
        assert_eq!(policy.attempts(), 0);
    }

    #[test]
    fn test_ceiling() {
        let mut policy = ReconnectPolicy::fixed(Duration::from_millis(10)).with_max_attempts(2);
        assert!(policy.next_delay().is_some());
        assert!(policy.next_delay().is_some());
        assert!(policy.next_delay().is_none());
    }
}
