//! Timestamp utilities and the clock seam used by time-boxed caches

use chrono::{DateTime, Utc};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Current Unix time in milliseconds
pub fn now_epoch_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Monotonic time source
///
/// Caches ask the clock instead of calling `Instant::now()` directly so
/// expiry can be driven deterministically in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Real monotonic clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    current: Mutex<Instant>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            current: Mutex::new(Instant::now()),
        }
    }

    /// Move the clock forward
    pub fn advance(&self, by: Duration) {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        *current += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.current.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_returns_valid_timestamp() {
        let timestamp = now();
        // Should be a reasonable timestamp (after year 2000)
        assert!(timestamp.timestamp() > 946_684_800);
    }

    #[test]
    fn test_epoch_ms_matches_now() {
        let ms = now_epoch_ms();
        let secs = now().timestamp();
        assert!((ms / 1000 - secs).abs() <= 1);
    }

    #[test]
    fn test_manual_clock_only_moves_when_advanced() {
        let clock = ManualClock::new();
        let start = clock.now();
        assert_eq!(clock.now(), start);

        clock.advance(Duration::from_secs(300));
        assert_eq!(clock.now() - start, Duration::from_secs(300));
    }

    #[tokio::test]
    async fn test_system_clock_advances() {
        let clock = SystemClock;
        let t1 = clock.now();
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert!(clock.now() > t1);
    }
}
