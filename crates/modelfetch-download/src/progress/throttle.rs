//! Progress throttling.
//!
//! Rate-limits progress updates so fast links do not flood subscribers.

use std::time::{Duration, Instant};

/// Rate-limiter for progress updates.
///
/// An update is due when either the minimum interval has elapsed since the
/// last emitted update, or at least `byte_threshold` bytes have arrived
/// since then. The first check always emits.
pub struct ProgressThrottle {
    last_emit: Option<Instant>,
    last_bytes: u64,
    min_interval: Duration,
    byte_threshold: u64,
}

impl ProgressThrottle {
    /// Create a new throttle. A `byte_threshold` of zero disables the byte trigger.
    pub const fn new(min_interval: Duration, byte_threshold: u64) -> Self {
        Self {
            last_emit: None,
            last_bytes: 0,
            min_interval,
            byte_threshold,
        }
    }

    /// Check whether an update for `bytes` transferred should be emitted.
    pub fn should_emit(&mut self, bytes: u64) -> bool {
        let now = Instant::now();
        let due = match self.last_emit {
            None => true,
            Some(last) => {
                now.duration_since(last) >= self.min_interval
                    || (self.byte_threshold > 0
                        && bytes.saturating_sub(self.last_bytes) >= self.byte_threshold)
            }
        };
        if due {
            self.last_emit = Some(now);
            self.last_bytes = bytes;
        }
        due
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_throttle_first_emit() {
        let mut throttle = ProgressThrottle::new(Duration::from_secs(60), 0);
        assert!(throttle.should_emit(0));
    }

    #[test]
    fn test_throttle_respects_interval() {
        let mut throttle = ProgressThrottle::new(Duration::from_millis(50), 0);
        assert!(throttle.should_emit(10));
        assert!(!throttle.should_emit(20));

        std::thread::sleep(Duration::from_millis(60));
        assert!(throttle.should_emit(30));
    }

    #[test]
    fn test_throttle_byte_threshold() {
        let mut throttle = ProgressThrottle::new(Duration::from_secs(60), 100);
        assert!(throttle.should_emit(0));
        assert!(!throttle.should_emit(99));
        assert!(throttle.should_emit(100));
        assert!(!throttle.should_emit(150));
        assert!(throttle.should_emit(250));
    }

    #[test]
    fn test_throttle_zero_threshold_is_time_only() {
        let mut throttle = ProgressThrottle::new(Duration::from_secs(60), 0);
        assert!(throttle.should_emit(0));
        assert!(!throttle.should_emit(u64::MAX));
    }
}
