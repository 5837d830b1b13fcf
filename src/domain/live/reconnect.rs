//! How long to wait before reopening a failed socket.

use std::time::Duration;

/// Delay used when nothing else is configured.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(5_000);

/// Reconnect schedule.
///
/// `Fixed` retries forever at the same interval. `Exponential` doubles the
/// delay per consecutive failure up to `max`, optionally giving up after
/// `max_attempts` failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconnectPolicy {
    Fixed(Duration),
    Exponential {
        base: Duration,
        max: Duration,
        max_attempts: Option<u32>,
    },
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        ReconnectPolicy::Fixed(DEFAULT_RECONNECT_DELAY)
    }
}

impl ReconnectPolicy {
    /// Delay before reconnect number `attempt` (1-based count of consecutive
    /// failures). `None` means stop retrying.
    pub fn delay_for(&self, attempt: u32) -> Option<Duration> {
        match *self {
            ReconnectPolicy::Fixed(delay) => Some(delay),
            ReconnectPolicy::Exponential {
                base,
                max,
                max_attempts,
            } => {
                if max_attempts.is_some_and(|limit| attempt > limit) {
                    return None;
                }
                let shift = attempt.saturating_sub(1).min(31);
                let factor = 1u32 << shift;
                Some(base.saturating_mul(factor).min(max))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_fixed_five_seconds() {
        assert_eq!(
            ReconnectPolicy::default(),
            ReconnectPolicy::Fixed(Duration::from_secs(5))
        );
    }

    #[test]
    fn fixed_never_gives_up() {
        let policy = ReconnectPolicy::default();
        assert_eq!(policy.delay_for(1), Some(Duration::from_secs(5)));
        assert_eq!(policy.delay_for(10_000), Some(Duration::from_secs(5)));
    }

    #[test]
    fn exponential_doubles_until_cap() {
        let policy = ReconnectPolicy::Exponential {
            base: Duration::from_secs(1),
            max: Duration::from_secs(10),
            max_attempts: None,
        };
        assert_eq!(policy.delay_for(1), Some(Duration::from_secs(1)));
        assert_eq!(policy.delay_for(2), Some(Duration::from_secs(2)));
        assert_eq!(policy.delay_for(4), Some(Duration::from_secs(8)));
        assert_eq!(policy.delay_for(5), Some(Duration::from_secs(10)));
        assert_eq!(policy.delay_for(64), Some(Duration::from_secs(10)));
    }

    #[test]
    fn exponential_stops_after_max_attempts() {
        let policy = ReconnectPolicy::Exponential {
            base: Duration::from_millis(100),
            max: Duration::from_secs(1),
            max_attempts: Some(3),
        };
        assert!(policy.delay_for(3).is_some());
        assert_eq!(policy.delay_for(4), None);
    }
}
