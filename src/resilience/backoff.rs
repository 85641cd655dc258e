//! Exponential backoff with optional jitter.

use std::time::Duration;

use rand::Rng;

use crate::config::CoordinatorConfig;

/// Backoff schedule for token refresh attempts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Backoff {
    pub base_ms: u64,
    pub max_ms: u64,
    /// Fraction of the delay added as random jitter (0.0 = exact).
    pub jitter_ratio: f64,
}

impl Backoff {
    pub fn from_config(config: &CoordinatorConfig) -> Self {
        Self {
            base_ms: config.base_delay_ms,
            max_ms: config.max_delay_ms,
            jitter_ratio: config.jitter_ratio,
        }
    }

    /// Delay before the refresh attempt that follows `previous_attempts`
    /// attempts. The first attempt never waits.
    pub fn delay_for(&self, previous_attempts: u32) -> Duration {
        calculate_backoff(previous_attempts, self.base_ms, self.max_ms, self.jitter_ratio)
    }
}

/// Calculate exponential backoff delay with jitter.
///
/// `attempt` 0 gives no delay, 1 gives `base_ms`, 2 gives `2 * base_ms`,
/// and so on, capped at `max_ms` before jitter is applied.
pub fn calculate_backoff(attempt: u32, base_ms: u64, max_ms: u64, jitter_ratio: f64) -> Duration {
    if attempt == 0 {
        return Duration::from_millis(0);
    }

    let exponential_base = 2u64.saturating_pow(attempt - 1);
    let delay_ms = base_ms.saturating_mul(exponential_base);
    let capped_delay = delay_ms.min(max_ms);

    let jitter_range = (capped_delay as f64 * jitter_ratio.clamp(0.0, 1.0)) as u64;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis(capped_delay + jitter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_calculation() {
        assert_eq!(calculate_backoff(0, 100, 2000, 0.0), Duration::ZERO);
        assert_eq!(calculate_backoff(1, 100, 2000, 0.0), Duration::from_millis(100));
        assert_eq!(calculate_backoff(2, 100, 2000, 0.0), Duration::from_millis(200));
        assert_eq!(calculate_backoff(3, 100, 2000, 0.0), Duration::from_millis(400));
        assert_eq!(calculate_backoff(10, 100, 1000, 0.0), Duration::from_millis(1000));
        assert_eq!(calculate_backoff(u32::MAX, 100, 1000, 0.0), Duration::from_millis(1000));
    }

    #[test]
    fn test_jitter_stays_in_range() {
        for _ in 0..50 {
            let delay = calculate_backoff(2, 100, 2000, 0.1);
            assert!(delay >= Duration::from_millis(200));
            assert!(delay < Duration::from_millis(220));
        }
    }

    #[test]
    fn test_schedule_from_config() {
        let backoff = Backoff::from_config(&CoordinatorConfig {
            base_delay_ms: 50,
            max_delay_ms: 150,
            ..CoordinatorConfig::default()
        });
        let delays: Vec<_> = (0..4).map(|n| backoff.delay_for(n).as_millis()).collect();
        assert_eq!(delays, vec![0, 50, 100, 150]);
    }
}
