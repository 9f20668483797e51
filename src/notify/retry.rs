use crate::config::NotifySettings;
use std::time::Duration;

/// Statuses worth another attempt: provider throttling and gateway errors.
pub const RETRY_STATUSES: [u16; 6] = [101, 429, 500, 502, 503, 504];

/// Bounded exponential backoff for notification delivery.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Retry {
    /// Attempts after the first one.
    pub retries: u32,
    /// Delay before the first retry; doubles each time.
    pub backoff: Duration,
}

impl Retry {
    pub fn delay(&self, retry: u32) -> Duration {
        self.backoff.saturating_mul(1u32 << retry.min(16))
    }

    pub fn retryable(status: u16) -> bool {
        RETRY_STATUSES.contains(&status)
    }
}

impl Default for Retry {
    fn default() -> Self {
        Self {
            retries: 3,
            backoff: Duration::from_secs(1),
        }
    }
}

impl From<&NotifySettings> for Retry {
    fn from(settings: &NotifySettings) -> Self {
        Self {
            retries: settings.retries,
            backoff: Duration::try_from_secs_f64(settings.backoff_secs).unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_from_one_second() {
        let retry = Retry::default();
        let delays = (0..retry.retries).map(|r| retry.delay(r)).collect::<Vec<_>>();
        assert_eq!(
            delays,
            vec![
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(4)
            ]
        );
    }

    #[test]
    fn only_transient_statuses_retry() {
        assert!(Retry::retryable(429));
        assert!(Retry::retryable(503));
        assert!(!Retry::retryable(400));
        assert!(!Retry::retryable(404));
    }
}
