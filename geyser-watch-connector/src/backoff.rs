use crate::config::{ReconnectConfig, RetryBudget};
use rand::Rng;
use std::time::Duration;

/// The shortest delay ever produced. A reconnect never happens back-to-back.
pub const MIN_DELAY: Duration = Duration::from_millis(1);

/// The highest usable ceiling. The retry counter must be able to exceed it.
pub const MAX_RETRY_CEILING: u32 = u32::MAX - 1;

/// Retry ceiling and delay curve used by the controller.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconnectPolicy {
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
    pub jitter: f64,
    pub budget: RetryBudget,
}

impl From<&ReconnectConfig> for ReconnectPolicy {
    fn from(config: &ReconnectConfig) -> Self {
        Self {
            max_retries: config.max_retries.min(MAX_RETRY_CEILING),
            initial_delay: Duration::from_millis(config.initial_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
            multiplier: config.multiplier,
            jitter: config.jitter,
            budget: config.budget,
        }
    }
}

impl ReconnectPolicy {
    /// Whether `retries` failures cross the ceiling.
    pub fn is_exhausted(&self, retries: u32) -> bool {
        retries > self.max_retries.min(MAX_RETRY_CEILING)
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::from(&ReconnectConfig::default())
    }
}

/// State of the current run of consecutive failures: the delay to wait next and
/// the error that caused the latest failure.
///
/// Replaced with a fresh value every time a subscription is established, which
/// brings the delay back to `initial_delay`.
#[derive(Debug)]
pub struct ConnectionAttempt {
    policy: ReconnectPolicy,
    next_delay: Duration,
    last_error: Option<String>,
}

impl ConnectionAttempt {
    pub fn new(policy: &ReconnectPolicy) -> Self {
        Self {
            policy: policy.clone(),
            next_delay: policy.initial_delay.min(policy.max_delay),
            last_error: None,
        }
    }

    pub fn record_failure(&mut self, error: impl ToString) {
        self.last_error = Some(error.to_string());
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Returns the delay to wait before the next connection and grows the one
    /// after it.
    pub fn next_delay(&mut self) -> Duration {
        let base = self.next_delay;
        let factor = self.policy.multiplier.max(1.0);
        let grown = Duration::try_from_secs_f64(base.as_secs_f64() * factor)
            .unwrap_or(self.policy.max_delay);
        self.next_delay = grown.min(self.policy.max_delay);
        apply_jitter(base, self.policy.jitter).max(MIN_DELAY)
    }
}

fn apply_jitter(delay: Duration, jitter: f64) -> Duration {
    // NaN and non-positive values disable jitter.
    let jitter = if jitter > 0.0 { jitter.min(1.0) } else { return delay };
    let factor = rand::thread_rng().gen_range(1.0 - jitter..=1.0 + jitter);
    Duration::try_from_secs_f64(delay.as_secs_f64() * factor).unwrap_or(delay)
}
