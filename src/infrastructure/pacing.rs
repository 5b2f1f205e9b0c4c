//! Request pacing
//!
//! Every request is followed by a short delay; every `cooldown_every`-th
//! request gets the longer cooldown instead. There is no adaptive back-off.

use std::time::Duration;
use tokio::time::sleep;

use crate::domain::events::{PipelineEvent, RunObserver};
use crate::infrastructure::config::PacingConfig;

#[derive(Debug, Clone)]
pub struct PacingController {
    request_delay: Duration,
    cooldown_delay: Duration,
    cooldown_every: u64,
}

impl PacingController {
    pub fn new(request_delay: Duration, cooldown_delay: Duration, cooldown_every: u64) -> Self {
        Self {
            request_delay,
            cooldown_delay,
            cooldown_every: cooldown_every.max(1),
        }
    }

    pub fn from_config(config: &PacingConfig) -> Self {
        Self::new(
            Duration::from_millis(config.request_delay_ms),
            Duration::from_millis(config.cooldown_delay_ms),
            config.cooldown_every,
        )
    }

    /// No delays at all
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO, 1)
    }

    pub const fn is_cooldown(&self, request_index: u64) -> bool {
        request_index > 0 && request_index % self.cooldown_every == 0
    }

    /// Delay owed after request number `request_index` (1-based)
    pub const fn delay_for(&self, request_index: u64) -> Duration {
        if self.is_cooldown(request_index) {
            self.cooldown_delay
        } else {
            self.request_delay
        }
    }

    /// Sleep for the delay owed after request number `request_index`.
    ///
    /// A zero-length cooldown is not reported.
    pub async fn wait(&self, request_index: u64, observer: &dyn RunObserver) {
        let delay = self.delay_for(request_index);
        if delay.is_zero() {
            return;
        }
        if self.is_cooldown(request_index) {
            observer.on_event(&PipelineEvent::Cooldown {
                after_requests: request_index,
                delay_ms: u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            });
        }
        sleep(delay).await;
    }
}

impl Default for PacingController {
    fn default() -> Self {
        Self::from_config(&PacingConfig::default())
    }
}
