use serde::{Deserialize, Serialize};
use simon_core::ConfigError;
use std::time::Duration;

/// When a participant's reproduction ends the trial
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationPolicy {
    /// Stop at full length, or at the first press that deviates from the target.
    #[default]
    StopOnMismatch,
    /// Stop only once as many presses as targets were given.
    FullLength,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Nominal time between the starts of consecutive stimuli.
    pub interval_ms: u64,
    /// How long each stimulus stays lit (and its tone sounds).
    pub blink_ms: u64,
    pub policy: TerminationPolicy,
}

impl EngineConfig {
    /// Rejects a blink that does not end before the next stimulus starts.
    pub fn new(
        interval_ms: u64,
        blink_ms: u64,
        policy: TerminationPolicy,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            interval_ms,
            blink_ms,
            policy,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.blink_ms >= self.interval_ms {
            return Err(ConfigError::BlinkNotShorterThanInterval {
                blink_ms: self.blink_ms,
                interval_ms: self.interval_ms,
            });
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn blink(&self) -> Duration {
        Duration::from_millis(self.blink_ms)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            interval_ms: 270,
            blink_ms: 220,
            policy: TerminationPolicy::StopOnMismatch,
        }
    }
}
