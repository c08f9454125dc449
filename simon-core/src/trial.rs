use crate::error::ConfigError;
use crate::position::{Position, Sequence};
use serde::{Deserialize, Serialize};

/// Whether a tone accompanies each highlight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresentationMode {
    #[default]
    Visual,
    AudioVisual,
}

impl PresentationMode {
    pub fn emits_tone(self) -> bool {
        matches!(self, PresentationMode::AudioVisual)
    }
}

/// Trial state machine states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrialState {
    AwaitingPlayback,
    Capturing,
    Finished,
}

/// What the host hands to a trial
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialConfig {
    pub sequence: Sequence,
    pub mode: PresentationMode,
}

impl TrialConfig {
    pub fn new(sequence: Sequence, mode: PresentationMode) -> Self {
        Self { sequence, mode }
    }

    pub fn from_indices(indices: &[u8], mode: PresentationMode) -> Result<Self, ConfigError> {
        Ok(Self::new(Sequence::from_indices(indices)?, mode))
    }
}

/// One accepted button-down
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseEvent {
    #[serde(rename = "button")]
    pub position: Position,
    /// Milliseconds since the previous accepted press, or since capture opened.
    #[serde(rename = "delta_time")]
    pub delta_time_ms: u64,
}

/// Recorded result per trial
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialResult {
    pub sequence: Sequence,
    pub mode: PresentationMode,
    pub response: Vec<ResponseEvent>,
    #[serde(rename = "rt")]
    pub reaction_time_ms: u64,
}

impl TrialResult {
    /// Number of leading responses that match the target.
    pub fn correct_prefix_len(&self) -> usize {
        self.response
            .iter()
            .zip(self.sequence.iter())
            .take_while(|(event, expected)| event.position == *expected)
            .count()
    }

    /// Full-length, error-free reproduction.
    pub fn is_correct(&self) -> bool {
        self.response.len() == self.sequence.len()
            && self.correct_prefix_len() == self.sequence.len()
    }

    pub fn latencies_ms(&self) -> impl Iterator<Item = u64> + '_ {
        self.response.iter().map(|event| event.delta_time_ms)
    }
}
