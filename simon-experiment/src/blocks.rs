use rand::Rng;
use serde::{Deserialize, Serialize};
use simon_core::{ConfigError, PresentationMode, Sequence, TrialConfig};

/// Trial lists for the practice and main parts of a session.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Blocks {
    #[serde(default)]
    pub practice: Vec<TrialConfig>,
    #[serde(default)]
    pub main: Vec<TrialConfig>,
}

impl Blocks {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// The standard set: four practice and four main sequences, alternating modes.
    pub fn standard() -> Self {
        use PresentationMode::{AudioVisual, Visual};
        let trial = |mode, ids: &[u8]| TrialConfig {
            sequence: Sequence::from_indices(ids).expect("built-in sequence"),
            mode,
        };
        Self {
            practice: vec![
                trial(AudioVisual, &[0, 1, 0, 1]),
                trial(Visual, &[0, 1, 1, 0]),
                trial(AudioVisual, &[0, 1, 2, 0, 1, 2]),
                trial(Visual, &[0, 3, 2, 1, 3, 2, 1, 0]),
            ],
            main: vec![
                trial(AudioVisual, &[3, 1, 1, 2, 3, 0, 3, 1]),
                trial(Visual, &[1, 1, 2, 0, 0, 3, 0, 0]),
                trial(AudioVisual, &[1, 1, 0, 0, 1, 1, 3, 3]),
                trial(Visual, &[2, 0, 0, 2, 2, 1, 1, 0]),
            ],
        }
    }

    /// Random sequences of `length`, `trials` per block, modes alternating
    /// starting with audio-visual.
    pub fn random<R: Rng>(length: usize, trials: usize, rng: &mut R) -> Result<Self, ConfigError> {
        let block = |rng: &mut R| -> Result<Vec<TrialConfig>, ConfigError> {
            (0..trials)
                .map(|i| {
                    let mode = if i % 2 == 0 {
                        PresentationMode::AudioVisual
                    } else {
                        PresentationMode::Visual
                    };
                    Ok(TrialConfig::new(Sequence::random(length, &mut *rng)?, mode))
                })
                .collect()
        };
        Ok(Self {
            practice: block(rng)?,
            main: block(rng)?,
        })
    }

    pub fn total(&self) -> usize {
        self.practice.len() + self.main.len()
    }
}
