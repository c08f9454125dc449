pub mod board;
pub mod error;
pub mod phase;
pub mod position;
pub mod trial;

pub use board::{Highlights, StimulusDisplay, ToneEmitter};
pub use error::ConfigError;
pub use phase::{Phase, StandardPhase};
pub use position::{Position, Sequence};
pub use trial::{PresentationMode, ResponseEvent, TrialConfig, TrialResult, TrialState};
