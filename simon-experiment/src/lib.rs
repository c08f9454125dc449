pub mod blocks;
pub mod capture;
pub mod config;
pub mod scheduler;
pub mod state;
pub mod trial;

pub use blocks::Blocks;
pub use capture::{CaptureSummary, Release, ResponseCapture};
pub use config::{EngineConfig, TerminationPolicy};
pub use scheduler::{Firing, SequenceScheduler};
pub use state::{Block, SessionEvent, SessionStateMachine, SessionSummary, TrialRecord};
pub use trial::{FinishFn, SimonTrial};
