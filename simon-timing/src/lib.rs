pub mod queue;
pub mod timer;

pub use queue::TimerQueue;
pub use timer::{HighPrecisionTimer, ManualTimer, Timer};
