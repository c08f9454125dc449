use thiserror::Error;

/// Rejected trial configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("sequence must contain at least one position")]
    EmptySequence,
    #[error("position {0} is outside 0..=3")]
    InvalidPosition(u8),
    #[error("position {value} at index {index} is outside 0..=3")]
    PositionOutOfRange { index: usize, value: u8 },
    #[error("blink of {blink_ms} ms must be shorter than the {interval_ms} ms interval")]
    BlinkNotShorterThanInterval { blink_ms: u64, interval_ms: u64 },
}
