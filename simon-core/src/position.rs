use crate::error::ConfigError;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the four board locations.
///
/// Serialised as its index, which is also the id the participant data uses.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Position {
    TopLeft = 0,
    TopRight = 1,
    BottomLeft = 2,
    BottomRight = 3,
}

impl Position {
    pub const ALL: [Position; 4] = [
        Position::TopLeft,
        Position::TopRight,
        Position::BottomLeft,
        Position::BottomRight,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

impl TryFrom<u8> for Position {
    type Error = ConfigError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Position::ALL
            .get(value as usize)
            .copied()
            .ok_or(ConfigError::InvalidPosition(value))
    }
}

impl From<Position> for u8 {
    fn from(position: Position) -> Self {
        position as u8
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", *self as u8)
    }
}

/// Ordered target pattern. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct Sequence(Vec<Position>);

impl Sequence {
    pub fn new(positions: Vec<Position>) -> Result<Self, ConfigError> {
        if positions.is_empty() {
            return Err(ConfigError::EmptySequence);
        }
        Ok(Self(positions))
    }

    /// Builds a sequence from raw board ids, reporting the first bad one.
    pub fn from_indices(indices: &[u8]) -> Result<Self, ConfigError> {
        let positions = indices
            .iter()
            .enumerate()
            .map(|(index, &value)| {
                Position::try_from(value)
                    .map_err(|_| ConfigError::PositionOutOfRange { index, value })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(positions)
    }

    /// Uniformly random sequence of `len` positions.
    pub fn random<R: Rng>(len: usize, rng: &mut R) -> Result<Self, ConfigError> {
        let positions = (0..len)
            .map(|_| Position::ALL[rng.random_range(0..Position::ALL.len())])
            .collect();
        Self::new(positions)
    }

    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, index: usize) -> Option<Position> {
        self.0.get(index).copied()
    }

    pub fn first(&self) -> Position {
        self.0[0]
    }

    pub fn iter(&self) -> impl Iterator<Item = Position> + '_ {
        self.0.iter().copied()
    }

    pub fn as_slice(&self) -> &[Position] {
        &self.0
    }
}

impl TryFrom<Vec<u8>> for Sequence {
    type Error = ConfigError;

    fn try_from(indices: Vec<u8>) -> Result<Self, Self::Error> {
        Self::from_indices(&indices)
    }
}

impl From<Sequence> for Vec<u8> {
    fn from(sequence: Sequence) -> Self {
        sequence.0.into_iter().map(u8::from).collect()
    }
}
