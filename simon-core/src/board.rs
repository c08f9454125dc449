use crate::position::Position;
use std::time::Duration;

/// Anything that can show a position as lit or unlit.
pub trait StimulusDisplay {
    fn set_highlight(&mut self, position: Position, highlighted: bool);
}

/// Plays the tone belonging to a position, starting now.
pub trait ToneEmitter {
    fn emit(&mut self, position: Position, duration: Duration);
}

/// Per-position highlight flags, the display state a renderer draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Highlights([bool; 4]);

impl Highlights {
    pub fn is_highlighted(&self, position: Position) -> bool {
        self.0[position.index()]
    }

    pub fn any(&self) -> bool {
        self.0.iter().any(|&lit| lit)
    }

    pub fn lit(&self) -> impl Iterator<Item = Position> + '_ {
        Position::ALL
            .into_iter()
            .filter(|&p| self.is_highlighted(p))
    }
}

impl StimulusDisplay for Highlights {
    fn set_highlight(&mut self, position: Position, highlighted: bool) {
        self.0[position.index()] = highlighted;
    }
}
