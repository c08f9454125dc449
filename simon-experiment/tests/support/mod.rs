#![allow(dead_code)]

use simon_core::{
    Highlights, Position, PresentationMode, StimulusDisplay, ToneEmitter, TrialConfig,
    TrialResult, TrialState,
};
use simon_experiment::{EngineConfig, SimonTrial};
use simon_timing::{ManualTimer, Timer};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

pub const MS: u64 = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayChange {
    pub at_ns: u64,
    pub position: Position,
    pub on: bool,
}

/// Display double that keeps every change with its clock reading.
#[derive(Debug, Clone)]
pub struct RecordingDisplay {
    timer: ManualTimer,
    pub board: Highlights,
    pub changes: Vec<DisplayChange>,
}

impl RecordingDisplay {
    pub fn new(timer: ManualTimer) -> Self {
        Self {
            timer,
            board: Highlights::default(),
            changes: Vec::new(),
        }
    }

    pub fn onsets(&self) -> Vec<DisplayChange> {
        self.changes.iter().copied().filter(|c| c.on).collect()
    }
}

impl StimulusDisplay for RecordingDisplay {
    fn set_highlight(&mut self, position: Position, highlighted: bool) {
        self.changes.push(DisplayChange {
            at_ns: self.timer.now(),
            position,
            on: highlighted,
        });
        self.board.set_highlight(position, highlighted);
    }
}

/// Tone double; clones share one log.
#[derive(Debug, Clone, Default)]
pub struct RecordingTone {
    pub emitted: Rc<RefCell<Vec<(Position, Duration)>>>,
}

impl RecordingTone {
    pub fn count(&self) -> usize {
        self.emitted.borrow().len()
    }
}

impl ToneEmitter for RecordingTone {
    fn emit(&mut self, position: Position, duration: Duration) {
        self.emitted.borrow_mut().push((position, duration));
    }
}

pub fn positions(ids: &[u8]) -> Vec<Position> {
    ids.iter().map(|&id| Position::try_from(id).unwrap()).collect()
}

pub struct Harness {
    pub timer: ManualTimer,
    pub tone: RecordingTone,
    pub results: Rc<RefCell<Vec<TrialResult>>>,
    pub trial: SimonTrial<ManualTimer, RecordingDisplay, RecordingTone>,
}

impl Harness {
    pub fn new(ids: &[u8], mode: PresentationMode) -> Self {
        Self::with_engine(ids, mode, EngineConfig::default())
    }

    pub fn with_engine(ids: &[u8], mode: PresentationMode, engine: EngineConfig) -> Self {
        let timer = ManualTimer::new();
        timer.set(1_000 * MS);
        let tone = RecordingTone::default();
        let results = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&results);
        let trial = SimonTrial::new(
            TrialConfig::from_indices(ids, mode).unwrap(),
            engine,
            timer.clone(),
            RecordingDisplay::new(timer.clone()),
            tone.clone(),
            move |result| sink.borrow_mut().push(result),
        );
        Self {
            timer,
            tone,
            results,
            trial,
        }
    }

    /// Walks the clock from deadline to deadline until capture opens, arriving
    /// `lateness()` nanoseconds after each deadline.
    pub fn play_through(&mut self, mut lateness: impl FnMut() -> u64) {
        while self.trial.state() == TrialState::AwaitingPlayback {
            let Some(deadline) = self.trial.next_deadline() else {
                break;
            };
            let target = deadline + lateness();
            if target > self.timer.now() {
                self.timer.set(target);
            }
            self.trial.poll();
        }
    }

    pub fn start_and_play(&mut self) {
        self.trial.start();
        self.play_through(|| 0);
        assert_eq!(self.trial.state(), TrialState::Capturing);
    }

    /// Waits `after_ms`, presses, holds for 80 ms and releases.
    pub fn tap(&mut self, id: u8, after_ms: u64) {
        let position = Position::try_from(id).unwrap();
        self.timer.advance_ms(after_ms);
        self.trial.press(position);
        self.timer.advance_ms(80);
        self.trial.release(position);
    }

    pub fn display(&self) -> &RecordingDisplay {
        self.trial.display()
    }

    pub fn finish_count(&self) -> usize {
        self.results.borrow().len()
    }

    pub fn result(&self) -> TrialResult {
        self.results.borrow()[0].clone()
    }
}
