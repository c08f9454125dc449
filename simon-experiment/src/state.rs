use crate::blocks::Blocks;
use crate::config::EngineConfig;
use crate::trial::SimonTrial;
use serde::{Deserialize, Serialize};
use simon_core::{
    Phase, Position, StimulusDisplay, ToneEmitter, TrialConfig, TrialResult, TrialState,
};
use simon_timing::Timer;
use std::sync::mpsc::{self, Receiver, Sender};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    SpacePressed,
    TrialComplete,
    PhaseComplete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Block {
    Practice,
    Main,
}

/// A trial result as stored by the session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrialRecord {
    pub trial_id: usize,
    pub block: Block,
    #[serde(flatten)]
    pub result: TrialResult,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SessionSummary {
    pub trials: usize,
    pub correct: usize,
    pub mean_rt_ms: Option<f64>,
}

/// Runs the practice block, then the main block, one trial at a time.
///
/// Each trial waits for a `SpacePressed` before playback starts.
pub struct SessionStateMachine<P, T, D, E>
where
    P: Phase,
    T: Timer,
    D: StimulusDisplay + Default,
    E: ToneEmitter + Clone,
{
    pub phase: P,
    pub timer: T,
    pub engine: EngineConfig,
    pub blocks: Blocks,
    tone: E,
    current: Option<SimonTrial<T, D, E>>,
    pub trial_number: usize,
    pub phase_trial_number: usize,
    pub results: Vec<TrialRecord>,
    finished_tx: Sender<TrialResult>,
    finished_rx: Receiver<TrialResult>,
    last_result: Option<TrialResult>,
    pub awaiting_input: bool,
}

impl<P, T, D, E> SessionStateMachine<P, T, D, E>
where
    P: Phase,
    T: Timer,
    D: StimulusDisplay + Default,
    E: ToneEmitter + Clone,
{
    pub fn new(blocks: Blocks, engine: EngineConfig, timer: T, tone: E) -> Self {
        let (finished_tx, finished_rx) = mpsc::channel();
        Self {
            phase: P::default(),
            timer,
            engine,
            blocks,
            tone,
            current: None,
            trial_number: 0,
            phase_trial_number: 0,
            results: Vec::new(),
            finished_tx,
            finished_rx,
            last_result: None,
            awaiting_input: true,
        }
    }

    pub fn advance_phase(&mut self) -> bool {
        if let Some(next) = self.phase.next() {
            self.phase = next;
            self.phase_trial_number = 0;
            self.awaiting_input = self.phase.runs_trials();
            info!(phase = ?self.phase, "phase started");
            true
        } else {
            false
        }
    }

    /// Advances past phases that have no trials to run.
    fn enter_next_phase(&mut self) -> bool {
        loop {
            if !self.advance_phase() {
                return false;
            }
            if !(self.phase.runs_trials() && self.current_block().is_empty()) {
                break;
            }
        }
        if self.phase.is_debrief() {
            self.log_summary();
        }
        true
    }

    fn current_block(&self) -> &[TrialConfig] {
        if self.phase.is_practice() {
            &self.blocks.practice
        } else if self.phase.is_experiment() {
            &self.blocks.main
        } else {
            &[]
        }
    }

    pub fn start_trial(&mut self) -> bool {
        let Some(config) = self.current_block().get(self.phase_trial_number).cloned() else {
            return false;
        };

        let tx = self.finished_tx.clone();
        let mut trial = SimonTrial::new(
            config,
            self.engine,
            self.timer.clone(),
            D::default(),
            self.tone.clone(),
            move |result| {
                if tx.send(result).is_err() {
                    warn!("session dropped before trial result arrived");
                }
            },
        );

        info!(
            trial = self.trial_number,
            block_trial = self.phase_trial_number + 1,
            block_size = self.current_block().len(),
            "trial started"
        );
        trial.start();
        self.current = Some(trial);
        self.awaiting_input = false;
        true
    }

    /// Runs due trial timers and collects finished results.
    pub fn update(&mut self) -> Vec<SessionEvent> {
        let mut events = Vec::new();

        if let Some(trial) = &mut self.current {
            trial.poll();
        }

        if let Ok(result) = self.finished_rx.try_recv() {
            self.last_result = Some(result);
            events.push(SessionEvent::TrialComplete);
        }

        events
    }

    pub fn handle_event(&mut self, event: SessionEvent) -> bool {
        match (&self.phase, &event) {
            (phase, SessionEvent::SpacePressed) if phase.is_welcome() => self.enter_next_phase(),

            (phase, SessionEvent::SpacePressed) if phase.runs_trials() && self.awaiting_input => {
                self.start_trial()
            }

            (phase, SessionEvent::TrialComplete) if phase.runs_trials() => {
                if self.complete_current_trial() {
                    self.handle_event(SessionEvent::PhaseComplete)
                } else {
                    true
                }
            }

            (_, SessionEvent::PhaseComplete) => self.enter_next_phase(),

            _ => false,
        }
    }

    /// Stores the finished result. Returns true when the block is exhausted.
    fn complete_current_trial(&mut self) -> bool {
        let Some(result) = self.last_result.take() else {
            return false;
        };
        let block = if self.phase.is_practice() {
            Block::Practice
        } else {
            Block::Main
        };
        self.results.push(TrialRecord {
            trial_id: self.trial_number,
            block,
            result,
        });

        self.current = None;
        self.trial_number += 1;
        self.phase_trial_number += 1;
        self.awaiting_input = true;

        self.phase_trial_number >= self.current_block().len()
    }

    pub fn press(&mut self, position: Position) {
        if let Some(trial) = &mut self.current {
            trial.press(position);
        }
    }

    pub fn release(&mut self, position: Position) {
        if let Some(trial) = &mut self.current {
            trial.release(position);
        }
    }

    /// Abandons the running trial, if any. Its result is never recorded and
    /// the next `SpacePressed` runs the same configuration again.
    pub fn abort(&mut self) {
        if let Some(mut trial) = self.current.take() {
            trial.abort();
            warn!(trial = self.trial_number, "trial abandoned");
        }
        // A trial may have finished without its result being collected yet.
        while self.finished_rx.try_recv().is_ok() {}
        self.last_result = None;
        self.awaiting_input = self.phase.runs_trials();
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.current.as_ref().and_then(|t| t.next_deadline())
    }

    pub fn current_phase(&self) -> &P {
        &self.phase
    }

    pub fn current_display(&self) -> Option<&D> {
        self.current.as_ref().map(|t| t.display())
    }

    pub fn current_trial_state(&self) -> Option<TrialState> {
        self.current.as_ref().map(|t| t.state())
    }

    pub fn is_awaiting_input(&self) -> bool {
        self.awaiting_input || self.phase.is_welcome()
    }

    pub fn trial_progress(&self) -> Option<(usize, usize)> {
        self.phase
            .runs_trials()
            .then(|| (self.phase_trial_number + 1, self.current_block().len()))
    }

    pub fn results(&self) -> &[TrialRecord] {
        &self.results
    }

    pub fn summary(&self) -> SessionSummary {
        let trials = self.results.len();
        let correct = self.results.iter().filter(|r| r.result.is_correct()).count();
        let mean_rt_ms = (trials > 0).then(|| {
            self.results
                .iter()
                .map(|r| r.result.reaction_time_ms as f64)
                .sum::<f64>()
                / trials as f64
        });
        SessionSummary {
            trials,
            correct,
            mean_rt_ms,
        }
    }

    fn log_summary(&self) {
        let summary = self.summary();
        info!(
            trials = summary.trials,
            correct = summary.correct,
            mean_rt_ms = summary.mean_rt_ms.unwrap_or_default(),
            "session complete"
        );
    }
}
