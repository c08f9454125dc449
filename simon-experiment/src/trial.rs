use crate::capture::{Release, ResponseCapture};
use crate::config::EngineConfig;
use crate::scheduler::{Firing, SequenceScheduler};
use simon_core::{
    Position, ResponseEvent, StimulusDisplay, ToneEmitter, TrialConfig, TrialResult, TrialState,
};
use simon_timing::{Timer, TimerQueue};
use tracing::{debug, info, trace};

/// Hands the finished result to the host.
pub type FinishFn = Box<dyn FnOnce(TrialResult)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TrialTimer {
    Step,
    BlinkOff(Position),
}

/// One Simon trial: playback, then response capture, then a single result.
///
/// The trial never blocks. The host calls [`SimonTrial::poll`] once the clock
/// reaches [`SimonTrial::next_deadline`] and forwards press/release signals as
/// they arrive.
pub struct SimonTrial<T, D, E>
where
    T: Timer,
    D: StimulusDisplay,
    E: ToneEmitter,
{
    config: TrialConfig,
    engine: EngineConfig,
    timer: T,
    display: D,
    tone: E,
    scheduler: SequenceScheduler,
    capture: ResponseCapture,
    timers: TimerQueue<TrialTimer>,
    finish: Option<FinishFn>,
}

impl<T, D, E> SimonTrial<T, D, E>
where
    T: Timer,
    D: StimulusDisplay,
    E: ToneEmitter,
{
    pub fn new(
        config: TrialConfig,
        engine: EngineConfig,
        timer: T,
        display: D,
        tone: E,
        finish: impl FnOnce(TrialResult) + 'static,
    ) -> Self {
        let scheduler = SequenceScheduler::new(config.sequence.clone(), engine.interval());
        let capture = ResponseCapture::new(config.sequence.clone(), engine.policy);
        Self {
            config,
            engine,
            timer,
            display,
            tone,
            scheduler,
            capture,
            timers: TimerQueue::new(),
            finish: Some(Box::new(finish)),
        }
    }

    /// Starts playback; the first stimulus is shown right away.
    pub fn start(&mut self) {
        let now = self.timer.now();
        let firing = self.scheduler.start(now);
        if firing != Firing::Idle {
            info!(
                length = self.config.sequence.len(),
                mode = ?self.config.mode,
                "playback started"
            );
        }
        self.dispatch(firing, now);
    }

    /// Runs every timer that is due. Returns how many fired.
    pub fn poll(&mut self) -> usize {
        let mut fired = 0;
        loop {
            let now = self.timer.now();
            let Some((_, event)) = self.timers.pop_due(now) else {
                break;
            };
            fired += 1;
            match event {
                TrialTimer::Step => {
                    let firing = self.scheduler.fire(now);
                    self.dispatch(firing, now);
                }
                TrialTimer::BlinkOff(position) => self.blink_off(position),
            }
        }
        fired
    }

    fn dispatch(&mut self, firing: Firing, now: u64) {
        match firing {
            Firing::Tick { position, next_in } => {
                debug!(%position, index = self.scheduler.presented() - 1, "tick");
                self.highlight(position);
                self.timers
                    .schedule_after(now, self.engine.blink(), TrialTimer::BlinkOff(position));
                self.timers.schedule_after(now, next_in, TrialTimer::Step);
            }
            Firing::Done => {
                let now_ms = now / 1_000_000;
                if self.capture.begin(now_ms) {
                    info!(at_ms = now_ms, "playback finished, capturing responses");
                }
            }
            Firing::Idle => {}
        }
    }

    fn highlight(&mut self, position: Position) {
        self.display.set_highlight(position, true);
        if self.config.mode.emits_tone() {
            self.tone.emit(position, self.engine.blink());
        }
    }

    fn blink_off(&mut self, position: Position) {
        if self.capture.state() == TrialState::Finished || self.capture.is_held(position) {
            return;
        }
        self.display.set_highlight(position, false);
    }

    pub fn press(&mut self, position: Position) {
        let now_ms = self.timer.now_ms();
        match self.capture.press(position, now_ms) {
            Some(event) => {
                debug!(%position, delta_ms = event.delta_time_ms, "press accepted");
                self.highlight(position);
            }
            None => trace!(%position, state = ?self.capture.state(), "press dropped"),
        }
    }

    pub fn release(&mut self, position: Position) {
        match self.capture.release(position) {
            Release::Ignored => trace!(%position, "release dropped"),
            Release::Continue => self.display.set_highlight(position, false),
            Release::Finished(summary) => {
                self.display.set_highlight(position, false);
                self.scheduler.stop();
                self.timers.clear();

                let result = TrialResult {
                    sequence: self.config.sequence.clone(),
                    mode: self.config.mode,
                    response: summary.response,
                    reaction_time_ms: summary.reaction_time_ms,
                };
                info!(
                    responses = result.response.len(),
                    rt_ms = result.reaction_time_ms,
                    correct = result.is_correct(),
                    "trial finished"
                );
                if let Some(finish) = self.finish.take() {
                    finish(result);
                }
            }
        }
    }

    /// Abandons playback. Pending blink-offs still run; no result is produced.
    pub fn abort(&mut self) {
        if self.scheduler.is_running() {
            info!(presented = self.scheduler.presented(), "playback aborted");
        }
        self.scheduler.stop();
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.timers.next_deadline()
    }

    pub fn state(&self) -> TrialState {
        self.capture.state()
    }

    pub fn is_finished(&self) -> bool {
        self.state() == TrialState::Finished
    }

    pub fn config(&self) -> &TrialConfig {
        &self.config
    }

    pub fn response(&self) -> &[ResponseEvent] {
        self.capture.response()
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn tone(&self) -> &E {
        &self.tone
    }
}
