use simon_core::{Position, Sequence};
use std::time::Duration;

/// What a single firing of the scheduler produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Firing {
    /// Present `position` now and fire again after `next_in`.
    Tick { position: Position, next_in: Duration },
    /// Every element has been presented. Issued once.
    Done,
    /// Not running; nothing to do.
    Idle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Run {
    Ready,
    Running,
    Stopped,
    Completed,
}

/// Drift-corrected playback of a sequence.
///
/// Each firing is expected on a fixed grid (`start + k * interval`). The delay
/// handed back for the next firing subtracts however late the current one was,
/// so lateness in one step never accumulates into the following ones.
#[derive(Debug, Clone)]
pub struct SequenceScheduler {
    sequence: Sequence,
    interval_ns: u64,
    cursor: usize,
    expected_ns: u64,
    run: Run,
}

impl SequenceScheduler {
    pub fn new(sequence: Sequence, interval: Duration) -> Self {
        Self {
            sequence,
            interval_ns: interval.as_nanos() as u64,
            cursor: 0,
            expected_ns: 0,
            run: Run::Ready,
        }
    }

    /// Presents the first element immediately.
    pub fn start(&mut self, now: u64) -> Firing {
        if self.run != Run::Ready {
            return Firing::Idle;
        }
        self.run = Run::Running;
        self.expected_ns = now + self.interval_ns;
        self.cursor = 1;
        Firing::Tick {
            position: self.sequence.first(),
            next_in: Duration::from_nanos(self.interval_ns),
        }
    }

    pub fn fire(&mut self, now: u64) -> Firing {
        if self.run != Run::Running {
            return Firing::Idle;
        }

        let Some(position) = self.sequence.get(self.cursor) else {
            self.run = Run::Completed;
            return Firing::Done;
        };
        self.cursor += 1;

        let next_ns = match now.checked_sub(self.expected_ns) {
            Some(late) => self.interval_ns.saturating_sub(late),
            None => self.interval_ns + (self.expected_ns - now),
        };
        self.expected_ns += self.interval_ns;

        Firing::Tick {
            position,
            next_in: Duration::from_nanos(next_ns),
        }
    }

    /// Turns every later firing into `Idle`.
    pub fn stop(&mut self) {
        if matches!(self.run, Run::Ready | Run::Running) {
            self.run = Run::Stopped;
        }
    }

    pub fn is_running(&self) -> bool {
        self.run == Run::Running
    }

    pub fn is_completed(&self) -> bool {
        self.run == Run::Completed
    }

    /// Elements presented so far.
    pub fn presented(&self) -> usize {
        self.cursor
    }

    /// Where on the ideal grid the next firing belongs.
    pub fn expected_next(&self) -> Option<u64> {
        self.is_running().then_some(self.expected_ns)
    }
}
