use crate::config::TerminationPolicy;
use simon_core::{Position, ResponseEvent, Sequence, TrialState};

/// Outcome of a release signal
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Release {
    /// Not capturing, or the position was never accepted as pressed.
    Ignored,
    /// Accepted; the trial goes on.
    Continue,
    /// Accepted and the trial is over.
    Finished(CaptureSummary),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureSummary {
    pub response: Vec<ResponseEvent>,
    pub reaction_time_ms: u64,
}

/// Records the participant's reproduction once playback is over.
///
/// All timestamps are milliseconds on the trial clock.
#[derive(Debug, Clone)]
pub struct ResponseCapture {
    sequence: Sequence,
    policy: TerminationPolicy,
    state: TrialState,
    response: Vec<ResponseEvent>,
    start_ms: u64,
    last_event_ms: u64,
    held: [bool; 4],
    mismatched: bool,
}

impl ResponseCapture {
    pub fn new(sequence: Sequence, policy: TerminationPolicy) -> Self {
        let capacity = sequence.len();
        Self {
            sequence,
            policy,
            state: TrialState::AwaitingPlayback,
            response: Vec::with_capacity(capacity),
            start_ms: 0,
            last_event_ms: 0,
            held: [false; 4],
            mismatched: false,
        }
    }

    /// Opens the capture window. Only valid once, right after playback.
    pub fn begin(&mut self, now_ms: u64) -> bool {
        if self.state != TrialState::AwaitingPlayback {
            return false;
        }
        self.state = TrialState::Capturing;
        self.start_ms = now_ms;
        self.last_event_ms = now_ms;
        self.response.clear();
        self.mismatched = false;
        true
    }

    /// Records a button-down. Returns the stored event when accepted.
    pub fn press(&mut self, position: Position, now_ms: u64) -> Option<ResponseEvent> {
        if self.state != TrialState::Capturing
            || self.held[position.index()]
            || self.response.len() >= self.sequence.len()
        {
            return None;
        }

        let event = ResponseEvent {
            position,
            delta_time_ms: now_ms.saturating_sub(self.last_event_ms),
        };
        if self.sequence.get(self.response.len()) != Some(position) {
            self.mismatched = true;
        }
        self.response.push(event);
        self.last_event_ms = now_ms;
        self.held[position.index()] = true;
        Some(event)
    }

    /// Handles a button-up and decides whether the trial ends here.
    pub fn release(&mut self, position: Position) -> Release {
        if self.state != TrialState::Capturing || !self.held[position.index()] {
            return Release::Ignored;
        }
        self.held[position.index()] = false;

        if !self.should_terminate() {
            return Release::Continue;
        }

        self.state = TrialState::Finished;
        self.held = [false; 4];
        Release::Finished(CaptureSummary {
            response: self.response.clone(),
            reaction_time_ms: self.reaction_time_ms(),
        })
    }

    fn should_terminate(&self) -> bool {
        let given = self.response.len();
        if given >= self.sequence.len() {
            return true;
        }
        match self.policy {
            // Any wrong press so far, even one overlapped by a later press.
            TerminationPolicy::StopOnMismatch => self.mismatched,
            TerminationPolicy::FullLength => false,
        }
    }

    pub fn state(&self) -> TrialState {
        self.state
    }

    pub fn response(&self) -> &[ResponseEvent] {
        &self.response
    }

    pub fn is_held(&self, position: Position) -> bool {
        self.held[position.index()]
    }

    /// Last accepted press relative to capture start.
    pub fn reaction_time_ms(&self) -> u64 {
        self.last_event_ms - self.start_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Position::*;

    fn capture(ids: &[u8], policy: TerminationPolicy) -> ResponseCapture {
        ResponseCapture::new(Sequence::from_indices(ids).unwrap(), policy)
    }

    #[test]
    fn ignores_input_before_playback_ends() {
        let mut c = capture(&[0, 1], TerminationPolicy::StopOnMismatch);
        assert_eq!(c.press(TopLeft, 10), None);
        assert_eq!(c.release(TopLeft), Release::Ignored);
        assert!(c.response().is_empty());
        assert_eq!(c.state(), TrialState::AwaitingPlayback);
    }

    #[test]
    fn deltas_are_anchored_to_capture_start() {
        let mut c = capture(&[0, 1, 2], TerminationPolicy::StopOnMismatch);
        assert!(c.begin(1_000));
        assert!(!c.begin(2_000));

        let first = c.press(TopLeft, 1_450).unwrap();
        assert_eq!(first.delta_time_ms, 450);
        assert_eq!(c.release(TopLeft), Release::Continue);

        let second = c.press(TopRight, 1_700).unwrap();
        assert_eq!(second.delta_time_ms, 250);
    }

    #[test]
    fn finishes_on_full_length() {
        let mut c = capture(&[0, 1], TerminationPolicy::StopOnMismatch);
        c.begin(0);
        c.press(TopLeft, 300);
        assert_eq!(c.release(TopLeft), Release::Continue);
        c.press(TopRight, 800);
        let Release::Finished(summary) = c.release(TopRight) else {
            panic!("trial should be over");
        };
        assert_eq!(summary.response.len(), 2);
        assert_eq!(summary.reaction_time_ms, 800);
        assert_eq!(c.state(), TrialState::Finished);
    }

    #[test]
    fn mismatch_ends_early_under_default_policy() {
        let mut c = capture(&[0, 1, 2, 3], TerminationPolicy::StopOnMismatch);
        c.begin(0);
        c.press(TopLeft, 100);
        c.release(TopLeft);
        c.press(BottomLeft, 200);
        let Release::Finished(summary) = c.release(BottomLeft) else {
            panic!("mismatch should end the trial");
        };
        assert_eq!(summary.response.len(), 2);
    }

    #[test]
    fn overlapping_wrong_press_still_ends_the_trial() {
        let mut c = capture(&[0, 1, 2, 3], TerminationPolicy::StopOnMismatch);
        c.begin(0);
        c.press(BottomLeft, 100);
        c.press(TopRight, 150);
        let Release::Finished(summary) = c.release(TopRight) else {
            panic!("earlier mismatch should end the trial");
        };
        assert_eq!(summary.response.len(), 2);
        assert_eq!(c.release(BottomLeft), Release::Ignored);
    }

    #[test]
    fn full_length_policy_keeps_going_after_mismatch() {
        let mut c = capture(&[0, 1, 2], TerminationPolicy::FullLength);
        c.begin(0);
        c.press(BottomRight, 100);
        assert_eq!(c.release(BottomRight), Release::Continue);
        c.press(BottomRight, 200);
        assert_eq!(c.release(BottomRight), Release::Continue);
        c.press(TopLeft, 300);
        assert!(matches!(c.release(TopLeft), Release::Finished(_)));
    }

    #[test]
    fn release_without_press_is_dropped() {
        let mut c = capture(&[0, 1], TerminationPolicy::StopOnMismatch);
        c.begin(0);
        assert_eq!(c.release(BottomRight), Release::Ignored);
        c.press(TopLeft, 50);
        assert_eq!(c.press(TopLeft, 60), None);
        assert_eq!(c.response().len(), 1);
    }

    #[test]
    fn never_records_more_presses_than_targets() {
        let mut c = capture(&[0, 1], TerminationPolicy::FullLength);
        c.begin(0);
        assert!(c.press(TopLeft, 10).is_some());
        assert!(c.press(TopRight, 20).is_some());
        assert!(c.press(BottomLeft, 30).is_none());
        assert!(matches!(c.release(TopLeft), Release::Finished(_)));
        assert_eq!(c.release(TopRight), Release::Ignored);
        assert_eq!(c.press(BottomLeft, 40), None);
        assert_eq!(c.response().len(), 2);
    }
}
