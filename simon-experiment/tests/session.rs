mod support;

use simon_core::{
    Highlights, Phase, Position, PresentationMode, StandardPhase, TrialConfig, TrialState,
};
use simon_experiment::{Block, Blocks, EngineConfig, SessionEvent, SessionStateMachine};
use simon_timing::ManualTimer;
use support::RecordingTone;

type Session = SessionStateMachine<StandardPhase, ManualTimer, Highlights, RecordingTone>;

fn session(blocks: Blocks) -> (Session, ManualTimer, RecordingTone) {
    let timer = ManualTimer::new();
    let tone = RecordingTone::default();
    let session = Session::new(blocks, EngineConfig::default(), timer.clone(), tone.clone());
    (session, timer, tone)
}

fn trial(ids: &[u8], mode: PresentationMode) -> TrialConfig {
    TrialConfig::from_indices(ids, mode).unwrap()
}

fn pump(session: &mut Session) {
    for event in session.update() {
        session.handle_event(event);
    }
}

fn play(session: &mut Session, timer: &ManualTimer) {
    while session.current_trial_state() == Some(TrialState::AwaitingPlayback) {
        let Some(deadline) = session.next_deadline() else {
            break;
        };
        timer.set(deadline);
        pump(session);
    }
}

fn reproduce(session: &mut Session, timer: &ManualTimer, ids: &[u8]) {
    for &id in ids {
        let position = Position::try_from(id).unwrap();
        timer.advance_ms(350);
        session.press(position);
        timer.advance_ms(60);
        session.release(position);
    }
    pump(session);
}

#[test]
fn runs_practice_then_main_then_debrief() {
    let blocks = Blocks {
        practice: vec![trial(&[0, 1], PresentationMode::AudioVisual)],
        main: vec![
            trial(&[3, 2], PresentationMode::Visual),
            trial(&[1, 1, 0], PresentationMode::AudioVisual),
        ],
    };
    let (mut s, timer, tone) = session(blocks);
    assert!(s.current_phase().is_welcome());
    assert!(s.is_awaiting_input());

    assert!(s.handle_event(SessionEvent::SpacePressed));
    assert!(s.current_phase().is_practice());
    assert_eq!(s.trial_progress(), Some((1, 1)));

    assert!(s.handle_event(SessionEvent::SpacePressed));
    assert!(!s.is_awaiting_input());
    play(&mut s, &timer);
    reproduce(&mut s, &timer, &[0, 1]);
    assert!(s.current_phase().is_experiment());
    assert!(s.is_awaiting_input());

    s.handle_event(SessionEvent::SpacePressed);
    play(&mut s, &timer);
    reproduce(&mut s, &timer, &[3, 2]);
    assert_eq!(s.trial_progress(), Some((2, 2)));

    s.handle_event(SessionEvent::SpacePressed);
    play(&mut s, &timer);
    reproduce(&mut s, &timer, &[1, 0]);
    assert!(s.current_phase().is_debrief());

    let records = s.results();
    assert_eq!(records.len(), 3);
    assert_eq!(
        records.iter().map(|r| r.trial_id).collect::<Vec<_>>(),
        vec![0, 1, 2]
    );
    assert_eq!(records[0].block, Block::Practice);
    assert_eq!(records[2].block, Block::Main);
    assert_eq!(records[2].result.response.len(), 2);

    let summary = s.summary();
    assert_eq!(summary.trials, 3);
    assert_eq!(summary.correct, 2);
    assert_eq!(summary.mean_rt_ms, Some(760.0));

    // 2 ticks + 2 presses in the practice trial, 3 ticks + 2 presses in the last
    assert_eq!(tone.count(), 9);
}

#[test]
fn trials_wait_for_the_participant() {
    let blocks = Blocks {
        practice: Vec::new(),
        main: vec![trial(&[2], PresentationMode::Visual)],
    };
    let (mut s, timer, _) = session(blocks);

    s.handle_event(SessionEvent::SpacePressed);
    assert!(s.current_phase().is_experiment(), "empty practice is skipped");
    assert_eq!(s.current_trial_state(), None);

    timer.advance_ms(5_000);
    pump(&mut s);
    assert_eq!(s.current_trial_state(), None);
    assert!(s.results().is_empty());

    s.handle_event(SessionEvent::SpacePressed);
    assert_eq!(s.current_trial_state(), Some(TrialState::AwaitingPlayback));
    assert!(s.current_display().unwrap().is_highlighted(Position::BottomLeft));

    // space while a trial is running does not start another one
    assert!(!s.handle_event(SessionEvent::SpacePressed));
}

#[test]
fn serialises_records_with_block_labels() {
    let blocks = Blocks {
        practice: vec![trial(&[1], PresentationMode::Visual)],
        main: Vec::new(),
    };
    let (mut s, timer, _) = session(blocks);
    s.handle_event(SessionEvent::SpacePressed);
    s.handle_event(SessionEvent::SpacePressed);
    play(&mut s, &timer);
    reproduce(&mut s, &timer, &[1]);

    assert!(s.current_phase().is_debrief());
    let json = serde_json::to_value(s.results()).unwrap();
    assert_eq!(
        json,
        serde_json::json!([{
            "trial_id": 0,
            "block": "practice",
            "sequence": [1],
            "mode": "visual",
            "response": [{ "button": 1, "delta_time": 350 }],
            "rt": 350
        }])
    );
}

#[test]
fn abandoned_trial_is_not_recorded() {
    let blocks = Blocks {
        practice: vec![trial(&[0, 1, 2], PresentationMode::Visual)],
        main: Vec::new(),
    };
    let (mut s, timer, _) = session(blocks);
    s.handle_event(SessionEvent::SpacePressed);
    s.handle_event(SessionEvent::SpacePressed);
    timer.advance_ms(100);
    pump(&mut s);

    s.abort();
    assert_eq!(s.current_trial_state(), None);
    assert_eq!(s.next_deadline(), None);
    assert!(s.results().is_empty());
    assert!(s.is_awaiting_input());

    // The same trial runs again and the block carries on to the end.
    assert!(s.handle_event(SessionEvent::SpacePressed));
    assert_eq!(s.trial_progress(), Some((1, 1)));
    play(&mut s, &timer);
    reproduce(&mut s, &timer, &[0, 1, 2]);
    pump(&mut s);

    assert_eq!(s.results().len(), 1);
    assert_eq!(s.results()[0].trial_id, 0);
    assert!(s.current_phase().is_debrief());
}

#[test]
fn abort_discards_a_finished_but_uncollected_trial() {
    let blocks = Blocks {
        practice: vec![trial(&[3], PresentationMode::Visual)],
        main: Vec::new(),
    };
    let (mut s, timer, _) = session(blocks);
    s.handle_event(SessionEvent::SpacePressed);
    s.handle_event(SessionEvent::SpacePressed);
    play(&mut s, &timer);
    s.press(Position::BottomRight);
    s.release(Position::BottomRight);

    s.abort();
    pump(&mut s);
    assert!(s.results().is_empty());
    assert!(s.current_phase().is_practice());
    assert!(s.is_awaiting_input());
}

#[test]
fn no_blocks_goes_straight_to_debrief() {
    let (mut s, _, _) = session(Blocks::default());
    assert!(s.handle_event(SessionEvent::SpacePressed));
    assert!(s.current_phase().is_debrief());
    assert_eq!(s.summary().mean_rt_ms, None);
    assert!(!s.handle_event(SessionEvent::PhaseComplete));
}
