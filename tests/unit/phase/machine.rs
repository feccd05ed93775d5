use super::*;

fn run(events: &[PhaseEvent]) -> Vec<Phase> {
    let mut m = PhaseMachine::new();
    events
        .iter()
        .map(|&e| {
            m.fire(e);
            m.phase()
        })
        .collect()
}

#[test]
fn full_lifecycle() {
    use PhaseEvent::*;
    use ToggleEvent::*;
    let phases = run(&[
        Play,
        IntroComplete,
        Toggle(EnterForward),
        Toggle(LeaveForward),
        PinEngaged,
        Toggle(EnterBackward),
        PinReleased,
        Toggle(LeaveBackward),
    ]);
    assert_eq!(
        phases,
        vec![
            Phase::Intro,
            Phase::Loop,
            Phase::ScrollBound,
            Phase::ScrollBound,
            Phase::Pinned,
            Phase::Pinned,
            Phase::ScrollBound,
            Phase::Loop,
        ]
    );
}

#[test]
fn intro_plays_once_until_reset() {
    let mut m = PhaseMachine::new();
    assert_eq!(m.fire(PhaseEvent::Play), Some((Phase::Idle, Phase::Intro)));
    m.fire(PhaseEvent::IntroComplete);
    assert_eq!(m.fire(PhaseEvent::Reset), Some((Phase::Loop, Phase::Idle)));
    assert!(!m.state().has_played);
    assert_eq!(m.fire(PhaseEvent::Play), Some((Phase::Idle, Phase::Intro)));

    let guarded = PhaseState {
        phase: Phase::Idle,
        has_played: true,
    };
    assert_eq!(transition(guarded, PhaseEvent::Play), guarded);
}

#[test]
fn irrelevant_events_are_ignored() {
    use PhaseEvent::*;
    let mut m = PhaseMachine::new();
    for e in [IntroComplete, PinEngaged, Toggle(ToggleEvent::EnterForward)] {
        assert_eq!(m.fire(e), None);
    }
    m.fire(Play);
    // Scroll engagement during the intro does not cut it short.
    assert_eq!(m.fire(Toggle(ToggleEvent::EnterForward)), None);
    assert_eq!(m.phase(), Phase::Intro);
    m.fire(IntroComplete);
    // Loop only leaves on an enter transition.
    assert_eq!(m.fire(Toggle(ToggleEvent::LeaveBackward)), None);
    assert_eq!(
        m.fire(Toggle(ToggleEvent::EnterBackward)),
        Some((Phase::Loop, Phase::ScrollBound))
    );
    // Pinned ignores leave-backward until the pin is released.
    m.fire(PinEngaged);
    assert_eq!(m.fire(Toggle(ToggleEvent::LeaveBackward)), None);
}
