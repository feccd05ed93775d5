use crate::scroll::region::ToggleEvent;

/// Lifecycle phase of one animated object.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Nothing playing yet.
    #[default]
    Idle,
    /// One-shot entrance animation.
    Intro,
    /// Ambient infinite motion.
    Loop,
    /// Scroll progress owns the object's properties.
    ScrollBound,
    /// Scroll-bound with the anchor pinned to the viewport.
    Pinned,
}

/// Inputs to the phase machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseEvent {
    /// Mount or explicit play request.
    Play,
    /// The intro timeline finished.
    IntroComplete,
    /// Zone transition of the object's trigger region.
    Toggle(ToggleEvent),
    /// The anchor became viewport-fixed.
    PinEngaged,
    /// The anchor returned to flow positioning.
    PinReleased,
    /// Return to `Idle` and allow the intro to play again.
    Reset,
}

/// Phase plus the "has played" guard.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct PhaseState {
    /// Current phase.
    pub phase: Phase,
    /// Set once the intro has been started; cleared only by [`PhaseEvent::Reset`].
    pub has_played: bool,
}

/// Pure transition function. Events that do not apply leave the state unchanged.
pub fn transition(state: PhaseState, event: PhaseEvent) -> PhaseState {
    use Phase::*;
    let phase = |phase| PhaseState { phase, ..state };
    match (state.phase, event) {
        (_, PhaseEvent::Reset) => PhaseState::default(),
        (Idle, PhaseEvent::Play) if !state.has_played => PhaseState {
            phase: Intro,
            has_played: true,
        },
        (Intro, PhaseEvent::IntroComplete) => phase(Loop),
        (Loop, PhaseEvent::Toggle(ev)) if ev.is_enter() => phase(ScrollBound),
        (ScrollBound, PhaseEvent::PinEngaged) => phase(Pinned),
        (Pinned, PhaseEvent::PinReleased) => phase(ScrollBound),
        (ScrollBound, PhaseEvent::Toggle(ToggleEvent::LeaveBackward)) => phase(Loop),
        _ => state,
    }
}

/// Stateful wrapper over [`transition`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PhaseMachine {
    state: PhaseState,
}

impl PhaseMachine {
    /// Machine in `Idle`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    /// Current state.
    pub fn state(&self) -> PhaseState {
        self.state
    }

    /// Apply `event`; returns `(from, to)` when the phase changed.
    pub fn fire(&mut self, event: PhaseEvent) -> Option<(Phase, Phase)> {
        let from = self.state.phase;
        self.state = transition(self.state, event);
        (self.state.phase != from).then_some((from, self.state.phase))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/phase/machine.rs"]
mod tests;
