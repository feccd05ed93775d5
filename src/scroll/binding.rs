use crate::animation::target::{Host, LayoutProvider, PinSurface};
use crate::foundation::core::{OwnerId, TimelineId};
use crate::foundation::error::{ScrublineError, ScrublineResult};
use crate::foundation::math::smoothing_alpha;
use crate::scroll::region::{ResolvedRegion, Scrub, ToggleEvent, TriggerRegion, Zone, zone_transitions};
use crate::scroll::source::FrameScroll;
use smallvec::SmallVec;
use std::fmt;
use std::str::FromStr;

/// Callback for event-mode bindings.
pub type ToggleCallback = Box<dyn FnMut(ToggleEvent, &mut dyn Host)>;

/// Callback for progress-mode bindings.
pub type ProgressCallback = Box<dyn FnMut(f64, &mut dyn Host)>;

/// What a binding drives.
pub enum BindingMode {
    /// Progress drives a timeline's playhead. The timeline may be attached later.
    Scrub {
        /// Bound timeline, if any.
        timeline: Option<TimelineId>,
    },
    /// Discrete enter/leave transitions go to a callback.
    Event(ToggleCallback),
    /// Progress goes to a per-frame callback whenever it changes.
    Progress(ProgressCallback),
    /// Zone transitions play, reverse or reset a timeline that otherwise runs on the clock.
    Actions {
        /// Controlled timeline, if any.
        timeline: Option<TimelineId>,
        /// What each transition does.
        actions: ToggleActions,
    },
}

impl BindingMode {
    /// Scrub `timeline`.
    pub fn scrub(timeline: TimelineId) -> Self {
        BindingMode::Scrub {
            timeline: Some(timeline),
        }
    }

    /// Event-mode binding.
    pub fn on_toggle(f: impl FnMut(ToggleEvent, &mut dyn Host) + 'static) -> Self {
        BindingMode::Event(Box::new(f))
    }

    /// Progress-mode binding.
    pub fn on_progress(f: impl FnMut(f64, &mut dyn Host) + 'static) -> Self {
        BindingMode::Progress(Box::new(f))
    }

    /// Drive `timeline` with `actions`.
    pub fn actions(timeline: TimelineId, actions: ToggleActions) -> Self {
        BindingMode::Actions {
            timeline: Some(timeline),
            actions,
        }
    }
}

/// Playback command issued by a toggle-action binding.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToggleAction {
    /// Leave the timeline alone.
    #[default]
    None,
    /// Play forward from the current playhead.
    Play,
    /// Hold the playhead.
    Pause,
    /// Continue in the current direction.
    Resume,
    /// Play backward from the current playhead.
    Reverse,
    /// Rewind and play forward.
    Restart,
    /// Rewind and hold.
    Reset,
    /// Jump to the end and hold.
    Complete,
}

impl ToggleAction {
    fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Play => "play",
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::Reverse => "reverse",
            Self::Restart => "restart",
            Self::Reset => "reset",
            Self::Complete => "complete",
        }
    }
}

impl FromStr for ToggleAction {
    type Err = ScrublineError;

    fn from_str(s: &str) -> ScrublineResult<Self> {
        Ok(match s {
            "none" => Self::None,
            "play" => Self::Play,
            "pause" => Self::Pause,
            "resume" => Self::Resume,
            "reverse" => Self::Reverse,
            "restart" => Self::Restart,
            "reset" => Self::Reset,
            "complete" => Self::Complete,
            _ => return Err(ScrublineError::scroll(format!("unknown toggle action '{s}'"))),
        })
    }
}

/// Actions for enter, leave, enter-back and leave-back.
///
/// The text form lists the four in that order: `"play none none reverse"`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ToggleActions {
    /// Before -> Inside.
    pub on_enter: ToggleAction,
    /// Inside -> After.
    pub on_leave: ToggleAction,
    /// After -> Inside.
    pub on_enter_back: ToggleAction,
    /// Inside -> Before.
    pub on_leave_back: ToggleAction,
}

impl Default for ToggleActions {
    fn default() -> Self {
        Self {
            on_enter: ToggleAction::Play,
            on_leave: ToggleAction::None,
            on_enter_back: ToggleAction::None,
            on_leave_back: ToggleAction::None,
        }
    }
}

impl ToggleActions {
    /// Action for one transition.
    pub fn action_for(&self, event: ToggleEvent) -> ToggleAction {
        match event {
            ToggleEvent::EnterForward => self.on_enter,
            ToggleEvent::LeaveForward => self.on_leave,
            ToggleEvent::EnterBackward => self.on_enter_back,
            ToggleEvent::LeaveBackward => self.on_leave_back,
        }
    }
}

impl FromStr for ToggleActions {
    type Err = ScrublineError;

    fn from_str(s: &str) -> ScrublineResult<Self> {
        let parts: Vec<&str> = s.split_whitespace().collect();
        let [enter, leave, enter_back, leave_back] = parts[..] else {
            return Err(ScrublineError::scroll(format!(
                "toggle actions '{s}' must list four actions"
            )));
        };
        Ok(Self {
            on_enter: enter.parse()?,
            on_leave: leave.parse()?,
            on_enter_back: enter_back.parse()?,
            on_leave_back: leave_back.parse()?,
        })
    }
}

impl fmt::Display for ToggleActions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.on_enter.as_str(),
            self.on_leave.as_str(),
            self.on_enter_back.as_str(),
            self.on_leave_back.as_str()
        )
    }
}

impl TryFrom<String> for ToggleActions {
    type Error = ScrublineError;

    fn try_from(s: String) -> ScrublineResult<Self> {
        s.parse()
    }
}

impl From<ToggleActions> for String {
    fn from(a: ToggleActions) -> Self {
        a.to_string()
    }
}

impl fmt::Debug for BindingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindingMode::Scrub { timeline } => {
                f.debug_struct("Scrub").field("timeline", timeline).finish()
            }
            BindingMode::Event(_) => f.write_str("Event(..)"),
            BindingMode::Progress(_) => f.write_str("Progress(..)"),
            BindingMode::Actions { timeline, actions } => f
                .debug_struct("Actions")
                .field("timeline", timeline)
                .field("actions", &actions.to_string())
                .finish(),
        }
    }
}

/// Something a binding reports after a frame step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BindingSignal {
    /// Zone transition.
    Toggle(ToggleEvent),
    /// Anchor switched to viewport-fixed positioning.
    PinEngaged,
    /// Anchor returned to flow positioning.
    PinReleased,
}

pub(crate) type Signals = SmallVec<[BindingSignal; 4]>;

/// Associates one trigger region with a timeline or a callback.
#[derive(Debug)]
pub struct ScrollBinding {
    region: TriggerRegion,
    mode: BindingMode,
    owner: OwnerId,
    resolved: Option<ResolvedRegion>,
    stale: bool,
    zone: Zone,
    progress: f64,
    seen_sample: bool,
    last_applied: Option<f64>,
    pinned: bool,
}

impl ScrollBinding {
    pub(crate) fn new(region: TriggerRegion, mode: BindingMode, owner: OwnerId) -> ScrublineResult<Self> {
        region.validate()?;
        if matches!(mode, BindingMode::Scrub { .. }) && region.scrub == Scrub::Off {
            return Err(ScrublineError::scroll(
                "a scrub binding needs a region with scrub enabled",
            ));
        }
        Ok(Self {
            region,
            mode,
            owner,
            resolved: None,
            stale: true,
            zone: Zone::Before,
            progress: 0.0,
            seen_sample: false,
            last_applied: None,
            pinned: false,
        })
    }

    /// The unresolved region.
    pub fn region(&self) -> &TriggerRegion {
        &self.region
    }

    /// Markers from the last resolution.
    pub fn resolved(&self) -> Option<ResolvedRegion> {
        self.resolved
    }

    /// Zone observed on the last frame.
    pub fn zone(&self) -> Zone {
        self.zone
    }

    /// Progress after smoothing, in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        self.progress
    }

    /// Return `true` while the anchor is viewport-fixed.
    pub fn is_pinned(&self) -> bool {
        self.pinned
    }

    /// Return `true` once at least one scroll sample was classified.
    pub fn has_sample(&self) -> bool {
        self.seen_sample
    }

    /// Owning disposal scope.
    pub fn owner(&self) -> OwnerId {
        self.owner
    }

    /// Timeline currently scrubbed or controlled, if any.
    pub fn timeline(&self) -> Option<TimelineId> {
        match self.mode {
            BindingMode::Scrub { timeline } | BindingMode::Actions { timeline, .. } => timeline,
            _ => None,
        }
    }

    pub(crate) fn toggle_actions(&self) -> Option<(TimelineId, ToggleActions)> {
        match self.mode {
            BindingMode::Actions {
                timeline: Some(tl),
                actions,
            } => Some((tl, actions)),
            _ => None,
        }
    }

    /// Start driving `timeline`.
    ///
    /// Returns the progress to apply right away once a sample has been seen; otherwise the
    /// first step applies it.
    pub(crate) fn attach(&mut self, timeline: TimelineId) -> Option<f64> {
        let BindingMode::Scrub { timeline: slot } = &mut self.mode else {
            return None;
        };
        *slot = Some(timeline);
        if self.seen_sample {
            self.last_applied = Some(self.progress);
            Some(self.progress)
        } else {
            self.last_applied = None;
            None
        }
    }

    /// Stop driving the current timeline; returns it.
    pub(crate) fn detach(&mut self) -> Option<TimelineId> {
        match &mut self.mode {
            BindingMode::Scrub { timeline } | BindingMode::Actions { timeline, .. } => {
                timeline.take()
            }
            _ => None,
        }
    }

    /// Mark markers for re-resolution on the next step.
    pub(crate) fn invalidate(&mut self) {
        self.stale = true;
        self.last_applied = None;
    }

    /// Re-resolve markers now. Returns `false` when the anchor is gone.
    pub(crate) fn resolve<L>(&mut self, layout: &L) -> bool
    where
        L: LayoutProvider + ?Sized,
    {
        self.resolved = self.region.resolve(layout);
        // Keep retrying until the anchor mounts.
        self.stale = self.resolved.is_none();
        self.resolved.is_some()
    }

    /// Re-apply the fixed pose after markers moved. Returns `false` when the anchor is gone.
    pub(crate) fn repose(&mut self, host: &mut dyn Host) -> bool {
        match (self.pinned, self.resolved) {
            (true, Some(r)) => host.set_fixed_mode(self.region.anchor, r.pin_pose()),
            _ => true,
        }
    }

    /// Return the anchor to flow positioning if it is pinned.
    pub(crate) fn release_pin(&mut self, host: &mut dyn Host) -> bool {
        if !self.pinned {
            return false;
        }
        self.pinned = false;
        host.set_flow_mode(self.region.anchor)
    }

    /// Classify this frame's scroll sample, fire transitions and pin changes, run callbacks.
    ///
    /// Returns the progress a scrubbed timeline should be set to, when it changed.
    pub(crate) fn step(
        &mut self,
        frame: &FrameScroll,
        dt: f64,
        default_smoothing: Option<f64>,
        host: &mut dyn Host,
        signals: &mut Signals,
    ) -> Option<(TimelineId, f64)> {
        if self.stale && !self.resolve(&*host) {
            return None;
        }
        let region = self.resolved?;
        let pos = frame.sample.smoothed_position;

        let zone = region.zone(pos);
        for ev in zone_transitions(self.zone, zone) {
            // Pin changes only happen on discrete transitions.
            match ev {
                ToggleEvent::LeaveForward if self.region.pin && !self.pinned => {
                    signals.push(BindingSignal::Toggle(ev));
                    if host.set_fixed_mode(self.region.anchor, region.pin_pose()) {
                        self.pinned = true;
                        tracing::debug!(anchor = self.region.anchor.0, "pin engaged");
                        signals.push(BindingSignal::PinEngaged);
                    }
                }
                ToggleEvent::LeaveBackward if self.pinned => {
                    self.pinned = false;
                    host.set_flow_mode(self.region.anchor);
                    tracing::debug!(anchor = self.region.anchor.0, "pin released");
                    signals.push(BindingSignal::PinReleased);
                    signals.push(BindingSignal::Toggle(ev));
                }
                _ => signals.push(BindingSignal::Toggle(ev)),
            }
            if let BindingMode::Event(cb) = &mut self.mode {
                cb(ev, &mut *host);
            }
        }
        self.zone = zone;

        let target = region.progress(pos);
        let smoothing = self.region.scrub.smoothing_secs(default_smoothing);
        self.progress = match smoothing {
            Some(secs) if self.seen_sample => {
                let p = self.progress + (target - self.progress) * smoothing_alpha(dt, secs);
                if (target - p).abs() < 1e-4 { target } else { p }
            }
            _ => target,
        };
        self.seen_sample = true;

        if self.last_applied == Some(self.progress) {
            return None;
        }
        match &mut self.mode {
            BindingMode::Scrub {
                timeline: Some(tl),
            } => {
                self.last_applied = Some(self.progress);
                Some((*tl, self.progress))
            }
            BindingMode::Progress(cb) => {
                self.last_applied = Some(self.progress);
                cb(self.progress, &mut *host);
                None
            }
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scroll/binding.rs"]
mod tests;
