use crate::animation::target::Host;
use crate::animation::timeline::Timeline;
use crate::engine::clock::FrameClock;
use crate::engine::scheduler::{EngineEvent, Pending, PlayState, Scheduler};
use crate::foundation::core::{BindingId, ObjectId, OwnerId, TimelineId, Viewport};
use crate::foundation::error::{ScrublineError, ScrublineResult};
use crate::phase::machine::{Phase, PhaseEvent, PhaseMachine, PhaseState};
use crate::scroll::binding::BindingMode;
use crate::scroll::region::{ToggleEvent, TriggerRegion, Zone};
use std::fmt;

/// Builds a phase's timeline for the current viewport.
pub type TimelineFactory = Box<dyn Fn(&Viewport) -> ScrublineResult<Timeline>>;

/// Scroll-bound phase of an object: a region plus the timeline it scrubs.
pub struct ScrollPhase {
    /// Region whose progress drives the timeline.
    pub region: TriggerRegion,
    /// Builds the scrubbed timeline; must be finite.
    pub timeline: TimelineFactory,
}

/// Timelines and region describing one object's lifecycle.
pub struct PhaseSpec {
    intro: Option<TimelineFactory>,
    idle: Option<TimelineFactory>,
    scroll: Option<ScrollPhase>,
    autoplay: bool,
}

impl Default for PhaseSpec {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PhaseSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhaseSpec")
            .field("intro", &self.intro.is_some())
            .field("idle", &self.idle.is_some())
            .field("scroll", &self.scroll.as_ref().map(|s| &s.region))
            .field("autoplay", &self.autoplay)
            .finish()
    }
}

impl PhaseSpec {
    /// Empty spec that plays on registration.
    pub fn new() -> Self {
        Self {
            intro: None,
            idle: None,
            scroll: None,
            autoplay: true,
        }
    }

    /// One-shot entrance timeline. Rebuilt from scratch when the viewport resizes mid-intro.
    pub fn intro(
        mut self,
        f: impl Fn(&Viewport) -> ScrublineResult<Timeline> + 'static,
    ) -> Self {
        self.intro = Some(Box::new(f));
        self
    }

    /// Ambient loop timeline; the only place an infinitely repeating timeline may run.
    pub fn idle(mut self, f: impl Fn(&Viewport) -> ScrublineResult<Timeline> + 'static) -> Self {
        self.idle = Some(Box::new(f));
        self
    }

    /// Scroll-bound phase.
    pub fn scroll(
        mut self,
        region: TriggerRegion,
        f: impl Fn(&Viewport) -> ScrublineResult<Timeline> + 'static,
    ) -> Self {
        self.scroll = Some(ScrollPhase {
            region,
            timeline: Box::new(f),
        });
        self
    }

    /// Start the intro on registration (default) or wait for [`Scheduler::play_object`].
    pub fn autoplay(mut self, on: bool) -> Self {
        self.autoplay = on;
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TimelineRole {
    Intro,
    Loop,
    Scroll,
}

pub(crate) struct PhaseController {
    pub(crate) owner: OwnerId,
    spec: PhaseSpec,
    pub(crate) machine: PhaseMachine,
    intro: Option<TimelineId>,
    idle: Option<TimelineId>,
    scroll: Option<TimelineId>,
    pub(crate) binding: Option<BindingId>,
}

impl PhaseController {
    pub(crate) fn forget_timeline(&mut self, role: TimelineRole, id: TimelineId) {
        let slot = match role {
            TimelineRole::Intro => &mut self.intro,
            TimelineRole::Loop => &mut self.idle,
            TimelineRole::Scroll => &mut self.scroll,
        };
        if *slot == Some(id) {
            *slot = None;
        }
    }

    fn factory(&self, role: TimelineRole) -> Option<&TimelineFactory> {
        match role {
            TimelineRole::Intro => self.spec.intro.as_ref(),
            TimelineRole::Loop => self.spec.idle.as_ref(),
            TimelineRole::Scroll => self.spec.scroll.as_ref().map(|s| &s.timeline),
        }
    }

    fn set_timeline(&mut self, role: TimelineRole, id: Option<TimelineId>) {
        match role {
            TimelineRole::Intro => self.intro = id,
            TimelineRole::Loop => self.idle = id,
            TimelineRole::Scroll => self.scroll = id,
        }
    }
}

/// Read-only view of a phase-controlled object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct ObjectView {
    /// Disposal scope.
    pub owner: OwnerId,
    /// Phase and "has played" guard.
    pub state: PhaseState,
    /// Running intro timeline.
    pub intro: Option<TimelineId>,
    /// Running loop timeline.
    pub idle: Option<TimelineId>,
    /// Scroll-bound timeline, kept while the object leaves and re-enters its region.
    pub scroll: Option<TimelineId>,
    /// Binding for the object's region.
    pub binding: Option<BindingId>,
}

impl<C: FrameClock> Scheduler<C> {
    /// Register a phase-controlled object. With autoplay it enters its intro on the next tick.
    pub fn add_object(&mut self, owner: OwnerId, spec: PhaseSpec) -> ScrublineResult<ObjectId> {
        self.require_owner(owner)?;
        let binding = match &spec.scroll {
            Some(s) => {
                Some(self.add_binding(owner, s.region.clone(), BindingMode::Scrub { timeline: None })?)
            }
            None => None,
        };
        let id = ObjectId(self.ids.next());
        let autoplay = spec.autoplay;
        self.objects.insert(
            id,
            PhaseController {
                owner,
                spec,
                machine: PhaseMachine::new(),
                intro: None,
                idle: None,
                scroll: None,
                binding,
            },
        );
        if autoplay {
            self.queue.push_back(Pending::Phase {
                object: id,
                event: PhaseEvent::Play,
            });
        }
        self.sync_clock();
        Ok(id)
    }

    /// Request the intro. Ignored after the first play until [`Scheduler::reset_object`].
    pub fn play_object(&mut self, id: ObjectId) -> bool {
        self.queue_phase_event(id, PhaseEvent::Play)
    }

    /// Return an object to `Idle`, killing its timelines, so it can play again.
    pub fn reset_object(&mut self, id: ObjectId) -> bool {
        self.queue_phase_event(id, PhaseEvent::Reset)
    }

    fn queue_phase_event(&mut self, object: ObjectId, event: PhaseEvent) -> bool {
        if !self.objects.contains_key(&object) {
            return false;
        }
        self.queue.push_back(Pending::Phase { object, event });
        self.sync_clock();
        true
    }

    /// Current phase of an object.
    pub fn object_phase(&self, id: ObjectId) -> Option<Phase> {
        self.objects.get(&id).map(|c| c.machine.phase())
    }

    /// Snapshot of an object's controller.
    pub fn object(&self, id: ObjectId) -> Option<ObjectView> {
        self.objects.get(&id).map(|c| ObjectView {
            owner: c.owner,
            state: c.machine.state(),
            intro: c.intro,
            idle: c.idle,
            scroll: c.scroll,
            binding: c.binding,
        })
    }

    /// Every registered object, in registration order.
    pub fn objects(&self) -> Vec<ObjectId> {
        self.objects.keys().copied().collect()
    }

    pub(crate) fn apply_phase_event(&mut self, object: ObjectId, event: PhaseEvent, host: &mut dyn Host) {
        let Some(ctrl) = self.objects.get_mut(&object) else {
            tracing::debug!(object = object.0, ?event, "phase event for unknown object");
            return;
        };
        let Some((from, to)) = ctrl.machine.fire(event) else {
            return;
        };
        tracing::debug!(object = object.0, ?from, ?to, ?event, "phase transition");
        self.events.push(EngineEvent::PhaseChanged { object, from, to });

        match (from, to) {
            (_, Phase::Idle) => {
                for role in [TimelineRole::Intro, TimelineRole::Loop, TimelineRole::Scroll] {
                    self.kill_role(object, role);
                }
            }
            (Phase::Idle, Phase::Intro) => self.start_intro(object, host, None),
            (Phase::Intro, Phase::Loop) => {
                self.events.push(EngineEvent::IntroFinished { object });
                self.kill_role(object, TimelineRole::Intro);
                self.start_role(object, TimelineRole::Loop, host);
                self.catch_up_scroll(object, host);
            }
            (Phase::Loop, Phase::ScrollBound) => {
                self.kill_role(object, TimelineRole::Loop);
                self.engage_scroll(object, host);
            }
            (Phase::ScrollBound, Phase::Loop) => {
                self.disengage_scroll(object);
                self.start_role(object, TimelineRole::Loop, host);
            }
            _ => {}
        }
    }

    fn role_timeline(&self, object: ObjectId, role: TimelineRole) -> Option<TimelineId> {
        let c = self.objects.get(&object)?;
        match role {
            TimelineRole::Intro => c.intro,
            TimelineRole::Loop => c.idle,
            TimelineRole::Scroll => c.scroll,
        }
    }

    fn kill_role(&mut self, object: ObjectId, role: TimelineRole) {
        if let Some(id) = self.role_timeline(object, role) {
            self.kill_quiet(id);
        }
        if let Some(c) = self.objects.get_mut(&object) {
            c.set_timeline(role, None);
        }
    }

    fn build_role(&self, object: ObjectId, role: TimelineRole, vp: &Viewport) -> Option<ScrublineResult<Timeline>> {
        let ctrl = self.objects.get(&object)?;
        let built = ctrl.factory(role)?(vp).and_then(|tl| {
            tl.validate()?;
            if role != TimelineRole::Loop && tl.is_infinite() {
                return Err(ScrublineError::animation(
                    "only loop timelines may repeat forever",
                ));
            }
            Ok(tl)
        });
        Some(built)
    }

    /// Build and register a role's timeline; `None` when there is no factory or it failed.
    fn start_role(&mut self, object: ObjectId, role: TimelineRole, host: &mut dyn Host) -> Option<TimelineId> {
        let vp = host.viewport();
        let tl = match self.build_role(object, role, &vp)? {
            Ok(tl) => tl,
            Err(e) => {
                tracing::warn!(object = object.0, ?role, error = %e, "phase timeline rejected");
                return None;
            }
        };
        let owner = self.objects.get(&object)?.owner;
        let state = match role {
            TimelineRole::Scroll => PlayState::Paused,
            TimelineRole::Intro | TimelineRole::Loop => PlayState::Playing,
        };
        let id = self.register_timeline(owner, tl, state, Some((object, role)));
        if role == TimelineRole::Scroll
            && let Some(slot) = self.timelines.get_mut(&id)
        {
            // Scrubbing renders it; an unscrubbed first render would fight the loop.
            slot.fresh = false;
        }
        if let Some(c) = self.objects.get_mut(&object) {
            c.set_timeline(role, Some(id));
        }
        Some(id)
    }

    fn start_intro(&mut self, object: ObjectId, host: &mut dyn Host, previous: Option<Timeline>) {
        match self.start_role(object, TimelineRole::Intro, host) {
            Some(id) => {
                if let (Some(prev), Some(slot)) = (previous, self.timelines.get_mut(&id)) {
                    slot.timeline.adopt_captures(&prev);
                }
            }
            // No intro (or a broken one): it completes right away.
            None => self.queue.push_back(Pending::Phase {
                object,
                event: PhaseEvent::IntroComplete,
            }),
        }
    }

    /// Kill an in-flight intro and rebuild it for the current viewport from its initial pose.
    pub(crate) fn restart_intro(&mut self, object: ObjectId, host: &mut dyn Host) {
        let previous = self
            .role_timeline(object, TimelineRole::Intro)
            .and_then(|id| self.timelines.get(&id))
            .map(|s| s.timeline.clone());
        self.kill_role(object, TimelineRole::Intro);
        tracing::debug!(object = object.0, "intro restarted after resize");
        self.start_intro(object, host, previous);
    }

    /// After the intro, engage straight away if scrolling already reached the region.
    fn catch_up_scroll(&mut self, object: ObjectId, host: &mut dyn Host) {
        let Some(b) = self
            .objects
            .get(&object)
            .and_then(|c| c.binding)
            .and_then(|id| self.bindings.get(&id))
        else {
            return;
        };
        if !b.has_sample() || b.zone() == Zone::Before {
            return;
        }
        let pinned = b.is_pinned();
        let entry = if b.zone() == Zone::After {
            ToggleEvent::EnterBackward
        } else {
            ToggleEvent::EnterForward
        };
        self.apply_phase_event(object, PhaseEvent::Toggle(entry), host);
        if pinned {
            self.apply_phase_event(object, PhaseEvent::PinEngaged, host);
        }
    }

    fn engage_scroll(&mut self, object: ObjectId, host: &mut dyn Host) {
        let Some(binding) = self.objects.get(&object).and_then(|c| c.binding) else {
            return;
        };
        let existing = self
            .role_timeline(object, TimelineRole::Scroll)
            .filter(|id| self.timelines.contains_key(id));
        let tl = match existing {
            Some(id) => {
                if let Some(slot) = self.timelines.get_mut(&id) {
                    // Re-read start values from wherever the loop left the target.
                    slot.timeline.invalidate_captures();
                }
                id
            }
            None => match self.start_role(object, TimelineRole::Scroll, host) {
                Some(id) => id,
                None => return,
            },
        };
        let progress = self.bindings.get_mut(&binding).and_then(|b| b.attach(tl));
        if let Some(p) = progress {
            self.scrub_timeline(tl, p, host);
        }
    }

    fn disengage_scroll(&mut self, object: ObjectId) {
        if let Some(b) = self
            .objects
            .get(&object)
            .and_then(|c| c.binding)
            .and_then(|id| self.bindings.get_mut(&id))
        {
            b.detach();
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/phase/controller.rs"]
mod tests;
