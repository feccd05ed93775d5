use crate::animation::target::{Host, MissingTargets};
use crate::animation::timeline::{Position, Timeline};
use crate::engine::clock::{CancelHandle, FrameClock, ManualClock};
use crate::engine::lifecycle::{Owners, ResizeDebounce};
use crate::engine::opts::EngineOpts;
use crate::foundation::core::{BindingId, IdSeq, ListenerId, ObjectId, OwnerId, TimelineId};
use crate::foundation::error::{ScrublineError, ScrublineResult};
use crate::phase::controller::{PhaseController, TimelineRole};
use crate::phase::machine::{Phase, PhaseEvent};
use crate::scroll::binding::{BindingMode, BindingSignal, ScrollBinding, Signals, ToggleAction};
use crate::scroll::region::{ToggleEvent, TriggerRegion};
use crate::scroll::source::{FrameScroll, ScrollProgressSource, ScrollSample, ScrollSource};
use std::collections::{BTreeMap, VecDeque};
use std::fmt;

/// Playback state of a registered timeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayState {
    /// Advanced by the frame clock.
    Playing,
    /// Held; only seeks and scroll bindings move the playhead.
    Paused,
    /// Reached its end (or its start when reversed).
    Completed,
}

/// Observable outcome of a tick.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EngineEvent {
    /// An object's phase changed.
    PhaseChanged {
        /// Object.
        object: ObjectId,
        /// Phase left.
        from: Phase,
        /// Phase entered.
        to: Phase,
    },
    /// An object's intro finished (or was skipped); dependent content may be revealed.
    IntroFinished {
        /// Object.
        object: ObjectId,
    },
    /// Playback crossed a cue.
    Cue {
        /// Timeline containing the cue.
        timeline: TimelineId,
        /// Cue name.
        name: String,
    },
    /// A binding's region changed zone.
    Toggle {
        /// Binding.
        binding: BindingId,
        /// Transition.
        event: ToggleEvent,
    },
    /// A binding pinned its anchor.
    PinEngaged {
        /// Binding.
        binding: BindingId,
    },
    /// A binding released its anchor.
    PinReleased {
        /// Binding.
        binding: BindingId,
    },
    /// A timeline ran to its end, or back to its start when reversed.
    TimelineCompleted {
        /// Timeline.
        timeline: TimelineId,
        /// `true` when it completed while playing backward.
        reversed: bool,
    },
}

/// What frame listeners see.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameInfo {
    /// Scheduler time in seconds.
    pub time: f64,
    /// Clamped time step of this frame.
    pub dt: f64,
    /// Scroll snapshot shared by every binding this frame.
    pub scroll: Option<FrameScroll>,
}

/// Per-frame callback.
pub type FrameCallback = Box<dyn FnMut(&FrameInfo, &mut dyn Host)>;

pub(crate) struct Listener {
    pub(crate) owner: OwnerId,
    callback: FrameCallback,
}

/// Counters for auditing a scheduler.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct SchedulerStats {
    /// Ticks processed.
    pub frames: u64,
    /// Timelines removed by kill or disposal.
    pub timelines_killed: u64,
    /// Bindings removed.
    pub bindings_removed: u64,
    /// Listeners removed.
    pub listeners_removed: u64,
    /// Events dropped because same-tick chaining exceeded `max_event_rounds`.
    pub events_dropped: u64,
}

pub(crate) struct TimelineSlot {
    pub(crate) timeline: Timeline,
    pub(crate) owner: OwnerId,
    pub(crate) state: PlayState,
    pub(crate) reversed: bool,
    pub(crate) time_scale: f64,
    pub(crate) role: Option<(ObjectId, TimelineRole)>,
    /// Render at the current playhead before the next advance.
    pub(crate) fresh: bool,
    /// Report cues sitting exactly on the playhead on the next advance.
    pub(crate) include_from: bool,
    pub(crate) auto_remove: bool,
}

#[derive(Clone, Debug)]
pub(crate) enum Pending {
    Completed {
        timeline: TimelineId,
        reversed: bool,
    },
    Signal {
        binding: BindingId,
        signal: BindingSignal,
    },
    Phase {
        object: ObjectId,
        event: PhaseEvent,
    },
}

/// Explicit owner of every timeline, binding, listener and phase-controlled object.
///
/// One scheduler services everything once per display refresh, in registration order:
///
/// 1. advance playing timelines and render them
/// 2. let every binding classify the same scroll sample (scrub, transitions, pinning)
/// 3. route completions and transitions to phase controllers, rendering any timeline they start
///    within the same tick
/// 4. run frame listeners
///
/// While there is live work a single frame request is kept outstanding on the [`FrameClock`].
pub struct Scheduler<C: FrameClock = ManualClock> {
    pub(crate) opts: EngineOpts,
    clock: C,
    frame: Option<CancelHandle>,
    pub(crate) ids: IdSeq,
    time: f64,
    scroll: ScrollProgressSource,
    pub(crate) timelines: BTreeMap<TimelineId, TimelineSlot>,
    pub(crate) bindings: BTreeMap<BindingId, ScrollBinding>,
    pub(crate) listeners: BTreeMap<ListenerId, Listener>,
    pub(crate) objects: BTreeMap<ObjectId, PhaseController>,
    pub(crate) owners: Owners,
    pub(crate) resize: ResizeDebounce,
    pub(crate) missing: MissingTargets,
    pub(crate) queue: VecDeque<Pending>,
    pub(crate) events: Vec<EngineEvent>,
    pub(crate) stats: SchedulerStats,
}

impl<C: FrameClock> fmt::Debug for Scheduler<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("time", &self.time)
            .field("timelines", &self.timelines.len())
            .field("bindings", &self.bindings.len())
            .field("listeners", &self.listeners.len())
            .field("objects", &self.objects.len())
            .field("stats", &self.stats)
            .finish()
    }
}

impl Scheduler<ManualClock> {
    /// Scheduler with default options and a [`ManualClock`].
    pub fn manual() -> Self {
        Self::from_parts(EngineOpts::default(), ManualClock::new())
    }
}

impl<C: FrameClock> Scheduler<C> {
    /// Create a scheduler with validated options.
    pub fn new(opts: EngineOpts, clock: C) -> ScrublineResult<Self> {
        opts.validate()?;
        Ok(Self::from_parts(opts, clock))
    }

    fn from_parts(opts: EngineOpts, clock: C) -> Self {
        Self {
            opts,
            clock,
            frame: None,
            ids: IdSeq::default(),
            time: 0.0,
            scroll: ScrollProgressSource::detached(),
            timelines: BTreeMap::new(),
            bindings: BTreeMap::new(),
            listeners: BTreeMap::new(),
            objects: BTreeMap::new(),
            owners: Owners::default(),
            resize: ResizeDebounce::default(),
            missing: MissingTargets::default(),
            queue: VecDeque::new(),
            events: Vec::new(),
            stats: SchedulerStats::default(),
        }
    }

    /// Options in effect.
    pub fn opts(&self) -> &EngineOpts {
        &self.opts
    }

    /// The frame clock.
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Scheduler time in seconds (sum of clamped frame steps).
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Audit counters.
    pub fn stats(&self) -> SchedulerStats {
        self.stats
    }

    /// Subscribe to an external scroll source, replacing any previous one.
    pub fn attach_scroll(&mut self, source: &mut dyn ScrollSource) {
        self.scroll = ScrollProgressSource::attach(source);
    }

    /// Feed a scroll sample directly (for embedders without a [`ScrollSource`]).
    pub fn push_scroll(&mut self, sample: ScrollSample) {
        self.scroll.push(sample);
    }

    /// Scroll snapshot of the last tick.
    pub fn scroll_frame(&self) -> Option<FrameScroll> {
        self.scroll.current()
    }

    /// Number of live registrations: timelines, bindings, listeners and objects.
    ///
    /// Zero after everything has been disposed.
    pub fn registrations(&self) -> usize {
        self.timelines.len() + self.bindings.len() + self.listeners.len() + self.objects.len()
    }

    /// Return `true` while something needs another frame.
    pub fn needs_frames(&self) -> bool {
        !self.bindings.is_empty()
            || !self.listeners.is_empty()
            || !self.queue.is_empty()
            || self.resize.is_pending()
            || self
                .timelines
                .values()
                .any(|s| s.fresh || s.state == PlayState::Playing)
    }

    /// Keep exactly one frame request outstanding while there is work, none otherwise.
    pub(crate) fn sync_clock(&mut self) {
        match (self.needs_frames(), self.frame) {
            (true, None) => self.frame = Some(self.clock.request_frame()),
            (false, Some(h)) => {
                self.clock.cancel(h);
                self.frame = None;
            }
            _ => {}
        }
    }

    pub(crate) fn require_owner(&self, owner: OwnerId) -> ScrublineResult<()> {
        if self.owners.is_live(owner) {
            Ok(())
        } else {
            Err(ScrublineError::validation(format!(
                "owner {} is not live",
                owner.0
            )))
        }
    }

    // ---- timelines ----

    /// Register a finite timeline and start playing it on the next tick.
    pub fn add_timeline(&mut self, owner: OwnerId, timeline: Timeline) -> ScrublineResult<TimelineId> {
        self.add_checked(owner, timeline, PlayState::Playing)
    }

    /// Register a finite timeline without playing it.
    pub fn add_timeline_paused(
        &mut self,
        owner: OwnerId,
        timeline: Timeline,
    ) -> ScrublineResult<TimelineId> {
        self.add_checked(owner, timeline, PlayState::Paused)
    }

    fn add_checked(
        &mut self,
        owner: OwnerId,
        timeline: Timeline,
        state: PlayState,
    ) -> ScrublineResult<TimelineId> {
        self.require_owner(owner)?;
        timeline.validate()?;
        if timeline.is_infinite() {
            return Err(ScrublineError::animation(
                "infinitely repeating timelines may only run as an object's loop phase",
            ));
        }
        Ok(self.register_timeline(owner, timeline, state, None))
    }

    pub(crate) fn register_timeline(
        &mut self,
        owner: OwnerId,
        timeline: Timeline,
        state: PlayState,
        role: Option<(ObjectId, TimelineRole)>,
    ) -> TimelineId {
        let id = TimelineId(self.ids.next());
        let include_from = timeline.playhead() == 0.0;
        self.timelines.insert(
            id,
            TimelineSlot {
                timeline,
                owner,
                state,
                reversed: false,
                time_scale: 1.0,
                role,
                fresh: true,
                include_from,
                auto_remove: false,
            },
        );
        self.sync_clock();
        id
    }

    /// Fire cue `name` after `delay` seconds. Cancelled like any timeline, via [`Scheduler::kill`].
    pub fn delayed_call(
        &mut self,
        owner: OwnerId,
        delay: f64,
        name: impl Into<String>,
    ) -> ScrublineResult<TimelineId> {
        if !(delay.is_finite() && delay >= 0.0) {
            return Err(ScrublineError::validation("delay must be finite and >= 0"));
        }
        let tl = Timeline::new().cue(name, Position::at(delay))?;
        let id = self.add_timeline(owner, tl)?;
        if let Some(slot) = self.timelines.get_mut(&id) {
            slot.auto_remove = true;
        }
        Ok(id)
    }

    /// Borrow a registered timeline.
    pub fn timeline(&self, id: TimelineId) -> Option<&Timeline> {
        self.timelines.get(&id).map(|s| &s.timeline)
    }

    /// Playback state of a registered timeline.
    pub fn play_state(&self, id: TimelineId) -> Option<PlayState> {
        self.timelines.get(&id).map(|s| s.state)
    }

    /// Current playhead of a registered timeline.
    pub fn playhead(&self, id: TimelineId) -> Option<f64> {
        self.timelines.get(&id).map(|s| s.timeline.playhead())
    }

    /// Return `true` while `id` is registered.
    pub fn is_active(&self, id: TimelineId) -> bool {
        self.timelines.contains_key(&id)
    }

    /// Resume playback in the current direction.
    pub fn play(&mut self, id: TimelineId) -> bool {
        let Some(slot) = self.timelines.get_mut(&id) else {
            return false;
        };
        slot.state = PlayState::Playing;
        self.sync_clock();
        true
    }

    /// Hold the playhead.
    pub fn pause(&mut self, id: TimelineId) -> bool {
        let Some(slot) = self.timelines.get_mut(&id) else {
            return false;
        };
        if slot.state == PlayState::Playing {
            slot.state = PlayState::Paused;
        }
        self.sync_clock();
        true
    }

    /// Flip the playback direction and play.
    pub fn reverse(&mut self, id: TimelineId) -> bool {
        let Some(slot) = self.timelines.get_mut(&id) else {
            return false;
        };
        slot.reversed = !slot.reversed;
        slot.state = PlayState::Playing;
        self.sync_clock();
        true
    }

    /// Rewind to the start and play forward.
    pub fn restart(&mut self, id: TimelineId) -> bool {
        let Some(slot) = self.timelines.get_mut(&id) else {
            return false;
        };
        slot.timeline.store_playhead(0.0);
        slot.reversed = false;
        slot.state = PlayState::Playing;
        slot.fresh = true;
        slot.include_from = true;
        self.sync_clock();
        true
    }

    /// Move the playhead to `t` and render immediately. Cues are not reported.
    pub fn seek(&mut self, id: TimelineId, t: f64, host: &mut dyn Host) -> bool {
        let Some(slot) = self.timelines.get_mut(&id) else {
            return false;
        };
        let t = slot.timeline.store_playhead(t);
        slot.include_from = t == 0.0;
        slot.fresh = false;
        render_slot(slot, host, &mut self.missing);
        true
    }

    /// Scale the speed at which the clock advances `id`.
    pub fn set_time_scale(&mut self, id: TimelineId, scale: f64) -> ScrublineResult<bool> {
        if !(scale.is_finite() && scale > 0.0) {
            return Err(ScrublineError::validation("time scale must be finite and > 0"));
        }
        Ok(match self.timelines.get_mut(&id) {
            Some(slot) => {
                slot.time_scale = scale;
                true
            }
            None => false,
        })
    }

    /// Stop and unregister a timeline. Target state already written stays as is.
    ///
    /// Killing an unknown or already-killed timeline is a no-op returning `false`.
    pub fn kill(&mut self, id: TimelineId) -> bool {
        let killed = self.kill_quiet(id);
        if !killed {
            tracing::debug!(timeline = id.0, "kill of inactive timeline ignored");
        }
        self.sync_clock();
        killed
    }

    pub(crate) fn kill_quiet(&mut self, id: TimelineId) -> bool {
        let Some(slot) = self.timelines.remove(&id) else {
            return false;
        };
        self.stats.timelines_killed += 1;
        for b in self.bindings.values_mut() {
            if b.timeline() == Some(id) {
                b.detach();
            }
        }
        if let Some((object, role)) = slot.role
            && let Some(ctrl) = self.objects.get_mut(&object)
        {
            ctrl.forget_timeline(role, id);
        }
        tracing::debug!(timeline = id.0, "timeline killed");
        true
    }

    fn apply_toggle_action(&mut self, id: TimelineId, action: ToggleAction, host: &mut dyn Host) {
        if action == ToggleAction::None {
            return;
        }
        if action == ToggleAction::Restart {
            self.restart(id);
            return;
        }
        let Some(slot) = self.timelines.get_mut(&id) else {
            return;
        };
        let at = slot.timeline.playhead();
        let total = slot.timeline.total_duration();
        tracing::debug!(timeline = id.0, ?action, "toggle action");
        match action {
            ToggleAction::Play if at < total => {
                slot.reversed = false;
                slot.state = PlayState::Playing;
            }
            ToggleAction::Reverse if at > 0.0 => {
                slot.reversed = true;
                slot.state = PlayState::Playing;
            }
            ToggleAction::Resume if slot.state == PlayState::Paused => {
                slot.state = PlayState::Playing;
            }
            ToggleAction::Pause if slot.state == PlayState::Playing => {
                slot.state = PlayState::Paused;
            }
            ToggleAction::Reset | ToggleAction::Complete => {
                let t = if action == ToggleAction::Reset { 0.0 } else { total };
                slot.timeline.store_playhead(t);
                slot.reversed = false;
                slot.state = PlayState::Paused;
                slot.include_from = t == 0.0;
                slot.fresh = false;
                render_slot(slot, host, &mut self.missing);
            }
            _ => {}
        }
    }

    pub(crate) fn scrub_timeline(&mut self, id: TimelineId, progress: f64, host: &mut dyn Host) {
        let Some(slot) = self.timelines.get_mut(&id) else {
            return;
        };
        let from = slot.timeline.playhead();
        let total = slot.timeline.total_duration();
        let to = slot.timeline.store_playhead(progress * total);
        let mut names = Vec::new();
        slot.timeline.crossed_cues(from, to, slot.include_from && to > from, &mut names);
        slot.include_from = false;
        slot.fresh = false;
        render_slot(slot, host, &mut self.missing);
        self.events
            .extend(names.into_iter().map(|name| EngineEvent::Cue { timeline: id, name }));
    }

    // ---- bindings ----

    /// Register a scroll binding. A scrubbed timeline is paused so only scroll moves it.
    pub fn add_binding(
        &mut self,
        owner: OwnerId,
        region: TriggerRegion,
        mode: BindingMode,
    ) -> ScrublineResult<BindingId> {
        self.require_owner(owner)?;
        if let BindingMode::Scrub { timeline: Some(tl) }
        | BindingMode::Actions {
            timeline: Some(tl), ..
        } = &mode
        {
            let slot = self.timelines.get_mut(tl).ok_or_else(|| {
                ScrublineError::scroll(format!("bound timeline {} is not registered", tl.0))
            })?;
            slot.state = PlayState::Paused;
        }
        let binding = ScrollBinding::new(region, mode, owner)?;
        let id = BindingId(self.ids.next());
        self.bindings.insert(id, binding);
        self.sync_clock();
        Ok(id)
    }

    /// Borrow a binding.
    pub fn binding(&self, id: BindingId) -> Option<&ScrollBinding> {
        self.bindings.get(&id)
    }

    /// Unregister a binding, returning a pinned anchor to flow positioning.
    pub fn remove_binding(&mut self, id: BindingId, host: &mut dyn Host) -> bool {
        let removed = self.remove_binding_quiet(id, host);
        self.sync_clock();
        removed
    }

    pub(crate) fn remove_binding_quiet(&mut self, id: BindingId, host: &mut dyn Host) -> bool {
        let Some(mut b) = self.bindings.remove(&id) else {
            return false;
        };
        self.stats.bindings_removed += 1;
        if b.is_pinned() && !b.release_pin(host) {
            self.missing.report(b.region().anchor, "unpin on removal");
        }
        for ctrl in self.objects.values_mut() {
            if ctrl.binding == Some(id) {
                ctrl.binding = None;
            }
        }
        true
    }

    // ---- listeners ----

    /// Register a per-frame callback.
    pub fn add_listener(
        &mut self,
        owner: OwnerId,
        callback: impl FnMut(&FrameInfo, &mut dyn Host) + 'static,
    ) -> ScrublineResult<ListenerId> {
        self.require_owner(owner)?;
        let id = ListenerId(self.ids.next());
        self.listeners.insert(
            id,
            Listener {
                owner,
                callback: Box::new(callback),
            },
        );
        self.sync_clock();
        Ok(id)
    }

    /// Unregister a per-frame callback.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let removed = self.listeners.remove(&id).is_some();
        if removed {
            self.stats.listeners_removed += 1;
        }
        self.sync_clock();
        removed
    }

    // ---- frame pass ----

    /// Run one frame. `dt` is clamped to `[0, max_frame_dt_secs]`.
    #[tracing::instrument(level = "trace", skip(self, host), fields(time = self.time))]
    pub fn tick(&mut self, dt: f64, host: &mut dyn Host) -> Vec<EngineEvent> {
        // The outstanding request is the frame being serviced now.
        if let Some(h) = self.frame.take() {
            self.clock.cancel(h);
        }
        let dt = if dt.is_finite() {
            dt.clamp(0.0, self.opts.max_frame_dt_secs)
        } else {
            0.0
        };
        self.time += dt;
        self.stats.frames += 1;

        let frame = self.scroll.begin_frame();
        if self
            .resize
            .poll(host.viewport(), self.time, self.opts.resize_debounce_secs)
        {
            self.invalidate(host);
        }

        self.advance_timelines(dt, host);
        if let Some(frame) = &frame {
            self.step_bindings(frame, dt, host);
        }
        self.drain(host);

        let info = FrameInfo {
            time: self.time,
            dt,
            scroll: frame,
        };
        for l in self.listeners.values_mut() {
            (l.callback)(&info, &mut *host);
        }

        self.sync_clock();
        std::mem::take(&mut self.events)
    }

    fn advance_timelines(&mut self, dt: f64, host: &mut dyn Host) {
        for (&id, slot) in self.timelines.iter_mut() {
            if slot.fresh {
                slot.fresh = false;
                render_slot(slot, host, &mut self.missing);
                continue;
            }
            if slot.state != PlayState::Playing {
                continue;
            }
            let from = slot.timeline.playhead();
            let step = dt * slot.time_scale;
            let to = slot
                .timeline
                .store_playhead(if slot.reversed { from - step } else { from + step });

            let mut names = Vec::new();
            slot.timeline
                .crossed_cues(from, to, slot.include_from, &mut names);
            slot.include_from = false;
            render_slot(slot, host, &mut self.missing);
            self.events
                .extend(names.into_iter().map(|name| EngineEvent::Cue { timeline: id, name }));

            let done = if slot.reversed {
                to <= 0.0
            } else {
                to >= slot.timeline.total_duration()
            };
            if done {
                slot.state = PlayState::Completed;
                self.queue.push_back(Pending::Completed {
                    timeline: id,
                    reversed: slot.reversed,
                });
            }
        }
    }

    fn step_bindings(&mut self, frame: &FrameScroll, dt: f64, host: &mut dyn Host) {
        let smoothing = self.opts.default_scrub_smoothing_secs;
        let ids: Vec<BindingId> = self.bindings.keys().copied().collect();
        for id in ids {
            let Some(b) = self.bindings.get_mut(&id) else {
                continue;
            };
            let mut signals = Signals::new();
            let request = b.step(frame, dt, smoothing, &mut *host, &mut signals);
            if b.resolved().is_none() {
                self.missing.report(b.region().anchor, "trigger region anchor");
            }
            let actions = b.toggle_actions();
            for signal in signals {
                if let (BindingSignal::Toggle(event), Some((tl, set))) = (signal, actions) {
                    self.apply_toggle_action(tl, set.action_for(event), host);
                }
                self.events.push(match signal {
                    BindingSignal::Toggle(event) => EngineEvent::Toggle { binding: id, event },
                    BindingSignal::PinEngaged => EngineEvent::PinEngaged { binding: id },
                    BindingSignal::PinReleased => EngineEvent::PinReleased { binding: id },
                });
                self.queue.push_back(Pending::Signal {
                    binding: id,
                    signal,
                });
            }
            if let Some((tl, progress)) = request {
                self.scrub_timeline(tl, progress, host);
            }
        }
    }

    /// Route queued completions and transitions until quiet, bounded by `max_event_rounds`.
    fn drain(&mut self, host: &mut dyn Host) {
        let mut rounds = 0u32;
        while !self.queue.is_empty() {
            if rounds >= self.opts.max_event_rounds {
                let dropped = self.queue.len();
                tracing::warn!(dropped, rounds, "event chaining did not settle; dropping");
                self.stats.events_dropped += dropped as u64;
                self.queue.clear();
                break;
            }
            rounds += 1;
            let batch: Vec<Pending> = self.queue.drain(..).collect();
            for p in batch {
                self.dispatch(p, host);
            }
            self.render_fresh(host);
        }
    }

    fn render_fresh(&mut self, host: &mut dyn Host) {
        for slot in self.timelines.values_mut() {
            if slot.fresh {
                slot.fresh = false;
                render_slot(slot, host, &mut self.missing);
            }
        }
    }

    fn dispatch(&mut self, pending: Pending, host: &mut dyn Host) {
        match pending {
            Pending::Completed { timeline, reversed } => {
                self.events.push(EngineEvent::TimelineCompleted { timeline, reversed });
                let Some(slot) = self.timelines.get(&timeline) else {
                    return;
                };
                let role = slot.role;
                if slot.auto_remove {
                    self.kill_quiet(timeline);
                }
                if let Some((object, TimelineRole::Intro)) = role
                    && !reversed
                {
                    self.apply_phase_event(object, PhaseEvent::IntroComplete, host);
                }
            }
            Pending::Signal { binding, signal } => {
                let object = self
                    .objects
                    .iter()
                    .find(|(_, c)| c.binding == Some(binding))
                    .map(|(&id, _)| id);
                if let Some(object) = object {
                    let event = match signal {
                        BindingSignal::Toggle(ev) => PhaseEvent::Toggle(ev),
                        BindingSignal::PinEngaged => PhaseEvent::PinEngaged,
                        BindingSignal::PinReleased => PhaseEvent::PinReleased,
                    };
                    self.apply_phase_event(object, event, host);
                }
            }
            Pending::Phase { object, event } => self.apply_phase_event(object, event, host),
        }
    }
}

pub(crate) fn render_slot(slot: &mut TimelineSlot, host: &mut dyn Host, missing: &mut MissingTargets) {
    let t = slot.timeline.playhead();
    let gone = slot.timeline.set_playhead(t, host);
    missing.report_all(&gone, "timeline render");
}

#[cfg(test)]
#[path = "../../tests/unit/engine/scheduler.rs"]
mod tests;
