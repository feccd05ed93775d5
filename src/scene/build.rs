use crate::animation::target::{AnimatableHost, LayoutProvider};
use crate::engine::clock::ManualClock;
use crate::engine::scheduler::{EngineEvent, Scheduler};
use crate::foundation::core::{ObjectId, OwnerId, Viewport};
use crate::foundation::error::{ScrublineError, ScrublineResult};
use crate::phase::controller::PhaseSpec;
use crate::phase::machine::Phase;
use crate::scene::model::{ObjectDef, SceneDef, ScriptAction, TargetLookup};
use crate::scene::stage::{Stage, TargetSnapshot};
use crate::scroll::binding::BindingMode;
use crate::scroll::source::SmoothScroller;
use std::collections::BTreeMap;
use std::rc::Rc;

/// One simulated frame, as written to a trace.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct FrameRecord {
    /// Frame index, starting at 0.
    pub frame: u64,
    /// Simulation time in seconds.
    pub time: f64,
    /// Smoothed scroll offset rendered this frame.
    pub scroll: f64,
    /// Viewport after this frame's script actions.
    pub viewport: Viewport,
    /// Phase of every live object, by name.
    pub phases: BTreeMap<String, Phase>,
    /// Engine events, in emission order.
    pub events: Vec<EngineEvent>,
    /// Target state after the frame.
    pub targets: BTreeMap<String, TargetSnapshot>,
}

#[derive(Clone, Copy, Debug)]
struct ObjectHandle {
    id: ObjectId,
    owner: OwnerId,
}

/// Drives a [`SceneDef`] through a scheduler, a [`Stage`] and a [`SmoothScroller`].
///
/// Every object gets its own owner below a scene root, so a scripted `dispose` tears down one
/// object the way unmounting a component would.
pub struct Simulation {
    scene: SceneDef,
    stage: Stage,
    scheduler: Scheduler,
    scroller: SmoothScroller,
    objects: BTreeMap<String, ObjectHandle>,
    next_step: usize,
    frame: u64,
    time: f64,
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("frame", &self.frame)
            .field("time", &self.time)
            .field("objects", &self.objects.len())
            .field("scheduler", &self.scheduler)
            .finish()
    }
}

impl Simulation {
    /// Validate `scene`, mount its targets and register its objects.
    #[tracing::instrument(level = "debug", skip(scene), fields(objects = scene.objects.len(), triggers = scene.triggers.len()))]
    pub fn new(scene: SceneDef) -> ScrublineResult<Self> {
        scene.validate()?;
        let v = scene.viewport;
        let mut stage = Stage::new(v.width, v.height, v.document_height)?;
        let mut targets = TargetLookup::new();
        for (name, def) in &scene.targets {
            let id = stage.add_target(name.clone(), def.rect)?;
            for (key, value) in &def.props {
                stage.write(id, key, *value);
            }
            targets.insert(name.clone(), id);
        }
        let targets = Rc::new(targets);

        let mut scheduler = Scheduler::new(scene.engine.clone(), ManualClock::new())?;
        let mut scroller =
            SmoothScroller::new(scene.script.scroll_smoothing_secs, stage.max_scroll());
        scheduler.attach_scroll(&mut scroller);

        let root = scheduler.create_owner("scene");
        let mut objects = BTreeMap::new();
        for (index, def) in scene.objects.iter().enumerate() {
            let owner = scheduler.create_child_owner(root, def.name.clone())?;
            let seed = scene.engine.seed.wrapping_add(index as u64);
            let id = scheduler.add_object(owner, phase_spec(def, &targets, seed)?)?;
            objects.insert(def.name.clone(), ObjectHandle { id, owner });
        }
        let initial = stage.viewport();
        for def in &scene.triggers {
            let owner = scheduler.create_child_owner(root, def.name.clone())?;
            let timeline = def.timeline.build(&targets, &initial)?;
            let timeline = scheduler.add_timeline_paused(owner, timeline)?;
            let region = def.region.build(&targets)?;
            scheduler.add_binding(owner, region, BindingMode::actions(timeline, def.actions))?;
        }
        tracing::debug!(targets = targets.len(), "scene built");

        Ok(Self {
            scene,
            stage,
            scheduler,
            scroller,
            objects,
            next_step: 0,
            frame: 0,
            time: 0.0,
        })
    }

    /// The presentation state.
    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    /// The scheduler driving the scene.
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Handle of a live object.
    pub fn object(&self, name: &str) -> Option<ObjectId> {
        self.objects.get(name).map(|h| h.id)
    }

    /// Simulation time in seconds.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Apply due script actions, advance the scroller and tick the scheduler once.
    pub fn step(&mut self, dt: f64) -> ScrublineResult<FrameRecord> {
        let dt = dt.max(0.0);
        self.time += dt;
        while let Some(step) = self.scene.script.steps.get(self.next_step) {
            if step.at > self.time + 1e-9 {
                break;
            }
            let action = step.action.clone();
            self.next_step += 1;
            self.apply(&action)?;
        }

        self.scroller.tick(dt);
        self.stage.set_scroll(self.scroller.position());
        let events = self.scheduler.tick(dt, &mut self.stage);

        let phases = self
            .objects
            .iter()
            .filter_map(|(name, h)| Some((name.clone(), self.scheduler.object_phase(h.id)?)))
            .collect();
        let record = FrameRecord {
            frame: self.frame,
            time: self.time,
            scroll: self.stage.scroll(),
            viewport: self.stage.viewport(),
            phases,
            events,
            targets: self.stage.snapshot(),
        };
        self.frame += 1;
        Ok(record)
    }

    fn apply(&mut self, action: &ScriptAction) -> ScrublineResult<()> {
        tracing::debug!(time = self.time, ?action, "script action");
        match action {
            ScriptAction::ScrollTo {
                position,
                immediate,
            } => self.scroller.scroll_to(*position, *immediate),
            ScriptAction::ScrollBy { delta } => self.scroller.scroll_by(*delta),
            ScriptAction::Resize {
                width,
                height,
                document_height,
            } => {
                self.stage.resize(*width, *height, *document_height)?;
                self.scroller.set_max_scroll(self.stage.max_scroll());
            }
            ScriptAction::Reflow { target, rect } => {
                let id = self
                    .stage
                    .target_id(target)
                    .ok_or_else(|| ScrublineError::scene(format!("unknown target '{target}'")))?;
                self.stage.set_doc_bounds(id, *rect);
                self.scheduler.notify_resize();
            }
            ScriptAction::Play { object } => {
                if let Some(h) = self.objects.get(object) {
                    self.scheduler.play_object(h.id);
                }
            }
            ScriptAction::Reset { object } => {
                if let Some(h) = self.objects.get(object) {
                    self.scheduler.reset_object(h.id);
                }
            }
            ScriptAction::Dispose { object } => {
                if let Some(h) = self.objects.remove(object) {
                    self.scheduler.dispose(h.owner, &mut self.stage);
                }
            }
        }
        Ok(())
    }

    /// Run the whole script at `fps`, handing each frame to `sink`.
    ///
    /// Frame 0 is a zero-length tick at time 0; the last frame lands at or after the script's
    /// duration.
    #[tracing::instrument(level = "debug", skip(self, sink))]
    pub fn run_with(
        &mut self,
        fps: f64,
        mut sink: impl FnMut(&FrameRecord) -> ScrublineResult<()>,
    ) -> ScrublineResult<u64> {
        if !(fps.is_finite() && fps > 0.0) {
            return Err(ScrublineError::validation("fps must be finite and > 0"));
        }
        let frames = (self.scene.script.duration_secs * fps).ceil() as u64;
        let dt = 1.0 / fps;
        sink(&self.step(0.0)?)?;
        for _ in 0..frames {
            sink(&self.step(dt)?)?;
        }
        Ok(frames + 1)
    }

    /// Run the whole script at `fps` and collect every frame.
    pub fn run(&mut self, fps: f64) -> ScrublineResult<Vec<FrameRecord>> {
        let mut out = Vec::new();
        self.run_with(fps, |r| {
            out.push(r.clone());
            Ok(())
        })?;
        Ok(out)
    }
}

fn phase_spec(def: &ObjectDef, targets: &Rc<TargetLookup>, seed: u64) -> ScrublineResult<PhaseSpec> {
    let mut spec = PhaseSpec::new().autoplay(def.autoplay);
    if let Some(intro) = def.intro.clone() {
        let t = Rc::clone(targets);
        spec = spec.intro(move |vp| intro.build(&t, vp));
    }
    if let Some(idle) = def.idle.clone() {
        let t = Rc::clone(targets);
        spec = spec.idle(move |vp| idle.build(&t, vp, seed));
    }
    if let Some(scroll) = &def.scroll {
        let region = scroll.region.build(targets)?;
        let timeline = scroll.timeline.clone();
        let t = Rc::clone(targets);
        spec = spec.scroll(region, move |vp| timeline.build(&t, vp));
    }
    Ok(spec)
}

#[cfg(test)]
#[path = "../../tests/unit/scene/build.rs"]
mod tests;
