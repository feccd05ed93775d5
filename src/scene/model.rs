use crate::animation::ease::Ease;
use crate::animation::proc::{DriftSpec, Rng64, drift_loop};
use crate::animation::timeline::{Position, Timeline};
use crate::animation::tween::{Repeat, Tween};
use crate::animation::value::{PropValue, PropertyKey};
use crate::engine::opts::EngineOpts;
use crate::foundation::core::{Rect, TargetId, Viewport};
use crate::foundation::error::{ScrublineError, ScrublineResult};
use crate::scroll::binding::ToggleActions;
use crate::scroll::region::{Marker, Scrub, TriggerRegion};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Target names resolved to stage handles.
pub type TargetLookup = BTreeMap<String, TargetId>;

/// A scene file: viewport, targets, phase-controlled objects and a scroll/resize script.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SceneDef {
    /// Initial viewport and document size.
    pub viewport: ViewportDef,
    /// Engine options; defaults apply to omitted fields.
    #[serde(default)]
    pub engine: EngineOpts,
    /// Named targets with their document-space flow boxes.
    pub targets: BTreeMap<String, TargetDef>,
    /// Phase-controlled objects, registered in order.
    #[serde(default)]
    pub objects: Vec<ObjectDef>,
    /// Clock-driven timelines started and stopped by scroll regions.
    #[serde(default)]
    pub triggers: Vec<TriggerDef>,
    /// What the simulated viewer does.
    #[serde(default)]
    pub script: ScriptDef,
}

/// Viewport section of a scene file.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ViewportDef {
    /// Visible width in pixels.
    pub width: f64,
    /// Visible height in pixels.
    pub height: f64,
    /// Total document height in pixels.
    pub document_height: f64,
}

/// A named stage target.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetDef {
    /// Flow box in document coordinates.
    pub rect: Rect,
    /// Initial property values.
    #[serde(default)]
    pub props: BTreeMap<PropertyKey, PropValue>,
}

/// One object's intro, idle and scroll phases.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ObjectDef {
    /// Unique name, used by script actions and traces.
    pub name: String,
    /// Enter the intro on registration.
    #[serde(default = "default_true")]
    pub autoplay: bool,
    /// One-shot entrance; rebuilt when the viewport resizes mid-intro.
    #[serde(default)]
    pub intro: Option<TimelineDef>,
    /// Ambient loop.
    #[serde(default)]
    pub idle: Option<IdleDef>,
    /// Scroll-bound phase.
    #[serde(default)]
    pub scroll: Option<ScrollDef>,
}

fn default_true() -> bool {
    true
}

/// Ambient loop: an explicit timeline or seeded drift over a set of targets.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IdleDef {
    /// Explicit timeline; may repeat forever.
    Timeline(TimelineDef),
    /// Seeded floating motion, see [`drift_loop`].
    Drift {
        /// Targets that float.
        targets: Vec<String>,
        /// Amplitudes and periods.
        #[serde(default)]
        drift: DriftSpec,
    },
}

/// Region plus the timeline its progress scrubs.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScrollDef {
    /// Trigger region.
    pub region: RegionDef,
    /// Scrubbed timeline; must be finite.
    pub timeline: TimelineDef,
}

/// [`TriggerRegion`] with the anchor given by name.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegionDef {
    /// Anchor target name.
    pub anchor: String,
    /// Start marker (default `"top bottom"`).
    #[serde(default = "Marker::top_bottom")]
    pub start: Marker,
    /// End marker (default `"bottom top"`).
    #[serde(default = "Marker::bottom_top")]
    pub end: Marker,
    /// Region length in pixels after the start marker; overrides `end`.
    #[serde(default)]
    pub span: Option<f64>,
    /// Pin the anchor past the end marker.
    #[serde(default)]
    pub pin: bool,
    /// Scrub behavior.
    #[serde(default)]
    pub scrub: Scrub,
}

impl RegionDef {
    /// Resolve the anchor name and validate.
    pub fn build(&self, targets: &TargetLookup) -> ScrublineResult<TriggerRegion> {
        let region = TriggerRegion {
            anchor: lookup(targets, &self.anchor)?,
            start: self.start,
            end: self.end,
            span: self.span,
            pin: self.pin,
            scrub: self.scrub,
        };
        region.validate()?;
        Ok(region)
    }
}

/// A timeline that plays on the clock and is controlled by region transitions.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TriggerDef {
    /// Name used in logs and error messages.
    pub name: String,
    /// Region whose transitions drive the timeline; `scrub` is ignored.
    pub region: RegionDef,
    /// Timeline built once for the initial viewport.
    pub timeline: TimelineDef,
    /// Action per transition (default `"play none none none"`).
    #[serde(default)]
    pub actions: ToggleActions,
}

/// Serializable [`Timeline`] with targets given by name.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimelineDef {
    /// Children, placed in order.
    #[serde(default)]
    pub entries: Vec<EntryDef>,
    /// Repeat count.
    #[serde(default)]
    pub repeat: Repeat,
    /// Alternate direction between iterations.
    #[serde(default)]
    pub yoyo: bool,
    /// Pause between iterations.
    #[serde(default)]
    pub repeat_delay: f64,
}

/// One timeline child and where it goes.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EntryDef {
    /// Placement (default: after the previous entry).
    #[serde(default)]
    pub position: Position,
    /// The child itself.
    #[serde(flatten)]
    pub item: ItemDef,
}

/// Timeline child kinds.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ItemDef {
    /// Leaf interpolation.
    Tween(TweenDef),
    /// Nested timeline.
    Timeline(TimelineDef),
    /// Named cue.
    Cue {
        /// Cue name reported in events.
        name: String,
    },
    /// Named position.
    Label {
        /// Label name.
        name: String,
    },
    /// Tweens started `each` seconds apart.
    Stagger {
        /// Seconds between consecutive starts.
        each: f64,
        /// Tweens in start order.
        tweens: Vec<TweenDef>,
    },
}

/// Serializable [`Tween`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TweenDef {
    /// Target name.
    pub target: String,
    /// Seconds per iteration.
    pub duration: f64,
    /// End values; start values are captured from the target.
    #[serde(default)]
    pub to: BTreeMap<PropertyKey, ValueDef>,
    /// Start values; end values are captured from the target.
    #[serde(default)]
    pub from: BTreeMap<PropertyKey, ValueDef>,
    /// Explicit `[from, to]` pairs.
    #[serde(default)]
    pub from_to: BTreeMap<PropertyKey, (ValueDef, ValueDef)>,
    /// Offsets added to the captured start value.
    #[serde(default)]
    pub by: BTreeMap<PropertyKey, ValueDef>,
    /// Easing curve.
    #[serde(default)]
    pub ease: Ease,
    /// Lead-in before interpolation starts.
    #[serde(default)]
    pub delay: f64,
    /// Repeat count.
    #[serde(default)]
    pub repeat: Repeat,
    /// Alternate direction between iterations.
    #[serde(default)]
    pub yoyo: bool,
    /// Pause between iterations.
    #[serde(default)]
    pub repeat_delay: f64,
}

/// A property value, either literal or a multiple of the viewport size (`{"vh": 1.0}`).
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum ValueDef {
    /// `vw * width + vh * height`.
    Viewport(ViewportRelative),
    /// Literal value.
    Plain(PropValue),
}

/// Viewport-relative scalar.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ViewportRelative {
    /// Multiple of the viewport width.
    #[serde(default)]
    pub vw: f64,
    /// Multiple of the viewport height.
    #[serde(default)]
    pub vh: f64,
}

impl ValueDef {
    /// Value for `vp`.
    pub fn resolve(self, vp: &Viewport) -> PropValue {
        match self {
            Self::Viewport(r) => PropValue::Scalar(r.vw * vp.width + r.vh * vp.height),
            Self::Plain(v) => v,
        }
    }
}

impl From<f64> for ValueDef {
    fn from(v: f64) -> Self {
        Self::Plain(PropValue::Scalar(v))
    }
}

impl TweenDef {
    /// Build for the given viewport.
    pub fn build(&self, targets: &TargetLookup, vp: &Viewport) -> ScrublineResult<Tween> {
        let mut tween = Tween::new(lookup(targets, &self.target)?, self.duration)
            .ease(self.ease)
            .delay(self.delay)
            .repeat(self.repeat)
            .yoyo(self.yoyo)
            .repeat_delay(self.repeat_delay);
        for (key, v) in &self.to {
            tween = tween.to(key.clone(), v.resolve(vp));
        }
        for (key, v) in &self.from {
            tween = tween.from(key.clone(), v.resolve(vp));
        }
        for (key, (a, b)) in &self.from_to {
            tween = tween.from_to(key.clone(), a.resolve(vp), b.resolve(vp));
        }
        for (key, v) in &self.by {
            tween = tween.by(key.clone(), v.resolve(vp));
        }
        tween.validate()?;
        Ok(tween)
    }
}

impl TimelineDef {
    /// Build for the given viewport.
    pub fn build(&self, targets: &TargetLookup, vp: &Viewport) -> ScrublineResult<Timeline> {
        let mut tl = Timeline::new()
            .repeat(self.repeat)
            .yoyo(self.yoyo)
            .repeat_delay(self.repeat_delay);
        for entry in &self.entries {
            let pos = entry.position.clone();
            tl = match &entry.item {
                ItemDef::Tween(t) => tl.add(t.build(targets, vp)?, pos)?,
                ItemDef::Timeline(t) => tl.add(t.build(targets, vp)?, pos)?,
                ItemDef::Cue { name } => tl.cue(name.clone(), pos)?,
                ItemDef::Label { name } => tl.label(name.clone(), pos)?,
                ItemDef::Stagger { each, tweens } => {
                    let built = tweens
                        .iter()
                        .map(|t| t.build(targets, vp))
                        .collect::<ScrublineResult<Vec<_>>>()?;
                    tl.stagger(built, *each, pos)?
                }
            };
        }
        tl.validate()?;
        Ok(tl)
    }

    fn target_names<'a>(&'a self, out: &mut BTreeSet<&'a str>) {
        for entry in &self.entries {
            match &entry.item {
                ItemDef::Tween(t) => {
                    out.insert(&t.target);
                }
                ItemDef::Timeline(t) => t.target_names(out),
                ItemDef::Stagger { tweens, .. } => {
                    out.extend(tweens.iter().map(|t| t.target.as_str()));
                }
                ItemDef::Cue { .. } | ItemDef::Label { .. } => {}
            }
        }
    }
}

impl IdleDef {
    /// Build for the given viewport; drift is seeded so every rebuild is identical.
    pub fn build(&self, targets: &TargetLookup, vp: &Viewport, seed: u64) -> ScrublineResult<Timeline> {
        match self {
            Self::Timeline(t) => t.build(targets, vp),
            Self::Drift { targets: names, drift } => {
                let ids = names
                    .iter()
                    .map(|n| lookup(targets, n))
                    .collect::<ScrublineResult<Vec<_>>>()?;
                drift_loop(&ids, *drift, &mut Rng64::new(seed))
            }
        }
    }
}

/// Scripted viewer input.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScriptDef {
    /// Simulated seconds.
    pub duration_secs: f64,
    /// Time constant of the simulated smooth scroller (0 = raw input).
    pub scroll_smoothing_secs: f64,
    /// Actions, applied in time order.
    pub steps: Vec<ScriptStep>,
}

impl Default for ScriptDef {
    fn default() -> Self {
        Self {
            duration_secs: 5.0,
            scroll_smoothing_secs: 0.0,
            steps: Vec::new(),
        }
    }
}

/// A timed script action.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ScriptStep {
    /// Seconds from the start of the simulation.
    pub at: f64,
    /// What happens.
    #[serde(flatten)]
    pub action: ScriptAction,
}

/// Simulated viewer and page actions.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ScriptAction {
    /// Move the scroll target.
    ScrollTo {
        /// Document offset.
        position: f64,
        /// Skip smoothing.
        #[serde(default)]
        immediate: bool,
    },
    /// Wheel-style relative scroll.
    ScrollBy {
        /// Pixels; negative scrolls up.
        delta: f64,
    },
    /// Change viewport and document size.
    Resize {
        /// New viewport width.
        width: f64,
        /// New viewport height.
        height: f64,
        /// New document height.
        document_height: f64,
    },
    /// Move a target's flow box, then request invalidation.
    Reflow {
        /// Target name.
        target: String,
        /// New flow box in document coordinates.
        rect: Rect,
    },
    /// Request an object's intro.
    Play {
        /// Object name.
        object: String,
    },
    /// Return an object to idle.
    Reset {
        /// Object name.
        object: String,
    },
    /// Dispose an object's owner.
    Dispose {
        /// Object name.
        object: String,
    },
}

impl SceneDef {
    /// Parse a scene from JSON.
    pub fn from_reader<R: std::io::Read>(r: R) -> ScrublineResult<Self> {
        serde_json::from_reader(r).map_err(|e| ScrublineError::serde(format!("parse scene JSON: {e}")))
    }

    /// Parse a scene from a JSON string.
    pub fn from_json_str(s: &str) -> ScrublineResult<Self> {
        Self::from_reader(s.as_bytes())
    }

    /// Parse a scene from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> ScrublineResult<Self> {
        let path = path.as_ref();
        let f = File::open(path)
            .map_err(|e| ScrublineError::scene(format!("open scene '{}': {e}", path.display())))?;
        Self::from_reader(BufReader::new(f))
    }

    /// The initial viewport.
    pub fn initial_viewport(&self) -> ScrublineResult<Viewport> {
        let v = self.viewport;
        Viewport::new(v.width, v.height, 0.0, (v.document_height - v.height).max(0.0))
    }

    /// Stable stand-in handles, in name order, for validation builds.
    pub(crate) fn placeholder_targets(&self) -> TargetLookup {
        self.targets
            .keys()
            .enumerate()
            .map(|(i, name)| (name.clone(), TargetId(i as u32 + 1)))
            .collect()
    }

    /// Check references, numbers and that every timeline builds for the initial viewport.
    pub fn validate(&self) -> ScrublineResult<()> {
        self.engine.validate()?;
        let vp = self.initial_viewport()?;
        if !self.viewport.document_height.is_finite() {
            return Err(ScrublineError::scene("document_height must be finite"));
        }
        for (name, t) in &self.targets {
            let r = t.rect;
            if !(r.x0.is_finite() && r.y0.is_finite() && r.x1.is_finite() && r.y1.is_finite()) {
                return Err(ScrublineError::scene(format!("target '{name}': rect must be finite")));
            }
        }

        let targets = self.placeholder_targets();
        let mut names = BTreeSet::new();
        for obj in &self.objects {
            if !names.insert(obj.name.as_str()) {
                return Err(ScrublineError::scene(format!(
                    "duplicate object name '{}'",
                    obj.name
                )));
            }
            self.validate_object(obj, &targets, &vp)
                .map_err(|e| ScrublineError::scene(format!("object '{}': {e}", obj.name)))?;
        }
        let mut trigger_names = BTreeSet::new();
        for trigger in &self.triggers {
            if !trigger_names.insert(trigger.name.as_str()) {
                return Err(ScrublineError::scene(format!(
                    "duplicate trigger name '{}'",
                    trigger.name
                )));
            }
            self.validate_trigger(trigger, &targets, &vp)
                .map_err(|e| ScrublineError::scene(format!("trigger '{}': {e}", trigger.name)))?;
        }

        let s = &self.script;
        if !(s.duration_secs.is_finite() && s.duration_secs >= 0.0) {
            return Err(ScrublineError::scene("script duration_secs must be finite and >= 0"));
        }
        if !(s.scroll_smoothing_secs.is_finite() && s.scroll_smoothing_secs >= 0.0) {
            return Err(ScrublineError::scene(
                "script scroll_smoothing_secs must be finite and >= 0",
            ));
        }
        let mut last = 0.0;
        for (i, step) in s.steps.iter().enumerate() {
            if !(step.at.is_finite() && step.at >= last) {
                return Err(ScrublineError::scene(format!(
                    "script step {i}: 'at' must be finite and non-decreasing"
                )));
            }
            last = step.at;
            self.validate_action(&step.action, &names)
                .map_err(|e| ScrublineError::scene(format!("script step {i}: {e}")))?;
        }
        Ok(())
    }

    fn validate_object(&self, obj: &ObjectDef, targets: &TargetLookup, vp: &Viewport) -> ScrublineResult<()> {
        let mut referenced = BTreeSet::new();
        if let Some(intro) = &obj.intro {
            intro.target_names(&mut referenced);
        }
        if let Some(IdleDef::Timeline(t)) = &obj.idle {
            t.target_names(&mut referenced);
        }
        if let Some(IdleDef::Drift { targets: names, .. }) = &obj.idle {
            referenced.extend(names.iter().map(String::as_str));
        }
        if let Some(s) = &obj.scroll {
            referenced.insert(&s.region.anchor);
            s.timeline.target_names(&mut referenced);
        }
        if let Some(missing) = referenced.iter().find(|n| !self.targets.contains_key(**n)) {
            return Err(ScrublineError::scene(format!("unknown target '{missing}'")));
        }

        if let Some(intro) = &obj.intro
            && intro.build(targets, vp)?.is_infinite()
        {
            return Err(ScrublineError::animation("intro must be finite"));
        }
        if let Some(idle) = &obj.idle {
            idle.build(targets, vp, self.engine.seed)?;
        }
        if let Some(s) = &obj.scroll {
            s.region.build(targets)?;
            if s.region.scrub == Scrub::Off {
                return Err(ScrublineError::scroll("scroll phase needs scrub enabled"));
            }
            if s.timeline.build(targets, vp)?.is_infinite() {
                return Err(ScrublineError::animation("scroll timeline must be finite"));
            }
        }
        Ok(())
    }

    fn validate_trigger(&self, trigger: &TriggerDef, targets: &TargetLookup, vp: &Viewport) -> ScrublineResult<()> {
        trigger.region.build(targets)?;
        if trigger.timeline.build(targets, vp)?.is_infinite() {
            return Err(ScrublineError::animation("trigger timeline must be finite"));
        }
        Ok(())
    }

    fn validate_action(&self, action: &ScriptAction, objects: &BTreeSet<&str>) -> ScrublineResult<()> {
        match action {
            ScriptAction::ScrollTo { position, .. } if !position.is_finite() => {
                Err(ScrublineError::scene("scroll position must be finite"))
            }
            ScriptAction::ScrollBy { delta } if !delta.is_finite() => {
                Err(ScrublineError::scene("scroll delta must be finite"))
            }
            ScriptAction::Resize {
                width,
                height,
                document_height,
            } => {
                Viewport::new(*width, *height, 0.0, (document_height - height).max(0.0))?;
                Ok(())
            }
            ScriptAction::Reflow { target, .. } if !self.targets.contains_key(target) => {
                Err(ScrublineError::scene(format!("unknown target '{target}'")))
            }
            ScriptAction::Play { object }
            | ScriptAction::Reset { object }
            | ScriptAction::Dispose { object }
                if !objects.contains(object.as_str()) =>
            {
                Err(ScrublineError::scene(format!("unknown object '{object}'")))
            }
            _ => Ok(()),
        }
    }
}

fn lookup(targets: &TargetLookup, name: &str) -> ScrublineResult<TargetId> {
    targets
        .get(name)
        .copied()
        .ok_or_else(|| ScrublineError::scene(format!("unknown target '{name}'")))
}

#[cfg(test)]
#[path = "../../tests/unit/scene/model.rs"]
mod tests;
