//! Scrubline is a scroll-synchronized timeline animation engine.
//!
//! Property changes on abstract targets are described as tweens and timelines. Their playback is
//! driven by wall-clock time, by the scroll position of a viewport, or by both, and each animated
//! object moves through a small lifecycle (intro, ambient loop, scroll-bound, pinned).
//!
//! The public API is scheduler-oriented:
//!
//! - Describe motion with [`Tween`] and [`Timeline`]
//! - Register timelines, [`TriggerRegion`] bindings and [`PhaseSpec`] objects with a [`Scheduler`]
//! - Call [`Scheduler::tick`] once per display refresh with a [`Host`] (e.g. the in-memory
//!   [`Stage`]) and route the returned [`EngineEvent`]s
//! - [`Scheduler::dispose`] an owner to tear everything it registered down
//!
//! Scene files ([`SceneDef`]) and the [`Simulation`] runner drive the same engine from JSON; see
//! [`guide`] for an end-to-end walkthrough.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

pub(crate) mod animation;
pub(crate) mod engine;
pub(crate) mod phase;
pub(crate) mod scene;
pub(crate) mod scroll;

/// Architecture and usage walkthrough.
pub mod guide;

pub use crate::foundation::core::{
    BindingId, ListenerId, ObjectId, OwnerId, Point, Rect, Size, TargetId, TimelineId, Vec2,
    Viewport,
};
pub use crate::foundation::error::{ScrublineError, ScrublineResult};

pub use crate::animation::ease::Ease;
pub use crate::animation::proc::{DriftSpec, RandomSource, Rng64, drift_loop};
pub use crate::animation::target::{
    AnimatableHost, Host, LayoutProvider, PinPose, PinSurface, WriteSet,
};
pub use crate::animation::timeline::{Child, Position, Timeline};
pub use crate::animation::tween::{LoopMode, Repeat, Tween};
pub use crate::animation::value::{Lerp, PropValue, PropertyKey, Rgba8};

pub use crate::scroll::binding::{
    BindingMode, BindingSignal, ProgressCallback, ScrollBinding, ToggleAction, ToggleActions,
    ToggleCallback,
};
pub use crate::scroll::region::{
    Marker, ResolvedRegion, Scrub, ToggleEvent, TriggerRegion, Zone, zone_transitions,
};
pub use crate::scroll::source::{
    FrameScroll, ScrollDirection, ScrollProgressSource, ScrollSample, ScrollSource,
    SmoothScroller, Unsubscribe,
};

pub use crate::phase::controller::{ObjectView, PhaseSpec, ScrollPhase, TimelineFactory};
pub use crate::phase::machine::{Phase, PhaseEvent, PhaseMachine, PhaseState, transition};

pub use crate::engine::clock::{CancelHandle, FrameClock, ManualClock};
pub use crate::engine::opts::EngineOpts;
pub use crate::engine::scheduler::{
    EngineEvent, FrameCallback, FrameInfo, PlayState, Scheduler, SchedulerStats,
};

pub use crate::scene::build::{FrameRecord, Simulation};
pub use crate::scene::model::{
    EntryDef, IdleDef, ItemDef, ObjectDef, RegionDef, SceneDef, ScriptAction, ScriptDef,
    ScriptStep, ScrollDef, TargetDef, TargetLookup, TimelineDef, TriggerDef, TweenDef, ValueDef,
    ViewportDef, ViewportRelative,
};
pub use crate::scene::stage::{LayoutMode, Stage, TargetSnapshot};
