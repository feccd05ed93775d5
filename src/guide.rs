//! # Scrubline guide
//!
//! A walkthrough of scrubline's architecture and public API. For copy/paste commands, start with
//! the repository `README.md`.
//!
//! ---
//!
//! ## Core concepts
//!
//! - [`PropertyKey`](crate::PropertyKey) / [`PropValue`](crate::PropValue): what a tween writes
//!   (scalars, 2D vectors, colors)
//! - [`Tween`](crate::Tween): one target, one or more properties, a duration, an
//!   [`Ease`](crate::Ease) and an optional [`Repeat`](crate::Repeat)
//! - [`Timeline`](crate::Timeline): tweens, nested timelines, cues and labels placed with a
//!   [`Position`](crate::Position) and driven by a single playhead
//! - [`TriggerRegion`](crate::TriggerRegion): a span of document scroll defined by two
//!   [`Marker`](crate::Marker)s on an anchor target
//! - [`PhaseSpec`](crate::PhaseSpec): an object's intro, ambient loop and scroll-bound timelines
//! - [`Scheduler`](crate::Scheduler): owns every registration and advances them once per tick
//! - [`Host`](crate::Host): where property writes land and where layout is read from;
//!   [`Stage`](crate::Stage) is the in-memory implementation
//!
//! Timelines never own their targets. They hold [`TargetId`](crate::TargetId)s and write through
//! the host each time their playhead moves, so seeking backwards is exact and a removed target
//! simply turns writes into no-ops.
//!
//! ---
//!
//! ## Placing children
//!
//! A timeline's children are laid out at insertion time:
//!
//! - [`Position::AfterPrevious`](crate::Position::AfterPrevious) (the default) appends after the
//!   previous child ends
//! - [`Position::WithPrevious`](crate::Position::WithPrevious) starts relative to the previous
//!   child's start
//! - [`Position::Absolute`](crate::Position::Absolute) and
//!   [`Position::Label`](crate::Position::Label) pin a child to a fixed time
//!
//! Rendering a playhead visits children in start order, so where started children overlap the
//! later one wins. Children that have not started only fill properties nobody else wrote in the
//! same pass.
//!
//! ---
//!
//! ## One tick
//!
//! [`Scheduler::tick`](crate::Scheduler::tick) runs the same steps every frame:
//!
//! 1. Clamp `dt` to [`EngineOpts::max_frame_dt_secs`](crate::EngineOpts::max_frame_dt_secs)
//! 2. Take the newest scroll sample (intermediate samples are coalesced)
//! 3. Poll the resize debounce; recompute regions and restart viewport-dependent intros when it
//!    settles
//! 4. Advance playing timelines by `dt * time_scale`
//! 5. Step every binding against the scroll sample: zone changes, progress, pinning
//! 6. Drain completion and phase events, re-rendering any timeline they started
//! 7. Notify frame listeners
//!
//! Everything a tick does is reported as [`EngineEvent`](crate::EngineEvent)s in emission order.
//! A timeline registered mid-frame renders its first pose in the same tick without advancing.
//!
//! Once only paused or completed timelines remain (no bindings, listeners, queued events or
//! running debounce), [`Scheduler::needs_frames`](crate::Scheduler::needs_frames) turns false
//! and the scheduler releases its frame request on the [`FrameClock`](crate::FrameClock).
//!
//! ---
//!
//! ## Scroll regions
//!
//! A marker pairs a point on the anchor (`top`, `center`, `bottom` or a fraction) with a point on
//! the viewport. The region starts where the first pair meets and ends where the second does.
//! Scroll positions fall into one of three [`Zone`](crate::Zone)s; crossing a boundary yields
//! [`ToggleEvent`](crate::ToggleEvent)s, two of them when a single sample jumps across the whole
//! region.
//!
//! [`Scrub::Direct`](crate::Scrub::Direct) sets a bound timeline's playhead from progress exactly;
//! [`Scrub::Smoothed`](crate::Scrub::Smoothed) eases towards it over a time constant. When a region
//! pins, its anchor is held in place on screen while the scroll is inside the region.
//!
//! A binding in [`BindingMode::Actions`](crate::BindingMode::Actions) leaves the timeline on the
//! clock and maps each transition to a [`ToggleAction`](crate::ToggleAction), written as four
//! words such as `"play none none reverse"`.
//!
//! ---
//!
//! ## Phases
//!
//! Each object added with [`Scheduler::add_object`](crate::Scheduler::add_object) runs a
//! [`PhaseMachine`](crate::PhaseMachine). The transition table is a pure function,
//! [`transition`](crate::transition):
//!
//! - `Idle` -> `Intro` on play (once; later plays are ignored until a reset)
//! - `Intro` -> `Loop` when the intro completes
//! - `Loop` -> `ScrollBound` when the scroll enters the object's region
//! - `ScrollBound` -> `Pinned` and back while a pinning region engages and releases
//! - `ScrollBound` -> `Loop` when the scroll leaves the region backwards
//!
//! Scroll that happens during the intro is not lost: once the intro completes, the object catches
//! up with the current zone. A resize while the intro plays rebuilds the intro for the new
//! viewport and restarts it, keeping the start pose captured the first time.
//!
//! ---
//!
//! ## Ownership and disposal
//!
//! Every registration belongs to an [`OwnerId`](crate::OwnerId). Owners nest, and
//! [`Scheduler::dispose`](crate::Scheduler::dispose) tears an owner down children first: objects,
//! bindings (releasing pins), timelines, delayed calls and listeners. Disposing twice is a no-op,
//! and stale handles are reported as `false` rather than errors.
//!
//! ---
//!
//! ## Scene files and the CLI
//!
//! [`SceneDef`](crate::SceneDef) describes a viewport, named targets, objects and a timed script
//! of scroll, resize, reflow and lifecycle actions. [`Simulation`](crate::Simulation) runs it
//! deterministically at a fixed frame rate and produces one [`FrameRecord`](crate::FrameRecord)
//! per frame.
//!
//! The `scrubline` binary wraps the same flow:
//!
//! ```text
//! scrubline validate --in scene.json
//! scrubline simulate --in scene.json --fps 60 --out frames.jsonl
//! ```
//!
//! Logging goes through `tracing`; set `RUST_LOG=scrubline=debug` to see scene building, script
//! actions and phase changes.
