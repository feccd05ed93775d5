use super::*;
use crate::animation::target::AnimatableHost;
use crate::animation::tween::{LoopMode, Repeat, Tween};
use crate::engine::clock::ManualClock;
use crate::engine::opts::EngineOpts;
use crate::foundation::core::{Rect, TargetId};
use crate::scene::stage::{LayoutMode, Stage};
use crate::scroll::region::Marker;
use crate::scroll::source::ScrollSample;

fn setup() -> (Scheduler, Stage, TargetId, OwnerId) {
    let opts = EngineOpts {
        max_frame_dt_secs: 0.5,
        resize_debounce_secs: 0.0,
        ..EngineOpts::default()
    };
    let mut s = Scheduler::new(opts, ManualClock::new()).unwrap();
    let mut stage = Stage::new(800.0, 600.0, 5000.0).unwrap();
    let id = stage
        .add_target("hero", Rect::new(0.0, 1600.0, 800.0, 2200.0))
        .unwrap();
    let owner = s.create_owner("hero");
    (s, stage, id, owner)
}

fn region(id: TargetId) -> TriggerRegion {
    TriggerRegion::new(id)
        .start(Marker::top_bottom())
        .end(Marker::top_top())
}

fn idle_and_scroll(id: TargetId, region: TriggerRegion) -> PhaseSpec {
    PhaseSpec::new()
        .idle(move |_| {
            Timeline::new().then(
                Tween::new(id, 2.0)
                    .from_to("rotation", 0.0, 10.0)
                    .repeat(Repeat::Infinite(LoopMode::Yoyo)),
            )
        })
        .scroll(region, move |_| Timeline::new().then(Tween::new(id, 1.0).to("scale", 2.0)))
}

fn full_spec(id: TargetId) -> PhaseSpec {
    idle_and_scroll(id, region(id))
        .intro(move |vp| Timeline::new().then(Tween::new(id, 1.0).from_to("y", vp.height, 0.0)))
}

fn phase_changes(events: &[EngineEvent]) -> Vec<(Phase, Phase)> {
    events
        .iter()
        .filter_map(|e| match e {
            EngineEvent::PhaseChanged { from, to, .. } => Some((*from, *to)),
            _ => None,
        })
        .collect()
}

fn scroll_to(s: &mut Scheduler, stage: &mut Stage, pos: f64, dt: f64) -> Vec<EngineEvent> {
    s.push_scroll(ScrollSample::at(pos, s.time()));
    s.tick(dt, stage)
}

#[test]
fn intro_loop_scroll_lifecycle() {
    let (mut s, mut stage, id, owner) = setup();
    let obj = s.add_object(owner, full_spec(id)).unwrap();
    assert_eq!(s.object_phase(obj), Some(Phase::Idle));

    let ev = s.tick(0.0, &mut stage);
    assert_eq!(phase_changes(&ev), vec![(Phase::Idle, Phase::Intro)]);
    assert_eq!(stage.scalar(id, "y"), Some(600.0));

    s.tick(0.5, &mut stage);
    assert_eq!(stage.scalar(id, "y"), Some(300.0));

    let ev = s.tick(0.5, &mut stage);
    assert_eq!(phase_changes(&ev), vec![(Phase::Intro, Phase::Loop)]);
    assert!(ev.contains(&EngineEvent::IntroFinished { object: obj }));
    assert_eq!(stage.scalar(id, "y"), Some(0.0));
    let view = s.object(obj).unwrap();
    assert_eq!(view.intro, None);
    let idle = view.idle.unwrap();

    s.tick(0.25, &mut stage);
    assert_eq!(stage.scalar(id, "rotation"), Some(1.25));

    // Entering the region swaps the loop for the scrubbed timeline in one frame.
    let killed = s.stats().timelines_killed;
    let ev = scroll_to(&mut s, &mut stage, 1300.0, 0.25);
    assert_eq!(phase_changes(&ev), vec![(Phase::Loop, Phase::ScrollBound)]);
    assert_eq!(s.stats().timelines_killed, killed + 1);
    assert!(!s.is_active(idle));
    let view = s.object(obj).unwrap();
    assert_eq!(view.idle, None);
    let scroll = view.scroll.unwrap();
    assert_eq!(s.playhead(scroll), Some(0.5));
    assert_eq!(s.play_state(scroll), Some(PlayState::Paused));
    assert_eq!(stage.scalar(id, "scale"), Some(1.5));

    scroll_to(&mut s, &mut stage, 1450.0, 0.25);
    assert_eq!(s.playhead(scroll), Some(0.75));
    assert_eq!(stage.scalar(id, "scale"), Some(1.75));
    // Time alone never moves a scrubbed timeline.
    s.tick(0.5, &mut stage);
    assert_eq!(s.playhead(scroll), Some(0.75));
}

#[test]
fn region_entry_at_start_marker_scrubs_from_zero() {
    let (mut s, mut stage, id, owner) = setup();
    let obj = s
        .add_object(owner, idle_and_scroll(id, region(id)))
        .unwrap();
    s.tick(0.0, &mut stage);
    s.tick(0.5, &mut stage);
    let ev = scroll_to(&mut s, &mut stage, 1000.0, 0.1);
    assert_eq!(phase_changes(&ev), vec![(Phase::Loop, Phase::ScrollBound)]);
    let scroll = s.object(obj).and_then(|v| v.scroll).unwrap();
    assert_eq!(s.playhead(scroll), Some(0.0));
    assert_eq!(stage.scalar(id, "scale"), Some(1.0));
}

#[test]
fn leaving_backward_resumes_loop_without_replaying_intro() {
    let (mut s, mut stage, id, owner) = setup();
    let obj = s.add_object(owner, full_spec(id)).unwrap();
    s.tick(0.0, &mut stage);
    s.tick(0.5, &mut stage);
    s.tick(0.5, &mut stage);
    scroll_to(&mut s, &mut stage, 1300.0, 0.1);
    let scroll = s.object(obj).and_then(|v| v.scroll).unwrap();

    let ev = scroll_to(&mut s, &mut stage, 500.0, 0.1);
    assert_eq!(phase_changes(&ev), vec![(Phase::ScrollBound, Phase::Loop)]);
    assert!(!ev.iter().any(|e| matches!(e, EngineEvent::IntroFinished { .. })));
    let view = s.object(obj).unwrap();
    assert_eq!(view.intro, None);
    assert!(view.idle.is_some());
    // The scrubbed timeline is parked, not killed.
    assert_eq!(view.scroll, Some(scroll));
    assert_eq!(s.playhead(scroll), Some(0.0));
    assert_eq!(stage.scalar(id, "rotation"), Some(0.0));

    // Re-entry reuses it and re-captures start values.
    scroll_to(&mut s, &mut stage, 1300.0, 0.1);
    assert_eq!(s.object(obj).and_then(|v| v.scroll), Some(scroll));
    assert_eq!(s.playhead(scroll), Some(0.5));
    assert_eq!(stage.scalar(id, "scale"), Some(1.5));
}

#[test]
fn scrolling_during_intro_defers_engagement() {
    let (mut s, mut stage, id, owner) = setup();
    let obj = s.add_object(owner, full_spec(id)).unwrap();
    s.tick(0.0, &mut stage);
    let ev = scroll_to(&mut s, &mut stage, 1300.0, 0.5);
    assert!(phase_changes(&ev).is_empty());
    assert_eq!(s.object_phase(obj), Some(Phase::Intro));

    let ev = s.tick(0.5, &mut stage);
    assert_eq!(
        phase_changes(&ev),
        vec![(Phase::Intro, Phase::Loop), (Phase::Loop, Phase::ScrollBound)]
    );
    let view = s.object(obj).unwrap();
    assert_eq!(view.idle, None);
    assert_eq!(view.scroll.and_then(|t| s.playhead(t)), Some(0.5));
    assert_eq!(stage.scalar(id, "scale"), Some(1.5));
}

#[test]
fn intro_finishing_past_the_region_engages_and_pins() {
    let (mut s, mut stage, id, owner) = setup();
    let spec = idle_and_scroll(id, region(id).pin(true))
        .intro(move |_| Timeline::new().then(Tween::new(id, 0.5).to("opacity", 1.0)));
    let obj = s.add_object(owner, spec).unwrap();
    s.tick(0.0, &mut stage);
    scroll_to(&mut s, &mut stage, 2000.0, 0.25);
    assert_eq!(s.object_phase(obj), Some(Phase::Intro));
    assert!(matches!(stage.layout_mode(id), Some(LayoutMode::Fixed(_))));

    let ev = s.tick(0.25, &mut stage);
    assert_eq!(
        phase_changes(&ev),
        vec![
            (Phase::Intro, Phase::Loop),
            (Phase::Loop, Phase::ScrollBound),
            (Phase::ScrollBound, Phase::Pinned),
        ]
    );
    assert_eq!(stage.scalar(id, "scale"), Some(2.0));
}

#[test]
fn pin_phases_follow_pin_signals() {
    let (mut s, mut stage, id, owner) = setup();
    let obj = s
        .add_object(owner, idle_and_scroll(id, region(id).pin(true)))
        .unwrap();
    let binding = s.object(obj).and_then(|v| v.binding).unwrap();
    s.tick(0.0, &mut stage);
    scroll_to(&mut s, &mut stage, 1300.0, 0.1);
    assert_eq!(s.object_phase(obj), Some(Phase::ScrollBound));

    let ev = scroll_to(&mut s, &mut stage, 1700.0, 0.1);
    assert_eq!(phase_changes(&ev), vec![(Phase::ScrollBound, Phase::Pinned)]);
    assert_eq!(
        ev[..2],
        [
            EngineEvent::Toggle {
                binding,
                event: ToggleEvent::LeaveForward
            },
            EngineEvent::PinEngaged { binding },
        ]
    );
    let Some(LayoutMode::Fixed(pose)) = stage.layout_mode(id) else {
        panic!("anchor should be fixed");
    };
    assert_eq!(pose.rect.y0, 0.0);

    // Back inside the region the pin holds.
    let ev = scroll_to(&mut s, &mut stage, 1300.0, 0.1);
    assert!(phase_changes(&ev).is_empty());
    assert_eq!(s.object_phase(obj), Some(Phase::Pinned));

    let ev = scroll_to(&mut s, &mut stage, 500.0, 0.1);
    assert_eq!(
        ev[..2],
        [
            EngineEvent::PinReleased { binding },
            EngineEvent::Toggle {
                binding,
                event: ToggleEvent::LeaveBackward
            },
        ]
    );
    assert_eq!(
        phase_changes(&ev),
        vec![(Phase::Pinned, Phase::ScrollBound), (Phase::ScrollBound, Phase::Loop)]
    );
    assert_eq!(stage.layout_mode(id), Some(LayoutMode::Flow));
}

#[test]
fn resize_during_loop_keeps_playhead() {
    let (mut s, mut stage, id, owner) = setup();
    let obj = s
        .add_object(owner, idle_and_scroll(id, region(id)))
        .unwrap();
    s.tick(0.0, &mut stage);
    s.tick(0.5, &mut stage);
    let idle = s.object(obj).and_then(|v| v.idle).unwrap();

    stage.resize(1000.0, 700.0, 5000.0).unwrap();
    let ev = s.tick(0.25, &mut stage);
    assert!(phase_changes(&ev).is_empty());
    assert_eq!(s.object(obj).and_then(|v| v.idle), Some(idle));
    assert_eq!(s.playhead(idle), Some(0.75));
    let b = s.object(obj).and_then(|v| v.binding).unwrap();
    assert_eq!(s.binding(b).and_then(|b| b.resolved()).map(|r| r.start), Some(900.0));
}

#[test]
fn resize_during_intro_restarts_it_for_new_viewport() {
    let (mut s, mut stage, id, owner) = setup();
    let obj = s.add_object(owner, full_spec(id)).unwrap();
    s.tick(0.0, &mut stage);
    s.tick(0.5, &mut stage);
    let first = s.object(obj).and_then(|v| v.intro).unwrap();
    assert_eq!(stage.scalar(id, "y"), Some(300.0));

    stage.resize(800.0, 700.0, 5000.0).unwrap();
    let ev = s.tick(0.25, &mut stage);
    assert!(phase_changes(&ev).is_empty());
    let second = s.object(obj).and_then(|v| v.intro).unwrap();
    assert_ne!(first, second);
    assert!(!s.is_active(first));
    assert_eq!(s.playhead(second), Some(0.0));
    assert_eq!(stage.scalar(id, "y"), Some(700.0));

    s.tick(0.5, &mut stage);
    assert_eq!(stage.scalar(id, "y"), Some(350.0));
}

#[test]
fn restarted_intro_keeps_original_start_pose() {
    let (mut s, mut stage, id, owner) = setup();
    stage.write(id, &"opacity".into(), 0.0.into());
    let spec = PhaseSpec::new()
        .intro(move |_| Timeline::new().then(Tween::new(id, 1.0).to("opacity", 1.0)));
    s.add_object(owner, spec).unwrap();
    s.tick(0.0, &mut stage);
    s.tick(0.5, &mut stage);
    assert_eq!(stage.scalar(id, "opacity"), Some(0.5));

    stage.resize(900.0, 600.0, 5000.0).unwrap();
    s.tick(0.25, &mut stage);
    assert_eq!(stage.scalar(id, "opacity"), Some(0.0));
}

#[test]
fn missing_intro_completes_immediately() {
    let (mut s, mut stage, id, owner) = setup();
    let obj = s
        .add_object(owner, idle_and_scroll(id, region(id)))
        .unwrap();
    let ev = s.tick(0.0, &mut stage);
    assert_eq!(
        phase_changes(&ev),
        vec![(Phase::Idle, Phase::Intro), (Phase::Intro, Phase::Loop)]
    );
    assert!(ev.contains(&EngineEvent::IntroFinished { object: obj }));
    assert!(s.object(obj).and_then(|v| v.idle).is_some());
}

#[test]
fn infinite_intro_is_treated_as_missing() {
    let (mut s, mut stage, id, owner) = setup();
    let spec = idle_and_scroll(id, region(id)).intro(move |_| {
        Timeline::new().then(
            Tween::new(id, 1.0)
                .to("x", 5.0)
                .repeat(Repeat::Infinite(LoopMode::Restart)),
        )
    });
    let obj = s.add_object(owner, spec).unwrap();
    s.tick(0.0, &mut stage);
    assert_eq!(s.object_phase(obj), Some(Phase::Loop));
    assert_eq!(s.object(obj).and_then(|v| v.intro), None);
}

#[test]
fn play_is_ignored_until_reset() {
    let (mut s, mut stage, id, owner) = setup();
    let spec = full_spec(id).autoplay(false);
    let obj = s.add_object(owner, spec).unwrap();
    assert!(s.tick(0.0, &mut stage).is_empty());
    assert_eq!(s.object_phase(obj), Some(Phase::Idle));

    assert!(s.play_object(obj));
    s.tick(0.0, &mut stage);
    s.tick(0.5, &mut stage);
    s.tick(0.5, &mut stage);
    assert_eq!(s.object_phase(obj), Some(Phase::Loop));

    s.play_object(obj);
    assert!(phase_changes(&s.tick(0.1, &mut stage)).is_empty());

    assert!(s.reset_object(obj));
    let ev = s.tick(0.1, &mut stage);
    assert_eq!(phase_changes(&ev), vec![(Phase::Loop, Phase::Idle)]);
    let view = s.object(obj).unwrap();
    assert_eq!((view.intro, view.idle, view.scroll), (None, None, None));
    assert!(!view.state.has_played);

    s.play_object(obj);
    let ev = s.tick(0.0, &mut stage);
    assert_eq!(phase_changes(&ev), vec![(Phase::Idle, Phase::Intro)]);
    assert_eq!(stage.scalar(id, "y"), Some(600.0));
}

#[test]
fn disposing_owner_removes_object() {
    let (mut s, mut stage, id, owner) = setup();
    let obj = s.add_object(owner, full_spec(id)).unwrap();
    s.tick(0.0, &mut stage);
    assert!(s.dispose(owner, &mut stage));
    assert_eq!(s.object(obj), None);
    assert!(!s.play_object(obj));
    assert_eq!(s.registrations(), 0);
    assert_eq!(s.clock().pending(), 0);
}
