use super::*;
use crate::animation::value::Rgba8;
use crate::foundation::core::{Rect, Vec2};
use crate::scene::stage::Stage;

fn host() -> (Stage, TargetId) {
    let mut s = Stage::new(100.0, 100.0, 100.0).unwrap();
    let id = s.add_target("t", Rect::ZERO).unwrap();
    (s, id)
}

fn eval(tween: &mut Tween, local: f64, stage: &mut Stage) {
    let mut out = WriteSet::new();
    tween.render(local, &*stage, &mut out, WriteMode::Overwrite);
    out.apply(stage);
}

#[test]
fn finite_repeat_multiplies_duration() {
    let (_, id) = host();
    let t = Tween::new(id, 2.0).to("x", 10.0).repeat(Repeat::Count(2));
    assert_eq!(t.total_duration(), 6.0);
    let t = t.repeat_delay(0.5).delay(1.0);
    assert_eq!(t.total_duration(), 1.0 + 6.0 + 1.0);
}

#[test]
fn yoyo_reverses_odd_iterations_with_same_curve() {
    let (_, id) = host();
    let t = Tween::new(id, 1.0)
        .to("x", 1.0)
        .ease(Ease::InQuad)
        .repeat(Repeat::Count(1))
        .yoyo(true);
    // Forward at 0.25 vs reverse at 1.75 (0.25 before the end of the reversed pass).
    assert!((t.eased_progress(0.25) - 0.0625).abs() < 1e-12);
    assert!((t.eased_progress(1.75) - 0.0625).abs() < 1e-12);
    assert!((t.eased_progress(1.25) - Ease::InQuad.apply(0.75)).abs() < 1e-12);
    assert_eq!(t.eased_progress(2.0), 0.0);
}

#[test]
fn infinite_yoyo_oscillates() {
    let (_, id) = host();
    let t = Tween::new(id, 1.0)
        .to("y", 1.0)
        .repeat(Repeat::Infinite(LoopMode::Yoyo));
    assert!(t.total_duration().is_infinite());
    assert!((t.eased_progress(10.5) - 0.5).abs() < 1e-12);
    assert!((t.eased_progress(11.25) - 0.75).abs() < 1e-12);
    let restart = Tween::new(id, 1.0)
        .to("y", 1.0)
        .repeat(Repeat::Infinite(LoopMode::Restart));
    assert!((restart.eased_progress(11.25) - 0.25).abs() < 1e-12);
}

#[test]
fn to_captures_start_once() {
    let (mut stage, id) = host();
    stage.write(id, &PropertyKey::X, PropValue::Scalar(100.0));
    let mut t = Tween::new(id, 1.0).to("x", 200.0);
    eval(&mut t, 0.5, &mut stage);
    assert_eq!(stage.scalar(id, "x"), Some(150.0));
    // Re-evaluating does not re-capture from the mutated target.
    eval(&mut t, 0.5, &mut stage);
    assert_eq!(stage.scalar(id, "x"), Some(150.0));
    eval(&mut t, 0.0, &mut stage);
    assert_eq!(stage.scalar(id, "x"), Some(100.0));
}

#[test]
fn from_captures_end() {
    let (mut stage, id) = host();
    let mut t = Tween::new(id, 2.0).from("opacity", 0.0);
    eval(&mut t, 0.0, &mut stage);
    assert_eq!(stage.scalar(id, "opacity"), Some(0.0));
    eval(&mut t, 2.0, &mut stage);
    assert_eq!(stage.scalar(id, "opacity"), Some(1.0));
}

#[test]
fn delay_holds_start_pose() {
    let (mut stage, id) = host();
    let mut t = Tween::new(id, 1.0).from_to("x", 0.0, 10.0).delay(0.5);
    eval(&mut t, 0.25, &mut stage);
    assert_eq!(stage.scalar(id, "x"), Some(0.0));
    eval(&mut t, 1.0, &mut stage);
    assert_eq!(stage.scalar(id, "x"), Some(5.0));
}

#[test]
fn missing_target_is_noted_not_fatal() {
    let (mut stage, id) = host();
    stage.remove_target(id);
    let mut t = Tween::new(id, 1.0).to("x", 1.0);
    let mut out = WriteSet::new();
    t.render(0.5, &stage, &mut out, WriteMode::Overwrite);
    assert!(out.is_empty());
    assert_eq!(out.apply(&mut stage), vec![id]);
}

#[test]
fn validation_rejects_bad_parameters() {
    let (_, id) = host();
    assert!(Tween::new(id, -1.0).validate().is_err());
    assert!(Tween::new(id, f64::INFINITY).validate().is_err());
    assert!(Tween::new(id, 1.0).delay(-0.1).validate().is_err());
    assert!(
        Tween::new(id, 0.0)
            .repeat(Repeat::Infinite(LoopMode::Restart))
            .validate()
            .is_err()
    );
    assert!(Tween::new(id, 1.0).to("x", f64::NAN).validate().is_err());
    assert!(Tween::new(id, 0.0).to("x", 1.0).validate().is_ok());
}

#[test]
fn rebuilt_tween_adopts_original_captures() {
    let (mut stage, id) = host();
    let mut first = Tween::new(id, 1.0).to("x", 100.0).from("opacity", 0.0);
    eval(&mut first, 0.5, &mut stage);
    assert_eq!(stage.scalar(id, "x"), Some(50.0));

    // A rebuild with different explicit values starts from the pre-animation pose, not the
    // half-way state now on the target.
    let mut rebuilt = Tween::new(id, 1.0).to("x", 200.0).from("opacity", 0.0);
    rebuilt.adopt_captures(&first);
    eval(&mut rebuilt, 0.0, &mut stage);
    assert_eq!(stage.scalar(id, "x"), Some(0.0));
    eval(&mut rebuilt, 1.0, &mut stage);
    assert_eq!(stage.scalar(id, "x"), Some(200.0));
    assert_eq!(stage.scalar(id, "opacity"), Some(1.0));
}

#[test]
fn by_offsets_the_captured_start() {
    let (mut stage, id) = host();
    stage.write(id, &PropertyKey::Rotation, PropValue::Scalar(30.0));
    let mut t = Tween::new(id, 2.0)
        .by("rotation", 2.0)
        .repeat(Repeat::Infinite(LoopMode::Yoyo));
    eval(&mut t, 1.0, &mut stage);
    assert_eq!(stage.scalar(id, "rotation"), Some(31.0));
    // Yoyo swings back to the original start, not to start + 2 + 2.
    eval(&mut t, 4.0, &mut stage);
    assert_eq!(stage.scalar(id, "rotation"), Some(30.0));
    eval(&mut t, 2.0, &mut stage);
    assert_eq!(stage.scalar(id, "rotation"), Some(32.0));

    t.invalidate_captures();
    eval(&mut t, 2.0, &mut stage);
    assert_eq!(stage.scalar(id, "rotation"), Some(34.0));
}

#[test]
fn color_offsets_are_rejected() {
    let (_, id) = host();
    let t = Tween::new(id, 1.0).by("fill", Rgba8::new(1, 2, 3, 4));
    assert!(t.validate().is_err());
    let t = Tween::new(id, 1.0).by("pos", Vec2::new(1.0, -1.0));
    assert!(t.validate().is_ok());
}

#[test]
fn unstarted_to_tween_waits_to_capture() {
    let (mut stage, id) = host();
    stage.write(id, &PropertyKey::X, PropValue::Scalar(10.0));
    let mut t = Tween::new(id, 1.0).to("x", 20.0).delay(1.0);
    eval(&mut t, 0.5, &mut stage);
    assert_eq!(stage.scalar(id, "x"), Some(10.0));

    stage.write(id, &PropertyKey::X, PropValue::Scalar(40.0));
    eval(&mut t, 1.5, &mut stage);
    assert_eq!(stage.scalar(id, "x"), Some(30.0));
    eval(&mut t, 0.0, &mut stage);
    assert_eq!(stage.scalar(id, "x"), Some(40.0));
}

#[test]
fn zero_duration_tween_only_fires_once_reached() {
    let (_, id) = host();
    let set = Tween::new(id, 0.0).to("x", 1.0).delay(2.0);
    assert_eq!(set.eased_progress(0.0), 0.0);
    assert_eq!(set.eased_progress(1.99), 0.0);
    assert_eq!(set.eased_progress(2.0), 1.0);
    assert_eq!(set.eased_progress(5.0), 1.0);
}
