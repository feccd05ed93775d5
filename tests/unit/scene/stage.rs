use super::*;

fn stage() -> (Stage, TargetId) {
    let mut s = Stage::new(800.0, 600.0, 3000.0).unwrap();
    let id = s
        .add_target("hero", Rect::new(0.0, 1000.0, 800.0, 1400.0))
        .unwrap();
    (s, id)
}

#[test]
fn builtin_keys_have_defaults() {
    let (s, id) = stage();
    assert_eq!(s.scalar(id, "opacity"), Some(1.0));
    assert_eq!(s.scalar(id, "x"), Some(0.0));
    assert_eq!(s.prop(id, &PropertyKey::from("fill")), None);
}

#[test]
fn flow_bounds_follow_scroll() {
    let (mut s, id) = stage();
    s.set_scroll(250.0);
    let r = s.flow_bounds(id).unwrap();
    assert_eq!(r.y0, 750.0);
    s.set_scroll(99_999.0);
    assert_eq!(s.scroll(), 2400.0);
}

#[test]
fn removed_targets_reject_writes() {
    let (mut s, id) = stage();
    assert!(s.write(id, &PropertyKey::X, PropValue::Scalar(3.0)));
    assert!(s.remove_target(id));
    assert!(!s.remove_target(id));
    assert!(!s.write(id, &PropertyKey::X, PropValue::Scalar(4.0)));
    assert!(!s.set_flow_mode(id));
    assert_eq!(s.target_id("hero"), None);
}

#[test]
fn duplicate_names_are_rejected() {
    let (mut s, _) = stage();
    assert!(s.add_target("hero", Rect::ZERO).is_err());
}
