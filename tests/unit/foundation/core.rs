use super::*;

#[test]
fn viewport_rejects_degenerate_sizes() {
    assert!(Viewport::new(0.0, 100.0, 0.0, 0.0).is_err());
    assert!(Viewport::new(100.0, f64::NAN, 0.0, 0.0).is_err());
    assert!(Viewport::new(100.0, 100.0, 0.0, -1.0).is_err());
    let v = Viewport::new(1280.0, 720.0, 10.0, 2000.0).unwrap();
    assert_eq!(v.size(), Size::new(1280.0, 720.0));
}

#[test]
fn size_differs_ignores_scroll() {
    let a = Viewport::new(800.0, 600.0, 0.0, 100.0).unwrap();
    let b = Viewport::new(800.0, 600.0, 50.0, 100.0).unwrap();
    let c = Viewport::new(801.0, 600.0, 0.0, 100.0).unwrap();
    assert!(!a.size_differs(b));
    assert!(a.size_differs(c));
}

#[test]
fn id_seq_never_repeats() {
    let mut seq = IdSeq::default();
    let a = seq.next();
    let b = seq.next();
    assert!(b > a);
}
