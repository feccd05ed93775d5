use super::*;
use crate::scene::stage::Stage;

#[test]
fn progress_is_linear_between_markers() {
    let r = ResolvedRegion::from_markers(1000.0, 1600.0);
    assert_eq!(r.progress(1300.0), 0.5);
    assert_eq!(r.progress(0.0), 0.0);
    assert_eq!(r.progress(5000.0), 1.0);
    assert_eq!(r.zone(999.0), Zone::Before);
    assert_eq!(r.zone(1000.0), Zone::Inside);
    assert_eq!(r.zone(1600.0), Zone::Inside);
    assert_eq!(r.zone(1600.5), Zone::After);
}

#[test]
fn degenerate_regions_are_deterministic() {
    let above = ResolvedRegion::from_markers(-20.0, -20.0);
    assert!(above.is_degenerate());
    assert_eq!(above.progress(0.0), 1.0);
    assert_eq!(above.zone(500.0), Zone::After);

    let below = ResolvedRegion::from_markers(900.0, 400.0);
    assert_eq!(below.progress(10_000.0), 0.0);
    assert_eq!(below.zone(10_000.0), Zone::Before);
}

#[test]
fn skipped_zones_fire_both_transitions() {
    use ToggleEvent::*;
    assert_eq!(zone_transitions(Zone::Before, Zone::Inside).as_slice(), &[EnterForward]);
    assert_eq!(
        zone_transitions(Zone::Before, Zone::After).as_slice(),
        &[EnterForward, LeaveForward]
    );
    assert_eq!(
        zone_transitions(Zone::After, Zone::Before).as_slice(),
        &[EnterBackward, LeaveBackward]
    );
    assert!(zone_transitions(Zone::Inside, Zone::Inside).is_empty());
}

#[test]
fn markers_parse_and_print() {
    let m: Marker = "top bottom".parse().unwrap();
    assert_eq!(m, Marker::top_bottom());
    let m: Marker = "center 80%".parse().unwrap();
    assert_eq!(m.anchor_frac, 0.5);
    assert!((m.viewport_frac - 0.8).abs() < 1e-12);
    let m: Marker = "bottom+=200 top".parse().unwrap();
    assert_eq!(m, Marker::bottom_top().offset(200.0));
    assert_eq!(m.to_string(), "bottom+=200 top");
    let m: Marker = "120px top-=10".parse().unwrap();
    assert_eq!(m.anchor_px, 120.0);
    assert_eq!(m.viewport_px, -10.0);

    assert!("top".parse::<Marker>().is_err());
    assert!("middle top".parse::<Marker>().is_err());
    assert!("top bottom extra".parse::<Marker>().is_err());
}

#[test]
fn scrub_accepts_bool_number_and_keyword() {
    let s: Scrub = serde_json::from_str("false").unwrap();
    assert_eq!(s, Scrub::Off);
    let s: Scrub = serde_json::from_str("true").unwrap();
    assert_eq!(s, Scrub::Direct);
    let s: Scrub = serde_json::from_str("0.5").unwrap();
    assert_eq!(s, Scrub::Smoothed(0.5));
    let s: Scrub = serde_json::from_str("\"default\"").unwrap();
    assert_eq!(s.smoothing_secs(Some(0.2)), Some(0.2));
    assert!(serde_json::from_str::<Scrub>("-1").is_err());
    assert!(serde_json::from_str::<Scrub>("\"fast\"").is_err());
}

#[test]
fn resolves_against_layout() {
    let mut stage = Stage::new(800.0, 600.0, 4000.0).unwrap();
    let anchor = stage
        .add_target("hero", Rect::new(0.0, 1600.0, 800.0, 2200.0))
        .unwrap();
    let region = TriggerRegion::new(anchor)
        .start(Marker::top_bottom())
        .end(Marker::top_top());

    let r = region.resolve(&stage).unwrap();
    assert_eq!(r.start, 1000.0);
    assert_eq!(r.end, 1600.0);
    assert_eq!(r.progress(1300.0), 0.5);

    // Same markers regardless of where the layout was measured.
    stage.set_scroll(700.0);
    assert_eq!(region.resolve(&stage).unwrap(), r);

    let pose = r.pin_pose();
    assert_eq!(pose.rect, Rect::new(0.0, 0.0, 800.0, 600.0));

    stage.remove_target(anchor);
    assert!(region.resolve(&stage).is_none());
}

#[test]
fn region_deserializes_with_defaults() {
    let r: TriggerRegion = serde_json::from_str(r#"{"anchor": 3, "pin": true}"#).unwrap();
    assert_eq!(r.anchor, TargetId(3));
    assert_eq!(r.start, Marker::top_bottom());
    assert_eq!(r.end, Marker::bottom_top());
    assert_eq!(r.scrub, Scrub::Direct);
    assert_eq!(r.span, None);
    assert!(r.pin);
    assert!(r.validate().is_ok());
}

#[test]
fn span_ends_region_relative_to_start() {
    let mut stage = Stage::new(800.0, 600.0, 4000.0).unwrap();
    let body = stage
        .add_target("body", Rect::new(0.0, 0.0, 800.0, 4000.0))
        .unwrap();
    let region = TriggerRegion::new(body)
        .start(Marker::top_top())
        .end(Marker::bottom_bottom())
        .span(600.0);
    let r = region.resolve(&stage).unwrap();
    assert_eq!((r.start, r.end), (0.0, 600.0));
    assert_eq!(r.progress(150.0), 0.25);

    assert!(region.clone().span(-1.0).validate().is_err());
    let r: TriggerRegion =
        serde_json::from_str(r#"{"anchor": 0, "start": "top top", "span": 600}"#).unwrap();
    assert_eq!(r.span, Some(600.0));
}
