use super::*;

#[test]
fn property_keys_round_trip_through_strings() {
    assert_eq!(PropertyKey::from("opacity"), PropertyKey::Opacity);
    assert_eq!(
        PropertyKey::from("stroke_dashoffset"),
        PropertyKey::Custom("stroke_dashoffset".to_owned())
    );
    let json = serde_json::to_string(&PropertyKey::Rotation).unwrap();
    assert_eq!(json, "\"rotation\"");
    let back: PropertyKey = serde_json::from_str("\"fill\"").unwrap();
    assert_eq!(back.as_str(), "fill");
}

#[test]
fn hex_colors_parse() {
    assert_eq!(Rgba8::parse_hex("#fff").unwrap(), Rgba8::new(255, 255, 255, 255));
    assert_eq!(
        Rgba8::parse_hex("#ff336680").unwrap(),
        Rgba8::new(0xff, 0x33, 0x66, 0x80)
    );
    assert!(Rgba8::parse_hex("ff3366").is_err());
    assert!(Rgba8::parse_hex("#ff33").is_err());
    assert_eq!(Rgba8::new(1, 2, 3, 4).to_string(), "#01020304");
}

#[test]
fn untagged_values_deserialize_by_shape() {
    let v: PropValue = serde_json::from_str("0.5").unwrap();
    assert_eq!(v, PropValue::Scalar(0.5));
    let v: PropValue = serde_json::from_str(r#"{"x": 1.0, "y": 2.0}"#).unwrap();
    assert_eq!(v, PropValue::Vec2(Vec2::new(1.0, 2.0)));
    let v: PropValue = serde_json::from_str("\"#000000ff\"").unwrap();
    assert_eq!(v, PropValue::Color(Rgba8::new(0, 0, 0, 255)));
}

#[test]
fn lerp_blends_matching_kinds_and_steps_otherwise() {
    let a = PropValue::Color(Rgba8::new(0, 0, 0, 255));
    let b = PropValue::Color(Rgba8::new(200, 100, 50, 255));
    assert_eq!(
        PropValue::lerp(&a, &b, 0.5),
        PropValue::Color(Rgba8::new(100, 50, 25, 255))
    );

    let s = PropValue::Scalar(1.0);
    assert_eq!(PropValue::lerp(&s, &b, 0.99), s);
    assert_eq!(PropValue::lerp(&s, &b, 1.0), b);
}

#[test]
fn offsets_apply_to_numbers_and_vectors() {
    let s = PropValue::Scalar(1.5);
    assert_eq!(s.offset_by(PropValue::Scalar(-2.0)), Some(PropValue::Scalar(-0.5)));
    let v = PropValue::Vec2(Vec2::new(1.0, 2.0));
    assert_eq!(
        v.offset_by(PropValue::Vec2(Vec2::new(3.0, 4.0))),
        Some(PropValue::Vec2(Vec2::new(4.0, 6.0)))
    );
    assert_eq!(v.offset_by(s), None);
    let c = PropValue::Color(Rgba8::new(0, 0, 0, 255));
    assert_eq!(c.offset_by(c), None);
}

#[test]
fn scalars_and_vectors_blend_linearly() {
    let a = PropValue::Vec2(Vec2::new(0.0, 10.0));
    let b = PropValue::Vec2(Vec2::new(100.0, 30.0));
    assert_eq!(
        PropValue::lerp(&a, &b, 0.25),
        PropValue::Vec2(Vec2::new(25.0, 15.0))
    );
    assert_eq!(
        PropValue::lerp(&PropValue::Scalar(2.0), &PropValue::Scalar(4.0), 0.5),
        PropValue::Scalar(3.0)
    );
}
