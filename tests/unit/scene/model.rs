use super::*;
use crate::animation::target::AnimatableHost;
use crate::animation::tween::LoopMode;

const SCENE: &str = r##"{
  "viewport": { "width": 800, "height": 600, "document_height": 4000 },
  "targets": {
    "hero": { "rect": { "x0": 0, "y0": 1600, "x1": 800, "y1": 2200 }, "props": { "opacity": 0 } },
    "badge": { "rect": { "x0": 20, "y0": 40, "x1": 120, "y1": 80 } }
  },
  "objects": [
    {
      "name": "hero",
      "intro": { "entries": [
        { "kind": "tween", "target": "hero", "duration": 1.0, "from_to": { "y": [{ "vh": 1.0 }, 0] } },
        { "kind": "tween", "target": "hero", "duration": 0.5, "to": { "opacity": 1 },
          "position": { "with_previous": 0.25 } },
        { "kind": "cue", "name": "landed" }
      ] },
      "idle": { "kind": "drift", "targets": ["hero", "badge"] },
      "scroll": {
        "region": { "anchor": "hero", "start": "top bottom", "end": "top top", "pin": true },
        "timeline": { "entries": [ { "kind": "tween", "target": "hero", "duration": 1, "to": { "scale": 2 } } ] }
      }
    }
  ],
  "script": {
    "duration_secs": 3,
    "steps": [
      { "at": 1.5, "action": "scroll_to", "position": 1300 },
      { "at": 2.0, "action": "resize", "width": 800, "height": 700, "document_height": 4000 }
    ]
  }
}"##;

fn scene() -> SceneDef {
    SceneDef::from_json_str(SCENE).unwrap()
}

#[test]
fn parses_and_validates() {
    let s = scene();
    s.validate().unwrap();
    assert_eq!(s.engine, EngineOpts::default());
    assert!(s.objects[0].autoplay);
    assert_eq!(s.objects[0].scroll.as_ref().unwrap().region.scrub, Scrub::Direct);
    assert_eq!(s.script.steps.len(), 2);
    assert_eq!(
        s.script.steps[0].action,
        ScriptAction::ScrollTo {
            position: 1300.0,
            immediate: false
        }
    );
}

#[test]
fn value_forms() {
    let v: ValueDef = serde_json::from_str("3.5").unwrap();
    assert_eq!(v, ValueDef::Plain(PropValue::Scalar(3.5)));
    let v: ValueDef = serde_json::from_str(r#"{"vh": 0.5, "vw": 0.1}"#).unwrap();
    let vp = Viewport::new(1000.0, 600.0, 0.0, 0.0).unwrap();
    assert_eq!(v.resolve(&vp), PropValue::Scalar(400.0));
    let v: ValueDef = serde_json::from_str(r#"{"x": 1, "y": 2}"#).unwrap();
    assert!(matches!(v, ValueDef::Plain(PropValue::Vec2(_))));
    let v: ValueDef = serde_json::from_str(r##""#ff000080""##).unwrap();
    assert!(matches!(v, ValueDef::Plain(PropValue::Color(_))));
}

#[test]
fn intro_builds_against_viewport() {
    let s = scene();
    let targets = s.placeholder_targets();
    let intro = s.objects[0].intro.as_ref().unwrap();

    let small = Viewport::new(800.0, 600.0, 0.0, 0.0).unwrap();
    let tl = intro.build(&targets, &small).unwrap();
    assert_eq!(tl.duration(), 1.0);
    assert_eq!(tl.resolved_offsets(), vec![0.0, 0.25, 0.75]);

    let mut host = crate::scene::stage::Stage::new(800.0, 700.0, 4000.0).unwrap();
    host.add_target("badge", Rect::new(0.0, 0.0, 1.0, 1.0)).unwrap();
    let hero = host.add_target("hero", Rect::new(0.0, 0.0, 1.0, 1.0)).unwrap();
    let lookup: TargetLookup = [("hero".to_owned(), hero)].into_iter().collect();
    let tall = Viewport::new(800.0, 700.0, 0.0, 0.0).unwrap();
    let mut tl = intro.build(&lookup, &tall).unwrap();
    tl.set_playhead(0.0, &mut host);
    assert_eq!(host.scalar(hero, "y"), Some(700.0));
}

#[test]
fn drift_idle_is_seeded() {
    let s = scene();
    let targets = s.placeholder_targets();
    let vp = s.initial_viewport().unwrap();
    let idle = s.objects[0].idle.as_ref().unwrap();
    let a = idle.build(&targets, &vp, 7).unwrap();
    let b = idle.build(&targets, &vp, 7).unwrap();
    let c = idle.build(&targets, &vp, 8).unwrap();
    assert!(a.is_infinite());
    assert_eq!(a, b);
    assert_ne!(a, c);
}

#[test]
fn unknown_target_is_rejected() {
    let mut s = scene();
    s.objects[0].scroll.as_mut().unwrap().region.anchor = "ghost".into();
    let err = s.validate().unwrap_err().to_string();
    assert!(err.contains("ghost"), "{err}");
}

#[test]
fn duplicate_objects_are_rejected() {
    let mut s = scene();
    let copy = s.objects[0].clone();
    s.objects.push(copy);
    assert!(s.validate().is_err());
}

#[test]
fn infinite_intro_is_rejected() {
    let mut s = scene();
    s.objects[0].intro.as_mut().unwrap().repeat = Repeat::Infinite(LoopMode::Restart);
    assert!(s.validate().is_err());
}

#[test]
fn scroll_phase_needs_scrub() {
    let json = SCENE.replace(r#""pin": true"#, r#""pin": true, "scrub": false"#);
    let s = SceneDef::from_json_str(&json).unwrap();
    assert!(s.validate().is_err());
}

#[test]
fn script_must_be_ordered_and_reference_objects() {
    let mut s = scene();
    s.script.steps.swap(0, 1);
    assert!(s.validate().is_err());

    let mut s = scene();
    s.script.steps.push(ScriptStep {
        at: 2.5,
        action: ScriptAction::Dispose {
            object: "nobody".into(),
        },
    });
    assert!(s.validate().is_err());
}

#[test]
fn unknown_fields_are_rejected() {
    let json = SCENE.replace(r#""duration_secs": 3"#, r#""duration_secs": 3, "speed": 2"#);
    assert!(SceneDef::from_json_str(&json).is_err());
    assert!(SceneDef::from_json_str("{").is_err());
}

#[test]
fn missing_file_reports_path() {
    let err = SceneDef::from_path("/definitely/not/here.json")
        .unwrap_err()
        .to_string();
    assert!(err.contains("/definitely/not/here.json"), "{err}");
}

#[test]
fn relative_offsets_build_from_json() {
    let def: TimelineDef = serde_json::from_str(
        r#"{ "entries": [ { "kind": "tween", "target": "hero", "duration": 1, "by": { "rotation": 2 } } ] }"#,
    )
    .unwrap();
    let mut host = crate::scene::stage::Stage::new(800.0, 600.0, 4000.0).unwrap();
    let hero = host.add_target("hero", Rect::new(0.0, 0.0, 1.0, 1.0)).unwrap();
    host.write(hero, &PropertyKey::Rotation, PropValue::Scalar(5.0));
    let lookup: TargetLookup = [("hero".to_owned(), hero)].into_iter().collect();
    let vp = Viewport::new(800.0, 600.0, 0.0, 0.0).unwrap();
    let mut tl = def.build(&lookup, &vp).unwrap();
    tl.set_playhead(1.0, &mut host);
    assert_eq!(host.scalar(hero, "rotation"), Some(7.0));
}

#[test]
fn stagger_items_place_each_tween() {
    let def: TimelineDef = serde_json::from_str(
        r#"{ "entries": [
          { "kind": "stagger", "each": 0.25, "tweens": [
            { "target": "hero", "duration": 1, "to": { "opacity": 1 } },
            { "target": "badge", "duration": 1, "to": { "opacity": 1 } }
          ] }
        ] }"#,
    )
    .unwrap();
    let s = scene();
    let vp = Viewport::new(800.0, 600.0, 0.0, 0.0).unwrap();
    let tl = def.build(&s.placeholder_targets(), &vp).unwrap();
    assert_eq!(tl.resolved_offsets(), vec![0.0, 0.25]);
    assert_eq!(tl.duration(), 1.25);

    let mut names = BTreeSet::new();
    def.target_names(&mut names);
    assert_eq!(names.into_iter().collect::<Vec<_>>(), vec!["badge", "hero"]);
}
