use super::*;

#[test]
fn smoothed_position_is_monotonic_toward_target() {
    let mut s = SmoothScroller::new(0.1, 5000.0);
    s.scroll_by(1200.0);
    let mut last = s.position();
    for _ in 0..120 {
        let sample = s.tick(1.0 / 60.0);
        assert!(sample.smoothed_position >= last);
        assert!(sample.smoothed_position <= sample.raw_position);
        last = sample.smoothed_position;
    }
    assert_eq!(s.position(), 1200.0);
    assert!(!s.is_moving());
}

#[test]
fn scroll_target_is_clamped() {
    let mut s = SmoothScroller::new(0.1, 800.0);
    s.scroll_by(-50.0);
    assert_eq!(s.tick(0.016).raw_position, 0.0);
    s.scroll_to(10_000.0, true);
    let sample = s.tick(0.016);
    assert_eq!(sample.raw_position, 800.0);
    assert_eq!(sample.smoothed_position, 800.0);
    s.set_max_scroll(300.0);
    assert_eq!(s.position(), 300.0);
}

#[test]
fn progress_source_latches_one_sample_per_frame() {
    let mut scroller = SmoothScroller::new(0.0, 2000.0);
    let mut src = ScrollProgressSource::attach(&mut scroller);
    assert!(src.begin_frame().is_none());

    scroller.scroll_to(100.0, false);
    scroller.tick(0.016);
    scroller.scroll_to(250.0, false);
    scroller.tick(0.016);
    assert_eq!(src.received(), 2);

    let frame = src.begin_frame().unwrap();
    assert_eq!(frame.sample.smoothed_position, 250.0);
    assert_eq!(frame.direction, ScrollDirection::Still);

    scroller.scroll_to(100.0, false);
    scroller.tick(0.016);
    let frame = src.begin_frame().unwrap();
    assert_eq!(frame.direction, ScrollDirection::Backward);
    assert_eq!(frame.delta, -150.0);
    assert_eq!(src.current(), Some(frame));
}

#[test]
fn dropping_or_detaching_unsubscribes() {
    let mut scroller = SmoothScroller::new(0.1, 100.0);
    let a = ScrollProgressSource::attach(&mut scroller);
    let mut b = ScrollProgressSource::attach(&mut scroller);
    assert_eq!(scroller.subscriber_count(), 2);
    drop(a);
    assert_eq!(scroller.subscriber_count(), 1);
    b.detach();
    b.detach();
    assert_eq!(scroller.subscriber_count(), 0);
}

#[test]
fn unsubscribe_inside_callback_sticks() {
    let mut scroller = SmoothScroller::new(0.0, 100.0);
    let guard: Rc<RefCell<Option<Unsubscribe>>> = Rc::new(RefCell::new(None));
    let hits = Rc::new(RefCell::new(0u32));
    let (g, h) = (guard.clone(), hits.clone());
    let sub = scroller.subscribe(Box::new(move |_| {
        *h.borrow_mut() += 1;
        if let Some(mut u) = g.borrow_mut().take() {
            u.cancel();
        }
    }));
    *guard.borrow_mut() = Some(sub);
    scroller.tick(0.016);
    scroller.tick(0.016);
    assert_eq!(*hits.borrow(), 1);
    assert_eq!(scroller.subscriber_count(), 0);
}

#[test]
fn detached_source_accepts_pushes() {
    let mut src = ScrollProgressSource::detached();
    src.push(ScrollSample::at(40.0, 0.0));
    src.begin_frame();
    src.push(ScrollSample::at(90.0, 0.1));
    let f = src.begin_frame().unwrap();
    assert_eq!(f.direction, ScrollDirection::Forward);
    assert_eq!(f.delta, 50.0);
}
