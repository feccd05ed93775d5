use crate::foundation::math::smoothing_alpha;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

/// One reading of the smoothed scroll input.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ScrollSample {
    /// Unfiltered scroll target in pixels.
    pub raw_position: f64,
    /// Low-pass filtered scroll offset in pixels; what every binding reads.
    pub smoothed_position: f64,
    /// Smoothed velocity in pixels per second.
    pub velocity: f64,
    /// Emission time in seconds.
    pub timestamp: f64,
}

impl ScrollSample {
    /// A settled sample at `position`.
    pub fn at(position: f64, timestamp: f64) -> Self {
        Self {
            raw_position: position,
            smoothed_position: position,
            velocity: 0.0,
            timestamp,
        }
    }
}

/// Scroll direction between two consecutive frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollDirection {
    /// Scroll depth increased.
    Forward,
    /// Scroll depth decreased.
    Backward,
    /// No movement.
    Still,
}

/// Guard returned by [`ScrollSource::subscribe`]; unsubscribes when cancelled or dropped.
pub struct Unsubscribe(Option<Box<dyn FnOnce()>>);

impl Unsubscribe {
    /// Wrap an unsubscribe action.
    pub fn new(f: impl FnOnce() + 'static) -> Self {
        Self(Some(Box::new(f)))
    }

    /// A guard that does nothing.
    pub fn noop() -> Self {
        Self(None)
    }

    /// Unsubscribe now. Calling it on an already-cancelled guard is a no-op.
    pub fn cancel(&mut self) {
        if let Some(f) = self.0.take() {
            f();
        }
    }

    /// Return `true` while still subscribed.
    pub fn is_active(&self) -> bool {
        self.0.is_some()
    }
}

impl Drop for Unsubscribe {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl fmt::Debug for Unsubscribe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Unsubscribe").field(&self.is_active()).finish()
    }
}

/// External smoothed-scroll input.
///
/// Implementations must emit at least once per displayed frame while scrolling, and
/// `smoothed_position` must be continuous and grow with scroll depth.
pub trait ScrollSource {
    /// Register `callback` for every emitted sample.
    fn subscribe(&mut self, callback: Box<dyn FnMut(ScrollSample)>) -> Unsubscribe;
}

#[derive(Debug, Default)]
struct Mailbox {
    latest: Option<ScrollSample>,
    received: u64,
}

/// The per-frame view of scroll input handed to every binding in one tick.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct FrameScroll {
    /// Sample all bindings observe this frame.
    pub sample: ScrollSample,
    /// Direction relative to the previous frame.
    pub direction: ScrollDirection,
    /// Smoothed position change since the previous frame.
    pub delta: f64,
}

/// Thin wrapper over a [`ScrollSource`] that latches the newest sample for frame-aligned reads.
///
/// Samples may arrive at any rate; [`ScrollProgressSource::begin_frame`] snapshots exactly one so
/// every binding in a frame sees the same value.
#[derive(Debug)]
pub struct ScrollProgressSource {
    mailbox: Rc<RefCell<Mailbox>>,
    subscription: Unsubscribe,
    frame: Option<FrameScroll>,
}

impl ScrollProgressSource {
    /// Subscribe to `source`.
    pub fn attach(source: &mut dyn ScrollSource) -> Self {
        let mailbox = Rc::new(RefCell::new(Mailbox::default()));
        let weak = Rc::downgrade(&mailbox);
        let subscription = source.subscribe(Box::new(move |sample| {
            if let Some(mb) = weak.upgrade() {
                let mut mb = mb.borrow_mut();
                mb.latest = Some(sample);
                mb.received += 1;
            }
        }));
        Self {
            mailbox,
            subscription,
            frame: None,
        }
    }

    /// A source fed manually through [`ScrollProgressSource::push`].
    pub fn detached() -> Self {
        Self {
            mailbox: Rc::new(RefCell::new(Mailbox::default())),
            subscription: Unsubscribe::noop(),
            frame: None,
        }
    }

    /// Deliver a sample directly.
    pub fn push(&self, sample: ScrollSample) {
        let mut mb = self.mailbox.borrow_mut();
        mb.latest = Some(sample);
        mb.received += 1;
    }

    /// Number of samples received so far.
    pub fn received(&self) -> u64 {
        self.mailbox.borrow().received
    }

    /// Snapshot the newest sample for this frame. Returns `None` until the first sample arrives.
    pub fn begin_frame(&mut self) -> Option<FrameScroll> {
        let sample = self.mailbox.borrow().latest?;
        let prev = self.frame.map(|f| f.sample.smoothed_position);
        let delta = prev.map_or(0.0, |p| sample.smoothed_position - p);
        let direction = if delta > 0.0 {
            ScrollDirection::Forward
        } else if delta < 0.0 {
            ScrollDirection::Backward
        } else {
            ScrollDirection::Still
        };
        let frame = FrameScroll {
            sample,
            direction,
            delta,
        };
        self.frame = Some(frame);
        Some(frame)
    }

    /// The snapshot taken by the last [`ScrollProgressSource::begin_frame`].
    pub fn current(&self) -> Option<FrameScroll> {
        self.frame
    }

    /// Smoothed velocity of the current frame's sample.
    pub fn velocity(&self) -> f64 {
        self.frame.map_or(0.0, |f| f.sample.velocity)
    }

    /// Stop receiving samples.
    pub fn detach(&mut self) {
        self.subscription.cancel();
    }
}

#[derive(Default)]
struct Subscribers {
    callbacks: BTreeMap<u64, Box<dyn FnMut(ScrollSample)>>,
    // Ids removed while `callbacks` was taken out for dispatch.
    removed: Vec<u64>,
}

/// Reference smoothed-scroll input: exponential low-pass toward a raw target.
///
/// Wheel/touch deltas move the raw target immediately; [`SmoothScroller::tick`] eases the
/// smoothed position toward it and emits one frame-aligned sample to every subscriber.
pub struct SmoothScroller {
    raw: f64,
    smoothed: f64,
    max_scroll: f64,
    smoothing_secs: f64,
    velocity: f64,
    time: f64,
    subscribers: Rc<RefCell<Subscribers>>,
    next_sub: u64,
}

impl fmt::Debug for SmoothScroller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmoothScroller")
            .field("raw", &self.raw)
            .field("smoothed", &self.smoothed)
            .field("max_scroll", &self.max_scroll)
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl SmoothScroller {
    /// Distance under which the smoothed position snaps onto the target.
    pub const SETTLE_EPSILON: f64 = 0.5;

    /// Create a scroller clamped to `[0, max_scroll]` with time constant `smoothing_secs`.
    pub fn new(smoothing_secs: f64, max_scroll: f64) -> Self {
        Self {
            raw: 0.0,
            smoothed: 0.0,
            max_scroll: max_scroll.max(0.0),
            smoothing_secs,
            velocity: 0.0,
            time: 0.0,
            subscribers: Rc::new(RefCell::new(Subscribers::default())),
            next_sub: 0,
        }
    }

    /// Apply a wheel/touch delta to the raw target.
    pub fn scroll_by(&mut self, delta: f64) {
        self.raw = (self.raw + delta).clamp(0.0, self.max_scroll);
    }

    /// Move the raw target; `immediate` also jumps the smoothed position.
    pub fn scroll_to(&mut self, position: f64, immediate: bool) {
        self.raw = position.clamp(0.0, self.max_scroll);
        if immediate {
            self.smoothed = self.raw;
            self.velocity = 0.0;
        }
    }

    /// Update the scrollable range (e.g. after a resize).
    pub fn set_max_scroll(&mut self, max_scroll: f64) {
        self.max_scroll = max_scroll.max(0.0);
        self.raw = self.raw.clamp(0.0, self.max_scroll);
        self.smoothed = self.smoothed.clamp(0.0, self.max_scroll);
    }

    /// Current smoothed position.
    pub fn position(&self) -> f64 {
        self.smoothed
    }

    /// Return `true` while the smoothed position is still catching up.
    pub fn is_moving(&self) -> bool {
        self.smoothed != self.raw
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.borrow().callbacks.len()
    }

    /// Advance by `dt` seconds and emit one sample.
    pub fn tick(&mut self, dt: f64) -> ScrollSample {
        let dt = dt.max(0.0);
        self.time += dt;
        let prev = self.smoothed;
        let alpha = smoothing_alpha(dt, self.smoothing_secs);
        self.smoothed += (self.raw - self.smoothed) * alpha;
        if (self.raw - self.smoothed).abs() < Self::SETTLE_EPSILON {
            self.smoothed = self.raw;
        }
        self.velocity = if dt > 0.0 {
            (self.smoothed - prev) / dt
        } else {
            0.0
        };

        let sample = ScrollSample {
            raw_position: self.raw,
            smoothed_position: self.smoothed,
            velocity: self.velocity,
            timestamp: self.time,
        };

        // Callbacks may subscribe or unsubscribe; never hold the borrow across them.
        let mut dispatch = std::mem::take(&mut self.subscribers.borrow_mut().callbacks);
        for (id, cb) in dispatch.iter_mut() {
            if self.subscribers.borrow().removed.contains(id) {
                continue;
            }
            cb(sample);
        }
        let mut live = self.subscribers.borrow_mut();
        let added = std::mem::take(&mut live.callbacks);
        for id in std::mem::take(&mut live.removed) {
            dispatch.remove(&id);
        }
        dispatch.extend(added);
        live.callbacks = dispatch;
        sample
    }
}

impl ScrollSource for SmoothScroller {
    fn subscribe(&mut self, callback: Box<dyn FnMut(ScrollSample)>) -> Unsubscribe {
        self.next_sub += 1;
        let id = self.next_sub;
        self.subscribers.borrow_mut().callbacks.insert(id, callback);
        let weak: Weak<RefCell<Subscribers>> = Rc::downgrade(&self.subscribers);
        Unsubscribe::new(move || {
            if let Some(subs) = weak.upgrade() {
                let mut subs = subs.borrow_mut();
                if subs.callbacks.remove(&id).is_none() {
                    subs.removed.push(id);
                }
            }
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scroll/source.rs"]
mod tests;
