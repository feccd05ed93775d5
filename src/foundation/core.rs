use crate::foundation::error::{ScrublineError, ScrublineResult};

pub use kurbo::{Point, Rect, Size, Vec2};

/// Opaque handle to an animatable thing owned by the presentation layer.
///
/// The engine never owns target lifetime; it only addresses targets through
/// [`AnimatableHost`](crate::AnimatableHost).
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct TargetId(pub u32);

/// Handle to an object managed by a phase controller.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct ObjectId(pub u64);

/// Handle to a disposal scope (typically one mounted component).
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct OwnerId(pub u64);

/// Handle to a timeline registered with a scheduler.
///
/// Ids are never reused, so a stale handle addresses nothing rather than a newer timeline.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct TimelineId(pub u64);

/// Handle to a scroll binding registered with a scheduler.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct BindingId(pub u64);

/// Handle to a per-frame listener registered with a scheduler.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct ListenerId(pub u64);

/// Monotonic id source shared by every registry in a scheduler.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct IdSeq(u64);

impl IdSeq {
    pub(crate) fn next(&mut self) -> u64 {
        self.0 += 1;
        self.0
    }
}

/// Viewport size and scroll extent as reported by the layout provider.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Viewport {
    /// Visible width in pixels.
    pub width: f64,
    /// Visible height in pixels.
    pub height: f64,
    /// Scroll offset at which target geometry was measured.
    pub scroll: f64,
    /// Largest reachable scroll offset (`document height - viewport height`).
    pub max_scroll: f64,
}

impl Viewport {
    /// Create a validated viewport.
    pub fn new(width: f64, height: f64, scroll: f64, max_scroll: f64) -> ScrublineResult<Self> {
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(ScrublineError::validation(
                "Viewport width/height must be finite and > 0",
            ));
        }
        if !(scroll.is_finite() && max_scroll.is_finite()) || max_scroll < 0.0 {
            return Err(ScrublineError::validation(
                "Viewport scroll values must be finite and max_scroll >= 0",
            ));
        }
        Ok(Self {
            width,
            height,
            scroll,
            max_scroll,
        })
    }

    /// Visible size.
    pub fn size(self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Return `true` when the visible size differs from `other` (scroll is ignored).
    pub fn size_differs(self, other: Viewport) -> bool {
        self.width != other.width || self.height != other.height
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
