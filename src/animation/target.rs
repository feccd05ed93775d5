use crate::animation::value::{PropValue, PropertyKey};
use crate::foundation::core::{Rect, TargetId, Viewport};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Property read/write interface implemented by the presentation layer.
///
/// Every method must tolerate ids of targets that no longer exist.
pub trait AnimatableHost {
    /// Return `true` when `target` is currently mounted.
    fn contains(&self, target: TargetId) -> bool;

    /// Read the current value of a property, `None` if unknown or unmounted.
    fn read(&self, target: TargetId, key: &PropertyKey) -> Option<PropValue>;

    /// Write a property value. Returns `false` when the target is gone.
    fn write(&mut self, target: TargetId, key: &PropertyKey, value: PropValue) -> bool;
}

/// Layout/geometry provider consumed by trigger regions and pinning.
pub trait LayoutProvider {
    /// Current viewport and scroll extent.
    fn viewport(&self) -> Viewport;

    /// Viewport-relative bounds of the target's in-flow box, measured at [`Viewport::scroll`].
    ///
    /// For a pinned target this is the box it would occupy if it were not pinned.
    fn flow_bounds(&self, target: TargetId) -> Option<Rect>;
}

/// Viewport-fixed placement handed to [`PinSurface::set_fixed_mode`].
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PinPose {
    /// Target rectangle in viewport coordinates.
    pub rect: Rect,
}

/// Positioning capability used for pinning.
pub trait PinSurface {
    /// Switch `target` to viewport-fixed positioning at `pose`. Returns `false` when the target is gone.
    fn set_fixed_mode(&mut self, target: TargetId, pose: PinPose) -> bool;

    /// Return `target` to flow-relative positioning. Returns `false` when the target is gone.
    fn set_flow_mode(&mut self, target: TargetId) -> bool;
}

/// Everything the engine needs from the presentation layer.
pub trait Host: AnimatableHost + LayoutProvider + PinSurface {}

impl<T> Host for T where T: AnimatableHost + LayoutProvider + PinSurface + ?Sized {}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum WriteMode {
    /// Later writes replace earlier ones.
    Overwrite,
    /// Only fill properties nobody wrote yet this pass.
    FillMissing,
}

/// Property writes collected during one evaluation pass.
///
/// Reads through a `WriteSet` observe pending writes first, so a tween that captures its start
/// value sees what earlier children produced in the same pass.
#[derive(Debug, Default)]
pub struct WriteSet {
    writes: BTreeMap<(TargetId, PropertyKey), PropValue>,
    missing: BTreeSet<TargetId>,
}

impl WriteSet {
    /// Create an empty write set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pending property writes.
    pub fn len(&self) -> usize {
        self.writes.len()
    }

    /// Return `true` when nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Pending value for one property, if any.
    pub fn pending(&self, target: TargetId, key: &PropertyKey) -> Option<PropValue> {
        self.writes.get(&(target, key.clone())).copied()
    }

    pub(crate) fn put(
        &mut self,
        target: TargetId,
        key: &PropertyKey,
        value: PropValue,
        mode: WriteMode,
    ) {
        match mode {
            WriteMode::Overwrite => {
                self.writes.insert((target, key.clone()), value);
            }
            WriteMode::FillMissing => {
                self.writes.entry((target, key.clone())).or_insert(value);
            }
        }
    }

    pub(crate) fn note_missing(&mut self, target: TargetId) {
        self.missing.insert(target);
    }

    pub(crate) fn read<H>(&self, host: &H, target: TargetId, key: &PropertyKey) -> Option<PropValue>
    where
        H: AnimatableHost + ?Sized,
    {
        self.pending(target, key).or_else(|| host.read(target, key))
    }

    /// Flush writes to `host`, returning the distinct targets that were missing.
    pub fn apply<H>(self, host: &mut H) -> Vec<TargetId>
    where
        H: AnimatableHost + ?Sized,
    {
        let mut missing = self.missing;
        for ((target, key), value) in self.writes {
            if missing.contains(&target) {
                continue;
            }
            if !host.write(target, &key, value) {
                missing.insert(target);
            }
        }
        missing.into_iter().collect()
    }
}

/// Logs each missing target at most once.
#[derive(Debug, Default)]
pub(crate) struct MissingTargets {
    reported: HashSet<TargetId>,
}

impl MissingTargets {
    pub(crate) fn report(&mut self, target: TargetId, context: &str) {
        if self.reported.insert(target) {
            tracing::warn!(target_id = target.0, context, "animation target is not mounted; skipping");
        }
    }

    pub(crate) fn report_all(&mut self, targets: &[TargetId], context: &str) {
        for &t in targets {
            self.report(t, context);
        }
    }

    pub(crate) fn forget(&mut self, target: TargetId) {
        self.reported.remove(&target);
    }

    pub(crate) fn count(&self) -> usize {
        self.reported.len()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/target.rs"]
mod tests;
