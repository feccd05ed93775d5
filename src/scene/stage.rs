use crate::animation::target::{AnimatableHost, LayoutProvider, PinPose, PinSurface};
use crate::animation::value::{PropValue, PropertyKey};
use crate::foundation::core::{Rect, TargetId, Viewport};
use crate::foundation::error::{ScrublineError, ScrublineResult};
use std::collections::BTreeMap;

/// How a stage target is currently positioned.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutMode {
    /// Positioned by document flow; moves with scroll.
    Flow,
    /// Fixed to the viewport at the given pose.
    Fixed(PinPose),
}

#[derive(Clone, Debug)]
struct StageTarget {
    name: String,
    doc_bounds: Rect,
    props: BTreeMap<PropertyKey, PropValue>,
    mode: LayoutMode,
}

/// In-memory presentation layer.
///
/// Holds named targets with document-space flow boxes and property bags, plus the viewport and
/// scroll offset. Used by the simulator and by tests; real front-ends implement the same traits
/// over their own scene graph.
#[derive(Clone, Debug)]
pub struct Stage {
    width: f64,
    height: f64,
    document_height: f64,
    scroll: f64,
    targets: BTreeMap<TargetId, StageTarget>,
    names: BTreeMap<String, TargetId>,
    next_id: u32,
}

/// Serializable view of one target, used for simulation traces.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct TargetSnapshot {
    /// Target name.
    pub name: String,
    /// Current property values.
    pub props: BTreeMap<PropertyKey, PropValue>,
    /// Current positioning mode.
    pub mode: LayoutMode,
}

impl Stage {
    /// Create a stage with a `width x height` viewport over a document `document_height` tall.
    pub fn new(width: f64, height: f64, document_height: f64) -> ScrublineResult<Self> {
        Viewport::new(width, height, 0.0, (document_height - height).max(0.0))?;
        if !document_height.is_finite() {
            return Err(ScrublineError::validation("document height must be finite"));
        }
        Ok(Self {
            width,
            height,
            document_height,
            scroll: 0.0,
            targets: BTreeMap::new(),
            names: BTreeMap::new(),
            next_id: 0,
        })
    }

    /// Mount a target with its document-space flow box.
    pub fn add_target(&mut self, name: impl Into<String>, doc_bounds: Rect) -> ScrublineResult<TargetId> {
        let name = name.into();
        if self.names.contains_key(&name) {
            return Err(ScrublineError::validation(format!(
                "duplicate target name '{name}'"
            )));
        }
        let id = TargetId(self.next_id);
        self.next_id += 1;
        self.names.insert(name.clone(), id);
        self.targets.insert(
            id,
            StageTarget {
                name,
                doc_bounds,
                props: BTreeMap::new(),
                mode: LayoutMode::Flow,
            },
        );
        Ok(id)
    }

    /// Unmount a target. Later writes addressing it are rejected.
    pub fn remove_target(&mut self, id: TargetId) -> bool {
        let Some(t) = self.targets.remove(&id) else {
            return false;
        };
        self.names.remove(&t.name);
        true
    }

    /// Look up a target by name.
    pub fn target_id(&self, name: &str) -> Option<TargetId> {
        self.names.get(name).copied()
    }

    /// Set the current scroll offset (clamped to the scrollable range).
    pub fn set_scroll(&mut self, scroll: f64) {
        self.scroll = scroll.clamp(0.0, self.max_scroll());
    }

    /// Current scroll offset.
    pub fn scroll(&self) -> f64 {
        self.scroll
    }

    /// Largest reachable scroll offset.
    pub fn max_scroll(&self) -> f64 {
        (self.document_height - self.height).max(0.0)
    }

    /// Change viewport and document size.
    pub fn resize(&mut self, width: f64, height: f64, document_height: f64) -> ScrublineResult<()> {
        Viewport::new(width, height, 0.0, (document_height - height).max(0.0))?;
        self.width = width;
        self.height = height;
        self.document_height = document_height;
        self.scroll = self.scroll.clamp(0.0, self.max_scroll());
        Ok(())
    }

    /// Move a target's flow box (e.g. after reflow).
    pub fn set_doc_bounds(&mut self, id: TargetId, doc_bounds: Rect) -> bool {
        let Some(t) = self.targets.get_mut(&id) else {
            return false;
        };
        t.doc_bounds = doc_bounds;
        true
    }

    /// Current value of a property, including defaults for built-in keys.
    pub fn prop(&self, id: TargetId, key: &PropertyKey) -> Option<PropValue> {
        self.read(id, key)
    }

    /// Current scalar value of a property.
    pub fn scalar(&self, id: TargetId, key: impl Into<PropertyKey>) -> Option<f64> {
        self.read(id, &key.into()).and_then(PropValue::as_scalar)
    }

    /// Current positioning mode.
    pub fn layout_mode(&self, id: TargetId) -> Option<LayoutMode> {
        self.targets.get(&id).map(|t| t.mode)
    }

    /// Snapshot every target, keyed by name.
    pub fn snapshot(&self) -> BTreeMap<String, TargetSnapshot> {
        self.targets
            .values()
            .map(|t| {
                let mut props = t.props.clone();
                for key in [
                    PropertyKey::X,
                    PropertyKey::Y,
                    PropertyKey::Scale,
                    PropertyKey::Rotation,
                    PropertyKey::Opacity,
                ] {
                    if let Some(v) = builtin_default(&key) {
                        props.entry(key).or_insert(v);
                    }
                }
                (
                    t.name.clone(),
                    TargetSnapshot {
                        name: t.name.clone(),
                        props,
                        mode: t.mode,
                    },
                )
            })
            .collect()
    }
}

fn builtin_default(key: &PropertyKey) -> Option<PropValue> {
    match key {
        PropertyKey::X | PropertyKey::Y | PropertyKey::Rotation => Some(PropValue::Scalar(0.0)),
        PropertyKey::Scale | PropertyKey::Opacity => Some(PropValue::Scalar(1.0)),
        PropertyKey::Custom(_) => None,
    }
}

impl AnimatableHost for Stage {
    fn contains(&self, target: TargetId) -> bool {
        self.targets.contains_key(&target)
    }

    fn read(&self, target: TargetId, key: &PropertyKey) -> Option<PropValue> {
        let t = self.targets.get(&target)?;
        t.props.get(key).copied().or_else(|| builtin_default(key))
    }

    fn write(&mut self, target: TargetId, key: &PropertyKey, value: PropValue) -> bool {
        let Some(t) = self.targets.get_mut(&target) else {
            return false;
        };
        t.props.insert(key.clone(), value);
        true
    }
}

impl LayoutProvider for Stage {
    fn viewport(&self) -> Viewport {
        Viewport {
            width: self.width,
            height: self.height,
            scroll: self.scroll,
            max_scroll: self.max_scroll(),
        }
    }

    fn flow_bounds(&self, target: TargetId) -> Option<Rect> {
        let t = self.targets.get(&target)?;
        Some(t.doc_bounds - kurbo::Vec2::new(0.0, self.scroll))
    }
}

impl PinSurface for Stage {
    fn set_fixed_mode(&mut self, target: TargetId, pose: PinPose) -> bool {
        let Some(t) = self.targets.get_mut(&target) else {
            return false;
        };
        t.mode = LayoutMode::Fixed(pose);
        true
    }

    fn set_flow_mode(&mut self, target: TargetId) -> bool {
        let Some(t) = self.targets.get_mut(&target) else {
            return false;
        };
        t.mode = LayoutMode::Flow;
        true
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/stage.rs"]
mod tests;
