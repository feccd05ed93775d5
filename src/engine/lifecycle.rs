use crate::animation::target::Host;
use crate::engine::clock::FrameClock;
use crate::engine::scheduler::{Pending, Scheduler};
use crate::foundation::core::{BindingId, ListenerId, ObjectId, OwnerId, TimelineId, Viewport};
use crate::foundation::error::{ScrublineError, ScrublineResult};
use crate::phase::machine::Phase;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug)]
struct OwnerNode {
    label: String,
    parent: Option<OwnerId>,
    children: BTreeSet<OwnerId>,
}

/// Tree of disposal scopes.
#[derive(Debug, Default)]
pub(crate) struct Owners {
    nodes: BTreeMap<OwnerId, OwnerNode>,
}

impl Owners {
    fn insert(&mut self, id: OwnerId, label: String, parent: Option<OwnerId>) {
        if let Some(p) = parent.and_then(|p| self.nodes.get_mut(&p)) {
            p.children.insert(id);
        }
        self.nodes.insert(
            id,
            OwnerNode {
                label,
                parent,
                children: BTreeSet::new(),
            },
        );
    }

    pub(crate) fn is_live(&self, id: OwnerId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    fn label(&self, id: OwnerId) -> Option<&str> {
        self.nodes.get(&id).map(|n| n.label.as_str())
    }

    /// `id` and all descendants, children before parents.
    fn subtree_post_order(&self, id: OwnerId) -> Vec<OwnerId> {
        let mut out = Vec::new();
        let mut stack = vec![(id, false)];
        while let Some((node, expanded)) = stack.pop() {
            if expanded {
                out.push(node);
                continue;
            }
            let Some(n) = self.nodes.get(&node) else {
                continue;
            };
            stack.push((node, true));
            for &c in n.children.iter().rev() {
                stack.push((c, false));
            }
        }
        out
    }

    fn remove(&mut self, id: OwnerId) {
        let Some(node) = self.nodes.remove(&id) else {
            return;
        };
        if let Some(p) = node.parent.and_then(|p| self.nodes.get_mut(&p)) {
            p.children.remove(&id);
        }
    }

    fn roots(&self) -> Vec<OwnerId> {
        self.nodes
            .iter()
            .filter(|(_, n)| n.parent.is_none())
            .map(|(&id, _)| id)
            .collect()
    }
}

/// Debounces viewport size and scroll-extent changes.
#[derive(Debug, Default)]
pub(crate) struct ResizeDebounce {
    last: Option<Viewport>,
    pending_since: Option<f64>,
}

impl ResizeDebounce {
    /// Observe the current viewport; returns `true` once a change has been quiet for `debounce`.
    pub(crate) fn poll(&mut self, vp: Viewport, now: f64, debounce: f64) -> bool {
        match self.last {
            None => self.last = Some(vp),
            Some(prev) if prev.size_differs(vp) || prev.max_scroll != vp.max_scroll => {
                self.last = Some(vp);
                self.pending_since = Some(now);
            }
            Some(_) => {}
        }
        match self.pending_since {
            Some(since) if now - since >= debounce => {
                self.pending_since = None;
                true
            }
            _ => false,
        }
    }

    pub(crate) fn notify(&mut self, now: f64) {
        self.pending_since = Some(now);
    }

    pub(crate) fn is_pending(&self) -> bool {
        self.pending_since.is_some()
    }
}

impl<C: FrameClock> Scheduler<C> {
    /// Create a root disposal scope.
    pub fn create_owner(&mut self, label: impl Into<String>) -> OwnerId {
        let id = OwnerId(self.ids.next());
        self.owners.insert(id, label.into(), None);
        id
    }

    /// Create a scope disposed together with `parent`.
    pub fn create_child_owner(
        &mut self,
        parent: OwnerId,
        label: impl Into<String>,
    ) -> ScrublineResult<OwnerId> {
        if !self.owners.is_live(parent) {
            return Err(ScrublineError::validation(format!(
                "parent owner {} is not live",
                parent.0
            )));
        }
        let id = OwnerId(self.ids.next());
        self.owners.insert(id, label.into(), Some(parent));
        Ok(id)
    }

    /// Return `true` until `owner` is disposed.
    pub fn is_live_owner(&self, owner: OwnerId) -> bool {
        self.owners.is_live(owner)
    }

    /// Number of live owners.
    pub fn live_owners(&self) -> usize {
        self.owners.len()
    }

    /// Tear down `owner` and its descendants.
    ///
    /// Kills their timelines, removes their bindings (unpinning anchors that still exist),
    /// listeners and objects. Disposing an already-disposed owner is a no-op returning `false`.
    #[tracing::instrument(level = "debug", skip(self, host), fields(owner = owner.0))]
    pub fn dispose(&mut self, owner: OwnerId, host: &mut dyn Host) -> bool {
        if !self.owners.is_live(owner) {
            tracing::debug!("owner already disposed");
            return false;
        }
        for o in self.owners.subtree_post_order(owner) {
            let objects: Vec<ObjectId> = self
                .objects
                .iter()
                .filter(|(_, c)| c.owner == o)
                .map(|(&id, _)| id)
                .collect();
            for id in &objects {
                self.objects.remove(id);
            }
            let timelines: Vec<TimelineId> = self
                .timelines
                .iter()
                .filter(|(_, s)| s.owner == o)
                .map(|(&id, _)| id)
                .collect();
            for id in timelines {
                self.kill_quiet(id);
            }
            let bindings: Vec<BindingId> = self
                .bindings
                .iter()
                .filter(|(_, b)| b.owner() == o)
                .map(|(&id, _)| id)
                .collect();
            for id in bindings {
                self.remove_binding_quiet(id, host);
            }
            let listeners: Vec<ListenerId> = self
                .listeners
                .iter()
                .filter(|(_, l)| l.owner == o)
                .map(|(&id, _)| id)
                .collect();
            for id in listeners {
                self.listeners.remove(&id);
                self.stats.listeners_removed += 1;
            }
            tracing::debug!(
                owner = o.0,
                label = self.owners.label(o).unwrap_or_default(),
                objects = objects.len(),
                "owner disposed"
            );
            self.owners.remove(o);
        }

        let (timelines, bindings, objects) = (&self.timelines, &self.bindings, &self.objects);
        self.queue.retain(|p| match p {
            Pending::Completed { timeline, .. } => timelines.contains_key(timeline),
            Pending::Signal { binding, .. } => bindings.contains_key(binding),
            Pending::Phase { object, .. } => objects.contains_key(object),
        });
        self.sync_clock();
        true
    }

    /// Dispose every owner.
    pub fn dispose_all(&mut self, host: &mut dyn Host) {
        for root in self.owners.roots() {
            self.dispose(root, host);
        }
    }

    /// Request invalidation after content changed size without a viewport change.
    ///
    /// Runs once the resize debounce period has passed.
    pub fn notify_resize(&mut self) {
        self.resize.notify(self.time());
        self.sync_clock();
    }

    /// Recompute every region's markers from current layout now.
    ///
    /// Pinned anchors get a new fixed pose, objects in their intro restart it for the new
    /// viewport, and everything else keeps running untouched.
    #[tracing::instrument(level = "debug", skip(self, host))]
    pub fn invalidate(&mut self, host: &mut dyn Host) {
        let vp = host.viewport();
        for b in self.bindings.values_mut() {
            b.invalidate();
            if !b.resolve(&*host) || !b.repose(&mut *host) {
                self.missing.report(b.region().anchor, "invalidate");
            }
        }
        let intros: Vec<ObjectId> = self
            .objects
            .iter()
            .filter(|(_, c)| c.machine.phase() == Phase::Intro)
            .map(|(&id, _)| id)
            .collect();
        for obj in intros {
            self.restart_intro(obj, host);
        }
        tracing::debug!(width = vp.width, height = vp.height, "regions invalidated");
    }
}

#[cfg(test)]
#[path = "../../tests/unit/engine/lifecycle.rs"]
mod tests;
