//! Dependency edges for invalidation propagation
//!
//! Base resources (meshes, multimeshes, lights) own a [`Dependency`].
//! Anything that draws from them (scene instances) owns a
//! [`DependencyTracker`] and registers an edge to every dependency it
//! reads. When a base changes it bumps its version; trackers compare the
//! version they observed against the current one. When a base is freed it
//! flips a liveness flag shared with every edge, so trackers see the deletion
//! without holding the base.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_DEPENDENCY_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a dependency object, stable for its whole lifetime.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DependencyId(u64);

impl DependencyId {
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Change notifier embedded in a base resource.
#[derive(Debug)]
pub struct Dependency {
    id: DependencyId,
    version: u64,
    alive: Arc<AtomicBool>,
}

impl Dependency {
    pub fn new() -> Self {
        Self {
            id: DependencyId(NEXT_DEPENDENCY_ID.fetch_add(1, Ordering::Relaxed)),
            version: 0,
            alive: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn id(&self) -> DependencyId {
        self.id
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Mark the owning resource as changed. Every tracker holding an edge to
    /// this dependency now reports it as invalidated.
    pub fn changed_notify(&mut self) {
        self.version += 1;
    }

    /// Mark the owning resource as freed. Trackers with an edge to it report
    /// the edge as deleted from then on.
    pub fn deleted_notify(&self) {
        self.alive.store(false, Ordering::Release);
    }

    pub fn is_deleted(&self) -> bool {
        !self.alive.load(Ordering::Acquire)
    }
}

impl Default for Dependency {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Dependency {
    fn drop(&mut self) {
        self.deleted_notify();
    }
}

#[derive(Debug, Clone)]
struct Edge {
    observed_version: u64,
    pass: u64,
    alive: Arc<AtomicBool>,
}

impl Edge {
    fn is_deleted(&self) -> bool {
        !self.alive.load(Ordering::Acquire)
    }
}

/// The dependent side of a set of edges.
///
/// Edges are refreshed in passes: `update_begin`, then `register_dependency`
/// for everything still referenced, then `update_end` drops the edges that
/// were not touched during the pass.
#[derive(Debug, Default)]
pub struct DependencyTracker {
    edges: BTreeMap<DependencyId, Edge>,
    pass: u64,
}

impl DependencyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_dependency(&mut self, dependency: &Dependency) {
        let pass = self.pass;
        self.edges
            .entry(dependency.id())
            .and_modify(|edge| {
                edge.pass = pass;
                edge.observed_version = dependency.version();
            })
            .or_insert_with(|| Edge {
                observed_version: dependency.version(),
                pass,
                alive: Arc::clone(&dependency.alive),
            });
    }

    pub fn update_begin(&mut self) {
        self.pass += 1;
    }

    /// Drop every edge not registered since the last `update_begin`.
    /// Returns the removed dependency ids in ascending order.
    pub fn update_end(&mut self) -> Vec<DependencyId> {
        let pass = self.pass;
        let stale: Vec<DependencyId> = self
            .edges
            .iter()
            .filter(|(_, edge)| edge.pass != pass)
            .map(|(id, _)| *id)
            .collect();
        for id in &stale {
            self.edges.remove(id);
        }
        stale
    }

    pub fn depends_on(&self, dependency: &Dependency) -> bool {
        self.edges.contains_key(&dependency.id())
    }

    /// True if this tracker has an edge to `dependency` and the dependency
    /// changed after the edge was registered.
    pub fn is_invalidated_by(&self, dependency: &Dependency) -> bool {
        self.edges
            .get(&dependency.id())
            .is_some_and(|edge| edge.observed_version < dependency.version())
    }

    /// True if any dependency this tracker reads from has been freed.
    pub fn is_stale(&self) -> bool {
        self.edges.values().any(Edge::is_deleted)
    }

    /// Ids of edges whose dependency has been freed.
    pub fn deleted_edges(&self) -> impl Iterator<Item = DependencyId> + '_ {
        self.edges
            .iter()
            .filter(|(_, edge)| edge.is_deleted())
            .map(|(id, _)| *id)
    }

    /// Drop edges to freed dependencies and return their ids.
    pub fn prune_deleted(&mut self) -> Vec<DependencyId> {
        let deleted: Vec<DependencyId> = self.deleted_edges().collect();
        for id in &deleted {
            self.edges.remove(id);
        }
        deleted
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn edges(&self) -> impl Iterator<Item = DependencyId> + '_ {
        self.edges.keys().copied()
    }

    pub fn clear(&mut self) {
        self.edges.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_is_idempotent() {
        let dep = Dependency::new();
        let mut tracker = DependencyTracker::new();

        tracker.register_dependency(&dep);
        tracker.register_dependency(&dep);

        assert_eq!(tracker.edge_count(), 1);
        assert!(tracker.depends_on(&dep));
    }

    #[test]
    fn test_changed_notify_invalidates() {
        let mut dep = Dependency::new();
        let mut tracker = DependencyTracker::new();
        tracker.register_dependency(&dep);
        assert!(!tracker.is_invalidated_by(&dep));

        dep.changed_notify();
        assert!(tracker.is_invalidated_by(&dep));

        // Re-registering acknowledges the change
        tracker.register_dependency(&dep);
        assert!(!tracker.is_invalidated_by(&dep));
    }

    #[test]
    fn test_update_pass_drops_stale_edges() {
        let kept = Dependency::new();
        let dropped = Dependency::new();
        let mut tracker = DependencyTracker::new();
        tracker.register_dependency(&kept);
        tracker.register_dependency(&dropped);

        tracker.update_begin();
        tracker.register_dependency(&kept);
        let removed = tracker.update_end();

        assert_eq!(removed, vec![dropped.id()]);
        assert!(tracker.depends_on(&kept));
        assert!(!tracker.depends_on(&dropped));
    }

    #[test]
    fn test_unrelated_dependency_is_not_invalidating() {
        let mut other = Dependency::new();
        let tracker = DependencyTracker::new();
        other.changed_notify();
        assert!(!tracker.is_invalidated_by(&other));
    }

    #[test]
    fn test_deleted_notify_reaches_trackers() {
        let kept = Dependency::new();
        let freed = Dependency::new();
        let freed_id = freed.id();
        let mut tracker = DependencyTracker::new();
        tracker.register_dependency(&kept);
        tracker.register_dependency(&freed);
        assert!(!tracker.is_stale());

        freed.deleted_notify();
        assert!(freed.is_deleted());
        assert!(tracker.is_stale());
        assert_eq!(tracker.deleted_edges().collect::<Vec<_>>(), vec![freed_id]);

        assert_eq!(tracker.prune_deleted(), vec![freed_id]);
        assert!(!tracker.is_stale());
        assert!(tracker.depends_on(&kept));
    }

    #[test]
    fn test_dropping_dependency_marks_edges_deleted() {
        let mut tracker = DependencyTracker::new();
        {
            let dep = Dependency::new();
            tracker.register_dependency(&dep);
        }
        assert!(tracker.is_stale());
        assert_eq!(tracker.edge_count(), 1);
    }
}
