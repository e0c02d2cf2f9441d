//! Cross-pool handle dispatch
//!
//! Handles carry no type, so every lookup walks the registered pools in
//! [`ResourceKind`] priority order and asks each one whether it owns the
//! handle. That is O(pool count) per call. Ownership is exclusive, so the
//! order never changes the answer; it is fixed so that dispatch is
//! deterministic regardless of registration order.

use crate::resource::{InstanceKind, Resource, ResourceKind, ResourcePool, StoragePool};
use ember_core::{DependencyTracker, PoolError, ResourceHandle};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("a {kind} pool is already registered")]
    DuplicatePool { kind: ResourceKind },

    #[error("no {kind} pool is registered")]
    MissingPool { kind: ResourceKind },

    #[error(transparent)]
    Pool(#[from] PoolError),
}

/// Stateless dispatcher over independently owned resource pools.
#[derive(Default)]
pub struct ResourceRegistry {
    pools: Vec<Box<dyn ResourcePool>>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a pool. At most one pool per kind.
    pub fn register_pool(&mut self, pool: Box<dyn ResourcePool>) -> Result<(), RegistryError> {
        let kind = pool.kind();
        if self.pools.iter().any(|p| p.kind() == kind) {
            return Err(RegistryError::DuplicatePool { kind });
        }
        let position = self.pools.partition_point(|p| p.kind() < kind);
        self.pools.insert(position, pool);
        tracing::debug!("Registered {kind} pool");
        Ok(())
    }

    /// Kinds with a registered pool, in dispatch order.
    pub fn pool_kinds(&self) -> impl Iterator<Item = ResourceKind> + '_ {
        self.pools.iter().map(|p| p.kind())
    }

    fn owner(&self, handle: ResourceHandle) -> Option<&dyn ResourcePool> {
        if !handle.is_valid() {
            return None;
        }
        self.pools
            .iter()
            .find(|p| p.owns(handle))
            .map(|p| &**p)
    }

    pub fn classify(&self, handle: ResourceHandle) -> Option<ResourceKind> {
        self.owner(handle).map(|p| p.kind())
    }

    pub fn owns(&self, handle: ResourceHandle) -> bool {
        self.owner(handle).is_some()
    }

    /// Destroy `handle` in whichever pool owns it. Returns false when no
    /// pool does: the handle is invalid or was already freed.
    pub fn free(&mut self, handle: ResourceHandle) -> bool {
        if !handle.is_valid() {
            return false;
        }
        match self.pools.iter_mut().find(|p| p.owns(handle)) {
            Some(pool) => {
                let kind = pool.kind();
                let destroyed = pool.destroy(handle);
                tracing::debug!("Freed {kind} {handle}");
                destroyed
            }
            None => {
                tracing::debug!("Free of unowned {handle} ignored");
                false
            }
        }
    }

    pub fn base_type(&self, handle: ResourceHandle) -> InstanceKind {
        self.classify(handle)
            .map_or(InstanceKind::None, ResourceKind::instance_kind)
    }

    /// Register on `tracker` the dependency of `base` and of everything
    /// `base` binds through declared implicit edges (a multimesh's mesh).
    ///
    /// Bases whose kind does not track dependencies are ignored.
    pub fn propagate_dependency(&self, base: ResourceHandle, tracker: &mut DependencyTracker) {
        let max_depth = ResourceKind::schema_depth();
        // (handle, kinds it may resolve to, depth); the root may be anything.
        let mut pending: Vec<(ResourceHandle, Option<&'static [ResourceKind]>, usize)> =
            vec![(base, None, 0)];

        while let Some((handle, allowed, depth)) = pending.pop() {
            let Some(pool) = self.owner(handle) else {
                continue;
            };
            let kind = pool.kind();
            if allowed.is_some_and(|kinds| !kinds.contains(&kind)) {
                tracing::warn!("{handle} is bound as a base but is a {kind}; edge skipped");
                continue;
            }
            if !kind.tracks_dependencies() {
                continue;
            }
            if depth >= max_depth {
                tracing::warn!("Dependency chain through {handle} exceeds schema depth");
                continue;
            }

            if let Some(dependency) = pool.dependency(handle) {
                tracker.register_dependency(dependency);
            }

            let edge_kinds = kind.implicit_edge_kinds();
            if edge_kinds.is_empty() {
                continue;
            }
            for target in pool.implicit_bases(handle) {
                pending.push((target, Some(edge_kinds), depth + 1));
            }
        }
    }

    /// Flush deferred updates in every pool.
    pub fn update_dirty_resources(&mut self) {
        for pool in &mut self.pools {
            pool.update_dirty();
        }
    }

    pub fn pool<P: ResourcePool>(&self) -> Option<&P> {
        self.pools.iter().find_map(|p| p.as_any().downcast_ref::<P>())
    }

    pub fn pool_mut<P: ResourcePool>(&mut self) -> Option<&mut P> {
        self.pools
            .iter_mut()
            .find_map(|p| p.as_any_mut().downcast_mut::<P>())
    }

    /// Allocate `value` in the storage pool for its kind.
    pub fn create<T: Resource>(&mut self, value: T) -> Result<ResourceHandle, RegistryError> {
        let pool = self
            .pool_mut::<StoragePool<T>>()
            .ok_or(RegistryError::MissingPool { kind: T::KIND })?;
        Ok(pool.allocate(value)?)
    }

    pub fn get<T: Resource>(&self, handle: ResourceHandle) -> Option<&T> {
        self.pool::<StoragePool<T>>()?.get(handle)
    }

    pub fn get_mut<T: Resource>(&mut self, handle: ResourceHandle) -> Option<&mut T> {
        self.pool_mut::<StoragePool<T>>()?.get_mut(handle)
    }

    /// Live resources across all pools.
    pub fn len(&self) -> usize {
        self.pools.iter().map(|p| p.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
