//! Resource kinds and the pool contract
//!
//! Every pool owns exactly one [`ResourceKind`]. The registry never looks
//! inside a pool; it only asks "do you own this handle?" and, for the owner,
//! "destroy it" or "give me its dependency".

use ember_core::{Dependency, HandleAllocator, PoolError, ResourceHandle, SlotPool};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Resource kinds, declared in dispatch priority order.
///
/// Handles are owned by exactly one pool, so the order only matters for
/// determinism; it is kept stable for that reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ResourceKind {
    RenderTarget,
    Texture,
    CanvasTexture,
    Shader,
    Material,
    Mesh,
    Multimesh,
    MeshInstance,
    Light,
    Lightmap,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 10] = [
        ResourceKind::RenderTarget,
        ResourceKind::Texture,
        ResourceKind::CanvasTexture,
        ResourceKind::Shader,
        ResourceKind::Material,
        ResourceKind::Mesh,
        ResourceKind::Multimesh,
        ResourceKind::MeshInstance,
        ResourceKind::Light,
        ResourceKind::Lightmap,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ResourceKind::RenderTarget => "render target",
            ResourceKind::Texture => "texture",
            ResourceKind::CanvasTexture => "canvas texture",
            ResourceKind::Shader => "shader",
            ResourceKind::Material => "material",
            ResourceKind::Mesh => "mesh",
            ResourceKind::Multimesh => "multimesh",
            ResourceKind::MeshInstance => "mesh instance",
            ResourceKind::Light => "light",
            ResourceKind::Lightmap => "lightmap",
        }
    }

    /// Instance type a scene instance gets when this kind is its base.
    pub fn instance_kind(self) -> InstanceKind {
        match self {
            ResourceKind::Mesh => InstanceKind::Mesh,
            ResourceKind::Multimesh => InstanceKind::Multimesh,
            ResourceKind::Light => InstanceKind::Light,
            ResourceKind::Lightmap => InstanceKind::Lightmap,
            _ => InstanceKind::None,
        }
    }

    /// Kinds whose changes propagate to dependent instances.
    pub fn tracks_dependencies(self) -> bool {
        matches!(
            self,
            ResourceKind::Mesh | ResourceKind::Multimesh | ResourceKind::Light
        )
    }

    /// Declared implicit edges: a dependent of this kind also depends on
    /// the resources of these kinds that it binds. Must stay acyclic.
    pub fn implicit_edge_kinds(self) -> &'static [ResourceKind] {
        match self {
            ResourceKind::Multimesh => &[ResourceKind::Mesh],
            _ => &[],
        }
    }

    /// Length of the longest implicit-edge chain starting at this kind.
    pub fn edge_depth(self) -> usize {
        1 + self
            .implicit_edge_kinds()
            .iter()
            .map(|kind| kind.edge_depth())
            .max()
            .unwrap_or(0)
    }

    /// Upper bound on dependency propagation depth for any base.
    pub fn schema_depth() -> usize {
        Self::ALL.iter().map(|kind| kind.edge_depth()).max().unwrap_or(1)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Base types a scene instance can be created from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstanceKind {
    None,
    Mesh,
    Multimesh,
    Light,
    Lightmap,
}

/// Resource kinds the backend does not implement yet.
///
/// None of these has a pool, so their handles are never allocated and
/// `free` cannot meet them. Adding one means a `ResourceKind` variant, a
/// payload in `storage`, and a pool registration in the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnimplementedKind {
    ReflectionProbe,
    LightmapCapture,
    CanvasOccluder,
    CanvasLightShadow,
}

/// A payload stored in a [`StoragePool`].
pub trait Resource: 'static {
    const KIND: ResourceKind;

    fn dependency(&self) -> Option<&Dependency> {
        None
    }

    /// Resources this one binds through its kind's implicit edges.
    fn implicit_bases(&self) -> Vec<ResourceHandle> {
        Vec::new()
    }

    /// Release GPU-side objects before the payload is dropped.
    fn release(&mut self) {}

    /// Flush pending changes; returns true if anything was dirty.
    fn update_dirty(&mut self) -> bool {
        false
    }
}

/// Ownership test and type-erased destruction for one resource kind.
pub trait ResourcePool: Any {
    fn kind(&self) -> ResourceKind;

    fn owns(&self, handle: ResourceHandle) -> bool;

    /// Destroy the resource; false if this pool does not own `handle`.
    fn destroy(&mut self, handle: ResourceHandle) -> bool;

    fn dependency(&self, handle: ResourceHandle) -> Option<&Dependency>;

    fn implicit_bases(&self, handle: ResourceHandle) -> Vec<ResourceHandle>;

    fn update_dirty(&mut self) {}

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Generic pool for any [`Resource`] payload.
pub struct StoragePool<T: Resource> {
    allocator: Arc<HandleAllocator>,
    items: SlotPool<T>,
}

impl<T: Resource> StoragePool<T> {
    pub fn new(allocator: Arc<HandleAllocator>) -> Self {
        Self {
            allocator,
            items: SlotPool::new(),
        }
    }

    pub fn allocate(&mut self, value: T) -> Result<ResourceHandle, PoolError> {
        let handle = self.allocator.allocate();
        self.items.insert(handle, value)?;
        tracing::trace!("Allocated {} {}", T::KIND, handle);
        Ok(handle)
    }

    pub fn get(&self, handle: ResourceHandle) -> Option<&T> {
        self.items.get(handle)
    }

    pub fn get_mut(&mut self, handle: ResourceHandle) -> Option<&mut T> {
        self.items.get_mut(handle)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ResourceHandle, &T)> {
        self.items.iter()
    }
}

impl<T: Resource> ResourcePool for StoragePool<T> {
    fn kind(&self) -> ResourceKind {
        T::KIND
    }

    fn owns(&self, handle: ResourceHandle) -> bool {
        self.items.contains(handle)
    }

    fn destroy(&mut self, handle: ResourceHandle) -> bool {
        match self.items.remove(handle) {
            Ok(mut value) => {
                if let Some(dependency) = value.dependency() {
                    dependency.deleted_notify();
                }
                value.release();
                tracing::trace!("Freed {} {}", T::KIND, handle);
                true
            }
            Err(_) => false,
        }
    }

    fn dependency(&self, handle: ResourceHandle) -> Option<&Dependency> {
        self.items.get(handle).and_then(Resource::dependency)
    }

    fn implicit_bases(&self, handle: ResourceHandle) -> Vec<ResourceHandle> {
        self.items
            .get(handle)
            .map(Resource::implicit_bases)
            .unwrap_or_default()
    }

    fn update_dirty(&mut self) {
        let updated = self
            .items
            .iter_mut()
            .map(|(_, value)| value.update_dirty())
            .filter(|&updated| updated)
            .count();
        if updated > 0 {
            tracing::trace!("Updated {updated} dirty {}", T::KIND);
        }
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Blob {
        dirty: bool,
    }

    impl Resource for Blob {
        const KIND: ResourceKind = ResourceKind::Shader;

        fn update_dirty(&mut self) -> bool {
            std::mem::replace(&mut self.dirty, false)
        }
    }

    #[test]
    fn test_priority_order_matches_declaration() {
        let mut sorted = ResourceKind::ALL;
        sorted.sort();
        assert_eq!(sorted, ResourceKind::ALL);
        assert!(ResourceKind::Texture < ResourceKind::Material);
        assert!(ResourceKind::Material < ResourceKind::Mesh);
        assert!(ResourceKind::Mesh < ResourceKind::Light);
    }

    #[test]
    fn test_edge_schema() {
        assert_eq!(ResourceKind::Mesh.edge_depth(), 1);
        assert_eq!(ResourceKind::Multimesh.edge_depth(), 2);
        assert_eq!(ResourceKind::schema_depth(), 2);
        for kind in ResourceKind::ALL {
            for target in kind.implicit_edge_kinds() {
                assert!(target.tracks_dependencies());
            }
        }
    }

    #[test]
    fn test_storage_pool_lifecycle() {
        let allocator = Arc::new(HandleAllocator::new());
        let mut pool = StoragePool::new(Arc::clone(&allocator));
        let handle = pool.allocate(Blob { dirty: true }).unwrap();

        assert_eq!(pool.kind(), ResourceKind::Shader);
        assert!(pool.owns(handle));
        assert!(pool.dependency(handle).is_none());

        pool.update_dirty();
        assert!(!pool.get(handle).unwrap().dirty);

        assert!(pool.destroy(handle));
        assert!(!pool.destroy(handle));
        assert!(pool.is_empty());
    }
}
