//! Resource payloads for every [`ResourceKind`]
//!
//! These carry just enough state for the registry to dispatch over them:
//! dependency objects on the kinds that track dependencies, bound handles
//! for implicit edges, and dirty flags for deferred updates.

use crate::resource::{Resource, ResourceKind};
use ember_core::{Dependency, ResourceHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFormat {
    Rgba8,
    Rgba16F,
    Bc1,
    Bc7,
    Etc2Rgba8,
    Rgtc2,
}

#[derive(Debug)]
pub struct Texture {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub mipmaps: bool,
}

impl Resource for Texture {
    const KIND: ResourceKind = ResourceKind::Texture;
}

#[derive(Debug)]
pub struct RenderTarget {
    pub width: u32,
    pub height: u32,
    pub msaa_samples: u32,
}

impl Resource for RenderTarget {
    const KIND: ResourceKind = ResourceKind::RenderTarget;
}

/// 2D texture bundle (diffuse plus optional normal/specular maps).
#[derive(Debug, Default)]
pub struct CanvasTexture {
    pub diffuse: Option<ResourceHandle>,
    pub normal: Option<ResourceHandle>,
    pub specular: Option<ResourceHandle>,
}

impl Resource for CanvasTexture {
    const KIND: ResourceKind = ResourceKind::CanvasTexture;
}

#[derive(Debug, Default)]
pub struct Shader {
    pub code: String,
}

impl Resource for Shader {
    const KIND: ResourceKind = ResourceKind::Shader;

    fn release(&mut self) {
        self.code.clear();
    }
}

#[derive(Debug, Default)]
pub struct Material {
    pub shader: Option<ResourceHandle>,
    pub queued_for_update: bool,
}

impl Material {
    pub fn set_shader(&mut self, shader: Option<ResourceHandle>) {
        self.shader = shader;
        self.queued_for_update = true;
    }
}

impl Resource for Material {
    const KIND: ResourceKind = ResourceKind::Material;

    fn update_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.queued_for_update, false)
    }
}

#[derive(Debug, Default)]
pub struct Mesh {
    pub surface_count: u32,
    pub dependency: Dependency,
}

impl Mesh {
    pub fn with_surfaces(surface_count: u32) -> Self {
        Self {
            surface_count,
            dependency: Dependency::new(),
        }
    }

    pub fn add_surface(&mut self) {
        self.surface_count += 1;
        self.dependency.changed_notify();
    }

    pub fn clear(&mut self) {
        self.surface_count = 0;
        self.dependency.changed_notify();
    }
}

impl Resource for Mesh {
    const KIND: ResourceKind = ResourceKind::Mesh;

    fn dependency(&self) -> Option<&Dependency> {
        Some(&self.dependency)
    }

    fn release(&mut self) {
        self.surface_count = 0;
    }
}

#[derive(Debug, Default)]
pub struct Multimesh {
    pub mesh: Option<ResourceHandle>,
    pub instance_count: u32,
    pub dirty: bool,
    pub dependency: Dependency,
}

impl Multimesh {
    pub fn new(mesh: Option<ResourceHandle>, instance_count: u32) -> Self {
        Self {
            mesh,
            instance_count,
            dirty: true,
            dependency: Dependency::new(),
        }
    }

    pub fn set_mesh(&mut self, mesh: Option<ResourceHandle>) {
        self.mesh = mesh;
        self.dirty = true;
        self.dependency.changed_notify();
    }

    pub fn set_instance_count(&mut self, instance_count: u32) {
        self.instance_count = instance_count;
        self.dirty = true;
        self.dependency.changed_notify();
    }
}

impl Resource for Multimesh {
    const KIND: ResourceKind = ResourceKind::Multimesh;

    fn dependency(&self) -> Option<&Dependency> {
        Some(&self.dependency)
    }

    fn implicit_bases(&self) -> Vec<ResourceHandle> {
        self.mesh.filter(ResourceHandle::is_valid).into_iter().collect()
    }

    fn update_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }
}

/// Skinned or blend-shaped copy of a mesh.
#[derive(Debug)]
pub struct MeshInstance {
    pub mesh: ResourceHandle,
}

impl Resource for MeshInstance {
    const KIND: ResourceKind = ResourceKind::MeshInstance;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightType {
    Directional,
    Omni,
    Spot,
}

#[derive(Debug)]
pub struct Light {
    pub light_type: LightType,
    pub energy: f32,
    pub dependency: Dependency,
}

impl Light {
    pub fn new(light_type: LightType) -> Self {
        Self {
            light_type,
            energy: 1.0,
            dependency: Dependency::new(),
        }
    }

    pub fn set_energy(&mut self, energy: f32) {
        self.energy = energy;
        self.dependency.changed_notify();
    }
}

impl Resource for Light {
    const KIND: ResourceKind = ResourceKind::Light;

    fn dependency(&self) -> Option<&Dependency> {
        Some(&self.dependency)
    }
}

#[derive(Debug, Default)]
pub struct Lightmap {
    pub texture: Option<ResourceHandle>,
}

impl Resource for Lightmap {
    const KIND: ResourceKind = ResourceKind::Lightmap;
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_core::DependencyTracker;

    #[test]
    fn test_multimesh_implicit_bases() {
        let mesh = ResourceHandle::from_raw(3);
        assert_eq!(Multimesh::new(Some(mesh), 4).implicit_bases(), vec![mesh]);
        assert!(Multimesh::new(None, 4).implicit_bases().is_empty());
        assert!(Multimesh::new(Some(ResourceHandle::NULL), 4)
            .implicit_bases()
            .is_empty());
    }

    #[test]
    fn test_mesh_changes_invalidate_trackers() {
        let mut mesh = Mesh::with_surfaces(1);
        let mut tracker = DependencyTracker::new();
        tracker.register_dependency(&mesh.dependency);

        mesh.add_surface();
        assert!(tracker.is_invalidated_by(&mesh.dependency));
    }

    #[test]
    fn test_material_update_queue() {
        let mut material = Material::default();
        material.set_shader(Some(ResourceHandle::from_raw(9)));
        assert!(material.update_dirty());
        assert!(!material.update_dirty());
    }
}
