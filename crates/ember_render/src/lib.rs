//! Ember Render Backend
//!
//! Driver-facing layer of an OpenGL-family renderer:
//! - Capability probing into a frozen [`CapabilityTable`]
//! - A [`ResourceRegistry`] that frees and classifies opaque handles across
//!   independently owned resource pools
//! - A [`RenderBackend`] tying both to a timestamp profiler for one context

pub mod backend;
pub mod capabilities;
pub mod context;
pub mod registry;
pub mod resource;
pub mod storage;
pub mod timer;
#[cfg(feature = "wgpu")]
pub mod wgpu_context;

pub use backend::RenderBackend;
pub use capabilities::CapabilityTable;
pub use context::{DriverContext, FloatQuery, HeadlessContext, IntegerQuery, StringQuery};
pub use registry::{RegistryError, ResourceRegistry};
pub use resource::{
    InstanceKind, Resource, ResourceKind, ResourcePool, StoragePool, UnimplementedKind,
};
pub use timer::HeadlessTimer;
#[cfg(feature = "wgpu")]
pub use wgpu_context::WgpuContext;

#[cfg(feature = "wgpu")]
pub use wgpu;

/// Graphics API flavour of the context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlApi {
    /// Desktop OpenGL 3.3 core
    Desktop,
    /// OpenGL ES 3.0 / WebGL2
    Es,
}

/// Operating system the context runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetOs {
    Windows,
    MacOs,
    Linux,
    Android,
    Ios,
    Web,
}

impl TargetOs {
    pub fn current() -> Self {
        if cfg!(target_os = "android") {
            TargetOs::Android
        } else if cfg!(target_os = "ios") {
            TargetOs::Ios
        } else if cfg!(target_arch = "wasm32") {
            TargetOs::Web
        } else if cfg!(target_os = "windows") {
            TargetOs::Windows
        } else if cfg!(target_os = "macos") {
            TargetOs::MacOs
        } else {
            TargetOs::Linux
        }
    }

    /// Mobile-class platforms get conservative texture-format policy.
    pub fn is_mobile(&self) -> bool {
        matches!(self, TargetOs::Android | TargetOs::Ios)
    }
}

/// Platform identity used by capability policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Platform {
    pub api: GlApi,
    pub os: TargetOs,
}

impl Platform {
    pub fn desktop_gl(os: TargetOs) -> Self {
        Self { api: GlApi::Desktop, os }
    }

    pub fn gles(os: TargetOs) -> Self {
        Self { api: GlApi::Es, os }
    }

    /// GLES on mobile and web, desktop GL everywhere else.
    pub fn current() -> Self {
        let os = TargetOs::current();
        match os {
            TargetOs::Android | TargetOs::Ios | TargetOs::Web => Self::gles(os),
            _ => Self::desktop_gl(os),
        }
    }
}

/// Adapter class reported to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeviceType {
    #[default]
    Other,
    IntegratedGpu,
    DiscreteGpu,
    VirtualGpu,
    Cpu,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mobile_platforms() {
        assert!(TargetOs::Android.is_mobile());
        assert!(TargetOs::Ios.is_mobile());
        assert!(!TargetOs::Web.is_mobile());
        assert!(!TargetOs::Linux.is_mobile());
    }

    #[test]
    fn test_current_platform_is_consistent() {
        let platform = Platform::current();
        if platform.os.is_mobile() {
            assert_eq!(platform.api, GlApi::Es);
        }
    }
}
