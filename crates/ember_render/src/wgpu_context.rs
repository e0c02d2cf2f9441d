//! Driver queries answered by a wgpu adapter
//!
//! wgpu does not expose GL extension strings, so adapter features are mapped
//! onto the extension names the capability probe looks for.

use crate::context::{DriverContext, FloatQuery, IntegerQuery, StringQuery};
use crate::DeviceType;

pub struct WgpuContext {
    extensions: Vec<&'static str>,
    limits: wgpu::Limits,
    info: wgpu::AdapterInfo,
}

impl WgpuContext {
    pub fn from_adapter(adapter: &wgpu::Adapter) -> Self {
        let features = adapter.features();
        let info = adapter.get_info();

        // Sampler anisotropy and two-channel formats are core in every backend.
        let mut extensions = vec!["GL_EXT_texture_filter_anisotropic", "GL_EXT_texture_rg"];
        if features.contains(wgpu::Features::TEXTURE_COMPRESSION_BC) {
            extensions.extend([
                "GL_EXT_texture_compression_s3tc",
                "GL_ARB_texture_compression_rgtc",
                "GL_ARB_texture_compression_bptc",
            ]);
        }
        if features.contains(wgpu::Features::FLOAT32_FILTERABLE) {
            extensions.push("GL_ARB_texture_float");
        }
        if features.contains(wgpu::Features::MULTIVIEW) {
            extensions.push("GL_OVR_multiview2");
        }

        tracing::debug!(
            "Adapter '{}' on {:?} maps to {} extensions",
            info.name,
            info.backend,
            extensions.len()
        );

        Self {
            extensions,
            limits: adapter.limits(),
            info,
        }
    }

    /// Pick the default high-performance adapter, without a surface.
    pub async fn request_default() -> Option<Self> {
        let instance = wgpu::Instance::default();
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await?;
        Some(Self::from_adapter(&adapter))
    }
}

fn clamp_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

impl DriverContext for WgpuContext {
    fn extension_count(&self) -> usize {
        self.extensions.len()
    }

    fn extension(&self, index: usize) -> Option<String> {
        self.extensions.get(index).map(|name| name.to_string())
    }

    fn integer(&self, query: IntegerQuery) -> i32 {
        let limits = &self.limits;
        match query {
            IntegerQuery::MaxVertexTextureImageUnits | IntegerQuery::MaxTextureImageUnits => {
                clamp_i32(limits.max_sampled_textures_per_shader_stage)
            }
            IntegerQuery::MaxTextureSize | IntegerQuery::MaxViewportDims => {
                clamp_i32(limits.max_texture_dimension_2d)
            }
            IntegerQuery::MaxUniformBlockSize => clamp_i32(limits.max_uniform_buffer_binding_size),
            IntegerQuery::UniformBufferOffsetAlignment => {
                clamp_i32(limits.min_uniform_buffer_offset_alignment)
            }
        }
    }

    fn float(&self, query: FloatQuery) -> f32 {
        match query {
            // wgpu samplers accept anisotropy clamps up to 16.
            FloatQuery::MaxTextureMaxAnisotropy => 16.0,
        }
    }

    fn string(&self, query: StringQuery) -> Option<String> {
        let info = &self.info;
        match query {
            StringQuery::Renderer => Some(info.name.clone()),
            StringQuery::Vendor => Some(format!("0x{:04X}", info.vendor)),
            StringQuery::Version => Some(if info.driver_info.is_empty() {
                format!("{:?} {}", info.backend, info.driver)
            } else {
                format!("{:?} {} {}", info.backend, info.driver, info.driver_info)
            }),
        }
    }

    fn device_type(&self) -> DeviceType {
        match self.info.device_type {
            wgpu::DeviceType::IntegratedGpu => DeviceType::IntegratedGpu,
            wgpu::DeviceType::DiscreteGpu => DeviceType::DiscreteGpu,
            wgpu::DeviceType::VirtualGpu => DeviceType::VirtualGpu,
            wgpu::DeviceType::Cpu => DeviceType::Cpu,
            wgpu::DeviceType::Other => DeviceType::Other,
        }
    }
}
