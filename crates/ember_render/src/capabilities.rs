//! Capability table probed from the driver
//!
//! Built once when the context is created and never mutated afterwards.
//! Probing cannot fail: anything the driver does not support degrades to a
//! disabled flag or the driver-reported limit.

use crate::context::{DriverContext, FloatQuery, IntegerQuery, StringQuery};
use crate::{DeviceType, GlApi, Platform};
use ember_core::ConfigSource;
use std::collections::BTreeSet;

/// Configuration keys read during probing.
pub mod keys {
    /// Exponent: the requested level is `2^value`.
    pub const ANISOTROPIC_FILTERING_LEVEL: &str =
        "rendering/textures/default_filters/anisotropic_filtering_level";
    pub const USE_NEAREST_MIPMAP_FILTER: &str =
        "rendering/textures/default_filters/use_nearest_mipmap_filter";
    pub const DEPTH_PREPASS_ENABLE: &str = "rendering/driver/depth_prepass/enable";
    pub const DEPTH_PREPASS_DISABLE_FOR_VENDORS: &str =
        "rendering/driver/depth_prepass/disable_for_vendors";
    pub const FORCE_VERTEX_SHADING: &str = "rendering/quality/shading/force_vertex_shading";
    pub const MAX_RENDERABLE_ELEMENTS: &str = "rendering/limits/opengl/max_renderable_elements";
    pub const MAX_RENDERABLE_LIGHTS: &str = "rendering/limits/opengl/max_renderable_lights";
    pub const MAX_LIGHTS_PER_OBJECT: &str = "rendering/limits/opengl/max_lights_per_object";
}

const BPTC_EXTENSIONS: &[&str] = &[
    "GL_ARB_texture_compression_bptc",
    "EXT_texture_compression_bptc",
];
const S3TC_EXTENSIONS: &[&str] = &[
    "GL_EXT_texture_compression_dxt1",
    "GL_EXT_texture_compression_s3tc",
    "WEBGL_compressed_texture_s3tc",
];
const RGTC_EXTENSIONS: &[&str] = &[
    "GL_EXT_texture_compression_rgtc",
    "GL_ARB_texture_compression_rgtc",
    "EXT_texture_compression_rgtc",
];
const FLOAT_TEXTURE_EXTENSIONS: &[&str] = &["GL_ARB_texture_float", "GL_OES_texture_float"];
const MULTIVIEW_EXTENSIONS: &[&str] = &["GL_OVR_multiview2", "GL_OVR_multiview"];
const ANISOTROPIC_EXTENSION: &str = "GL_EXT_texture_filter_anisotropic";
const TEXTURE_RG_EXTENSION: &str = "GL_EXT_texture_rg";
const MULTIVIEW_PROC: &str = "glFramebufferTextureMultiviewOVR";

const MAX_ANISOTROPY_EXPONENT: i64 = 16;

/// Frozen feature flags and limits of one graphics context.
#[derive(Debug, Clone)]
pub struct CapabilityTable {
    pub extensions: BTreeSet<String>,

    pub bptc_supported: bool,
    pub s3tc_supported: bool,
    pub etc2_supported: bool,
    pub rgtc_supported: bool,
    pub float_texture_supported: bool,
    pub multiview_supported: bool,
    pub anisotropic_filter_supported: bool,
    pub use_rgba_2d_shadows: bool,
    pub use_skeleton_software: bool,
    pub use_depth_prepass: bool,
    pub force_vertex_shading: bool,
    pub use_nearest_mip_filter: bool,

    pub max_vertex_texture_image_units: u32,
    pub max_texture_image_units: u32,
    pub max_texture_size: u32,
    pub max_uniform_buffer_size: u32,
    pub max_viewport_size: u32,
    pub uniform_buffer_offset_alignment: u32,
    pub anisotropic_level: f32,
    pub max_renderable_elements: u32,
    pub max_renderable_lights: u32,
    pub max_lights_per_object: u32,

    pub adapter_name: String,
    pub adapter_vendor: String,
    pub api_version: String,
    pub device_type: DeviceType,
}

impl CapabilityTable {
    /// Query the context and derive every flag and limit.
    pub fn probe(
        ctx: &dyn DriverContext,
        config: &dyn ConfigSource,
        platform: Platform,
    ) -> Self {
        let extensions = enumerate_extensions(ctx);
        let has = |name: &str| extensions.contains(name);
        let has_any = |names: &[&str]| names.iter().any(|name| extensions.contains(*name));

        let bptc_supported = has_any(BPTC_EXTENSIONS);
        let s3tc_reported = has_any(S3TC_EXTENSIONS);

        let (float_texture_supported, etc2_supported, s3tc_supported, rgtc_supported) =
            match platform.api {
                // RGTC is core since GL 3.0; float textures since 3.0.
                GlApi::Desktop => (true, false, s3tc_reported, true),
                GlApi::Es => (
                    has_any(FLOAT_TEXTURE_EXTENSIONS),
                    true,
                    // Some mobile drivers advertise S3TC without usable support.
                    s3tc_reported && !platform.os.is_mobile(),
                    has_any(RGTC_EXTENSIONS),
                ),
            };
        if s3tc_reported && !s3tc_supported {
            tracing::debug!("S3TC reported by driver but disabled on {:?}", platform.os);
        }

        let use_rgba_2d_shadows = match platform.api {
            GlApi::Desktop => false,
            GlApi::Es => !(float_texture_supported && has(TEXTURE_RG_EXTENSION)),
        };

        let max_vertex_texture_image_units =
            query_limit(ctx, IntegerQuery::MaxVertexTextureImageUnits);
        let max_texture_image_units = query_limit(ctx, IntegerQuery::MaxTextureImageUnits);
        let max_texture_size = query_limit(ctx, IntegerQuery::MaxTextureSize);
        let max_uniform_buffer_size = query_limit(ctx, IntegerQuery::MaxUniformBlockSize);
        let max_viewport_size = query_limit(ctx, IntegerQuery::MaxViewportDims);
        let uniform_buffer_offset_alignment =
            query_limit(ctx, IntegerQuery::UniformBufferOffsetAlignment);

        // GPU skinning reads bone matrices from a float texture in the
        // vertex stage; without either, skeletons run on the CPU.
        let use_skeleton_software =
            !float_texture_supported || max_vertex_texture_image_units == 0;

        let anisotropic_filter_supported = has(ANISOTROPIC_EXTENSION);
        let anisotropic_level = if anisotropic_filter_supported {
            let driver_max = ctx.float(FloatQuery::MaxTextureMaxAnisotropy).max(1.0);
            let exponent = config
                .int_or(keys::ANISOTROPIC_FILTERING_LEVEL, 2)
                .clamp(0, MAX_ANISOTROPY_EXPONENT);
            let requested = (1u32 << exponent) as f32;
            requested.min(driver_max)
        } else {
            1.0
        };

        let mut multiview_supported = has_any(MULTIVIEW_EXTENSIONS);
        if multiview_supported
            && platform.os == crate::TargetOs::Android
            && !ctx.has_proc_address(MULTIVIEW_PROC)
        {
            tracing::debug!("Multiview advertised but {MULTIVIEW_PROC} is missing");
            multiview_supported = false;
        }

        let force_vertex_shading = config.bool_or(keys::FORCE_VERTEX_SHADING, false);
        let use_nearest_mip_filter = config.bool_or(keys::USE_NEAREST_MIPMAP_FILTER, false);

        let adapter_name = ctx.string(StringQuery::Renderer).unwrap_or_default();
        let adapter_vendor = ctx.string(StringQuery::Vendor).unwrap_or_default();
        let api_version = ctx.string(StringQuery::Version).unwrap_or_default();

        let use_depth_prepass = config.bool_or(keys::DEPTH_PREPASS_ENABLE, true)
            && !renderer_is_denylisted(
                &adapter_name,
                &config.string_or(keys::DEPTH_PREPASS_DISABLE_FOR_VENDORS, ""),
            );

        let table = Self {
            extensions,
            bptc_supported,
            s3tc_supported,
            etc2_supported,
            rgtc_supported,
            float_texture_supported,
            multiview_supported,
            anisotropic_filter_supported,
            use_rgba_2d_shadows,
            use_skeleton_software,
            use_depth_prepass,
            force_vertex_shading,
            use_nearest_mip_filter,
            max_vertex_texture_image_units,
            max_texture_image_units,
            max_texture_size,
            max_uniform_buffer_size,
            max_viewport_size,
            uniform_buffer_offset_alignment,
            anisotropic_level,
            max_renderable_elements: config_limit(config, keys::MAX_RENDERABLE_ELEMENTS, 65536),
            max_renderable_lights: config_limit(config, keys::MAX_RENDERABLE_LIGHTS, 32),
            max_lights_per_object: config_limit(config, keys::MAX_LIGHTS_PER_OBJECT, 8),
            adapter_name,
            adapter_vendor,
            api_version,
            device_type: ctx.device_type(),
        };

        tracing::info!(
            "Probed '{}' ({} extensions): s3tc={} bptc={} rgtc={} etc2={} float={} aniso={}x",
            table.adapter_name,
            table.extensions.len(),
            table.s3tc_supported,
            table.bptc_supported,
            table.rgtc_supported,
            table.etc2_supported,
            table.float_texture_supported,
            table.anisotropic_level,
        );
        table
    }

    /// Texture-compression feature check by export name.
    pub fn has_feature(&self, feature: &str) -> bool {
        match feature {
            "rgtc" => self.rgtc_supported,
            "s3tc" => self.s3tc_supported,
            "bptc" => self.bptc_supported,
            "etc" | "etc2" => self.etc2_supported,
            _ => false,
        }
    }

    pub fn has_extension(&self, name: &str) -> bool {
        self.extensions.contains(name)
    }

    pub fn max_viewport_size(&self) -> (u32, u32) {
        (self.max_viewport_size, self.max_viewport_size)
    }
}

fn enumerate_extensions(ctx: &dyn DriverContext) -> BTreeSet<String> {
    let reported = ctx.extension_count();
    let mut extensions = BTreeSet::new();
    for index in 0..reported {
        match ctx.extension(index) {
            Some(name) => {
                extensions.insert(name);
            }
            None => {
                tracing::warn!(
                    "Driver reported {reported} extensions but returned only {index}"
                );
                break;
            }
        }
    }
    extensions
}

fn query_limit(ctx: &dyn DriverContext, query: IntegerQuery) -> u32 {
    u32::try_from(ctx.integer(query)).unwrap_or(0)
}

fn config_limit(config: &dyn ConfigSource, key: &str, default: u32) -> u32 {
    u32::try_from(config.int_or(key, i64::from(default))).unwrap_or(default)
}

fn renderer_is_denylisted(renderer: &str, vendors: &str) -> bool {
    let renderer = renderer.to_lowercase();
    vendors
        .split(',')
        .map(str::trim)
        .filter(|vendor| !vendor.is_empty())
        .any(|vendor| renderer.contains(&vendor.to_lowercase()))
}
