//! Settings management
//!
//! Settings are a serde tree whose shape mirrors the lookup keys, so
//! `rendering/driver/depth_prepass/enable` is the field
//! `settings.rendering.driver.depth_prepass.enable`. Missing sections in a
//! settings file take their defaults.

use ember_core::{ConfigSource, ConfigValue};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Engine settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub rendering: RenderingSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderingSettings {
    pub textures: TextureSettings,
    pub driver: DriverSettings,
    pub limits: LimitSettings,
    pub quality: QualitySettings,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextureSettings {
    pub default_filters: DefaultFilters,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultFilters {
    /// Power-of-two exponent: 0 = 1x, 2 = 4x, 4 = 16x.
    pub anisotropic_filtering_level: u32,
    pub use_nearest_mipmap_filter: bool,
}

impl Default for DefaultFilters {
    fn default() -> Self {
        Self {
            anisotropic_filtering_level: 2,
            use_nearest_mipmap_filter: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverSettings {
    pub depth_prepass: DepthPrepassSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DepthPrepassSettings {
    pub enable: bool,
    /// Comma-separated renderer substrings, matched case-insensitively.
    pub disable_for_vendors: String,
}

impl Default for DepthPrepassSettings {
    fn default() -> Self {
        Self {
            enable: true,
            disable_for_vendors: "PowerVR,Mali,Adreno,Apple".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitSettings {
    pub opengl: OpenGlLimits,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenGlLimits {
    pub max_renderable_elements: u32,
    pub max_renderable_lights: u32,
    pub max_lights_per_object: u32,
}

impl Default for OpenGlLimits {
    fn default() -> Self {
        Self {
            max_renderable_elements: 65536,
            max_renderable_lights: 32,
            max_lights_per_object: 8,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualitySettings {
    pub shading: ShadingSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadingSettings {
    pub force_vertex_shading: bool,
}

impl Settings {
    pub fn from_json_str(json: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_json_str(&json)?;
        tracing::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn to_json_string(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Freeze the current values for key lookups.
    pub fn snapshot(&self) -> Result<SettingsSnapshot, SettingsError> {
        Ok(SettingsSnapshot {
            tree: serde_json::to_value(self)?,
        })
    }
}

/// Settings serialized once, answering `a/b/c` keys as JSON pointers.
#[derive(Debug, Clone)]
pub struct SettingsSnapshot {
    tree: Value,
}

impl ConfigSource for SettingsSnapshot {
    fn value(&self, key: &str) -> Option<ConfigValue> {
        let pointer = format!("/{}", key.trim_matches('/'));
        match self.tree.pointer(&pointer)? {
            Value::Bool(v) => Some(ConfigValue::Bool(*v)),
            Value::Number(n) => n
                .as_i64()
                .map(ConfigValue::Int)
                .or_else(|| n.as_f64().map(ConfigValue::Float)),
            Value::String(s) => Some(ConfigValue::Str(s.clone())),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_resolve_by_key() {
        let settings = Settings::default().snapshot().unwrap();
        assert_eq!(
            settings.int_or("rendering/textures/default_filters/anisotropic_filtering_level", 0),
            2
        );
        assert!(settings.bool_or("rendering/driver/depth_prepass/enable", false));
        assert_eq!(
            settings.int_or("rendering/limits/opengl/max_renderable_lights", 0),
            32
        );
        assert_eq!(settings.value("rendering/textures"), None);
        assert_eq!(settings.value("rendering/nope"), None);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let json = r#"{
            "rendering": {
                "driver": { "depth_prepass": { "disable_for_vendors": "Intel" } },
                "limits": { "opengl": { "max_lights_per_object": 4 } }
            }
        }"#;
        let settings = Settings::from_json_str(json).unwrap();

        assert!(settings.rendering.driver.depth_prepass.enable);
        assert_eq!(settings.rendering.driver.depth_prepass.disable_for_vendors, "Intel");
        assert_eq!(settings.rendering.limits.opengl.max_lights_per_object, 4);
        assert_eq!(settings.rendering.limits.opengl.max_renderable_elements, 65536);
    }

    #[test]
    fn test_snapshot_is_frozen() {
        let mut settings = Settings::default();
        settings.rendering.textures.default_filters.anisotropic_filtering_level = 4;
        let snapshot = settings.snapshot().unwrap();

        settings.rendering.textures.default_filters.anisotropic_filtering_level = 0;
        assert_eq!(
            snapshot.int_or("rendering/textures/default_filters/anisotropic_filtering_level", 0),
            4
        );
        assert_eq!(
            snapshot.string_or("rendering/driver/depth_prepass/disable_for_vendors", ""),
            "PowerVR,Mali,Adreno,Apple"
        );
    }

    #[test]
    fn test_json_round_trip() {
        let mut settings = Settings::default();
        settings.rendering.quality.shading.force_vertex_shading = true;

        let json = settings.to_json_string().unwrap();
        assert_eq!(Settings::from_json_str(&json).unwrap(), settings);
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(matches!(
            Settings::from_json_str("{ not json"),
            Err(SettingsError::Parse(_))
        ));
        assert!(matches!(
            Settings::load("/definitely/not/here.json"),
            Err(SettingsError::Io { .. })
        ));
    }
}
