//! Driver query surface
//!
//! The capability probe only ever talks to the graphics API through
//! [`DriverContext`]. Real contexts wrap GL (or a wgpu adapter); the
//! [`HeadlessContext`] is a scripted driver for tests and headless runs.

use crate::DeviceType;
use std::collections::{HashMap, HashSet};

/// Integer limits (`glGetIntegerv`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntegerQuery {
    MaxVertexTextureImageUnits,
    MaxTextureImageUnits,
    MaxTextureSize,
    MaxUniformBlockSize,
    MaxViewportDims,
    UniformBufferOffsetAlignment,
}

/// Float limits (`glGetFloatv`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FloatQuery {
    MaxTextureMaxAnisotropy,
}

/// Identity strings (`glGetString`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StringQuery {
    Renderer,
    Vendor,
    Version,
}

pub trait DriverContext {
    /// Number of extensions the driver claims to expose.
    fn extension_count(&self) -> usize;

    /// Extension name at `index`. Some drivers report more extensions than
    /// they return; `None` ends enumeration.
    fn extension(&self, index: usize) -> Option<String>;

    fn integer(&self, query: IntegerQuery) -> i32;

    fn float(&self, query: FloatQuery) -> f32;

    fn string(&self, query: StringQuery) -> Option<String>;

    /// Whether an entry point can be loaded. Extensions are occasionally
    /// advertised without their functions.
    fn has_proc_address(&self, _name: &str) -> bool {
        true
    }

    fn device_type(&self) -> DeviceType {
        DeviceType::Other
    }
}

/// Scripted driver with desktop-class defaults and no extensions.
#[derive(Debug, Clone)]
pub struct HeadlessContext {
    extensions: Vec<String>,
    reported_extension_count: Option<usize>,
    integers: HashMap<IntegerQuery, i32>,
    floats: HashMap<FloatQuery, f32>,
    strings: HashMap<StringQuery, String>,
    missing_procs: HashSet<String>,
}

impl HeadlessContext {
    pub fn new() -> Self {
        let integers = HashMap::from([
            (IntegerQuery::MaxVertexTextureImageUnits, 16),
            (IntegerQuery::MaxTextureImageUnits, 16),
            (IntegerQuery::MaxTextureSize, 16384),
            (IntegerQuery::MaxUniformBlockSize, 65536),
            (IntegerQuery::MaxViewportDims, 16384),
            (IntegerQuery::UniformBufferOffsetAlignment, 256),
        ]);
        let floats = HashMap::from([(FloatQuery::MaxTextureMaxAnisotropy, 16.0)]);
        let strings = HashMap::from([
            (StringQuery::Renderer, "Ember Headless Renderer".to_string()),
            (StringQuery::Vendor, "Ember".to_string()),
            (StringQuery::Version, "3.3.0 Headless".to_string()),
        ]);

        Self {
            extensions: Vec::new(),
            reported_extension_count: None,
            integers,
            floats,
            strings,
            missing_procs: HashSet::new(),
        }
    }

    /// Extension set of a typical desktop GL 3.3 driver.
    pub fn typical_desktop() -> Self {
        Self::new().with_extensions([
            "GL_ARB_texture_compression_bptc",
            "GL_EXT_texture_compression_s3tc",
            "GL_ARB_texture_compression_rgtc",
            "GL_EXT_texture_filter_anisotropic",
            "GL_ARB_texture_float",
            "GL_EXT_texture_rg",
        ])
    }

    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions.extend(extensions.into_iter().map(Into::into));
        self
    }

    /// Claim a different extension count than the list actually holds.
    pub fn with_reported_extension_count(mut self, count: usize) -> Self {
        self.reported_extension_count = Some(count);
        self
    }

    pub fn with_integer(mut self, query: IntegerQuery, value: i32) -> Self {
        self.integers.insert(query, value);
        self
    }

    pub fn with_float(mut self, query: FloatQuery, value: f32) -> Self {
        self.floats.insert(query, value);
        self
    }

    pub fn with_string(mut self, query: StringQuery, value: impl Into<String>) -> Self {
        self.strings.insert(query, value.into());
        self
    }

    pub fn without_string(mut self, query: StringQuery) -> Self {
        self.strings.remove(&query);
        self
    }

    pub fn without_proc(mut self, name: impl Into<String>) -> Self {
        self.missing_procs.insert(name.into());
        self
    }
}

impl Default for HeadlessContext {
    fn default() -> Self {
        Self::new()
    }
}

impl DriverContext for HeadlessContext {
    fn extension_count(&self) -> usize {
        self.reported_extension_count
            .unwrap_or(self.extensions.len())
    }

    fn extension(&self, index: usize) -> Option<String> {
        self.extensions.get(index).cloned()
    }

    fn integer(&self, query: IntegerQuery) -> i32 {
        self.integers.get(&query).copied().unwrap_or(0)
    }

    fn float(&self, query: FloatQuery) -> f32 {
        self.floats.get(&query).copied().unwrap_or(0.0)
    }

    fn string(&self, query: StringQuery) -> Option<String> {
        self.strings.get(&query).cloned()
    }

    fn has_proc_address(&self, name: &str) -> bool {
        !self.missing_procs.contains(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headless_defaults() {
        let ctx = HeadlessContext::new();
        assert_eq!(ctx.extension_count(), 0);
        assert_eq!(ctx.integer(IntegerQuery::MaxTextureSize), 16384);
        assert_eq!(ctx.float(FloatQuery::MaxTextureMaxAnisotropy), 16.0);
        assert!(ctx.string(StringQuery::Renderer).is_some());
        assert!(ctx.has_proc_address("glFramebufferTextureMultiviewOVR"));
    }

    #[test]
    fn test_over_reported_extensions() {
        let ctx = HeadlessContext::new()
            .with_extensions(["GL_A", "GL_B"])
            .with_reported_extension_count(5);
        assert_eq!(ctx.extension_count(), 5);
        assert_eq!(ctx.extension(1).as_deref(), Some("GL_B"));
        assert_eq!(ctx.extension(2), None);
    }
}
