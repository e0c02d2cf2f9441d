//! Ember Services Layer
//!
//! Project settings read once at context creation.

pub mod settings;

pub use settings::{Settings, SettingsError, SettingsSnapshot};
