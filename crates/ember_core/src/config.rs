//! Configuration lookup consumed at context creation
//!
//! Keys are slash-separated paths such as
//! `rendering/textures/default_filters/anisotropic_filtering_level`.

/// A typed scalar returned by a [`ConfigSource`].
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

/// Named key lookup. Implementors only provide `value`; the typed helpers
/// fall back to the given default when the key is missing or has the wrong
/// type.
pub trait ConfigSource {
    fn value(&self, key: &str) -> Option<ConfigValue>;

    fn bool_or(&self, key: &str, default: bool) -> bool {
        match self.value(key) {
            Some(ConfigValue::Bool(v)) => v,
            Some(ConfigValue::Int(v)) => v != 0,
            _ => default,
        }
    }

    fn int_or(&self, key: &str, default: i64) -> i64 {
        match self.value(key) {
            Some(ConfigValue::Int(v)) => v,
            Some(ConfigValue::Float(v)) => v as i64,
            _ => default,
        }
    }

    fn float_or(&self, key: &str, default: f64) -> f64 {
        match self.value(key) {
            Some(ConfigValue::Float(v)) => v,
            Some(ConfigValue::Int(v)) => v as f64,
            _ => default,
        }
    }

    fn string_or(&self, key: &str, default: &str) -> String {
        match self.value(key) {
            Some(ConfigValue::Str(v)) => v,
            _ => default.to_string(),
        }
    }
}

/// Source with no keys; every lookup yields the default.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyConfig;

impl ConfigSource for EmptyConfig {
    fn value(&self, _key: &str) -> Option<ConfigValue> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapConfig(HashMap<&'static str, ConfigValue>);

    impl ConfigSource for MapConfig {
        fn value(&self, key: &str) -> Option<ConfigValue> {
            self.0.get(key).cloned()
        }
    }

    #[test]
    fn test_typed_helpers() {
        let mut map = HashMap::new();
        map.insert("a/flag", ConfigValue::Bool(true));
        map.insert("a/count", ConfigValue::Int(3));
        map.insert("a/name", ConfigValue::Str("intel".into()));
        let config = MapConfig(map);

        assert!(config.bool_or("a/flag", false));
        assert_eq!(config.int_or("a/count", 0), 3);
        assert_eq!(config.float_or("a/count", 0.0), 3.0);
        assert_eq!(config.string_or("a/name", ""), "intel");
    }

    #[test]
    fn test_wrong_type_falls_back() {
        let mut map = HashMap::new();
        map.insert("a/name", ConfigValue::Str("x".into()));
        let config = MapConfig(map);

        assert_eq!(config.int_or("a/name", 42), 42);
        assert!(config.bool_or("missing", true));
        assert_eq!(EmptyConfig.string_or("anything", "fallback"), "fallback");
    }
}
