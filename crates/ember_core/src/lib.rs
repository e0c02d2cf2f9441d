//! Ember Core
//!
//! Shared building blocks for the rendering backend:
//! - Opaque resource handles and the allocator that issues them
//! - Dependency objects and trackers for invalidation edges
//! - The configuration lookup trait consumed at context creation
//! - Slot storage used by resource pools

pub mod config;
pub mod dependency;
pub mod handle;
pub mod pool;

pub use config::{ConfigSource, ConfigValue, EmptyConfig};
pub use dependency::{Dependency, DependencyId, DependencyTracker};
pub use handle::{HandleAllocator, ResourceHandle};
pub use pool::{PoolError, SlotPool};

/// Engine version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
