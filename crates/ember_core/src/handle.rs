//! Opaque resource handles
//!
//! A handle carries no type tag. The pool that allocated it is the only
//! thing that knows what it refers to, so callers holding a bare handle
//! must ask the registry for its kind.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Resource handle (opaque ID)
///
/// `ResourceHandle::NULL` (id 0) never refers to a live resource.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResourceHandle(u64);

impl ResourceHandle {
    pub const NULL: Self = Self(0);

    pub fn from_raw(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }

    pub fn is_valid(&self) -> bool {
        self.0 != 0
    }
}

impl Default for ResourceHandle {
    fn default() -> Self {
        Self::NULL
    }
}

impl fmt::Display for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RID({})", self.0)
    }
}

/// Issues process-unique handles.
///
/// Pools share one allocator (usually behind an `Arc`) so that no two pools
/// can ever hand out the same id. Ids are never recycled.
#[derive(Debug)]
pub struct HandleAllocator {
    next_id: AtomicU64,
}

impl HandleAllocator {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
        }
    }

    pub fn allocate(&self) -> ResourceHandle {
        ResourceHandle(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Number of handles issued so far.
    pub fn issued(&self) -> u64 {
        self.next_id.load(Ordering::Relaxed) - 1
    }
}

impl Default for HandleAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_handles_are_unique_and_valid() {
        let allocator = HandleAllocator::new();
        let handles: HashSet<_> = (0..100).map(|_| allocator.allocate()).collect();

        assert_eq!(handles.len(), 100);
        assert!(handles.iter().all(|h| h.is_valid()));
        assert_eq!(allocator.issued(), 100);
    }

    #[test]
    fn test_null_handle() {
        assert!(!ResourceHandle::NULL.is_valid());
        assert_eq!(ResourceHandle::default(), ResourceHandle::NULL);
        assert_eq!(ResourceHandle::from_raw(7).id(), 7);
    }
}
