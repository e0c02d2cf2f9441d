use crate::handle::ResourceHandle;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    #[error("{handle} is already stored in this pool")]
    DuplicateHandle { handle: ResourceHandle },

    #[error("{handle} is not owned by this pool")]
    UnknownHandle { handle: ResourceHandle },

    #[error("the null handle cannot be stored")]
    NullHandle,
}

/// Slot storage keyed by handle.
///
/// Values live in a dense slot vector; freed slots go on a free list and are
/// reused by later inserts, so the vector only grows to the peak live count.
/// The handle itself is never reused, only the slot behind it.
pub struct SlotPool<T> {
    slots: Vec<Option<(ResourceHandle, T)>>,
    free: Vec<usize>,
    lookup: HashMap<ResourceHandle, usize>,
}

impl<T> SlotPool<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            lookup: HashMap::new(),
        }
    }

    pub fn insert(&mut self, handle: ResourceHandle, value: T) -> Result<(), PoolError> {
        if !handle.is_valid() {
            return Err(PoolError::NullHandle);
        }
        if self.lookup.contains_key(&handle) {
            return Err(PoolError::DuplicateHandle { handle });
        }

        let slot = match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some((handle, value));
                slot
            }
            None => {
                self.slots.push(Some((handle, value)));
                self.slots.len() - 1
            }
        };
        self.lookup.insert(handle, slot);
        Ok(())
    }

    #[inline]
    pub fn contains(&self, handle: ResourceHandle) -> bool {
        self.lookup.contains_key(&handle)
    }

    pub fn get(&self, handle: ResourceHandle) -> Option<&T> {
        let slot = *self.lookup.get(&handle)?;
        self.slots[slot].as_ref().map(|(_, value)| value)
    }

    pub fn get_mut(&mut self, handle: ResourceHandle) -> Option<&mut T> {
        let slot = *self.lookup.get(&handle)?;
        self.slots[slot].as_mut().map(|(_, value)| value)
    }

    pub fn remove(&mut self, handle: ResourceHandle) -> Result<T, PoolError> {
        let slot = self
            .lookup
            .remove(&handle)
            .ok_or(PoolError::UnknownHandle { handle })?;
        let (_, value) = self.slots[slot]
            .take()
            .ok_or(PoolError::UnknownHandle { handle })?;
        self.free.push(slot);
        Ok(value)
    }

    pub fn len(&self) -> usize {
        self.lookup.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lookup.is_empty()
    }

    /// Number of slots ever allocated (live + free).
    pub fn slot_capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ResourceHandle, &T)> {
        self.slots
            .iter()
            .filter_map(|slot| slot.as_ref().map(|(handle, value)| (*handle, value)))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (ResourceHandle, &mut T)> {
        self.slots
            .iter_mut()
            .filter_map(|slot| slot.as_mut().map(|(handle, value)| (*handle, value)))
    }
}

impl<T> Default for SlotPool<T> {
    fn default() -> Self {
        Self::new()
    }
}
