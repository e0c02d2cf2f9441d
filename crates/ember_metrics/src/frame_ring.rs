//! Fixed ring of per-frame slots

/// A fixed number of slots addressed by `frame_index mod len`.
///
/// Slots are built once up front and reused in place; advancing the ring
/// never allocates.
pub struct FrameRing<T> {
    slots: Vec<T>,
    index: usize,
}

impl<T> FrameRing<T> {
    pub fn from_fn(len: usize, mut make: impl FnMut(usize) -> T) -> Self {
        assert!(len > 0, "frame ring needs at least one slot");
        Self {
            slots: (0..len).map(&mut make).collect(),
            index: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Index of the slot currently being written.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    #[inline]
    pub fn current(&self) -> &T {
        &self.slots[self.index]
    }

    #[inline]
    pub fn current_mut(&mut self) -> &mut T {
        &mut self.slots[self.index]
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.slots.get(index)
    }

    /// Move to the next slot and return its index.
    pub fn advance(&mut self) -> usize {
        self.index = (self.index + 1) % self.slots.len();
        self.index
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.slots.iter_mut()
    }
}
