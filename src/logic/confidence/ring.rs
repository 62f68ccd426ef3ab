//! Ring Buffer - fixed-capacity, oldest-first eviction
//!
//! Index-addressed circular array: once full, every push overwrites the
//! oldest slot. Length never exceeds capacity.

#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    slots: Vec<T>,
    capacity: usize,
    /// Slot holding the oldest entry once the ring is full
    head: usize,
}

impl<T> RingBuffer<T> {
    /// `capacity` of 0 is bumped to 1
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: Vec::with_capacity(capacity),
            capacity,
            head: 0,
        }
    }

    /// Push an item, returning the evicted one when full
    pub fn push(&mut self, item: T) -> Option<T> {
        if self.slots.len() < self.capacity {
            self.slots.push(item);
            return None;
        }

        let evicted = std::mem::replace(&mut self.slots[self.head], item);
        self.head = (self.head + 1) % self.capacity;
        Some(evicted)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Entries oldest -> newest
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        let (newer, older) = self.slots.split_at(self.head);
        older.iter().chain(newer.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contents<T: Clone>(ring: &RingBuffer<T>) -> Vec<T> {
        ring.iter().cloned().collect()
    }

    #[test]
    fn test_fill_then_evict_oldest() {
        let mut ring = RingBuffer::new(3);
        assert_eq!(ring.push(1), None);
        assert_eq!(ring.push(2), None);
        assert_eq!(ring.push(3), None);
        assert_eq!(ring.len(), 3);

        assert_eq!(ring.push(4), Some(1));
        assert_eq!(ring.push(5), Some(2));
        assert_eq!(contents(&ring), vec![3, 4, 5]);
    }

    #[test]
    fn test_never_exceeds_capacity() {
        let mut ring = RingBuffer::new(5);
        for i in 0..1_000 {
            ring.push(i);
            assert!(ring.len() <= 5);
        }
        assert_eq!(contents(&ring), vec![995, 996, 997, 998, 999]);
    }

    #[test]
    fn test_partial_order() {
        let mut ring = RingBuffer::new(4);
        assert!(ring.is_empty());
        ring.push("a");
        ring.push("b");
        assert_eq!(contents(&ring), vec!["a", "b"]);
    }

    #[test]
    fn test_zero_capacity_bumped() {
        let mut ring = RingBuffer::new(0);
        assert_eq!(ring.push(1), None);
        assert_eq!(ring.push(2), Some(1));
        assert_eq!(ring.len(), 1);
    }
}
