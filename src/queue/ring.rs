//! Fixed-capacity circular storage shared by the bounded queue strategies.
//!
//! `RingBuffer` does no synchronization of its own; every queue wraps it in a
//! lock and only touches it while holding that lock.

/// Circular buffer of `capacity` slots addressed by `head`/`tail` indices.
///
/// Slot `i` is `Some` exactly when it lies in the `count`-long window that
/// starts at `head`.
#[derive(Debug)]
pub(crate) struct RingBuffer<T> {
    slots: Box<[Option<T>]>,
    head: usize,
    tail: usize,
    count: usize,
}

impl<T> RingBuffer<T> {
    /// Caller guarantees `capacity > 0`.
    pub(crate) fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0);
        Self {
            slots: (0..capacity).map(|_| None).collect(),
            head: 0,
            tail: 0,
            count: 0,
        }
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.count == 0
    }

    #[inline]
    pub(crate) fn is_full(&self) -> bool {
        self.count == self.slots.len()
    }

    /// Stores `item` at `tail`, handing it back if the buffer is full.
    pub(crate) fn push(&mut self, item: T) -> Result<(), T> {
        if self.is_full() {
            return Err(item);
        }
        debug_assert!(self.slots[self.tail].is_none());
        self.slots[self.tail] = Some(item);
        self.tail = self.advance(self.tail);
        self.count += 1;
        Ok(())
    }

    /// Removes the item at `head`, leaving the slot empty so the buffer holds
    /// no reference to it.
    pub(crate) fn pop(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let item = self.slots[self.head].take();
        debug_assert!(item.is_some());
        self.head = self.advance(self.head);
        self.count -= 1;
        item
    }

    /// Removes every item in FIFO order.
    pub(crate) fn drain_all(&mut self) -> Vec<T> {
        let mut items = Vec::with_capacity(self.count);
        while let Some(item) = self.pop() {
            items.push(item);
        }
        items
    }

    #[inline]
    fn advance(&self, index: usize) -> usize {
        let next = index + 1;
        if next == self.slots.len() {
            0
        } else {
            next
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn test_push_pop_fifo() {
        let mut ring = RingBuffer::new(3);
        assert!(ring.is_empty());

        ring.push(1).unwrap();
        ring.push(2).unwrap();
        ring.push(3).unwrap();
        assert!(ring.is_full());
        assert_eq!(ring.push(4), Err(4));

        assert_eq!(ring.pop(), Some(1));
        assert_eq!(ring.pop(), Some(2));
        assert_eq!(ring.pop(), Some(3));
        assert_eq!(ring.pop(), None);
    }

    #[test]
    fn test_indices_wrap_around() {
        let mut ring = RingBuffer::new(2);
        for i in 0..10 {
            ring.push(i).unwrap();
            assert_eq!(ring.pop(), Some(i));
            assert!(ring.head < ring.capacity());
            assert!(ring.tail < ring.capacity());
        }
        assert_eq!(ring.len(), 0);
    }

    #[test]
    fn test_live_window_matches_count() {
        let mut ring = RingBuffer::new(4);
        for i in 0..3 {
            ring.push(i).unwrap();
        }
        ring.pop();
        ring.push(3).unwrap();
        ring.push(4).unwrap();

        let occupied = ring.slots.iter().filter(|s| s.is_some()).count();
        assert_eq!(occupied, ring.len());
        for offset in 0..ring.len() {
            let index = (ring.head + offset) % ring.capacity();
            assert!(ring.slots[index].is_some());
        }
    }

    #[test]
    fn test_pop_releases_reference() {
        let value = Rc::new(7);
        let mut ring = RingBuffer::new(1);
        ring.push(Rc::clone(&value)).unwrap();
        assert_eq!(Rc::strong_count(&value), 2);

        drop(ring.pop());
        assert_eq!(Rc::strong_count(&value), 1);
    }

    #[test]
    fn test_drain_all_preserves_order() {
        let mut ring = RingBuffer::new(3);
        ring.push('a').unwrap();
        ring.push('b').unwrap();
        ring.pop();
        ring.push('c').unwrap();
        ring.push('d').unwrap();

        assert_eq!(ring.drain_all(), vec!['b', 'c', 'd']);
        assert!(ring.is_empty());
    }
}
