//! Bounded circular frontier queue.

use crate::error::{Error, Result};
use crate::record::NodeIndex;

/// Preallocated FIFO of node positions.
///
/// Capacity is fixed at construction (the node count, since a traversal
/// enqueues each node at most once) and the buffer never grows, so the hot
/// loop performs no allocation.
#[derive(Debug)]
pub struct FrontierQueue {
    slots: Box<[NodeIndex]>,
    head: usize,
    len: usize,
}

impl FrontierQueue {
    /// Creates an empty queue able to hold `capacity` entries
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: vec![0; capacity].into_boxed_slice(),
            head: 0,
            len: 0,
        }
    }

    /// Maximum number of queued entries
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of queued entries
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the queue is empty
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Appends `node` at the tail.
    ///
    /// # Errors
    ///
    /// Returns `OutOfRange` if the queue is full.
    #[inline]
    pub fn push(&mut self, node: NodeIndex) -> Result<()> {
        let capacity = self.slots.len();
        if self.len == capacity {
            return Err(Error::out_of_range("frontier slot", self.len as u64, capacity as u64));
        }
        let tail = (self.head + self.len) % capacity;
        if let Some(slot) = self.slots.get_mut(tail) {
            *slot = node;
        }
        self.len += 1;
        Ok(())
    }

    /// Removes and returns the entry at the head
    #[inline]
    pub fn pop(&mut self) -> Option<NodeIndex> {
        if self.len == 0 {
            return None;
        }
        let node = self.slots.get(self.head).copied();
        self.head = (self.head + 1) % self.slots.len();
        self.len -= 1;
        node
    }

    /// Empties the queue without releasing its buffer
    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let mut queue = FrontierQueue::with_capacity(4);
        assert!(queue.is_empty());

        queue.push(1).unwrap();
        queue.push(2).unwrap();
        queue.push(3).unwrap();
        assert_eq!(queue.len(), 3);

        assert_eq!(queue.pop(), Some(1));
        assert_eq!(queue.pop(), Some(2));
        assert_eq!(queue.pop(), Some(3));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn test_wraps_around() {
        let mut queue = FrontierQueue::with_capacity(3);
        for round in 0..10 {
            queue.push(round).unwrap();
            queue.push(round + 100).unwrap();
            assert_eq!(queue.pop(), Some(round));
            assert_eq!(queue.pop(), Some(round + 100));
        }
        assert!(queue.is_empty());
    }

    #[test]
    fn test_full_queue_rejects_push() {
        let mut queue = FrontierQueue::with_capacity(2);
        queue.push(7).unwrap();
        queue.push(8).unwrap();

        let err = queue.push(9).unwrap_err();
        assert!(err.is_out_of_range());
        assert_eq!(queue.capacity(), 2, "queue must never grow");
        assert_eq!(queue.pop(), Some(7));
    }

    #[test]
    fn test_zero_capacity() {
        let mut queue = FrontierQueue::with_capacity(0);
        assert!(queue.push(0).is_err());
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn test_clear_keeps_capacity() {
        let mut queue = FrontierQueue::with_capacity(5);
        queue.push(1).unwrap();
        queue.pop();
        queue.push(2).unwrap();
        queue.clear();
        assert!(queue.is_empty());
        assert_eq!(queue.capacity(), 5);
        queue.push(3).unwrap();
        assert_eq!(queue.pop(), Some(3));
    }
}
