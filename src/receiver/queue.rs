//! # Byte Queue
//!
//! FIFO of bytes over fixed circular storage, with a zero-copy view of the
//! stored bytes for the receiver.
//!
//! [`RingQueue`] is single-owner: producer and consumer both go through
//! `&mut`. When bytes are produced from another context (a reader thread,
//! an interrupt handler), put the queue behind a mutex and hold the lock for
//! the whole of each receiver call so the call sees one consistent
//! snapshot of `available()`.

use tracing::warn;

/// Consumer-side interface the receiver reads from
pub trait ByteQueue {
    /// Number of bytes stored and not yet consumed
    fn available(&self) -> usize;

    /// Size of the circular storage
    fn capacity(&self) -> usize;

    /// Physical index of the oldest stored byte
    fn head(&self) -> usize;

    /// The whole circular storage, in physical order
    ///
    /// Only the `available()` bytes starting at `head()` (wrapping) hold
    /// queued data.
    fn storage(&self) -> &[u8];

    /// Remove up to `n` bytes from the head
    fn consume(&mut self, n: usize);
}

/// Fixed-capacity circular byte queue
#[derive(Debug, Clone)]
pub struct RingQueue {
    buffer: Box<[u8]>,
    head: usize,
    len: usize,
    dropped: u64,
}

impl RingQueue {
    /// Create an empty queue
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "queue capacity must be non-zero");
        Self {
            buffer: vec![0u8; capacity].into_boxed_slice(),
            head: 0,
            len: 0,
            dropped: 0,
        }
    }

    /// Free space left for the producer
    pub fn free(&self) -> usize {
        self.buffer.len() - self.len
    }

    /// Number of bytes rejected because the queue was full
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Append one byte, returning `false` if the queue is full
    pub fn push(&mut self, byte: u8) -> bool {
        if self.free() == 0 {
            self.dropped += 1;
            return false;
        }

        let tail = (self.head + self.len) % self.buffer.len();
        self.buffer[tail] = byte;
        self.len += 1;
        true
    }

    /// Append as many bytes of `data` as fit, returning how many were taken
    ///
    /// Bytes that do not fit are dropped and counted in [`dropped`](Self::dropped).
    pub fn push_slice(&mut self, data: &[u8]) -> usize {
        let accepted = data.len().min(self.free());
        let capacity = self.buffer.len();
        let tail = (self.head + self.len) % capacity;

        // At most two copies: up to the end of storage, then from the front
        let first = accepted.min(capacity - tail);
        self.buffer[tail..tail + first].copy_from_slice(&data[..first]);
        self.buffer[..accepted - first].copy_from_slice(&data[first..accepted]);
        self.len += accepted;

        let rejected = data.len() - accepted;
        if rejected > 0 {
            self.dropped += rejected as u64;
            warn!("Byte queue full, dropped {} bytes", rejected);
        }

        accepted
    }
}

impl ByteQueue for RingQueue {
    fn available(&self) -> usize {
        self.len
    }

    fn capacity(&self) -> usize {
        self.buffer.len()
    }

    fn head(&self) -> usize {
        self.head
    }

    fn storage(&self) -> &[u8] {
        &self.buffer
    }

    fn consume(&mut self, n: usize) {
        let n = n.min(self.len);
        self.head = (self.head + n) % self.buffer.len();
        self.len -= n;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_queue_is_empty() {
        let queue = RingQueue::new(8);
        assert_eq!(queue.available(), 0);
        assert_eq!(queue.capacity(), 8);
        assert_eq!(queue.free(), 8);
        assert_eq!(queue.head(), 0);
    }

    #[test]
    #[should_panic]
    fn test_zero_capacity_panics() {
        RingQueue::new(0);
    }

    #[test]
    fn test_push_and_consume() {
        let mut queue = RingQueue::new(4);
        assert!(queue.push(1));
        assert!(queue.push(2));
        assert_eq!(queue.available(), 2);

        queue.consume(1);
        assert_eq!(queue.available(), 1);
        assert_eq!(queue.head(), 1);
        assert_eq!(queue.storage()[queue.head()], 2);
    }

    #[test]
    fn test_push_when_full_is_dropped() {
        let mut queue = RingQueue::new(2);
        assert!(queue.push(1));
        assert!(queue.push(2));
        assert!(!queue.push(3));
        assert_eq!(queue.dropped(), 1);
        assert_eq!(queue.available(), 2);
    }

    #[test]
    fn test_push_slice_wraps_storage() {
        let mut queue = RingQueue::new(5);
        queue.push_slice(&[0, 0, 0]);
        queue.consume(3);

        assert_eq!(queue.push_slice(&[1, 2, 3, 4]), 4);
        assert_eq!(queue.storage(), &[3, 4, 0, 1, 2]);
        assert_eq!(queue.head(), 3);
        assert_eq!(queue.available(), 4);
    }

    #[test]
    fn test_push_slice_partial_accept() {
        let mut queue = RingQueue::new(4);
        assert_eq!(queue.push_slice(&[1, 2, 3, 4, 5, 6]), 4);
        assert_eq!(queue.dropped(), 2);
        assert_eq!(queue.free(), 0);
    }

    #[test]
    fn test_consume_clamps_to_available() {
        let mut queue = RingQueue::new(4);
        queue.push_slice(&[1, 2]);
        queue.consume(10);
        assert_eq!(queue.available(), 0);
        assert_eq!(queue.head(), 2);
    }
}
