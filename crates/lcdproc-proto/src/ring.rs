//! Byte ring buffer used to reassemble protocol lines.
//!
//! Storage holds one byte more than the capacity so that `head == tail`
//! always means empty. Writes are all-or-nothing: a write that does not fit
//! completely is refused and leaves the buffer untouched.

use thiserror::Error;

/// A write did not fit into the remaining space.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("ring buffer full: {requested} bytes requested, {available} available")]
pub struct RingFull {
    /// Bytes the caller tried to write
    pub requested: usize,
    /// Bytes that were free at the time
    pub available: usize,
}

/// Fixed-capacity byte ring.
#[derive(Debug, Clone)]
pub struct RingBuffer {
    buf: Box<[u8]>,
    head: usize,
    tail: usize,
}

fn is_terminator(b: u8) -> bool {
    matches!(b, b'\r' | b'\n' | b'\0')
}

impl RingBuffer {
    /// Create a ring that can hold `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self { buf: vec![0; capacity + 1].into_boxed_slice(), head: 0, tail: 0 }
    }

    /// Maximum number of buffered bytes.
    pub fn capacity(&self) -> usize {
        self.buf.len() - 1
    }

    /// Number of buffered bytes.
    pub fn len(&self) -> usize {
        (self.tail + self.buf.len() - self.head) % self.buf.len()
    }

    /// Whether nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.head == self.tail
    }

    /// Whether the ring has no free space left.
    pub fn is_full(&self) -> bool {
        self.available() == 0
    }

    /// Free space in bytes.
    pub fn available(&self) -> usize {
        self.capacity() - self.len()
    }

    /// Drop all buffered bytes.
    pub fn clear(&mut self) {
        self.head = 0;
        self.tail = 0;
    }

    /// Append `data`, or nothing at all when it does not fit.
    pub fn write(&mut self, data: &[u8]) -> Result<(), RingFull> {
        let available = self.available();
        if data.len() > available {
            return Err(RingFull { requested: data.len(), available });
        }

        let size = self.buf.len();
        let first = data.len().min(size - self.tail);
        self.buf[self.tail..self.tail + first].copy_from_slice(&data[..first]);
        self.buf[..data.len() - first].copy_from_slice(&data[first..]);
        self.tail = (self.tail + data.len()) % size;

        Ok(())
    }

    /// Take the next terminated line out of the ring.
    ///
    /// The terminator (`\r`, `\n` or `\0`) is consumed but not returned.
    /// Returns `None` and consumes nothing when no terminator is buffered.
    pub fn read_line(&mut self) -> Option<Vec<u8>> {
        let size = self.buf.len();
        let len = self.len();

        let offset = (0..len).find(|i| is_terminator(self.buf[(self.head + i) % size]))?;

        let line = (0..offset).map(|i| self.buf[(self.head + i) % size]).collect();
        self.head = (self.head + offset + 1) % size;

        Some(line)
    }
}
