//! Per-connection line reassembly.
//!
//! TCP delivers arbitrary chunks. [`LineReader`] buffers them in a
//! [`RingBuffer`] of [`MAX_MESSAGE`] bytes and hands out complete lines.
//! Empty lines (for example the second half of `\r\n`) are skipped.

use thiserror::Error;

use crate::{MAX_MESSAGE, ring::RingBuffer};

/// Largest single read the server accepts from one client.
const MAX_READ: usize = MAX_MESSAGE - MAX_MESSAGE / 8;

/// Fatal input conditions for a connection.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineError {
    /// One read delivered more than the server is willing to buffer
    #[error("too much data received ({received} bytes in one read)")]
    TooMuchData {
        /// Size of the offending read
        received: usize,
    },
}

/// Result of feeding one chunk into a [`LineReader`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Received {
    /// Complete, non-empty lines in arrival order
    pub lines: Vec<String>,
    /// Buffered data had to be discarded because no terminator arrived
    /// before the buffer filled up
    pub desync: bool,
}

/// Reassembles protocol lines from a byte stream.
#[derive(Debug, Clone)]
pub struct LineReader {
    ring: RingBuffer,
}

impl Default for LineReader {
    fn default() -> Self {
        Self::new()
    }
}

impl LineReader {
    /// Create a reader with the protocol's message size limit.
    pub fn new() -> Self {
        Self { ring: RingBuffer::with_capacity(MAX_MESSAGE) }
    }

    /// Number of bytes waiting for a terminator.
    pub fn pending(&self) -> usize {
        self.ring.len()
    }

    /// Feed one chunk read from the socket.
    ///
    /// A chunk larger than 7/8 of [`MAX_MESSAGE`] is refused with
    /// [`LineError::TooMuchData`]; the caller is expected to drop the client.
    pub fn feed(&mut self, data: &[u8]) -> Result<Received, LineError> {
        if data.len() > MAX_READ {
            return Err(LineError::TooMuchData { received: data.len() });
        }

        let mut received = Received::default();

        if self.ring.write(data).is_err() {
            received.desync = true;
            self.ring.clear();
            // Fits: MAX_READ < capacity and the ring is empty now.
            let _ = self.ring.write(data);
        }

        while let Some(line) = self.ring.read_line() {
            if !line.is_empty() {
                received.lines.push(String::from_utf8_lossy(&line).into_owned());
            }
        }

        if self.ring.is_full() {
            received.desync = true;
            self.ring.clear();
        }

        Ok(received)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_chunks_into_lines() {
        let mut reader = LineReader::new();

        let first = reader.feed(b"hello\nscreen_a").unwrap();
        assert_eq!(first.lines, ["hello"]);
        assert_eq!(reader.pending(), 8);

        let second = reader.feed(b"dd s1\r\n").unwrap();
        assert_eq!(second.lines, ["screen_add s1"]);
        assert!(!second.desync);
        assert_eq!(reader.pending(), 0);
    }

    #[test]
    fn nul_terminates_like_newline() {
        let mut reader = LineReader::new();
        let got = reader.feed(b"noop\0bye\0").unwrap();
        assert_eq!(got.lines, ["noop", "bye"]);
    }

    #[test]
    fn oversized_read_is_refused() {
        let mut reader = LineReader::new();
        let chunk = vec![b'a'; MAX_READ + 1];
        assert_eq!(reader.feed(&chunk), Err(LineError::TooMuchData { received: MAX_READ + 1 }));
    }

    #[test]
    fn unterminated_flood_is_discarded() {
        let mut reader = LineReader::new();
        let chunk = vec![b'a'; MAX_READ];

        let first = reader.feed(&chunk).unwrap();
        assert!(!first.desync);

        let second = reader.feed(&chunk).unwrap();
        assert!(second.desync);
        assert!(second.lines.is_empty());

        let third = reader.feed(b"\nnoop\n").unwrap();
        assert_eq!(third.lines.last().map(String::as_str), Some("noop"));
    }
}
