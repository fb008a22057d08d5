//! Edit state of the value-entry items (numeric, alpha, ip).
//!
//! The buffer is a fixed-size byte field where NUL ends the visible text.
//! Editing a position in the middle may write a NUL and hide everything
//! behind it; those bytes stay in the buffer and reappear when the position
//! gets a character again.

use std::fmt;

/// Input error shown on the edit screen's last row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum EditError {
    /// No error
    #[default]
    None,
    /// Committed number outside the allowed range
    OutOfRange,
    /// No room for another character
    TooLong,
    /// Fewer characters than the minimum length
    TooShort,
    /// Text is not a valid address
    InvalidAddress,
}

impl EditError {
    /// Text shown to the user.
    pub fn message(self) -> &'static str {
        match self {
            Self::None => "",
            Self::OutOfRange => "Out of range",
            Self::TooLong => "Too long",
            Self::TooShort => "Too short",
            Self::InvalidAddress => "Invalid Address",
        }
    }
}

impl fmt::Display for EditError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Cursor, scroll offset and pending text of an edit field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditBuffer {
    bytes: Vec<u8>,
    /// Cursor position in the buffer
    pub pos: usize,
    /// First buffer position shown on the display
    pub offs: usize,
    /// Error from the last key
    pub error: EditError,
}

impl EditBuffer {
    /// Empty buffer holding up to `capacity` characters.
    pub fn new(capacity: usize) -> Self {
        Self { bytes: vec![0; capacity + 1], pos: 0, offs: 0, error: EditError::None }
    }

    /// Number of characters the buffer can hold.
    pub fn capacity(&self) -> usize {
        self.bytes.len().saturating_sub(1)
    }

    /// Replace the contents with `text` (truncated to capacity) and move the
    /// cursor home.
    pub fn load(&mut self, text: &str) {
        self.bytes.fill(0);
        let cap = self.capacity();
        for (slot, byte) in self.bytes.iter_mut().zip(text.bytes().take(cap)) {
            *slot = byte;
        }
        self.pos = 0;
        self.offs = 0;
    }

    /// Resize to a new capacity, clearing the contents.
    pub fn resize(&mut self, capacity: usize) {
        self.bytes = vec![0; capacity + 1];
        self.pos = 0;
        self.offs = 0;
    }

    /// Byte at `index`, NUL outside the buffer.
    pub fn get(&self, index: usize) -> u8 {
        self.bytes.get(index).copied().unwrap_or(0)
    }

    /// Byte under the cursor.
    pub fn current(&self) -> u8 {
        self.get(self.pos)
    }

    /// Overwrite the byte at `index`; writes past the capacity are dropped.
    pub fn set(&mut self, index: usize, byte: u8) {
        let capacity = self.capacity();
        if let Some(slot) = self.bytes.get_mut(index).filter(|_| index < capacity) {
            *slot = byte;
        }
    }

    /// Visible text: everything before the first NUL.
    pub fn text(&self) -> String {
        self.text_from(0)
    }

    /// Visible text starting at `start`, up to the next NUL.
    pub fn text_from(&self, start: usize) -> String {
        let tail = self.bytes.get(start..).unwrap_or_default();
        let end = tail.iter().position(|&b| b == 0).unwrap_or(tail.len());
        String::from_utf8_lossy(&tail[..end]).into_owned()
    }

    /// Length of the visible text.
    pub fn len(&self) -> usize {
        self.bytes.iter().position(|&b| b == 0).unwrap_or(self.bytes.len())
    }

    /// True when the visible text is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Move the cursor back one position, keeping the offset in view.
    pub fn cursor_left(&mut self) {
        if self.pos > 0 {
            self.pos -= 1;
            self.offs = self.offs.min(self.pos);
        }
    }

    /// Advance the cursor; the view scrolls once the old position reached
    /// the right edge of a `display_width` wide display.
    pub fn advance(&mut self, display_width: usize) {
        let old = self.pos;
        self.pos += 1;
        if old + 2 >= display_width {
            self.offs += 1;
        }
    }

    /// Home the cursor and show `error`.
    pub fn fail(&mut self, error: EditError) {
        self.error = error;
        self.pos = 0;
        self.offs = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nul_hides_the_tail() {
        let mut buf = EditBuffer::new(8);
        buf.load("123");
        buf.set(1, 0);
        assert_eq!(buf.text(), "1");
        buf.set(1, b'0');
        assert_eq!(buf.text(), "103");
    }

    #[test]
    fn load_truncates() {
        let mut buf = EditBuffer::new(3);
        buf.load("abcdef");
        assert_eq!(buf.text(), "abc");
        buf.set(3, b'x');
        assert_eq!(buf.len(), 3);
    }

    #[test]
    fn offset_follows_cursor() {
        let mut buf = EditBuffer::new(40);
        buf.load("12345678");
        for _ in 0..6 {
            buf.advance(6);
        }
        assert_eq!(buf.pos, 6);
        assert_eq!(buf.offs, 2);
        assert_eq!(buf.text_from(buf.offs), "345678");

        for _ in 0..5 {
            buf.cursor_left();
        }
        assert_eq!((buf.pos, buf.offs), (1, 1));
    }
}
