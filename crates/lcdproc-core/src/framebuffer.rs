//! Character grid shared by the software displays.

/// A `width` x `height` grid of characters with 1-based coordinates.
/// Writes outside the grid are clipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    width: i32,
    height: i32,
    cells: Vec<char>,
}

impl FrameBuffer {
    /// Blank grid. Negative sizes are treated as zero.
    pub fn new(width: i32, height: i32) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        let cells = vec![' '; usize::try_from(width * height).unwrap_or(0)];
        Self { width, height, cells }
    }

    /// Columns.
    pub fn width(&self) -> i32 {
        self.width
    }

    /// Rows.
    pub fn height(&self) -> i32 {
        self.height
    }

    /// Fill with blanks.
    pub fn clear(&mut self) {
        self.cells.fill(' ');
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 1 || y < 1 || x > self.width || y > self.height {
            return None;
        }
        usize::try_from((y - 1) * self.width + (x - 1)).ok()
    }

    /// Put one character.
    pub fn put_char(&mut self, x: i32, y: i32, c: char) {
        if let Some(index) = self.index(x, y) {
            self.cells[index] = c;
        }
    }

    /// Put a string starting at `(x, y)`, clipped at the right edge.
    pub fn put_str(&mut self, x: i32, y: i32, text: &str) {
        for (offset, c) in (0..).zip(text.chars()) {
            if x + offset > self.width {
                break;
            }
            self.put_char(x + offset, y, c);
        }
    }

    /// Character at `(x, y)`.
    pub fn get(&self, x: i32, y: i32) -> Option<char> {
        self.index(x, y).map(|index| self.cells[index])
    }

    /// Contents, one string per row.
    pub fn rows(&self) -> Vec<String> {
        let width = usize::try_from(self.width).unwrap_or(0).max(1);
        self.cells.chunks(width).map(|row| row.iter().collect()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strings_are_clipped() {
        let mut fb = FrameBuffer::new(5, 2);
        fb.put_str(3, 1, "abcdef");
        fb.put_str(-1, 2, "xyz");
        fb.put_char(1, 3, 'q');
        assert_eq!(fb.rows(), ["  abc", "z    "]);
    }
}
