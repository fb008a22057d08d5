//! Log-only display.

use lcdproc_core::{Driver, FrameBuffer};

/// Writes the display contents to the log whenever a flush changes them.
#[derive(Debug)]
pub struct TextDriver {
    fb: FrameBuffer,
    shown: Option<Vec<String>>,
}

impl TextDriver {
    /// Display of `(width, height)` characters.
    pub fn new((width, height): (i32, i32)) -> Self {
        Self { fb: FrameBuffer::new(width, height), shown: None }
    }

    /// Current contents framed by `+--+` and `|` borders.
    pub fn dump(&self) -> String {
        let edge = format!("+{}+", "-".repeat(usize::try_from(self.fb.width()).unwrap_or(0)));
        let mut out = edge.clone();
        for row in self.fb.rows() {
            out.push_str(&format!("\n|{row}|"));
        }
        out.push('\n');
        out.push_str(&edge);
        out
    }
}

impl Driver for TextDriver {
    fn name(&self) -> &str {
        "text"
    }

    fn size(&self) -> Option<(i32, i32)> {
        Some((self.fb.width(), self.fb.height()))
    }

    fn clear(&mut self) {
        self.fb.clear();
    }

    fn flush(&mut self) {
        let rows = self.fb.rows();
        if self.shown.as_ref() == Some(&rows) {
            return;
        }
        tracing::info!(target: "lcdproc::text", "\n{}", self.dump());
        self.shown = Some(rows);
    }

    fn string(&mut self, x: i32, y: i32, text: &str) {
        self.fb.put_str(x, y, text);
    }

    fn chr(&mut self, x: i32, y: i32, c: char) {
        self.fb.put_char(x, y, c);
    }

    fn info(&self) -> Option<String> {
        Some("Text mode driver".to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dump_is_framed() {
        let mut driver = TextDriver::new((6, 2));
        driver.string(2, 1, "hello world");
        driver.chr(1, 2, '#');
        assert_eq!(driver.dump(), "+------+\n| hello|\n|#     |\n+------+");
    }

    #[test]
    fn clear_blanks_everything() {
        let mut driver = TextDriver::new((3, 1));
        driver.string(1, 1, "abc");
        driver.clear();
        assert_eq!(driver.dump(), "+---+\n|   |\n+---+");
    }
}
