//! Terminal display (`curses`).
//!
//! Shows the character grid in a bordered box on the alternate screen. The
//! border is highlighted while the backlight is on. Keys typed into the
//! terminal are reported with LCDproc key names.

use std::{
    io::{self, Stdout, stdout},
    time::Duration,
};

use crossterm::{
    ExecutableCommand,
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use lcdproc_core::{Driver, FrameBuffer};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::Rect,
    style::{Color, Style},
    widgets::{Block, Borders, Paragraph},
};

/// Full-screen terminal driver.
pub struct TerminalDriver {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    fb: FrameBuffer,
    backlight: bool,
}

impl TerminalDriver {
    /// Take over the terminal for a display of `(width, height)`.
    pub fn new((width, height): (i32, i32)) -> Result<Self, io::Error> {
        enable_raw_mode()?;
        stdout().execute(EnterAlternateScreen)?;

        let backend = CrosstermBackend::new(stdout());
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;

        Ok(Self { terminal, fb: FrameBuffer::new(width, height), backlight: true })
    }

    /// LCDproc name of a key press.
    fn convert_key(code: KeyCode) -> Option<String> {
        match code {
            KeyCode::Up => Some("Up".to_owned()),
            KeyCode::Down => Some("Down".to_owned()),
            KeyCode::Left => Some("Left".to_owned()),
            KeyCode::Right => Some("Right".to_owned()),
            KeyCode::Enter => Some("Enter".to_owned()),
            KeyCode::Esc => Some("Escape".to_owned()),
            KeyCode::Char(c) if !c.is_control() => Some(c.to_string()),
            _ => None,
        }
    }
}

/// Draw `rows` in a box anchored at the top left of the terminal.
pub fn render(frame: &mut Frame, rows: &[String], backlight: bool) {
    let width = rows.first().map_or(0, |r| r.chars().count());
    let area = frame.area();
    let box_area = Rect {
        x: area.x,
        y: area.y,
        width: u16::try_from(width + 2).unwrap_or(u16::MAX).min(area.width),
        height: u16::try_from(rows.len() + 2).unwrap_or(u16::MAX).min(area.height),
    };

    let border = if backlight {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let block = Block::default().borders(Borders::ALL).border_style(border);
    let paragraph = Paragraph::new(rows.join("\n")).block(block);

    frame.render_widget(paragraph, box_area);
}

impl Driver for TerminalDriver {
    fn name(&self) -> &str {
        "curses"
    }

    fn size(&self) -> Option<(i32, i32)> {
        Some((self.fb.width(), self.fb.height()))
    }

    fn clear(&mut self) {
        self.fb.clear();
    }

    fn flush(&mut self) {
        let rows = self.fb.rows();
        let backlight = self.backlight;
        if let Err(e) = self.terminal.draw(|frame| render(frame, &rows, backlight)) {
            tracing::warn!(error = %e, "terminal draw failed");
        }
    }

    fn string(&mut self, x: i32, y: i32, text: &str) {
        self.fb.put_str(x, y, text);
    }

    fn chr(&mut self, x: i32, y: i32, c: char) {
        self.fb.put_char(x, y, c);
    }

    fn backlight(&mut self, on: bool) {
        self.backlight = on;
    }

    fn get_key(&mut self) -> Option<String> {
        loop {
            match event::poll(Duration::ZERO) {
                Ok(true) => {},
                Ok(false) => return None,
                Err(e) => {
                    tracing::warn!(error = %e, "terminal input failed");
                    return None;
                },
            }
            match event::read() {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                    if let Some(name) = Self::convert_key(key.code) {
                        return Some(name);
                    }
                },
                Ok(_) => {},
                Err(e) => {
                    tracing::warn!(error = %e, "terminal input failed");
                    return None;
                },
            }
        }
    }

    fn info(&self) -> Option<String> {
        Some("curses driver".to_owned())
    }
}

impl Drop for TerminalDriver {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = stdout().execute(LeaveAlternateScreen);
    }
}
