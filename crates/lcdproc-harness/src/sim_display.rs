//! Recording display driver.
//!
//! `SimDisplay` is an ordinary [`Driver`] that keeps every flushed frame and
//! hands out key presses queued by the test. The test keeps a
//! [`DisplayProbe`] to the same shared state, so it can look at the screen
//! and press keys while the server owns the driver.

#![allow(clippy::disallowed_types, reason = "Synchronous locking operations only")]

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use lcdproc_core::{Driver, FrameBuffer};

/// State shared between the driver and its probe.
struct DisplayState {
    fb: FrameBuffer,
    frames: Vec<Vec<String>>,
    keys: VecDeque<String>,
    backlight: Option<bool>,
    output: Option<i32>,
    closed: bool,
}

fn lock(state: &Mutex<DisplayState>) -> MutexGuard<'_, DisplayState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Simulated character display with a keypad.
pub struct SimDisplay {
    state: Arc<Mutex<DisplayState>>,
}

impl SimDisplay {
    /// Display of `width` by `height` characters and its probe.
    pub fn new(width: i32, height: i32) -> (Self, DisplayProbe) {
        let state = Arc::new(Mutex::new(DisplayState {
            fb: FrameBuffer::new(width, height),
            frames: Vec::new(),
            keys: VecDeque::new(),
            backlight: None,
            output: None,
            closed: false,
        }));
        (Self { state: Arc::clone(&state) }, DisplayProbe { state })
    }
}

impl Drop for SimDisplay {
    fn drop(&mut self) {
        lock(&self.state).closed = true;
    }
}

impl Driver for SimDisplay {
    fn name(&self) -> &str {
        "sim"
    }

    fn size(&self) -> Option<(i32, i32)> {
        let state = lock(&self.state);
        Some((state.fb.width(), state.fb.height()))
    }

    fn clear(&mut self) {
        lock(&self.state).fb.clear();
    }

    fn flush(&mut self) {
        let mut state = lock(&self.state);
        let rows = state.fb.rows();
        state.frames.push(rows);
    }

    fn string(&mut self, x: i32, y: i32, text: &str) {
        lock(&self.state).fb.put_str(x, y, text);
    }

    fn chr(&mut self, x: i32, y: i32, c: char) {
        lock(&self.state).fb.put_char(x, y, c);
    }

    fn backlight(&mut self, on: bool) {
        lock(&self.state).backlight = Some(on);
    }

    fn output(&mut self, state: i32) {
        lock(&self.state).output = Some(state);
    }

    fn get_key(&mut self) -> Option<String> {
        lock(&self.state).keys.pop_front()
    }

    fn info(&self) -> Option<String> {
        Some("Simulated display".to_owned())
    }
}

/// Test-side handle to a [`SimDisplay`].
#[derive(Clone)]
pub struct DisplayProbe {
    state: Arc<Mutex<DisplayState>>,
}

impl DisplayProbe {
    /// Queue a key press for the server's next input pass.
    pub fn press(&self, key: &str) {
        lock(&self.state).keys.push_back(key.to_owned());
    }

    /// Rows of the most recently flushed frame.
    pub fn last_frame(&self) -> Option<Vec<String>> {
        lock(&self.state).frames.last().cloned()
    }

    /// Number of frames flushed so far.
    pub fn frame_count(&self) -> usize {
        lock(&self.state).frames.len()
    }

    /// Whether any flushed frame contains `text`.
    pub fn ever_showed(&self, text: &str) -> bool {
        lock(&self.state).frames.iter().flatten().any(|row| row.contains(text))
    }

    /// Last backlight state sent to the display.
    pub fn backlight(&self) -> Option<bool> {
        lock(&self.state).backlight
    }

    /// Last output bits sent to the display.
    pub fn output(&self) -> Option<i32> {
        lock(&self.state).output
    }

    /// Whether the server dropped the driver.
    pub fn is_closed(&self) -> bool {
        lock(&self.state).closed
    }
}
