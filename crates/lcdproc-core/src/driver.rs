//! Display driver capability interface and fan-out.
//!
//! A [`Driver`] implements the primitives its hardware offers. Every
//! optional primitive has a default that reports "not handled"; the
//! [`DriverSet`] then draws a character-based substitute through the
//! driver's `chr`, so layout code never needs to know what a display can
//! do.
//!
//! Several drivers may be loaded at once. All of them receive every call;
//! the first one with output capabilities defines the display geometry.

use crate::{icon::Icon, menu::DriverControls, screen::Cursor};

/// Cell width assumed when a driver does not report one.
pub const DEFAULT_CELL_WIDTH: i32 = 5;

/// Cell height assumed when a driver does not report one.
pub const DEFAULT_CELL_HEIGHT: i32 = 8;

/// Geometry of the display all layout is computed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DisplayProps {
    /// Columns
    pub width: i32,
    /// Rows
    pub height: i32,
    /// Pixels per character cell, horizontally
    pub cell_width: i32,
    /// Pixels per character cell, vertically
    pub cell_height: i32,
}

impl Default for DisplayProps {
    fn default() -> Self {
        Self { width: 20, height: 4, cell_width: DEFAULT_CELL_WIDTH, cell_height: DEFAULT_CELL_HEIGHT }
    }
}

/// A display (and possibly keypad) driver.
///
/// Coordinates are 1-based. Methods returning `bool` are optional
/// primitives: `false` means the driver did not draw anything and the
/// caller should use the software fallback.
pub trait Driver: Send {
    /// Name used in configuration and logs.
    fn name(&self) -> &str;

    /// Size in characters; `None` for input-only drivers.
    fn size(&self) -> Option<(i32, i32)>;

    /// Pixels per character cell, if known.
    fn cell_size(&self) -> Option<(i32, i32)> {
        None
    }

    /// Blank the frame buffer.
    fn clear(&mut self) {}

    /// Push the frame buffer to the display.
    fn flush(&mut self) {}

    /// Write a string.
    fn string(&mut self, _x: i32, _y: i32, _text: &str) {}

    /// Write one character.
    fn chr(&mut self, _x: i32, _y: i32, _c: char) {}

    /// Vertical bar growing upward from `(x, y)`, `len` cells at full scale.
    fn vbar(&mut self, _x: i32, _y: i32, _len: i32, _promille: i32) -> bool {
        false
    }

    /// Horizontal bar growing rightward from `(x, y)`.
    fn hbar(&mut self, _x: i32, _y: i32, _len: i32, _promille: i32) -> bool {
        false
    }

    /// Percentage bar without labels.
    fn pbar(&mut self, _x: i32, _y: i32, _len: i32, _promille: i32) -> bool {
        false
    }

    /// Big digit (0 to 9, 10 for a colon) at column `x`.
    fn num(&mut self, _x: i32, _digit: i32) -> bool {
        false
    }

    /// Show or hide the heartbeat indicator.
    fn heartbeat(&mut self, _on: bool) -> bool {
        false
    }

    /// Draw an icon. Drivers may decline icons they have no glyph for.
    fn icon(&mut self, _x: i32, _y: i32, _icon: Icon) -> bool {
        false
    }

    /// Place the hardware cursor.
    fn cursor(&mut self, _x: i32, _y: i32, _state: Cursor) -> bool {
        false
    }

    /// Switch the backlight.
    fn backlight(&mut self, _on: bool) {}

    /// Set general purpose output bits.
    fn output(&mut self, _state: i32) {}

    /// Next pending key press.
    fn get_key(&mut self) -> Option<String> {
        None
    }

    /// Free-form description.
    fn info(&self) -> Option<String> {
        None
    }

    /// Current contrast (0 to 1000), when adjustable.
    fn contrast(&self) -> Option<i32> {
        None
    }

    /// Set the contrast.
    fn set_contrast(&mut self, _promille: i32) {}

    /// Current brightness for the backlight on or off state, when adjustable.
    fn brightness(&self, _backlight_on: bool) -> Option<i32> {
        None
    }

    /// Set the brightness for the backlight on or off state.
    fn set_brightness(&mut self, _backlight_on: bool, _promille: i32) {}
}

/// Rows of the fallback big-number font, digits 0 to 9 then the colon.
const NUM_FONT: [[&str; 4]; 11] = [
    [" _ ", "| |", "|_|", "   "],
    ["   ", "  |", "  |", "   "],
    [" _ ", " _|", "|_ ", "   "],
    [" _ ", " _|", " _|", "   "],
    ["   ", "|_|", "  |", "   "],
    [" _ ", "|_ ", " _|", "   "],
    [" _ ", "|_ ", "|_|", "   "],
    [" _ ", "  |", "  |", "   "],
    [" _ ", "|_|", "|_|", "   "],
    [" _ ", "|_|", " _|", "   "],
    [" ", ".", ".", " "],
];

/// Cells of a fallback bar: `2 * pos < promille * len / 500 + 1`.
fn bar_cells(len: i32, promille: i32) -> impl Iterator<Item = i32> {
    let reach = i64::from(promille) * i64::from(len) / 500 + 1;
    (0..len).take_while(move |&pos| 2 * i64::from(pos) < reach)
}

fn alt_icon(driver: &mut dyn Driver, x: i32, y: i32, icon: Icon) {
    if driver.size().is_none() {
        return;
    }
    for (offset, c) in (0..).zip(icon.fallback().chars()) {
        driver.chr(x + offset, y, c);
    }
}

fn draw_icon(driver: &mut dyn Driver, x: i32, y: i32, icon: Icon) {
    if !driver.icon(x, y, icon) {
        alt_icon(driver, x, y, icon);
    }
}

fn draw_hbar(driver: &mut dyn Driver, x: i32, y: i32, len: i32, promille: i32) {
    if driver.hbar(x, y, len, promille) || driver.size().is_none() {
        return;
    }
    for pos in bar_cells(len, promille) {
        driver.chr(x + pos, y, '-');
    }
}

/// The loaded drivers.
#[derive(Default)]
pub struct DriverSet {
    drivers: Vec<Box<dyn Driver>>,
    output: Option<usize>,
    props: Option<DisplayProps>,
}

impl std::fmt::Debug for DriverSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriverSet")
            .field("drivers", &self.drivers.iter().map(|d| d.name().to_owned()).collect::<Vec<_>>())
            .field("props", &self.props)
            .finish()
    }
}

impl DriverSet {
    /// No drivers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a driver. The first driver with output defines the geometry.
    pub fn add(&mut self, driver: Box<dyn Driver>) {
        if self.output.is_none()
            && let Some((width, height)) = driver.size()
        {
            let (cell_width, cell_height) = driver
                .cell_size()
                .filter(|&(w, h)| w > 0 && h > 0)
                .unwrap_or((DEFAULT_CELL_WIDTH, DEFAULT_CELL_HEIGHT));
            self.props = Some(DisplayProps { width, height, cell_width, cell_height });
            self.output = Some(self.drivers.len());
        }
        self.drivers.push(driver);
    }

    /// Geometry of the output driver, if one is loaded.
    pub fn props(&self) -> Option<DisplayProps> {
        self.props
    }

    /// Whether a driver with output is loaded.
    pub fn has_output(&self) -> bool {
        self.output.is_some()
    }

    /// Number of loaded drivers.
    pub fn len(&self) -> usize {
        self.drivers.len()
    }

    /// True when no driver is loaded.
    pub fn is_empty(&self) -> bool {
        self.drivers.is_empty()
    }

    /// Driver names in load order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.drivers.iter().map(|d| d.name())
    }

    /// Driver at `index`.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut (dyn Driver + 'static)> {
        self.drivers.get_mut(index).map(|d| &mut **d)
    }

    /// Contrast and brightness controls of every driver, in load order.
    pub fn controls(&self) -> Vec<DriverControls> {
        self.drivers
            .iter()
            .map(|d| DriverControls {
                name: d.name().to_owned(),
                contrast: d.contrast(),
                brightness: d.brightness(true).zip(d.brightness(false)),
            })
            .collect()
    }

    fn each(&mut self, mut f: impl FnMut(&mut dyn Driver)) {
        for driver in &mut self.drivers {
            f(driver.as_mut());
        }
    }

    /// Blank every display.
    pub fn clear(&mut self) {
        self.each(|d| d.clear());
    }

    /// Push every frame buffer.
    pub fn flush(&mut self) {
        self.each(|d| d.flush());
    }

    /// Write a string everywhere.
    pub fn string(&mut self, x: i32, y: i32, text: &str) {
        self.each(|d| d.string(x, y, text));
    }

    /// Write a character everywhere.
    pub fn chr(&mut self, x: i32, y: i32, c: char) {
        self.each(|d| d.chr(x, y, c));
    }

    /// Vertical bar, `|` runs where unsupported.
    pub fn vbar(&mut self, x: i32, y: i32, len: i32, promille: i32) {
        self.each(|d| {
            if d.vbar(x, y, len, promille) || d.size().is_none() {
                return;
            }
            for pos in bar_cells(len, promille) {
                d.chr(x, y - pos, '|');
            }
        });
    }

    /// Horizontal bar, `-` runs where unsupported.
    pub fn hbar(&mut self, x: i32, y: i32, len: i32, promille: i32) {
        self.each(|d| draw_hbar(d, x, y, len, promille));
    }

    /// Percentage bar `width` cells wide including its labels. Without
    /// labels and without native support the bar is framed by `[` `]`.
    /// Labels are dropped when they leave fewer than two cells for the bar.
    pub fn pbar(&mut self, x: i32, y: i32, width: i32, promille: i32, begin: Option<&str>, end: Option<&str>) {
        self.each(|d| {
            if d.size().is_none() {
                return;
            }
            let (begin, end) = match (begin, end) {
                (None, None) => {
                    if d.pbar(x, y, width, promille) {
                        return;
                    }
                    (Some("["), Some("]"))
                },
                labels => labels,
            };
            let mut begin_len = begin.map_or(0, |s| i32::try_from(s.chars().count()).unwrap_or(i32::MAX));
            let mut end_len = end.map_or(0, |s| i32::try_from(s.chars().count()).unwrap_or(i32::MAX));
            if begin_len.saturating_add(end_len).saturating_add(2) > width {
                begin_len = 0;
                end_len = 0;
            }
            let len = width - begin_len - end_len;
            let mut x = x;
            if begin_len > 0
                && let Some(label) = begin
            {
                d.string(x, y, label);
                x += begin_len;
            }
            if !d.pbar(x, y, len, promille) {
                draw_hbar(d, x, y, len, promille);
            }
            if end_len > 0
                && let Some(label) = end
            {
                d.string(x + len, y, label);
            }
        });
    }

    /// Big digit, drawn with a 3x4 character font where unsupported.
    pub fn num(&mut self, x: i32, digit: i32) {
        self.each(|d| {
            if d.num(x, digit) || d.size().is_none() {
                return;
            }
            let Some(glyph) = usize::try_from(digit).ok().and_then(|i| NUM_FONT.get(i)) else {
                return;
            };
            for (y, row) in (1..).zip(glyph) {
                for (dx, c) in (0..).zip(row.chars()) {
                    d.chr(x + dx, y, c);
                }
            }
        });
    }

    /// Heartbeat; where unsupported a heart in the top right corner that
    /// beats with `timer`.
    pub fn heartbeat(&mut self, on: bool, timer: u64) {
        self.each(|d| {
            if d.heartbeat(on) || !on {
                return;
            }
            let Some((width, _)) = d.size() else {
                return;
            };
            let icon = if timer & 5 != 0 { Icon::HeartFilled } else { Icon::HeartOpen };
            draw_icon(d, width, 1, icon);
        });
    }

    /// Icon, or its ASCII substitute.
    pub fn icon(&mut self, x: i32, y: i32, icon: Icon) {
        self.each(|d| draw_icon(d, x, y, icon));
    }

    /// Cursor; where unsupported a blinking block or underline.
    pub fn cursor(&mut self, x: i32, y: i32, state: Cursor, timer: u64) {
        self.each(|d| {
            if d.cursor(x, y, state) || d.size().is_none() || timer & 2 == 0 {
                return;
            }
            match state {
                Cursor::On | Cursor::Block => draw_icon(d, x, y, Icon::BlockFilled),
                Cursor::Under => d.chr(x, y, '_'),
                Cursor::Off => {},
            }
        });
    }

    /// Switch every backlight.
    pub fn backlight(&mut self, on: bool) {
        self.each(|d| d.backlight(on));
    }

    /// Set output bits everywhere.
    pub fn output(&mut self, state: i32) {
        self.each(|d| d.output(state));
    }

    /// First pending key of any driver, with the driver's name.
    pub fn get_key(&mut self) -> Option<(String, String)> {
        self.drivers
            .iter_mut()
            .find_map(|d| d.get_key().map(|key| (d.name().to_owned(), key)))
    }

    /// Description of the first driver that has one.
    pub fn info(&self) -> String {
        self.drivers.iter().find_map(|d| d.info()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::framebuffer::FrameBuffer;

    /// Bare character display: every primitive goes through the fallbacks.
    struct Plain {
        fb: Arc<Mutex<FrameBuffer>>,
    }

    fn plain(width: i32, height: i32) -> (Box<Plain>, Arc<Mutex<FrameBuffer>>) {
        let fb = Arc::new(Mutex::new(FrameBuffer::new(width, height)));
        (Box::new(Plain { fb: Arc::clone(&fb) }), fb)
    }

    impl Driver for Plain {
        fn name(&self) -> &str {
            "plain"
        }

        fn size(&self) -> Option<(i32, i32)> {
            let fb = self.fb.lock().unwrap();
            Some((fb.width(), fb.height()))
        }

        fn clear(&mut self) {
            self.fb.lock().unwrap().clear();
        }

        fn string(&mut self, x: i32, y: i32, text: &str) {
            self.fb.lock().unwrap().put_str(x, y, text);
        }

        fn chr(&mut self, x: i32, y: i32, c: char) {
            self.fb.lock().unwrap().put_char(x, y, c);
        }
    }

    /// Input-only driver.
    struct Keypad;

    impl Driver for Keypad {
        fn name(&self) -> &str {
            "keypad"
        }

        fn size(&self) -> Option<(i32, i32)> {
            None
        }

        fn get_key(&mut self) -> Option<String> {
            Some("Enter".into())
        }

        fn info(&self) -> Option<String> {
            Some("keypad only".into())
        }
    }

    fn drawn(width: i32, height: i32, draw: impl FnOnce(&mut DriverSet)) -> Vec<String> {
        let (driver, fb) = plain(width, height);
        let mut set = DriverSet::new();
        set.add(driver);
        draw(&mut set);
        fb.lock().unwrap().rows()
    }

    #[test]
    fn first_output_driver_defines_geometry() {
        let mut set = DriverSet::new();
        set.add(Box::new(Keypad));
        assert!(set.props().is_none());
        set.add(plain(16, 2).0);
        set.add(plain(40, 4).0);
        let props = set.props().unwrap();
        assert_eq!((props.width, props.height, props.cell_width), (16, 2, DEFAULT_CELL_WIDTH));
        assert_eq!(set.info(), "keypad only");
        assert_eq!(set.get_key(), Some(("keypad".to_owned(), "Enter".to_owned())));
    }

    #[test]
    fn fallback_bar_cells() {
        assert_eq!(bar_cells(10, 1000).count(), 10);
        assert_eq!(bar_cells(10, 500).count(), 6);
        assert_eq!(bar_cells(10, 0).count(), 1);
    }

    #[test]
    fn fallback_bars_and_pbar_frame() {
        let rows = drawn(10, 4, |set| {
            set.hbar(1, 1, 4, 1000);
            set.vbar(10, 4, 3, 1000);
            set.pbar(1, 2, 8, 500, None, None);
            set.pbar(1, 3, 9, 1000, Some("lo"), Some("hi"));
        });
        assert_eq!(rows, ["----      ", "[----  ] |", "lo-----hi|", "         |"]);
    }

    #[test]
    fn fallback_num_and_icons() {
        let rows = drawn(6, 4, |set| {
            set.num(1, 4);
            set.num(4, 10);
            set.icon(5, 1, Icon::FastForward);
        });
        assert_eq!(rows, ["    >>", "|_|.  ", "  |.  ", "      "]);
    }

    #[test]
    fn fallback_heartbeat_and_cursor_follow_timer() {
        let beat = drawn(4, 2, |set| set.heartbeat(true, 1));
        assert_eq!(beat[0], "   #");
        let rest = drawn(4, 2, |set| set.heartbeat(true, 2));
        assert_eq!(rest[0], "   -");
        let off = drawn(4, 2, |set| set.heartbeat(false, 1));
        assert_eq!(off[0], "    ");

        let under = drawn(4, 2, |set| set.cursor(2, 2, Cursor::Under, 2));
        assert_eq!(under[1], " _  ");
        let hidden = drawn(4, 2, |set| set.cursor(2, 2, Cursor::Block, 1));
        assert_eq!(hidden[1], "    ");
    }
}
