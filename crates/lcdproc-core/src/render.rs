//! Screen composition.
//!
//! [`Renderer::render_screen`] turns the current screen into driver calls
//! once per render tick. The steps run in a fixed order: clear, backlight,
//! output bits, widget tree, cursor, heartbeat, server message, flush.
//!
//! All animation (scrollers, titles, frame scrolling, blinking) is a pure
//! function of the render `timer`, so rendering the same screen at the same
//! tick always produces the same calls.

use crate::{
    client::Client,
    driver::{DisplayProps, DriverSet},
    icon::Icon,
    menu::TITLESPEED_MAX,
    screen::{Backlight, Screen, Switch},
    widget::{ScrollDirection, Widget, WidgetData},
};

/// Longest server message, without the `| ` prefix.
pub const MESSAGE_MAX: usize = 15;

/// Server-wide render state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Renderer {
    /// Backlight override that beats every client and screen
    pub backlight: Backlight,
    /// Heartbeat override that beats every client and screen
    pub heartbeat: Switch,
    /// Title scroll speed; 0 disables scrolling, 10 is fastest
    pub titlespeed: i32,
    /// Output port bits sent on every render
    pub output_state: i32,
    message: Option<(String, u32)>,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(TITLESPEED_MAX)
    }
}

impl Renderer {
    /// Renderer with no overrides.
    pub fn new(titlespeed: i32) -> Self {
        Self {
            backlight: Backlight::OPEN,
            heartbeat: Switch::Open,
            titlespeed,
            output_state: 0,
            message: None,
        }
    }

    /// Overlay `text` in the bottom right corner for the next `renders`
    /// calls to [`render_screen`](Self::render_screen), replacing any
    /// message still showing. Returns false, changing nothing, when the text
    /// is longer than [`MESSAGE_MAX`] or `renders` is zero.
    pub fn show_message(&mut self, text: &str, renders: u32) -> bool {
        if text.chars().count() > MESSAGE_MAX || renders == 0 {
            return false;
        }
        self.message = Some((format!("| {text}"), renders));
        true
    }

    /// Message still pending, if any.
    pub fn message(&self) -> Option<&str> {
        self.message.as_ref().map(|(text, _)| text.as_str())
    }

    /// Whether the backlight is lit for `screen` at `timer`.
    ///
    /// The server override wins over the client's, which wins over the
    /// screen's; when all are open the backlight is on. Flash inverts the
    /// base state one tick in eight, blink two ticks in sixteen.
    pub fn backlight_lit(&self, screen: &Screen, client: Option<&Client>, timer: u64) -> bool {
        let state = [self.backlight, client.map_or(Backlight::OPEN, |c| c.backlight), screen.backlight]
            .into_iter()
            .find(|b| !b.is_open())
            .unwrap_or(Backlight::ON);
        let on = state.is_on();
        if state.flash {
            on ^ (timer & 7 == 7)
        } else if state.blink {
            on ^ (timer & 14 == 14)
        } else {
            on
        }
    }

    /// Whether the heartbeat shows for `screen`, with the same precedence as
    /// the backlight.
    pub fn heartbeat_on(&self, screen: &Screen, client: Option<&Client>) -> bool {
        [self.heartbeat, client.map_or(Switch::Open, |c| c.heartbeat), screen.heartbeat]
            .into_iter()
            .find(|&s| s != Switch::Open)
            .unwrap_or(Switch::On)
            == Switch::On
    }

    /// Draw `screen` on every driver. `client` is the screen's owner.
    pub fn render_screen(&mut self, screen: &Screen, client: Option<&Client>, drivers: &mut DriverSet, timer: u64) {
        let props = drivers.props().unwrap_or_default();

        drivers.clear();
        drivers.backlight(self.backlight_lit(screen, client, timer));
        drivers.output(self.output_state);

        let speed = screen.duration.checked_div(screen.height).unwrap_or(1).max(1);
        let bounds = Bounds { left: 0, top: 0, right: props.width, bottom: props.height };
        Pass {
            drivers: &mut *drivers,
            props,
            timer: i64::try_from(timer).unwrap_or(i64::MAX),
            title_delay: title_delay(self.titlespeed),
        }
        .frame(screen.widgets(), bounds, screen.height, Some(ScrollDirection::Vertical), speed);

        drivers.cursor(screen.cursor_x, screen.cursor_y, screen.cursor, timer);
        drivers.heartbeat(self.heartbeat_on(screen, client), timer);

        if let Some((text, renders)) = &mut self.message {
            let len = i32::try_from(text.chars().count()).unwrap_or(0);
            drivers.string(props.width - len + 1, props.height, text);
            *renders -= 1;
            if *renders == 0 {
                self.message = None;
            }
        }

        drivers.flush();
    }
}

/// Ticks per title scroll step: 0 for no scrolling.
fn title_delay(titlespeed: i32) -> i64 {
    if titlespeed <= 0 { 0 } else { i64::from((TITLESPEED_MAX - titlespeed).max(1)) }
}

/// Visible area of a frame in display coordinates, exclusive at the top
/// left.
#[derive(Debug, Clone, Copy)]
struct Bounds {
    left: i32,
    top: i32,
    right: i32,
    bottom: i32,
}

/// One traversal of a widget tree.
struct Pass<'a> {
    drivers: &'a mut DriverSet,
    props: DisplayProps,
    timer: i64,
    title_delay: i64,
}

/// Chars of `text` from `start`, at most `len` of them.
fn window(text: &[char], start: i64, len: i64) -> String {
    let start = usize::try_from(start).unwrap_or(0);
    let len = usize::try_from(len).unwrap_or(0);
    text.iter().skip(start).take(len).collect()
}

/// Offset of a back-and-forth scroll over `span` steps at `speed`.
///
/// Positive speeds take `speed` ticks per step, negative ones move `-speed`
/// steps per tick. The direction flips at every end.
fn bounce(timer: i64, span: i64, speed: i64) -> i64 {
    let offset = match speed {
        0 => 0,
        s if s > 0 => {
            let period = (span * s).max(1);
            if (timer / period) % 2 == 0 {
                (timer % period) / s
            } else {
                -(((timer % period) - period + 1) / s)
            }
        },
        s => {
            let period = (span / -s).max(1);
            if (timer / period) % 2 == 0 {
                (timer % period) * -s
            } else {
                -(((timer % period) * -s) - span + 1)
            }
        },
    };
    offset.max(0)
}

impl Pass<'_> {
    fn frame(&mut self, widgets: &[Widget], b: Bounds, height: i32, direction: Option<ScrollDirection>, speed: i32) {
        if height <= 0 {
            return;
        }

        let mut fy = 0;
        if direction == Some(ScrollDirection::Vertical) && speed != 0 && height > b.bottom - b.top {
            let span = i64::from(height - (b.bottom - b.top) + 1);
            let speed = i64::from(speed);
            let offset = if speed > 0 { (self.timer / speed) % span } else { (-speed).saturating_mul(self.timer) % span };
            fy = i32::try_from(offset.max(0)).unwrap_or(0);
        }

        for widget in widgets {
            self.widget(widget, b, fy);
        }
    }

    fn widget(&mut self, widget: &Widget, b: Bounds, fy: i32) {
        let top = b.top - fy;
        let in_rows = |y: i32| y > 0 && y > fy && y <= b.bottom - top;
        match &widget.data {
            WidgetData::String { x, y, text: Some(text) } => {
                if *x > 0 && in_rows(*y) {
                    let x = (*x).min(b.right - b.left);
                    self.drivers.string(x + b.left, y + top, text);
                }
            },
            WidgetData::HBar { x, y, length } => {
                if *x > 0 && in_rows(*y) && *length > 0 {
                    self.hbar(*x, *y, *length, b, top);
                }
            },
            WidgetData::VBar { x, y, length } => {
                if *x > 0 && *y > 0 && *length > 0 {
                    let full = self.props.height;
                    let cells = i64::from(self.props.cell_height.max(1)) * i64::from(full.max(1));
                    let promille = i32::try_from(1000 * i64::from(*length) / cells).unwrap_or(i32::MAX);
                    self.drivers.vbar(x + b.left, y + b.top, full, promille);
                }
            },
            WidgetData::PBar { x, y, width, promille, begin_label, end_label } => {
                if *x > 0 && *y > 0 && *width > 0 {
                    self.drivers
                        .pbar(x + b.left, y + top, *width, *promille, begin_label.as_deref(), end_label.as_deref());
                }
            },
            WidgetData::Icon { x, y, icon: Some(icon) } => self.drivers.icon(*x, *y, *icon),
            WidgetData::Title { x, y, text: Some(text) } => self.title(*x, *y + b.top, text, b),
            WidgetData::Scroller { left, top, right, bottom, direction: Some(direction), speed, text: Some(text) } => {
                if right >= left {
                    self.scroller((*left, *top, *right, *bottom), *direction, *speed, text);
                }
            },
            WidgetData::Frame { left, top, right, bottom, height, direction, speed, screen, .. } => {
                let inner = Bounds {
                    left: b.left + left - 1,
                    top: b.top + top - 1,
                    right: (b.left + right).min(b.right),
                    bottom: (b.top + bottom).min(b.bottom),
                };
                if inner.left < b.right && inner.top < b.bottom {
                    self.frame(screen.widgets(), inner, *height, *direction, *speed);
                }
            },
            WidgetData::Num { x, digit } => {
                if *x > 0 && (0..=10).contains(digit) {
                    self.drivers.num(x + b.left, *digit);
                }
            },
            WidgetData::String { .. }
            | WidgetData::Icon { .. }
            | WidgetData::Title { .. }
            | WidgetData::Scroller { .. } => {},
        }
    }

    /// Bars shorter than the room left are drawn in whole cells with the
    /// last one partly filled; longer ones span to the display edge.
    fn hbar(&mut self, x: i32, y: i32, length: i32, b: Bounds, top: i32) {
        let cell = self.props.cell_width.max(1);
        let (len, promille) = if length / cell < b.right - b.left - x + 1 {
            let len = (length + cell - 1) / cell;
            let promille = i64::from(length) * 1000 / (i64::from(cell) * i64::from(len));
            (len, i32::try_from(promille).unwrap_or(1000))
        } else {
            (self.props.width - x - b.left + 1, 1000)
        };
        self.drivers.hbar(x + b.left, y + top, len, promille);
    }

    /// `##` then the text then `#` up to the right edge. Titles too wide for
    /// the room bounce left and right.
    fn title(&mut self, x: i32, y: i32, text: &str, b: Bounds) {
        let visible = b.right - b.left;
        if visible < 8 {
            return;
        }
        let width = i64::from(visible - 6);
        let chars: Vec<char> = text.chars().collect();
        let length = i64::try_from(chars.len()).unwrap_or(i64::MAX);
        let delay = self.title_delay;

        self.drivers.icon(x + b.left, y, Icon::BlockFilled);
        self.drivers.icon(x + b.left + 1, y, Icon::BlockFilled);

        let (shown, trail) = if length <= width || delay == 0 {
            let shown = window(&chars, 0, width);
            let trail = i32::try_from(length.min(width)).unwrap_or(visible) + 4;
            (shown, trail)
        } else {
            let overflow = length - width;
            let ratio = length / overflow;
            let mut offset = self.timer;
            if delay < ratio {
                offset /= delay;
            }
            let reverse = (offset / length) % 2 == 1;
            offset %= length;
            if delay >= ratio {
                offset /= delay;
            }
            offset = offset.min(overflow);
            if reverse {
                offset = overflow - offset;
            }
            (window(&chars, offset, width), visible - 2)
        };

        self.drivers.string(x + 3 + b.left, y, &shown);
        for t in trail..visible {
            self.drivers.icon(x + t + b.left, y, Icon::BlockFilled);
        }
    }

    fn scroller(&mut self, (left, top, right, bottom): (i32, i32, i32, i32), direction: ScrollDirection, speed: i32, text: &str) {
        let width = i64::from(right - left + 1);
        let chars: Vec<char> = text.chars().collect();
        let length = i64::try_from(chars.len()).unwrap_or(i64::MAX);
        let speed = i64::from(speed);
        let timer = self.timer;

        match direction {
            ScrollDirection::Marquee => {
                if length <= width {
                    self.drivers.string(left, top, text);
                    return;
                }
                let gap = width / 2;
                let cycle = length + gap;
                let offset = match speed {
                    0 => 0,
                    s if s > 0 => (timer % (cycle * s)) / s,
                    s => (timer % (cycle / -s).max(1)) * -s,
                };
                let pattern: Vec<char> = std::iter::repeat_n(' ', usize::try_from(gap).unwrap_or(0))
                    .chain(chars.iter().copied())
                    .collect();
                let shown: String = pattern
                    .iter()
                    .cycle()
                    .skip(usize::try_from(offset).unwrap_or(0))
                    .take(usize::try_from(width).unwrap_or(0))
                    .collect();
                self.drivers.string(left, top, &shown);
            },
            ScrollDirection::Horizontal => {
                if length + 1 <= width {
                    self.drivers.string(left, top, text);
                    return;
                }
                let offset = bounce(timer, length + 1 - width, speed);
                self.drivers.string(left, top, &window(&chars, offset, width));
            },
            ScrollDirection::Vertical => {
                if length <= width {
                    self.drivers.string(left, top, text);
                    return;
                }
                let lines = (length + width - 1) / width;
                let available = i64::from(bottom - top + 1);
                let begin = if lines <= available { 0 } else { bounce(timer, lines - available + 1, speed) };
                for (row, line) in (top..).zip(begin..begin + available.min(lines)) {
                    self.drivers.string(left, row, &window(&chars, line * width, width));
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::{
        client::ClientId,
        driver::Driver,
        framebuffer::FrameBuffer,
        screen::{Cursor, ScreenDefaults},
        widget::WidgetKind,
    };

    #[derive(Debug)]
    struct Panel {
        fb: FrameBuffer,
        backlight: Option<bool>,
        output: Option<i32>,
    }

    struct Lcd(Arc<Mutex<Panel>>);

    impl Driver for Lcd {
        fn name(&self) -> &str {
            "lcd"
        }

        fn size(&self) -> Option<(i32, i32)> {
            let panel = self.0.lock().unwrap();
            Some((panel.fb.width(), panel.fb.height()))
        }

        fn clear(&mut self) {
            self.0.lock().unwrap().fb.clear();
        }

        fn string(&mut self, x: i32, y: i32, text: &str) {
            self.0.lock().unwrap().fb.put_str(x, y, text);
        }

        fn chr(&mut self, x: i32, y: i32, c: char) {
            self.0.lock().unwrap().fb.put_char(x, y, c);
        }

        fn backlight(&mut self, on: bool) {
            self.0.lock().unwrap().backlight = Some(on);
        }

        fn output(&mut self, state: i32) {
            self.0.lock().unwrap().output = Some(state);
        }
    }

    struct Rig {
        panel: Arc<Mutex<Panel>>,
        drivers: DriverSet,
        renderer: Renderer,
        screen: Screen,
    }

    impl Rig {
        fn new(width: i32, height: i32) -> Self {
            let panel =
                Arc::new(Mutex::new(Panel { fb: FrameBuffer::new(width, height), backlight: None, output: None }));
            let mut drivers = DriverSet::new();
            drivers.add(Box::new(Lcd(Arc::clone(&panel))));
            let defaults = ScreenDefaults { width, height, ..ScreenDefaults::default() };
            let mut screen = Screen::new("s", Some(ClientId(1)), &defaults);
            screen.heartbeat = Switch::Off;
            Self { panel, drivers, renderer: Renderer::default(), screen }
        }

        fn add(&mut self, id: &str, data: WidgetData) {
            self.screen.add_widget(Widget { id: id.into(), data }).unwrap();
        }

        fn render(&mut self, timer: u64) -> Vec<String> {
            self.renderer.render_screen(&self.screen, None, &mut self.drivers, timer);
            self.panel.lock().unwrap().fb.rows()
        }

        fn lit(&self) -> Option<bool> {
            self.panel.lock().unwrap().backlight
        }
    }

    #[test]
    fn strings_clip_to_display() {
        let mut rig = Rig::new(8, 2);
        rig.add("a", WidgetData::String { x: 1, y: 1, text: Some("hi".into()) });
        rig.add("b", WidgetData::String { x: 30, y: 2, text: Some("far".into()) });
        rig.add("c", WidgetData::String { x: 1, y: 3, text: Some("below".into()) });
        rig.add("d", WidgetData::String { x: 1, y: 2, text: None });
        assert_eq!(rig.render(0), ["hi      ", "       f"]);
        assert_eq!(rig.panel.lock().unwrap().output, Some(0));
    }

    #[test]
    fn backlight_precedence() {
        let mut rig = Rig::new(8, 2);
        let mut client = Client::new(ClientId(1));

        let lit = |rig: &Rig, client: &Client, timer| rig.renderer.backlight_lit(&rig.screen, Some(client), timer);
        assert!(lit(&rig, &client, 0));

        rig.screen.backlight = Backlight::OFF;
        assert!(!lit(&rig, &client, 0));

        client.backlight = Backlight::ON;
        assert!(lit(&rig, &client, 0));

        rig.renderer.backlight = Backlight { flash: true, ..Backlight::ON };
        assert!(lit(&rig, &client, 6));
        assert!(!lit(&rig, &client, 7));

        rig.renderer.backlight = Backlight { blink: true, ..Backlight::OFF };
        assert!(!lit(&rig, &client, 13));
        assert!(lit(&rig, &client, 14));
        assert!(lit(&rig, &client, 15));

        rig.renderer.backlight = Backlight::OPEN;
        rig.screen.backlight = Backlight::OPEN;
        rig.render(0);
        assert_eq!(rig.lit(), Some(true));
    }

    #[test]
    fn heartbeat_precedence() {
        let mut rig = Rig::new(4, 2);
        assert_eq!(rig.render(1)[0], "    ");

        rig.screen.heartbeat = Switch::Open;
        assert_eq!(rig.render(1)[0], "   #");

        let mut client = Client::new(ClientId(1));
        client.heartbeat = Switch::Off;
        assert!(!rig.renderer.heartbeat_on(&rig.screen, Some(&client)));

        rig.renderer.heartbeat = Switch::On;
        assert!(rig.renderer.heartbeat_on(&rig.screen, Some(&client)));
    }

    #[test]
    fn bars_scale_to_cells() {
        let mut rig = Rig::new(20, 4);
        rig.add("short", WidgetData::HBar { x: 1, y: 1, length: 12 });
        rig.add("long", WidgetData::HBar { x: 3, y: 2, length: 500 });
        rig.add("v", WidgetData::VBar { x: 20, y: 4, length: 8 });
        let rows = rig.render(0);
        assert_eq!(rows[0], "---                 ");
        assert_eq!(rows[1], "  ------------------");
        assert_eq!(rows[2], "                   |");
        assert_eq!(rows[3], "                   |");
    }

    #[test]
    fn short_title_is_padded_with_blocks() {
        let mut rig = Rig::new(20, 2);
        rig.add("t", WidgetData::Title { x: 1, y: 1, text: Some("Hello".into()) });
        assert_eq!(rig.render(0)[0], "## Hello ###########");
    }

    #[test]
    fn long_title_bounces() {
        let mut rig = Rig::new(20, 2);
        rig.add("t", WidgetData::Title { x: 1, y: 1, text: Some("ABCDEFGHIJKLMNOPQRSTU".into()) });
        assert_eq!(rig.render(3)[0], "## DEFGHIJKLMNOPQ ##");
        assert_eq!(rig.render(10)[0], "## HIJKLMNOPQRSTU ##");
        assert_eq!(rig.render(25)[0], "## DEFGHIJKLMNOPQ ##");

        rig.renderer.titlespeed = 0;
        assert_eq!(rig.render(10)[0], "## ABCDEFGHIJKLMN ##");
    }

    fn scroller(direction: ScrollDirection, bottom: i32, text: &str) -> WidgetData {
        WidgetData::Scroller {
            left: 1,
            top: 1,
            right: 5,
            bottom,
            direction: Some(direction),
            speed: 1,
            text: Some(text.into()),
        }
    }

    #[test]
    fn marquee_wraps_with_gap() {
        let mut rig = Rig::new(5, 1);
        rig.add("m", scroller(ScrollDirection::Marquee, 1, "abcdefgh"));
        assert_eq!(rig.render(0), ["  abc"]);
        assert_eq!(rig.render(3), ["bcdef"]);
        assert_eq!(rig.render(9), ["h  ab"]);
    }

    #[test]
    fn horizontal_scroller_bounces() {
        let mut rig = Rig::new(5, 1);
        rig.add("h", scroller(ScrollDirection::Horizontal, 1, "abcdefg"));
        let frames: Vec<String> = (0..6).map(|t| rig.render(t).remove(0)).collect();
        assert_eq!(frames, ["abcde", "bcdef", "cdefg", "cdefg", "bcdef", "abcde"]);
    }

    #[test]
    fn vertical_scroller_pages_lines() {
        let mut rig = Rig::new(5, 2);
        rig.add("v", scroller(ScrollDirection::Vertical, 2, "aaaaabbbbbcccccddddd"));
        assert_eq!(rig.render(0), ["aaaaa", "bbbbb"]);
        assert_eq!(rig.render(2), ["ccccc", "ddddd"]);
        assert_eq!(rig.render(4), ["bbbbb", "ccccc"]);
    }

    #[test]
    fn frames_scroll_vertically() {
        let mut rig = Rig::new(10, 2);
        let mut frame = Widget::new("f", WidgetKind::Frame, Some(ClientId(1)));
        if let WidgetData::Frame { right, bottom, height, direction, screen, .. } = &mut frame.data {
            *right = 10;
            *bottom = 2;
            *height = 4;
            *direction = Some(ScrollDirection::Vertical);
            for (y, text) in (1..).zip(["one", "two", "three", "four"]) {
                screen.add_widget(Widget::string(text, 1, y, text)).unwrap();
            }
        }
        rig.screen.add_widget(frame).unwrap();
        assert_eq!(rig.render(0), ["one       ", "two       "]);
        assert_eq!(rig.render(1), ["two       ", "three     "]);
        assert_eq!(rig.render(2), ["three     ", "four      "]);
        assert_eq!(rig.render(3), ["one       ", "two       "]);
    }

    #[test]
    fn big_numbers_and_cursor() {
        let mut rig = Rig::new(8, 4);
        rig.add("n", WidgetData::Num { x: 1, digit: 7 });
        rig.add("bad", WidgetData::Num { x: 4, digit: 11 });
        rig.screen.cursor = Cursor::Under;
        rig.screen.cursor_x = 5;
        rig.screen.cursor_y = 2;
        let rows = rig.render(2);
        assert_eq!(rows[0], " _      ");
        assert_eq!(rows[1], "  | _   ");
    }

    #[test]
    fn server_message_counts_down() {
        let mut rig = Rig::new(10, 2);
        assert!(!rig.renderer.show_message("sixteen chars!!!", 3));
        assert!(!rig.renderer.show_message("Hold", 0));
        assert!(rig.renderer.show_message("Hold", 2));
        assert_eq!(rig.render(0)[1], "    | Hold");
        assert_eq!(rig.render(1)[1], "    | Hold");
        assert_eq!(rig.renderer.message(), None);
        assert_eq!(rig.render(2)[1], "          ");
    }
}
