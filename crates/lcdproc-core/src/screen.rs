//! Screens and their display attributes.
//!
//! A [`Screen`] is an ordered set of widgets plus the attributes the
//! scheduler and renderer need: priority, rotation duration, timeout and the
//! backlight/heartbeat/cursor overrides. Frame widgets own nested screens, so
//! widget lookups here recurse through frames.

use std::fmt;

use crate::{client::ClientId, widget::Widget};

/// Scheduling class of a screen, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    /// Never shown
    Hidden,
    /// Shown only when nothing else is available
    Background,
    /// Normal client screens
    Info,
    /// Screens with fresh information
    Foreground,
    /// Urgent screens; preempt everything but input
    Alert,
    /// Screens waiting for user input (the menu)
    Input,
}

impl Priority {
    /// Look up a priority class by name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "hidden" => Some(Self::Hidden),
            "background" => Some(Self::Background),
            "info" => Some(Self::Info),
            "foreground" => Some(Self::Foreground),
            "alert" => Some(Self::Alert),
            "input" => Some(Self::Input),
            _ => None,
        }
    }

    /// Parse a `-priority` argument: a class name, or a legacy positive
    /// number where smaller means more important.
    pub fn from_arg(arg: &str) -> Option<Self> {
        if let Some(priority) = Self::from_name(arg) {
            return Some(priority);
        }
        match arg.trim().parse::<i64>() {
            Ok(n) if n <= 0 => None,
            Ok(n) if n <= 64 => Some(Self::Foreground),
            Ok(n) if n < 192 => Some(Self::Info),
            Ok(_) => Some(Self::Background),
            Err(_) => None,
        }
    }

    /// Class name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Hidden => "hidden",
            Self::Background => "background",
            Self::Info => "info",
            Self::Foreground => "foreground",
            Self::Alert => "alert",
            Self::Input => "input",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Three-way override used for heartbeat and backlight.
///
/// `Open` defers the decision to the next authority in line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Switch {
    /// Forced off
    Off,
    /// Forced on
    On,
    /// No opinion
    #[default]
    Open,
}

impl Switch {
    /// Parse `on`, `off` or `open`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "on" => Some(Self::On),
            "off" => Some(Self::Off),
            "open" => Some(Self::Open),
            _ => None,
        }
    }
}

/// Backlight override: a base state plus optional blink and flash modes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Backlight {
    /// Base state
    pub state: Switch,
    /// Slow toggling on top of the base state
    pub blink: bool,
    /// Fast toggling on top of the base state
    pub flash: bool,
}

impl Backlight {
    /// Plain on.
    pub const ON: Self = Self { state: Switch::On, blink: false, flash: false };
    /// Plain off.
    pub const OFF: Self = Self { state: Switch::Off, blink: false, flash: false };
    /// No opinion.
    pub const OPEN: Self = Self { state: Switch::Open, blink: false, flash: false };

    /// True when this value defers to the next authority.
    ///
    /// A blinking or flashing value always has an opinion.
    pub fn is_open(self) -> bool {
        self == Self::OPEN
    }

    /// Whether the base state lights the display.
    pub fn is_on(self) -> bool {
        self.state == Switch::On
    }

    /// Apply a client request: `on off toggle blink flash`, and `open` when
    /// `allow_open` is set. Returns false for an unknown mode, leaving the
    /// value untouched.
    pub fn apply(&mut self, mode: &str, allow_open: bool) -> bool {
        match mode {
            "on" => *self = Self::ON,
            "off" => *self = Self::OFF,
            "open" if allow_open => *self = Self::OPEN,
            "toggle" => {
                if *self == Self::ON {
                    *self = Self::OFF;
                } else if *self == Self::OFF {
                    *self = Self::ON;
                }
            },
            "blink" => self.blink = true,
            "flash" => self.flash = true,
            _ => return false,
        }
        true
    }
}

/// Cursor shape requested by a screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Cursor {
    /// No cursor
    #[default]
    Off,
    /// Driver default cursor
    On,
    /// Underline
    Under,
    /// Blinking block
    Block,
}

impl Cursor {
    /// Parse `off on under block`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "off" => Some(Self::Off),
            "on" => Some(Self::On),
            "under" => Some(Self::Under),
            "block" => Some(Self::Block),
            _ => None,
        }
    }
}

/// Values every new screen starts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenDefaults {
    /// Display width in characters
    pub width: i32,
    /// Display height in characters
    pub height: i32,
    /// Rotation duration in render ticks
    pub duration: i32,
}

impl Default for ScreenDefaults {
    fn default() -> Self {
        Self { width: 20, height: 4, duration: 32 }
    }
}

/// A client or server screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screen {
    /// Identifier, unique per owner
    pub id: String,
    /// Display name
    pub name: Option<String>,
    /// Owning client; `None` for server screens
    pub owner: Option<ClientId>,
    /// Virtual width
    pub width: i32,
    /// Virtual height
    pub height: i32,
    /// Scheduling class
    pub priority: Priority,
    /// Ticks shown before rotating away
    pub duration: i32,
    /// Ticks left while current before the screen is destroyed; -1 never
    pub timeout: i32,
    /// Backlight override
    pub backlight: Backlight,
    /// Heartbeat override
    pub heartbeat: Switch,
    /// Cursor shape
    pub cursor: Cursor,
    /// Cursor column
    pub cursor_x: i32,
    /// Cursor row
    pub cursor_y: i32,
    widgets: Vec<Widget>,
}

impl Screen {
    /// Create an empty screen with default attributes.
    pub fn new(id: impl Into<String>, owner: Option<ClientId>, defaults: &ScreenDefaults) -> Self {
        Self {
            id: id.into(),
            name: None,
            owner,
            width: defaults.width,
            height: defaults.height,
            priority: Priority::Info,
            duration: defaults.duration,
            timeout: -1,
            backlight: Backlight::OPEN,
            heartbeat: Switch::Open,
            cursor: Cursor::Off,
            cursor_x: 1,
            cursor_y: 1,
            widgets: Vec::new(),
        }
    }

    /// Widgets in drawing order.
    pub fn widgets(&self) -> &[Widget] {
        &self.widgets
    }

    /// Append a widget. Fails with the widget handed back when the id is
    /// already used anywhere in this screen or its frames.
    pub fn add_widget(&mut self, widget: Widget) -> Result<(), Widget> {
        if self.find_widget(&widget.id).is_some() {
            return Err(widget);
        }
        self.widgets.push(widget);
        Ok(())
    }

    /// Find a widget by id, searching frames depth-first.
    pub fn find_widget(&self, id: &str) -> Option<&Widget> {
        for widget in &self.widgets {
            if widget.id == id {
                return Some(widget);
            }
            if let Some(found) = widget.frame_screen().and_then(|s| s.find_widget(id)) {
                return Some(found);
            }
        }
        None
    }

    /// Find a widget by id for modification, searching frames depth-first.
    pub fn find_widget_mut(&mut self, id: &str) -> Option<&mut Widget> {
        let index = self.widgets.iter().position(|w| w.id == id);
        if let Some(index) = index {
            return self.widgets.get_mut(index);
        }
        self.widgets
            .iter_mut()
            .filter_map(Widget::frame_screen_mut)
            .find_map(|screen| screen.find_widget_mut(id))
    }

    /// Remove a widget by id wherever it lives in the frame tree.
    pub fn remove_widget(&mut self, id: &str) -> Option<Widget> {
        if let Some(index) = self.widgets.iter().position(|w| w.id == id) {
            return Some(self.widgets.remove(index));
        }
        self.widgets
            .iter_mut()
            .filter_map(Widget::frame_screen_mut)
            .find_map(|screen| screen.remove_widget(id))
    }

    /// Drop every widget.
    pub fn clear_widgets(&mut self) {
        self.widgets.clear();
    }

    /// Number of top-level widgets.
    pub fn widget_count(&self) -> usize {
        self.widgets.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::{WidgetData, WidgetKind};

    fn screen() -> Screen {
        Screen::new("s", None, &ScreenDefaults::default())
    }

    #[test]
    fn numeric_priorities_map_to_classes() {
        assert_eq!(Priority::from_arg("1"), Some(Priority::Foreground));
        assert_eq!(Priority::from_arg("64"), Some(Priority::Foreground));
        assert_eq!(Priority::from_arg("65"), Some(Priority::Info));
        assert_eq!(Priority::from_arg("192"), Some(Priority::Background));
        assert_eq!(Priority::from_arg("0"), None);
        assert_eq!(Priority::from_arg("alert"), Some(Priority::Alert));
        assert_eq!(Priority::from_arg("loud"), None);
    }

    #[test]
    fn toggle_only_flips_plain_states() {
        let mut backlight = Backlight::ON;
        assert!(backlight.apply("toggle", false));
        assert_eq!(backlight, Backlight::OFF);

        backlight.apply("blink", false);
        backlight.apply("toggle", false);
        assert_eq!(backlight, Backlight { state: Switch::Off, blink: true, flash: false });

        let mut open = Backlight::OPEN;
        open.apply("toggle", false);
        assert!(open.is_open());
    }

    #[test]
    fn open_only_where_allowed() {
        let mut backlight = Backlight::ON;
        assert!(!backlight.apply("open", false));
        assert!(backlight.apply("open", true));
        assert!(backlight.is_open());
        assert!(!backlight.apply("dim", true));
    }

    #[test]
    fn widget_ids_are_unique_across_frames() {
        let mut s = screen();
        let mut frame = Widget::new("f", WidgetKind::Frame, None);
        frame
            .frame_screen_mut()
            .unwrap()
            .add_widget(Widget::new("inner", WidgetKind::String, None))
            .unwrap();
        s.add_widget(frame).unwrap();

        assert!(s.add_widget(Widget::new("inner", WidgetKind::Num, None)).is_err());
        assert!(s.find_widget("inner").is_some());

        if let Some(w) = s.find_widget_mut("inner") {
            w.data = WidgetData::String { x: 2, y: 2, text: Some("x".into()) };
        }
        let removed = s.remove_widget("inner").unwrap();
        assert_eq!(removed.data, WidgetData::String { x: 2, y: 2, text: Some("x".into()) });
        assert!(s.find_widget("inner").is_none());
        assert_eq!(s.widget_count(), 1);
    }
}
