//! Widgets: the drawable elements of a screen.
//!
//! Coordinates are 1-based character cells and signed, because clients may
//! legally place widgets partly or entirely off screen.

use std::fmt;

use crate::{
    client::ClientId,
    icon::Icon,
    screen::{Screen, ScreenDefaults},
};

/// Widget type as named on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WidgetKind {
    /// Plain text at a position
    String,
    /// Horizontal bar
    HBar,
    /// Vertical bar
    VBar,
    /// Percentage bar with optional labels
    PBar,
    /// Single icon
    Icon,
    /// Title bar, scrolls when the text does not fit
    Title,
    /// Scrolling text in a rectangle
    Scroller,
    /// Nested screen in a rectangle
    Frame,
    /// Big digit spanning the display height
    Num,
}

impl WidgetKind {
    /// Look up a kind by its wire name. `none` is not a creatable kind.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "string" => Some(Self::String),
            "hbar" => Some(Self::HBar),
            "vbar" => Some(Self::VBar),
            "pbar" => Some(Self::PBar),
            "icon" => Some(Self::Icon),
            "title" => Some(Self::Title),
            "scroller" => Some(Self::Scroller),
            "frame" => Some(Self::Frame),
            "num" => Some(Self::Num),
            _ => None,
        }
    }

    /// Wire name.
    pub fn name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::HBar => "hbar",
            Self::VBar => "vbar",
            Self::PBar => "pbar",
            Self::Icon => "icon",
            Self::Title => "title",
            Self::Scroller => "scroller",
            Self::Frame => "frame",
            Self::Num => "num",
        }
    }
}

impl fmt::Display for WidgetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Scrolling mode of scrollers and frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScrollDirection {
    /// Continuous marquee with a gap between end and start (`m`)
    Marquee,
    /// Horizontal back-and-forth (`h`)
    Horizontal,
    /// Vertical, line by line (`v`)
    Vertical,
}

impl ScrollDirection {
    /// Parse the single-letter wire form.
    pub fn from_arg(arg: &str) -> Option<Self> {
        match arg.as_bytes().first() {
            Some(b'm') => Some(Self::Marquee),
            Some(b'h') => Some(Self::Horizontal),
            Some(b'v') => Some(Self::Vertical),
            _ => None,
        }
    }
}

/// Type-specific widget state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetData {
    /// Text at (x, y)
    String {
        /// Column
        x: i32,
        /// Row
        y: i32,
        /// Text, unset until `widget_set`
        text: Option<String>,
    },
    /// Horizontal bar growing right from (x, y)
    HBar {
        /// Column
        x: i32,
        /// Row
        y: i32,
        /// Length in pixels
        length: i32,
    },
    /// Vertical bar growing up from (x, y)
    VBar {
        /// Column
        x: i32,
        /// Row
        y: i32,
        /// Length in pixels
        length: i32,
    },
    /// Percentage bar
    PBar {
        /// Column
        x: i32,
        /// Row
        y: i32,
        /// Total width in cells, labels included
        width: i32,
        /// Fill level, 0 to 1000
        promille: i32,
        /// Text in front of the bar
        begin_label: Option<String>,
        /// Text behind the bar
        end_label: Option<String>,
    },
    /// Icon at (x, y)
    Icon {
        /// Column
        x: i32,
        /// Row
        y: i32,
        /// Icon, unset until `widget_set`
        icon: Option<Icon>,
    },
    /// Title bar
    Title {
        /// Column
        x: i32,
        /// Row
        y: i32,
        /// Title text
        text: Option<String>,
    },
    /// Scrolling text
    Scroller {
        /// Left column
        left: i32,
        /// Top row
        top: i32,
        /// Right column
        right: i32,
        /// Bottom row
        bottom: i32,
        /// Scroll mode; nothing is drawn until one is set
        direction: Option<ScrollDirection>,
        /// Ticks per step when positive, steps per tick when negative
        speed: i32,
        /// Text
        text: Option<String>,
    },
    /// Nested screen
    Frame {
        /// Left column
        left: i32,
        /// Top row
        top: i32,
        /// Right column
        right: i32,
        /// Bottom row
        bottom: i32,
        /// Virtual width of the nested screen
        width: i32,
        /// Virtual height of the nested screen
        height: i32,
        /// Scroll mode; only vertical scrolling moves content
        direction: Option<ScrollDirection>,
        /// Ticks per line when positive, lines per tick when negative
        speed: i32,
        /// Widgets inside the frame
        screen: Box<Screen>,
    },
    /// Big number
    Num {
        /// Column
        x: i32,
        /// Digit 0..=9, or 10 for a colon
        digit: i32,
    },
}

/// A named widget on a screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Widget {
    /// Identifier, unique within the owning screen
    pub id: String,
    /// Type-specific state
    pub data: WidgetData,
}

impl Widget {
    /// Create a widget with the protocol defaults (positions at 1, unset
    /// texts). A frame gets an empty nested screen `frame_<id>` with the same
    /// owner.
    pub fn new(id: impl Into<String>, kind: WidgetKind, owner: Option<ClientId>) -> Self {
        let id = id.into();
        let data = match kind {
            WidgetKind::String => WidgetData::String { x: 1, y: 1, text: None },
            WidgetKind::HBar => WidgetData::HBar { x: 1, y: 1, length: 1 },
            WidgetKind::VBar => WidgetData::VBar { x: 1, y: 1, length: 1 },
            WidgetKind::PBar => WidgetData::PBar {
                x: 1,
                y: 1,
                width: 0,
                promille: 0,
                begin_label: None,
                end_label: None,
            },
            WidgetKind::Icon => WidgetData::Icon { x: 1, y: 1, icon: None },
            WidgetKind::Title => WidgetData::Title { x: 1, y: 1, text: None },
            WidgetKind::Scroller => WidgetData::Scroller {
                left: 1,
                top: 1,
                right: 0,
                bottom: 0,
                direction: None,
                speed: 1,
                text: None,
            },
            WidgetKind::Frame => WidgetData::Frame {
                left: 1,
                top: 1,
                right: 0,
                bottom: 0,
                width: 0,
                height: 0,
                direction: None,
                speed: 1,
                screen: Box::new(Screen::new(
                    format!("frame_{id}"),
                    owner,
                    &ScreenDefaults::default(),
                )),
            },
            WidgetKind::Num => WidgetData::Num { x: 1, digit: 1 },
        };
        Self { id, data }
    }

    /// Plain text widget, used by server-built screens.
    pub fn string(id: impl Into<String>, x: i32, y: i32, text: impl Into<String>) -> Self {
        Self { id: id.into(), data: WidgetData::String { x, y, text: Some(text.into()) } }
    }

    /// Icon widget, used by server-built screens.
    pub fn icon(id: impl Into<String>, x: i32, y: i32, icon: Icon) -> Self {
        Self { id: id.into(), data: WidgetData::Icon { x, y, icon: Some(icon) } }
    }

    /// Type of this widget.
    pub fn kind(&self) -> WidgetKind {
        match self.data {
            WidgetData::String { .. } => WidgetKind::String,
            WidgetData::HBar { .. } => WidgetKind::HBar,
            WidgetData::VBar { .. } => WidgetKind::VBar,
            WidgetData::PBar { .. } => WidgetKind::PBar,
            WidgetData::Icon { .. } => WidgetKind::Icon,
            WidgetData::Title { .. } => WidgetKind::Title,
            WidgetData::Scroller { .. } => WidgetKind::Scroller,
            WidgetData::Frame { .. } => WidgetKind::Frame,
            WidgetData::Num { .. } => WidgetKind::Num,
        }
    }

    /// Nested screen of a frame.
    pub fn frame_screen(&self) -> Option<&Screen> {
        match &self.data {
            WidgetData::Frame { screen, .. } => Some(screen),
            _ => None,
        }
    }

    /// Nested screen of a frame, mutably.
    pub fn frame_screen_mut(&mut self) -> Option<&mut Screen> {
        match &mut self.data {
            WidgetData::Frame { screen, .. } => Some(screen),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_is_not_a_widget_kind() {
        assert_eq!(WidgetKind::from_name("none"), None);
        assert_eq!(WidgetKind::from_name("scroller"), Some(WidgetKind::Scroller));
    }

    #[test]
    fn frame_owns_named_screen() {
        let frame = Widget::new("f1", WidgetKind::Frame, Some(ClientId(3)));
        let screen = frame.frame_screen().unwrap();
        assert_eq!(screen.id, "frame_f1");
        assert_eq!(screen.owner, Some(ClientId(3)));
    }

    #[test]
    fn defaults_match_protocol() {
        let num = Widget::new("n", WidgetKind::Num, None);
        assert_eq!(num.data, WidgetData::Num { x: 1, digit: 1 });
        let bar = Widget::new("b", WidgetKind::HBar, None);
        assert_eq!(bar.data, WidgetData::HBar { x: 1, y: 1, length: 1 });
    }

    #[test]
    fn direction_uses_first_letter() {
        assert_eq!(ScrollDirection::from_arg("m"), Some(ScrollDirection::Marquee));
        assert_eq!(ScrollDirection::from_arg("vertical"), Some(ScrollDirection::Vertical));
        assert_eq!(ScrollDirection::from_arg("x"), None);
        assert_eq!(ScrollDirection::from_arg(""), None);
    }
}
