//! Named icons.
//!
//! Drivers may draw icons with custom characters. Drivers that cannot fall
//! back to one or two plain ASCII characters per icon.

use std::fmt;

/// A symbolic icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Icon {
    /// Solid block
    BlockFilled,
    /// Outline heart (heartbeat off phase)
    HeartOpen,
    /// Filled heart (heartbeat on phase)
    HeartFilled,
    /// Arrow up
    ArrowUp,
    /// Arrow down
    ArrowDown,
    /// Arrow left
    ArrowLeft,
    /// Arrow right
    ArrowRight,
    /// Unchecked checkbox
    CheckboxOff,
    /// Checked checkbox
    CheckboxOn,
    /// Grayed checkbox
    CheckboxGray,
    /// Menu selector pointing right, drawn left of an entry
    SelectorAtLeft,
    /// Menu selector pointing left, drawn right of an entry
    SelectorAtRight,
    /// Ellipsis
    Ellipsis,
    /// Media stop
    Stop,
    /// Media pause
    Pause,
    /// Media play
    Play,
    /// Media play reverse
    PlayReverse,
    /// Media fast forward
    FastForward,
    /// Media fast rewind
    FastRewind,
    /// Media next track
    Next,
    /// Media previous track
    Prev,
    /// Media record
    Record,
}

impl Icon {
    /// Every icon, in protocol order.
    pub const ALL: [Icon; 22] = [
        Icon::BlockFilled,
        Icon::HeartOpen,
        Icon::HeartFilled,
        Icon::ArrowUp,
        Icon::ArrowDown,
        Icon::ArrowLeft,
        Icon::ArrowRight,
        Icon::CheckboxOff,
        Icon::CheckboxOn,
        Icon::CheckboxGray,
        Icon::SelectorAtLeft,
        Icon::SelectorAtRight,
        Icon::Ellipsis,
        Icon::Stop,
        Icon::Pause,
        Icon::Play,
        Icon::PlayReverse,
        Icon::FastForward,
        Icon::FastRewind,
        Icon::Next,
        Icon::Prev,
        Icon::Record,
    ];

    /// Protocol name, as used by `widget_set <s> <w> x y NAME`.
    pub fn name(self) -> &'static str {
        match self {
            Icon::BlockFilled => "BLOCK_FILLED",
            Icon::HeartOpen => "HEART_OPEN",
            Icon::HeartFilled => "HEART_FILLED",
            Icon::ArrowUp => "ARROW_UP",
            Icon::ArrowDown => "ARROW_DOWN",
            Icon::ArrowLeft => "ARROW_LEFT",
            Icon::ArrowRight => "ARROW_RIGHT",
            Icon::CheckboxOff => "CHECKBOX_OFF",
            Icon::CheckboxOn => "CHECKBOX_ON",
            Icon::CheckboxGray => "CHECKBOX_GRAY",
            Icon::SelectorAtLeft => "SELECTOR_AT_LEFT",
            Icon::SelectorAtRight => "SELECTOR_AT_RIGHT",
            Icon::Ellipsis => "ELLIPSIS",
            Icon::Stop => "STOP",
            Icon::Pause => "PAUSE",
            Icon::Play => "PLAY",
            Icon::PlayReverse => "PLAYR",
            Icon::FastForward => "FF",
            Icon::FastRewind => "FR",
            Icon::Next => "NEXT",
            Icon::Prev => "PREV",
            Icon::Record => "REC",
        }
    }

    /// Look up an icon by protocol name, ignoring ASCII case.
    pub fn from_name(name: &str) -> Option<Icon> {
        Self::ALL.into_iter().find(|icon| icon.name().eq_ignore_ascii_case(name))
    }

    /// Plain ASCII rendering for drivers without custom characters.
    ///
    /// Media icons take two cells, everything else one.
    pub fn fallback(self) -> &'static str {
        match self {
            Icon::BlockFilled | Icon::HeartFilled => "#",
            Icon::HeartOpen => "-",
            Icon::ArrowUp => "^",
            Icon::ArrowDown => "v",
            Icon::ArrowLeft | Icon::SelectorAtRight => "<",
            Icon::ArrowRight | Icon::SelectorAtLeft => ">",
            Icon::CheckboxOff => "N",
            Icon::CheckboxOn => "Y",
            Icon::CheckboxGray => "o",
            Icon::Ellipsis => "_",
            Icon::Stop => "[]",
            Icon::Pause => "||",
            Icon::Play => "> ",
            Icon::PlayReverse => "< ",
            Icon::FastForward => ">>",
            Icon::FastRewind => "<<",
            Icon::Next => ">|",
            Icon::Prev => "|<",
            Icon::Record => "()",
        }
    }
}

impl fmt::Display for Icon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_case_insensitive() {
        assert_eq!(Icon::from_name("heart_filled"), Some(Icon::HeartFilled));
        assert_eq!(Icon::from_name("PlayR"), Some(Icon::PlayReverse));
        assert_eq!(Icon::from_name("HEART"), None);
    }

    #[test]
    fn every_name_resolves_to_itself() {
        for icon in Icon::ALL {
            assert_eq!(Icon::from_name(icon.name()), Some(icon));
        }
    }

    #[test]
    fn fallbacks_are_one_or_two_cells() {
        for icon in Icon::ALL {
            let len = icon.fallback().len();
            assert!(len == 1 || len == 2, "{icon} has fallback of {len} cells");
        }
    }
}
