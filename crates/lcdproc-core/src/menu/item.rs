//! Menu item data model.
//!
//! A [`MenuItem`] carries the attributes common to every item and an
//! [`ItemKind`] with the per-type state. Menus are items too; their
//! children are [`ItemRef`] handles into the owning
//! [`MenuTree`](super::MenuTree).

use std::{
    fmt,
    net::{Ipv4Addr, Ipv6Addr},
};

use super::edit::EditBuffer;
use crate::client::ClientId;

/// Handle of an item in the menu tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ItemRef(pub u64);

/// Where a predecessor or successor link leads.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NavTarget {
    /// `_quit_`: leave the menu system
    Quit,
    /// `_close_`: close the current item
    Close,
    /// `_none_`: stay where we are
    None,
    /// Jump to the item with this id
    Item(String),
}

impl NavTarget {
    /// Parse a link, recognising the three sentinels.
    pub fn parse(id: &str) -> Self {
        match id {
            "_quit_" => Self::Quit,
            "_close_" => Self::Close,
            "_none_" => Self::None,
            other => Self::Item(other.to_owned()),
        }
    }

    /// Wire form.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Quit => "_quit_",
            Self::Close => "_close_",
            Self::None => "_none_",
            Self::Item(id) => id,
        }
    }
}

impl fmt::Display for NavTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of feeding one token to the active item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MenuResult {
    /// Stay; redraw
    None,
    /// Descend into the selected entry
    Enter,
    /// Go up one level
    Close,
    /// Leave the menu system
    Quit,
    /// Follow the predecessor link
    Predecessor,
    /// Follow the successor link
    Successor,
    /// The token cannot be handled here
    Error,
}

impl MenuResult {
    /// Result of following an optional predecessor link.
    pub fn for_predecessor(link: Option<&NavTarget>, default: Self) -> Self {
        Self::for_link(link, default, Self::Predecessor)
    }

    /// Result of following an optional successor link.
    pub fn for_successor(link: Option<&NavTarget>, default: Self) -> Self {
        Self::for_link(link, default, Self::Successor)
    }

    fn for_link(link: Option<&NavTarget>, default: Self, jump: Self) -> Self {
        match link {
            None => default,
            Some(NavTarget::Quit) => Self::Quit,
            Some(NavTarget::Close) => Self::Close,
            Some(NavTarget::None) => Self::None,
            Some(NavTarget::Item(_)) => jump,
        }
    }
}

/// Logical menu input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MenuToken {
    /// Open the menu, or go back
    Menu,
    /// Select or confirm
    Enter,
    /// Previous entry or value up
    Up,
    /// Next entry or value down
    Down,
    /// Value down or cursor left
    Left,
    /// Value up or cursor right
    Right,
    /// Any other key, handled by editors as direct input
    Other,
}

impl MenuToken {
    /// Bit of this token in a [`KeyMask`].
    pub const fn bit(self) -> u32 {
        match self {
            Self::Menu => 1,
            Self::Enter => 2,
            Self::Up => 4,
            Self::Down => 8,
            Self::Left => 16,
            Self::Right => 32,
            Self::Other => 64,
        }
    }
}

/// Which menu keys are configured. Editors adapt their behaviour to the
/// keys that exist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct KeyMask(pub u32);

impl KeyMask {
    /// Whether the key for `token` is configured.
    pub fn has(self, token: MenuToken) -> bool {
        self.0 & token.bit() != 0
    }

    /// Add a configured key.
    pub fn insert(&mut self, token: MenuToken) {
        self.0 |= token.bit();
    }
}

/// Item type as named on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemType {
    /// Submenu
    Menu,
    /// Plain selectable entry
    Action,
    /// On/off(/gray) toggle
    Checkbox,
    /// Cycling list of strings
    Ring,
    /// Bounded integer with a bar
    Slider,
    /// Integer entered digit by digit
    Numeric,
    /// Text entered character by character
    Alpha,
    /// IPv4 or IPv6 address
    Ip,
}

impl ItemType {
    /// Look up a type by wire name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "menu" => Some(Self::Menu),
            "action" => Some(Self::Action),
            "checkbox" => Some(Self::Checkbox),
            "ring" => Some(Self::Ring),
            "slider" => Some(Self::Slider),
            "numeric" => Some(Self::Numeric),
            "alpha" => Some(Self::Alpha),
            "ip" => Some(Self::Ip),
            _ => None,
        }
    }

    /// Wire name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Menu => "menu",
            Self::Action => "action",
            Self::Checkbox => "checkbox",
            Self::Ring => "ring",
            Self::Slider => "slider",
            Self::Numeric => "numeric",
            Self::Alpha => "alpha",
            Self::Ip => "ip",
        }
    }

    /// Types shown inline in their parent menu instead of on their own
    /// screen.
    pub fn is_inline(self) -> bool {
        matches!(self, Self::Action | Self::Checkbox | Self::Ring)
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// State of a checkbox.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CheckboxValue {
    /// Unchecked
    #[default]
    Off,
    /// Checked
    On,
    /// Neither; only with `allow_gray`
    Gray,
}

impl CheckboxValue {
    /// Parse `off on gray`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "off" => Some(Self::Off),
            "on" => Some(Self::On),
            "gray" => Some(Self::Gray),
            _ => None,
        }
    }

    /// Wire name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::On => "on",
            Self::Gray => "gray",
        }
    }

    /// Following state in the cycle.
    pub fn next(self, allow_gray: bool) -> Self {
        match (self, allow_gray) {
            (Self::Off, _) => Self::On,
            (Self::On, true) => Self::Gray,
            (Self::On | Self::Gray, _) => Self::Off,
        }
    }

    /// Preceding state in the cycle.
    pub fn prev(self, allow_gray: bool) -> Self {
        match (self, allow_gray) {
            (Self::Off, true) => Self::Gray,
            (Self::Off, false) | (Self::Gray, _) => Self::On,
            (Self::On, _) => Self::Off,
        }
    }
}

/// Menu state: children plus selection cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MenuData {
    /// Children in display order, hidden ones included
    pub children: Vec<ItemRef>,
    /// Selected entry, counted over visible children
    pub selector: usize,
    /// First visible entry row
    pub scroll: usize,
    /// Index of the display driver this menu configures, if any
    pub association: Option<usize>,
}

/// Slider state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SliderData {
    /// Label at the low end
    pub mintext: String,
    /// Label at the high end
    pub maxtext: String,
    /// Lowest value
    pub min: i32,
    /// Highest value
    pub max: i32,
    /// Change per key press
    pub step: i32,
    /// Current value
    pub value: i32,
}

/// Numeric entry state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumericData {
    /// Lowest accepted value
    pub min: i32,
    /// Highest accepted value
    pub max: i32,
    /// Committed value
    pub value: i32,
    /// Pending input
    pub edit: EditBuffer,
}

impl NumericData {
    /// Longest text the field may hold: the wider of the formatted bounds.
    pub fn max_len(&self) -> usize {
        self.format(self.min).len().max(self.format(self.max).len())
    }

    /// Whether negative values are possible, which adds a sign position.
    pub fn signed(&self) -> bool {
        self.min < 0
    }

    /// Format a value the way the edit field shows it.
    pub fn format(&self, value: i32) -> String {
        if self.signed() { format!("{value:+}") } else { value.to_string() }
    }
}

/// Text entry state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlphaData {
    /// Character shown instead of the text, for passwords
    pub password_char: Option<char>,
    /// Shortest accepted text
    pub minlength: usize,
    /// Longest text
    pub maxlength: usize,
    /// Offer `A-Z`
    pub allow_caps: bool,
    /// Offer `a-z`
    pub allow_noncaps: bool,
    /// Offer `0-9`
    pub allow_numbers: bool,
    /// Further characters offered
    pub allowed_extra: String,
    /// Committed text
    pub value: String,
    /// Pending input
    pub edit: EditBuffer,
}

impl AlphaData {
    /// Characters the user may cycle through, in order.
    pub fn charset(&self) -> Vec<u8> {
        let mut chars = Vec::with_capacity(62 + self.allowed_extra.len());
        if self.allow_caps {
            chars.extend(b'A'..=b'Z');
        }
        if self.allow_noncaps {
            chars.extend(b'a'..=b'z');
        }
        if self.allow_numbers {
            chars.extend(b'0'..=b'9');
        }
        chars.extend(self.allowed_extra.bytes());
        chars
    }
}

/// Textual layout of an address family.
#[derive(Debug)]
pub struct IpFormat {
    /// Length of the fully padded text
    pub maxlen: usize,
    /// Group separator
    pub sep: char,
    /// Radix of a group
    pub radix: u32,
    /// Digits per group
    pub width: usize,
    /// Largest group value
    pub limit: i64,
    /// Value of each digit position within a group
    pub place_values: &'static [i64],
    /// Address used when a client supplies garbage
    pub fallback: &'static str,
}

/// IPv4: dotted decimal, three digits per group.
pub const IPV4: IpFormat = IpFormat {
    maxlen: 15,
    sep: '.',
    radix: 10,
    width: 3,
    limit: 255,
    place_values: &[100, 10, 1],
    fallback: "0.0.0.0",
};

/// IPv6: colon separated hex, four digits per group.
pub const IPV6: IpFormat = IpFormat {
    maxlen: 39,
    sep: ':',
    radix: 16,
    width: 4,
    limit: 65535,
    place_values: &[4096, 256, 16, 1],
    fallback: "0:0:0:0:0:0:0:0",
};

impl IpFormat {
    /// Strip padding: leading blanks and zeros of every group, keeping at
    /// least one digit.
    pub fn normalize(&self, text: &str) -> String {
        let groups: Vec<&str> = text
            .split(self.sep)
            .map(|group| {
                let bytes = group.as_bytes();
                let mut skip = 0;
                while skip < bytes.len()
                    && (bytes[skip] == b' ' || (bytes[skip] == b'0' && skip + 1 < bytes.len()))
                {
                    skip += 1;
                }
                group.get(skip..).unwrap_or_default()
            })
            .collect();
        groups.join(&self.sep.to_string())
    }

    /// Whether `text` is a valid address of this family.
    pub fn verify(&self, text: &str) -> bool {
        if self.sep == '.' {
            text.parse::<Ipv4Addr>().is_ok()
        } else {
            text.parse::<Ipv6Addr>().is_ok()
        }
    }

    /// Format one group, zero padded to the group width.
    pub fn format_group(&self, value: i64) -> String {
        let text = if self.radix == 16 {
            format!("{value:0width$x}", width = self.width)
        } else {
            format!("{value:0width$}", width = self.width)
        };
        text.chars().take(self.width + 1).collect()
    }

    /// Pad every group to full width for editing.
    pub fn pad(&self, text: &str) -> String {
        let groups: Vec<String> = text
            .split(self.sep)
            .map(|group| self.format_group(parse_long_prefix(group, self.radix)))
            .collect();
        groups.join(&self.sep.to_string())
    }
}

/// Parse the leading integer of `text` the way `strtol` does: optional
/// blanks, an optional sign, then digits of `radix` up to the first other
/// character. No digits yields 0.
pub fn parse_long_prefix(text: &str, radix: u32) -> i64 {
    let text = text.trim_start();
    let (negative, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let mut value: i64 = 0;
    for digit in digits.chars().map_while(|c| c.to_digit(radix)) {
        value = value.saturating_mul(i64::from(radix)).saturating_add(i64::from(digit));
    }
    if negative { -value } else { value }
}

/// Address entry state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpData {
    /// IPv6 instead of IPv4
    pub v6: bool,
    /// Committed address, unpadded
    pub value: String,
    /// Pending input, padded to full width
    pub edit: EditBuffer,
}

impl IpData {
    /// New address item. An invalid `value` is replaced by the family's
    /// all-zero address.
    pub fn new(v6: bool, value: &str) -> Self {
        let format = if v6 { &IPV6 } else { &IPV4 };
        let mut data = Self { v6, value: String::new(), edit: EditBuffer::new(format.maxlen) };
        data.set_value(value);
        data
    }

    /// Layout of this item's family.
    pub fn format(&self) -> &'static IpFormat {
        if self.v6 { &IPV6 } else { &IPV4 }
    }

    /// Longest text the field may hold.
    pub fn maxlength(&self) -> usize {
        self.format().maxlen
    }

    /// Store a new committed value, normalized, or the fallback address when
    /// it does not verify.
    pub fn set_value(&mut self, value: &str) {
        let format = self.format();
        let truncated: String = value.chars().take(format.maxlen).collect();
        let normalized = format.normalize(&truncated);
        self.value = if format.verify(&normalized) {
            normalized
        } else {
            format.fallback.to_owned()
        };
    }
}

/// Per-type item state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemKind {
    /// Submenu
    Menu(MenuData),
    /// Plain selectable entry
    Action,
    /// Toggle
    Checkbox {
        /// Current state
        value: CheckboxValue,
        /// Whether the gray state is part of the cycle
        allow_gray: bool,
    },
    /// Cycling list
    Ring {
        /// Choices
        strings: Vec<String>,
        /// Index of the current choice
        value: usize,
    },
    /// Bounded integer with a bar
    Slider(SliderData),
    /// Integer entry
    Numeric(NumericData),
    /// Text entry
    Alpha(AlphaData),
    /// Address entry
    Ip(IpData),
}

/// Capacity of a numeric edit field.
const NUMERIC_CAPACITY: usize = 39;

impl ItemKind {
    /// Fresh state of a type with the defaults clients get from
    /// `menu_add_item`.
    pub fn with_defaults(item_type: ItemType) -> Self {
        match item_type {
            ItemType::Menu => Self::Menu(MenuData::default()),
            ItemType::Action => Self::Action,
            ItemType::Checkbox => Self::Checkbox { value: CheckboxValue::Off, allow_gray: false },
            ItemType::Ring => Self::Ring { strings: vec![String::new()], value: 0 },
            ItemType::Slider => Self::Slider(SliderData {
                mintext: String::new(),
                maxtext: String::new(),
                min: 0,
                max: 100,
                step: 1,
                value: 25,
            }),
            ItemType::Numeric => Self::Numeric(NumericData {
                min: 0,
                max: 100,
                value: 0,
                edit: EditBuffer::new(NUMERIC_CAPACITY),
            }),
            ItemType::Alpha => Self::Alpha(AlphaData {
                password_char: None,
                minlength: 0,
                maxlength: 10,
                allow_caps: true,
                allow_noncaps: false,
                allow_numbers: true,
                allowed_extra: "-./".into(),
                value: String::new(),
                edit: EditBuffer::new(10),
            }),
            ItemType::Ip => Self::Ip(IpData::new(false, "192.168.1.245")),
        }
    }

    /// Type of this state.
    pub fn item_type(&self) -> ItemType {
        match self {
            Self::Menu(_) => ItemType::Menu,
            Self::Action => ItemType::Action,
            Self::Checkbox { .. } => ItemType::Checkbox,
            Self::Ring { .. } => ItemType::Ring,
            Self::Slider(_) => ItemType::Slider,
            Self::Numeric(_) => ItemType::Numeric,
            Self::Alpha(_) => ItemType::Alpha,
            Self::Ip(_) => ItemType::Ip,
        }
    }
}

/// A node of the menu tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    /// Identifier, unique within its owner's menu
    pub id: String,
    /// Visible label
    pub text: String,
    /// Owning client; `None` for server items
    pub owner: Option<ClientId>,
    /// Containing menu
    pub parent: Option<ItemRef>,
    /// Hidden items are skipped in menus
    pub hidden: bool,
    /// Where MENU leads
    pub predecessor: Option<NavTarget>,
    /// Where ENTER leads
    pub successor: Option<NavTarget>,
    /// Per-type state
    pub kind: ItemKind,
}

impl MenuItem {
    /// Item with explicit state and no links.
    pub fn new(
        id: impl Into<String>,
        text: impl Into<String>,
        owner: Option<ClientId>,
        kind: ItemKind,
    ) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            owner,
            parent: None,
            hidden: false,
            predecessor: None,
            successor: None,
            kind,
        }
    }

    /// Item of `item_type` with client defaults. Actions stay in the menu
    /// after being selected.
    pub fn with_defaults(
        id: impl Into<String>,
        item_type: ItemType,
        text: impl Into<String>,
        owner: Option<ClientId>,
    ) -> Self {
        let mut item = Self::new(id, text, owner, ItemKind::with_defaults(item_type));
        if item_type == ItemType::Action {
            item.successor = Some(NavTarget::None);
        }
        item
    }

    /// Type of this item.
    pub fn item_type(&self) -> ItemType {
        self.kind.item_type()
    }

    /// Menu state, when this item is a menu.
    pub fn menu(&self) -> Option<&MenuData> {
        match &self.kind {
            ItemKind::Menu(data) => Some(data),
            _ => None,
        }
    }

    /// Menu state for modification, when this item is a menu.
    pub fn menu_mut(&mut self) -> Option<&mut MenuData> {
        match &mut self.kind {
            ItemKind::Menu(data) => Some(data),
            _ => None,
        }
    }

    /// Discard pending edits and put the cursor home.
    pub fn reset(&mut self) {
        match &mut self.kind {
            ItemKind::Menu(menu) => {
                menu.selector = 0;
                menu.scroll = 0;
            },
            ItemKind::Numeric(numeric) => {
                let text = numeric.format(numeric.value);
                numeric.edit.load(&text);
                numeric.edit.error = super::edit::EditError::None;
            },
            ItemKind::Alpha(alpha) => {
                alpha.edit.load(&alpha.value);
                alpha.edit.error = super::edit::EditError::None;
            },
            ItemKind::Ip(ip) => {
                let padded = ip.format().pad(&ip.value);
                ip.edit.load(&padded);
                ip.edit.error = super::edit::EditError::None;
            },
            ItemKind::Action
            | ItemKind::Checkbox { .. }
            | ItemKind::Ring { .. }
            | ItemKind::Slider(_) => {},
        }
    }

    /// Value reported with update, plus and minus events.
    pub fn event_value(&self) -> Option<String> {
        match &self.kind {
            ItemKind::Checkbox { value, .. } => Some(value.name().to_owned()),
            ItemKind::Ring { value, .. } => Some(value.to_string()),
            ItemKind::Slider(slider) => Some(slider.value.to_string()),
            ItemKind::Numeric(numeric) => Some(numeric.value.to_string()),
            ItemKind::Alpha(alpha) => Some(alpha.value.clone()),
            ItemKind::Ip(ip) => Some(ip.value.clone()),
            ItemKind::Menu(_) | ItemKind::Action => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinels_parse() {
        assert_eq!(NavTarget::parse("_quit_"), NavTarget::Quit);
        assert_eq!(NavTarget::parse("_none_").as_str(), "_none_");
        assert_eq!(NavTarget::parse("opts"), NavTarget::Item("opts".into()));
    }

    #[test]
    fn links_map_to_results() {
        let close = MenuResult::for_successor(None, MenuResult::Close);
        assert_eq!(close, MenuResult::Close);
        let jump = NavTarget::Item("x".into());
        assert_eq!(MenuResult::for_predecessor(Some(&jump), MenuResult::Close), MenuResult::Predecessor);
        assert_eq!(MenuResult::for_successor(Some(&NavTarget::Quit), MenuResult::None), MenuResult::Quit);
    }

    #[test]
    fn checkbox_cycles() {
        assert_eq!(CheckboxValue::On.next(false), CheckboxValue::Off);
        assert_eq!(CheckboxValue::On.next(true), CheckboxValue::Gray);
        assert_eq!(CheckboxValue::Gray.next(true), CheckboxValue::Off);
        assert_eq!(CheckboxValue::Off.prev(true), CheckboxValue::Gray);
        assert_eq!(CheckboxValue::Off.prev(false), CheckboxValue::On);
    }

    #[test]
    fn ip_values_are_normalized_or_replaced() {
        let ip = IpData::new(false, "010.002.250.002");
        assert_eq!(ip.value, "10.2.250.2");

        let bad = IpData::new(false, "300.1.1.1");
        assert_eq!(bad.value, "0.0.0.0");

        let v6 = IpData::new(true, "0001:0db8:0000:0000:0000:0000:0000:0001");
        assert_eq!(v6.value, "1:db8:0:0:0:0:0:1");
    }

    #[test]
    fn reset_pads_address_groups() {
        let mut item = MenuItem::with_defaults("addr", ItemType::Ip, "Addr", None);
        item.reset();
        let ItemKind::Ip(ip) = &item.kind else { unreachable!() };
        assert_eq!(ip.edit.text(), "192.168.001.245");
    }

    #[test]
    fn signed_numeric_shows_sign() {
        let mut item = MenuItem::with_defaults("n", ItemType::Numeric, "N", None);
        if let ItemKind::Numeric(numeric) = &mut item.kind {
            numeric.min = -10;
            numeric.value = 5;
        }
        item.reset();
        let ItemKind::Numeric(numeric) = &item.kind else { unreachable!() };
        assert_eq!(numeric.edit.text(), "+5");
        assert_eq!(numeric.max_len(), 4);
    }

    #[test]
    fn strtol_prefix() {
        assert_eq!(parse_long_prefix(" 042x", 10), 42);
        assert_eq!(parse_long_prefix("ff:", 16), 255);
        assert_eq!(parse_long_prefix("", 10), 0);
        assert_eq!(parse_long_prefix("-7", 10), -7);
    }

    #[test]
    fn action_defaults_to_staying() {
        let item = MenuItem::with_defaults("a", ItemType::Action, "A", None);
        assert_eq!(item.successor, Some(NavTarget::None));
        assert!(item.event_value().is_none());
    }
}
