//! Key handling of the items that own a screen: slider, numeric, alpha and
//! ip.
//!
//! Every handler takes the token, the raw key name (for direct character
//! entry), the configured key mask and the display width (for horizontal
//! scrolling of the edit field). Handlers report the client event to fire
//! alongside the [`MenuResult`].

pub use lcdproc_proto::MenuEventKind;

use super::{
    edit::{EditBuffer, EditError},
    item::{
        AlphaData, IpData, ItemKind, KeyMask, MenuItem, MenuResult, MenuToken, NumericData,
        SliderData,
    },
};

/// Result of one key on an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reaction {
    /// Navigation outcome
    pub result: MenuResult,
    /// Event for the item's owner, if any
    pub event: Option<MenuEventKind>,
}

impl Reaction {
    /// Outcome without an event.
    pub fn quiet(result: MenuResult) -> Self {
        Self { result, event: None }
    }

    /// Outcome with an event.
    pub fn with_event(result: MenuResult, event: MenuEventKind) -> Self {
        Self { result, event: Some(event) }
    }
}

/// Feed a token to an item that is shown on its own screen. Menus and
/// inline items are handled by the tree; for them this yields
/// [`MenuResult::Error`].
pub fn process_editor(
    item: &mut MenuItem,
    token: MenuToken,
    key: &str,
    mask: KeyMask,
    width: usize,
) -> Reaction {
    let MenuItem { predecessor, successor, kind, .. } = item;
    let leave = || MenuResult::for_predecessor(predecessor.as_ref(), MenuResult::Close);
    let commit = || MenuResult::for_successor(successor.as_ref(), MenuResult::Close);

    match kind {
        ItemKind::Slider(slider) => match token {
            MenuToken::Menu => Reaction::quiet(leave()),
            MenuToken::Enter => Reaction::quiet(commit()),
            MenuToken::Up | MenuToken::Right => {
                slider_up(slider, mask);
                Reaction::with_event(MenuResult::None, MenuEventKind::Plus)
            },
            MenuToken::Down | MenuToken::Left => {
                slider_down(slider, mask);
                Reaction::with_event(MenuResult::None, MenuEventKind::Minus)
            },
            MenuToken::Other => Reaction::quiet(MenuResult::Error),
        },
        ItemKind::Numeric(numeric) => {
            numeric.edit.error = EditError::None;
            if token == MenuToken::Menu {
                if numeric.edit.pos == 0 {
                    return Reaction::quiet(leave());
                }
                reset_numeric(numeric);
                return Reaction::quiet(MenuResult::None);
            }
            numeric_input(numeric, token, key, mask, width, commit)
        },
        ItemKind::Alpha(alpha) => {
            alpha.edit.error = EditError::None;
            if token == MenuToken::Menu {
                if alpha.edit.pos == 0 {
                    return Reaction::quiet(leave());
                }
                alpha.edit.load(&alpha.value);
                return Reaction::quiet(MenuResult::None);
            }
            alpha_input(alpha, token, key, mask, width, commit)
        },
        ItemKind::Ip(ip) => {
            ip.edit.error = EditError::None;
            if token == MenuToken::Menu {
                if ip.edit.pos == 0 {
                    return Reaction::quiet(leave());
                }
                let padded = ip.format().pad(&ip.value);
                ip.edit.load(&padded);
                return Reaction::quiet(MenuResult::None);
            }
            ip_input(ip, token, key, mask, width, commit)
        },
        ItemKind::Menu(_) | ItemKind::Action | ItemKind::Checkbox { .. } | ItemKind::Ring { .. } => {
            Reaction::quiet(MenuResult::Error)
        },
    }
}

fn slider_up(slider: &mut SliderData, mask: KeyMask) {
    let wraps = !mask.has(MenuToken::Left) && !mask.has(MenuToken::Down);
    if wraps && slider.value == slider.max {
        slider.value = slider.min;
    } else {
        slider.value = slider.value.saturating_add(slider.step).min(slider.max);
    }
}

fn slider_down(slider: &mut SliderData, mask: KeyMask) {
    let wraps = !mask.has(MenuToken::Right) && !mask.has(MenuToken::Up);
    if wraps && slider.value == slider.min {
        slider.value = slider.max;
    } else {
        slider.value = slider.value.saturating_sub(slider.step).max(slider.min);
    }
}

fn reset_numeric(numeric: &mut NumericData) {
    let text = numeric.format(numeric.value);
    numeric.edit.load(&text);
}

/// Parse the leading decimal integer: blanks, optional sign, at least one
/// digit.
fn scan_int(text: &str) -> Option<i64> {
    let text = text.trim_start();
    let (negative, rest) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let magnitude = rest[..digits].bytes().fold(0i64, |acc, d| {
        acc.saturating_mul(10).saturating_add(i64::from(d - b'0'))
    });
    Some(if negative { -magnitude } else { magnitude })
}

fn numeric_input(
    numeric: &mut NumericData,
    token: MenuToken,
    key: &str,
    mask: KeyMask,
    width: usize,
    commit: impl FnOnce() -> MenuResult,
) -> Reaction {
    let max_len = numeric.max_len();
    let edit = &mut numeric.edit;
    let pos = edit.pos;

    match token {
        MenuToken::Enter => {
            if mask.has(MenuToken::Right) || edit.current() == 0 {
                let Some(value) = scan_int(&edit.text()) else {
                    return Reaction::quiet(MenuResult::Error);
                };
                if value < i64::from(numeric.min) || value > i64::from(numeric.max) {
                    edit.fail(EditError::OutOfRange);
                    return Reaction::quiet(MenuResult::None);
                }
                numeric.value = i32::try_from(value).unwrap_or(numeric.value);
                return Reaction::with_event(commit(), MenuEventKind::Update);
            }
            if pos < max_len {
                edit.advance(width);
            }
        },
        MenuToken::Up | MenuToken::Down => {
            if pos >= max_len {
                edit.fail(EditError::TooLong);
            } else if numeric.min < 0 && pos == 0 {
                let sign = if edit.get(0) == b'-' { b'+' } else { b'-' };
                edit.set(0, sign);
            } else {
                let digit = edit.current();
                let next = if token == MenuToken::Up {
                    match digit {
                        b'0'..=b'8' => Some(digit + 1),
                        b'9' => Some(0),
                        0 => Some(b'0'),
                        _ => None,
                    }
                } else {
                    match digit {
                        b'1'..=b'9' => Some(digit - 1),
                        b'0' => Some(0),
                        0 => Some(b'9'),
                        _ => None,
                    }
                };
                if let Some(next) = next {
                    edit.set(pos, next);
                }
            }
        },
        MenuToken::Right => {
            if edit.current() != 0 && pos < max_len {
                edit.advance(width);
            }
        },
        MenuToken::Left => edit.cursor_left(),
        MenuToken::Other => {
            if pos >= max_len {
                edit.fail(EditError::TooLong);
            } else if let &[digit] = key.as_bytes() {
                if digit.is_ascii_digit() {
                    edit.set(pos, digit);
                    edit.advance(width);
                }
            }
        },
        MenuToken::Menu => {},
    }
    Reaction::quiet(MenuResult::None)
}

fn alpha_input(
    alpha: &mut AlphaData,
    token: MenuToken,
    key: &str,
    mask: KeyMask,
    width: usize,
    commit: impl FnOnce() -> MenuResult,
) -> Reaction {
    let chars = alpha.charset();
    let maxlength = alpha.maxlength;
    let edit = &mut alpha.edit;
    let pos = edit.pos;

    match token {
        MenuToken::Enter => {
            if mask.has(MenuToken::Right) || edit.current() == 0 {
                if edit.len() < alpha.minlength {
                    edit.error = EditError::TooShort;
                    return Reaction::quiet(MenuResult::None);
                }
                alpha.value = edit.text();
                return Reaction::with_event(commit(), MenuEventKind::Update);
            }
            if pos < maxlength {
                edit.advance(width);
            }
        },
        MenuToken::Up => {
            if pos >= maxlength {
                edit.fail(EditError::TooLong);
            } else {
                let current = edit.current();
                let next = if current == 0 {
                    chars.first().copied().unwrap_or(0)
                } else {
                    chars
                        .iter()
                        .position(|&c| c == current)
                        .and_then(|i| chars.get(i + 1))
                        .copied()
                        .unwrap_or(0)
                };
                edit.set(pos, next);
            }
        },
        MenuToken::Down => {
            if pos >= maxlength {
                edit.fail(EditError::TooLong);
            } else {
                let current = edit.current();
                let prev = if current == 0 {
                    chars.last().copied().unwrap_or(0)
                } else {
                    chars
                        .iter()
                        .position(|&c| c == current)
                        .and_then(|i| i.checked_sub(1))
                        .and_then(|i| chars.get(i))
                        .copied()
                        .unwrap_or(0)
                };
                edit.set(pos, prev);
            }
        },
        MenuToken::Right => {
            if edit.current() != 0 && pos + 1 < maxlength {
                edit.advance(width);
            }
        },
        MenuToken::Left => edit.cursor_left(),
        MenuToken::Other => {
            if pos >= maxlength {
                edit.fail(EditError::TooLong);
            } else if let &[byte] = key.as_bytes() {
                if byte >= b' ' && chars.contains(&byte) {
                    edit.set(pos, byte);
                    edit.advance(width);
                }
            }
        },
        MenuToken::Menu => {},
    }
    Reaction::quiet(MenuResult::None)
}

/// Step to the next editable position, hopping over a separator and
/// scrolling so the cursor stays inside the display.
fn ip_advance(edit: &mut EditBuffer, sep: u8, width: usize) {
    edit.pos += 1;
    if edit.current() == sep {
        edit.pos += 1;
    }
    let limit = width as i64 - 2;
    while edit.pos as i64 - edit.offs as i64 > limit {
        edit.offs += 1;
    }
}

fn ip_input(
    ip: &mut IpData,
    token: MenuToken,
    key: &str,
    mask: KeyMask,
    width: usize,
    commit: impl FnOnce() -> MenuResult,
) -> Reaction {
    let format = ip.format();
    let sep = format.sep as u8;
    let edit = &mut ip.edit;
    let pos = edit.pos;
    let last = format.maxlen.saturating_sub(1);

    match token {
        MenuToken::Enter => {
            if mask.has(MenuToken::Right) || pos >= last {
                let candidate = format.normalize(&edit.text());
                if !format.verify(&candidate) {
                    edit.error = EditError::InvalidAddress;
                    return Reaction::quiet(MenuResult::None);
                }
                ip.value = candidate;
                return Reaction::with_event(commit(), MenuEventKind::Update);
            }
            ip_advance(edit, sep, width);
        },
        MenuToken::Up | MenuToken::Down => {
            let group = format.width + 1;
            let start = pos - pos % group;
            let mut value = super::item::parse_long_prefix(&edit.text_from(start), format.radix);
            let place = format.place_values[(pos - pos / group) % format.width];
            if token == MenuToken::Up {
                value += place;
                if value > format.limit {
                    value = 0;
                }
            } else {
                value -= place;
                if value < 0 {
                    value = format.limit;
                }
            }
            for (i, byte) in format.format_group(value).bytes().take(format.width).enumerate() {
                edit.set(start + i, byte);
            }
        },
        MenuToken::Right => {
            if pos < last {
                ip_advance(edit, sep, width);
            }
        },
        MenuToken::Left => {
            if pos > 0 {
                edit.pos -= 1;
                if edit.current() == sep && edit.pos > 0 {
                    edit.pos -= 1;
                }
                edit.offs = edit.offs.min(edit.pos);
            }
        },
        MenuToken::Other => {
            if let &[byte] = key.as_bytes() {
                let accepted =
                    if ip.v6 { byte.is_ascii_hexdigit() } else { byte.is_ascii_digit() };
                if accepted {
                    edit.set(pos, byte.to_ascii_lowercase());
                    if pos < last {
                        ip_advance(edit, sep, width);
                    }
                }
            }
        },
        MenuToken::Menu => {},
    }
    Reaction::quiet(MenuResult::None)
}
