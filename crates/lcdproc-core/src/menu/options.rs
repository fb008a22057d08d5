//! The `-option value` list of `menu_set_item`.
//!
//! Options are applied one at a time. A bad option is reported and skipped
//! and the rest of the list is still processed, so one command can yield
//! several errors.

use thiserror::Error;

use super::item::{CheckboxValue, ItemKind, ItemType, MenuItem, NavTarget};

/// Arguments are quoted back to the client cut to this many characters.
const QUOTE_LIMIT: usize = 40;

/// Longest `maxlength` an alpha item accepts.
const MAX_ALPHA_LENGTH: i64 = 1000;

fn quoted(arg: &str) -> String {
    arg.chars().take(QUOTE_LIMIT).collect()
}

/// One rejected option. The display text is the client-facing message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OptionError {
    /// Argument does not start with `-`
    #[error("Found non-option: \"{0}\"")]
    NonOption(String),

    /// Option exists, but not for this item type
    #[error("Option not valid for menuitem type: \"{0}\"")]
    WrongType(String),

    /// No such option
    #[error("Unknown option: \"{0}\"")]
    Unknown(String),

    /// Option is the last argument
    #[error("Missing value at option: \"{0}\"")]
    MissingValue(String),

    /// Value does not parse
    #[error("Could not interpret value at option: \"{0}\"")]
    BadValue(String),

    /// Value parses but is not allowed
    #[error("Value out of range at option: \"{0}\"")]
    OutOfRange(String),

    /// `-prev` names an unknown item
    #[error("Cannot find predecessor '{target}' for item '{id}'")]
    PredecessorNotFound {
        /// Item being configured
        id: String,
        /// Missing target
        target: String,
    },

    /// `-next` names an unknown item
    #[error("Cannot find successor '{target}' for item '{id}'")]
    SuccessorNotFound {
        /// Item being configured
        id: String,
        /// Missing target
        target: String,
    },

    /// Menus have no successor
    #[error("Cannot set successor of '{id}': wrong type '{item_type}'")]
    SuccessorOnMenu {
        /// Item being configured
        id: String,
        /// Its type name
        item_type: &'static str,
    },
}

/// Value type of an option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Value {
    Bool,
    Checkbox,
    Short,
    Int,
    Text,
}

/// `(applicable type, name, value type)`; `None` applies to every type.
const OPTIONS: &[(Option<ItemType>, &str, Value)] = &[
    (None, "text", Value::Text),
    (None, "is_hidden", Value::Bool),
    (None, "prev", Value::Text),
    (None, "next", Value::Text),
    (Some(ItemType::Action), "menu_result", Value::Text),
    (Some(ItemType::Checkbox), "value", Value::Checkbox),
    (Some(ItemType::Checkbox), "allow_gray", Value::Bool),
    (Some(ItemType::Ring), "value", Value::Short),
    (Some(ItemType::Ring), "strings", Value::Text),
    (Some(ItemType::Slider), "value", Value::Int),
    (Some(ItemType::Slider), "minvalue", Value::Int),
    (Some(ItemType::Slider), "maxvalue", Value::Int),
    (Some(ItemType::Slider), "stepsize", Value::Int),
    (Some(ItemType::Slider), "mintext", Value::Text),
    (Some(ItemType::Slider), "maxtext", Value::Text),
    (Some(ItemType::Numeric), "value", Value::Int),
    (Some(ItemType::Numeric), "minvalue", Value::Int),
    (Some(ItemType::Numeric), "maxvalue", Value::Int),
    (Some(ItemType::Alpha), "value", Value::Text),
    (Some(ItemType::Alpha), "minlength", Value::Short),
    (Some(ItemType::Alpha), "maxlength", Value::Short),
    (Some(ItemType::Alpha), "password_char", Value::Text),
    (Some(ItemType::Alpha), "allow_caps", Value::Bool),
    (Some(ItemType::Alpha), "allow_noncaps", Value::Bool),
    (Some(ItemType::Alpha), "allow_numbers", Value::Bool),
    (Some(ItemType::Alpha), "allowed_extra", Value::Text),
    (Some(ItemType::Ip), "v6", Value::Bool),
    (Some(ItemType::Ip), "value", Value::Text),
];

/// A parsed option value.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Parsed<'a> {
    Bool(bool),
    Checkbox(CheckboxValue),
    Int(i64),
    Text(&'a str),
}

/// Parse an integer the way C's `strtol(s, &end, 0)` does, requiring the
/// whole string to be consumed: optional blanks and sign, then decimal,
/// `0x` hex or leading-zero octal digits.
pub fn parse_c_integer(text: &str) -> Option<i64> {
    let trimmed = text.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let (radix, digits) = if let Some(hex) =
        rest.strip_prefix("0x").or_else(|| rest.strip_prefix("0X"))
    {
        (16, hex)
    } else if rest.len() > 1 && rest.starts_with('0') {
        (8, &rest[1..])
    } else {
        (10, rest)
    };
    if digits.is_empty() || digits.starts_with(['+', '-']) {
        return None;
    }
    let magnitude = i64::from_str_radix(digits, radix).ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

/// Values were range checked when parsed.
fn narrow(value: i64) -> i32 {
    i32::try_from(value).unwrap_or_default()
}

fn parse_value(kind: Value, raw: &str) -> Option<Parsed<'_>> {
    match kind {
        Value::Bool => match raw {
            "true" => Some(Parsed::Bool(true)),
            "false" => Some(Parsed::Bool(false)),
            _ => None,
        },
        Value::Checkbox => CheckboxValue::from_name(raw).map(Parsed::Checkbox),
        Value::Short => parse_c_integer(raw)
            .filter(|v| i16::try_from(*v).is_ok())
            .map(Parsed::Int),
        Value::Int => parse_c_integer(raw)
            .filter(|v| i32::try_from(*v).is_ok())
            .map(Parsed::Int),
        Value::Text => Some(Parsed::Text(raw)),
    }
}

/// Outcome of applying one option.
enum Applied {
    Ok,
    /// Value rejected; the value argument is retried as an option
    Retry,
    /// Value rejected; option and value are skipped
    Skip(OptionError),
}

/// Apply `args` (the `-option value` pairs after the item id) to `item`.
/// `link_exists` resolves `-prev`/`-next` targets. Returns every rejected
/// option in order.
pub fn apply_options(
    item: &mut MenuItem,
    args: &[String],
    link_exists: impl Fn(&str) -> bool,
) -> Vec<OptionError> {
    let mut errors = Vec::new();
    let mut index = 0;

    while index < args.len() {
        let arg = &args[index];
        let Some(name) = arg.strip_prefix('-') else {
            errors.push(OptionError::NonOption(quoted(arg)));
            index += 1;
            continue;
        };

        let item_type = item.item_type();
        let mut known = false;
        let mut found = None;
        for &(applies_to, option, kind) in OPTIONS {
            if option == name {
                known = true;
                if applies_to.is_none_or(|t| t == item_type) {
                    found = Some(kind);
                }
            }
        }
        let Some(kind) = found else {
            errors.push(if known {
                OptionError::WrongType(quoted(arg))
            } else {
                OptionError::Unknown(quoted(arg))
            });
            index += 1;
            continue;
        };

        let Some(raw) = args.get(index + 1) else {
            errors.push(OptionError::MissingValue(quoted(arg)));
            index += 1;
            continue;
        };
        let Some(value) = parse_value(kind, raw) else {
            errors.push(OptionError::BadValue(quoted(arg)));
            index += 2;
            continue;
        };

        match apply_one(item, name, value, &link_exists, &mut errors) {
            Applied::Ok => index += 2,
            Applied::Retry => {
                errors.push(OptionError::BadValue(quoted(arg)));
                index += 1;
            },
            Applied::Skip(error) => {
                errors.push(error);
                index += 2;
            },
        }
    }
    errors
}

fn apply_one(
    item: &mut MenuItem,
    name: &str,
    value: Parsed<'_>,
    link_exists: &impl Fn(&str) -> bool,
    errors: &mut Vec<OptionError>,
) -> Applied {
    match (name, value) {
        ("text", Parsed::Text(text)) => item.text = text.to_owned(),
        ("is_hidden", Parsed::Bool(hidden)) => item.hidden = hidden,
        ("prev", Parsed::Text(target)) => {
            let link = NavTarget::parse(target);
            if matches!(link, NavTarget::Item(_)) && !link_exists(target) {
                errors.push(OptionError::PredecessorNotFound {
                    id: item.id.clone(),
                    target: target.to_owned(),
                });
            } else {
                item.predecessor = Some(link);
            }
        },
        ("next", Parsed::Text(target)) => {
            let link = NavTarget::parse(target);
            if matches!(link, NavTarget::Item(_)) && !link_exists(target) {
                errors.push(OptionError::SuccessorNotFound {
                    id: item.id.clone(),
                    target: target.to_owned(),
                });
            } else if item.item_type() == ItemType::Menu {
                errors.push(OptionError::SuccessorOnMenu {
                    id: item.id.clone(),
                    item_type: ItemType::Menu.name(),
                });
            } else {
                item.successor = Some(link);
            }
        },
        ("menu_result", Parsed::Text(result)) => {
            let link = match result {
                "none" => NavTarget::None,
                "close" => NavTarget::Close,
                "quit" => NavTarget::Quit,
                _ => return Applied::Retry,
            };
            item.successor = Some(link);
        },
        (name, value) => return apply_typed(item, name, value),
    }
    Applied::Ok
}

fn apply_typed(item: &mut MenuItem, name: &str, value: Parsed<'_>) -> Applied {
    match (&mut item.kind, name, value) {
        (ItemKind::Checkbox { value: current, .. }, "value", Parsed::Checkbox(v)) => *current = v,
        (ItemKind::Checkbox { allow_gray, .. }, "allow_gray", Parsed::Bool(v)) => *allow_gray = v,

        (ItemKind::Ring { strings, value: current }, option, value) => {
            match (option, value) {
                ("value", Parsed::Int(v)) => {
                    let len = i64::try_from(strings.len().max(1)).unwrap_or(1);
                    *current = usize::try_from(v.rem_euclid(len)).unwrap_or(0);
                },
                ("strings", Parsed::Text(list)) => {
                    *strings = list.split('\t').map(str::to_owned).collect();
                },
                _ => {},
            }
            *current %= strings.len().max(1);
        },

        (ItemKind::Slider(slider), option, value) => {
            match (option, value) {
                ("value", Parsed::Int(v)) => slider.value = narrow(v),
                ("minvalue", Parsed::Int(v)) => slider.min = narrow(v),
                ("maxvalue", Parsed::Int(v)) => slider.max = narrow(v),
                ("stepsize", Parsed::Int(v)) => slider.step = narrow(v),
                ("mintext", Parsed::Text(t)) => slider.mintext = t.to_owned(),
                ("maxtext", Parsed::Text(t)) => slider.maxtext = t.to_owned(),
                _ => {},
            }
            if slider.value < slider.min {
                slider.value = slider.min;
            } else if slider.value > slider.max {
                slider.value = slider.max;
            }
        },

        (ItemKind::Numeric(numeric), option, Parsed::Int(v)) => {
            match option {
                "value" => numeric.value = narrow(v),
                "minvalue" => numeric.min = narrow(v),
                "maxvalue" => numeric.max = narrow(v),
                _ => {},
            }
            item.reset();
        },

        (ItemKind::Alpha(alpha), option, value) => {
            match (option, value) {
                ("value", Parsed::Text(text)) => {
                    alpha.value = text.chars().take(alpha.maxlength).collect();
                },
                ("minlength", Parsed::Int(v)) => {
                    alpha.minlength = usize::try_from(v).unwrap_or(0);
                },
                ("maxlength", Parsed::Int(v)) => {
                    if !(0..=MAX_ALPHA_LENGTH).contains(&v) {
                        return Applied::Skip(OptionError::OutOfRange("-maxlength".into()));
                    }
                    let len = usize::try_from(v).unwrap_or(0);
                    alpha.maxlength = len;
                    alpha.value = alpha.value.chars().take(len).collect();
                    alpha.edit.resize(len);
                },
                ("password_char", Parsed::Text(text)) => alpha.password_char = text.chars().next(),
                ("allow_caps", Parsed::Bool(v)) => alpha.allow_caps = v,
                ("allow_noncaps", Parsed::Bool(v)) => alpha.allow_noncaps = v,
                ("allow_numbers", Parsed::Bool(v)) => alpha.allow_numbers = v,
                ("allowed_extra", Parsed::Text(text)) => alpha.allowed_extra = text.to_owned(),
                _ => {},
            }
            item.reset();
        },

        (ItemKind::Ip(ip), option, value) => {
            match (option, value) {
                ("v6", Parsed::Bool(v6)) => {
                    ip.v6 = v6;
                    ip.edit.resize(ip.maxlength());
                    let current = ip.value.clone();
                    ip.set_value(&current);
                },
                ("value", Parsed::Text(text)) => ip.set_value(text),
                _ => {},
            }
            item.reset();
        },

        _ => {},
    }
    Applied::Ok
}
