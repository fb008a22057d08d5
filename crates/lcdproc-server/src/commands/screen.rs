//! Screen commands.

use lcdproc_core::{ClientId, Cursor, Priority, Screen, Switch};

use super::{CommandError, atoi, huh, option_name, require_active, success};
use crate::state::ServerState;

const SCREEN_SET_USAGE: &str = "Usage: screen_set <id> [-name <name>] [-wid <width>] [-hgt <height>] \
                                [-priority <prio>] [-duration <int>] [-timeout <int>] [-heartbeat <type>] \
                                [-backlight <type>] [-cursor <type>] [-cursor_x <xpos>] [-cursor_y <ypos>]";

/// `screen_add <screenid>`
pub(super) fn screen_add(state: &mut ServerState, client: ClientId, args: &[String]) -> Result<(), CommandError> {
    require_active(state, client, args)?;
    let [_, id] = args else {
        huh(state, client, "Usage: screen_add <screenid>");
        return Ok(());
    };
    if state.screens.find(Some(client), id).is_some() {
        huh(state, client, "Screen already exists");
        return Ok(());
    }

    state.screens.add(Screen::new(id.as_str(), Some(client), &state.defaults));
    tracing::debug!(client = client.0, screen = %id, "screen added");
    success(state, client);
    Ok(())
}

/// `screen_del <screenid>`
pub(super) fn screen_del(state: &mut ServerState, client: ClientId, args: &[String]) -> Result<(), CommandError> {
    require_active(state, client, args)?;
    let [_, id] = args else {
        huh(state, client, "Usage: screen_del <screenid>");
        return Ok(());
    };
    let Some(key) = state.screens.find(Some(client), id) else {
        huh(state, client, "Unknown screen id");
        return Ok(());
    };

    let timer = state.timer;
    if let Some((_, transition)) = state.screens.remove(key, timer) {
        state.notify(transition);
    }
    success(state, client);
    Ok(())
}

/// What one `screen_set` option did.
enum Outcome {
    Done,
    Error(&'static str),
    /// Applied what could be applied, with a complaint
    Warned(&'static str),
}

/// `screen_set <id> {-<option> <value>}+`, replying once per option.
pub(super) fn screen_set(state: &mut ServerState, client: ClientId, args: &[String]) -> Result<(), CommandError> {
    require_active(state, client, args)?;
    match args.len() {
        1 => {
            huh(state, client, SCREEN_SET_USAGE);
            return Ok(());
        },
        2 => {
            huh(state, client, "What do you want to set?");
            return Ok(());
        },
        _ => {},
    }
    let Some(key) = state.screens.find(Some(client), &args[1]) else {
        huh(state, client, "Unknown screen id");
        return Ok(());
    };

    let mut i = 2;
    while i < args.len() {
        let option = option_name(&args[i]);
        let known = matches!(
            option,
            "name"
                | "priority"
                | "duration"
                | "heartbeat"
                | "wid"
                | "hgt"
                | "timeout"
                | "backlight"
                | "cursor"
                | "cursor_x"
                | "cursor_y"
        );
        if !known {
            huh(state, client, "invalid parameter");
            i += 1;
            continue;
        }
        let Some(value) = args.get(i + 1) else {
            huh(state, client, format!("-{option} requires a parameter"));
            i += 1;
            continue;
        };
        i += 2;

        let Some(screen) = state.screens.get_mut(key) else {
            break;
        };
        match set_option(screen, option, value) {
            Outcome::Done => success(state, client),
            Outcome::Error(message) => huh(state, client, message),
            Outcome::Warned(message) => {
                huh(state, client, message);
                success(state, client);
            },
        }
    }
    Ok(())
}

fn set_option(screen: &mut Screen, option: &str, value: &str) -> Outcome {
    let positive = || Some(atoi(value)).filter(|&n| n > 0);
    match option {
        "name" => screen.name = Some(value.to_owned()),
        "priority" => match Priority::from_arg(value) {
            Some(priority) => screen.priority = priority,
            None => return Outcome::Error("invalid argument at -priority"),
        },
        "duration" => {
            if let Some(n) = positive() {
                screen.duration = n;
            }
        },
        "wid" => {
            if let Some(n) = positive() {
                screen.width = n;
            }
        },
        "hgt" => {
            if let Some(n) = positive() {
                screen.height = n;
            }
        },
        "timeout" => {
            if let Some(n) = positive() {
                screen.timeout = n;
            }
        },
        "heartbeat" => {
            if let Some(heartbeat) = Switch::from_name(value) {
                screen.heartbeat = heartbeat;
            }
        },
        "backlight" => {
            if !screen.backlight.apply(value, true) {
                return Outcome::Warned("unknown backlight mode");
            }
        },
        "cursor" => {
            if let Some(cursor) = Cursor::from_name(value) {
                screen.cursor = cursor;
            }
        },
        "cursor_x" => match positive().filter(|&x| x <= screen.width) {
            Some(x) => screen.cursor_x = x,
            None => return Outcome::Error("Cursor position outside screen"),
        },
        "cursor_y" => match positive().filter(|&y| y <= screen.height) {
            Some(y) => screen.cursor_y = y,
            None => return Outcome::Error("Cursor position outside screen"),
        },
        _ => return Outcome::Error("invalid parameter"),
    }
    Outcome::Done
}
