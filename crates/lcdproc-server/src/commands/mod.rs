//! Client command table and handlers.
//!
//! A handler gets the tokenized line (`args[0]` is the command name) and
//! answers through [`ServerState::send`]. Problems with the arguments are
//! reported with a `huh?` reply and still count as handled; a handler only
//! returns an error when it refuses to run at all, which the caller turns
//! into `huh? Function returned error "<cmd>"`.

mod client;
mod menu;
mod screen;
mod server;
mod widget;

use lcdproc_core::{Client, ClientId};
use lcdproc_proto::{ParseError, Reply};
use thiserror::Error;

use crate::state::ServerState;

/// Command names are cut to this length when echoed back.
const ECHO_LIMIT: usize = 40;

/// Why a line produced an error reply instead of running a handler.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// The line could not be split into arguments
    #[error("Could not parse command")]
    Parse(#[from] ParseError),

    /// No such command
    #[error("Invalid command \"{0}\"")]
    Unknown(String),

    /// The handler refused, typically because the client has not said
    /// `hello` yet
    #[error("Function returned error \"{0}\"")]
    Failed(String),
}

type Handler = fn(&mut ServerState, ClientId, &[String]) -> Result<(), CommandError>;

/// Every command the server understands.
pub const COMMANDS: [&str; 22] = [
    "test_func",
    "hello",
    "client_set",
    "client_add_key",
    "client_del_key",
    "screen_add",
    "screen_del",
    "screen_set",
    "widget_add",
    "widget_del",
    "widget_set",
    "menu_add_item",
    "menu_del_item",
    "menu_set_item",
    "menu_goto",
    "menu_set_main",
    "backlight",
    "output",
    "noop",
    "info",
    "sleep",
    "bye",
];

fn handler(name: &str) -> Option<Handler> {
    let handler: Handler = match name {
        "test_func" => server::test_func,
        "hello" => client::hello,
        "client_set" => client::client_set,
        "client_add_key" => client::client_add_key,
        "client_del_key" => client::client_del_key,
        "screen_add" => screen::screen_add,
        "screen_del" => screen::screen_del,
        "screen_set" => screen::screen_set,
        "widget_add" => widget::widget_add,
        "widget_del" => widget::widget_del,
        "widget_set" => widget::widget_set,
        "menu_add_item" => menu::menu_add_item,
        "menu_del_item" => menu::menu_del_item,
        "menu_set_item" => menu::menu_set_item,
        "menu_goto" => menu::menu_goto,
        "menu_set_main" => menu::menu_set_main,
        "backlight" => client::backlight,
        "output" => server::output,
        "noop" => server::noop,
        "info" => server::info,
        "sleep" => server::sleep,
        "bye" => client::bye,
        _ => return None,
    };
    Some(handler)
}

/// Run the command in `args` for `client`.
pub fn dispatch(state: &mut ServerState, client: ClientId, args: &[String]) -> Result<(), CommandError> {
    let Some(name) = args.first() else {
        return Ok(());
    };
    let handler = handler(name).ok_or_else(|| CommandError::Unknown(echo(name)))?;
    handler(state, client, args)
}

fn echo(name: &str) -> String {
    name.chars().take(ECHO_LIMIT).collect()
}

/// Refuse unless the client completed the handshake.
fn require_active(state: &ServerState, client: ClientId, args: &[String]) -> Result<(), CommandError> {
    if state.clients.get(client).is_some_and(Client::is_active) {
        Ok(())
    } else {
        Err(CommandError::Failed(args.first().map(|n| echo(n)).unwrap_or_default()))
    }
}

fn success(state: &mut ServerState, client: ClientId) {
    state.send(client, Reply::Success);
}

fn huh(state: &mut ServerState, client: ClientId, message: impl Into<String>) {
    state.send(client, Reply::huh(message));
}

/// `atoi`: optional sign and leading digits after leading whitespace,
/// 0 when there are none. Saturates instead of overflowing.
pub(crate) fn atoi(text: &str) -> i32 {
    let text = text.trim_start();
    let (negative, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let mut value: i64 = 0;
    for digit in digits.bytes().take_while(u8::is_ascii_digit) {
        value = (value * 10 + i64::from(digit - b'0')).min(i64::from(i32::MAX) + 1);
    }
    let value = if negative { -value } else { value };
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

/// Whether the argument starts with a decimal digit.
fn starts_with_digit(arg: &str) -> bool {
    arg.as_bytes().first().is_some_and(u8::is_ascii_digit)
}

/// Option name with one optional leading `-` removed.
fn option_name(arg: &str) -> &str {
    arg.strip_prefix('-').unwrap_or(arg)
}
