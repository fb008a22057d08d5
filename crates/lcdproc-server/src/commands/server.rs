//! Server-wide commands. Several of these answer with legacy wording, so
//! they reply through [`Reply::Raw`].

use lcdproc_core::{ClientId, menu::options::parse_c_integer};
use lcdproc_proto::Reply;

use super::{CommandError, huh, require_active, success};
use crate::state::ServerState;

const ALL_OUTPUTS_ON: i32 = -1;
const ALL_OUTPUTS_OFF: i32 = 0;

fn raw(state: &mut ServerState, client: ClientId, line: impl Into<String>) {
    state.send(client, Reply::Raw(line.into()));
}

/// Check for exactly one argument, answering the legacy complaints.
fn single_argument<'a>(
    state: &mut ServerState,
    client: ClientId,
    args: &'a [String],
    usage: &str,
) -> Option<&'a str> {
    match args {
        [_, arg] => Some(arg.as_str()),
        [_] => {
            raw(state, client, usage);
            None
        },
        _ => {
            raw(state, client, "huh?  Too many parameters...");
            None
        },
    }
}

/// `test_func {<arg>}*`: echo every argument with its index.
pub(super) fn test_func(state: &mut ServerState, client: ClientId, args: &[String]) -> Result<(), CommandError> {
    for (i, arg) in args.iter().enumerate() {
        raw(state, client, format!("test_func_func:  {i} -> {arg}"));
    }
    Ok(())
}

/// `output <on|off|num>`
pub(super) fn output(state: &mut ServerState, client: ClientId, args: &[String]) -> Result<(), CommandError> {
    let usage = "huh?  usage: output <on|off|num> -- num may be decimal, hex, or octal";
    let Some(arg) = single_argument(state, client, args, usage) else {
        return Ok(());
    };
    let value = match arg {
        "on" => Some(ALL_OUTPUTS_ON),
        "off" => Some(ALL_OUTPUTS_OFF),
        other => parse_c_integer(other).and_then(|n| i32::try_from(n).ok()),
    };
    let Some(value) = value else {
        raw(state, client, "huh?  invalid parameter...");
        return Ok(());
    };

    state.renderer.output_state = value;
    success(state, client);
    tracing::info!(client = client.0, output = value, "output states changed");
    Ok(())
}

/// `noop`
pub(super) fn noop(state: &mut ServerState, client: ClientId, _args: &[String]) -> Result<(), CommandError> {
    raw(state, client, "noop complete");
    Ok(())
}

/// `info`: one line describing the loaded drivers.
pub(super) fn info(state: &mut ServerState, client: ClientId, args: &[String]) -> Result<(), CommandError> {
    require_active(state, client, args)?;
    if args.len() > 1 {
        huh(state, client, "Extra arguments ignored...");
    }
    let info = state.drivers.info();
    raw(state, client, info);
    Ok(())
}

/// `sleep <secs>`: accepted and answered, but the server does not pause.
pub(super) fn sleep(state: &mut ServerState, client: ClientId, args: &[String]) -> Result<(), CommandError> {
    let Some(arg) = single_argument(state, client, args, "huh?  usage: sleep <secs>") else {
        return Ok(());
    };
    let Some(secs) = parse_c_integer(arg) else {
        raw(state, client, "huh?  invalid parameter...");
        return Ok(());
    };
    raw(state, client, format!("sleeping {secs} seconds"));
    raw(state, client, "huh? ignored (not fully implemented)");
    Ok(())
}
