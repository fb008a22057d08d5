//! Handshake and client-wide settings.

use lcdproc_core::{ClientId, ClientState};
use lcdproc_proto::Reply;

use super::{CommandError, huh, option_name, require_active, success};
use crate::state::ServerState;

/// `hello`: answer with the display geometry and accept further commands.
pub(super) fn hello(state: &mut ServerState, client: ClientId, args: &[String]) -> Result<(), CommandError> {
    if args.len() > 1 {
        huh(state, client, "extra parameters ignored");
    }
    let props = state.props;
    let size = |n: i32| usize::try_from(n).unwrap_or(0);
    state.send(
        client,
        Reply::Connect {
            width: size(props.width),
            height: size(props.height),
            cell_width: size(props.cell_width),
            cell_height: size(props.cell_height),
        },
    );
    if let Some(c) = state.clients.get_mut(client) {
        c.state = ClientState::Active;
    }
    Ok(())
}

/// `bye`: the connection is closed once this line is done.
pub(super) fn bye(state: &mut ServerState, client: ClientId, _args: &[String]) -> Result<(), CommandError> {
    if let Some(c) = state.clients.get_mut(client) {
        c.state = ClientState::Gone;
    }
    Ok(())
}

/// `client_set -name <name>`
pub(super) fn client_set(state: &mut ServerState, client: ClientId, args: &[String]) -> Result<(), CommandError> {
    require_active(state, client, args)?;
    if args.len() != 3 {
        huh(state, client, "Usage: client_set -name <name>");
        return Ok(());
    }

    let mut i = 1;
    while i < args.len() {
        let option = option_name(&args[i]);
        if option == "name" {
            i += 1;
            match args.get(i).filter(|name| !name.is_empty()) {
                Some(name) => {
                    let name = name.clone();
                    if let Some(c) = state.clients.get_mut(client) {
                        c.name = Some(name);
                    }
                    success(state, client);
                    i += 1;
                },
                None => huh(state, client, format!("internal error: no parameter #{i}")),
            }
        } else {
            let option = option.to_owned();
            huh(state, client, format!("invalid parameter ({option})"));
        }
        i += 1;
    }
    Ok(())
}

/// `client_add_key [-exclusively|-shared] {<key>}+`
pub(super) fn client_add_key(
    state: &mut ServerState,
    client: ClientId,
    args: &[String],
) -> Result<(), CommandError> {
    require_active(state, client, args)?;
    if args.len() < 2 {
        huh(state, client, "Usage: client_add_key [-exclusively|-shared] {<key>}+");
        return Ok(());
    }

    let mut keys = &args[1..];
    let mut exclusive = false;
    if let Some(flag) = keys.first().filter(|a| a.starts_with('-')) {
        match flag.as_str() {
            "-shared" => exclusive = false,
            "-exclusively" => exclusive = true,
            other => {
                let message = format!("Invalid option: {other}");
                huh(state, client, message);
            },
        }
        keys = &keys[1..];
    }

    for key in keys {
        if let Err(e) = state.keys.reserve(key, exclusive, Some(client)) {
            tracing::debug!(client = client.0, error = %e, "key reservation refused");
            huh(state, client, format!("Could not reserve key \"{key}\""));
        }
    }
    success(state, client);
    Ok(())
}

/// `client_del_key {<key>}+`
pub(super) fn client_del_key(
    state: &mut ServerState,
    client: ClientId,
    args: &[String],
) -> Result<(), CommandError> {
    require_active(state, client, args)?;
    if args.len() < 2 {
        huh(state, client, "Usage: client_del_key {<key>}+");
        return Ok(());
    }
    for key in &args[1..] {
        state.keys.release(key, Some(client));
    }
    success(state, client);
    Ok(())
}

/// `backlight {on|off|toggle|blink|flash}` for all of the client's screens.
pub(super) fn backlight(state: &mut ServerState, client: ClientId, args: &[String]) -> Result<(), CommandError> {
    require_active(state, client, args)?;
    let [_, mode] = args else {
        huh(state, client, "Usage: backlight {on|off|toggle|blink|flash}");
        return Ok(());
    };
    if let Some(c) = state.clients.get_mut(client) {
        c.backlight.apply(mode, false);
    }
    success(state, client);
    Ok(())
}
