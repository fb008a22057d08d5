//! Client menu commands.
//!
//! Each client gets one menu below the main menu, titled with the client's
//! name. Option errors are reported one `huh?` line each, after which the
//! command still ends with a single `success`.

use lcdproc_core::{ClientId, menu::OptionError};

use super::{CommandError, huh, require_active, success};
use crate::state::ServerState;

fn report(state: &mut ServerState, client: ClientId, errors: Vec<OptionError>) {
    for error in errors {
        huh(state, client, error.to_string());
    }
    success(state, client);
}

/// `menu_add_item <menuid> <newitemid> <type> [<text>] [<option>]+`
pub(super) fn menu_add_item(
    state: &mut ServerState,
    client: ClientId,
    args: &[String],
) -> Result<(), CommandError> {
    require_active(state, client, args)?;
    let Some(name) = state.clients.get(client).and_then(|c| c.name.clone()) else {
        huh(state, client, "You need to give your client a name first");
        return Ok(());
    };
    if args.len() < 4 {
        huh(state, client, "Usage: menu_add_item <menuid> <newitemid> <type> [<text>] [<option>]+");
        return Ok(());
    }

    let (text, options) = match args.get(4) {
        Some(text) if !text.starts_with('-') => (text.as_str(), &args[5..]),
        _ => ("", &args[4..]),
    };
    let added = state.menus.add_item(client, Some(name.as_str()), &args[1], &args[2], &args[3], text);
    if let Err(e) = added {
        huh(state, client, e.to_string());
        return Ok(());
    }

    if options.is_empty() {
        success(state, client);
        return Ok(());
    }
    match state.menus.set_item(client, &args[2], options) {
        Ok(errors) => report(state, client, errors),
        Err(e) => huh(state, client, e.to_string()),
    }
    Ok(())
}

/// `menu_del_item [ignored] <itemid>`
pub(super) fn menu_del_item(
    state: &mut ServerState,
    client: ClientId,
    args: &[String],
) -> Result<(), CommandError> {
    require_active(state, client, args)?;
    let id = match args {
        [_, id] | [_, _, id] => id,
        _ => {
            huh(state, client, "Usage: menu_del_item [ignored] <itemid>");
            return Ok(());
        },
    };
    match state.menus.remove_item(client, id) {
        Ok(()) => success(state, client),
        Err(e) => huh(state, client, e.to_string()),
    }
    Ok(())
}

/// `menu_set_item <menuid> <itemid> {<option>}+`
pub(super) fn menu_set_item(
    state: &mut ServerState,
    client: ClientId,
    args: &[String],
) -> Result<(), CommandError> {
    require_active(state, client, args)?;
    if args.len() < 4 {
        huh(state, client, "Usage: menu_set_item  <itemid> {<option>}+");
        return Ok(());
    }
    match state.menus.set_item(client, &args[2], &args[3..]) {
        Ok(errors) => report(state, client, errors),
        Err(e) => huh(state, client, e.to_string()),
    }
    Ok(())
}

/// `menu_goto <menuid> [<predecessor_id>]`
pub(super) fn menu_goto(state: &mut ServerState, client: ClientId, args: &[String]) -> Result<(), CommandError> {
    require_active(state, client, args)?;
    let (id, predecessor) = match args {
        [_, id] => (id, None),
        [_, id, predecessor] => (id, Some(predecessor.as_str())),
        _ => {
            huh(state, client, "Usage: menu_goto <menuid> [<predecessor_id>]");
            return Ok(());
        },
    };
    match state.menus.goto(client, id, predecessor) {
        Ok(errors) => report(state, client, errors),
        Err(e) => huh(state, client, e.to_string()),
    }
    Ok(())
}

/// `menu_set_main <menuid>`
pub(super) fn menu_set_main(
    state: &mut ServerState,
    client: ClientId,
    args: &[String],
) -> Result<(), CommandError> {
    require_active(state, client, args)?;
    let [_, id] = args else {
        huh(state, client, "Usage: menu_set_main <menuid>");
        return Ok(());
    };
    match state.menus.set_main(client, id) {
        Ok(()) => success(state, client),
        Err(e) => huh(state, client, e.to_string()),
    }
    Ok(())
}
