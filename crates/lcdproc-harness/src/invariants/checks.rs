//! One check function per server invariant.
//!
//! Each function returns the first problem it finds as a message; the
//! caller attaches the invariant it belongs to.

use std::collections::BTreeSet;

use super::ServerSnapshot;

/// Runtime connections, driver sessions and registered clients agree.
///
/// A session that closed on one side but not the other leaks a client whose
/// screens stay in the rotation forever.
pub(super) fn sessions_match_clients(state: &ServerSnapshot) -> Result<(), String> {
    let connections = state.connections.len();
    if connections != state.driver_sessions || connections != state.clients {
        return Err(format!(
            "{} connections, {} driver sessions, {} clients",
            connections, state.driver_sessions, state.clients
        ));
    }
    Ok(())
}

/// Every client screen belongs to a connected session.
pub(super) fn screens_have_live_owners(state: &ServerSnapshot) -> Result<(), String> {
    let orphan = state
        .screens
        .iter()
        .find_map(|screen| screen.owner.filter(|owner| !state.connections.contains(owner)).map(|o| (screen, o)));
    match orphan {
        Some((screen, owner)) => Err(format!("screen {} owned by closed session {}", screen.id, owner)),
        None => Ok(()),
    }
}

/// Screen ids are unique per owner.
pub(super) fn unique_screen_ids(state: &ServerSnapshot) -> Result<(), String> {
    let mut seen = BTreeSet::new();
    for screen in &state.screens {
        if !seen.insert((screen.owner, screen.id.as_str())) {
            return Err(format!("screen {} of {:?} listed twice", screen.id, screen.owner));
        }
    }
    Ok(())
}

/// The current screen is one of the listed screens.
pub(super) fn current_screen_listed(state: &ServerSnapshot) -> Result<(), String> {
    match &state.current {
        Some(current) if !state.screens.contains(current) => {
            Err(format!("current screen {} of {:?} is not in the list", current.id, current.owner))
        },
        _ => Ok(()),
    }
}

/// Frames have exactly the display's geometry.
pub(super) fn frame_fits_display(state: &ServerSnapshot) -> Result<(), String> {
    let Some(frame) = &state.frame else {
        return Ok(());
    };
    if i32::try_from(frame.len()).ok() != Some(state.height) {
        return Err(format!("{} rows on a {} row display", frame.len(), state.height));
    }
    for (y, row) in frame.iter().enumerate() {
        let width = row.chars().count();
        if i32::try_from(width).ok() != Some(state.width) {
            return Err(format!("row {} is {} wide on a {} column display", y + 1, width, state.width));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invariants::ScreenSnapshot;

    fn screen(owner: Option<u64>, id: &str) -> ScreenSnapshot {
        ScreenSnapshot { owner, id: id.to_owned() }
    }

    #[test]
    fn leaked_client_is_caught() {
        let mut state = ServerSnapshot::empty();
        state.connections.insert(1);
        state.driver_sessions = 1;
        state.clients = 2;
        assert!(sessions_match_clients(&state).is_err());

        state.clients = 1;
        assert!(sessions_match_clients(&state).is_ok());
    }

    #[test]
    fn orphan_screen_is_caught() {
        let mut state = ServerSnapshot::empty();
        state.screens = vec![screen(None, "_server_"), screen(Some(3), "s1")];
        let message = screens_have_live_owners(&state).unwrap_err();
        assert!(message.contains("closed session 3"));

        state.connections.insert(3);
        assert!(screens_have_live_owners(&state).is_ok());
    }

    #[test]
    fn same_id_under_different_owners_is_fine() {
        let mut state = ServerSnapshot::empty();
        state.screens = vec![screen(Some(1), "s"), screen(Some(2), "s")];
        assert!(unique_screen_ids(&state).is_ok());

        state.screens.push(screen(Some(1), "s"));
        assert!(unique_screen_ids(&state).is_err());
    }

    #[test]
    fn current_screen_must_exist() {
        let mut state = ServerSnapshot::empty();
        state.current = Some(screen(Some(1), "gone"));
        assert!(current_screen_listed(&state).is_err());
    }

    #[test]
    fn frame_geometry_is_checked() {
        let mut state = ServerSnapshot::empty();
        state.width = 3;
        state.height = 2;
        state.frame = Some(vec!["abc".into(), "de".into()]);
        assert!(frame_fits_display(&state).is_err());

        state.frame = Some(vec!["abc".into(), "def".into()]);
        assert!(frame_fits_display(&state).is_ok());
    }
}
