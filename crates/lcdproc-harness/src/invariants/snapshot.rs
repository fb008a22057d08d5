//! Observable server state for invariant checking.
//!
//! Invariants run against a snapshot rather than the live server so a
//! check sees one consistent moment.

use std::collections::BTreeSet;

use lcdproc_core::env::Environment;
use lcdproc_server::ServerDriver;

/// One screen as the scheduler sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenSnapshot {
    /// Owning session, `None` for server screens.
    pub owner: Option<u64>,
    /// Screen id.
    pub id: String,
}

/// Snapshot of the whole server.
#[derive(Debug, Clone, Default)]
pub struct ServerSnapshot {
    /// Sessions the runtime still holds a socket for.
    pub connections: BTreeSet<u64>,
    /// Sessions the driver has a line reader for.
    pub driver_sessions: usize,
    /// Clients in the registry.
    pub clients: usize,
    /// Every screen in the list.
    pub screens: Vec<ScreenSnapshot>,
    /// Screen being shown.
    pub current: Option<ScreenSnapshot>,
    /// Whether the menu is open.
    pub menu_open: bool,
    /// Display columns.
    pub width: i32,
    /// Display rows.
    pub height: i32,
    /// Last frame the display showed, if any.
    pub frame: Option<Vec<String>>,
}

impl ServerSnapshot {
    /// An idle server with nothing connected.
    pub fn empty() -> Self {
        Self { width: 20, height: 4, ..Self::default() }
    }

    /// Capture the driver's state alongside the runtime's open connections.
    pub fn capture<E: Environment>(
        driver: &ServerDriver<E>,
        connections: impl IntoIterator<Item = u64>,
        frame: Option<Vec<String>>,
    ) -> Self {
        let state = driver.state();
        let screen = |(owner, id): (Option<lcdproc_core::ClientId>, &str)| ScreenSnapshot {
            owner: owner.map(|c| c.0),
            id: id.to_owned(),
        };
        let props = state.props();

        Self {
            connections: connections.into_iter().collect(),
            driver_sessions: driver.session_count(),
            clients: state.client_count(),
            screens: state.screens().map(screen).collect(),
            current: state.current_screen().map(screen),
            menu_open: state.menu_open(),
            width: props.width,
            height: props.height,
            frame,
        }
    }
}
