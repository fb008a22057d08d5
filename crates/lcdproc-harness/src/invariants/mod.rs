//! Server invariants checked during simulation.
//!
//! The harness captures a [`ServerSnapshot`] after each step and checks it
//! against every [`ServerInvariant`]: sessions and clients stay in step,
//! client screens never outlive their session, screen ids stay unique per
//! owner, the shown screen is scheduled, and frames match the display.
//!
//! ```ignore
//! let snapshot = server.snapshot();
//! check_invariants(&snapshot)?;
//! assert_invariants(&snapshot, "after accept");
//! ```

mod checks;
mod snapshot;

use std::fmt;

pub use snapshot::{ScreenSnapshot, ServerSnapshot};

/// A property every reachable server state has.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerInvariant {
    /// Open connections, driver sessions and clients are the same set.
    SessionsMatchClients,
    /// No client screen outlives its session.
    ScreensHaveLiveOwners,
    /// One screen per owner and id.
    UniqueScreenIds,
    /// The screen being shown is in the screen list.
    CurrentScreenListed,
    /// Every frame has the display's rows and columns.
    FrameFitsDisplay,
}

impl ServerInvariant {
    /// Every invariant, in checking order.
    pub const ALL: [Self; 5] = [
        Self::SessionsMatchClients,
        Self::ScreensHaveLiveOwners,
        Self::UniqueScreenIds,
        Self::CurrentScreenListed,
        Self::FrameFitsDisplay,
    ];

    /// Check this invariant against a snapshot.
    pub fn check(self, state: &ServerSnapshot) -> Result<(), Violation> {
        let result = match self {
            Self::SessionsMatchClients => checks::sessions_match_clients(state),
            Self::ScreensHaveLiveOwners => checks::screens_have_live_owners(state),
            Self::UniqueScreenIds => checks::unique_screen_ids(state),
            Self::CurrentScreenListed => checks::current_screen_listed(state),
            Self::FrameFitsDisplay => checks::frame_fits_display(state),
        };
        result.map_err(|message| Violation { invariant: self, message })
    }
}

impl fmt::Display for ServerInvariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A broken invariant and what broke it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// The invariant that does not hold.
    pub invariant: ServerInvariant,
    /// What the snapshot showed.
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.invariant, self.message)
    }
}

impl std::error::Error for Violation {}

/// Check every invariant. Returns all violations, not just the first.
pub fn check_invariants(state: &ServerSnapshot) -> Result<(), Vec<Violation>> {
    let violations: Vec<_> = ServerInvariant::ALL.iter().filter_map(|inv| inv.check(state).err()).collect();
    if violations.is_empty() { Ok(()) } else { Err(violations) }
}

/// Check every invariant and fail the test with `context` if one breaks.
#[allow(clippy::panic, reason = "Test assertion helper")]
pub fn assert_invariants(state: &ServerSnapshot, context: &str) {
    if let Err(violations) = check_invariants(state) {
        let messages: Vec<_> = violations.iter().map(ToString::to_string).collect();
        panic!("Invariant violation {context}:\n  {}", messages.join("\n  "));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_server_holds_every_invariant() {
        assert_eq!(check_invariants(&ServerSnapshot::empty()), Ok(()));
    }

    #[test]
    fn leaked_client_breaks_two_invariants() {
        let mut state = ServerSnapshot::empty();
        state.clients = 1;
        state.screens = vec![ScreenSnapshot { owner: Some(9), id: "s".into() }];

        let violations = check_invariants(&state).unwrap_err();
        let broken: Vec<_> = violations.iter().map(|v| v.invariant).collect();
        assert_eq!(broken, [ServerInvariant::SessionsMatchClients, ServerInvariant::ScreensHaveLiveOwners]);
        assert!(violations[1].to_string().starts_with("ScreensHaveLiveOwners: screen s"));
    }
}
