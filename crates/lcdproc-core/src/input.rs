//! Key reservations and server navigation keys.
//!
//! Drivers report keys by name. A key is delivered to a client when the
//! client reserved it (shared reservations only while one of the client's
//! screens is current). Anything left over goes to the menu or to the
//! server's own screen navigation.

use crate::{client::ClientId, error::ReserveError};

/// One reservation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyReservation {
    /// Key name as reported by the driver
    pub key: String,
    /// Exclusive reservations are delivered regardless of the current screen
    pub exclusive: bool,
    /// Reserving client; `None` for the server itself
    pub owner: Option<ClientId>,
}

/// Every active key reservation.
///
/// # Invariants
///
/// - A key has at most one exclusive reservation
/// - Exclusive and shared reservations of the same key never coexist
#[derive(Debug, Clone, Default)]
pub struct KeyReservations {
    entries: Vec<KeyReservation>,
}

impl KeyReservations {
    /// No reservations.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve `key` for `owner`.
    pub fn reserve(
        &mut self,
        key: &str,
        exclusive: bool,
        owner: Option<ClientId>,
    ) -> Result<(), ReserveError> {
        let conflict = self.entries.iter().any(|kr| kr.key == key && (kr.exclusive || exclusive));
        if conflict {
            return Err(ReserveError::Conflict { key: key.to_owned() });
        }
        self.entries.push(KeyReservation { key: key.to_owned(), exclusive, owner });
        Ok(())
    }

    /// Drop the first reservation of `key` held by `owner`.
    pub fn release(&mut self, key: &str, owner: Option<ClientId>) -> Option<KeyReservation> {
        let index = self.entries.iter().position(|kr| kr.owner == owner && kr.key == key)?;
        Some(self.entries.remove(index))
    }

    /// Drop every reservation held by `owner`, returning how many there were.
    pub fn release_all(&mut self, owner: Option<ClientId>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|kr| kr.owner != owner);
        before - self.entries.len()
    }

    /// Who gets `key` while a screen of `current` is shown.
    pub fn find(&self, key: &str, current: Option<ClientId>) -> Option<&KeyReservation> {
        self.entries.iter().find(|kr| kr.key == key && (kr.exclusive || kr.owner == current))
    }

    /// All reservations in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &KeyReservation> {
        self.entries.iter()
    }
}

/// What a left-over key does when the menu does not want it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationAction {
    /// Flip automatic rotation
    ToggleRotate,
    /// Show the previous screen
    PrevScreen,
    /// Show the next screen
    NextScreen,
    /// Reserved, currently no effect
    ScrollUp,
    /// Reserved, currently no effect
    ScrollDown,
}

/// Key names bound to the server's screen navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationKeys {
    /// Toggles autorotation
    pub toggle_rotate: String,
    /// Previous screen
    pub prev_screen: String,
    /// Next screen
    pub next_screen: String,
    /// Scroll up
    pub scroll_up: String,
    /// Scroll down
    pub scroll_down: String,
}

impl Default for NavigationKeys {
    fn default() -> Self {
        Self {
            toggle_rotate: "Enter".into(),
            prev_screen: "Left".into(),
            next_screen: "Right".into(),
            scroll_up: "Up".into(),
            scroll_down: "Down".into(),
        }
    }
}

impl NavigationKeys {
    /// Map a key to its navigation action.
    pub fn action(&self, key: &str) -> Option<NavigationAction> {
        if key == self.toggle_rotate {
            Some(NavigationAction::ToggleRotate)
        } else if key == self.prev_screen {
            Some(NavigationAction::PrevScreen)
        } else if key == self.next_screen {
            Some(NavigationAction::NextScreen)
        } else if key == self.scroll_up {
            Some(NavigationAction::ScrollUp)
        } else if key == self.scroll_down {
            Some(NavigationAction::ScrollDown)
        } else {
            None
        }
    }
}
