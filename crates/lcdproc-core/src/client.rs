//! Connected clients.
//!
//! The registry only holds per-client attributes. Screens live in the
//! [`ScreenList`](crate::screenlist::ScreenList), menus in the
//! [`MenuSystem`](crate::menu::MenuSystem) and key reservations in
//! [`KeyReservations`](crate::input::KeyReservations), each tagged with the
//! owning [`ClientId`], so tearing a client down is a sweep over those stores.

use std::{collections::BTreeMap, fmt};

use crate::screen::{Backlight, Switch};

/// Stable client identifier, equal to the transport session id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClientId(pub u64);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Connection lifecycle.
///
/// ```text
/// New --hello--> Active --bye--> Gone
///  |                               ^
///  +------------bye----------------+
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ClientState {
    /// Connected, no `hello` yet
    #[default]
    New,
    /// Handshake done, commands accepted
    Active,
    /// Said `bye`; to be destroyed
    Gone,
}

/// Per-client state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Client {
    /// Identifier
    pub id: ClientId,
    /// Lifecycle state
    pub state: ClientState,
    /// Name set with `client_set -name`
    pub name: Option<String>,
    /// Backlight override for all of this client's screens
    pub backlight: Backlight,
    /// Heartbeat override for all of this client's screens
    pub heartbeat: Switch,
}

impl Client {
    /// A freshly accepted client.
    pub fn new(id: ClientId) -> Self {
        Self {
            id,
            state: ClientState::New,
            name: None,
            backlight: Backlight::OPEN,
            heartbeat: Switch::Open,
        }
    }

    /// Whether commands other than the handshake are accepted.
    pub fn is_active(&self) -> bool {
        self.state == ClientState::Active
    }
}

/// All connected clients, ordered by id.
#[derive(Debug, Clone, Default)]
pub struct ClientRegistry {
    clients: BTreeMap<ClientId, Client>,
}

impl ClientRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new client. Replaces any stale entry with the same id.
    pub fn add(&mut self, id: ClientId) -> &mut Client {
        let client = self.clients.entry(id).or_insert_with(|| Client::new(id));
        *client = Client::new(id);
        client
    }

    /// Remove a client, returning its last state.
    pub fn remove(&mut self, id: ClientId) -> Option<Client> {
        self.clients.remove(&id)
    }

    /// Look up a client.
    pub fn get(&self, id: ClientId) -> Option<&Client> {
        self.clients.get(&id)
    }

    /// Look up a client for modification.
    pub fn get_mut(&mut self, id: ClientId) -> Option<&mut Client> {
        self.clients.get_mut(&id)
    }

    /// Number of connected clients.
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// True when no client is connected.
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Iterate clients in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Client> {
        self.clients.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle() {
        let mut registry = ClientRegistry::new();
        let client = registry.add(ClientId(7));
        assert_eq!(client.state, ClientState::New);
        assert!(!client.is_active());

        client.state = ClientState::Active;
        assert!(registry.get(ClientId(7)).is_some_and(Client::is_active));
        assert_eq!(registry.len(), 1);

        let gone = registry.remove(ClientId(7)).unwrap();
        assert_eq!(gone.id, ClientId(7));
        assert!(registry.is_empty());
    }

    #[test]
    fn overrides_start_open() {
        let client = Client::new(ClientId(1));
        assert!(client.backlight.is_open());
        assert_eq!(client.heartbeat, Switch::Open);
    }
}
