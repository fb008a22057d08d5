//! Server to client messages.
//!
//! Every variant renders as exactly one line, newline included, so a reply
//! can be written to the socket as-is.

use std::fmt;

use bytes::Bytes;

use crate::{PROTOCOL_VERSION, SERVER_VERSION};

/// Kind of a menu interaction reported back to the item's owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MenuEventKind {
    /// An action item was chosen
    Select,
    /// An item's value was committed
    Update,
    /// A slider moved up
    Plus,
    /// A slider moved down
    Minus,
    /// An item became the open menu item
    Enter,
    /// An item stopped being the open menu item
    Leave,
}

impl MenuEventKind {
    /// Name used on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Select => "select",
            Self::Update => "update",
            Self::Plus => "plus",
            Self::Minus => "minus",
            Self::Enter => "enter",
            Self::Leave => "leave",
        }
    }

    /// Whether events of this kind carry the item's value.
    pub fn carries_value(self) -> bool {
        matches!(self, Self::Update | Self::Plus | Self::Minus)
    }
}

impl fmt::Display for MenuEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line sent from the server to a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Command acknowledged
    Success,

    /// Command failed; the message explains why
    Huh(String),

    /// Handshake answer to `hello`
    Connect {
        /// Display width in characters
        width: usize,
        /// Display height in characters
        height: usize,
        /// Character cell width in pixels
        cell_width: usize,
        /// Character cell height in pixels
        cell_height: usize,
    },

    /// The client's screen became visible
    Listen(String),

    /// The client's screen stopped being visible
    Ignore(String),

    /// A key reserved by the client was pressed
    Key(String),

    /// A menu item owned by the client was used
    MenuEvent {
        /// What happened
        kind: MenuEventKind,
        /// Item id
        id: String,
        /// Current value, for update/plus/minus
        value: Option<String>,
    },

    /// Free-form line for replies with legacy wording
    Raw(String),
}

impl Reply {
    /// Shorthand for [`Reply::Huh`].
    pub fn huh(message: impl Into<String>) -> Self {
        Self::Huh(message.into())
    }

    /// Whether this reply reports an error.
    pub fn is_error(&self) -> bool {
        match self {
            Self::Huh(_) => true,
            Self::Raw(line) => line.starts_with("huh?"),
            _ => false,
        }
    }

    /// Encode the reply for the socket.
    pub fn to_bytes(&self) -> Bytes {
        Bytes::from(self.to_string())
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => writeln!(f, "success"),
            Self::Huh(msg) => writeln!(f, "huh? {msg}"),
            Self::Connect { width, height, cell_width, cell_height } => writeln!(
                f,
                "connect LCDproc {SERVER_VERSION} protocol {PROTOCOL_VERSION} lcd wid {width} \
                 hgt {height} cellwid {cell_width} cellhgt {cell_height}"
            ),
            Self::Listen(id) => writeln!(f, "listen {id}"),
            Self::Ignore(id) => writeln!(f, "ignore {id}"),
            Self::Key(key) => writeln!(f, "key {key}"),
            Self::MenuEvent { kind, id, value: Some(value) } => {
                writeln!(f, "menuevent {kind} {id} {value}")
            },
            Self::MenuEvent { kind, id, value: None } => writeln!(f, "menuevent {kind} {id}"),
            Self::Raw(line) => writeln!(f, "{line}"),
        }
    }
}
