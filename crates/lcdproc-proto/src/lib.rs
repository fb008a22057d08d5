//! LCDproc wire protocol.
//!
//! The client protocol is line oriented: every command is one line of
//! whitespace separated tokens, and every reply is one line of text. This
//! crate holds the pieces that only deal with bytes and strings, with no
//! knowledge of screens or clients.
//!
//! # Components
//!
//! - [`tokenize`]: split one command line into arguments (quoting, escapes)
//! - [`RingBuffer`]: fixed-capacity byte ring with line extraction
//! - [`LineReader`]: per-connection reassembly of lines from a byte stream
//! - [`Reply`]: everything the server ever writes back to a client

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod line;
mod parse;
mod reply;
mod ring;

pub use line::{LineError, LineReader, Received};
pub use parse::{MAX_ARGUMENTS, ParseError, tokenize};
pub use reply::{MenuEventKind, Reply};
pub use ring::{RingBuffer, RingFull};

/// Server release reported in the `connect` handshake.
pub const SERVER_VERSION: &str = "0.5.9";

/// Protocol revision reported in the `connect` handshake.
pub const PROTOCOL_VERSION: &str = "0.3";

/// Default TCP port of the LCDproc server.
pub const DEFAULT_PORT: u16 = 13666;

/// Default bind address of the LCDproc server.
pub const DEFAULT_BIND: &str = "127.0.0.1";

/// Maximum size of one client message, in bytes.
pub const MAX_MESSAGE: usize = 8192;
