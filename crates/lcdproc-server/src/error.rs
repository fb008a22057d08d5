//! Server error types.

use std::fmt;

use crate::{config::ConfigError, drivers::DriverError};

/// Errors that can occur in the server.
#[derive(Debug)]
pub enum ServerError {
    /// Configuration error (unreadable file, bad bind address, etc.).
    ///
    /// These are fatal errors that prevent server startup. Fix the
    /// configuration and restart.
    Config(String),

    /// Transport/network error (bind failure, I/O error, etc.).
    ///
    /// Fatal while starting up. Once running, only the affected connection
    /// is dropped.
    Transport(String),

    /// Protocol error (client data the server cannot handle).
    ///
    /// Fatal for that connection, but the server keeps serving other
    /// clients.
    Protocol(String),

    /// Internal error (unexpected state, logic bug, etc.).
    ///
    /// Should never happen in a correct implementation. Indicates a bug.
    Internal(String),

    /// Display driver error.
    ///
    /// A configured driver could not be loaded. Fatal at startup.
    Driver(DriverError),
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration error: {msg}"),
            Self::Transport(msg) => write!(f, "transport error: {msg}"),
            Self::Protocol(msg) => write!(f, "protocol error: {msg}"),
            Self::Internal(msg) => write!(f, "internal error: {msg}"),
            Self::Driver(err) => write!(f, "driver error: {err}"),
        }
    }
}

impl std::error::Error for ServerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Driver(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DriverError> for ServerError {
    fn from(err: DriverError) -> Self {
        Self::Driver(err)
    }
}

impl From<ConfigError> for ServerError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<std::io::Error> for ServerError {
    fn from(err: std::io::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use super::*;

    #[test]
    fn display_names_the_layer() {
        let err = ServerError::Config("no such file".into());
        assert_eq!(err.to_string(), "configuration error: no such file");

        let err: ServerError = std::io::Error::other("refused").into();
        assert_eq!(err.to_string(), "transport error: refused");
    }

    #[test]
    fn driver_error_is_the_source() {
        let err: ServerError = DriverError::Unknown("lcdm001".into()).into();
        assert!(err.source().is_some());
        assert_eq!(err.to_string(), "driver error: unknown driver \"lcdm001\"");
    }
}
