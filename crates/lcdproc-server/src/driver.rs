//! Server driver.
//!
//! Ties together line reassembly per connection, command execution against
//! [`ServerState`] and the paced process and render phases. The driver does
//! no I/O: the runtime feeds it [`ServerEvent`]s and executes the
//! [`ServerAction`]s it returns.

use std::{collections::HashMap, time::Duration};

use bytes::Bytes;
use lcdproc_core::{ClientId, DriverSet, Pacer, env::Environment};
use lcdproc_proto::{LineError, LineReader, Reply};

use crate::{error::ServerError, settings::ServerConfig, state::ServerState};

/// Reply sent before dropping a client that floods the server.
const TOO_MUCH_DATA: &str = "Too much data received... quiet down!";

/// Most render strokes run for one tick event, bounding catch-up work.
const MAX_STROKES_PER_TICK: usize = 32;

/// Events that the server driver processes.
///
/// These are produced by the external runtime (simulation or production).
#[derive(Debug, Clone)]
pub enum ServerEvent {
    /// A new connection was accepted
    ConnectionAccepted {
        /// Unique connection ID assigned by the runtime
        session_id: u64,
    },

    /// Bytes arrived on a connection
    DataReceived {
        /// Connection that sent the data
        session_id: u64,
        /// Raw bytes, not necessarily whole lines
        data: Bytes,
    },

    /// A connection was closed (by peer or error)
    ConnectionClosed {
        /// Connection that was closed
        session_id: u64,
        /// Reason for closure
        reason: String,
    },

    /// Wake-up of the main loop; runs whichever phases are due
    Tick,

    /// The server is stopping
    Shutdown,
}

/// Actions that the server driver produces.
///
/// These are executed by runtime-specific code (production or simulation).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerAction {
    /// Send one reply line to a session
    SendToSession {
        /// Target session ID
        session_id: u64,
        /// Reply to send
        reply: Reply,
    },

    /// Close a connection
    CloseConnection {
        /// Session to close
        session_id: u64,
        /// Reason for closure
        reason: String,
    },

    /// Log a message (for debugging/monitoring)
    Log {
        /// Log level
        level: LogLevel,
        /// Message to log
        message: String,
        /// Time since the driver started
        timestamp: Duration,
    },
}

/// Log levels for server actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug information
    Debug,
    /// Informational message
    Info,
    /// Warning
    Warn,
    /// Error
    Error,
}

/// Action-based server driver.
pub struct ServerDriver<E: Environment> {
    env: E,
    started: E::Instant,
    last: E::Instant,
    pacer: Pacer,
    /// Line reassembly per session
    readers: HashMap<u64, LineReader>,
    state: ServerState,
}

impl<E: Environment> ServerDriver<E> {
    /// Create a driver rendering on `drivers`.
    pub fn new(env: E, config: &ServerConfig, drivers: DriverSet) -> Result<Self, ServerError> {
        let state = ServerState::new(config, drivers)?;
        let now = env.now();
        Ok(Self {
            env,
            started: now,
            last: now,
            pacer: Pacer::new(config.frame_interval),
            readers: HashMap::new(),
            state,
        })
    }

    /// Process a server event and return actions to execute.
    ///
    /// This is the main entry point for the server driver.
    pub fn process_event(&mut self, event: ServerEvent) -> Result<Vec<ServerAction>, ServerError> {
        match event {
            ServerEvent::ConnectionAccepted { session_id } => self.handle_connection_accepted(session_id),
            ServerEvent::DataReceived { session_id, data } => self.handle_data_received(session_id, &data),
            ServerEvent::ConnectionClosed { session_id, reason } => {
                Ok(self.handle_connection_closed(session_id, &reason))
            },
            ServerEvent::Tick => Ok(self.handle_tick()),
            ServerEvent::Shutdown => Ok(self.handle_shutdown()),
        }
    }

    /// How long the runtime may sleep before the next [`ServerEvent::Tick`].
    pub fn sleep_time(&self) -> Duration {
        let elapsed = self.env.now() - self.last;
        self.pacer.sleep_time().saturating_sub(elapsed)
    }

    /// The server context, for inspection.
    pub fn state(&self) -> &ServerState {
        &self.state
    }

    /// Number of open sessions.
    pub fn session_count(&self) -> usize {
        self.readers.len()
    }

    fn log(&self, level: LogLevel, message: String) -> ServerAction {
        ServerAction::Log { level, message, timestamp: self.env.now() - self.started }
    }

    /// Queued replies as send actions.
    fn drain_outbox(&mut self, actions: &mut Vec<ServerAction>) {
        actions.extend(
            self.state
                .take_outbox()
                .into_iter()
                .map(|(client, reply)| ServerAction::SendToSession { session_id: client.0, reply }),
        );
    }

    fn handle_connection_accepted(&mut self, session_id: u64) -> Result<Vec<ServerAction>, ServerError> {
        if self.readers.contains_key(&session_id) {
            return Err(ServerError::Internal(format!("session {session_id} already registered")));
        }
        self.readers.insert(session_id, LineReader::new());
        self.state.connect(ClientId(session_id));
        Ok(vec![self.log(LogLevel::Info, format!("connection {session_id} accepted"))])
    }

    fn handle_data_received(&mut self, session_id: u64, data: &[u8]) -> Result<Vec<ServerAction>, ServerError> {
        let client = ClientId(session_id);
        let reader = self
            .readers
            .get_mut(&session_id)
            .ok_or_else(|| ServerError::Internal(format!("data for unknown session {session_id}")))?;

        let mut actions = Vec::new();
        let received = match reader.feed(data) {
            Ok(received) => received,
            Err(LineError::TooMuchData { received }) => {
                actions.push(ServerAction::SendToSession { session_id, reply: Reply::huh(TOO_MUCH_DATA) });
                actions.push(self.log(
                    LogLevel::Warn,
                    format!("client {session_id} sent {received} bytes at once, dropping it"),
                ));
                self.close(session_id, "too much data", &mut actions);
                return Ok(actions);
            },
        };
        if received.desync {
            actions.push(self.log(
                LogLevel::Warn,
                format!("client {session_id} overflowed the line buffer, input discarded"),
            ));
        }

        for line in &received.lines {
            self.state.execute(client, line);
            if self.state.is_gone(client) {
                break;
            }
        }
        self.drain_outbox(&mut actions);

        if self.state.is_gone(client) {
            self.close(session_id, "client said bye", &mut actions);
        }
        Ok(actions)
    }

    /// Drop the client and ask the runtime to close the socket.
    fn close(&mut self, session_id: u64, reason: &str, actions: &mut Vec<ServerAction>) {
        self.readers.remove(&session_id);
        self.state.destroy_client(ClientId(session_id));
        self.drain_outbox(actions);
        actions.push(ServerAction::CloseConnection { session_id, reason: reason.to_owned() });
    }

    fn handle_connection_closed(&mut self, session_id: u64, reason: &str) -> Vec<ServerAction> {
        if self.readers.remove(&session_id).is_none() {
            return Vec::new();
        }
        self.state.destroy_client(ClientId(session_id));

        let mut actions = Vec::new();
        self.drain_outbox(&mut actions);
        actions.push(self.log(LogLevel::Info, format!("connection {session_id} closed: {reason}")));
        actions
    }

    /// Run the phases the pacer says are due.
    fn handle_tick(&mut self) -> Vec<ServerAction> {
        let now = self.env.now();
        let elapsed = now - self.last;
        self.last = now;

        let mut strokes = self.pacer.advance(elapsed);
        let mut rendered = 0;
        loop {
            if strokes.process {
                self.state.poll_input();
            }
            if strokes.render {
                self.state.render();
                rendered += 1;
            }
            if !self.pacer.is_due() || rendered >= MAX_STROKES_PER_TICK {
                break;
            }
            strokes = self.pacer.advance(Duration::ZERO);
        }

        let mut actions = Vec::new();
        self.drain_outbox(&mut actions);
        actions
    }

    /// Show the farewell message and close every session.
    fn handle_shutdown(&mut self) -> Vec<ServerAction> {
        self.state.goodbye();

        let mut actions = vec![self.log(LogLevel::Info, "server shutting down".to_owned())];
        let mut sessions: Vec<u64> = self.readers.keys().copied().collect();
        sessions.sort_unstable();
        for session_id in sessions {
            self.readers.remove(&session_id);
            self.state.destroy_client(ClientId(session_id));
            actions.push(ServerAction::CloseConnection { session_id, reason: "server shutdown".to_owned() });
        }
        self.state.take_outbox();
        actions
    }
}
