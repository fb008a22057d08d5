//! LCDproc display server.
//!
//! Clients connect over TCP, describe screens of widgets with a line based
//! protocol, and the server schedules those screens onto one character
//! display through its drivers.
//!
//! # Architecture
//!
//! This crate provides production "glue" around [`lcdproc_core`]'s I/O-free
//! model. The [`ServerDriver`] follows the Sans-IO pattern: it turns
//! [`ServerEvent`]s (connections, bytes, clock ticks) into
//! [`ServerAction`]s (replies, closes, log lines). [`Server`] executes the
//! actions with tokio sockets and paces the main loop with the system
//! clock. All domain state is owned by the one task running [`Server::run`].
//!
//! # Components
//!
//! - [`ServerDriver`]: Action-based orchestrator (pure logic, no I/O)
//! - [`ServerState`]: Clients, screens, keys, menus, renderer and drivers
//! - [`Server`]: Production runtime that executes ServerDriver actions
//! - [`TcpTransport`]: Listening socket and per-session reader/writer tasks
//! - [`ConfigFile`] / [`ServerConfig`]: `LCDd.conf` parsing and typed settings
//! - [`drivers`]: Built-in display drivers
//! - [`SystemEnv`]: Production environment (real time)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod commands;
pub mod config;
mod driver;
pub mod drivers;
mod error;
pub mod serverscreen;
pub mod settings;
mod state;
mod system_env;
mod transport;

use std::collections::{HashMap, VecDeque};

pub use commands::{COMMANDS, CommandError};
pub use config::{ConfigError, ConfigFile};
pub use driver::{LogLevel, ServerAction, ServerDriver, ServerEvent};
pub use error::ServerError;
use lcdproc_core::{DriverSet, env::Environment};
pub use settings::ServerConfig;
pub use state::ServerState;
pub use system_env::SystemEnv;
use tokio::sync::mpsc;
pub use transport::{Session, TcpTransport};

/// Transport events buffered between socket tasks and the main loop.
const EVENT_QUEUE: usize = 1024;

/// Production LCDproc server.
///
/// Wraps `ServerDriver` with the TCP transport and system environment.
pub struct Server {
    /// The action-based server driver
    driver: ServerDriver<SystemEnv>,
    /// Listening socket
    transport: TcpTransport,
    /// Environment
    env: SystemEnv,
}

impl Server {
    /// Bind the listening socket and set up the display.
    pub async fn bind(config: &ServerConfig, drivers: DriverSet) -> Result<Self, ServerError> {
        let env = SystemEnv::new();
        let driver = ServerDriver::new(env.clone(), config, drivers)?;
        let transport = TcpTransport::bind(&config.bind, config.port).await?;

        Ok(Self { driver, transport, env })
    }

    /// Run the server until Ctrl-C, then show the goodbye screen.
    pub async fn run(self) -> Result<(), ServerError> {
        tracing::info!("Server starting on {}", self.transport.local_addr()?);

        let Self { mut driver, transport, env } = self;
        let (events_tx, mut events) = mpsc::channel(EVENT_QUEUE);
        let mut sessions: HashMap<u64, Session> = HashMap::new();
        let mut next_session_id: u64 = 1;

        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);

        loop {
            let event = tokio::select! {
                accepted = transport.accept() => match accepted {
                    Ok((stream, peer)) => {
                        let session_id = next_session_id;
                        next_session_id += 1;
                        tracing::debug!("New connection from {}: {}", peer, session_id);
                        sessions.insert(session_id, Session::spawn(session_id, stream, events_tx.clone()));
                        ServerEvent::ConnectionAccepted { session_id }
                    },
                    Err(e) => {
                        tracing::error!("Accept error: {}", e);
                        continue;
                    },
                },
                Some(event) = events.recv() => event,
                () = env.sleep(driver.sleep_time()) => ServerEvent::Tick,
                result = &mut shutdown => {
                    if let Err(e) = result {
                        tracing::error!("Signal handler error: {}", e);
                    }
                    break;
                },
            };

            dispatch(&mut driver, &mut sessions, event);
        }

        let actions = driver.process_event(ServerEvent::Shutdown)?;
        for event in execute_actions(actions, &mut sessions) {
            tracing::debug!("Ignoring {:?} during shutdown", event);
        }
        Ok(())
    }

    /// Local address the server is bound to.
    pub fn local_addr(&self) -> Result<std::net::SocketAddr, ServerError> {
        self.transport.local_addr()
    }
}

/// Feed one event to the driver, then the disconnects its actions caused.
fn dispatch<E: Environment>(
    driver: &mut ServerDriver<E>,
    sessions: &mut HashMap<u64, Session>,
    event: ServerEvent,
) {
    let mut pending = VecDeque::from([event]);
    while let Some(event) = pending.pop_front() {
        if let ServerEvent::ConnectionClosed { session_id, .. } = &event
            && let Some(session) = sessions.remove(session_id)
        {
            session.close();
        }

        match driver.process_event(event) {
            Ok(actions) => pending.extend(execute_actions(actions, sessions)),
            Err(e) => tracing::warn!("Event processing error: {}", e),
        }
    }
}

/// Execute server actions. Returns a `ConnectionClosed` event for every
/// session dropped because its replies could not be queued.
fn execute_actions(actions: Vec<ServerAction>, sessions: &mut HashMap<u64, Session>) -> Vec<ServerEvent> {
    let mut dropped = Vec::new();
    for action in actions {
        match action {
            ServerAction::SendToSession { session_id, reply } => {
                let Some(session) = sessions.get(&session_id) else {
                    tracing::warn!("SendToSession: session {} not found", session_id);
                    continue;
                };
                if let Err(e) = session.send(reply.to_bytes()) {
                    tracing::warn!(session_id, error = %e, "dropping session");
                    if let Some(session) = sessions.remove(&session_id) {
                        session.close();
                    }
                    dropped.push(ServerEvent::ConnectionClosed { session_id, reason: e.to_string() });
                }
            },

            ServerAction::CloseConnection { session_id, reason } => {
                tracing::info!("Closing connection {}: {}", session_id, reason);
                if let Some(session) = sessions.remove(&session_id) {
                    session.close();
                }
            },

            ServerAction::Log { level, message, .. } => match level {
                LogLevel::Debug => tracing::debug!("{}", message),
                LogLevel::Info => tracing::info!("{}", message),
                LogLevel::Warn => tracing::warn!("{}", message),
                LogLevel::Error => tracing::error!("{}", message),
            },
        }
    }
    dropped
}
