//! Simulation server wrapper for testing with turmoil.
//!
//! `SimServer` wraps `ServerDriver` for integration with turmoil's
//! deterministic simulation. It uses [`SimEnv`] for time, a [`SimDisplay`]
//! as the only display driver, turmoil TCP for networking, and tracks
//! connection state in a `HashMap`.

use std::{collections::HashMap, io, time::Duration};

use bytes::Bytes;
use lcdproc_core::{DriverSet, env::Environment};
use lcdproc_proto::{MAX_MESSAGE, Reply};
use lcdproc_server::{LogLevel, ServerAction, ServerConfig, ServerDriver, ServerEvent};
use tokio::io::{AsyncReadExt, AsyncWriteExt, ReadHalf, WriteHalf};
use turmoil::net::{TcpListener, TcpStream};

use crate::{DisplayProbe, ServerSnapshot, SimDisplay, SimEnv};

/// Display geometry of every simulated server.
pub const SIM_DISPLAY_SIZE: (i32, i32) = (20, 4);

/// Connection state for a simulated connection.
struct SimConnectionState {
    /// Read half for client lines
    reader: ReadHalf<TcpStream>,
    /// Write half for replies
    writer: WriteHalf<TcpStream>,
}

/// Simulation server for testing with turmoil.
///
/// This server is designed for test-driven usage where tests explicitly
/// drive the server (accept, receive, run the clock) rather than having it
/// run autonomously.
pub struct SimServer {
    /// The action-based server driver
    driver: ServerDriver<SimEnv>,
    /// TCP listener for accepting connections
    listener: TcpListener,
    /// Connection state (`session_id` to state)
    connections: HashMap<u64, SimConnectionState>,
    /// Next connection ID
    next_session_id: u64,
    /// View of the display the driver draws on
    display: DisplayProbe,
    env: SimEnv,
}

impl SimServer {
    /// Create and bind a new simulation server.
    pub async fn bind(address: &str) -> io::Result<Self> {
        Self::bind_with_config(address, ServerConfig::default()).await
    }

    /// Create and bind a new simulation server with custom config.
    pub async fn bind_with_config(address: &str, config: ServerConfig) -> io::Result<Self> {
        let listener = TcpListener::bind(address).await?;
        let (display, probe) = SimDisplay::new(SIM_DISPLAY_SIZE.0, SIM_DISPLAY_SIZE.1);
        let mut drivers = DriverSet::new();
        drivers.add(Box::new(display));

        let env = SimEnv::new();
        let driver = ServerDriver::new(env.clone(), &config, drivers).map_err(|e| io::Error::other(e.to_string()))?;

        Ok(Self { driver, listener, connections: HashMap::new(), next_session_id: 1, display: probe, env })
    }

    /// Accept a new connection and return its ID.
    ///
    /// This method blocks until a connection is available.
    pub async fn accept_connection(&mut self) -> io::Result<u64> {
        let (stream, _addr) = self.listener.accept().await?;

        let session_id = self.next_session_id;
        self.next_session_id += 1;

        let actions = self
            .driver
            .process_event(ServerEvent::ConnectionAccepted { session_id })
            .map_err(|e| io::Error::other(e.to_string()))?;

        let (reader, writer) = tokio::io::split(stream);
        self.connections.insert(session_id, SimConnectionState { reader, writer });

        self.execute_actions(actions).await;

        Ok(session_id)
    }

    /// Read once from a connection and hand the bytes to the driver.
    ///
    /// Returns the number of bytes read; 0 means the client hung up and the
    /// session is gone.
    pub async fn receive(&mut self, session_id: u64) -> io::Result<usize> {
        let conn = self
            .connections
            .get_mut(&session_id)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("no session {session_id}")))?;

        let mut buf = vec![0u8; MAX_MESSAGE];
        let n = conn.reader.read(&mut buf).await?;

        if n == 0 {
            self.connections.remove(&session_id);
            self.dispatch(ServerEvent::ConnectionClosed { session_id, reason: "connection closed by peer".into() })
                .await?;
        } else {
            buf.truncate(n);
            self.process_data(session_id, Bytes::from(buf)).await?;
        }
        Ok(n)
    }

    /// Hand bytes to the driver as if they arrived on `session_id`.
    pub async fn process_data(&mut self, session_id: u64, data: Bytes) -> io::Result<()> {
        self.dispatch(ServerEvent::DataReceived { session_id, data }).await
    }

    /// Process a tick event, running whichever phases are due.
    pub async fn tick(&mut self) -> io::Result<()> {
        self.dispatch(ServerEvent::Tick).await
    }

    /// Let the server loop run for `duration` of virtual time.
    pub async fn run_for(&mut self, duration: Duration) -> io::Result<()> {
        let deadline = self.env.now() + duration;
        while self.env.now() < deadline {
            let remaining = deadline - self.env.now();
            self.env.sleep(self.driver.sleep_time().min(remaining)).await;
            self.tick().await?;
        }
        Ok(())
    }

    /// Stop the server: goodbye screen, then every connection is closed.
    pub async fn shutdown(&mut self) -> io::Result<()> {
        self.dispatch(ServerEvent::Shutdown).await
    }

    async fn dispatch(&mut self, event: ServerEvent) -> io::Result<()> {
        let actions = self.driver.process_event(event).map_err(|e| io::Error::other(e.to_string()))?;
        self.execute_actions(actions).await;
        Ok(())
    }

    /// Execute server actions.
    async fn execute_actions(&mut self, actions: Vec<ServerAction>) {
        for action in actions {
            match action {
                ServerAction::SendToSession { session_id, reply } => {
                    self.send_reply(session_id, &reply).await;
                },

                ServerAction::CloseConnection { session_id, reason } => {
                    tracing::debug!(session_id, %reason, "closing connection");
                    self.connections.remove(&session_id);
                },

                ServerAction::Log { level, message, .. } => {
                    self.log(level, &message);
                },
            }
        }
    }

    /// Send a reply to a specific session.
    ///
    /// A failed write means the peer is gone; the session is closed the way
    /// the production reader would report it.
    async fn send_reply(&mut self, session_id: u64, reply: &Reply) {
        let Some(conn) = self.connections.get_mut(&session_id) else {
            return;
        };
        let result = match conn.writer.write_all(&reply.to_bytes()).await {
            Ok(()) => conn.writer.flush().await,
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            tracing::debug!(session_id, error = %e, "write failed");
            self.connections.remove(&session_id);
            let closed = ServerEvent::ConnectionClosed { session_id, reason: format!("write error: {e}") };
            match self.driver.process_event(closed) {
                Ok(actions) => Box::pin(self.execute_actions(actions)).await,
                Err(e) => tracing::warn!("{}", e),
            }
        }
    }

    /// Log a message.
    fn log(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Debug => tracing::debug!("{}", message),
            LogLevel::Info => tracing::info!("{}", message),
            LogLevel::Warn => tracing::warn!("{}", message),
            LogLevel::Error => tracing::error!("{}", message),
        }
    }

    /// Number of open connections.
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// The simulated display.
    pub fn display(&self) -> &DisplayProbe {
        &self.display
    }

    /// Underlying driver for test assertions.
    pub fn driver(&self) -> &ServerDriver<SimEnv> {
        &self.driver
    }

    /// Observable state for invariant checks.
    pub fn snapshot(&self) -> ServerSnapshot {
        ServerSnapshot::capture(&self.driver, self.connections.keys().copied(), self.display.last_frame())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sim_server_binds() {
        let mut sim = turmoil::Builder::new().build();

        sim.host("server", || async {
            let server = SimServer::bind("0.0.0.0:13666").await?;
            assert_eq!(server.connection_count(), 0);
            Ok(())
        });

        sim.run().unwrap();
    }

    #[test]
    fn sim_server_renders_the_server_screen() {
        let mut sim = turmoil::Builder::new().build();

        sim.client("server", async {
            let mut server = SimServer::bind("0.0.0.0:13666").await?;
            server.run_for(Duration::from_millis(500)).await?;

            assert!(server.display().frame_count() > 0);
            assert!(server.display().ever_showed("Clients: 0"));
            Ok(())
        });

        sim.run().unwrap();
    }
}
