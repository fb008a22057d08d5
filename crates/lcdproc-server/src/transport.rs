//! Tokio-based TCP transport.
//!
//! Every accepted connection is split into two tasks: a reader that turns
//! socket reads into [`ServerEvent`]s on the driver's channel, and a writer
//! that drains the session's outbound queue. The queue is bounded: a client
//! that stops reading fills it and gets disconnected. Closing a session
//! aborts the reader and drops the queue; the writer flushes what is left
//! and shuts the socket down.

use std::net::{IpAddr, SocketAddr};

use bytes::Bytes;
use lcdproc_proto::MAX_MESSAGE;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{
        TcpListener, TcpStream,
        tcp::{OwnedReadHalf, OwnedWriteHalf},
    },
    sync::mpsc::{self, error::TrySendError},
    task::JoinHandle,
};

use crate::{driver::ServerEvent, error::ServerError};

/// Replies buffered per session before the client counts as stalled. Every
/// reply costs the client at least one byte, so one full read fits.
const OUTBOUND_QUEUE: usize = MAX_MESSAGE;

/// Listening TCP socket.
pub struct TcpTransport {
    listener: TcpListener,
}

impl TcpTransport {
    /// Bind to `address` (an IP literal) and `port`.
    pub async fn bind(address: &str, port: u16) -> Result<Self, ServerError> {
        let ip: IpAddr = address
            .parse()
            .map_err(|e| ServerError::Config(format!("invalid bind address '{address}': {e}")))?;
        let addr = SocketAddr::new(ip, port);

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Transport(format!("failed to bind {addr}: {e}")))?;

        tracing::info!("TCP transport bound to {}", addr);

        Ok(Self { listener })
    }

    /// Accept a new connection.
    pub async fn accept(&self) -> Result<(TcpStream, SocketAddr), ServerError> {
        self.listener.accept().await.map_err(|e| ServerError::Transport(format!("accept failed: {e}")))
    }

    /// Local address the transport is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        self.listener
            .local_addr()
            .map_err(|e| ServerError::Transport(format!("failed to get local address: {e}")))
    }
}

/// Runtime half of an open session.
pub struct Session {
    outbound: mpsc::Sender<Bytes>,
    reader: JoinHandle<()>,
}

impl Session {
    /// Start the reader and writer tasks for `stream`.
    pub fn spawn(session_id: u64, stream: TcpStream, events: mpsc::Sender<ServerEvent>) -> Self {
        Self::spawn_with_queue(session_id, stream, events, OUTBOUND_QUEUE)
    }

    pub(crate) fn spawn_with_queue(
        session_id: u64,
        stream: TcpStream,
        events: mpsc::Sender<ServerEvent>,
        queue_len: usize,
    ) -> Self {
        let (read, write) = stream.into_split();
        let (outbound, queue) = mpsc::channel(queue_len);
        tokio::spawn(write_loop(session_id, write, queue));
        let reader = tokio::spawn(read_loop(session_id, read, events));
        Self { outbound, reader }
    }

    /// Queue bytes for the client.
    ///
    /// Fails when the queue is full or the writer is gone after a write
    /// error; either way the session should be closed.
    pub fn send(&self, data: Bytes) -> Result<(), ServerError> {
        self.outbound.try_send(data).map_err(|e| match e {
            TrySendError::Full(_) => ServerError::Transport("outbound queue full".into()),
            TrySendError::Closed(_) => ServerError::Transport("writer closed".into()),
        })
    }

    /// Stop reading; queued data is still written before the socket shuts.
    pub fn close(self) {
        self.reader.abort();
    }
}

async fn read_loop(session_id: u64, mut read: OwnedReadHalf, events: mpsc::Sender<ServerEvent>) {
    let mut buf = vec![0u8; MAX_MESSAGE];
    let reason = loop {
        match read.read(&mut buf).await {
            Ok(0) => break "connection closed by peer".to_owned(),
            Ok(n) => {
                let event = ServerEvent::DataReceived { session_id, data: Bytes::copy_from_slice(&buf[..n]) };
                if events.send(event).await.is_err() {
                    return;
                }
            },
            Err(e) => break format!("read error: {e}"),
        }
    };
    tracing::debug!(session_id, %reason, "reader finished");
    if events.send(ServerEvent::ConnectionClosed { session_id, reason }).await.is_err() {
        tracing::debug!(session_id, "event channel closed before disconnect was reported");
    }
}

async fn write_loop(session_id: u64, mut write: OwnedWriteHalf, mut queue: mpsc::Receiver<Bytes>) {
    while let Some(data) = queue.recv().await {
        if let Err(e) = write.write_all(&data).await {
            tracing::debug!(session_id, error = %e, "write failed");
            return;
        }
    }
    if let Err(e) = write.shutdown().await {
        tracing::debug!(session_id, error = %e, "shutdown failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn transport_binds_ephemeral_port() {
        let transport = TcpTransport::bind("127.0.0.1", 0).await.unwrap();
        let addr = transport.local_addr().unwrap();
        assert_ne!(addr.port(), 0, "Should have assigned a port");
    }

    #[tokio::test]
    async fn transport_rejects_invalid_address() {
        let result = TcpTransport::bind("invalid:address:format", 0).await;
        assert!(matches!(result, Err(ServerError::Config(_))));
    }

    #[tokio::test]
    async fn session_forwards_reads_and_writes() {
        let transport = TcpTransport::bind("127.0.0.1", 0).await.unwrap();
        let addr = transport.local_addr().unwrap();
        let mut client = TcpStream::connect(addr).await.unwrap();
        let (stream, _) = transport.accept().await.unwrap();

        let (events_tx, mut events) = mpsc::channel(8);
        let session = Session::spawn(7, stream, events_tx);

        client.write_all(b"hello\n").await.unwrap();
        match events.recv().await {
            Some(ServerEvent::DataReceived { session_id: 7, data }) => assert_eq!(&data[..], b"hello\n"),
            other => panic!("unexpected event {other:?}"),
        }

        session.send(Bytes::from_static(b"success\n")).unwrap();
        session.close();
        let mut reply = Vec::new();
        client.read_to_end(&mut reply).await.unwrap();
        assert_eq!(reply, b"success\n");
    }

    #[tokio::test]
    async fn full_queue_is_an_error() {
        let transport = TcpTransport::bind("127.0.0.1", 0).await.unwrap();
        let addr = transport.local_addr().unwrap();
        let _client = TcpStream::connect(addr).await.unwrap();
        let (stream, _) = transport.accept().await.unwrap();

        let (events_tx, _events) = mpsc::channel(8);
        let session = Session::spawn_with_queue(1, stream, events_tx, 1);

        // The writer task has not run yet: the second reply finds the queue full
        session.send(Bytes::from_static(b"success\n")).unwrap();
        let result = session.send(Bytes::from_static(b"success\n"));
        assert!(matches!(result, Err(ServerError::Transport(msg)) if msg == "outbound queue full"));
    }
}
