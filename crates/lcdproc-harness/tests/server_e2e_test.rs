//! End-to-end server tests over simulated TCP.
//!
//! Each test runs a `SimServer` and one or more protocol clients as turmoil
//! clients. The server side drives the loop explicitly: one `receive` per
//! client request, since every client waits for its replies before sending
//! the next line.
//!
//! # Oracle Pattern
//!
//! Each step ends with the standard invariant checks; each test ends with
//! oracle checks on the display and server state.

use std::{io, time::Duration};

use lcdproc_harness::{SimServer, assert_invariants};
use lcdproc_server::ServerConfig;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, ReadHalf, WriteHalf};
use turmoil::{Builder, net::TcpStream};

const ADDR: &str = "0.0.0.0:13666";

/// Protocol client speaking one request at a time.
struct LineClient {
    writer: WriteHalf<TcpStream>,
    lines: Lines<BufReader<ReadHalf<TcpStream>>>,
}

impl LineClient {
    async fn connect() -> io::Result<Self> {
        // Let the server bind first
        tokio::time::sleep(Duration::from_millis(10)).await;
        let stream = TcpStream::connect("server:13666").await?;
        let (reader, writer) = tokio::io::split(stream);
        Ok(Self { writer, lines: BufReader::new(reader).lines() })
    }

    async fn read_line(&mut self) -> io::Result<Option<String>> {
        self.lines.next_line().await
    }

    /// Send `line` and read its `count` replies.
    async fn request(&mut self, line: &str, count: usize) -> io::Result<Vec<String>> {
        self.writer.write_all(format!("{line}\n").as_bytes()).await?;
        let mut replies = Vec::with_capacity(count);
        for _ in 0..count {
            let reply = self
                .read_line()
                .await?
                .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "server hung up"))?;
            replies.push(reply);
        }
        Ok(replies)
    }

    /// Send a command that answers with exactly one line.
    async fn command(&mut self, line: &str) -> io::Result<String> {
        let mut replies = self.request(line, 1).await?;
        Ok(replies.remove(0))
    }
}

/// Oracle: all standard invariants hold.
fn verify_invariants(server: &SimServer, context: &str) {
    assert_invariants(&server.snapshot(), context);
}

/// Oracle: no screen of a client is left behind.
fn verify_only_server_screens(server: &SimServer, context: &str) {
    let snapshot = server.snapshot();
    assert!(
        snapshot.screens.iter().all(|s| s.owner.is_none()),
        "{context}: client screens remain {:?}",
        snapshot.screens
    );
}

/// Display rows framed so trailing blanks stay visible.
fn framed(rows: &[String]) -> String {
    rows.iter().map(|row| format!("|{row}|")).collect::<Vec<_>>().join("\n")
}

#[test]
fn client_screen_reaches_the_display() {
    let mut sim = Builder::new().build();

    sim.client("server", async {
        let mut server = SimServer::bind(ADDR).await?;
        let session = server.accept_connection().await?;
        verify_invariants(&server, "after accept");

        for _ in 0..7 {
            server.receive(session).await?;
            verify_invariants(&server, "after command");
        }

        server.run_for(Duration::from_secs(1)).await?;
        verify_invariants(&server, "after rendering");

        let frame = server.display().last_frame().unwrap();
        insta::assert_snapshot!(framed(&frame), @r"
        |hi                  |
        |  there             |
        |                    |
        |                    |
        ");

        // Client hangs up
        assert_eq!(server.receive(session).await?, 0);
        assert_eq!(server.connection_count(), 0);
        verify_invariants(&server, "after disconnect");
        verify_only_server_screens(&server, "after disconnect");

        Ok(())
    });

    sim.client("client", async {
        let mut client = LineClient::connect().await?;

        let connect = client.command("hello").await?;
        assert_eq!(connect, "connect LCDproc 0.5.9 protocol 0.3 lcd wid 20 hgt 4 cellwid 5 cellhgt 8");

        assert_eq!(client.command("screen_add s1").await?, "success");
        // One reply per option
        let replies = client.request("screen_set s1 -priority foreground -heartbeat off", 2).await?;
        assert_eq!(replies, ["success", "success"]);
        assert_eq!(client.command("widget_add s1 a string").await?, "success");
        assert_eq!(client.command("widget_add s1 b string").await?, "success");
        assert_eq!(client.command("widget_set s1 a 1 1 hi").await?, "success");
        assert_eq!(client.command("widget_set s1 b 3 2 there").await?, "success");

        assert_eq!(client.read_line().await?.as_deref(), Some("listen s1"));
        Ok(())
    });

    sim.run().unwrap();
}

#[test]
fn reserved_key_reaches_its_client() {
    let mut sim = Builder::new().build();

    sim.client("server", async {
        let mut server = SimServer::bind(ADDR).await?;
        let session = server.accept_connection().await?;

        for _ in 0..2 {
            server.receive(session).await?;
        }

        server.display().press("F1");
        server.run_for(Duration::from_millis(500)).await?;
        verify_invariants(&server, "after key press");

        assert_eq!(server.receive(session).await?, 0);
        Ok(())
    });

    sim.client("client", async {
        let mut client = LineClient::connect().await?;
        client.command("hello").await?;
        assert_eq!(client.command("client_add_key -exclusively F1").await?, "success");

        assert_eq!(client.read_line().await?.as_deref(), Some("key F1"));
        Ok(())
    });

    sim.run().unwrap();
}

#[test]
fn screens_rotate_between_clients() {
    let mut sim = Builder::new().build();

    sim.client("server", async {
        let config = ServerConfig {
            server_screen: lcdproc_server::settings::ServerScreenMode::Off,
            wait_time: Some(Duration::from_secs(2)),
            ..ServerConfig::default()
        };
        let mut server = SimServer::bind_with_config(ADDR, config).await?;

        for _ in 0..2 {
            let session = server.accept_connection().await?;
            for _ in 0..4 {
                server.receive(session).await?;
                verify_invariants(&server, "during setup");
            }
        }

        server.run_for(Duration::from_secs(5)).await?;
        verify_invariants(&server, "after rotation");
        assert_eq!(server.connection_count(), 2);
        assert!(server.display().ever_showed("first"));
        assert!(server.display().ever_showed("second"));

        server.shutdown().await?;
        verify_invariants(&server, "after shutdown");
        verify_only_server_screens(&server, "after shutdown");
        Ok(())
    });

    for (name, text) in [("alpha", "first"), ("beta", "second")] {
        sim.client(name, async move {
            let mut client = LineClient::connect().await?;
            client.command("hello").await?;
            client.command("screen_add s").await?;
            client.command("widget_add s w string").await?;
            client.command(&format!("widget_set s w 1 1 {text}")).await?;

            let mut events = Vec::new();
            while let Some(line) = client.read_line().await? {
                events.push(line);
            }

            // Shown, rotated away, and maybe shown again
            assert!(events.len() >= 2, "{events:?}");
            for (i, event) in events.iter().enumerate() {
                let expected = if i % 2 == 0 { "listen s" } else { "ignore s" };
                assert_eq!(event, expected, "{events:?}");
            }
            Ok(())
        });
    }

    sim.run().unwrap();
}

#[test]
fn bye_closes_the_connection() {
    let mut sim = Builder::new().build();

    sim.client("server", async {
        let mut server = SimServer::bind(ADDR).await?;
        let session = server.accept_connection().await?;

        for _ in 0..2 {
            server.receive(session).await?;
        }
        assert_eq!(server.connection_count(), 1);

        server.receive(session).await?;
        assert_eq!(server.connection_count(), 0);
        verify_invariants(&server, "after bye");
        verify_only_server_screens(&server, "after bye");
        Ok(())
    });

    sim.client("client", async {
        let mut client = LineClient::connect().await?;
        client.command("hello").await?;
        client.request("screen_add s1", 1).await?;

        client.writer.write_all(b"bye\n").await?;
        assert_eq!(client.read_line().await?, None);
        Ok(())
    });

    sim.run().unwrap();
}

#[test]
fn shutdown_shows_goodbye_and_hangs_up() {
    let mut sim = Builder::new().build();

    sim.client("server", async {
        let config = ServerConfig { goodbye: Some(vec!["So long".into()]), ..ServerConfig::default() };
        let mut server = SimServer::bind_with_config(ADDR, config).await?;
        let session = server.accept_connection().await?;
        server.receive(session).await?;

        server.shutdown().await?;
        assert_eq!(server.connection_count(), 0);
        assert_eq!(server.display().last_frame().unwrap()[0].trim_end(), "So long");
        Ok(())
    });

    sim.client("client", async {
        let mut client = LineClient::connect().await?;
        client.command("hello").await?;
        assert_eq!(client.read_line().await?, None);
        Ok(())
    });

    sim.run().unwrap();
}
