//! Shared harness for driving `Server` without sockets
#![allow(dead_code)]

use chanrelay_core::{ClientId, Config, Disposition, Message, Server};
use std::time::Instant;
use tokio::sync::mpsc;
use uuid::Uuid;

pub const PASSWORD: &str = "secret";

/// One fake connection: its identity and the lines queued for it
pub struct TestClient {
    pub id: ClientId,
    pub rx: mpsc::UnboundedReceiver<Message>,
}

impl TestClient {
    /// Everything queued since the last drain, serialized without CRLF
    pub fn drain(&mut self) -> Vec<String> {
        let mut lines = Vec::new();
        while let Ok(message) = self.rx.try_recv() {
            lines.push(message.to_string());
        }
        lines
    }

    /// Whether the engine has dropped this connection's sender
    pub fn is_closed(&mut self) -> bool {
        matches!(
            self.rx.try_recv(),
            Err(mpsc::error::TryRecvError::Disconnected)
        )
    }
}

pub fn config() -> Config {
    let mut config = Config::default();
    config.server.name = "irc.test".to_string();
    config.server.created = Some("today".to_string());
    config.security.password = PASSWORD.to_string();
    config
}

pub fn server() -> Server {
    Server::new(config())
}

/// Open a connection and discard the connect notices
pub fn connect(server: &mut Server) -> TestClient {
    let (tx, rx) = mpsc::unbounded_channel();
    let id = Uuid::new_v4();
    server.connection_opened(id, "127.0.0.1".to_string(), tx);
    let mut client = TestClient { id, rx };
    client.drain();
    client
}

pub fn send(server: &mut Server, client: &TestClient, line: &str) -> Disposition {
    server.handle_line(&client.id, line, Instant::now())
}

/// Connect and complete registration as `nick` with username = first letter
pub fn register(server: &mut Server, nick: &str) -> TestClient {
    let mut client = connect(server);
    let user = &nick[..1];
    send(server, &client, &format!("PASS {}", PASSWORD));
    send(server, &client, &format!("NICK {}", nick));
    send(server, &client, &format!("USER {} 0 * :{}", user, nick));
    client.drain();
    client
}

/// Register `nick` and join each channel, discarding the join burst
pub fn register_in(server: &mut Server, nick: &str, channels: &[&str]) -> TestClient {
    let mut client = register(server, nick);
    for channel in channels {
        send(server, &client, &format!("JOIN {}", channel));
    }
    client.drain();
    client
}
