//! TCP transport
//!
//! One reader and one writer task per socket, one engine loop owning the
//! `Server`. Readers forward raw chunks to the engine; the engine answers by
//! queueing `Message`s on each client's outbound channel. Dropping a client
//! from the registry drops its sender, which ends its writer, which closes
//! the socket.

use crate::{ClientId, Config, Disposition, Message, Result, Server};
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

const READ_CHUNK: usize = 4096;
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Transport events delivered to the engine loop
#[derive(Debug)]
enum Event {
    Opened {
        id: ClientId,
        hostname: String,
        sender: mpsc::UnboundedSender<Message>,
    },
    Data { id: ClientId, bytes: Vec<u8> },
    Closed { id: ClientId },
}

/// Accepts connections and drives the protocol engine
pub struct ConnectionHandler {
    server: Server,
    shutdown: CancellationToken,
    tracker: TaskTracker,
}

impl ConnectionHandler {
    /// Create a new connection handler
    pub fn new(config: Config) -> Self {
        Self {
            server: Server::new(config),
            shutdown: CancellationToken::new(),
            tracker: TaskTracker::new(),
        }
    }

    /// Token that stops `serve` when cancelled
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Engine driven by this handler
    pub fn server(&self) -> &Server {
        &self.server
    }

    /// Run until the shutdown token is cancelled
    pub async fn serve(mut self, listener: TcpListener) -> Result<()> {
        info!("Listening on {}", listener.local_addr()?);

        let (events_tx, mut events_rx) = mpsc::unbounded_channel();
        let mut sweep = tokio::time::interval(self.server.config().timeouts.sweep_interval());
        sweep.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                accepted = listener.accept() => match accepted {
                    Ok((stream, addr)) => self.spawn_connection(stream, addr, events_tx.clone()),
                    Err(e) => warn!("Failed to accept connection: {}", e),
                },
                Some(event) = events_rx.recv() => self.dispatch(event),
                _ = sweep.tick() => {
                    let expired = self.server.sweep_timeouts(Instant::now());
                    if !expired.is_empty() {
                        debug!("Timed out {} connections", expired.len());
                    }
                }
            }
        }

        self.server.shutdown();
        self.tracker.close();
        if tokio::time::timeout(DRAIN_TIMEOUT, self.tracker.wait()).await.is_err() {
            warn!("Connections did not drain within {:?}", DRAIN_TIMEOUT);
        }
        info!("Server stopped");
        Ok(())
    }

    fn dispatch(&mut self, event: Event) {
        match event {
            Event::Opened { id, hostname, sender } => {
                self.server.connection_opened(id, hostname, sender)
            }
            Event::Data { id, bytes } => {
                if self.server.bytes_received(&id, &bytes) == Disposition::Close {
                    debug!("Client {} closed by server", id);
                }
            }
            Event::Closed { id } => self.server.connection_closed(&id),
        }
    }

    /// Queue the open event and spawn the socket's reader and writer. The
    /// open event is sent before the reader exists, so the engine always
    /// sees it ahead of that connection's data.
    fn spawn_connection(
        &self,
        stream: TcpStream,
        addr: SocketAddr,
        events: mpsc::UnboundedSender<Event>,
    ) {
        if let Err(e) = stream.set_nodelay(true) {
            debug!("Failed to set TCP_NODELAY for {}: {}", addr, e);
        }

        let id = Uuid::new_v4();
        let (read_half, write_half) = stream.into_split();
        let (sender, receiver) = mpsc::unbounded_channel();
        let token = self.shutdown.child_token();

        let opened = Event::Opened {
            id,
            hostname: addr.ip().to_string(),
            sender,
        };
        if events.send(opened).is_err() {
            return;
        }
        self.tracker
            .spawn(write_loop(id, write_half, receiver, token.clone()));
        self.tracker.spawn(read_loop(id, read_half, events, token));
    }
}

async fn read_loop(
    id: ClientId,
    mut reader: OwnedReadHalf,
    events: mpsc::UnboundedSender<Event>,
    token: CancellationToken,
) {
    let mut buf = vec![0u8; READ_CHUNK];
    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            read = reader.read(&mut buf) => match read {
                Ok(0) => break,
                Ok(n) => {
                    let bytes = buf[..n].to_vec();
                    if events.send(Event::Data { id, bytes }).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    debug!("Read error on client {}: {}", id, e);
                    break;
                }
            },
        }
    }
    // The engine may already have dropped the client; that is fine.
    let _ = events.send(Event::Closed { id });
}

async fn write_loop(
    id: ClientId,
    mut writer: OwnedWriteHalf,
    mut receiver: mpsc::UnboundedReceiver<Message>,
    token: CancellationToken,
) {
    while let Some(message) = receiver.recv().await {
        if let Err(e) = writer.write_all(message.to_line().as_bytes()).await {
            error!("Error writing to client {}: {}", id, e);
            break;
        }
    }
    if let Err(e) = writer.shutdown().await {
        debug!("Error closing client {}: {}", id, e);
    }
    token.cancel();
}
