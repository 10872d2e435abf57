//! Client connection management

use crate::{Error, Message, Prefix, RecvQueue, Result};
use std::collections::BTreeSet;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use uuid::Uuid;

/// Opaque identity of one transport connection
pub type ClientId = Uuid;

/// Coarse registration progress of a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationState {
    /// Just connected, nothing accepted yet
    Connecting,
    /// Password accepted
    PassOk,
    /// Nickname accepted last
    NickOk,
    /// User info accepted last
    UserOk,
    /// Fully registered
    Registered,
}

/// Client connection information
#[derive(Debug)]
pub struct Client {
    /// Unique client ID
    pub id: ClientId,
    /// Registration progress
    pub state: RegistrationState,
    /// Nickname, once accepted
    pub nickname: Option<String>,
    /// Username from USER
    pub username: Option<String>,
    /// Real name from USER
    pub realname: Option<String>,
    /// Remote host, as reported by the transport
    pub hostname: String,
    /// Whether PASS matched the server password
    pub password_verified: bool,
    /// Inbound bytes not yet framed into lines
    pub recv: RecvQueue,
    /// Channels this client is a member of
    pub channels: BTreeSet<String>,
    /// When the connection was accepted
    pub connected_at: Instant,
    /// Last time a command was parsed from this connection
    pub last_activity: Instant,
    /// Message sender for sending messages to client
    pub sender: mpsc::UnboundedSender<Message>,
}

impl Client {
    /// Create a new client
    pub fn new(
        id: ClientId,
        hostname: String,
        sender: mpsc::UnboundedSender<Message>,
        max_line_buffer: usize,
    ) -> Self {
        let now = Instant::now();
        Self {
            id,
            state: RegistrationState::Connecting,
            nickname: None,
            username: None,
            realname: None,
            hostname,
            password_verified: false,
            recv: RecvQueue::new(max_line_buffer),
            channels: BTreeSet::new(),
            connected_at: now,
            last_activity: now,
            sender,
        }
    }

    /// Send a message to the client
    pub fn send(&self, message: Message) -> Result<()> {
        self.sender
            .send(message)
            .map_err(|_| Error::Connection(format!("Client {} is no longer receiving", self.id)))
    }

    /// Check if client is registered
    pub fn is_registered(&self) -> bool {
        self.state == RegistrationState::Registered
    }

    /// Nickname, or `*` before one is accepted
    pub fn nick_or_star(&self) -> &str {
        self.nickname.as_deref().unwrap_or("*")
    }

    /// Source prefix used on lines this client originates
    pub fn prefix(&self) -> Prefix {
        Prefix::User {
            nick: self.nick_or_star().to_string(),
            user: self.username.clone().unwrap_or_else(|| "*".to_string()),
            host: self.hostname.clone(),
        }
    }

    /// Move the coarse state forward; never leaves `Registered`
    pub fn advance(&mut self, to: RegistrationState) {
        if !self.is_registered() {
            self.state = to;
        }
    }

    /// Whether PASS, NICK and USER have all been satisfied
    pub fn ready_to_register(&self) -> bool {
        self.password_verified && self.nickname.is_some() && self.username.is_some()
    }

    /// Record activity at `now`
    pub fn touch(&mut self, now: Instant) {
        self.last_activity = now;
    }

    /// Whether the client has been idle for at least `timeout` at `now`
    pub fn is_idle(&self, now: Instant, timeout: Duration) -> bool {
        now.saturating_duration_since(self.last_activity) >= timeout
    }

    /// Get client info string
    pub fn info_string(&self) -> String {
        match (&self.nickname, &self.username) {
            (Some(nick), Some(user)) => format!("{}!{}@{}", nick, user, self.hostname),
            _ => format!("{}@{}", self.id, self.hostname),
        }
    }
}
