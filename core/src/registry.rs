//! Connection registry
//!
//! Sole owner of every `Client`. Everything else refers to a connection by
//! its `ClientId`. Registered nicknames are indexed by their ASCII casefold
//! so nickname resolution never scans the whole table.

use crate::utils::string::irc_lower;
use crate::{Client, ClientId, Message, MessageType, NumericReply, ProtocolError};
use std::collections::HashMap;

/// Mapping from connection identity to connection record
#[derive(Debug)]
pub struct ConnectionRegistry {
    /// Name used as the prefix of numeric replies
    server_name: String,
    /// Client ID to client mapping
    clients: HashMap<ClientId, Client>,
    /// Casefolded nickname to client ID, registered clients only
    nicks: HashMap<String, ClientId>,
}

impl ConnectionRegistry {
    pub fn new(server_name: impl Into<String>) -> Self {
        Self {
            server_name: server_name.into(),
            clients: HashMap::new(),
            nicks: HashMap::new(),
        }
    }

    pub fn server_name(&self) -> &str {
        &self.server_name
    }

    /// Add a freshly accepted connection
    pub fn insert(&mut self, client: Client) {
        self.clients.insert(client.id, client);
    }

    /// Remove a connection and its nickname index entry
    pub fn remove(&mut self, id: &ClientId) -> Option<Client> {
        let client = self.clients.remove(id)?;
        if let Some(nick) = &client.nickname {
            let key = irc_lower(nick);
            if self.nicks.get(&key) == Some(id) {
                self.nicks.remove(&key);
            }
        }
        Some(client)
    }

    pub fn get(&self, id: &ClientId) -> Option<&Client> {
        self.clients.get(id)
    }

    pub fn get_mut(&mut self, id: &ClientId) -> Option<&mut Client> {
        self.clients.get_mut(id)
    }

    pub fn contains(&self, id: &ClientId) -> bool {
        self.clients.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Iterate over every live connection
    pub fn iter(&self) -> impl Iterator<Item = &Client> {
        self.clients.values()
    }

    /// Number of registered connections
    pub fn registered_count(&self) -> usize {
        self.nicks.len()
    }

    /// Resolve a nickname among registered connections, case-insensitively
    pub fn find_by_nick(&self, nick: &str) -> Option<ClientId> {
        self.nicks.get(&irc_lower(nick)).copied()
    }

    /// Whether a registered connection other than `except` holds `nick`
    pub fn nick_in_use(&self, nick: &str, except: &ClientId) -> bool {
        matches!(self.find_by_nick(nick), Some(owner) if owner != *except)
    }

    /// Index the nickname of a connection that just registered
    pub fn index_nick(&mut self, id: &ClientId) {
        if let Some(nick) = self.clients.get(id).and_then(|c| c.nickname.as_deref()) {
            self.nicks.insert(irc_lower(nick), *id);
        }
    }

    /// Change the nickname of a registered connection
    pub fn rename(&mut self, id: &ClientId, new_nick: &str) {
        if let Some(client) = self.clients.get_mut(id) {
            if let Some(old) = client.nickname.replace(new_nick.to_string()) {
                self.nicks.remove(&irc_lower(&old));
            }
            self.nicks.insert(irc_lower(new_nick), *id);
        }
    }

    /// Nickname of a connection, `*` if none yet
    pub fn nick_of(&self, id: &ClientId) -> &str {
        self.clients.get(id).map(|c| c.nick_or_star()).unwrap_or("*")
    }

    /// Queue a message for one connection. A vanished receiver is not an error
    /// here; the transport reports the closure separately.
    pub fn send(&self, id: &ClientId, message: Message) {
        if let Some(client) = self.clients.get(id) {
            if let Err(e) = client.send(message) {
                tracing::debug!("Dropping message: {}", e);
            }
        }
    }

    /// Send a numeric reply addressed to the connection's nickname
    pub fn send_numeric(&self, id: &ClientId, reply: NumericReply, params: Vec<String>) {
        let message = reply.reply(&self.server_name, self.nick_of(id), params);
        self.send(id, message);
    }

    /// Report a rejected command to the connection that sent it
    pub fn send_error(&self, id: &ClientId, error: &ProtocolError) {
        tracing::debug!("Client {} command rejected: {:?}", id, error);
        self.send_numeric(id, error.numeric(), error.params());
    }

    /// Send an `ERROR` line, normally the last line before closing
    pub fn send_fatal(&self, id: &ClientId, reason: &str) {
        self.send(id, Message::new(MessageType::Error, vec![reason.to_string()]));
    }

    /// Broadcast message to every connection, registered or not
    pub fn broadcast_all(&self, message: &Message) {
        for client in self.clients.values() {
            if let Err(e) = client.send(message.clone()) {
                tracing::warn!("Error broadcasting to client {}: {}", client.id, e);
            }
        }
    }
}
