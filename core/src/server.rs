//! Protocol engine and command dispatcher
//!
//! `Server` is the single owner of the connection registry and the channel
//! directory. The transport feeds it events (`connection_opened`,
//! `bytes_received`, `connection_closed`, `sweep_timeouts`) and it answers by
//! queueing messages on each client's outbound channel. Nothing in here blocks
//! or awaits, so every inbound chunk is processed to completion before the
//! next one is looked at.

use crate::utils::string::{is_channel_target, nick_eq};
use crate::utils::time;
use crate::{
    ChannelDirectory, Client, ClientId, Config, ConnectionRegistry, Message, MessageType,
    NumericReply, ProtocolError, ProtocolResult,
};
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// What the transport should do with a connection after an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Keep reading
    Keep,
    /// The engine has dropped the connection; close the socket
    Close,
}

/// Relay server engine
#[derive(Debug)]
pub struct Server {
    /// Server configuration
    pub(crate) config: Config,
    /// Every live connection
    pub(crate) registry: ConnectionRegistry,
    /// Every channel
    pub(crate) channels: ChannelDirectory,
    /// Creation date shown in the welcome burst
    pub(crate) created: String,
}

impl Server {
    /// Create a new server engine
    pub fn new(config: Config) -> Self {
        let created = config
            .server
            .created
            .clone()
            .unwrap_or_else(time::current_timestamp);
        Self {
            registry: ConnectionRegistry::new(config.server.name.clone()),
            channels: ChannelDirectory::new(),
            created,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    pub fn channels(&self) -> &ChannelDirectory {
        &self.channels
    }

    /// Register a newly accepted connection
    pub fn connection_opened(
        &mut self,
        id: ClientId,
        hostname: String,
        sender: mpsc::UnboundedSender<Message>,
    ) {
        info!("Client connection from {} ({})", hostname, id);
        let client = Client::new(id, hostname, sender, self.config.connection.max_line_buffer);
        self.registry.insert(client);

        for text in ["*** Looking up your hostname...", "*** Found your hostname"] {
            let notice = Message::new(
                MessageType::Notice,
                vec!["AUTH".to_string(), text.to_string()],
            );
            self.registry.send(&id, notice);
        }
    }

    /// Frame and dispatch a chunk of inbound bytes
    pub fn bytes_received(&mut self, id: &ClientId, data: &[u8]) -> Disposition {
        let now = Instant::now();
        let framed = match self.registry.get_mut(id) {
            Some(client) => client.recv.append(data),
            None => return Disposition::Close,
        };

        let lines = match framed {
            Ok(lines) => lines,
            Err(overflow) => {
                warn!(
                    "Client {} exceeded input buffer ({} > {} bytes)",
                    id, overflow.held, overflow.max_size
                );
                self.disconnect(id, "Input buffer exceeded", true);
                return Disposition::Close;
            }
        };

        for line in lines {
            if self.handle_line(id, &line, now) == Disposition::Close {
                return Disposition::Close;
            }
        }
        Disposition::Keep
    }

    /// The transport lost the connection; treated as an implicit QUIT
    pub fn connection_closed(&mut self, id: &ClientId) {
        self.disconnect(id, "Client disconnected", false);
    }

    /// Drop every connection idle past its window. Returns the dropped IDs.
    pub fn sweep_timeouts(&mut self, now: Instant) -> Vec<ClientId> {
        let unregistered = self.config.timeouts.unregistered();
        let registered = self.config.timeouts.registered();

        let expired: Vec<ClientId> = self
            .registry
            .iter()
            .filter(|client| {
                let window = if client.is_registered() { registered } else { unregistered };
                client.is_idle(now, window)
            })
            .map(|client| client.id)
            .collect();

        for id in &expired {
            warn!("Client {} timed out", self.registry.nick_of(id));
            self.disconnect(id, "Ping timeout", true);
        }
        expired
    }

    /// Parse and dispatch one line
    pub fn handle_line(&mut self, id: &ClientId, line: &str, now: Instant) -> Disposition {
        self.handle_message(id, Message::parse(line), now)
    }

    /// Dispatch one parsed command
    pub fn handle_message(&mut self, id: &ClientId, message: Message, now: Instant) -> Disposition {
        if message.is_empty() {
            return Disposition::Keep;
        }

        let registered = match self.registry.get_mut(id) {
            Some(client) => {
                client.touch(now);
                client.is_registered()
            }
            None => return Disposition::Close,
        };

        debug!("Client {} sent {}", self.registry.nick_of(id), message.command);

        let result = match &message.command {
            MessageType::Password => self.handle_pass(id, &message),
            MessageType::Nick => self.handle_nick(id, &message),
            MessageType::User => self.handle_user(id, &message),
            _ if !registered => Err(ProtocolError::NotRegistered),
            MessageType::Quit => {
                let reason = message.param(0).unwrap_or("Client Quit");
                self.disconnect(id, reason, false);
                return Disposition::Close;
            }
            MessageType::Ping => self.handle_ping(id, &message),
            MessageType::Pong => Ok(()),
            MessageType::Join => self.handle_join(id, &message),
            MessageType::Part => self.handle_part(id, &message),
            MessageType::PrivMsg => self.handle_privmsg(id, &message),
            MessageType::Notice => self.handle_notice(id, &message),
            MessageType::Kick => self.handle_kick(id, &message),
            MessageType::Invite => self.handle_invite(id, &message),
            MessageType::Topic => self.handle_topic(id, &message),
            MessageType::Mode => self.handle_mode(id, &message),
            MessageType::Who => self.handle_who(id, &message),
            other => Err(ProtocolError::UnknownCommand(other.to_string())),
        };

        if let Err(e) = result {
            self.registry.send_error(id, &e);
        }
        Disposition::Keep
    }

    /// Tear down a connection: optional ERROR line, quit notice to peers,
    /// removal from every channel, removal from the registry
    pub fn disconnect(&mut self, id: &ClientId, reason: &str, send_error: bool) {
        if !self.registry.contains(id) {
            return;
        }
        if send_error {
            self.registry.send_fatal(id, reason);
        }

        self.channels.remove_client(&mut self.registry, id, reason);

        if let Some(client) = self.registry.remove(id) {
            info!(
                "Client {} disconnected after {}: {}",
                client.info_string(),
                time::format_duration(client.connected_at.elapsed().as_secs()),
                reason
            );
        }
    }

    /// Tell every connection the server is going away and drop them all
    pub fn shutdown(&mut self) {
        info!("Shutting down with {} connections", self.registry.len());
        let notice = Message::new(MessageType::Error, vec!["Server shutting down".to_string()]);
        self.registry.broadcast_all(&notice);

        let ids: Vec<ClientId> = self.registry.iter().map(|c| c.id).collect();
        for id in ids {
            self.registry.remove(&id);
        }
        self.channels = ChannelDirectory::new();
    }

    /// Handle PING command
    fn handle_ping(&mut self, id: &ClientId, message: &Message) -> ProtocolResult {
        let token = message
            .param(0)
            .unwrap_or(&self.config.server.name)
            .to_string();
        self.registry.send(id, Message::new(MessageType::Pong, vec![token]));
        Ok(())
    }

    /// Handle JOIN command
    fn handle_join(&mut self, id: &ClientId, message: &Message) -> ProtocolResult {
        let targets = message
            .param(0)
            .ok_or_else(|| ProtocolError::NeedMoreParams("JOIN".to_string()))?;
        let keys: Vec<&str> = message.param(1).map(|k| k.split(',').collect()).unwrap_or_default();

        for (i, name) in targets.split(',').filter(|n| !n.is_empty()).enumerate() {
            let key = keys.get(i).copied().unwrap_or("");
            if let Err(e) = self.channels.join(&mut self.registry, id, name, key) {
                self.registry.send_error(id, &e);
            }
        }
        Ok(())
    }

    /// Handle PART command
    fn handle_part(&mut self, id: &ClientId, message: &Message) -> ProtocolResult {
        let targets = message
            .param(0)
            .ok_or_else(|| ProtocolError::NeedMoreParams("PART".to_string()))?;
        let reason = message.param(1);

        for name in targets.split(',').filter(|n| !n.is_empty()) {
            if let Err(e) = self.channels.part(&mut self.registry, id, name, reason) {
                self.registry.send_error(id, &e);
            }
        }
        Ok(())
    }

    /// Deliver PRIVMSG/NOTICE text to a channel or a nickname
    fn route_message(
        &self,
        id: &ClientId,
        command: MessageType,
        target: &str,
        text: &str,
    ) -> ProtocolResult {
        if is_channel_target(target) {
            return self
                .channels
                .message(&self.registry, id, target, command, text);
        }

        let recipient = self
            .registry
            .find_by_nick(target)
            .ok_or_else(|| ProtocolError::NoSuchNick(target.to_string()))?;
        if let Some(sender) = self.registry.get(id) {
            let line = Message::with_prefix(
                sender.prefix(),
                command,
                vec![target.to_string(), text.to_string()],
            );
            self.registry.send(&recipient, line);
        }
        Ok(())
    }

    /// Handle PRIVMSG command
    fn handle_privmsg(&mut self, id: &ClientId, message: &Message) -> ProtocolResult {
        match (message.param(0), message.param(1)) {
            (Some(target), Some(text)) => self.route_message(id, MessageType::PrivMsg, target, text),
            _ => Err(ProtocolError::NeedMoreParams("PRIVMSG".to_string())),
        }
    }

    /// Handle NOTICE command. Never answered with an error.
    fn handle_notice(&mut self, id: &ClientId, message: &Message) -> ProtocolResult {
        if let (Some(target), Some(text)) = (message.param(0), message.param(1)) {
            if let Err(e) = self.route_message(id, MessageType::Notice, target, text) {
                debug!("Dropped NOTICE from {}: {}", self.registry.nick_of(id), e);
            }
        }
        Ok(())
    }

    /// Handle KICK command
    fn handle_kick(&mut self, id: &ClientId, message: &Message) -> ProtocolResult {
        let (Some(channel), Some(target)) = (message.param(0), message.param(1)) else {
            return Err(ProtocolError::NeedMoreParams("KICK".to_string()));
        };
        let reason = message
            .param(2)
            .unwrap_or_else(|| self.registry.nick_of(id))
            .to_string();
        self.channels
            .kick(&mut self.registry, id, channel, target, &reason)
    }

    /// Handle INVITE command
    fn handle_invite(&mut self, id: &ClientId, message: &Message) -> ProtocolResult {
        let (Some(target), Some(channel)) = (message.param(0), message.param(1)) else {
            return Err(ProtocolError::NeedMoreParams("INVITE".to_string()));
        };
        self.channels.invite(&self.registry, id, target, channel)
    }

    /// Handle TOPIC command
    fn handle_topic(&mut self, id: &ClientId, message: &Message) -> ProtocolResult {
        let channel = message
            .param(0)
            .ok_or_else(|| ProtocolError::NeedMoreParams("TOPIC".to_string()))?;
        self.channels
            .topic(&self.registry, id, channel, message.param(1))
    }

    /// Handle MODE command for channels and for the caller's own nickname
    fn handle_mode(&mut self, id: &ClientId, message: &Message) -> ProtocolResult {
        let target = message
            .param(0)
            .ok_or_else(|| ProtocolError::NeedMoreParams("MODE".to_string()))?;

        if is_channel_target(target) {
            let args = message.params.get(2..).unwrap_or(&[]);
            return self
                .channels
                .mode(&self.registry, id, target, message.param(1), args);
        }

        let own_nick = self.registry.nick_of(id);
        if nick_eq(target, own_nick) {
            let reply = NumericReply::umode_is(self.registry.server_name(), own_nick);
            self.registry.send(id, reply);
            Ok(())
        } else if self.registry.find_by_nick(target).is_some() {
            Err(ProtocolError::UsersDontMatch)
        } else {
            Err(ProtocolError::NoSuchNick(target.to_string()))
        }
    }

    /// Handle WHO command; no listing, only the terminator
    fn handle_who(&mut self, id: &ClientId, message: &Message) -> ProtocolResult {
        let reply = NumericReply::end_of_who(
            self.registry.server_name(),
            self.registry.nick_of(id),
            message.param(0),
        );
        self.registry.send(id, reply);
        Ok(())
    }
}
