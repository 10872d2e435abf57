//! Registration authority
//!
//! Drives a connection through PASS, NICK and USER in any order and promotes
//! it to registered once all three are satisfied. Also owns the live nickname
//! change for connections that are already registered.

use crate::utils::string::is_valid_nickname;
use crate::{
    ClientId, Message, MessageType, NumericReply, ProtocolError, ProtocolResult,
    RegistrationState, Server,
};
use std::time::Instant;
use tracing::{debug, info};

impl Server {
    /// Handle PASS command
    pub(crate) fn handle_pass(&mut self, id: &ClientId, message: &Message) -> ProtocolResult {
        let Some(client) = self.registry.get_mut(id) else {
            return Ok(());
        };
        if client.is_registered() {
            return Err(ProtocolError::AlreadyRegistered);
        }

        let password = message
            .param(0)
            .ok_or_else(|| ProtocolError::NeedMoreParams("PASS".to_string()))?;
        if password != self.config.security.password {
            debug!("Client {} sent a wrong password", id);
            return Err(ProtocolError::PasswordMismatch);
        }

        client.password_verified = true;
        if client.state == RegistrationState::Connecting {
            client.advance(RegistrationState::PassOk);
        }
        self.check_registration(id)
    }

    /// Handle NICK command, both during registration and as a live rename
    pub(crate) fn handle_nick(&mut self, id: &ClientId, message: &Message) -> ProtocolResult {
        let nick = message
            .param(0)
            .filter(|n| !n.is_empty())
            .ok_or(ProtocolError::NoNicknameGiven)?;
        if !is_valid_nickname(nick) {
            return Err(ProtocolError::ErroneousNickname(nick.to_string()));
        }
        if self.registry.nick_in_use(nick, id) {
            return Err(ProtocolError::NicknameInUse(nick.to_string()));
        }

        let Some(client) = self.registry.get(id) else {
            return Ok(());
        };

        if client.is_registered() {
            if client.nickname.as_deref() == Some(nick) {
                return Ok(());
            }
            let notice = Message::with_prefix(client.prefix(), MessageType::Nick, vec![nick.to_string()]);
            let mut recipients = self.channels.peers_of(&self.registry, id);
            recipients.insert(*id);
            for recipient in &recipients {
                self.registry.send(recipient, notice.clone());
            }
            info!("{} is now known as {}", self.registry.nick_of(id), nick);
            self.registry.rename(id, nick);
            return Ok(());
        }

        if let Some(client) = self.registry.get_mut(id) {
            client.nickname = Some(nick.to_string());
            client.advance(RegistrationState::NickOk);
        }
        self.check_registration(id)
    }

    /// Handle USER command
    pub(crate) fn handle_user(&mut self, id: &ClientId, message: &Message) -> ProtocolResult {
        let Some(client) = self.registry.get_mut(id) else {
            return Ok(());
        };
        if client.is_registered() {
            return Err(ProtocolError::AlreadyRegistered);
        }
        if message.params.len() < 4 {
            return Err(ProtocolError::NeedMoreParams("USER".to_string()));
        }

        let realname = &message.params[3];
        client.username = Some(message.params[0].clone());
        client.realname = Some(realname.strip_prefix(':').unwrap_or(realname).to_string());
        client.advance(RegistrationState::UserOk);
        self.check_registration(id)
    }

    /// Promote the connection if PASS, NICK and USER are all in place
    fn check_registration(&mut self, id: &ClientId) -> ProtocolResult {
        let Some(client) = self.registry.get(id) else {
            return Ok(());
        };
        if client.is_registered() || !client.ready_to_register() {
            return Ok(());
        }

        let nick = client.nick_or_star().to_string();
        if self.registry.nick_in_use(&nick, id) {
            if let Some(client) = self.registry.get_mut(id) {
                client.nickname = None;
            }
            return Err(ProtocolError::NicknameInUse(nick));
        }

        if let Some(client) = self.registry.get_mut(id) {
            client.state = RegistrationState::Registered;
            client.touch(Instant::now());
            info!("Client {} registered", client.info_string());
        }
        self.registry.index_nick(id);
        self.send_welcome(id);
        Ok(())
    }

    /// Send the 001-004 welcome burst
    fn send_welcome(&self, id: &ClientId) {
        let Some(client) = self.registry.get(id) else {
            return;
        };
        let server = self.registry.server_name();
        let nick = client.nick_or_star();
        let user = client.username.as_deref().unwrap_or("*");
        let version = &self.config.server.version;

        for reply in [
            NumericReply::welcome(server, nick, user, &client.hostname),
            NumericReply::your_host(server, nick, version),
            NumericReply::created(server, nick, &self.created),
            NumericReply::my_info(server, nick, version),
        ] {
            self.registry.send(id, reply);
        }
    }
}
