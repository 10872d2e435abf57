//! Channel directory and channel-scoped commands
//!
//! The directory owns every `Channel`, keyed by exact name. Each operation
//! here runs to completion against the registry before the next command is
//! looked at, so no client can observe a half-applied JOIN or MODE. A channel
//! is dropped the moment its last member leaves.

use crate::channel::{Channel, ChannelMode};
use crate::utils::string::is_valid_channel_name;
use crate::{
    ClientId, ConnectionRegistry, Message, MessageType, NumericReply, ProtocolError, ProtocolResult,
};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info};

/// Owner of all channels
#[derive(Debug, Default)]
pub struct ChannelDirectory {
    channels: HashMap<String, Channel>,
}

/// Mode changes applied by one MODE command, in canonical form
#[derive(Debug, Default)]
struct ModeChanges {
    modes: String,
    params: Vec<String>,
    adding: Option<bool>,
}

impl ModeChanges {
    fn push(&mut self, adding: bool, flag: char, param: Option<String>) {
        if self.adding != Some(adding) {
            self.modes.push(if adding { '+' } else { '-' });
            self.adding = Some(adding);
        }
        self.modes.push(flag);
        self.params.extend(param);
    }

    fn is_empty(&self) -> bool {
        self.modes.is_empty()
    }
}

/// Build a line originated by `id`
fn from_client(
    registry: &ConnectionRegistry,
    id: &ClientId,
    command: MessageType,
    params: Vec<String>,
) -> Option<Message> {
    registry
        .get(id)
        .map(|client| Message::with_prefix(client.prefix(), command, params))
}

impl ChannelDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Channel> {
        self.channels.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.channels.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Send `message` to every member of `name`, optionally skipping one
    pub fn broadcast(
        &self,
        registry: &ConnectionRegistry,
        name: &str,
        message: &Message,
        except: Option<&ClientId>,
    ) {
        if let Some(channel) = self.channels.get(name) {
            for member in channel.members_by_join_order() {
                if Some(&member) != except {
                    registry.send(&member, message.clone());
                }
            }
        }
    }

    /// Everyone sharing at least one channel with `id`, excluding `id`
    pub fn peers_of(&self, registry: &ConnectionRegistry, id: &ClientId) -> BTreeSet<ClientId> {
        let mut peers = BTreeSet::new();
        if let Some(client) = registry.get(id) {
            for name in &client.channels {
                if let Some(channel) = self.channels.get(name) {
                    peers.extend(channel.member_ids());
                }
            }
        }
        peers.remove(id);
        peers
    }

    fn remove_if_empty(&mut self, name: &str) {
        if self.channels.get(name).map(|c| c.is_empty()).unwrap_or(false) {
            self.channels.remove(name);
            info!("Channel {} destroyed", name);
        }
    }

    /// Drop `id` from `name` and from the client's own channel list
    fn detach(&mut self, registry: &mut ConnectionRegistry, id: &ClientId, name: &str) {
        if let Some(channel) = self.channels.get_mut(name) {
            channel.remove_member(id);
        }
        if let Some(client) = registry.get_mut(id) {
            client.channels.remove(name);
        }
        self.remove_if_empty(name);
    }

    /// Send topic (if any) and NAMES to `to`
    pub fn send_names(&self, registry: &ConnectionRegistry, name: &str, to: &ClientId) {
        let Some(channel) = self.channels.get(name) else {
            return;
        };
        let server = registry.server_name();
        let nick = registry.nick_of(to);

        let names: Vec<String> = channel
            .members_by_join_order()
            .iter()
            .map(|member| {
                let prefix = if channel.is_operator(member) { "@" } else { "" };
                format!("{}{}", prefix, registry.nick_of(member))
            })
            .collect();

        registry.send(to, NumericReply::name_reply(server, nick, name, &names.join(" ")));
        registry.send(to, NumericReply::end_of_names(server, nick, name));
    }

    /// JOIN one channel
    pub fn join(
        &mut self,
        registry: &mut ConnectionRegistry,
        id: &ClientId,
        name: &str,
        key: &str,
    ) -> ProtocolResult {
        if !is_valid_channel_name(name) {
            return Err(ProtocolError::BadChannelMask(name.to_string()));
        }

        match self.channels.get_mut(name) {
            Some(channel) => {
                if channel.has_member(id) {
                    return Ok(());
                }
                channel.can_join(id, key)?;
                channel.add_member(*id);
            }
            None => {
                self.channels
                    .insert(name.to_string(), Channel::with_creator(name.to_string(), *id));
                info!("Channel {} created by {}", name, registry.nick_of(id));
            }
        }

        if let Some(client) = registry.get_mut(id) {
            client.channels.insert(name.to_string());
        }

        if let Some(join) = from_client(registry, id, MessageType::Join, vec![name.to_string()]) {
            self.broadcast(registry, name, &join, None);
        }

        if let Some(channel) = self.channels.get(name) {
            if !channel.topic.is_empty() {
                let server = registry.server_name();
                let reply = NumericReply::topic(server, registry.nick_of(id), name, &channel.topic);
                registry.send(id, reply);
            }
        }
        self.send_names(registry, name, id);
        Ok(())
    }

    /// PART one channel
    pub fn part(
        &mut self,
        registry: &mut ConnectionRegistry,
        id: &ClientId,
        name: &str,
        reason: Option<&str>,
    ) -> ProtocolResult {
        let channel = self
            .channels
            .get(name)
            .ok_or_else(|| ProtocolError::NoSuchNick(name.to_string()))?;
        if !channel.has_member(id) {
            return Err(ProtocolError::NotOnChannel(name.to_string()));
        }

        let mut params = vec![name.to_string()];
        params.extend(reason.map(|r| r.to_string()));
        if let Some(part) = from_client(registry, id, MessageType::Part, params) {
            self.broadcast(registry, name, &part, None);
        }

        self.detach(registry, id, name);
        Ok(())
    }

    /// KICK `target_nick` out of `name`
    pub fn kick(
        &mut self,
        registry: &mut ConnectionRegistry,
        id: &ClientId,
        name: &str,
        target_nick: &str,
        reason: &str,
    ) -> ProtocolResult {
        let channel = self
            .channels
            .get(name)
            .ok_or_else(|| ProtocolError::NoSuchNick(name.to_string()))?;
        if !channel.has_member(id) {
            return Err(ProtocolError::NotOnChannel(name.to_string()));
        }
        if !channel.is_operator(id) {
            return Err(ProtocolError::ChanOpPrivsNeeded(name.to_string()));
        }

        let target = registry
            .find_by_nick(target_nick)
            .ok_or_else(|| ProtocolError::NoSuchNick(target_nick.to_string()))?;
        if !channel.has_member(&target) {
            return Err(ProtocolError::UserNotInChannel(
                target_nick.to_string(),
                name.to_string(),
            ));
        }

        let params = vec![
            name.to_string(),
            registry.nick_of(&target).to_string(),
            reason.to_string(),
        ];
        if let Some(kick) = from_client(registry, id, MessageType::Kick, params) {
            self.broadcast(registry, name, &kick, None);
        }

        debug!("{} kicked {} from {}", registry.nick_of(id), registry.nick_of(&target), name);
        self.detach(registry, &target, name);
        Ok(())
    }

    /// INVITE `target_nick` to `name`
    pub fn invite(
        &mut self,
        registry: &ConnectionRegistry,
        id: &ClientId,
        target_nick: &str,
        name: &str,
    ) -> ProtocolResult {
        let channel = self
            .channels
            .get_mut(name)
            .ok_or_else(|| ProtocolError::NoSuchNick(name.to_string()))?;
        if !channel.has_member(id) {
            return Err(ProtocolError::NotOnChannel(name.to_string()));
        }
        if channel.has_mode('i') && !channel.is_operator(id) {
            return Err(ProtocolError::ChanOpPrivsNeeded(name.to_string()));
        }

        let target = registry
            .find_by_nick(target_nick)
            .ok_or_else(|| ProtocolError::NoSuchNick(target_nick.to_string()))?;
        let target_nick = registry.nick_of(&target).to_string();
        if channel.has_member(&target) {
            return Err(ProtocolError::UserOnChannel(target_nick, name.to_string()));
        }

        channel.invite(target);

        let server = registry.server_name();
        registry.send(id, NumericReply::inviting(server, registry.nick_of(id), &target_nick, name));
        if let Some(invite) = from_client(
            registry,
            id,
            MessageType::Invite,
            vec![target_nick, name.to_string()],
        ) {
            registry.send(&target, invite);
        }
        Ok(())
    }

    /// TOPIC query or change
    pub fn topic(
        &mut self,
        registry: &ConnectionRegistry,
        id: &ClientId,
        name: &str,
        new_topic: Option<&str>,
    ) -> ProtocolResult {
        let channel = self
            .channels
            .get_mut(name)
            .ok_or_else(|| ProtocolError::NoSuchNick(name.to_string()))?;

        let Some(new_topic) = new_topic else {
            let server = registry.server_name();
            let nick = registry.nick_of(id);
            let reply = if channel.topic.is_empty() {
                NumericReply::no_topic(server, nick, name)
            } else {
                NumericReply::topic(server, nick, name, &channel.topic)
            };
            registry.send(id, reply);
            return Ok(());
        };

        if !channel.has_member(id) {
            return Err(ProtocolError::NotOnChannel(name.to_string()));
        }
        if channel.has_mode('t') && !channel.is_operator(id) {
            return Err(ProtocolError::ChanOpPrivsNeeded(name.to_string()));
        }

        channel.set_topic(new_topic);
        let params = vec![name.to_string(), new_topic.to_string()];
        if let Some(topic) = from_client(registry, id, MessageType::Topic, params) {
            self.broadcast(registry, name, &topic, None);
        }
        Ok(())
    }

    /// Channel MODE query or change
    pub fn mode(
        &mut self,
        registry: &ConnectionRegistry,
        id: &ClientId,
        name: &str,
        modestring: Option<&str>,
        args: &[String],
    ) -> ProtocolResult {
        let channel = self
            .channels
            .get_mut(name)
            .ok_or_else(|| ProtocolError::NoSuchNick(name.to_string()))?;

        // Queries reveal the key, so they are operator-only like changes
        if !channel.is_operator(id) {
            return Err(ProtocolError::ChanOpPrivsNeeded(name.to_string()));
        }

        let Some(modestring) = modestring.filter(|m| !m.is_empty()) else {
            let reply = NumericReply::channel_mode_is(
                registry.server_name(),
                registry.nick_of(id),
                name,
                &channel.mode_reply(),
            );
            registry.send(id, reply);
            return Ok(());
        };

        let mut adding = true;
        let mut args = args.iter();
        let mut changes = ModeChanges::default();

        for c in modestring.chars() {
            match c {
                '+' => adding = true,
                '-' => adding = false,
                _ => match ChannelMode::from_char(c) {
                    Some(ChannelMode::InviteOnly) | Some(ChannelMode::TopicOps) => {
                        if adding {
                            channel.add_mode(c);
                        } else {
                            channel.remove_mode(c);
                        }
                        changes.push(adding, c, None);
                    }
                    Some(ChannelMode::Keyed) => {
                        if !adding {
                            channel.set_key(None);
                            changes.push(false, c, None);
                        } else if let Some(key) = args.next().filter(|k| !k.is_empty()) {
                            channel.set_key(Some(key.clone()));
                            changes.push(true, c, Some(key.clone()));
                        }
                    }
                    Some(ChannelMode::UserLimit) => {
                        if !adding {
                            channel.set_user_limit(None);
                            changes.push(false, c, None);
                        } else if let Some(arg) = args.next() {
                            match arg.parse::<i64>() {
                                Ok(limit) if limit > 0 => {
                                    channel.set_user_limit(Some(limit as usize));
                                    changes.push(true, c, Some(limit.to_string()));
                                }
                                _ => debug!("Ignoring limit {:?} on {}", arg, name),
                            }
                        }
                    }
                    Some(ChannelMode::Operator) => {
                        if let Some(nick) = args.next() {
                            if let Some(target) = registry.find_by_nick(nick) {
                                if channel.set_operator(&target, adding) {
                                    changes.push(adding, c, Some(registry.nick_of(&target).to_string()));
                                }
                            }
                        }
                    }
                    None => registry.send_error(id, &ProtocolError::UnknownMode(c)),
                },
            }
        }

        if changes.is_empty() {
            return Ok(());
        }

        let mut params = vec![name.to_string(), changes.modes];
        params.extend(changes.params);
        if let Some(mode) = from_client(registry, id, MessageType::Mode, params) {
            self.broadcast(registry, name, &mode, None);
        }
        Ok(())
    }

    /// PRIVMSG or NOTICE addressed to a channel
    pub fn message(
        &self,
        registry: &ConnectionRegistry,
        id: &ClientId,
        name: &str,
        command: MessageType,
        text: &str,
    ) -> ProtocolResult {
        let channel = self
            .channels
            .get(name)
            .ok_or_else(|| ProtocolError::NoSuchNick(name.to_string()))?;
        if !channel.has_member(id) {
            return Err(ProtocolError::CannotSendToChan(name.to_string()));
        }

        let params = vec![name.to_string(), text.to_string()];
        if let Some(message) = from_client(registry, id, command, params) {
            self.broadcast(registry, name, &message, Some(id));
        }
        Ok(())
    }

    /// Tear a departing client out of every channel, telling each peer once
    pub fn remove_client(&mut self, registry: &mut ConnectionRegistry, id: &ClientId, reason: &str) {
        let joined: Vec<String> = match registry.get(id) {
            Some(client) => client.channels.iter().cloned().collect(),
            None => return,
        };
        if joined.is_empty() {
            return;
        }

        if let Some(quit) = from_client(registry, id, MessageType::Quit, vec![reason.to_string()]) {
            for peer in self.peers_of(registry, id) {
                registry.send(&peer, quit.clone());
            }
        }

        for name in joined {
            self.detach(registry, id, &name);
        }
    }
}
