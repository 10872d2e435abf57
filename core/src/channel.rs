//! Channel state
//!
//! A `Channel` refers to its members only by `ClientId`; the registry owns
//! the connections themselves. Operator status is a per-member mode, so the
//! operator set can never contain a non-member.

use crate::{ClientId, ProtocolError, ProtocolResult};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Channel modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelMode {
    /// Invite only
    InviteOnly,
    /// Topic settable by channel operator only
    TopicOps,
    /// Channel is keyed (password protected)
    Keyed,
    /// User limit
    UserLimit,
    /// Channel operator status, held per member
    Operator,
}

impl ChannelMode {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'i' => Some(ChannelMode::InviteOnly),
            't' => Some(ChannelMode::TopicOps),
            'k' => Some(ChannelMode::Keyed),
            'l' => Some(ChannelMode::UserLimit),
            'o' => Some(ChannelMode::Operator),
            _ => None,
        }
    }

    pub fn as_char(&self) -> char {
        match self {
            ChannelMode::InviteOnly => 'i',
            ChannelMode::TopicOps => 't',
            ChannelMode::Keyed => 'k',
            ChannelMode::UserLimit => 'l',
            ChannelMode::Operator => 'o',
        }
    }
}

/// Channel member with modes
#[derive(Debug, Clone)]
pub struct ChannelMember {
    pub client_id: ClientId,
    pub modes: HashSet<char>,
    /// Join sequence number, for stable NAMES ordering
    joined: u64,
}

impl ChannelMember {
    fn new(client_id: ClientId, joined: u64) -> Self {
        Self {
            client_id,
            modes: HashSet::new(),
            joined,
        }
    }

    pub fn is_operator(&self) -> bool {
        self.modes.contains(&'o')
    }
}

/// Channel information and state
#[derive(Debug, Clone)]
pub struct Channel {
    /// Channel name
    pub name: String,
    /// Channel topic, empty when unset
    pub topic: String,
    /// Channel key, empty when none is required
    pub key: String,
    /// User limit, 0 when unlimited
    pub user_limit: usize,
    /// Channel-level mode flags (i, t, k, l)
    modes: HashSet<char>,
    /// Channel members
    members: HashMap<ClientId, ChannelMember>,
    /// Clients allowed past +i on their next join
    invites: HashSet<ClientId>,
    next_seq: u64,
}

impl Channel {
    /// Create an empty channel
    pub fn new(name: String) -> Self {
        Self {
            name,
            topic: String::new(),
            key: String::new(),
            user_limit: 0,
            modes: HashSet::new(),
            members: HashMap::new(),
            invites: HashSet::new(),
            next_seq: 0,
        }
    }

    /// Create a channel whose creator is its only member and operator
    pub fn with_creator(name: String, creator: ClientId) -> Self {
        let mut channel = Self::new(name);
        channel.add_member(creator);
        channel.set_operator(&creator, true);
        channel
    }

    pub fn has_mode(&self, mode: char) -> bool {
        self.modes.contains(&mode)
    }

    pub fn add_mode(&mut self, mode: char) {
        self.modes.insert(mode);
    }

    pub fn remove_mode(&mut self, mode: char) {
        self.modes.remove(&mode);
    }

    /// Set or clear the key together with the `k` flag
    pub fn set_key(&mut self, key: Option<String>) {
        match key {
            Some(key) => {
                self.key = key;
                self.add_mode('k');
            }
            None => {
                self.key.clear();
                self.remove_mode('k');
            }
        }
    }

    /// Set or clear the user limit together with the `l` flag
    pub fn set_user_limit(&mut self, limit: Option<usize>) {
        match limit {
            Some(limit) => {
                self.user_limit = limit;
                self.add_mode('l');
            }
            None => {
                self.user_limit = 0;
                self.remove_mode('l');
            }
        }
    }

    /// Set the topic; an empty topic unsets it
    pub fn set_topic(&mut self, topic: &str) {
        self.topic = topic.to_string();
    }

    /// `+` followed by the set flags in sorted order
    pub fn modes_string(&self) -> String {
        let mut flags: Vec<char> = self.modes.iter().copied().collect();
        flags.sort_unstable();
        let mut s = String::from("+");
        s.extend(flags);
        s
    }

    /// Mode string followed by the key and limit values it implies
    pub fn mode_reply(&self) -> Vec<String> {
        let modes = self.modes_string();
        let mut reply = vec![modes.clone()];
        for flag in modes.chars() {
            match flag {
                'k' => reply.push(self.key.clone()),
                'l' => reply.push(self.user_limit.to_string()),
                _ => {}
            }
        }
        reply
    }

    /// Add a member. Returns false if already present. Consumes any invite.
    pub fn add_member(&mut self, client_id: ClientId) -> bool {
        if self.members.contains_key(&client_id) {
            return false;
        }
        self.invites.remove(&client_id);
        self.members
            .insert(client_id, ChannelMember::new(client_id, self.next_seq));
        self.next_seq += 1;
        true
    }

    /// Remove a member. Returns false if it was not present.
    pub fn remove_member(&mut self, client_id: &ClientId) -> bool {
        self.invites.remove(client_id);
        self.members.remove(client_id).is_some()
    }

    pub fn has_member(&self, client_id: &ClientId) -> bool {
        self.members.contains_key(client_id)
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Member IDs in the order they joined
    pub fn members_by_join_order(&self) -> Vec<ClientId> {
        let mut members: Vec<&ChannelMember> = self.members.values().collect();
        members.sort_by_key(|m| m.joined);
        members.into_iter().map(|m| m.client_id).collect()
    }

    /// Member IDs as a set
    pub fn member_ids(&self) -> BTreeSet<ClientId> {
        self.members.keys().copied().collect()
    }

    pub fn is_operator(&self, client_id: &ClientId) -> bool {
        self.members
            .get(client_id)
            .map(|m| m.is_operator())
            .unwrap_or(false)
    }

    /// Grant or revoke operator status. Returns false for non-members.
    pub fn set_operator(&mut self, client_id: &ClientId, is_op: bool) -> bool {
        match self.members.get_mut(client_id) {
            Some(member) => {
                if is_op {
                    member.modes.insert('o');
                } else {
                    member.modes.remove(&'o');
                }
                true
            }
            None => false,
        }
    }

    /// Operator IDs
    pub fn operators(&self) -> BTreeSet<ClientId> {
        self.members
            .values()
            .filter(|m| m.is_operator())
            .map(|m| m.client_id)
            .collect()
    }

    pub fn is_invited(&self, client_id: &ClientId) -> bool {
        self.invites.contains(client_id)
    }

    /// Grant a one-time pass through `+i`. Returns false if already invited.
    pub fn invite(&mut self, client_id: ClientId) -> bool {
        self.invites.insert(client_id)
    }

    /// Admission check for a join attempt: limit, then invite, then key
    pub fn can_join(&self, client_id: &ClientId, key: &str) -> ProtocolResult {
        if self.has_mode('l') && self.members.len() >= self.user_limit {
            return Err(ProtocolError::ChannelIsFull(self.name.clone()));
        }
        if self.has_mode('i') && !self.is_invited(client_id) {
            return Err(ProtocolError::InviteOnlyChan(self.name.clone()));
        }
        if self.has_mode('k') && key != self.key {
            return Err(ProtocolError::BadChannelKey(self.name.clone()));
        }
        Ok(())
    }
}
