//! Protocol line parsing and serialization
//!
//! A line is `[:prefix] COMMAND [params...] [:trailing]`. Parsing is lenient:
//! any line yields a `Message`, and an empty line yields an empty command that
//! the dispatcher ignores.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Message prefix (server or user)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Prefix {
    /// Server name
    Server(String),
    /// User prefix (nick!user@host)
    User {
        nick: String,
        user: String,
        host: String,
    },
}

impl Prefix {
    /// Parse a prefix token without its leading colon
    pub fn parse(token: &str) -> Self {
        if let Some((nick, rest)) = token.split_once('!') {
            if let Some((user, host)) = rest.split_once('@') {
                return Prefix::User {
                    nick: nick.to_string(),
                    user: user.to_string(),
                    host: host.to_string(),
                };
            }
        }
        Prefix::Server(token.to_string())
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prefix::Server(name) => write!(f, "{}", name),
            Prefix::User { nick, user, host } => write!(f, "{}!{}@{}", nick, user, host),
        }
    }
}

/// Command of a protocol line
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageType {
    // Connection registration
    Password,
    Nick,
    User,
    Quit,

    // Channel operations
    Join,
    Part,
    Mode,
    Topic,
    Invite,
    Kick,

    // Messaging
    PrivMsg,
    Notice,

    // Queries and keepalive
    Who,
    Ping,
    Pong,
    Error,

    /// Three digit numeric reply
    Numeric(u16),

    /// Anything else, uppercased; empty for a blank line
    Custom(String),
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MessageType::Password => "PASS",
            MessageType::Nick => "NICK",
            MessageType::User => "USER",
            MessageType::Quit => "QUIT",
            MessageType::Join => "JOIN",
            MessageType::Part => "PART",
            MessageType::Mode => "MODE",
            MessageType::Topic => "TOPIC",
            MessageType::Invite => "INVITE",
            MessageType::Kick => "KICK",
            MessageType::PrivMsg => "PRIVMSG",
            MessageType::Notice => "NOTICE",
            MessageType::Who => "WHO",
            MessageType::Ping => "PING",
            MessageType::Pong => "PONG",
            MessageType::Error => "ERROR",
            MessageType::Numeric(code) => return write!(f, "{:03}", code),
            MessageType::Custom(cmd) => cmd,
        };
        write!(f, "{}", s)
    }
}

impl From<&str> for MessageType {
    fn from(s: &str) -> Self {
        let upper = s.to_ascii_uppercase();
        match upper.as_str() {
            "PASS" => MessageType::Password,
            "NICK" => MessageType::Nick,
            "USER" => MessageType::User,
            "QUIT" => MessageType::Quit,
            "JOIN" => MessageType::Join,
            "PART" => MessageType::Part,
            "MODE" => MessageType::Mode,
            "TOPIC" => MessageType::Topic,
            "INVITE" => MessageType::Invite,
            "KICK" => MessageType::Kick,
            "PRIVMSG" => MessageType::PrivMsg,
            "NOTICE" => MessageType::Notice,
            "WHO" => MessageType::Who,
            "PING" => MessageType::Ping,
            "PONG" => MessageType::Pong,
            "ERROR" => MessageType::Error,
            _ if upper.len() == 3 && upper.bytes().all(|b| b.is_ascii_digit()) => {
                MessageType::Numeric(upper.parse().unwrap_or_default())
            }
            _ => MessageType::Custom(upper),
        }
    }
}

impl MessageType {
    /// Parameter index holding free text for this command, if any.
    /// That parameter is always written in trailing form.
    fn text_position(&self, param_count: usize) -> Option<usize> {
        match self {
            MessageType::Numeric(324) | MessageType::Numeric(341) => None,
            MessageType::Numeric(_) => param_count.checked_sub(1),
            MessageType::PrivMsg
            | MessageType::Notice
            | MessageType::Topic
            | MessageType::Part
            | MessageType::Invite => Some(1),
            MessageType::Kick => Some(2),
            MessageType::Quit
            | MessageType::Error
            | MessageType::Pong
            | MessageType::Nick
            | MessageType::Join => Some(0),
            _ => None,
        }
    }
}

/// One protocol line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Optional prefix (server or user)
    pub prefix: Option<Prefix>,
    /// Message command/type
    pub command: MessageType,
    /// Message parameters
    pub params: Vec<String>,
}

impl Message {
    /// Create a new message
    pub fn new(command: MessageType, params: Vec<String>) -> Self {
        Self {
            prefix: None,
            command,
            params,
        }
    }

    /// Create a new message with prefix
    pub fn with_prefix(prefix: Prefix, command: MessageType, params: Vec<String>) -> Self {
        Self {
            prefix: Some(prefix),
            command,
            params,
        }
    }

    /// Parse one line (without its delimiter)
    pub fn parse(input: &str) -> Self {
        let mut rest = input.trim_end_matches(&['\r', '\n'][..]).trim_start();

        let mut prefix = None;
        if let Some(stripped) = rest.strip_prefix(':') {
            let (token, after) = split_token(stripped);
            prefix = Some(Prefix::parse(token));
            rest = after;
        }

        let (command, mut rest) = split_token(rest.trim_start());
        let mut params = Vec::new();
        loop {
            rest = rest.trim_start();
            if rest.is_empty() {
                break;
            }
            if let Some(trailing) = rest.strip_prefix(':') {
                params.push(trailing.to_string());
                break;
            }
            let (token, after) = split_token(rest);
            params.push(token.to_string());
            rest = after;
        }

        Message {
            prefix,
            command: MessageType::from(command),
            params,
        }
    }

    /// True for the empty command a blank line parses to
    pub fn is_empty(&self) -> bool {
        matches!(&self.command, MessageType::Custom(cmd) if cmd.is_empty())
    }

    /// Parameter at `index`, if present
    pub fn param(&self, index: usize) -> Option<&str> {
        self.params.get(index).map(|s| s.as_str())
    }

    /// Serialize to a wire line terminated by CRLF
    pub fn to_line(&self) -> String {
        format!("{}\r\n", self)
    }
}

/// Split off the first whitespace-delimited token
fn split_token(s: &str) -> (&str, &str) {
    match s.find(|c: char| c.is_ascii_whitespace()) {
        Some(pos) => (&s[..pos], &s[pos..]),
        None => (s, ""),
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref prefix) = self.prefix {
            write!(f, ":{} ", prefix)?;
        }
        write!(f, "{}", self.command)?;

        let last = self.params.len().saturating_sub(1);
        let text_at = self.command.text_position(self.params.len());
        for (i, param) in self.params.iter().enumerate() {
            let trailing = i == last
                && (text_at == Some(i)
                    || param.is_empty()
                    || param.contains(' ')
                    || param.starts_with(':'));
            if trailing {
                write!(f, " :{}", param)?;
            } else {
                write!(f, " {}", param)?;
            }
        }
        Ok(())
    }
}
