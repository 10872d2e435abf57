//! Error types for the relay server

use crate::NumericReply;
use thiserror::Error;

/// Main error type for the relay server
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Connection error: {0}")]
    Connection(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// A command that was rejected. Every variant is reported to the offending
/// connection as exactly one numeric reply, whose trailing text is the
/// `Display` output of the variant.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Not enough parameters")]
    NeedMoreParams(String),

    #[error("You may not reregister")]
    AlreadyRegistered,

    #[error("Password incorrect")]
    PasswordMismatch,

    #[error("No nickname given")]
    NoNicknameGiven,

    #[error("Erroneous nickname")]
    ErroneousNickname(String),

    #[error("Nickname is already in use")]
    NicknameInUse(String),

    #[error("You have not registered")]
    NotRegistered,

    #[error("Unknown command")]
    UnknownCommand(String),

    #[error("No such nick/channel")]
    NoSuchNick(String),

    #[error("Cannot send to channel")]
    CannotSendToChan(String),

    #[error("They aren't on that channel")]
    UserNotInChannel(String, String),

    #[error("You're not on that channel")]
    NotOnChannel(String),

    #[error("is already on channel")]
    UserOnChannel(String, String),

    #[error("Cannot join channel (+l)")]
    ChannelIsFull(String),

    #[error("is unknown mode char to me")]
    UnknownMode(char),

    #[error("Cannot join channel (+i)")]
    InviteOnlyChan(String),

    #[error("Cannot join channel (+k)")]
    BadChannelKey(String),

    #[error("Bad Channel Mask")]
    BadChannelMask(String),

    #[error("You're not channel operator")]
    ChanOpPrivsNeeded(String),

    #[error("Cannot change mode for other users")]
    UsersDontMatch,
}

impl ProtocolError {
    /// Numeric reply this failure is reported with
    pub fn numeric(&self) -> NumericReply {
        match self {
            ProtocolError::NeedMoreParams(_) => NumericReply::ErrNeedMoreParams,
            ProtocolError::AlreadyRegistered => NumericReply::ErrAlreadyRegistered,
            ProtocolError::PasswordMismatch => NumericReply::ErrPasswordMismatch,
            ProtocolError::NoNicknameGiven => NumericReply::ErrNoNicknameGiven,
            ProtocolError::ErroneousNickname(_) => NumericReply::ErrErroneousNickname,
            ProtocolError::NicknameInUse(_) => NumericReply::ErrNicknameInUse,
            ProtocolError::NotRegistered => NumericReply::ErrNotRegistered,
            ProtocolError::UnknownCommand(_) => NumericReply::ErrUnknownCommand,
            ProtocolError::NoSuchNick(_) => NumericReply::ErrNoSuchNick,
            ProtocolError::CannotSendToChan(_) => NumericReply::ErrCannotSendToChan,
            ProtocolError::UserNotInChannel(..) => NumericReply::ErrUserNotInChannel,
            ProtocolError::NotOnChannel(_) => NumericReply::ErrNotOnChannel,
            ProtocolError::UserOnChannel(..) => NumericReply::ErrUserOnChannel,
            ProtocolError::ChannelIsFull(_) => NumericReply::ErrChannelIsFull,
            ProtocolError::UnknownMode(_) => NumericReply::ErrUnknownMode,
            ProtocolError::InviteOnlyChan(_) => NumericReply::ErrInviteOnlyChan,
            ProtocolError::BadChannelKey(_) => NumericReply::ErrBadChannelKey,
            ProtocolError::BadChannelMask(_) => NumericReply::ErrBadChannelMask,
            ProtocolError::ChanOpPrivsNeeded(_) => NumericReply::ErrChanOpPrivsNeeded,
            ProtocolError::UsersDontMatch => NumericReply::ErrUsersDontMatch,
        }
    }

    /// Parameters placed between the reply target and the trailing text
    pub fn subject(&self) -> Vec<String> {
        match self {
            ProtocolError::NeedMoreParams(s)
            | ProtocolError::ErroneousNickname(s)
            | ProtocolError::NicknameInUse(s)
            | ProtocolError::UnknownCommand(s)
            | ProtocolError::NoSuchNick(s)
            | ProtocolError::CannotSendToChan(s)
            | ProtocolError::NotOnChannel(s)
            | ProtocolError::ChannelIsFull(s)
            | ProtocolError::InviteOnlyChan(s)
            | ProtocolError::BadChannelKey(s)
            | ProtocolError::BadChannelMask(s)
            | ProtocolError::ChanOpPrivsNeeded(s) => vec![s.clone()],
            ProtocolError::UserNotInChannel(nick, chan) | ProtocolError::UserOnChannel(nick, chan) => {
                vec![nick.clone(), chan.clone()]
            }
            ProtocolError::UnknownMode(c) => vec![c.to_string()],
            ProtocolError::AlreadyRegistered
            | ProtocolError::PasswordMismatch
            | ProtocolError::NoNicknameGiven
            | ProtocolError::NotRegistered
            | ProtocolError::UsersDontMatch => Vec::new(),
        }
    }

    /// Full parameter list of the numeric, trailing text last
    pub fn params(&self) -> Vec<String> {
        let mut params = self.subject();
        params.push(self.to_string());
        params
    }
}

/// Outcome of a protocol handler
pub type ProtocolResult<T = ()> = std::result::Result<T, ProtocolError>;
