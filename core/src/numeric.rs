//! Numeric replies sent by the relay

use crate::{Message, MessageType, Prefix};

/// Numeric reply codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericReply {
    // Registration
    RplWelcome,
    RplYourHost,
    RplCreated,
    RplMyInfo,

    // Command replies
    RplUmodeIs,
    RplEndOfWho,
    RplChannelModeIs,
    RplNoTopic,
    RplTopic,
    RplInviting,
    RplNameReply,
    RplEndOfNames,

    // Error replies
    ErrNoSuchNick,
    ErrCannotSendToChan,
    ErrUnknownCommand,
    ErrNoNicknameGiven,
    ErrErroneousNickname,
    ErrNicknameInUse,
    ErrUserNotInChannel,
    ErrNotOnChannel,
    ErrUserOnChannel,
    ErrNotRegistered,
    ErrNeedMoreParams,
    ErrAlreadyRegistered,
    ErrPasswordMismatch,
    ErrChannelIsFull,
    ErrUnknownMode,
    ErrInviteOnlyChan,
    ErrBadChannelKey,
    ErrBadChannelMask,
    ErrChanOpPrivsNeeded,
    ErrUsersDontMatch,
}

impl NumericReply {
    /// Get the numeric code as a u16
    pub fn code(&self) -> u16 {
        match self {
            NumericReply::RplWelcome => 1,
            NumericReply::RplYourHost => 2,
            NumericReply::RplCreated => 3,
            NumericReply::RplMyInfo => 4,
            NumericReply::RplUmodeIs => 221,
            NumericReply::RplEndOfWho => 315,
            NumericReply::RplChannelModeIs => 324,
            NumericReply::RplNoTopic => 331,
            NumericReply::RplTopic => 332,
            NumericReply::RplInviting => 341,
            NumericReply::RplNameReply => 353,
            NumericReply::RplEndOfNames => 366,
            NumericReply::ErrNoSuchNick => 401,
            NumericReply::ErrCannotSendToChan => 404,
            NumericReply::ErrUnknownCommand => 421,
            NumericReply::ErrNoNicknameGiven => 431,
            NumericReply::ErrErroneousNickname => 432,
            NumericReply::ErrNicknameInUse => 433,
            NumericReply::ErrUserNotInChannel => 441,
            NumericReply::ErrNotOnChannel => 442,
            NumericReply::ErrUserOnChannel => 443,
            NumericReply::ErrNotRegistered => 451,
            NumericReply::ErrNeedMoreParams => 461,
            NumericReply::ErrAlreadyRegistered => 462,
            NumericReply::ErrPasswordMismatch => 464,
            NumericReply::ErrChannelIsFull => 471,
            NumericReply::ErrUnknownMode => 472,
            NumericReply::ErrInviteOnlyChan => 473,
            NumericReply::ErrBadChannelKey => 475,
            NumericReply::ErrBadChannelMask => 476,
            NumericReply::ErrChanOpPrivsNeeded => 482,
            NumericReply::ErrUsersDontMatch => 502,
        }
    }

    /// Create a numeric reply message from `server` addressed to `target`
    pub fn reply(&self, server: &str, target: &str, params: Vec<String>) -> Message {
        let mut all_params = vec![target.to_string()];
        all_params.extend(params);

        Message::with_prefix(
            Prefix::Server(server.to_string()),
            MessageType::Numeric(self.code()),
            all_params,
        )
    }
}

/// Common numeric replies
impl NumericReply {
    /// RPL_WELCOME
    pub fn welcome(server: &str, nick: &str, user: &str, host: &str) -> Message {
        Self::RplWelcome.reply(
            server,
            nick,
            vec![format!("Welcome to the Internet Relay Network {}!{}@{}", nick, user, host)],
        )
    }

    /// RPL_YOURHOST
    pub fn your_host(server: &str, nick: &str, version: &str) -> Message {
        Self::RplYourHost.reply(
            server,
            nick,
            vec![format!("Your host is {}, running version {}", server, version)],
        )
    }

    /// RPL_CREATED
    pub fn created(server: &str, nick: &str, date: &str) -> Message {
        Self::RplCreated.reply(server, nick, vec![format!("This server was created {}", date)])
    }

    /// RPL_MYINFO
    pub fn my_info(server: &str, nick: &str, version: &str) -> Message {
        Self::RplMyInfo.reply(server, nick, vec![format!("{} {} o itklo", server, version)])
    }

    /// RPL_UMODEIS
    pub fn umode_is(server: &str, nick: &str) -> Message {
        Self::RplUmodeIs.reply(server, nick, vec!["+".to_string()])
    }

    /// RPL_ENDOFWHO
    pub fn end_of_who(server: &str, nick: &str, mask: Option<&str>) -> Message {
        let mut params: Vec<String> = mask.map(|m| vec![m.to_string()]).unwrap_or_default();
        params.push("End of WHO list".to_string());
        Self::RplEndOfWho.reply(server, nick, params)
    }

    /// RPL_CHANNELMODEIS
    pub fn channel_mode_is(server: &str, nick: &str, channel: &str, modes: &[String]) -> Message {
        let mut params = vec![channel.to_string()];
        params.extend(modes.iter().cloned());
        Self::RplChannelModeIs.reply(server, nick, params)
    }

    /// RPL_NOTOPIC
    pub fn no_topic(server: &str, nick: &str, channel: &str) -> Message {
        Self::RplNoTopic.reply(server, nick, vec![channel.to_string(), "No topic is set".to_string()])
    }

    /// RPL_TOPIC
    pub fn topic(server: &str, nick: &str, channel: &str, topic: &str) -> Message {
        Self::RplTopic.reply(server, nick, vec![channel.to_string(), topic.to_string()])
    }

    /// RPL_INVITING
    pub fn inviting(server: &str, nick: &str, target: &str, channel: &str) -> Message {
        Self::RplInviting.reply(server, nick, vec![target.to_string(), channel.to_string()])
    }

    /// RPL_NAMREPLY
    pub fn name_reply(server: &str, nick: &str, channel: &str, names: &str) -> Message {
        Self::RplNameReply.reply(
            server,
            nick,
            vec!["=".to_string(), channel.to_string(), names.to_string()],
        )
    }

    /// RPL_ENDOFNAMES
    pub fn end_of_names(server: &str, nick: &str, channel: &str) -> Message {
        Self::RplEndOfNames.reply(server, nick, vec![channel.to_string(), "End of NAMES list".to_string()])
    }
}
