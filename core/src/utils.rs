//! Utility functions and helpers

/// Maximum nickname length
pub const MAX_NICKNAME_LENGTH: usize = 9;

/// Maximum channel name length
pub const MAX_CHANNEL_NAME_LENGTH: usize = 50;

/// String utilities
pub mod string {
    use super::{MAX_CHANNEL_NAME_LENGTH, MAX_NICKNAME_LENGTH};

    const NICK_SPECIAL: &str = "[]{}\\|_";

    /// Check if a string is a valid channel name
    pub fn is_valid_channel_name(name: &str) -> bool {
        let mut chars = name.chars();
        match chars.next() {
            Some('#') | Some('&') => {}
            _ => return false,
        }

        if name.chars().count() > MAX_CHANNEL_NAME_LENGTH {
            return false;
        }

        // No spaces, control characters (BEL included) or list separators
        chars.all(|c| c > ' ' && c != '\x7f' && c != ',')
    }

    /// Check if a string is a valid nickname
    pub fn is_valid_nickname(nick: &str) -> bool {
        if nick.is_empty() || nick.len() > MAX_NICKNAME_LENGTH {
            return false;
        }

        let mut chars = nick.chars();
        let first_ok = chars
            .next()
            .map(|c| c.is_ascii_alphabetic() || NICK_SPECIAL.contains(c))
            .unwrap_or(false);
        if !first_ok {
            return false;
        }

        chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || NICK_SPECIAL.contains(c))
    }

    /// Check whether a target names a channel rather than a nickname
    pub fn is_channel_target(target: &str) -> bool {
        target.starts_with('#') || target.starts_with('&')
    }

    /// ASCII casefold used for nickname identity
    pub fn irc_lower(s: &str) -> String {
        s.to_ascii_lowercase()
    }

    /// Case-insensitive nickname comparison
    pub fn nick_eq(a: &str, b: &str) -> bool {
        a.eq_ignore_ascii_case(b)
    }
}

/// Time utilities
pub mod time {
    use chrono::{DateTime, Utc};

    /// Get current timestamp as string
    pub fn current_timestamp() -> String {
        format_timestamp(Utc::now())
    }

    /// Format a timestamp the way replies show it
    pub fn format_timestamp(at: DateTime<Utc>) -> String {
        at.format("%Y-%m-%d %H:%M:%S UTC").to_string()
    }

    /// Format duration as human readable string
    pub fn format_duration(seconds: u64) -> String {
        let days = seconds / 86400;
        let hours = (seconds % 86400) / 3600;
        let minutes = (seconds % 3600) / 60;
        let secs = seconds % 60;

        if days > 0 {
            format!("{}d {}h {}m {}s", days, hours, minutes, secs)
        } else if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, secs)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, secs)
        } else {
            format!("{}s", secs)
        }
    }
}
