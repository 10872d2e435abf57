//! chanrelay core
//!
//! Protocol engine for a single-process, IRC-style chat relay: registration,
//! channels, modes and message fan-out, plus the tokio transport that feeds
//! it. The engine itself is synchronous; see [`Server`] for the interface the
//! transport drives.

pub mod auth;
pub mod buffer;
pub mod channel;
pub mod client;
pub mod config;
pub mod connection;
pub mod directory;
pub mod error;
pub mod message;
pub mod numeric;
pub mod registry;
pub mod server;
pub mod utils;

pub use buffer::{Overflow, RecvQueue};
pub use channel::{Channel, ChannelMember, ChannelMode};
pub use client::{Client, ClientId, RegistrationState};
pub use config::Config;
pub use connection::ConnectionHandler;
pub use directory::ChannelDirectory;
pub use error::{Error, ProtocolError, ProtocolResult, Result};
pub use message::{Message, MessageType, Prefix};
pub use numeric::NumericReply;
pub use registry::ConnectionRegistry;
pub use server::{Disposition, Server};

/// Re-exports for convenience
pub use serde::{Deserialize, Serialize};
pub use tracing::{debug, error, info, warn};
