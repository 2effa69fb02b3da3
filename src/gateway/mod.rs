//! Event source and platform sink.
//!
//! The dispatch core never talks to the chat platform directly. It consumes
//! events from a [`Connection`] and issues calls through the [`Platform`]
//! handle the connection exposes. [`WsConnection`] is the production
//! implementation; tests substitute an in-process one.

mod websocket;

pub use websocket::{WsConnection, WsPlatform};

use crate::error::{GatewayError, PlatformError};
use async_trait::async_trait;
use hubbot_proto::{ChannelId, Event, GuildId, MessageId, RoleId, UserId};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Platform API calls available to extensions.
#[async_trait]
pub trait Platform: Send + Sync {
    /// Post `content` to `channel`, returning the new message id.
    async fn send_message(&self, channel: ChannelId, content: &str)
        -> Result<MessageId, PlatformError>;

    /// Owner of a guild.
    async fn guild_owner(&self, guild: GuildId) -> Result<UserId, PlatformError>;

    /// Roles held by a guild member.
    async fn member_roles(&self, guild: GuildId, user: UserId)
        -> Result<Vec<RoleId>, PlatformError>;

    /// Grant `role` to a member.
    async fn add_member_role(
        &self,
        guild: GuildId,
        user: UserId,
        role: RoleId,
    ) -> Result<(), PlatformError>;

    /// Revoke `role` from a member.
    async fn remove_member_role(
        &self,
        guild: GuildId,
        user: UserId,
        role: RoleId,
    ) -> Result<(), PlatformError>;

    /// Ids of the most recent messages in a channel, newest first.
    async fn recent_messages(
        &self,
        channel: ChannelId,
        limit: u32,
    ) -> Result<Vec<MessageId>, PlatformError>;

    /// Delete a single message.
    async fn delete_message(&self, channel: ChannelId, message: MessageId)
        -> Result<(), PlatformError>;
}

/// The single persistent connection a hub drives.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Connect and start delivering events.
    ///
    /// The returned receiver yields `None` once the connection is gone.
    async fn open(&self) -> Result<mpsc::Receiver<Event>, GatewayError>;

    /// Handle for platform calls. Calls fail with
    /// [`PlatformError::Disconnected`] while the connection is closed.
    fn platform(&self) -> Arc<dyn Platform>;

    /// Disconnect cleanly. Safe to call on a closed connection.
    async fn close(&self) -> Result<(), GatewayError>;
}
