//! Gateway frames.
//!
//! The gateway speaks JSON text frames over a WebSocket. The client opens
//! with [`ClientFrame::Identify`]; afterwards the server pushes
//! [`ServerFrame::Dispatch`] events and answers each
//! [`ClientFrame::Request`] with a [`ServerFrame::Reply`] carrying the same
//! id.

use crate::event::Event;
use crate::id::{ChannelId, GuildId, MessageId, RoleId, UserId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Frame encoding/decoding failure.
#[derive(Debug, Error)]
pub enum FrameError {
    /// The frame was not valid JSON for the expected shape.
    #[error("malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// A platform API call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Request {
    /// Post a message to a channel.
    SendMessage {
        /// Target channel.
        channel: ChannelId,
        /// Message text.
        content: String,
    },
    /// Look up the owner of a guild.
    GuildOwner {
        /// Guild to query.
        guild: GuildId,
    },
    /// Look up a member's roles.
    MemberRoles {
        /// Guild to query.
        guild: GuildId,
        /// Member to query.
        user: UserId,
    },
    /// Grant a role to a member.
    AddMemberRole {
        /// Guild of the member.
        guild: GuildId,
        /// Member receiving the role.
        user: UserId,
        /// Role to grant.
        role: RoleId,
    },
    /// Revoke a role from a member.
    RemoveMemberRole {
        /// Guild of the member.
        guild: GuildId,
        /// Member losing the role.
        user: UserId,
        /// Role to revoke.
        role: RoleId,
    },
    /// Fetch ids of the most recent messages of a channel, newest first.
    RecentMessages {
        /// Channel to read.
        channel: ChannelId,
        /// Maximum number of ids.
        limit: u32,
    },
    /// Delete a message.
    DeleteMessage {
        /// Channel containing the message.
        channel: ChannelId,
        /// Message to delete.
        message: MessageId,
    },
}

/// Answer to a [`Request`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Reply {
    /// A message was posted.
    Sent {
        /// Id of the new message.
        message: MessageId,
    },
    /// Owner of the guild.
    Owner {
        /// Owner's user id.
        user: UserId,
    },
    /// Roles of a member.
    Roles {
        /// Role ids.
        roles: Vec<RoleId>,
    },
    /// Message ids, newest first.
    Messages {
        /// Message ids.
        messages: Vec<MessageId>,
    },
    /// The request succeeded with no payload.
    Ack,
    /// The platform rejected the request.
    Error {
        /// Human-readable reason.
        message: String,
    },
}

/// Frames sent by the bot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ClientFrame {
    /// Authenticate the session.
    Identify {
        /// Connection credential.
        token: String,
    },
    /// Issue a platform API call.
    Request {
        /// Correlation id, echoed in the reply.
        id: u64,
        /// The call itself.
        request: Request,
    },
}

/// Frames sent by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ServerFrame {
    /// Greeting sent once the WebSocket is open.
    Hello,
    /// An inbound chat event.
    Dispatch {
        /// The event.
        event: Event,
    },
    /// Answer to a client request.
    Reply {
        /// Correlation id of the request.
        id: u64,
        /// The answer.
        reply: Reply,
    },
}

impl ClientFrame {
    /// Encode as a JSON text frame.
    pub fn encode(&self) -> Result<String, FrameError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode from a JSON text frame.
    pub fn decode(raw: &str) -> Result<Self, FrameError> {
        Ok(serde_json::from_str(raw)?)
    }
}

impl ServerFrame {
    /// Encode as a JSON text frame.
    pub fn encode(&self) -> Result<String, FrameError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode from a JSON text frame.
    pub fn decode(raw: &str) -> Result<Self, FrameError> {
        Ok(serde_json::from_str(raw)?)
    }
}
