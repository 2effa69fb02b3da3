//! Inbound chat events.
//!
//! The dispatch core only consumes three kinds of event: message creation
//! and reaction add/remove. Everything else the platform may emit is folded
//! into [`Event::Ready`] or dropped by the gateway.

use crate::id::{ChannelId, GuildId, MessageId, RoleId, UserId};
use serde::{Deserialize, Serialize};

/// The author of a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    /// Author's user id.
    pub id: UserId,
    /// Display name at the time the message was sent.
    pub name: String,
    /// Whether the author is an automated account.
    #[serde(default)]
    pub bot: bool,
}

/// A message posted to a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageCreated {
    /// Message id.
    pub id: MessageId,
    /// Channel the message was posted in.
    pub channel: ChannelId,
    /// Guild the channel belongs to; `None` for direct messages.
    #[serde(default)]
    pub guild: Option<GuildId>,
    /// Who sent it.
    pub author: Author,
    /// Raw message text.
    pub content: String,
    /// Users mentioned in the message.
    #[serde(default)]
    pub mentions: Vec<UserId>,
    /// Author's guild roles, when the platform attaches member data.
    #[serde(default)]
    pub member_roles: Option<Vec<RoleId>>,
}

/// A reaction being added to or removed from a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionEvent {
    /// User who reacted.
    pub user: UserId,
    /// Channel containing the message.
    pub channel: ChannelId,
    /// Message reacted to.
    pub message: MessageId,
    /// Author of the message reacted to, when known.
    #[serde(default)]
    pub message_author: Option<UserId>,
    /// Guild of the channel; `None` for direct messages.
    #[serde(default)]
    pub guild: Option<GuildId>,
    /// Emoji identifier: a unicode emoji or `name:id` for custom emoji.
    pub emoji: String,
}

/// Events delivered by the event source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Event {
    /// The session is established.
    Ready {
        /// The bot's own user id.
        user: UserId,
    },
    /// A message was posted.
    MessageCreated(MessageCreated),
    /// A reaction was added.
    ReactionAdded(ReactionEvent),
    /// A reaction was removed.
    ReactionRemoved(ReactionEvent),
}

impl Event {
    /// Static label for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Ready { .. } => "ready",
            Self::MessageCreated(_) => "message_created",
            Self::ReactionAdded(_) => "reaction_added",
            Self::ReactionRemoved(_) => "reaction_removed",
        }
    }

    /// Guild the event belongs to, if any.
    pub fn guild(&self) -> Option<GuildId> {
        match self {
            Self::Ready { .. } => None,
            Self::MessageCreated(m) => m.guild,
            Self::ReactionAdded(r) | Self::ReactionRemoved(r) => r.guild,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_defaults_optional_fields() {
        let json = r#"{"id":1,"channel":2,"author":{"id":3,"name":"bob"},"content":"hi"}"#;
        let msg: MessageCreated = serde_json::from_str(json).unwrap();
        assert_eq!(msg.guild, None);
        assert!(!msg.author.bot);
        assert!(msg.mentions.is_empty());
        assert!(msg.member_roles.is_none());
    }

    #[test]
    fn reaction_event_tagging() {
        let json = r#"{"type":"reaction_removed","data":{
            "user":1,"channel":2,"message":3,"guild":4,"emoji":"👍"}}"#;
        let event: Event = serde_json::from_str(json).unwrap();
        assert_eq!(event.kind(), "reaction_removed");
        assert_eq!(event.guild(), Some(GuildId(4)));
    }
}
