//! Reaction roles.
//!
//! A binding ties an emoji on one message to a role: reacting grants the
//! role, removing the reaction revokes it.

use crate::command::{CommandDef, CommandHandler};
use crate::error::{HandlerError, HandlerResult};
use crate::extension::{CommandContext, ReactionContext, ReactionHandler, ReactionKind};
use crate::permission::PermissionLevel;
use async_trait::async_trait;
use hubbot_proto::{MessageId, RoleId, mention};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write;
use tracing::info;

pub const NAME: &str = "roles";
pub const DEFAULT_INDICATOR: char = '%';

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolesState {
    /// `"<message id>:<emoji>"` to role.
    #[serde(default)]
    pub bindings: BTreeMap<String, RoleId>,
}

pub fn binding_key(message: MessageId, emoji: &str) -> String {
    format!("{}:{}", message, emoji)
}

impl RolesState {
    pub fn bound_role(&self, message: MessageId, emoji: &str) -> Option<RoleId> {
        self.bindings.get(&binding_key(message, emoji)).copied()
    }
}

pub fn commands() -> Vec<CommandDef<RolesState>> {
    vec![
        CommandDef::new("role bind", Bind)
            .params(r"(?P<message>\d+)\s+(?P<emoji>\S+)\s+(?P<role><@&\d+>|\d+)")
            .level(PermissionLevel::Admin)
            .about("Grant a role to whoever reacts to a message with an emoji."),
        CommandDef::new("role unbind", Unbind)
            .params(r"(?P<message>\d+)\s+(?P<emoji>\S+)")
            .level(PermissionLevel::Admin)
            .about("Remove a reaction role binding."),
        CommandDef::new("role bindings", Bindings)
            .level(PermissionLevel::Admin)
            .about("List reaction role bindings."),
    ]
}

struct Bind;

#[async_trait]
impl CommandHandler<RolesState> for Bind {
    async fn handle(&self, ctx: &CommandContext<'_, RolesState>) -> HandlerResult {
        let message: MessageId = ctx.args().parse("message")?;
        let emoji = ctx.args().require("emoji")?;
        let raw_role = ctx.args().require("role")?;
        let role = mention::parse_role(raw_role)
            .ok_or_else(|| HandlerError::InvalidArgument(format!("`{}` is not a role.", raw_role)))?;

        let key = binding_key(message, emoji);
        ctx.tenant().update(|cfg| cfg.state.bindings.insert(key, role));
        ctx.tenant().persist().await?;
        ctx.reply(&format!(
            "Reacting with {} on message {} now grants {}.",
            emoji,
            message,
            mention::role(role)
        ))
        .await?;
        Ok(())
    }
}

struct Unbind;

#[async_trait]
impl CommandHandler<RolesState> for Unbind {
    async fn handle(&self, ctx: &CommandContext<'_, RolesState>) -> HandlerResult {
        let message: MessageId = ctx.args().parse("message")?;
        let emoji = ctx.args().require("emoji")?;
        let key = binding_key(message, emoji);

        let Some(role) = ctx.tenant().update(|cfg| cfg.state.bindings.remove(&key)) else {
            return Err(HandlerError::InvalidArgument(format!(
                "Nothing is bound to {} on message {}.",
                emoji, message
            )));
        };
        ctx.tenant().persist().await?;
        ctx.reply(&format!(
            "{} on message {} no longer grants {}.",
            emoji,
            message,
            mention::role(role)
        ))
        .await?;
        Ok(())
    }
}

struct Bindings;

#[async_trait]
impl CommandHandler<RolesState> for Bindings {
    async fn handle(&self, ctx: &CommandContext<'_, RolesState>) -> HandlerResult {
        let bindings = ctx.tenant().read(|cfg| cfg.state.bindings.clone());
        if bindings.is_empty() {
            ctx.reply("No reaction roles are bound.").await?;
            return Ok(());
        }
        let mut text = String::from("**Reaction roles**");
        for (key, role) in bindings {
            let (message, emoji) = key.split_once(':').unwrap_or((key.as_str(), ""));
            let _ = write!(text, "\n{} {} - {}", message, emoji, mention::role(role));
        }
        ctx.reply(&text).await?;
        Ok(())
    }
}

/// Grants or revokes the bound role.
pub struct RoleOnReaction;

#[async_trait]
impl ReactionHandler<RolesState> for RoleOnReaction {
    async fn handle(&self, ctx: &ReactionContext<'_, RolesState>) -> HandlerResult {
        let reaction = ctx.reaction();
        let Some(role) = ctx
            .tenant()
            .read(|cfg| cfg.state.bound_role(reaction.message, &reaction.emoji))
        else {
            return Ok(());
        };

        let platform = ctx.platform();
        match ctx.kind() {
            ReactionKind::Added => {
                platform.add_member_role(ctx.guild(), reaction.user, role).await?;
                info!(guild = %ctx.guild(), user = %reaction.user, role = %role, "Granted reaction role");
            }
            ReactionKind::Removed => {
                platform
                    .remove_member_role(ctx.guild(), reaction.user, role)
                    .await?;
                info!(guild = %ctx.guild(), user = %reaction.user, role = %role, "Revoked reaction role");
            }
        }
        Ok(())
    }
}
