//! Bulk message deletion.
//!
//! `purge <count>` snapshots the channel's most recent messages and deletes
//! them from a background task. The task checks its cancellation token
//! before every deletion, so `purge stop` (or shutdown) ends it between two
//! deletions rather than mid-request.

use crate::command::{CommandDef, CommandHandler};
use crate::error::{HandlerError, HandlerResult, PlatformError};
use crate::extension::CommandContext;
use crate::gateway::Platform;
use crate::permission::PermissionLevel;
use async_trait::async_trait;
use hubbot_proto::{ChannelId, MessageId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub const NAME: &str = "purge";
pub const DEFAULT_INDICATOR: char = '~';

const DEFAULT_MAX_BATCH: u32 = 100;
const MAX_BATCH_CEILING: u32 = 1000;

fn default_max_batch() -> u32 {
    DEFAULT_MAX_BATCH
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurgeState {
    /// Most messages one purge may delete.
    #[serde(default = "default_max_batch")]
    pub max_batch: u32,
}

impl Default for PurgeState {
    fn default() -> Self {
        Self {
            max_batch: DEFAULT_MAX_BATCH,
        }
    }
}

pub fn commands() -> Vec<CommandDef<PurgeState>> {
    vec![
        CommandDef::new("purge", Purge)
            .params(r"(?P<count>\d+)")
            .level(PermissionLevel::Admin)
            .about("Delete the most recent messages in this channel."),
        CommandDef::new("purge stop", PurgeStop)
            .level(PermissionLevel::Admin)
            .about("Stop running purges."),
        CommandDef::new("purge limit", PurgeLimit)
            .params(r"(?P<count>\d+)")
            .level(PermissionLevel::Owner)
            .about("Set the most messages one purge may delete."),
    ]
}

/// How a background purge ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurgeOutcome {
    Completed { deleted: usize },
    Cancelled { deleted: usize },
    Failed { deleted: usize },
}

/// Delete `messages` one at a time until done or cancelled.
pub async fn delete_messages(
    platform: &dyn Platform,
    channel: ChannelId,
    messages: &[MessageId],
    token: &CancellationToken,
) -> PurgeOutcome {
    let mut deleted = 0;
    for &message in messages {
        if token.is_cancelled() {
            return PurgeOutcome::Cancelled { deleted };
        }
        match platform.delete_message(channel, message).await {
            Ok(()) => deleted += 1,
            // Already gone or not deletable; keep going.
            Err(PlatformError::Rejected(reason)) => {
                warn!(channel = %channel, message = %message, reason = %reason, "Skipping message");
            }
            Err(e) => {
                warn!(channel = %channel, error = %e, "Purge aborted");
                return PurgeOutcome::Failed { deleted };
            }
        }
    }
    PurgeOutcome::Completed { deleted }
}

struct Purge;

#[async_trait]
impl CommandHandler<PurgeState> for Purge {
    async fn handle(&self, ctx: &CommandContext<'_, PurgeState>) -> HandlerResult {
        let count: u32 = ctx.args().parse("count")?;
        let max_batch = ctx.tenant().read(|cfg| cfg.state.max_batch);
        if count == 0 || count > max_batch {
            return Err(HandlerError::InvalidArgument(format!(
                "Purge between 1 and {} messages.",
                max_batch
            )));
        }

        let channel = ctx.channel();
        let invoking = ctx.message().id;
        // One extra so the command message itself does not eat into the count.
        let mut messages = ctx.platform().recent_messages(channel, count.saturating_add(1)).await?;
        messages.retain(|&id| id != invoking);
        messages.truncate(count as usize);

        let token = ctx.cancellation().token();
        let platform = Arc::clone(ctx.platform());
        let guild = ctx.guild();
        let indicator = ctx.indicator();
        let requested = messages.len();

        tokio::spawn(async move {
            let outcome = delete_messages(platform.as_ref(), channel, &messages, &token).await;
            info!(guild = %guild, channel = %channel, ?outcome, "Purge finished");
            let text = match outcome {
                PurgeOutcome::Completed { deleted } => format!("Purged {} messages.", deleted),
                PurgeOutcome::Cancelled { deleted } => {
                    format!("Purge stopped after {} of {} messages.", deleted, requested)
                }
                PurgeOutcome::Failed { deleted } => {
                    format!("Purge failed after {} of {} messages.", deleted, requested)
                }
            };
            if let Err(e) = platform.send_message(channel, &text).await {
                warn!(channel = %channel, error = %e, "Failed to report purge result");
            }
        });

        ctx.reply(&format!(
            "Purging {} messages. Use `{}purge stop` to cancel.",
            requested, indicator
        ))
        .await?;
        Ok(())
    }
}

struct PurgeStop;

#[async_trait]
impl CommandHandler<PurgeState> for PurgeStop {
    async fn handle(&self, ctx: &CommandContext<'_, PurgeState>) -> HandlerResult {
        ctx.cancellation().cancel_all();
        ctx.reply("Stopping running purges.").await?;
        Ok(())
    }
}

struct PurgeLimit;

#[async_trait]
impl CommandHandler<PurgeState> for PurgeLimit {
    async fn handle(&self, ctx: &CommandContext<'_, PurgeState>) -> HandlerResult {
        let limit: u32 = ctx.args().parse("count")?;
        if limit == 0 || limit > MAX_BATCH_CEILING {
            return Err(HandlerError::InvalidArgument(format!(
                "The limit must be between 1 and {}.",
                MAX_BATCH_CEILING
            )));
        }
        ctx.tenant().update(|cfg| cfg.state.max_batch = limit);
        ctx.tenant().persist().await?;
        ctx.reply(&format!("Purges are now limited to {} messages.", limit))
            .await?;
        Ok(())
    }
}
