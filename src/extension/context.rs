//! Per-invocation handler contexts.

use crate::cancel::CancelCoordinator;
use crate::command::{Command, CommandArgs, CommandSet};
use crate::error::{HandlerError, HandlerResult};
use crate::gateway::Platform;
use crate::permission::PermissionLevel;
use crate::tenant::{TenantConfig, TenantHandle, TenantState, TenantStore};
use hubbot_proto::{Author, ChannelId, GuildId, MessageCreated, MessageId, ReactionEvent};
use std::sync::Arc;

/// Access to the invoking tenant's configuration.
///
/// Closures run under the tenant lock and must not block; nothing borrowed
/// from the configuration survives past the closure, so no lock is ever
/// held across an `.await`.
pub struct TenantScope<'a, S> {
    store: &'a TenantStore<S>,
    guild: GuildId,
    handle: &'a TenantHandle<S>,
}

impl<'a, S: TenantState> TenantScope<'a, S> {
    pub(crate) fn new(store: &'a TenantStore<S>, guild: GuildId, handle: &'a TenantHandle<S>) -> Self {
        Self { store, guild, handle }
    }

    pub fn read<R>(&self, f: impl FnOnce(&TenantConfig<S>) -> R) -> R {
        f(&self.handle.read())
    }

    pub fn update<R>(&self, f: impl FnOnce(&mut TenantConfig<S>) -> R) -> R {
        f(&mut self.handle.write())
    }

    /// Write this tenant to storage now instead of waiting for shutdown.
    pub async fn persist(&self) -> HandlerResult {
        if !self.store.save(self.guild).await? {
            return Err(HandlerError::Internal(format!(
                "tenant {} is not cached by {}",
                self.guild,
                self.store.extension()
            )));
        }
        Ok(())
    }
}

/// Everything a command handler gets to see.
pub struct CommandContext<'a, S> {
    pub(crate) extension: &'a str,
    pub(crate) platform: &'a Arc<dyn Platform>,
    pub(crate) message: &'a MessageCreated,
    pub(crate) guild: GuildId,
    pub(crate) store: &'a TenantStore<S>,
    pub(crate) tenant: TenantHandle<S>,
    pub(crate) indicator: char,
    pub(crate) level: PermissionLevel,
    pub(crate) command: &'a Command<S>,
    pub(crate) commands: &'a CommandSet<S>,
    pub(crate) cancel: Arc<CancelCoordinator>,
    pub(crate) args: CommandArgs,
}

impl<'a, S: TenantState> CommandContext<'a, S> {
    /// Name of the extension handling the command.
    pub fn extension(&self) -> &str {
        self.extension
    }

    pub fn message(&self) -> &MessageCreated {
        self.message
    }

    pub fn author(&self) -> &Author {
        &self.message.author
    }

    pub fn channel(&self) -> ChannelId {
        self.message.channel
    }

    pub fn guild(&self) -> GuildId {
        self.guild
    }

    /// Indicator in effect when the message arrived.
    pub fn indicator(&self) -> char {
        self.indicator
    }

    /// The caller's resolved level.
    pub fn level(&self) -> PermissionLevel {
        self.level
    }

    pub fn command(&self) -> &Command<S> {
        self.command
    }

    /// The extension's full command list.
    pub fn commands(&self) -> &CommandSet<S> {
        self.commands
    }

    pub fn args(&self) -> &CommandArgs {
        &self.args
    }

    /// Named capture from the parameter pattern.
    pub fn arg(&self, name: &str) -> Option<&str> {
        self.args.get(name)
    }

    pub fn platform(&self) -> &Arc<dyn Platform> {
        self.platform
    }

    pub fn tenant(&self) -> TenantScope<'_, S> {
        TenantScope::new(self.store, self.guild, &self.tenant)
    }

    /// Cancellation for background work this extension runs in the guild.
    pub fn cancellation(&self) -> &CancelCoordinator {
        &self.cancel
    }

    /// Post `content` to the channel the command came from.
    pub async fn reply(&self, content: &str) -> Result<MessageId, HandlerError> {
        Ok(self.platform.send_message(self.message.channel, content).await?)
    }
}

/// Whether a reaction was added or removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionKind {
    Added,
    Removed,
}

/// Everything a reaction handler gets to see.
pub struct ReactionContext<'a, S> {
    pub(crate) extension: &'a str,
    pub(crate) platform: &'a Arc<dyn Platform>,
    pub(crate) reaction: &'a ReactionEvent,
    pub(crate) kind: ReactionKind,
    pub(crate) guild: GuildId,
    pub(crate) store: &'a TenantStore<S>,
    pub(crate) tenant: TenantHandle<S>,
}

impl<'a, S: TenantState> ReactionContext<'a, S> {
    pub fn extension(&self) -> &str {
        self.extension
    }

    pub fn reaction(&self) -> &ReactionEvent {
        self.reaction
    }

    pub fn kind(&self) -> ReactionKind {
        self.kind
    }

    pub fn guild(&self) -> GuildId {
        self.guild
    }

    pub fn platform(&self) -> &Arc<dyn Platform> {
        self.platform
    }

    pub fn tenant(&self) -> TenantScope<'_, S> {
        TenantScope::new(self.store, self.guild, &self.tenant)
    }
}
