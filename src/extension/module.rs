//! Generic extension module: command dispatch over a tenant store.

use super::context::{CommandContext, ReactionContext, ReactionKind};
use super::{Extension, builtin};
use crate::cancel::CancelCoordinator;
use crate::command::{Command, CommandArgs, CommandDef, CommandSet, Scan};
#[cfg(test)]
use crate::command::CommandHandler;
use crate::error::{HandlerError, HandlerResult, RegistrationError};
use crate::gateway::Platform;
use crate::hub::Attachment;
use crate::permission::{self, PermissionLevel};
use crate::storage::ConfigStorage;
use crate::telemetry::{CommandTimer, spans};
use crate::tenant::{TenantHandle, TenantState, TenantStore};
use async_trait::async_trait;
use dashmap::DashMap;
use hubbot_proto::{ChannelId, GuildId, MessageCreated, ReactionEvent};
use std::sync::Arc;
use tracing::{Instrument, debug, info, warn};

/// Callback for reactions added to or removed from messages in a guild.
#[async_trait]
pub trait ReactionHandler<S: TenantState>: Send + Sync {
    async fn handle(&self, ctx: &ReactionContext<'_, S>) -> HandlerResult;
}

/// Builder for a [`Module`].
pub struct ModuleBuilder<S> {
    name: String,
    indicator: char,
    commands: Vec<CommandDef<S>>,
    reactions: Vec<Box<dyn ReactionHandler<S>>>,
}

impl<S: TenantState> ModuleBuilder<S> {
    /// Indicator used for tenants that have not chosen their own.
    pub fn indicator(mut self, indicator: char) -> Self {
        self.indicator = indicator;
        self
    }

    pub fn command(mut self, def: CommandDef<S>) -> Self {
        self.commands.push(def);
        self
    }

    pub fn commands(mut self, defs: impl IntoIterator<Item = CommandDef<S>>) -> Self {
        self.commands.extend(defs);
        self
    }

    pub fn reaction(mut self, handler: impl ReactionHandler<S> + 'static) -> Self {
        self.reactions.push(Box::new(handler));
        self
    }

    /// Register the commands (built-ins first) and create the tenant store.
    pub fn build(self, storage: Arc<dyn ConfigStorage>) -> Result<Module<S>, RegistrationError> {
        let mut defs = builtin::definitions();
        defs.extend(self.commands);
        let commands = CommandSet::register(defs)?;

        debug!(extension = %self.name, commands = commands.len(), "Registered commands");

        Ok(Module {
            store: TenantStore::new(self.name.clone(), self.indicator, storage),
            name: self.name,
            commands,
            reactions: self.reactions,
            cancel: DashMap::new(),
            attachment: Attachment::default(),
        })
    }
}

/// A feature extension: commands and reactions over per-guild state `S`.
pub struct Module<S> {
    name: String,
    commands: CommandSet<S>,
    reactions: Vec<Box<dyn ReactionHandler<S>>>,
    store: TenantStore<S>,
    cancel: DashMap<GuildId, Arc<CancelCoordinator>>,
    attachment: Attachment,
}

impl<S: TenantState> Module<S> {
    pub fn builder(name: impl Into<String>) -> ModuleBuilder<S> {
        ModuleBuilder {
            name: name.into(),
            indicator: '!',
            commands: Vec::new(),
            reactions: Vec::new(),
        }
    }

    pub fn commands(&self) -> &CommandSet<S> {
        &self.commands
    }

    pub fn store(&self) -> &TenantStore<S> {
        &self.store
    }

    /// Cancellation for background work started in `guild`.
    pub fn cancellation(&self, guild: GuildId) -> Arc<CancelCoordinator> {
        if let Some(existing) = self.cancel.get(&guild) {
            return Arc::clone(existing.value());
        }
        Arc::clone(self.cancel.entry(guild).or_default().value())
    }

    async fn notify(&self, platform: &Arc<dyn Platform>, channel: ChannelId, text: &str) {
        if let Err(e) = platform.send_message(channel, text).await {
            warn!(extension = %self.name, channel = %channel, error = %e, "Failed to send notice");
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn invoke(
        &self,
        platform: &Arc<dyn Platform>,
        message: &MessageCreated,
        guild: GuildId,
        tenant: TenantHandle<S>,
        indicator: char,
        level: PermissionLevel,
        command: &Command<S>,
        args: CommandArgs,
    ) {
        let ctx = CommandContext {
            extension: &self.name,
            platform,
            message,
            guild,
            store: &self.store,
            tenant,
            indicator,
            level,
            command,
            commands: &self.commands,
            cancel: self.cancellation(guild),
            args,
        };

        let span = spans::command(&self.name, command.keyword(), guild, message.author.id);
        let result = {
            let _timer = CommandTimer::new(&self.name, command.keyword());
            command.handler().handle(&ctx).instrument(span).await
        };

        if let Err(e) = result {
            self.report(platform, message.channel, command.keyword(), e).await;
        }
    }

    async fn report(&self, platform: &Arc<dyn Platform>, channel: ChannelId, what: &str, e: HandlerError) {
        crate::metrics::record_command_error(&self.name, e.error_code());
        warn!(extension = %self.name, command = %what, error = %e, "Handler failed");
        if let Some(text) = e.user_message() {
            self.notify(platform, channel, &text).await;
        }
    }
}

#[async_trait]
impl<S: TenantState> Extension for Module<S> {
    fn name(&self) -> &str {
        &self.name
    }

    fn attachment(&self) -> &Attachment {
        &self.attachment
    }

    async fn on_startup(&self) {
        self.store.load_all().await;
    }

    async fn on_connected(&self, _platform: &Arc<dyn Platform>) {
        info!(
            extension = %self.name,
            tenants = self.store.len(),
            commands = self.commands.len(),
            "Extension ready"
        );
    }

    async fn on_shutdown(&self) {
        for coordinator in self.cancel.iter() {
            coordinator.cancel_all();
        }
        self.store.save_all().await;
    }

    async fn on_message(&self, platform: &Arc<dyn Platform>, message: &MessageCreated) {
        if message.author.bot {
            return;
        }
        let Some(guild) = message.guild else {
            return;
        };

        let tenant = self.store.get_or_create(guild).await;
        let (indicator, admin_roles) = {
            let cfg = tenant.read();
            (cfg.indicator, cfg.admin_roles.clone())
        };
        let Some(body) = message.content.strip_prefix(indicator) else {
            return;
        };

        let level = permission::resolve(
            platform.as_ref(),
            guild,
            message.author.id,
            message.member_roles.as_deref(),
            &admin_roles,
        )
        .await;

        match self.commands.scan(body, level) {
            Scan::Handled { command, args } => {
                self.invoke(platform, message, guild, tenant, indicator, level, command, args)
                    .await;
            }
            Scan::ParameterError(command) => {
                crate::metrics::record_command_error(&self.name, "parameter_error");
                self.notify(platform, message.channel, &command.usage_hint(indicator))
                    .await;
            }
            Scan::Unhandled => {
                crate::metrics::record_command_error(&self.name, "unknown_command");
                let text = format!(
                    "Unknown {} command. Type `{}help` for a list of commands.",
                    self.name, indicator
                );
                self.notify(platform, message.channel, &text).await;
            }
        }
    }

    async fn on_reaction(
        &self,
        platform: &Arc<dyn Platform>,
        reaction: &ReactionEvent,
        kind: ReactionKind,
    ) {
        if self.reactions.is_empty() {
            return;
        }
        let Some(guild) = reaction.guild else {
            return;
        };

        let ctx = ReactionContext {
            extension: &self.name,
            platform,
            reaction,
            kind,
            guild,
            store: &self.store,
            tenant: self.store.get_or_create(guild).await,
        };

        let span = spans::reaction(&self.name, reaction.guild, reaction.user);
        for handler in &self.reactions {
            if let Err(e) = handler.handle(&ctx).instrument(span.clone()).await {
                crate::metrics::record_command_error(&self.name, e.error_code());
                warn!(extension = %self.name, error = %e, "Reaction handler failed");
            }
        }
    }
}
