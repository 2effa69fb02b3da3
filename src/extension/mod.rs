//! Extension modules.
//!
//! An extension is a named bundle of commands, reaction handlers and one
//! [`TenantStore`](crate::tenant::TenantStore). The hub only sees the
//! object-safe [`Extension`] trait; [`Module`] is the implementation every
//! feature extension is built from.

mod builtin;
mod context;
mod module;

pub use context::{CommandContext, ReactionContext, ReactionKind, TenantScope};
pub use module::{Module, ModuleBuilder, ReactionHandler};

use crate::gateway::Platform;
use crate::hub::Attachment;
use async_trait::async_trait;
use hubbot_proto::{MessageCreated, ReactionEvent};
use std::sync::Arc;

/// A subscriber of the hub's event stream.
#[async_trait]
pub trait Extension: Send + Sync + 'static {
    fn name(&self) -> &str;

    /// Which hub, if any, this extension is attached to.
    fn attachment(&self) -> &Attachment;

    /// Before the connection opens.
    async fn on_startup(&self);

    /// After the connection is open.
    async fn on_connected(&self, platform: &Arc<dyn Platform>);

    /// After the connection has closed and in-flight handlers drained.
    async fn on_shutdown(&self);

    async fn on_message(&self, platform: &Arc<dyn Platform>, message: &MessageCreated);

    async fn on_reaction(
        &self,
        platform: &Arc<dyn Platform>,
        reaction: &ReactionEvent,
        kind: ReactionKind,
    );
}
