//! Integration test common infrastructure.
//!
//! Provides an in-process connection and platform, event builders, and a
//! harness that runs a hub on a background task.

pub mod connection;
pub mod platform;

#[allow(unused_imports)]
pub use connection::MockConnection;
#[allow(unused_imports)]
pub use platform::MockPlatform;

use async_trait::async_trait;
use hubbot::command::{CommandDef, CommandHandler};
use hubbot::error::{GatewayError, HandlerResult};
use hubbot::extension::{CommandContext, Extension, Module};
use hubbot::hub::Hub;
use hubbot::storage::{ConfigStorage, MemoryStorage};
use hubbot_proto::{
    Author, ChannelId, Event, GuildId, MessageCreated, MessageId, ReactionEvent, RoleId, UserId,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;

#[allow(dead_code)]
pub const GUILD: GuildId = GuildId(1);
#[allow(dead_code)]
pub const CHANNEL: ChannelId = ChannelId(10);
#[allow(dead_code)]
pub const OWNER: UserId = UserId(100);
#[allow(dead_code)]
pub const MEMBER: UserId = UserId(200);

static NEXT_MESSAGE: AtomicU64 = AtomicU64::new(1);

/// A guild message from a human author.
#[allow(dead_code)]
pub fn message(guild: GuildId, author: UserId, content: &str) -> MessageCreated {
    MessageCreated {
        id: MessageId(NEXT_MESSAGE.fetch_add(1, Ordering::Relaxed)),
        channel: CHANNEL,
        guild: Some(guild),
        author: Author {
            id: author,
            name: format!("user{}", author),
            bot: false,
        },
        content: content.to_string(),
        mentions: Vec::new(),
        member_roles: None,
    }
}

#[allow(dead_code)]
pub fn say(author: UserId, content: &str) -> Event {
    Event::MessageCreated(message(GUILD, author, content))
}

#[allow(dead_code)]
pub fn say_with_roles(author: UserId, roles: Vec<RoleId>, content: &str) -> Event {
    let mut msg = message(GUILD, author, content);
    msg.member_roles = Some(roles);
    Event::MessageCreated(msg)
}

#[allow(dead_code)]
pub fn reaction(user: UserId, message: MessageId, author: UserId, emoji: &str) -> ReactionEvent {
    ReactionEvent {
        user,
        channel: CHANNEL,
        message,
        message_author: Some(author),
        guild: Some(GUILD),
        emoji: emoji.to_string(),
    }
}

/// Replies `ran <keyword>` followed by the listed captures.
pub struct Echo(pub &'static [&'static str]);

#[async_trait]
impl CommandHandler<()> for Echo {
    async fn handle(&self, ctx: &CommandContext<'_, ()>) -> HandlerResult {
        let mut text = format!("ran {}", ctx.command().keyword());
        for name in self.0 {
            text.push_str(&format!(" {}={}", name, ctx.arg(name).unwrap_or("-")));
        }
        ctx.reply(&text).await?;
        Ok(())
    }
}

/// A stateless extension over `storage`.
#[allow(dead_code)]
pub fn module_with(
    name: &str,
    indicator: char,
    defs: Vec<CommandDef<()>>,
    storage: Arc<dyn ConfigStorage>,
) -> Arc<dyn Extension> {
    Arc::new(
        Module::builder(name)
            .indicator(indicator)
            .commands(defs)
            .build(storage)
            .expect("commands register"),
    )
}

#[allow(dead_code)]
pub fn module(name: &str, indicator: char, defs: Vec<CommandDef<()>>) -> Arc<dyn Extension> {
    module_with(name, indicator, defs, Arc::new(MemoryStorage::new()))
}

/// A hub running on a background task.
pub struct Harness {
    pub hub: Arc<Hub>,
    pub connection: Arc<MockConnection>,
    task: JoinHandle<Result<(), GatewayError>>,
}

#[allow(dead_code)]
impl Harness {
    /// Attach `extensions`, start the hub and wait for it to connect.
    pub async fn start(extensions: Vec<Arc<dyn Extension>>) -> Self {
        let connection = MockConnection::new();
        connection.mock().set_owner(GUILD, OWNER);
        let hub = Arc::new(Hub::new(
            Arc::clone(&connection) as Arc<dyn hubbot::gateway::Connection>,
            Duration::from_secs(2),
        ));
        for extension in extensions {
            hub.attach(extension);
        }
        let runner = Arc::clone(&hub);
        let task = tokio::spawn(async move { runner.run().await });
        connection.wait_open().await;
        Self {
            hub,
            connection,
            task,
        }
    }

    pub fn mock(&self) -> &Arc<MockPlatform> {
        self.connection.mock()
    }

    pub async fn inject(&self, event: Event) {
        self.connection.inject(event).await;
    }

    /// Stop the hub and wait for shutdown hooks to finish.
    pub async fn stop(self) {
        self.hub.handle().stop();
        let result = tokio::time::timeout(Duration::from_secs(5), self.task)
            .await
            .expect("hub did not stop in time")
            .expect("hub task panicked");
        assert!(result.is_ok(), "hub returned {:?}", result);
    }
}
