//! Scripted platform.
//!
//! Records every outbound call and answers lookups from tables the test
//! fills in beforehand.

use async_trait::async_trait;
use hubbot::error::PlatformError;
use hubbot::gateway::Platform;
use hubbot_proto::{ChannelId, GuildId, MessageId, RoleId, UserId};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::{Instant, sleep};

/// A role grant (`true`) or revocation (`false`).
pub type RoleChange = (GuildId, UserId, RoleId, bool);

pub struct MockPlatform {
    sent: Mutex<Vec<(ChannelId, String)>>,
    owners: Mutex<HashMap<GuildId, UserId>>,
    roles: Mutex<HashMap<(GuildId, UserId), Vec<RoleId>>>,
    role_changes: Mutex<Vec<RoleChange>>,
    history: Mutex<HashMap<ChannelId, Vec<MessageId>>>,
    deleted: Mutex<Vec<MessageId>>,
    delete_delay: Mutex<Duration>,
    next_id: AtomicU64,
}

impl Default for MockPlatform {
    fn default() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            owners: Mutex::new(HashMap::new()),
            roles: Mutex::new(HashMap::new()),
            role_changes: Mutex::new(Vec::new()),
            history: Mutex::new(HashMap::new()),
            deleted: Mutex::new(Vec::new()),
            delete_delay: Mutex::new(Duration::ZERO),
            next_id: AtomicU64::new(1_000_000),
        }
    }
}

#[allow(dead_code)]
impl MockPlatform {
    pub fn set_owner(&self, guild: GuildId, user: UserId) {
        self.owners.lock().insert(guild, user);
    }

    pub fn set_roles(&self, guild: GuildId, user: UserId, roles: Vec<RoleId>) {
        self.roles.lock().insert((guild, user), roles);
    }

    /// Channel history, newest first.
    pub fn set_history(&self, channel: ChannelId, messages: Vec<MessageId>) {
        self.history.lock().insert(channel, messages);
    }

    pub fn set_delete_delay(&self, delay: Duration) {
        *self.delete_delay.lock() = delay;
    }

    pub fn sent(&self) -> Vec<(ChannelId, String)> {
        self.sent.lock().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent.lock().iter().map(|(_, text)| text.clone()).collect()
    }

    pub fn role_changes(&self) -> Vec<RoleChange> {
        self.role_changes.lock().clone()
    }

    pub fn deleted(&self) -> Vec<MessageId> {
        self.deleted.lock().clone()
    }

    /// Wait until at least `count` messages were sent, then return all texts.
    pub async fn wait_for_texts(&self, count: usize) -> Vec<String> {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            let texts = self.texts();
            if texts.len() >= count {
                return texts;
            }
            assert!(
                Instant::now() < deadline,
                "timed out waiting for {} messages, got {:?}",
                count,
                texts
            );
            sleep(Duration::from_millis(10)).await;
        }
    }

    /// Wait until a sent message satisfies `predicate`.
    pub async fn wait_for_text(&self, predicate: impl Fn(&str) -> bool) -> String {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let Some(text) = self.texts().into_iter().find(|t| predicate(t)) {
                return text;
            }
            assert!(
                Instant::now() < deadline,
                "timed out waiting for a matching message, got {:?}",
                self.texts()
            );
            sleep(Duration::from_millis(10)).await;
        }
    }

    /// Give in-flight handlers a moment, then assert nothing more was sent.
    pub async fn assert_quiet(&self, expected: usize) {
        sleep(Duration::from_millis(100)).await;
        let texts = self.texts();
        assert_eq!(texts.len(), expected, "unexpected messages: {:?}", texts);
    }
}

#[async_trait]
impl Platform for MockPlatform {
    async fn send_message(&self, channel: ChannelId, content: &str) -> Result<MessageId, PlatformError> {
        self.sent.lock().push((channel, content.to_string()));
        Ok(MessageId(self.next_id.fetch_add(1, Ordering::Relaxed)))
    }

    async fn guild_owner(&self, guild: GuildId) -> Result<UserId, PlatformError> {
        self.owners
            .lock()
            .get(&guild)
            .copied()
            .ok_or_else(|| PlatformError::Rejected("unknown guild".into()))
    }

    async fn member_roles(&self, guild: GuildId, user: UserId) -> Result<Vec<RoleId>, PlatformError> {
        Ok(self.roles.lock().get(&(guild, user)).cloned().unwrap_or_default())
    }

    async fn add_member_role(&self, guild: GuildId, user: UserId, role: RoleId) -> Result<(), PlatformError> {
        self.role_changes.lock().push((guild, user, role, true));
        Ok(())
    }

    async fn remove_member_role(&self, guild: GuildId, user: UserId, role: RoleId) -> Result<(), PlatformError> {
        self.role_changes.lock().push((guild, user, role, false));
        Ok(())
    }

    async fn recent_messages(&self, channel: ChannelId, limit: u32) -> Result<Vec<MessageId>, PlatformError> {
        let history = self.history.lock();
        let messages = history.get(&channel).map(Vec::as_slice).unwrap_or_default();
        Ok(messages.iter().take(limit as usize).copied().collect())
    }

    async fn delete_message(&self, channel: ChannelId, message: MessageId) -> Result<(), PlatformError> {
        let delay = *self.delete_delay.lock();
        if !delay.is_zero() {
            sleep(delay).await;
        }
        let removed = {
            let mut history = self.history.lock();
            let messages = history.entry(channel).or_default();
            let before = messages.len();
            messages.retain(|&id| id != message);
            messages.len() != before
        };
        if !removed {
            return Err(PlatformError::Rejected("unknown message".into()));
        }
        self.deleted.lock().push(message);
        Ok(())
    }
}
