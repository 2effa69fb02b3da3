//! Reaction points.
//!
//! Admins map emoji to point values; reacting to someone's message with a
//! mapped emoji credits its author, and removing the reaction takes the
//! points back.

use crate::command::{CommandDef, CommandHandler};
use crate::error::{HandlerError, HandlerResult};
use crate::extension::{CommandContext, ReactionContext, ReactionHandler, ReactionKind};
use crate::permission::PermissionLevel;
use async_trait::async_trait;
use hubbot_proto::{UserId, mention};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write;
use tracing::debug;

pub const NAME: &str = "points";
pub const DEFAULT_INDICATOR: char = '!';

const LEADERBOARD_SIZE: usize = 10;
const USER_PATTERN: &str = r"<@!?\d+>|\d+";

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointsState {
    #[serde(default)]
    pub emoji_points: BTreeMap<String, i64>,
    #[serde(default)]
    pub balances: BTreeMap<UserId, i64>,
}

impl PointsState {
    pub fn balance(&self, user: UserId) -> i64 {
        self.balances.get(&user).copied().unwrap_or(0)
    }

    pub fn credit(&mut self, user: UserId, delta: i64) -> i64 {
        let balance = self.balances.entry(user).or_insert(0);
        *balance = balance.saturating_add(delta);
        *balance
    }

    /// Highest balances first; ties by user id.
    pub fn top(&self, n: usize) -> Vec<(UserId, i64)> {
        let mut ranked: Vec<_> = self.balances.iter().map(|(u, b)| (*u, *b)).collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked.truncate(n);
        ranked
    }
}

pub fn commands() -> Vec<CommandDef<PointsState>> {
    vec![
        CommandDef::new("points", ShowPoints)
            .params(format!(r"(?P<user>{})?", USER_PATTERN))
            .usage("[user]")
            .about("Show your points, or someone else's."),
        CommandDef::new("leaderboard", Leaderboard).about("Show the top point holders."),
        CommandDef::new("set emoji points", SetEmojiPoints)
            .params(r"(?P<emoji>\S+)\s+(?P<points>-?\d+)")
            .level(PermissionLevel::Admin)
            .about("Set the points a reaction emoji is worth (0 removes it)."),
        CommandDef::new("set points", SetPoints)
            .params(format!(r"(?P<user>{})\s+(?P<points>-?\d+)", USER_PATTERN))
            .level(PermissionLevel::Admin)
            .about("Set a user's balance."),
    ]
}

fn user_arg(raw: &str) -> Result<UserId, HandlerError> {
    mention::parse_user(raw)
        .ok_or_else(|| HandlerError::InvalidArgument(format!("`{}` is not a user.", raw)))
}

struct ShowPoints;

#[async_trait]
impl CommandHandler<PointsState> for ShowPoints {
    async fn handle(&self, ctx: &CommandContext<'_, PointsState>) -> HandlerResult {
        let user = match ctx.arg("user") {
            Some(raw) => user_arg(raw)?,
            None => ctx.author().id,
        };
        let balance = ctx.tenant().read(|cfg| cfg.state.balance(user));
        ctx.reply(&format!("{} has {} points.", mention::user(user), balance))
            .await?;
        Ok(())
    }
}

struct Leaderboard;

#[async_trait]
impl CommandHandler<PointsState> for Leaderboard {
    async fn handle(&self, ctx: &CommandContext<'_, PointsState>) -> HandlerResult {
        let top = ctx.tenant().read(|cfg| cfg.state.top(LEADERBOARD_SIZE));
        if top.is_empty() {
            ctx.reply("Nobody has any points yet.").await?;
            return Ok(());
        }
        let mut text = String::from("**Leaderboard**");
        for (rank, (user, balance)) in top.into_iter().enumerate() {
            let _ = write!(text, "\n{}. {} - {}", rank + 1, mention::user(user), balance);
        }
        ctx.reply(&text).await?;
        Ok(())
    }
}

struct SetEmojiPoints;

#[async_trait]
impl CommandHandler<PointsState> for SetEmojiPoints {
    async fn handle(&self, ctx: &CommandContext<'_, PointsState>) -> HandlerResult {
        let emoji = ctx.args().require("emoji")?.to_string();
        let points: i64 = ctx.args().parse("points")?;

        let text = if points == 0 {
            let removed = ctx
                .tenant()
                .update(|cfg| cfg.state.emoji_points.remove(&emoji).is_some());
            if !removed {
                return Err(HandlerError::InvalidArgument(format!(
                    "{} is not worth any points.",
                    emoji
                )));
            }
            format!("{} is no longer worth points.", emoji)
        } else {
            ctx.tenant()
                .update(|cfg| cfg.state.emoji_points.insert(emoji.clone(), points));
            format!("{} is now worth {} points.", emoji, points)
        };
        ctx.tenant().persist().await?;
        ctx.reply(&text).await?;
        Ok(())
    }
}

struct SetPoints;

#[async_trait]
impl CommandHandler<PointsState> for SetPoints {
    async fn handle(&self, ctx: &CommandContext<'_, PointsState>) -> HandlerResult {
        let user = user_arg(ctx.args().require("user")?)?;
        let points: i64 = ctx.args().parse("points")?;
        ctx.tenant()
            .update(|cfg| cfg.state.balances.insert(user, points));
        ctx.tenant().persist().await?;
        ctx.reply(&format!("{} now has {} points.", mention::user(user), points))
            .await?;
        Ok(())
    }
}

/// Credits or debits the author of the reacted-to message.
pub struct AwardOnReaction;

#[async_trait]
impl ReactionHandler<PointsState> for AwardOnReaction {
    async fn handle(&self, ctx: &ReactionContext<'_, PointsState>) -> HandlerResult {
        let reaction = ctx.reaction();
        let Some(author) = reaction.message_author else {
            debug!(message = %reaction.message, "Reaction without message author");
            return Ok(());
        };
        if author == reaction.user {
            return Ok(());
        }

        let delta = match ctx.kind() {
            ReactionKind::Added => 1,
            ReactionKind::Removed => -1,
        };
        ctx.tenant().update(|cfg| {
            if let Some(points) = cfg.state.emoji_points.get(&reaction.emoji).copied() {
                cfg.state.credit(author, points.saturating_mul(delta));
            }
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_orders_by_balance_then_user() {
        let mut state = PointsState::default();
        state.credit(UserId(3), 5);
        state.credit(UserId(1), 9);
        state.credit(UserId(2), 5);
        state.credit(UserId(4), -2);
        assert_eq!(
            state.top(3),
            vec![(UserId(1), 9), (UserId(2), 5), (UserId(3), 5)]
        );
    }

    #[test]
    fn credit_saturates() {
        let mut state = PointsState::default();
        state.credit(UserId(1), i64::MAX);
        assert_eq!(state.credit(UserId(1), 1), i64::MAX);
    }

    #[test]
    fn state_round_trips_with_user_keys() {
        let mut state = PointsState::default();
        state.emoji_points.insert("⭐".into(), 3);
        state.credit(UserId(42), 7);
        let json = serde_json::to_string(&state).unwrap();
        let back: PointsState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }
}
