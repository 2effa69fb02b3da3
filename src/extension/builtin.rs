//! Commands every extension carries.

use super::CommandContext;
use crate::command::{CommandDef, CommandHandler};
use crate::config::is_valid_indicator;
use crate::error::{HandlerError, HandlerResult};
use crate::permission::PermissionLevel;
use crate::tenant::TenantState;
use async_trait::async_trait;
use hubbot_proto::mention;
use std::fmt::Write;

const ROLE_PATTERN: &str = r"(?P<role><@&\d+>|\d+)";

pub(crate) fn definitions<S: TenantState>() -> Vec<CommandDef<S>> {
    vec![
        CommandDef::new("help", Help).about("List the commands you can use."),
        CommandDef::new("set indicator", SetIndicator)
            .params(r"(?P<indicator>\S)")
            .level(PermissionLevel::Admin)
            .about("Change the character that starts commands."),
        CommandDef::new("admin roles", AdminRoles)
            .level(PermissionLevel::Admin)
            .about("List roles with admin access."),
        CommandDef::new("admin role add", AdminRoleAdd)
            .params(ROLE_PATTERN)
            .level(PermissionLevel::Owner)
            .about("Grant admin access to a role."),
        CommandDef::new("admin role remove", AdminRoleRemove)
            .params(ROLE_PATTERN)
            .level(PermissionLevel::Owner)
            .about("Revoke admin access from a role."),
    ]
}

/// Lists only what the caller's level can see.
struct Help;

#[async_trait]
impl<S: TenantState> CommandHandler<S> for Help {
    async fn handle(&self, ctx: &CommandContext<'_, S>) -> HandlerResult {
        let mut text = format!("**{} commands**", ctx.extension());
        let mut visible: Vec<_> = ctx.commands().visible(ctx.level()).collect();
        visible.sort_by(|a, b| a.keyword().cmp(b.keyword()));
        for command in visible {
            let _ = write!(text, "\n`{}`", command.invocation(ctx.indicator()));
            if let Some(about) = command.about() {
                let _ = write!(text, " - {}", about);
            }
        }
        ctx.reply(&text).await?;
        Ok(())
    }
}

struct SetIndicator;

#[async_trait]
impl<S: TenantState> CommandHandler<S> for SetIndicator {
    async fn handle(&self, ctx: &CommandContext<'_, S>) -> HandlerResult {
        let indicator: char = ctx.args().parse("indicator")?;
        if !is_valid_indicator(indicator) {
            return Err(HandlerError::InvalidArgument(format!(
                "`{}` cannot be used as an indicator.",
                indicator
            )));
        }
        ctx.tenant().update(|cfg| cfg.indicator = indicator);
        ctx.tenant().persist().await?;
        ctx.reply(&format!(
            "Commands for {} now start with `{}`.",
            ctx.extension(),
            indicator
        ))
        .await?;
        Ok(())
    }
}

struct AdminRoles;

#[async_trait]
impl<S: TenantState> CommandHandler<S> for AdminRoles {
    async fn handle(&self, ctx: &CommandContext<'_, S>) -> HandlerResult {
        let roles = ctx.tenant().read(|cfg| cfg.admin_roles.clone());
        let text = if roles.is_empty() {
            "No admin roles are configured.".to_string()
        } else {
            let list: Vec<String> = roles.into_iter().map(mention::role).collect();
            format!("Admin roles: {}", list.join(", "))
        };
        ctx.reply(&text).await?;
        Ok(())
    }
}

fn role_arg<S: TenantState>(ctx: &CommandContext<'_, S>) -> Result<hubbot_proto::RoleId, HandlerError> {
    let raw = ctx.args().require("role")?;
    mention::parse_role(raw)
        .ok_or_else(|| HandlerError::InvalidArgument(format!("`{}` is not a role.", raw)))
}

struct AdminRoleAdd;

#[async_trait]
impl<S: TenantState> CommandHandler<S> for AdminRoleAdd {
    async fn handle(&self, ctx: &CommandContext<'_, S>) -> HandlerResult {
        let role = role_arg(ctx)?;
        let added = ctx.tenant().update(|cfg| cfg.admin_roles.insert(role));
        let text = if added {
            ctx.tenant().persist().await?;
            format!("{} now has admin access.", mention::role(role))
        } else {
            format!("{} already has admin access.", mention::role(role))
        };
        ctx.reply(&text).await?;
        Ok(())
    }
}

struct AdminRoleRemove;

#[async_trait]
impl<S: TenantState> CommandHandler<S> for AdminRoleRemove {
    async fn handle(&self, ctx: &CommandContext<'_, S>) -> HandlerResult {
        let role = role_arg(ctx)?;
        let removed = ctx.tenant().update(|cfg| cfg.admin_roles.remove(&role));
        let text = if removed {
            ctx.tenant().persist().await?;
            format!("{} no longer has admin access.", mention::role(role))
        } else {
            format!("{} did not have admin access.", mention::role(role))
        };
        ctx.reply(&text).await?;
        Ok(())
    }
}
