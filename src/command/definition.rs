//! Command definitions and the handler trait.

use super::matcher::Matcher;
use crate::error::HandlerResult;
use crate::extension::CommandContext;
use crate::permission::PermissionLevel;
use crate::tenant::TenantState;
use async_trait::async_trait;

/// Handler for one command.
///
/// Implementations are usually unit structs, one per command:
///
/// ```ignore
/// pub struct Leaderboard;
///
/// #[async_trait]
/// impl CommandHandler<PointsState> for Leaderboard {
///     async fn handle(&self, ctx: &CommandContext<'_, PointsState>) -> HandlerResult {
///         let top = ctx.tenant().read(|cfg| cfg.state.top(10));
///         ctx.reply(&render(top)).await?;
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait CommandHandler<S: TenantState>: Send + Sync {
    /// Run the command. Only called after the keyword and parameters matched
    /// and the caller's level allows it.
    async fn handle(&self, ctx: &CommandContext<'_, S>) -> HandlerResult;
}

/// Declarative description of a command, consumed by
/// [`CommandSet::register`](super::CommandSet::register).
pub struct CommandDef<S> {
    pub(super) keyword: String,
    pub(super) params: Option<String>,
    pub(super) level: PermissionLevel,
    pub(super) usage: Option<String>,
    pub(super) about: Option<String>,
    pub(super) handler: Box<dyn CommandHandler<S>>,
}

impl<S: TenantState> CommandDef<S> {
    /// A parameterless, unrestricted command.
    pub fn new(keyword: impl Into<String>, handler: impl CommandHandler<S> + 'static) -> Self {
        Self {
            keyword: keyword.into(),
            params: None,
            level: PermissionLevel::Unrestricted,
            usage: None,
            about: None,
            handler: Box::new(handler),
        }
    }

    /// Regular expression the text after the keyword must match. Named
    /// capture groups become handler arguments.
    pub fn params(mut self, pattern: impl Into<String>) -> Self {
        self.params = Some(pattern.into());
        self
    }

    /// Minimum caller level.
    pub fn level(mut self, level: PermissionLevel) -> Self {
        self.level = level;
        self
    }

    /// Argument synopsis shown in usage hints, e.g. `<emoji> <points>`.
    pub fn usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = Some(usage.into());
        self
    }

    /// One-line description for `help`.
    pub fn about(mut self, about: impl Into<String>) -> Self {
        self.about = Some(about.into());
        self
    }
}

/// A registered, immutable command.
pub struct Command<S> {
    keyword: String,
    matcher: Matcher,
    level: PermissionLevel,
    usage: Option<String>,
    about: Option<String>,
    handler: Box<dyn CommandHandler<S>>,
}

impl<S: TenantState> Command<S> {
    pub(super) fn new(def: CommandDef<S>, matcher: Matcher) -> Self {
        Self {
            keyword: def.keyword,
            matcher,
            level: def.level,
            usage: def.usage,
            about: def.about,
            handler: def.handler,
        }
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn level(&self) -> PermissionLevel {
        self.level
    }

    pub fn takes_params(&self) -> bool {
        self.matcher.takes_params()
    }

    pub fn about(&self) -> Option<&str> {
        self.about.as_deref()
    }

    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    pub fn handler(&self) -> &dyn CommandHandler<S> {
        self.handler.as_ref()
    }

    /// Argument synopsis: the declared usage, or the pattern's named groups.
    pub fn synopsis(&self) -> Option<String> {
        if let Some(usage) = &self.usage {
            return Some(usage.clone());
        }
        let names: Vec<String> = self
            .matcher
            .param_names()
            .map(|name| format!("<{}>", name))
            .collect();
        (!names.is_empty()).then(|| names.join(" "))
    }

    /// How the command is invoked under `indicator`.
    pub fn invocation(&self, indicator: char) -> String {
        match self.synopsis() {
            Some(synopsis) => format!("{}{} {}", indicator, self.keyword, synopsis),
            None => format!("{}{}", indicator, self.keyword),
        }
    }

    /// Hint shown when the keyword matched but the parameters did not.
    pub fn usage_hint(&self, indicator: char) -> String {
        format!("Usage: `{}`", self.invocation(indicator))
    }
}
