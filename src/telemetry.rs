//! Logging setup and command timing.

use crate::config::{LogFormat, LoggingConfig};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Guard for timing command execution and recording metrics.
///
/// Records command latency when dropped.
pub struct CommandTimer {
    extension: String,
    command: String,
    start: Instant,
}

impl CommandTimer {
    /// Start timing a command.
    pub fn new(extension: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            extension: extension.into(),
            command: command.into(),
            start: Instant::now(),
        }
    }
}

impl Drop for CommandTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        crate::metrics::record_command(&self.extension, &self.command, duration);
    }
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` overrides the default `info` filter.
pub fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);

    match config.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

/// Span constructors shared by the dispatch path.
pub mod spans {
    use hubbot_proto::{GuildId, UserId};
    use tracing::{Span, info_span};

    /// Span for one command invocation.
    pub fn command(extension: &str, command: &str, guild: GuildId, author: UserId) -> Span {
        info_span!("bot.command", extension = %extension, command = %command, guild = %guild, author = %author)
    }

    /// Span for one reaction callback.
    pub fn reaction(extension: &str, guild: Option<GuildId>, user: UserId) -> Span {
        match guild {
            Some(guild) => info_span!("bot.reaction", extension = %extension, guild = %guild, user = %user),
            None => info_span!("bot.reaction", extension = %extension, user = %user),
        }
    }
}
