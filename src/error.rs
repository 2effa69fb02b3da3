//! Unified error handling for hubbot.
//!
//! This module provides the error hierarchy of the dispatch core, with
//! automatic conversions, user-facing reply text, and metric labeling.
//! Scan outcomes (`Unhandled`, `ParameterError`) and permission filtering are
//! deliberately *not* errors; see [`crate::command::Scan`].

use hubbot_proto::FrameError;
use thiserror::Error;

// ============================================================================
// Registration Errors (module construction)
// ============================================================================

/// Errors raised while building an extension's command list.
///
/// These are programmer errors and abort module construction.
#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("duplicate command keyword '{0}'")]
    DuplicateKeyword(String),

    #[error("invalid command keyword '{0}'")]
    InvalidKeyword(String),

    #[error("invalid parameter pattern for '{keyword}': {source}")]
    InvalidPattern {
        keyword: String,
        #[source]
        source: regex::Error,
    },
}

// ============================================================================
// Platform Errors (event sink / lookups)
// ============================================================================

/// Failures of platform API calls made through [`crate::gateway::Platform`].
#[derive(Debug, Clone, Error)]
pub enum PlatformError {
    #[error("not connected to the gateway")]
    Disconnected,

    #[error("request timed out")]
    Timeout,

    #[error("request rejected: {0}")]
    Rejected(String),

    #[error("protocol violation: {0}")]
    Protocol(String),
}

// ============================================================================
// Gateway Errors (connection lifecycle)
// ============================================================================

/// Failures opening or closing the event-source connection.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    #[error("connection already open")]
    AlreadyOpen,

    #[error("gateway closed: {0}")]
    Closed(String),
}

// ============================================================================
// Storage Errors (tenant persistence)
// ============================================================================

/// Failures of the tenant configuration persistence collaborator.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("invalid storage key: {0}")]
    InvalidKey(String),
}

// ============================================================================
// Handler Errors (command processing)
// ============================================================================

/// Errors that can occur while a command or reaction handler runs.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("platform error: {0}")]
    Platform(#[from] PlatformError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl HandlerError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Platform(PlatformError::Disconnected) => "platform_disconnected",
            Self::Platform(PlatformError::Timeout) => "platform_timeout",
            Self::Platform(PlatformError::Rejected(_)) => "platform_rejected",
            Self::Platform(PlatformError::Protocol(_)) => "platform_protocol",
            Self::Storage(_) => "storage",
            Self::InvalidArgument(_) => "invalid_argument",
            Self::Internal(_) => "internal_error",
        }
    }

    /// Text shown to the invoking user, if the error warrants a reply.
    ///
    /// Returns `None` for errors that should only be logged (storage and
    /// internal failures, lost connection).
    pub fn user_message(&self) -> Option<String> {
        match self {
            Self::InvalidArgument(text) => Some(text.clone()),
            Self::Platform(PlatformError::Rejected(reason)) => {
                Some(format!("The platform refused that request: {}", reason))
            }
            Self::Platform(PlatformError::Timeout) => {
                Some("The platform did not answer in time, please try again.".to_string())
            }
            Self::Platform(_) => None,
            Self::Storage(_) => None,
            Self::Internal(_) => None,
        }
    }
}

/// Result type for command and reaction handlers.
pub type HandlerResult = Result<(), HandlerError>;
