//! hubbot - a multi-tenant, multi-extension chat bot.
//!
//! One [`hub::Hub`] drives one gateway connection and fans events out to any
//! number of [`extension::Extension`]s. Each extension owns an ordered
//! [`command::CommandSet`] and a per-guild [`tenant::TenantStore`].

pub mod cancel;
pub mod command;
pub mod config;
pub mod error;
pub mod extension;
pub mod extensions;
pub mod gateway;
pub mod http;
pub mod hub;
pub mod metrics;
pub mod permission;
pub mod storage;
pub mod telemetry;
pub mod tenant;
