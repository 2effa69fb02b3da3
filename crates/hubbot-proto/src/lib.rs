//! # hubbot-proto
//!
//! Wire vocabulary shared by the hubbot dispatch core and its gateway
//! connection:
//!
//! - [`id`]: snowflake identifier newtypes (`GuildId`, `UserId`, ...)
//! - [`event`]: inbound chat events delivered by the event source
//! - [`mention`]: parsing and rendering of `<@user>` / `<@&role>` mentions
//! - [`frame`]: the JSON frames exchanged with the gateway
//!
//! ## Quick Start
//!
//! ```rust
//! use hubbot_proto::{ServerFrame, Event};
//!
//! let raw = r#"{"op":"dispatch","event":{"type":"message_created","data":{
//!     "id":1,"channel":2,"guild":3,
//!     "author":{"id":4,"name":"alice"},
//!     "content":"!points"}}}"#;
//! let frame = ServerFrame::decode(raw).expect("valid frame");
//! if let ServerFrame::Dispatch { event: Event::MessageCreated(msg) } = frame {
//!     assert_eq!(msg.content, "!points");
//! }
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod event;
pub mod frame;
pub mod id;
pub mod mention;

pub use event::{Author, Event, MessageCreated, ReactionEvent};
pub use frame::{ClientFrame, FrameError, Reply, Request, ServerFrame};
pub use id::{ChannelId, GuildId, MessageId, RoleId, UserId};
