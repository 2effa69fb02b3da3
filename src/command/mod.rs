//! Command declaration, registration and matching.
//!
//! An extension declares its commands once, as a list of [`CommandDef`]s.
//! [`CommandSet::register`] validates them and sorts them by specificity:
//! longer keywords first, and at equal length commands that take
//! parameters before those that do not. Matching then walks the list in
//! that order, which is what lets `set emoji points` win over `set` without
//! any prefix tree.

mod definition;
mod matcher;
mod registry;

pub use definition::{Command, CommandDef, CommandHandler};
pub use matcher::{CommandArgs, MatchOutcome, Matcher};
pub use registry::{CommandSet, Scan};
