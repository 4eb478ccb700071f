//! Changelog parsing
//!
//! # Modules
//!
//! - [`change`]: Typed change records
//! - [`parser`]: Turns release API responses into [`ReleaseContent`](crate::release::types::ReleaseContent)

pub mod change;
pub mod parser;

pub use change::{Change, ChangeKind};
pub use parser::ChangelogParser;
