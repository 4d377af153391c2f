//! Filesystem watching.
//!
//! This module provides:
//! - `events`: create-only filtering and duplicate absorption
//! - `manager`: one watch per workspace root, feeding the staging pipeline

pub mod events;
pub mod manager;

pub use events::{under_git_dir, EventFilter};
pub use manager::{WatchError, WatchManager};
