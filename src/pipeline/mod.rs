//! The event-to-staging pipeline.
//!
//! This module provides:
//! - `git`: short-lived git subprocess invocations
//! - `locator`: working-tree discovery for arbitrary paths
//! - `classifier`: untracked/tracked/ignored classification
//! - `stager`: the FIFO staging worker

pub mod classifier;
pub mod git;
pub mod locator;
pub mod stager;

pub use classifier::{classify, parse_short_status, ChangeKind};
pub use git::{run_git, GitError, GitOutput};
pub use locator::locate;
pub use stager::{StageOutcome, StageRequest, Stager};
