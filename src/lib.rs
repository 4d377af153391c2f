//! git-autostage
//!
//! Watches workspace directories and automatically stages newly created,
//! currently untracked files into the git index. Files that are merely
//! modified or already tracked are never touched: intentional staging
//! decisions for edits stay with the user.
//!
//! ## Pipeline
//!
//! ```text
//! Filesystem event
//!        ↓
//! EventFilter (create-only, .git rejection, duplicate absorption)
//!        ↓
//! locator::locate (.git marker + rev-parse confirmation)
//!        ↓
//! classifier::classify (git status --short: ?? / tracked / ignored)
//!        ↓
//! Stager (FIFO worker, at most one git add in flight)
//!        ↓
//! post-check (status must read A) → StageOutcome broadcast
//! ```
//!
//! Only the stager gives a hard ordering guarantee: requests execute in
//! submission order, one subprocess at a time, because concurrent adds
//! against the same repository can corrupt the index lock. Discovery and
//! classification are read-only probes and may run concurrently.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use git_autostage::prelude::*;
//! use std::path::PathBuf;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let flag = EnablementFlag::load(default_flag_path());
//!     let (mut service, mut outcomes) = AutoStage::new(flag);
//!
//!     service.add_root(PathBuf::from("/path/to/workspace")).await;
//!     service.start().await;
//!
//!     tokio::spawn(async move {
//!         while let Ok(outcome) = outcomes.recv().await {
//!             println!("{outcome:?}");
//!         }
//!     });
//!
//!     tokio::signal::ctrl_c().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Module Structure
//!
//! - [`pipeline`]: repository discovery, classification, and the staging worker
//!   - [`pipeline::git`]: git subprocess invocations
//!   - [`pipeline::locator`]: working-tree discovery
//!   - [`pipeline::classifier`]: untracked/tracked/ignored classification
//!   - [`pipeline::stager`]: FIFO staging worker
//! - [`watch`]: filesystem watching
//!   - [`watch::events`]: create-only filtering and de-duplication
//!   - [`watch::manager`]: one watch per workspace root
//! - [`enablement`]: the persisted on/off flag
//! - [`service`]: the `AutoStage` coordinator

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod enablement;
pub mod pipeline;
pub mod service;
pub mod watch;

/// Re-exports for convenience.
pub mod prelude {
    pub use crate::enablement::{default_flag_path, EnablementFlag};
    pub use crate::pipeline::{
        classify, locate, ChangeKind, GitError, StageOutcome, StageRequest, Stager,
    };
    pub use crate::service::AutoStage;
    pub use crate::watch::{EventFilter, WatchError, WatchManager};
}

#[cfg(test)]
pub(crate) mod test_util {
    //! Shared helpers for tests that run against real temporary repositories.

    use std::path::Path;
    use std::process::Command;

    /// Whether a usable `git` binary is on PATH; tests that need one
    /// return early when it is missing.
    pub fn git_available() -> bool {
        Command::new("git")
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    /// Run git in `dir`, panicking on failure, returning stdout.
    pub fn git(dir: &Path, args: &[&str]) -> String {
        let output = Command::new("git")
            .args(args)
            .current_dir(dir)
            .output()
            .expect("failed to run git");
        assert!(
            output.status.success(),
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).into_owned()
    }

    /// Initialize a repository with a committer identity so commits work.
    pub fn init_repo(dir: &Path) {
        git(dir, &["init", "--quiet"]);
        git(dir, &["config", "user.email", "test@example.com"]);
        git(dir, &["config", "user.name", "Test"]);
    }
}
