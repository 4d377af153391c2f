//! Classification of paths against the repository index.
//!
//! The only state eligible for auto-staging is "untracked". Everything the
//! index already knows about (staged, modified, renamed) must be left
//! alone: re-staging a modified tracked file would silently sweep up
//! unrelated edits.

use std::ffi::OsStr;
use std::path::Path;

use crate::pipeline::git::{relative_to_root, run_git, GitError};

/// How a path relates to the repository index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// On disk but unknown to the index; eligible for auto-staging.
    Untracked,
    /// Already known to the index in some form; never auto-staged.
    Tracked,
    /// Invisible to version control (ignored or already clean).
    Ignored,
}

/// First line of `git status --short` for exactly this path.
///
/// The returned line is empty when git has nothing to say about the path.
pub async fn short_status(path: &Path, repo_root: &Path) -> Result<String, GitError> {
    let rel = relative_to_root(path, repo_root);
    let out = run_git(
        repo_root,
        [
            OsStr::new("status"),
            OsStr::new("--short"),
            OsStr::new("--"),
            rel.as_os_str(),
        ],
    )
    .await?;

    Ok(out.stdout.lines().next().unwrap_or("").to_string())
}

/// Interpret one short-status line.
///
/// Empty output means git does not see the path at all (ignored, or clean
/// and committed). A `??` prefix marks an untracked file. Every other
/// two-character prefix means the index already tracks the path.
pub fn parse_short_status(line: &str) -> ChangeKind {
    if line.is_empty() {
        ChangeKind::Ignored
    } else if line.starts_with("??") {
        ChangeKind::Untracked
    } else {
        ChangeKind::Tracked
    }
}

/// Classify `path` by querying the repository's short-form status.
pub async fn classify(path: &Path, repo_root: &Path) -> Result<ChangeKind, GitError> {
    let line = short_status(path, repo_root).await?;
    Ok(parse_short_status(&line))
}

/// Whether the status line marks the path as added to the index.
///
/// Used as the postcondition check after `git add`: the first status
/// column should read `A`.
pub fn is_added(line: &str) -> bool {
    line.starts_with('A')
}
