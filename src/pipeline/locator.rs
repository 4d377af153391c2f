//! Repository discovery.
//!
//! Given an arbitrary path, finds the root of the git working tree that
//! contains it, if any. Discovery is re-run per event rather than cached:
//! repositories can be initialized or deleted while the process runs.

use std::path::{Path, PathBuf};

use crate::pipeline::git::run_git;

/// Find the repository root containing `path`, if any.
///
/// Walks the ancestor chain looking for a `.git` marker, then confirms the
/// candidate with `git rev-parse --is-inside-work-tree`. Both checks are
/// required: the marker directory can exist while git itself refuses the
/// tree (mid-initialization or corrupted). Any failure of the external
/// query means "not a repository", which is the common case and never an
/// error.
pub async fn locate(path: &Path) -> Option<PathBuf> {
    let candidate = find_marker_root(path)?;

    match run_git(&candidate, ["rev-parse", "--is-inside-work-tree"]).await {
        Ok(out) if out.stdout.trim() == "true" => Some(candidate),
        Ok(out) => {
            tracing::debug!(
                root = %candidate.display(),
                answer = %out.stdout.trim(),
                "marker present but git does not recognize a work tree"
            );
            None
        }
        Err(err) => {
            tracing::debug!(path = %path.display(), %err, "not a git repository");
            None
        }
    }
}

/// Nearest ancestor directory containing a `.git` entry.
fn find_marker_root(path: &Path) -> Option<PathBuf> {
    let start = if path.is_dir() { path } else { path.parent()? };

    start
        .ancestors()
        .find(|dir| dir.join(".git").exists())
        .map(Path::to_path_buf)
}
