//! Short-lived `git` subprocess invocations.
//!
//! Every query and mutation against a repository goes through [`run_git`],
//! which always runs with the repository root as its working directory so
//! that relative path arguments resolve unambiguously.

use std::ffi::{OsStr, OsString};
use std::path::Path;
use thiserror::Error;
use tokio::process::Command;

/// Errors from invoking the external `git` binary.
#[derive(Error, Debug)]
pub enum GitError {
    /// The subprocess could not be spawned at all (binary missing, permissions).
    #[error("failed to run git: {0}")]
    Spawn(#[from] std::io::Error),

    /// The subprocess ran but exited non-zero.
    #[error("git {args} exited with status {code:?}: {stderr}")]
    Exit {
        /// The arguments the command was invoked with.
        args: String,
        /// Exit code, if the process was not killed by a signal.
        code: Option<i32>,
        /// Trimmed stderr text from the failed invocation.
        stderr: String,
    },
}

/// Captured output of a successful git invocation.
#[derive(Debug, Clone)]
pub struct GitOutput {
    /// Stdout, lossily decoded.
    pub stdout: String,
    /// Stderr, lossily decoded.
    pub stderr: String,
}

/// Run `git` with the given arguments and `repo_root` as working directory.
///
/// A non-zero exit is reported as [`GitError::Exit`] with the captured
/// stderr; callers decide whether that is an expected condition (most
/// directories are not repositories) or worth surfacing.
pub async fn run_git<I, S>(repo_root: &Path, args: I) -> Result<GitOutput, GitError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let args: Vec<OsString> = args.into_iter().map(|a| a.as_ref().to_owned()).collect();

    let output = Command::new("git")
        .args(&args)
        .current_dir(repo_root)
        .output()
        .await?;

    if !output.status.success() {
        return Err(GitError::Exit {
            args: args
                .iter()
                .map(|a| a.to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join(" "),
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(GitOutput {
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

/// Path of `path` relative to `repo_root`, for use as a git argument.
///
/// Falls back to the absolute path if `path` is not under `repo_root`;
/// git resolves absolute paths inside the tree just as well.
pub fn relative_to_root<'a>(path: &'a Path, repo_root: &Path) -> &'a Path {
    path.strip_prefix(repo_root).unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_relative_to_root() {
        let root = PathBuf::from("/repo");
        let path = PathBuf::from("/repo/dir/file.txt");
        assert_eq!(relative_to_root(&path, &root), Path::new("dir/file.txt"));
    }

    #[test]
    fn test_relative_to_root_outside() {
        let root = PathBuf::from("/repo");
        let path = PathBuf::from("/elsewhere/file.txt");
        assert_eq!(relative_to_root(&path, &root), path.as_path());
    }

    #[tokio::test]
    async fn test_run_git_version() {
        if !crate::test_util::git_available() {
            return;
        }
        let out = run_git(Path::new("."), ["--version"]).await.unwrap();
        assert!(out.stdout.starts_with("git version"));
    }

    #[tokio::test]
    async fn test_run_git_failure_captures_stderr() {
        if !crate::test_util::git_available() {
            return;
        }
        let err = run_git(Path::new("."), ["no-such-subcommand"])
            .await
            .unwrap_err();
        match err {
            GitError::Exit { code, .. } => assert_ne!(code, Some(0)),
            other => panic!("expected Exit error, got {other:?}"),
        }
    }
}
