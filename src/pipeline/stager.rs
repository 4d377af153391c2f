//! FIFO staging worker.
//!
//! Stage requests flow through an unbounded channel into a single consumer
//! task, so at most one `git add` subprocess runs at any instant and
//! requests execute in submission order. A failed add never aborts the
//! queue; the worker logs it, reports it to observers, and moves on.

use std::ffi::OsStr;
use std::path::PathBuf;

use tokio::sync::{broadcast, mpsc};

use crate::pipeline::classifier::{is_added, short_status};
use crate::pipeline::git::{relative_to_root, run_git};

/// A request to stage one newly created file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageRequest {
    /// Absolute path of the created file.
    pub path: PathBuf,
    /// Root of the repository the file belongs to.
    pub repo_root: PathBuf,
}

/// Outcome of one staging attempt, broadcast to observers.
#[derive(Debug, Clone)]
pub enum StageOutcome {
    /// `git add` succeeded and the follow-up status shows the file as added.
    Staged {
        /// The staged file.
        path: PathBuf,
    },
    /// `git add` exited non-zero; the request is discarded, never retried.
    AddFailed {
        /// The file that could not be staged.
        path: PathBuf,
        /// Error text from git.
        error: String,
    },
    /// `git add` succeeded but the follow-up status does not show `A`.
    ///
    /// A soft inconsistency: the tree moved under us between the add and
    /// the re-check. Logged and reported, never retried.
    PostcheckMismatch {
        /// The file whose post-stage status was unexpected.
        path: PathBuf,
        /// The status line actually observed.
        status: String,
    },
    /// A status query failed, either before the file could be considered
    /// at all or while verifying a completed add.
    StatusFailed {
        /// The file whose status could not be read.
        path: PathBuf,
        /// Error text from git.
        error: String,
    },
}

/// Handle for submitting stage requests.
///
/// Cloning the handle shares the same queue and worker. Dropping every
/// handle closes the channel and lets the worker exit after draining.
#[derive(Clone)]
pub struct Stager {
    tx: mpsc::UnboundedSender<StageRequest>,
    outcomes: broadcast::Sender<StageOutcome>,
}

impl Stager {
    /// Spawn the worker task and return the submission handle plus an
    /// outcome receiver.
    ///
    /// `buffer_size` bounds the outcome broadcast channel, not the request
    /// queue; the request queue is unbounded by design (a burst of N
    /// creations enqueues N serialized operations).
    pub fn spawn(buffer_size: usize) -> (Self, broadcast::Receiver<StageOutcome>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (outcomes, outcome_rx) = broadcast::channel(buffer_size);

        let worker_outcomes = outcomes.clone();
        tokio::spawn(async move {
            worker_loop(rx, worker_outcomes).await;
        });

        (Self { tx, outcomes }, outcome_rx)
    }

    /// Queue a request for execution after everything already queued.
    ///
    /// Returns `false` if the worker has shut down.
    pub fn enqueue(&self, request: StageRequest) -> bool {
        self.tx.send(request).is_ok()
    }

    /// Subscribe a new observer to staging outcomes.
    pub fn subscribe(&self) -> broadcast::Receiver<StageOutcome> {
        self.outcomes.subscribe()
    }

    /// Report an outcome produced outside the worker (e.g. a status query
    /// that failed before a request could be built).
    pub fn publish(&self, outcome: StageOutcome) {
        log_outcome(&outcome);
        // No receivers is fine; outcomes are purely observational.
        let _ = self.outcomes.send(outcome);
    }
}

/// Single consumer loop: the only place `git add` is ever invoked.
async fn worker_loop(
    mut rx: mpsc::UnboundedReceiver<StageRequest>,
    outcomes: broadcast::Sender<StageOutcome>,
) {
    while let Some(request) = rx.recv().await {
        let outcome = execute(&request).await;
        log_outcome(&outcome);
        let _ = outcomes.send(outcome);
    }
    tracing::debug!("stage queue closed, worker exiting");
}

/// Run one add operation to completion, then verify the resulting status.
async fn execute(request: &StageRequest) -> StageOutcome {
    let rel = relative_to_root(&request.path, &request.repo_root);

    let add = run_git(
        &request.repo_root,
        [OsStr::new("add"), OsStr::new("--"), rel.as_os_str()],
    )
    .await;

    if let Err(err) = add {
        return StageOutcome::AddFailed {
            path: request.path.clone(),
            error: err.to_string(),
        };
    }

    verify_added(request).await
}

/// Postcondition check: the short status for the path should now begin
/// with `A`. A status line without it is a soft mismatch; a failed status
/// query is a tool failure, reported as such.
async fn verify_added(request: &StageRequest) -> StageOutcome {
    match short_status(&request.path, &request.repo_root).await {
        Ok(line) if is_added(&line) => StageOutcome::Staged {
            path: request.path.clone(),
        },
        Ok(line) => StageOutcome::PostcheckMismatch {
            path: request.path.clone(),
            status: line,
        },
        Err(err) => StageOutcome::StatusFailed {
            path: request.path.clone(),
            error: err.to_string(),
        },
    }
}

fn log_outcome(outcome: &StageOutcome) {
    match outcome {
        StageOutcome::Staged { path } => {
            tracing::info!(path = %path.display(), "staged new file");
        }
        StageOutcome::AddFailed { path, error } => {
            tracing::warn!(path = %path.display(), %error, "git add failed");
        }
        StageOutcome::PostcheckMismatch { path, status } => {
            tracing::warn!(
                path = %path.display(),
                %status,
                "staged file did not verify as added"
            );
        }
        StageOutcome::StatusFailed { path, error } => {
            tracing::warn!(path = %path.display(), %error, "status query failed");
        }
    }
}
