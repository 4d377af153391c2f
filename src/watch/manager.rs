//! Per-root watch ownership.
//!
//! The manager keeps an explicit map from workspace root to its live watch,
//! so multi-root disposal and re-creation are precise. Each active root
//! owns a recursive `notify` watcher whose raw events drain into a task
//! running the locate → classify → enqueue pipeline.

use notify::{Config, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::pipeline::classifier::{classify, ChangeKind};
use crate::pipeline::locator;
use crate::pipeline::stager::{StageOutcome, StageRequest, Stager};
use crate::watch::events::EventFilter;

/// Default de-duplication window for repeated creation events.
const DEDUP_WINDOW: Duration = Duration::from_millis(500);
/// Default capacity of the recently-admitted-path cache, per root.
const DEDUP_CAPACITY: usize = 1024;

/// Errors that can occur while establishing a watch.
#[derive(Error, Debug)]
pub enum WatchError {
    /// The notify backend could not be constructed.
    #[error("failed to create watcher: {0}")]
    WatcherCreation(#[from] notify::Error),

    /// A specific root could not be watched.
    #[error("failed to watch path {path}: {source}")]
    WatchPath {
        /// The root that could not be watched.
        path: PathBuf,
        /// The underlying notify error.
        source: notify::Error,
    },
}

/// An active watch on one workspace root.
///
/// Dropping the notify watcher stops event delivery; aborting the drain
/// task stops pipeline processing. Both happen on disposal.
struct WatchHandle {
    _watcher: RecommendedWatcher,
    drain_task: tokio::task::JoinHandle<()>,
}

impl WatchHandle {
    fn dispose(self) {
        self.drain_task.abort();
    }
}

/// Owns one filesystem watch per active workspace root.
pub struct WatchManager {
    watches: HashMap<PathBuf, WatchHandle>,
    stager: Stager,
    dedup_window: Duration,
    dedup_capacity: usize,
}

impl WatchManager {
    /// Create a manager feeding eligible paths into `stager`.
    pub fn new(stager: Stager) -> Self {
        Self {
            watches: HashMap::new(),
            stager,
            dedup_window: DEDUP_WINDOW,
            dedup_capacity: DEDUP_CAPACITY,
        }
    }

    /// Start watching `root` if it is a repository.
    ///
    /// Returns `Ok(true)` when a watch is now active, `Ok(false)` when the
    /// root is not inside a working tree (logged, no watch; the root gets
    /// re-probed on the next enable cycle). Already-watched roots are left
    /// as they are.
    pub async fn watch_root(&mut self, root: PathBuf) -> Result<bool, WatchError> {
        if self.watches.contains_key(&root) {
            return Ok(true);
        }

        if locator::locate(&root).await.is_none() {
            tracing::info!(root = %root.display(), "not a git repository, skipping watch");
            return Ok(false);
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let mut watcher = RecommendedWatcher::new(
            move |res: Result<notify::Event, notify::Error>| match res {
                Ok(event) => {
                    let _ = tx.send(event);
                }
                Err(err) => {
                    tracing::warn!(%err, "watch backend error");
                }
            },
            Config::default(),
        )?;

        watcher
            .watch(&root, RecursiveMode::Recursive)
            .map_err(|e| WatchError::WatchPath {
                path: root.clone(),
                source: e,
            })?;

        let filter = EventFilter::new(self.dedup_window, self.dedup_capacity);
        let stager = self.stager.clone();
        let drain_root = root.clone();
        let drain_task = tokio::spawn(async move {
            drain_loop(drain_root, rx, stager, filter).await;
        });

        tracing::info!(root = %root.display(), "watching for new files");
        self.watches.insert(
            root,
            WatchHandle {
                _watcher: watcher,
                drain_task,
            },
        );
        Ok(true)
    }

    /// Dispose the watch for `root`, if any.
    pub fn unwatch_root(&mut self, root: &Path) {
        if let Some(handle) = self.watches.remove(root) {
            handle.dispose();
            tracing::info!(root = %root.display(), "watch disposed");
        }
    }

    /// Dispose every active watch.
    pub fn dispose_all(&mut self) {
        for (root, handle) in self.watches.drain() {
            handle.dispose();
            tracing::info!(root = %root.display(), "watch disposed");
        }
    }

    /// Whether `root` currently has an active watch.
    pub fn is_watching(&self, root: &Path) -> bool {
        self.watches.contains_key(root)
    }

    /// The roots with active watches, in no particular order.
    pub fn active_roots(&self) -> Vec<PathBuf> {
        self.watches.keys().cloned().collect()
    }
}

impl Drop for WatchManager {
    fn drop(&mut self) {
        self.dispose_all();
    }
}

/// Pipeline stage for one root: filter, locate, classify, enqueue.
///
/// Classification is re-run per event against live repository state; the
/// binding between a path and its repository is never cached, since repos
/// can be initialized or removed while the watch is active.
async fn drain_loop(
    root: PathBuf,
    mut rx: mpsc::UnboundedReceiver<notify::Event>,
    stager: Stager,
    mut filter: EventFilter,
) {
    while let Some(event) = rx.recv().await {
        for path in filter.filter(&event) {
            let Some(repo_root) = locator::locate(&path).await else {
                tracing::debug!(path = %path.display(), "created outside a repository");
                continue;
            };

            match classify(&path, &repo_root).await {
                Ok(ChangeKind::Untracked) => {
                    stager.enqueue(StageRequest { path, repo_root });
                }
                Ok(kind) => {
                    tracing::debug!(path = %path.display(), ?kind, "not untracked, skipping");
                }
                Err(err) => {
                    stager.publish(StageOutcome::StatusFailed {
                        path,
                        error: err.to_string(),
                    });
                }
            }
        }
    }
    tracing::debug!(root = %root.display(), "event channel closed, drain loop exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::CreateKind;
    use notify::EventKind;
    use tempfile::tempdir;
    use tokio::time::timeout;

    fn create_event(path: &Path) -> notify::Event {
        notify::Event::new(EventKind::Create(CreateKind::File)).add_path(path.to_path_buf())
    }

    #[tokio::test]
    async fn test_watch_root_skips_non_repository() {
        if !crate::test_util::git_available() {
            return;
        }
        let temp = tempdir().unwrap();
        let (stager, _rx) = Stager::spawn(16);
        let mut manager = WatchManager::new(stager);

        let active = manager.watch_root(temp.path().to_path_buf()).await.unwrap();
        assert!(!active);
        assert!(!manager.is_watching(temp.path()));
    }

    #[tokio::test]
    async fn test_watch_and_unwatch_repository() {
        if !crate::test_util::git_available() {
            return;
        }
        let temp = tempdir().unwrap();
        crate::test_util::init_repo(temp.path());
        let (stager, _rx) = Stager::spawn(16);
        let mut manager = WatchManager::new(stager);

        let active = manager.watch_root(temp.path().to_path_buf()).await.unwrap();
        assert!(active);
        assert!(manager.is_watching(temp.path()));
        assert_eq!(manager.active_roots(), vec![temp.path().to_path_buf()]);

        manager.unwatch_root(temp.path());
        assert!(!manager.is_watching(temp.path()));
    }

    #[tokio::test]
    async fn test_drain_stages_untracked_creation() {
        if !crate::test_util::git_available() {
            return;
        }
        let temp = tempdir().unwrap();
        crate::test_util::init_repo(temp.path());
        let file = temp.path().join("a.txt");
        std::fs::write(&file, "hello").unwrap();

        let (stager, mut outcomes) = Stager::spawn(16);
        let (tx, rx) = mpsc::unbounded_channel();
        let filter = EventFilter::new(Duration::from_millis(100), 16);
        tokio::spawn(drain_loop(
            temp.path().to_path_buf(),
            rx,
            stager,
            filter,
        ));

        tx.send(create_event(&file)).unwrap();

        let outcome = timeout(Duration::from_secs(10), outcomes.recv())
            .await
            .expect("no outcome within timeout")
            .unwrap();
        match outcome {
            StageOutcome::Staged { path } => assert_eq!(path, file),
            other => panic!("expected Staged, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_drain_drops_tracked_and_git_internal_paths() {
        if !crate::test_util::git_available() {
            return;
        }
        let temp = tempdir().unwrap();
        crate::test_util::init_repo(temp.path());

        // Already staged: must never be re-added.
        let staged = temp.path().join("staged.txt");
        std::fs::write(&staged, "x").unwrap();
        crate::test_util::git(temp.path(), &["add", "staged.txt"]);

        // Under .git: must be rejected before the classifier.
        let internal = temp.path().join(".git/objects/zz");
        std::fs::create_dir_all(internal.parent().unwrap()).unwrap();
        std::fs::write(&internal, "x").unwrap();

        // Genuinely new file, used as a fence: once it is staged, the
        // earlier events have been fully processed in order.
        let fresh = temp.path().join("fresh.txt");
        std::fs::write(&fresh, "x").unwrap();

        let (stager, mut outcomes) = Stager::spawn(16);
        let (tx, rx) = mpsc::unbounded_channel();
        let filter = EventFilter::new(Duration::from_millis(100), 16);
        tokio::spawn(drain_loop(
            temp.path().to_path_buf(),
            rx,
            stager,
            filter,
        ));

        tx.send(create_event(&staged)).unwrap();
        tx.send(create_event(&internal)).unwrap();
        tx.send(create_event(&fresh)).unwrap();

        let outcome = timeout(Duration::from_secs(10), outcomes.recv())
            .await
            .expect("no outcome within timeout")
            .unwrap();
        match outcome {
            StageOutcome::Staged { path } => assert_eq!(path, fresh),
            other => panic!("expected Staged for fresh.txt, got {other:?}"),
        }
        // Nothing else was staged.
        let listed = crate::test_util::git(temp.path(), &["diff", "--cached", "--name-only"]);
        let mut names: Vec<_> = listed.split_whitespace().collect();
        names.sort_unstable();
        assert_eq!(names, vec!["fresh.txt", "staged.txt"]);
    }

    #[tokio::test]
    async fn test_burst_of_creations_all_staged_in_order() {
        if !crate::test_util::git_available() {
            return;
        }
        let temp = tempdir().unwrap();
        crate::test_util::init_repo(temp.path());

        let (stager, mut outcomes) = Stager::spawn(64);
        let (tx, rx) = mpsc::unbounded_channel();
        let filter = EventFilter::new(Duration::from_millis(100), 64);
        tokio::spawn(drain_loop(
            temp.path().to_path_buf(),
            rx,
            stager,
            filter,
        ));

        let mut expected = Vec::new();
        for i in 0..4 {
            let file = temp.path().join(format!("burst{i}.txt"));
            std::fs::write(&file, "x").unwrap();
            tx.send(create_event(&file)).unwrap();
            expected.push(file);
        }

        for want in expected {
            let outcome = timeout(Duration::from_secs(10), outcomes.recv())
                .await
                .expect("no outcome within timeout")
                .unwrap();
            match outcome {
                StageOutcome::Staged { path } => assert_eq!(path, want),
                other => panic!("expected Staged, got {other:?}"),
            }
        }
    }
}
