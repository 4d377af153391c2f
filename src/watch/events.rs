//! Raw event filtering and de-duplication.
//!
//! Only file-creation events are wired into staging. Staging on every save
//! or rename would defeat the "only new files" intent, so modification and
//! deletion events are dropped here. Editors also tend to emit the same
//! creation event several times in quick succession (write, then rename
//! into place), so admitted paths are remembered in a bounded LRU window
//! and duplicates within that window are absorbed.

use lru::LruCache;
use notify::{Event, EventKind};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Whether `path` lies under a `.git` metadata directory.
///
/// Control-plane files are never staged, and index mutations by git itself
/// must not feed back into the pipeline.
pub fn under_git_dir(path: &Path) -> bool {
    path.components().any(|c| c.as_os_str() == ".git")
}

/// Filters raw notify events down to paths eligible for classification.
///
/// A path survives filtering when the event is a creation, the path is not
/// under `.git/`, it refers to a regular file (directories produce their
/// own nested file events), and it has not been admitted within the
/// de-duplication window.
pub struct EventFilter {
    recent: LruCache<PathBuf, Instant>,
    window: Duration,
}

impl EventFilter {
    /// Create a filter with the given de-duplication window and LRU
    /// capacity for recently admitted paths.
    pub fn new(window: Duration, capacity: usize) -> Self {
        Self {
            recent: LruCache::new(NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN)),
            window,
        }
    }

    /// Apply the create-only policy and path rules to one raw event.
    pub fn filter(&mut self, event: &Event) -> Vec<PathBuf> {
        if !matches!(event.kind, EventKind::Create(_)) {
            return Vec::new();
        }

        event
            .paths
            .iter()
            .filter(|path| {
                if under_git_dir(path) {
                    tracing::debug!(path = %path.display(), "ignoring event under .git");
                    return false;
                }
                if !path.is_file() {
                    return false;
                }
                true
            })
            .cloned()
            .filter(|path| self.admit(path))
            .collect()
    }

    /// Record `path` as seen; false if it was already seen within the window.
    ///
    /// Suppressed duplicates do not refresh the timestamp: the window is
    /// anchored at the last *admitted* event, so a file genuinely
    /// re-created during a storm of duplicate events is admitted again
    /// once the window from its first admission has passed.
    fn admit(&mut self, path: &Path) -> bool {
        let now = Instant::now();
        let duplicate = self
            .recent
            .get(path)
            .is_some_and(|seen| now.duration_since(*seen) < self.window);

        if duplicate {
            tracing::debug!(path = %path.display(), "duplicate creation event absorbed");
            return false;
        }

        self.recent.put(path.to_path_buf(), now);
        true
    }
}
