//! Top-level auto-staging service.
//!
//! `AutoStage` ties the pieces together: it owns the staging worker, the
//! watch manager, the set of known workspace roots, and the persisted
//! enablement flag. Enable/disable is an explicit two-state machine whose
//! transition actions are "dispose every watch" and "re-probe every root
//! from scratch"; no watch state survives a disable/enable cycle.

use std::path::{Path, PathBuf};

use tokio::sync::broadcast;

use crate::enablement::EnablementFlag;
use crate::pipeline::stager::{StageOutcome, Stager};
use crate::watch::manager::WatchManager;

/// The auto-staging service.
pub struct AutoStage {
    manager: WatchManager,
    stager: Stager,
    flag: EnablementFlag,
    roots: Vec<PathBuf>,
}

impl AutoStage {
    /// Create the service with the given persisted flag.
    ///
    /// Returns the service and a receiver for staging outcomes. No watches
    /// exist yet; register roots with [`AutoStage::add_root`].
    pub fn new(flag: EnablementFlag) -> (Self, broadcast::Receiver<StageOutcome>) {
        let (stager, outcomes) = Stager::spawn(64);
        let manager = WatchManager::new(stager.clone());

        (
            Self {
                manager,
                stager,
                flag,
                roots: Vec::new(),
            },
            outcomes,
        )
    }

    /// Whether event intake is currently enabled.
    pub fn is_enabled(&self) -> bool {
        self.flag.get()
    }

    /// Subscribe a new observer to staging outcomes.
    pub fn subscribe(&self) -> broadcast::Receiver<StageOutcome> {
        self.stager.subscribe()
    }

    /// The workspace roots the service knows about, watched or not.
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Roots with an active watch right now.
    pub fn watched_roots(&self) -> Vec<PathBuf> {
        self.manager.active_roots()
    }

    /// Register a workspace root.
    ///
    /// When enabled, the root is probed immediately and watched if it is a
    /// repository. A probe failure is not an error for the caller: the
    /// root simply stays inactive until the next enable cycle.
    pub async fn add_root(&mut self, root: PathBuf) {
        if !self.roots.contains(&root) {
            self.roots.push(root.clone());
        }
        if self.flag.get() {
            self.probe(root).await;
        }
    }

    /// Forget a workspace root and dispose its watch, if any.
    pub fn remove_root(&mut self, root: &Path) {
        self.roots.retain(|r| r != root);
        self.manager.unwatch_root(root);
    }

    /// Persist the flag and apply the state transition.
    ///
    /// Disabling disposes all watches immediately (in-flight staging
    /// operations run to completion). Enabling re-probes every known root
    /// from scratch. Setting the current value is a no-op.
    pub async fn set_enabled(&mut self, enabled: bool) -> std::io::Result<()> {
        if enabled == self.flag.get() {
            return Ok(());
        }
        self.flag.set(enabled)?;

        if enabled {
            tracing::info!("auto-staging enabled");
            for root in self.roots.clone() {
                self.probe(root).await;
            }
        } else {
            tracing::info!("auto-staging disabled");
            self.manager.dispose_all();
        }
        Ok(())
    }

    /// Probe all known roots and watch the ones that are repositories.
    ///
    /// Idempotent and cheap; call once at startup after registering the
    /// initial root set.
    pub async fn start(&mut self) {
        if !self.flag.get() {
            tracing::info!("auto-staging is disabled, not watching");
            return;
        }
        for root in self.roots.clone() {
            self.probe(root).await;
        }
    }

    async fn probe(&mut self, root: PathBuf) {
        if let Err(err) = self.manager.watch_root(root.clone()).await {
            tracing::error!(root = %root.display(), %err, "failed to establish watch");
        }
    }
}
