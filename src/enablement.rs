//! Persisted enablement flag.
//!
//! A single boolean that survives process restarts, stored as a small JSON
//! file. Missing or unreadable state defaults to enabled; the flag gates
//! event intake, never in-flight operations.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Serialize, Deserialize)]
struct FlagFile {
    enabled: bool,
}

/// The persisted on/off switch for auto-staging.
#[derive(Debug)]
pub struct EnablementFlag {
    path: PathBuf,
    enabled: bool,
}

impl EnablementFlag {
    /// Load the flag from `path`, defaulting to enabled when the file is
    /// absent or cannot be parsed.
    pub fn load(path: PathBuf) -> Self {
        let enabled = match fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str::<FlagFile>(&text) {
                Ok(flag) => flag.enabled,
                Err(err) => {
                    tracing::warn!(path = %path.display(), %err, "unreadable flag file, defaulting to enabled");
                    true
                }
            },
            Err(_) => true,
        };

        Self { path, enabled }
    }

    /// Current value.
    pub fn get(&self) -> bool {
        self.enabled
    }

    /// Set and persist the flag.
    ///
    /// The in-memory value changes even if persistence fails; the caller
    /// decides whether a failed write is worth surfacing.
    pub fn set(&mut self, enabled: bool) -> std::io::Result<()> {
        self.enabled = enabled;
        let text = serde_json::to_string_pretty(&FlagFile { enabled })
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        fs::write(&self.path, text)
    }

    /// Where the flag is persisted.
    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

/// Default location for the flag file: `$HOME/.git-autostage.json`, or the
/// current directory when no home is set.
pub fn default_flag_path() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".git-autostage.json")
}
