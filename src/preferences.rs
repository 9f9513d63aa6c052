//! Remembers the last selected account between sessions.
//!
//! The file is a small JSON object, `{"last_account": "<display name>"}`.
//! Reading never fails the caller: a missing, unreadable or malformed file
//! just means there is no remembered account. Writes go through a temp file
//! and a rename so a crash never leaves a half-written file behind.

use std::{
    fs,
    io::{self, Write as _},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, thiserror::Error)]
pub enum PreferenceError {
    #[error("Could not write preferences file {0}")]
    Write(PathBuf, #[source] io::Error),
    #[error("Could not serialize preferences")]
    Serialize(#[source] serde_json::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub last_account: String,
}

#[derive(Debug, Clone)]
pub struct PreferenceStore {
    path: PathBuf,
}

impl PreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The remembered display name, if any.
    pub fn load(&self) -> Option<String> {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no preferences file");
                return None;
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "could not read preferences");
                return None;
            }
        };

        let prefs: Preferences = match serde_json::from_str(&content) {
            Ok(p) => p,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "ignoring malformed preferences");
                return None;
            }
        };

        Some(prefs.last_account).filter(|name| !name.is_empty())
    }

    /// Overwrites the file with `last_account`.
    pub fn save(&self, last_account: &str) -> Result<(), PreferenceError> {
        let prefs = Preferences {
            last_account: last_account.to_string(),
        };
        let json = serde_json::to_string(&prefs).map_err(PreferenceError::Serialize)?;

        self.write_atomic(json.as_bytes())
            .map_err(|e| PreferenceError::Write(self.path.clone(), e))
    }

    fn write_atomic(&self, bytes: &[u8]) -> io::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        // Same directory as the target so the rename stays on one filesystem.
        let tmp_path = self.path.with_extension("json.tmp");
        let result = write_then_rename(&tmp_path, &self.path, bytes);
        if result.is_err() {
            if let Err(e) = fs::remove_file(&tmp_path) {
                if e.kind() != io::ErrorKind::NotFound {
                    warn!(path = %tmp_path.display(), error = %e, "could not remove temp file");
                }
            }
        }

        result
    }
}

fn write_then_rename(tmp_path: &Path, path: &Path, bytes: &[u8]) -> io::Result<()> {
    {
        let mut file = fs::File::create(tmp_path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
    }

    fs::rename(tmp_path, path)
}
