//! Persistent quest state container.
//!
//! The whole quest lives in one JSON record. It is read once when the store
//! opens and rewritten after every update that changes it. Mutation only goes
//! through [`StateStore::update`].

use crate::quest::QuestState;
use crate::{Error, Result};
use log::{debug, warn};
use std::path::{Path, PathBuf};

/// Owner of the quest record and its backing file
pub struct StateStore {
    path: PathBuf,
    state: QuestState,
}

impl StateStore {
    /// Open the store at `path`.
    ///
    /// A missing file starts a fresh quest. A file that cannot be parsed is
    /// logged and also replaced by a fresh quest on the next write.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let state = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<QuestState>(&content) {
                Ok(state) => state,
                Err(e) => {
                    warn!("Ignoring unreadable quest state in {}: {}", path.display(), e);
                    QuestState::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No quest state at {}, starting fresh", path.display());
                QuestState::default()
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self { path, state })
    }

    /// Current record
    #[must_use]
    pub const fn state(&self) -> &QuestState {
        &self.state
    }

    /// Backing file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply `change` to the record and persist it if anything changed
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be written; the in-memory state
    /// keeps the change
    pub fn update<R, F>(&mut self, change: F) -> Result<R>
    where
        F: FnOnce(&mut QuestState) -> R,
    {
        let before = self.state.clone();
        let result = change(&mut self.state);
        if self.state != before {
            self.persist()?;
        }
        Ok(result)
    }

    /// Write the record, replacing the file atomically
    fn persist(&self) -> Result<()> {
        let content = serde_json::to_string_pretty(&self.state)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, &self.path).map_err(|e| {
            Error::StateError(format!("Failed to replace {}: {}", self.path.display(), e))
        })?;

        debug!("Quest state saved to {}", self.path.display());
        Ok(())
    }
}
