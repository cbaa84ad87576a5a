use std::path::{Path, PathBuf};

use crate::error::StoreError;
use crate::models::VisitEvent;

/// File-backed visit log. The whole log is rewritten on every write.
#[derive(Clone, Debug)]
pub struct LogStore {
    path: PathBuf,
}

impl LogStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing or unreadable logs start the service with an empty history.
    pub async fn load(&self) -> Vec<VisitEvent> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::info!(path = %self.path.display(), error = %e, "no visit log loaded");
                return Vec::new();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(events) => events,
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "visit log unparseable, starting empty"
                );
                Vec::new()
            }
        }
    }

    /// Writes a sibling temp file and renames it over the log, so a crash
    /// mid-write leaves the previous log intact.
    pub async fn write(&self, events: &[VisitEvent]) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(events)?;
        let tmp = self.tmp_path();
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
