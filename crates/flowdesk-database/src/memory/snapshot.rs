//! JSON snapshot of the in-memory store.

use std::path::Path;

use serde::{Deserialize, Serialize};

use flowdesk_core::result::AppResult;
use flowdesk_core::traits::Record;

/// Full contents of both tables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    /// Rows of the `users` table.
    #[serde(default)]
    pub users: Vec<Record>,
    /// Rows of the `flow_accounts` table.
    #[serde(default)]
    pub flow_accounts: Vec<Record>,
}

impl Snapshot {
    /// Read a snapshot file. Returns `Ok(None)` if the file does not exist.
    pub async fn read(path: &Path) -> AppResult<Option<Self>> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Write the snapshot as pretty-printed JSON, creating parent directories.
    pub async fn write(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_vec_pretty(self)?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }
}
