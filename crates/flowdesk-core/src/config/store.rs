//! Record store configuration.

use serde::{Deserialize, Serialize};

/// Settings for the backing record store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path of the JSON snapshot the CLI loads and saves.
    #[serde(default = "default_data_file")]
    pub data_file: String,
    /// Whether a personal token may be held by only one user.
    #[serde(default = "default_true")]
    pub unique_personal_token: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_file: default_data_file(),
            unique_personal_token: true,
        }
    }
}

fn default_data_file() -> String {
    "data/flowdesk.json".to_string()
}

fn default_true() -> bool {
    true
}
