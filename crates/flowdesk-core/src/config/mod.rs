//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section. Every field carries a serde default so that a missing file
//! still produces a usable configuration.

pub mod entitlement;
pub mod logging;
pub mod pool;
pub mod store;

use serde::{Deserialize, Serialize};

pub use self::entitlement::{EntitlementConfig, SubscriptionConfig};
pub use self::logging::LoggingConfig;
pub use self::pool::{OccupancyPolicy, PoolConfig};
pub use self::store::StoreConfig;

use crate::error::AppError;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Record store settings.
    #[serde(default)]
    pub store: StoreConfig,
    /// Flow account pool settings.
    #[serde(default)]
    pub pool: PoolConfig,
    /// Entitlement ceiling settings.
    #[serde(default)]
    pub entitlement: EntitlementConfig,
    /// Subscription defaults.
    #[serde(default)]
    pub subscription: SubscriptionConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    ///
    /// The file is optional. An environment overlay named by `FLOWDESK_ENV`
    /// (looked up next to the base file) and environment variables prefixed
    /// with `FLOWDESK__` are merged on top.
    pub fn load(path: &str) -> Result<Self, AppError> {
        let mut builder =
            config::Config::builder().add_source(config::File::with_name(path).required(false));

        if let Ok(env) = std::env::var("FLOWDESK_ENV") {
            let overlay = std::path::Path::new(path)
                .with_file_name(&env)
                .to_string_lossy()
                .into_owned();
            builder = builder.add_source(config::File::with_name(&overlay).required(false));
        }

        let config = builder
            .add_source(
                config::Environment::with_prefix("FLOWDESK")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }
}
