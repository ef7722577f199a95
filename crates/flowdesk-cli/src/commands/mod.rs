//! CLI command definitions and dispatch.

pub mod account;
pub mod pool;
pub mod user;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::output::OutputFormat;
use flowdesk_core::config::AppConfig;
use flowdesk_core::error::AppError;
use flowdesk_database::MemoryRecordStore;
use flowdesk_service::AppServices;

/// FlowDesk: admin console for the shared flow account pool
#[derive(Debug, Parser)]
#[command(name = "flowdesk", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Flow account management
    Account(account::AccountArgs),
    /// User management and assignment
    User(user::UserArgs),
    /// Pool status and reconciliation
    Pool(pool::PoolArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self, config: AppConfig) -> Result<(), AppError> {
        let runtime = Runtime::open(config).await?;
        match &self.command {
            Commands::Account(args) => account::execute(args, &runtime, self.format).await,
            Commands::User(args) => user::execute(args, &runtime, self.format).await,
            Commands::Pool(args) => pool::execute(args, &runtime, self.format).await,
        }
    }
}

/// Services over a store loaded from the configured data file.
///
/// Mutating commands call [`Runtime::save`] once they are done.
pub struct Runtime {
    /// Wired services
    pub services: AppServices,
    store: Arc<MemoryRecordStore>,
    data_file: PathBuf,
}

impl Runtime {
    /// Load the data file and build the services
    pub async fn open(config: AppConfig) -> Result<Self, AppError> {
        let data_file = PathBuf::from(&config.store.data_file);
        let store = Arc::new(MemoryRecordStore::with_unique_indexes(
            AppServices::unique_indexes(&config),
        ));
        store.load_file(&data_file).await?;

        Ok(Self {
            services: AppServices::new(config, store.clone()),
            store,
            data_file,
        })
    }

    /// Write the store back to the data file
    pub async fn save(&self) -> Result<(), AppError> {
        self.store.save_file(&self.data_file).await
    }
}

/// Helper: ask for confirmation unless `force` is set
pub fn confirm(prompt: &str, force: bool) -> Result<bool, AppError> {
    if force {
        return Ok(true);
    }
    dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .map_err(|e| AppError::internal(format!("Input error: {e}")))
}
