//! Flow account management CLI commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use super::{Runtime, confirm};
use crate::output::{self, OutputFormat};
use flowdesk_core::error::AppError;
use flowdesk_core::types::id::FlowAccountId;
use flowdesk_entity::flow_account::{AccountCode, AccountStatus, FlowAccount};
use flowdesk_service::flow_account::AccountUpdate;

/// Arguments for account commands
#[derive(Debug, Args)]
pub struct AccountArgs {
    /// Account subcommand
    #[command(subcommand)]
    pub command: AccountCommand,
}

/// Account subcommands
#[derive(Debug, Subcommand)]
pub enum AccountCommand {
    /// List all accounts, newest first
    List {
        /// Only show accounts with a free slot
        #[arg(long)]
        available: bool,
    },
    /// Add an account to the pool
    Add {
        /// Login email of the external account
        email: String,
        /// Account code (defaults to the next free code)
        #[arg(long)]
        code: Option<AccountCode>,
        /// Login secret (prompted if omitted)
        #[arg(long)]
        secret: Option<String>,
    },
    /// Edit an account's credential or status
    Update {
        /// Account code or ID
        account: String,
        /// New login email
        #[arg(long)]
        email: Option<String>,
        /// New login secret
        #[arg(long)]
        secret: Option<String>,
        /// New status (active, inactive)
        #[arg(long)]
        status: Option<AccountStatus>,
    },
    /// Deactivate an account with no users
    Remove {
        /// Account code or ID
        account: String,
        /// Skip confirmation
        #[arg(long)]
        force: bool,
    },
    /// Show the code the next account would get
    NextCode,
    /// Show the credential behind a code
    Credential {
        /// Account code
        code: String,
    },
}

/// Account display row for table output
#[derive(Debug, Serialize, Tabled)]
struct AccountRow {
    /// Account ID
    id: String,
    /// Code
    code: String,
    /// Email
    email: String,
    /// Occupancy
    users: String,
    /// Status
    status: String,
    /// Created at
    created_at: String,
}

impl From<&FlowAccount> for AccountRow {
    fn from(a: &FlowAccount) -> Self {
        Self {
            id: a.id.to_string(),
            code: a.code.to_string(),
            email: a.credential.email.clone(),
            users: format!("{}/{}", a.occupancy, a.capacity()),
            status: a.status.to_string(),
            created_at: output::format_time(Some(a.created_at)),
        }
    }
}

/// Execute account commands
pub async fn execute(
    args: &AccountArgs,
    runtime: &Runtime,
    format: OutputFormat,
) -> Result<(), AppError> {
    let accounts = &runtime.services.accounts;

    match &args.command {
        AccountCommand::List { available } => {
            let list = if *available {
                accounts.available_accounts().await?
            } else {
                accounts.list_accounts().await?
            };
            let rows: Vec<AccountRow> = list.iter().map(AccountRow::from).collect();
            output::print_list(&rows, format);
        }
        AccountCommand::Add {
            email,
            code,
            secret,
        } => {
            let secret = match secret {
                Some(s) => s.clone(),
                None => dialoguer::Password::new()
                    .with_prompt("Account secret")
                    .interact()
                    .map_err(|e| AppError::internal(format!("Input error: {e}")))?,
            };

            let account = accounts.add_account(email, &secret, code.clone()).await?;
            runtime.save().await?;

            match format {
                OutputFormat::Json => output::print_json(&AccountRow::from(&account)),
                OutputFormat::Table => output::print_success(&format!(
                    "Flow account {} added ({})",
                    account.code, account.credential.email
                )),
            }
        }
        AccountCommand::Update {
            account,
            email,
            secret,
            status,
        } => {
            let target = resolve(runtime, account).await?;
            let updated = accounts
                .update_account(
                    target.id,
                    AccountUpdate {
                        email: email.clone(),
                        secret: secret.clone(),
                        status: *status,
                    },
                )
                .await?;
            runtime.save().await?;
            output::print_success(&format!("Flow account {} updated", updated.code));
        }
        AccountCommand::Remove { account, force } => {
            let target = resolve(runtime, account).await?;
            let prompt = format!(
                "Remove flow account {} ({})?",
                target.code, target.credential.email
            );
            if !confirm(&prompt, *force)? {
                println!("Cancelled.");
                return Ok(());
            }

            accounts.remove_account(target.id).await?;
            runtime.save().await?;
            output::print_success(&format!("Flow account {} removed", target.code));
        }
        AccountCommand::NextCode => {
            let code = accounts.next_code().await?;
            match format {
                OutputFormat::Json => output::print_json(&code),
                OutputFormat::Table => println!("{code}"),
            }
        }
        AccountCommand::Credential { code } => {
            let credential = accounts.credential_for_code(code).await?;
            match format {
                OutputFormat::Json => output::print_json(&credential),
                OutputFormat::Table => {
                    output::print_kv("Email", &credential.email);
                    output::print_kv("Secret", &credential.secret);
                }
            }
        }
    }

    Ok(())
}

/// Look an account up by ID, falling back to its active code.
async fn resolve(runtime: &Runtime, key: &str) -> Result<FlowAccount, AppError> {
    let accounts = &runtime.services.accounts;
    match key.parse::<FlowAccountId>() {
        Ok(id) => accounts.get_account(id).await,
        Err(_) => accounts.find_active_by_code(&AccountCode::from(key.trim())).await,
    }
}
