//! User management and assignment CLI commands.

use chrono::Utc;
use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use super::{Runtime, confirm};
use crate::output::{self, OutputFormat};
use flowdesk_core::error::AppError;
use flowdesk_core::types::id::UserId;
use flowdesk_entity::flow_account::AccountCode;
use flowdesk_entity::user::{NewUser, SubscriptionDuration, User, UserStatus};
use flowdesk_service::pool::Assignment;
use flowdesk_service::user::Change;
use flowdesk_service::{StatusRequest, TokenRequest};

/// Arguments for user commands
#[derive(Debug, Args)]
pub struct UserArgs {
    /// User subcommand
    #[command(subcommand)]
    pub command: UserCommand,
}

/// User subcommands
#[derive(Debug, Subcommand)]
pub enum UserCommand {
    /// List all users, newest first
    List {
        /// Filter by status
        #[arg(short, long)]
        status: Option<UserStatus>,
        /// Only subscriptions past their expiry
        #[arg(long)]
        expired: bool,
    },
    /// Create a user
    Add {
        /// Username
        username: String,
        /// Contact email
        #[arg(long)]
        email: Option<String>,
        /// Initial status
        #[arg(long, default_value = "trial")]
        status: UserStatus,
    },
    /// Assign a user to a flow account
    Assign {
        /// Username or ID
        user: String,
        /// Account code (defaults to the least-loaded account)
        #[arg(long)]
        code: Option<AccountCode>,
    },
    /// Release a user's flow account
    Release {
        /// Username or ID
        user: String,
        /// Skip confirmation
        #[arg(long)]
        force: bool,
    },
    /// Delete a user, releasing any held flow account
    Remove {
        /// Username or ID
        user: String,
        /// Skip confirmation
        #[arg(long)]
        force: bool,
    },
    /// Move a user to another flow account
    Reassign {
        /// Username or ID
        user: String,
        /// Account code (defaults to the least-loaded account)
        #[arg(long)]
        code: Option<AccountCode>,
    },
    /// Save status and token changes for a user
    Save {
        /// Username or ID
        user: String,
        /// New status (defaults to the current one)
        #[arg(long)]
        status: Option<UserStatus>,
        /// Months, or "lifetime" (defaults to the configured months)
        #[arg(long)]
        duration: Option<SubscriptionDuration>,
        /// New personal token (defaults to the current one)
        #[arg(long, conflicts_with = "clear_token")]
        token: Option<String>,
        /// Remove the personal token
        #[arg(long)]
        clear_token: bool,
    },
}

/// User display row for table output
#[derive(Debug, Serialize, Tabled)]
struct UserRow {
    /// User ID
    id: String,
    /// Username
    username: String,
    /// Email
    email: String,
    /// Status
    status: String,
    /// Subscription expiry
    expires: String,
    /// Flow account code
    code: String,
    /// Token held
    token: String,
}

impl From<&User> for UserRow {
    fn from(u: &User) -> Self {
        Self {
            id: u.id.to_string(),
            username: u.username.clone(),
            email: u.email.clone().unwrap_or_default(),
            status: u.status.to_string(),
            expires: output::format_time(u.subscription_expiry),
            code: u
                .pool_code
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_else(|| "-".to_string()),
            token: if u.has_token() { "yes" } else { "no" }.to_string(),
        }
    }
}

/// Execute user commands
pub async fn execute(
    args: &UserArgs,
    runtime: &Runtime,
    format: OutputFormat,
) -> Result<(), AppError> {
    let services = &runtime.services;

    match &args.command {
        UserCommand::List { status, expired } => {
            let users = if *expired {
                services.users.expired_subscriptions(Utc::now()).await?
            } else {
                services.users.list_users().await?
            };
            let rows: Vec<UserRow> = users
                .iter()
                .filter(|u| status.is_none_or(|s| u.status == s))
                .map(UserRow::from)
                .collect();
            output::print_list(&rows, format);
        }
        UserCommand::Add {
            username,
            email,
            status,
        } => {
            let user = services
                .users
                .add_user(NewUser {
                    username: username.clone(),
                    email: email.clone(),
                    status: *status,
                })
                .await?;
            runtime.save().await?;
            match format {
                OutputFormat::Json => output::print_json(&UserRow::from(&user)),
                OutputFormat::Table => {
                    output::print_success(&format!("User '{}' created ({})", user.username, user.id))
                }
            }
        }
        UserCommand::Assign { user, code } => {
            let user = resolve(runtime, user).await?;
            let result = services.allocator.assign(user.id, code.as_ref()).await;
            runtime.save().await?;
            print_assignment(&user, &result?, format);
        }
        UserCommand::Release { user, force } => {
            let user = resolve(runtime, user).await?;
            let held = user
                .pool_code
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_else(|| "nothing".to_string());
            let prompt = format!("Release '{}' from {held}?", user.username);
            if !confirm(&prompt, *force)? {
                println!("Cancelled.");
                return Ok(());
            }
            let code = services.allocator.release(user.id).await?;
            runtime.save().await?;
            output::print_success(&format!("User '{}' released from {code}", user.username));
        }
        UserCommand::Remove { user, force } => {
            let user = resolve(runtime, user).await?;
            let prompt = format!("Remove user '{}'?", user.username);
            if !confirm(&prompt, *force)? {
                println!("Cancelled.");
                return Ok(());
            }
            // A failed removal may still have released the account.
            let result = services.users.remove_user(user.id).await;
            runtime.save().await?;
            let removed = result?;
            output::print_success(&format!("User '{}' removed", removed.username));
        }
        UserCommand::Reassign { user, code } => {
            let user = resolve(runtime, user).await?;
            // A failed reassign may still have released the old account.
            let result = services.allocator.reassign(user.id, code.as_ref()).await;
            runtime.save().await?;
            print_assignment(&user, &result?, format);
        }
        UserCommand::Save {
            user,
            status,
            duration,
            token,
            clear_token,
        } => {
            let user = resolve(runtime, user).await?;
            let status = StatusRequest {
                status: status.unwrap_or(user.status),
                duration: duration.unwrap_or(SubscriptionDuration::Months(
                    services.config.subscription.default_months,
                )),
            };
            let token = match (token, clear_token) {
                (_, true) => TokenRequest::default(),
                (Some(t), false) => TokenRequest::new(t.clone()),
                (None, false) => TokenRequest::new(user.personal_token.clone().unwrap_or_default()),
            };

            let outcome = services.coordinator.save_changes(&user, &status, &token).await;
            runtime.save().await?;

            if !outcome.success {
                if outcome.status == Change::Applied {
                    output::print_success(&format!("Status of '{}' updated", user.username));
                }
                if outcome.token == Change::Applied {
                    output::print_success(&format!("Token of '{}' updated", user.username));
                }
            }
            outcome.into_result()?;
            output::print_success(&format!("Changes saved for '{}'", user.username));
        }
    }

    Ok(())
}

fn print_assignment(user: &User, assignment: &Assignment, format: OutputFormat) {
    match format {
        OutputFormat::Json => output::print_json(assignment),
        OutputFormat::Table => {
            output::print_success(&format!(
                "User '{}' assigned to {}",
                user.username, assignment.code
            ));
            output::print_kv("Email", &assignment.credential.email);
            output::print_kv("Secret", &assignment.credential.secret);
        }
    }
}

/// Look a user up by ID, falling back to the username.
async fn resolve(runtime: &Runtime, key: &str) -> Result<User, AppError> {
    let users = &runtime.services.users;
    if let Ok(id) = key.parse::<UserId>() {
        return users.get_user(id).await;
    }
    users
        .list_users()
        .await?
        .into_iter()
        .find(|u| u.username == key.trim())
        .ok_or_else(|| AppError::not_found(format!("User '{key}' not found")))
}
