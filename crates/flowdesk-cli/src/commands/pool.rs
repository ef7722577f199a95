//! Pool status and reconciliation CLI commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use super::Runtime;
use crate::output::{self, OutputFormat};
use flowdesk_core::error::AppError;
use flowdesk_service::pool::ReconcileReport;

/// Arguments for pool commands
#[derive(Debug, Args)]
pub struct PoolArgs {
    /// Pool subcommand
    #[command(subcommand)]
    pub command: PoolCommand,
}

/// Pool subcommands
#[derive(Debug, Subcommand)]
pub enum PoolCommand {
    /// Show capacity figures
    Status,
    /// Recount occupancy from user assignments
    Reconcile {
        /// Report drift without writing corrections
        #[arg(long)]
        dry_run: bool,
    },
}

/// Drift display row for table output
#[derive(Debug, Serialize, Tabled)]
struct DriftRow {
    /// Account code
    code: String,
    /// Stored occupancy
    recorded: u32,
    /// Users holding the code
    actual: u32,
}

/// Execute pool commands
pub async fn execute(
    args: &PoolArgs,
    runtime: &Runtime,
    format: OutputFormat,
) -> Result<(), AppError> {
    let services = &runtime.services;

    match &args.command {
        PoolCommand::Status => {
            let status = services.accounts.pool_status().await?;
            let tokens = services.users.authorized_token_count().await?;
            match format {
                OutputFormat::Json => output::print_json(&status),
                OutputFormat::Table => {
                    output::print_kv("Active accounts", &status.active_accounts.to_string());
                    output::print_kv("Full accounts", &status.full_accounts.to_string());
                    output::print_kv(
                        "Users",
                        &format!("{}/{}", status.total_occupancy, status.total_capacity),
                    );
                    output::print_kv("Free slots", &status.available.to_string());
                    output::print_kv("Usage", &format!("{:.1}%", status.usage_percent));
                    output::print_kv(
                        "Token holders",
                        &format!(
                            "{tokens} (limit {})",
                            services.config.entitlement.authorized_token_limit
                        ),
                    );
                    if status.is_exhausted() {
                        output::print_warning("No free slots. Please add more accounts.");
                    }
                }
            }
        }
        PoolCommand::Reconcile { dry_run } => {
            let report = services.reconciler.reconcile(*dry_run).await?;
            if report.applied && !report.drifts.is_empty() {
                runtime.save().await?;
            }
            print_report(&report, format);
        }
    }

    Ok(())
}

fn print_report(report: &ReconcileReport, format: OutputFormat) {
    if format == OutputFormat::Json {
        output::print_json(report);
        return;
    }

    if report.is_consistent() {
        output::print_success("Occupancy is consistent.");
        return;
    }

    let rows: Vec<DriftRow> = report
        .drifts
        .iter()
        .map(|d| DriftRow {
            code: d.code.to_string(),
            recorded: d.recorded,
            actual: d.actual,
        })
        .collect();
    if !rows.is_empty() {
        output::print_list(&rows, format);
    }
    for orphan in &report.orphaned_users {
        output::print_warning(&format!(
            "User {} holds {} which matches no active account",
            orphan.user_id, orphan.code
        ));
    }
    if report.applied {
        output::print_success(&format!("Corrected {} account(s).", report.drifts.len()));
    } else {
        output::print_warning("Dry run, nothing written.");
    }
}
