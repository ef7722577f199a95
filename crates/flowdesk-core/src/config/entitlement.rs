//! Entitlement ceiling and subscription configuration.

use serde::{Deserialize, Serialize};

/// Global ceiling on token-authorized users.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntitlementConfig {
    /// A tokenless paid-tier upgrade is denied once this many users hold a token.
    #[serde(default = "default_authorized_token_limit")]
    pub authorized_token_limit: usize,
}

impl Default for EntitlementConfig {
    fn default() -> Self {
        Self {
            authorized_token_limit: default_authorized_token_limit(),
        }
    }
}

/// Subscription defaults used by the admin surfaces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionConfig {
    /// Duration in months preselected for new subscriptions.
    #[serde(default = "default_months")]
    pub default_months: u32,
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        Self {
            default_months: default_months(),
        }
    }
}

fn default_authorized_token_limit() -> usize {
    4
}

fn default_months() -> u32 {
    6
}
