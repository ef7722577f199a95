//! Flow account pool configuration.

use serde::{Deserialize, Serialize};

/// How occupancy counters are kept in step with user assignments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OccupancyPolicy {
    /// Read-check-write. Concurrent assigns may transiently overshoot capacity.
    #[default]
    BestEffort,
    /// Compare-and-swap reservation of a slot before the user pointer is written.
    Strict,
}

/// Pool allocation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Occupancy bookkeeping policy.
    #[serde(default)]
    pub occupancy_policy: OccupancyPolicy,
    /// Upper bound on compare-and-swap attempts under the strict policy.
    #[serde(default = "default_max_cas_attempts")]
    pub max_cas_attempts: u32,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            occupancy_policy: OccupancyPolicy::default(),
            max_cas_attempts: default_max_cas_attempts(),
        }
    }
}

fn default_max_cas_attempts() -> u32 {
    8
}
