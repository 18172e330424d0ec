//! Engine tuning knobs.

use serde::{Deserialize, Serialize};

/// Timing and threshold settings of one engine activation.
///
/// Every field has a default, so partial configuration files are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Quiet period before a free-text query is applied.
    pub search_debounce_ms: u64,
    /// Quiet period before a typed range bound is applied.
    pub range_debounce_ms: u64,
    /// Lifetime of persisted lookup results.
    pub cache_ttl_ms: u64,
    /// Interval between readiness checks.
    pub detect_interval_ms: u64,
    /// Readiness checks before giving up.
    pub detect_max_attempts: u32,
    /// Distinct values a dimension needs to be offered.
    pub min_distinct_values: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            search_debounce_ms: 200,
            range_debounce_ms: 400,
            cache_ttl_ms: 3_600_000,
            detect_interval_ms: 200,
            detect_max_attempts: 100,
            min_distinct_values: 2,
        }
    }
}
