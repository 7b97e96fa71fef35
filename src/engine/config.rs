//! Engine configuration options.

use crate::config::MarginConfig;

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Margin constants used by every computation.
    pub margin: MarginConfig,
    /// Maximum number of events to retain in memory.
    pub max_events: usize,
    /// Treat prices older than `margin.max_price_age_secs` as missing.
    pub enforce_price_staleness: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            margin: MarginConfig::default(),
            max_events: 10_000,
            enforce_price_staleness: false,
        }
    }
}

impl EngineConfig {
    pub fn with_margin(margin: MarginConfig) -> Self {
        Self {
            margin,
            ..Self::default()
        }
    }
}
