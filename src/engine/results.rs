// 8.0.2: result types and errors for engine operations.

use crate::config::ConfigError;
use crate::events::LiquidationEndedEvent;
use crate::liquidation::{LiquidationError, LiquidationPhase};
use crate::pool::PoolPositions;
use crate::position::PositionError;
use crate::risk::{RiskError, RiskIndicator, RiskLevel};
use crate::snapshot::PositionSnapshot;
use crate::summary::AccountSummary;
use crate::valuation::{Valuation, ValuationError};
use serde::{Deserialize, Serialize};

/// Everything a client or liquidation monitor needs about one account at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountReport {
    pub valuation: Valuation,
    pub risk_indicator: RiskIndicator,
    pub risk_level: RiskLevel,
    pub summary: AccountSummary,
    pub pool_positions: PoolPositions,
    pub is_being_liquidated: bool,
    /// Signed; negative once the liquidation has timed out. `None` outside liquidation.
    /// Serialized as whole seconds.
    #[serde(with = "signed_secs")]
    pub remaining_liquidation_time: Option<chrono::Duration>,
    pub liquidation_phase: LiquidationPhase,
}

mod signed_secs {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<chrono::Duration>, serializer: S) -> Result<S::Ok, S::Error> {
        value.map(|d| d.num_seconds()).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<chrono::Duration>, D::Error> {
        Ok(Option::<i64>::deserialize(deserializer)?.map(chrono::Duration::seconds))
    }
}

impl AccountReport {
    /// True when some position had no price or some pool was not loaded.
    pub fn is_degraded(&self) -> bool {
        self.valuation.is_degraded() || !self.pool_positions.is_complete()
    }
}

#[derive(Debug, Clone)]
pub struct LiquidationEnd {
    pub snapshot: PositionSnapshot,
    pub event: LiquidationEndedEvent,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum EngineError {
    #[error("Risk error: {0}")]
    Risk(#[from] RiskError),

    #[error("Valuation error: {0}")]
    Valuation(#[from] ValuationError),

    #[error("Position error: {0}")]
    Position(#[from] PositionError),

    #[error("Liquidation error: {0}")]
    Liquidation(#[from] LiquidationError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}
