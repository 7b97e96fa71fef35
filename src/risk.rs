//! Risk indicator.
//!
//! A single scalar summarising account health: collateral demanded by debt (plus the
//! debt itself) over weighted collateral supplied. Zero means no exposure, one means a
//! liquidator may claim the account. The function is pure and rejects negative inputs
//! since those can only come from a corrupted valuation upstream.

use crate::config::MarginConfig;
use crate::types::Usd;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Risk scalar. `Unbounded` stands in for +infinity: debt with no weighted collateral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskIndicator {
    Finite(Decimal),
    Unbounded,
}

impl RiskIndicator {
    pub fn zero() -> Self {
        RiskIndicator::Finite(Decimal::ZERO)
    }

    /// The finite value, `None` when unbounded.
    pub fn value(&self) -> Option<Decimal> {
        match self {
            RiskIndicator::Finite(v) => Some(*v),
            RiskIndicator::Unbounded => None,
        }
    }

    pub fn is_unbounded(&self) -> bool {
        matches!(self, RiskIndicator::Unbounded)
    }

    pub fn to_f64(&self) -> f64 {
        match self {
            RiskIndicator::Finite(v) => v.to_f64().unwrap_or(f64::INFINITY),
            RiskIndicator::Unbounded => f64::INFINITY,
        }
    }

    pub fn at_least(&self, threshold: Decimal) -> bool {
        match self {
            RiskIndicator::Finite(v) => *v >= threshold,
            RiskIndicator::Unbounded => true,
        }
    }
}

impl PartialOrd for RiskIndicator {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RiskIndicator {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (RiskIndicator::Finite(a), RiskIndicator::Finite(b)) => a.cmp(b),
            (RiskIndicator::Finite(_), RiskIndicator::Unbounded) => Ordering::Less,
            (RiskIndicator::Unbounded, RiskIndicator::Finite(_)) => Ordering::Greater,
            (RiskIndicator::Unbounded, RiskIndicator::Unbounded) => Ordering::Equal,
        }
    }
}

impl fmt::Display for RiskIndicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskIndicator::Finite(v) => write!(f, "{}", v.round_dp(4)),
            RiskIndicator::Unbounded => write!(f, "inf"),
        }
    }
}

/// Computes `(required_collateral + liabilities) / weighted_collateral`.
///
/// With no weighted collateral the result is `Unbounded` if anything is owed, else zero.
pub fn risk_indicator(
    required_collateral: Usd,
    weighted_collateral: Usd,
    liabilities: Usd,
) -> Result<RiskIndicator, RiskError> {
    for (field, value) in [
        ("required_collateral", required_collateral),
        ("weighted_collateral", weighted_collateral),
        ("liabilities", liabilities),
    ] {
        if value.is_negative() {
            return Err(RiskError::InvalidArgument { field, value });
        }
    }

    let Some(demand) = required_collateral.value().checked_add(liabilities.value()) else {
        return Ok(RiskIndicator::Unbounded);
    };
    if weighted_collateral.value() > Decimal::ZERO {
        // dust collateral against real debt can overflow the decimal range
        Ok(demand
            .checked_div(weighted_collateral.value())
            .map(RiskIndicator::Finite)
            .unwrap_or(RiskIndicator::Unbounded))
    } else if demand > Decimal::ZERO {
        Ok(RiskIndicator::Unbounded)
    } else {
        Ok(RiskIndicator::zero())
    }
}

/// Coarse bucket for UI colouring and alerting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskLevel {
    Healthy,
    Warning,
    Critical,
    Liquidatable,
}

pub fn classify_risk(risk: RiskIndicator, config: &MarginConfig) -> RiskLevel {
    if risk.at_least(config.risk_liquidation_level) {
        RiskLevel::Liquidatable
    } else if risk.at_least(config.risk_critical_level) {
        RiskLevel::Critical
    } else if risk.at_least(config.risk_warning_level) {
        RiskLevel::Warning
    } else {
        RiskLevel::Healthy
    }
}

pub fn is_liquidatable(risk: RiskIndicator, config: &MarginConfig) -> bool {
    risk.at_least(config.risk_liquidation_level)
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RiskError {
    #[error("Invalid argument: {field} must be non-negative, got {value}")]
    InvalidArgument { field: &'static str, value: Usd },
}
