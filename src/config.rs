// 7.0 config.rs: every numeric constant of the margin engine in one place.
// risk thresholds, setup leverage, pool utilization cap, liquidation timeout, presets.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Risk indicator at which clients should warn the user.
pub const RISK_WARNING_LEVEL: Decimal = dec!(0.8);
/// Risk indicator at which the account is one price move away from liquidation.
pub const RISK_CRITICAL_LEVEL: Decimal = dec!(0.9);
/// Risk indicator at which a liquidator may claim the account.
pub const RISK_LIQUIDATION_LEVEL: Decimal = dec!(1);
/// Fraction of the real leverage allowance used when sizing new trades.
pub const SETUP_LEVERAGE_FRACTION: Decimal = dec!(0.5);
/// Pool utilization a single borrow may push the pool to.
pub const MAX_POOL_UTIL_RATIO_AFTER_BORROW: Decimal = dec!(0.95);
/// Seconds a liquidator holds an account before the owner may cancel.
pub const LIQUIDATION_TIMEOUT_SECS: i64 = 60;
/// Reported leverage when equity is not positive.
pub const LEVERAGE_SENTINEL: Decimal = dec!(999.9);
/// Native gas token kept back from deposit/repay sizing.
pub const NATIVE_FEE_BUFFER: Decimal = dec!(0.075);
/// Registered positions an account may hold.
pub const MAX_USER_POSITIONS: usize = 24;

// 7.1: the tunable set. engines take this by reference instead of reading the consts directly
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarginConfig {
    pub risk_warning_level: Decimal,
    pub risk_critical_level: Decimal,
    pub risk_liquidation_level: Decimal,
    pub setup_leverage_fraction: Decimal,
    pub max_pool_util_ratio_after_borrow: Decimal,
    pub liquidation_timeout_secs: i64,
    pub leverage_sentinel: Decimal,
    // in native token units, subtracted from the wallet balance of the gas asset
    pub native_fee_buffer: Decimal,
    // only consulted when the engine is told to enforce staleness
    pub max_price_age_secs: i64,
}

impl Default for MarginConfig {
    fn default() -> Self {
        Self {
            risk_warning_level: RISK_WARNING_LEVEL,
            risk_critical_level: RISK_CRITICAL_LEVEL,
            risk_liquidation_level: RISK_LIQUIDATION_LEVEL,
            setup_leverage_fraction: SETUP_LEVERAGE_FRACTION,
            max_pool_util_ratio_after_borrow: MAX_POOL_UTIL_RATIO_AFTER_BORROW,
            liquidation_timeout_secs: LIQUIDATION_TIMEOUT_SECS,
            leverage_sentinel: LEVERAGE_SENTINEL,
            native_fee_buffer: NATIVE_FEE_BUFFER,
            max_price_age_secs: 30,
        }
    }
}

impl MarginConfig {
    // tighter trade sizing, for front ends that refresh slowly
    pub fn conservative() -> Self {
        Self {
            setup_leverage_fraction: dec!(0.4),
            max_pool_util_ratio_after_borrow: dec!(0.9),
            max_price_age_secs: 15,
            ..Self::default()
        }
    }

    // testnet liquidators are slow, give them longer before the owner can cancel
    pub fn testnet() -> Self {
        Self {
            liquidation_timeout_secs: 600,
            max_price_age_secs: 120,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(Decimal::ZERO < self.risk_warning_level
            && self.risk_warning_level < self.risk_critical_level
            && self.risk_critical_level < self.risk_liquidation_level)
        {
            return Err(ConfigError::InvalidThresholds {
                warning: self.risk_warning_level,
                critical: self.risk_critical_level,
                liquidation: self.risk_liquidation_level,
            });
        }

        if self.setup_leverage_fraction <= Decimal::ZERO || self.setup_leverage_fraction > Decimal::ONE {
            return Err(ConfigError::InvalidSetupLeverage(self.setup_leverage_fraction));
        }

        if self.max_pool_util_ratio_after_borrow <= Decimal::ZERO
            || self.max_pool_util_ratio_after_borrow > Decimal::ONE
        {
            return Err(ConfigError::InvalidUtilization(self.max_pool_util_ratio_after_borrow));
        }

        if self.liquidation_timeout_secs <= 0 {
            return Err(ConfigError::InvalidTimeout(self.liquidation_timeout_secs));
        }

        if self.native_fee_buffer < Decimal::ZERO {
            return Err(ConfigError::InvalidFeeBuffer(self.native_fee_buffer));
        }

        if self.leverage_sentinel <= Decimal::ZERO {
            return Err(ConfigError::InvalidSentinel(self.leverage_sentinel));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Risk thresholds must be positive and strictly increasing: warning {warning}, critical {critical}, liquidation {liquidation}")]
    InvalidThresholds {
        warning: Decimal,
        critical: Decimal,
        liquidation: Decimal,
    },

    #[error("Setup leverage fraction {0} must be in (0, 1]")]
    InvalidSetupLeverage(Decimal),

    #[error("Max pool utilization after borrow {0} must be in (0, 1]")]
    InvalidUtilization(Decimal),

    #[error("Liquidation timeout {0}s must be positive")]
    InvalidTimeout(i64),

    #[error("Native fee buffer {0} must not be negative")]
    InvalidFeeBuffer(Decimal),

    #[error("Leverage sentinel {0} must be positive")]
    InvalidSentinel(Decimal),
}

// Environment presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    Development,
    Testnet,
    Mainnet,
}

impl Environment {
    pub fn config(&self) -> MarginConfig {
        match self {
            Environment::Development => MarginConfig::default(),
            Environment::Testnet => MarginConfig::testnet(),
            Environment::Mainnet => MarginConfig::conservative(),
        }
    }
}
