// 10.1: user facing digest of a valuation. what the account header shows.

use crate::config::MarginConfig;
use crate::types::Usd;
use crate::valuation::Valuation;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSummary {
    pub deposited_value: Usd,
    pub borrowed_value: Usd,
    /// Equity: deposits minus borrows. Negative when underwater.
    pub account_balance: Usd,
    pub available_collateral: Usd,
    pub leverage: Decimal,
}

/// `leverage = assets / equity` while equity is positive.
///
/// Non-positive equity with something deposited reports `config.leverage_sentinel`
/// instead of infinity. An empty account is unlevered (1x).
pub fn account_summary(valuation: &Valuation, config: &MarginConfig) -> AccountSummary {
    let assets = valuation.assets;
    let liabilities = valuation.liabilities;
    let equity = valuation.equity();

    let leverage = if equity.value() > Decimal::ZERO {
        assets
            .value()
            .checked_div(equity.value())
            .unwrap_or(config.leverage_sentinel)
    } else if assets.is_zero() && liabilities.is_zero() {
        Decimal::ONE
    } else {
        config.leverage_sentinel
    };

    AccountSummary {
        deposited_value: assets,
        borrowed_value: liabilities,
        account_balance: equity,
        available_collateral: valuation.available_collateral,
        leverage,
    }
}
