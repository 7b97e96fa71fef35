//! Account valuation.
//!
//! Sums every position into the dollar figures margin accounting runs on. Deposits
//! count fully toward assets and, weighted by their value modifier, toward collateral.
//! Claims count fully toward liabilities and demand `value / modifier` of collateral,
//! or `value / (modifier * setup_leverage_fraction)` when sizing new trades.
//!
//! A position whose token has no usable price values at zero and is counted in
//! `unpriced_positions` instead of failing the pass.

use crate::config::MarginConfig;
use crate::position::{merge_changes, Position, PositionChange, PositionError, PositionKind};
use crate::price::PriceSource;
use crate::risk::{risk_indicator, RiskError, RiskIndicator};
use crate::types::{Address, TokenId, Usd};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Valuation {
    pub assets: Usd,
    pub liabilities: Usd,
    pub required_collateral: Usd,
    pub required_setup_collateral: Usd,
    pub weighted_collateral: Usd,
    /// `weighted_collateral - liabilities`
    pub effective_collateral: Usd,
    /// `weighted_collateral - liabilities - required_collateral`. Negative is a shortfall.
    pub available_collateral: Usd,
    /// Same as `available_collateral` against `required_setup_collateral`.
    pub available_setup_collateral: Usd,
    /// Valued positions that had no usable price and counted as zero.
    pub unpriced_positions: u32,
}

impl Valuation {
    pub fn risk_indicator(&self) -> Result<RiskIndicator, RiskError> {
        risk_indicator(self.required_collateral, self.weighted_collateral, self.liabilities)
    }

    pub fn equity(&self) -> Usd {
        self.assets.sub(self.liabilities)
    }

    pub fn is_degraded(&self) -> bool {
        self.unpriced_positions > 0
    }
}

// per position contribution, kept separate so the sum can run in a fixed order
#[derive(Debug, Clone, Copy, Default)]
struct Contribution {
    assets: Decimal,
    liabilities: Decimal,
    weighted: Decimal,
    required: Decimal,
    required_setup: Decimal,
}

/// Dollar value of a position at the given price source. `Ok(None)` means no usable price.
pub fn position_value<P: PriceSource>(position: &Position, prices: &P) -> Result<Option<Usd>, ValuationError> {
    let quantity = position.quantity().ok_or(ValuationError::BalanceOutOfRange {
        token: position.token,
        balance: position.balance,
        exponent: position.exponent,
    })?;
    let Some(price) = prices.usd_price(&position.token) else {
        return Ok(None);
    };
    quantity
        .checked_mul(price)
        .map(|v| Some(Usd::new(v)))
        .ok_or(ValuationError::ValueOverflow(position.token))
}

fn contribution(value: Decimal, position: &Position, config: &MarginConfig) -> Result<Contribution, ValuationError> {
    let overflow = || ValuationError::ValueOverflow(position.token);
    match position.kind {
        PositionKind::Deposit => Ok(Contribution {
            assets: value,
            weighted: value.checked_mul(position.value_modifier).ok_or_else(overflow)?,
            ..Contribution::default()
        }),
        PositionKind::Claim => {
            if position.value_modifier.is_zero() {
                return Err(PositionError::ZeroClaimWeight(position.token).into());
            }
            let setup_weight = position
                .value_modifier
                .checked_mul(config.setup_leverage_fraction)
                .filter(|w| !w.is_zero())
                .ok_or_else(overflow)?;
            Ok(Contribution {
                liabilities: value,
                required: value.checked_div(position.value_modifier).ok_or_else(overflow)?,
                required_setup: value.checked_div(setup_weight).ok_or_else(overflow)?,
                ..Contribution::default()
            })
        }
        PositionKind::NoValue => Ok(Contribution::default()),
    }
}

impl Contribution {
    fn checked_add(&self, other: &Contribution) -> Option<Contribution> {
        Some(Contribution {
            assets: self.assets.checked_add(other.assets)?,
            liabilities: self.liabilities.checked_add(other.liabilities)?,
            weighted: self.weighted.checked_add(other.weighted)?,
            required: self.required.checked_add(other.required)?,
            required_setup: self.required_setup.checked_add(other.required_setup)?,
        })
    }
}

/// Values `positions` with `changes` merged in.
///
/// Deterministic for the same multiset of positions: contributions are summed in
/// (address, token) order regardless of the order they were supplied in.
pub fn valuate<P: PriceSource>(
    positions: &[Position],
    prices: &P,
    changes: &[PositionChange],
    config: &MarginConfig,
) -> Result<Valuation, ValuationError> {
    let merged = merge_changes(positions, changes)?;

    let mut unpriced_positions = 0u32;
    let mut parts: Vec<((Address, TokenId), Contribution)> = Vec::with_capacity(merged.len());

    for position in &merged {
        if position.kind == PositionKind::NoValue {
            continue;
        }
        match position_value(position, prices)? {
            Some(value) => parts.push(((position.address, position.token), contribution(value.value(), position, config)?)),
            // an empty position is worth zero at any price
            None if position.is_empty() => {}
            None => {
                tracing::warn!(token = %position.token, "no price for position, valuing at zero");
                unpriced_positions += 1;
            }
        }
    }

    parts.sort_by(|a, b| a.0.cmp(&b.0));

    let mut total = Contribution::default();
    for ((_, token), c) in &parts {
        total = total.checked_add(c).ok_or(ValuationError::ValueOverflow(*token))?;
    }

    let overflow = || ValuationError::TotalOverflow;
    let effective = total.weighted.checked_sub(total.liabilities).ok_or_else(overflow)?;
    let available = effective.checked_sub(total.required).ok_or_else(overflow)?;
    let available_setup = effective.checked_sub(total.required_setup).ok_or_else(overflow)?;
    let valuation = Valuation {
        assets: Usd::new(total.assets),
        liabilities: Usd::new(total.liabilities),
        required_collateral: Usd::new(total.required),
        required_setup_collateral: Usd::new(total.required_setup),
        weighted_collateral: Usd::new(total.weighted),
        effective_collateral: Usd::new(effective),
        available_collateral: Usd::new(available),
        available_setup_collateral: Usd::new(available_setup),
        unpriced_positions,
    };

    tracing::debug!(
        positions = merged.len(),
        changes = changes.len(),
        assets = %valuation.assets,
        liabilities = %valuation.liabilities,
        unpriced = unpriced_positions,
        "valuation pass"
    );

    Ok(valuation)
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValuationError {
    #[error("Balance {balance} with exponent {exponent} for token {token} does not fit a decimal")]
    BalanceOutOfRange { token: TokenId, balance: u128, exponent: i8 },

    #[error("Dollar value of token {0} overflows")]
    ValueOverflow(TokenId),

    #[error("Account collateral figures overflow")]
    TotalOverflow,

    #[error("Position error: {0}")]
    Position(#[from] PositionError),
}
