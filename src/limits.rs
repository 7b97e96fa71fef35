//! Maximum trade sizes per pool action.
//!
//! Bounds are estimates for the client to offer before it builds a transaction. They
//! factor in wallet balances, pool liquidity, the account's setup collateral and the
//! setup leverage fraction, so a maximal trade still leaves headroom against price
//! movement until the next refresh. Every bound is clamped to zero or more.

use crate::config::MarginConfig;
use crate::pool::PoolMetadata;
use crate::types::TokenAmount;
use crate::valuation::Valuation;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TradeAction {
    Deposit,
    Withdraw,
    Borrow,
    Repay,
    RepayFromDeposit,
    Swap,
    Transfer,
}

impl TradeAction {
    pub const ALL: [TradeAction; 7] = [
        TradeAction::Deposit,
        TradeAction::Withdraw,
        TradeAction::Borrow,
        TradeAction::Repay,
        TradeAction::RepayFromDeposit,
        TradeAction::Swap,
        TradeAction::Transfer,
    ];
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaxTradeAmounts {
    pub deposit: TokenAmount,
    pub withdraw: TokenAmount,
    pub borrow: TokenAmount,
    pub repay: TokenAmount,
    pub repay_from_deposit: TokenAmount,
    pub swap: TokenAmount,
    pub transfer: TokenAmount,
}

impl MaxTradeAmounts {
    pub fn get(&self, action: TradeAction) -> TokenAmount {
        match action {
            TradeAction::Deposit => self.deposit,
            TradeAction::Withdraw => self.withdraw,
            TradeAction::Borrow => self.borrow,
            TradeAction::Repay => self.repay,
            TradeAction::RepayFromDeposit => self.repay_from_deposit,
            TradeAction::Swap => self.swap,
            TradeAction::Transfer => self.transfer,
        }
    }

    pub fn allows(&self, action: TradeAction, amount: TokenAmount) -> bool {
        amount <= self.get(action)
    }
}

/// Account balances for one pool, in underlying tokens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolBalances {
    pub deposit: TokenAmount,
    pub loan: TokenAmount,
    pub wallet: TokenAmount,
}

/// Value modifiers of the pool's deposit and loan notes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteWeights {
    pub deposit: Decimal,
    pub loan: Decimal,
}

// setup collateral / divisor, in tokens. None = no collateral limit applies.
fn collateral_bound(available: Decimal, divisor: Decimal) -> Option<TokenAmount> {
    if available <= Decimal::ZERO {
        return Some(TokenAmount::zero());
    }
    if divisor <= Decimal::ZERO {
        return None;
    }
    available.checked_div(divisor).map(TokenAmount::clamped)
}

fn min_bound(amount: TokenAmount, bound: Option<TokenAmount>) -> TokenAmount {
    bound.map_or(amount, |b| amount.min(b))
}

/// Computes the seven per-action bounds for one pool.
///
/// `price` is the underlying token's dollar price; `None` when the oracle has nothing
/// usable. Without a price a withdrawal is not collateral-limited while setup collateral
/// remains (the deposit is valued at zero anyway) while a borrow is refused outright.
pub fn max_trade_amounts(
    pool: &PoolMetadata,
    balances: &PoolBalances,
    weights: NoteWeights,
    valuation: &Valuation,
    price: Option<Decimal>,
    config: &MarginConfig,
) -> MaxTradeAmounts {
    let wallet = if pool.is_native {
        balances
            .wallet
            .saturating_sub(TokenAmount::clamped(config.native_fee_buffer))
    } else {
        balances.wallet
    };
    let liquidity = pool.vault_liquidity;
    let available = valuation.available_setup_collateral.value();
    let price = price.filter(|p| *p > Decimal::ZERO);

    let deposit = wallet;

    let withdraw_limit = match price {
        // a divisor past the decimal range leaves nothing withdrawable
        Some(p) => weights
            .deposit
            .checked_mul(p)
            .map_or(Some(TokenAmount::zero()), |divisor| collateral_bound(available, divisor)),
        None if available <= Decimal::ZERO => Some(TokenAmount::zero()),
        None => None,
    };
    let withdraw = min_bound(balances.deposit.min(liquidity), withdraw_limit).round_down(pool.decimals);

    let vault_limit = pool.effective_vault_for_borrow(config.max_pool_util_ratio_after_borrow);
    let loan_setup = weights.loan * config.setup_leverage_fraction;
    let borrow = match price {
        Some(p) if loan_setup > Decimal::ZERO => {
            let divisor = Decimal::ONE
                .checked_div(loan_setup)
                .and_then(|inverse| (Decimal::ONE - weights.deposit).checked_add(inverse))
                .and_then(|denominator| denominator.checked_mul(p));
            // overflow means each borrowed token demands more collateral than can be expressed
            let limit = match divisor {
                Some(d) => collateral_bound(available, d).unwrap_or(vault_limit),
                None => TokenAmount::zero(),
            };
            vault_limit.min(limit).round_down(pool.decimals)
        }
        _ => TokenAmount::zero(),
    };

    let repay = balances.loan.min(wallet);
    let repay_from_deposit = balances.loan.min(balances.deposit);
    let swap = balances.deposit.add(borrow).min(liquidity);
    let transfer = withdraw;

    MaxTradeAmounts {
        deposit,
        withdraw,
        borrow,
        repay,
        repay_from_deposit,
        swap,
        transfer,
    }
}
