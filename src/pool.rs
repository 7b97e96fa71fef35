// 9.3 pool.rs: lending pools as seen from one account. each pool issues deposit notes and
// loan notes; the account holds notes, the pool says what they are worth in underlying.
// 9.4 aggregates an account's note positions into a per-token PoolPosition.

use crate::config::MarginConfig;
use crate::limits::{max_trade_amounts, MaxTradeAmounts, NoteWeights, PoolBalances};
use crate::market::MarketContext;
use crate::position::Position;
use crate::price::PriceSource;
use crate::valuation::{position_value, Valuation, ValuationError};
use crate::types::{TokenAmount, TokenId, Usd};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Notes to underlying: `underlying = notes * total_underlying / total_notes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRate {
    pub total_underlying: Decimal,
    pub total_notes: Decimal,
}

impl ExchangeRate {
    pub fn new(total_underlying: Decimal, total_notes: Decimal) -> Self {
        Self {
            total_underlying,
            total_notes,
        }
    }

    pub fn one() -> Self {
        Self::new(Decimal::ONE, Decimal::ONE)
    }

    /// A pool with no notes outstanding converts 1:1.
    pub fn to_underlying(&self, notes: Decimal) -> Option<Decimal> {
        if self.total_notes.is_zero() {
            return Some(notes);
        }
        notes
            .checked_mul(self.total_underlying)?
            .checked_div(self.total_notes)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolMetadata {
    pub token: TokenId,
    pub symbol: String,
    pub decimals: u32,
    pub deposit_note: TokenId,
    pub loan_note: TokenId,
    // tokens sitting in the vault, free to withdraw or borrow
    pub vault_liquidity: TokenAmount,
    pub total_borrowed: TokenAmount,
    pub deposit_rate: ExchangeRate,
    pub loan_rate: ExchangeRate,
    // fallbacks when the account has no note position to read a modifier from
    pub deposit_weight: Decimal,
    pub loan_weight: Decimal,
    // the network's gas asset: wallet sizing keeps a fee buffer back
    pub is_native: bool,
}

impl PoolMetadata {
    pub fn utilization(&self) -> Decimal {
        let total = self.vault_liquidity.value() + self.total_borrowed.value();
        if total.is_zero() {
            return Decimal::ZERO;
        }
        self.total_borrowed.value() / total
    }

    /// `vault * u - borrowed * (1 - u)`, floored at zero.
    ///
    /// Borrowing this much leaves the pool at utilization `u`.
    pub fn effective_vault_for_borrow(&self, max_util: Decimal) -> TokenAmount {
        let headroom = self.vault_liquidity.value() * max_util
            - self.total_borrowed.value() * (Decimal::ONE - max_util);
        TokenAmount::clamped(headroom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolPosition {
    pub token: TokenId,
    pub symbol: String,
    pub deposit_position: Option<Position>,
    pub loan_position: Option<Position>,
    /// Underlying tokens the deposit notes are worth. Zero without a deposit position.
    pub deposit_balance: TokenAmount,
    pub deposit_value: Usd,
    /// Underlying tokens owed. Zero without a loan position.
    pub loan_balance: TokenAmount,
    pub loan_value: Usd,
    pub max_trade_amounts: MaxTradeAmounts,
}

/// Per-pool view of an account.
///
/// Configured tokens whose pool metadata the caller has not loaded are left out and
/// listed in `skipped`. The view is then incomplete rather than wrong.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolPositions {
    pub positions: Vec<PoolPosition>,
    pub skipped: Vec<TokenId>,
}

impl PoolPositions {
    pub fn get(&self, token: &TokenId) -> Option<&PoolPosition> {
        self.positions.iter().find(|p| &p.token == token)
    }

    pub fn by_symbol(&self, symbol: &str) -> Option<&PoolPosition> {
        self.positions.iter().find(|p| p.symbol == symbol)
    }

    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

fn find_position<'a>(positions: &'a [Position], token: &TokenId) -> Option<&'a Position> {
    positions.iter().find(|p| &p.token == token)
}

// notes held -> underlying tokens, truncated to the pool's decimals
fn note_balance(
    position: Option<&Position>,
    rate: &ExchangeRate,
    decimals: u32,
) -> Result<TokenAmount, ValuationError> {
    let Some(position) = position else {
        return Ok(TokenAmount::zero());
    };
    let out_of_range = || ValuationError::BalanceOutOfRange {
        token: position.token,
        balance: position.balance,
        exponent: position.exponent,
    };
    let notes = position.quantity().ok_or_else(out_of_range)?;
    let underlying = rate.to_underlying(notes).ok_or_else(out_of_range)?;
    Ok(TokenAmount::clamped(underlying).round_down(decimals))
}

fn note_value<P: PriceSource>(position: Option<&Position>, prices: &P) -> Result<Usd, ValuationError> {
    match position {
        Some(p) => Ok(position_value(p, prices)?.unwrap_or_default()),
        None => Ok(Usd::zero()),
    }
}

/// Builds one `PoolPosition` per configured token that has loaded pool metadata.
pub fn aggregate_pool_positions<P: PriceSource>(
    positions: &[Position],
    market: &MarketContext,
    prices: &P,
    valuation: &Valuation,
    config: &MarginConfig,
) -> Result<PoolPositions, ValuationError> {
    let mut out = PoolPositions::default();

    for token in &market.tokens {
        let Some(pool) = market.pool(token) else {
            tracing::warn!(%token, "pool metadata not loaded, skipping");
            out.skipped.push(*token);
            continue;
        };

        let deposit_position = find_position(positions, &pool.deposit_note);
        let loan_position = find_position(positions, &pool.loan_note);

        let deposit_balance = note_balance(deposit_position, &pool.deposit_rate, pool.decimals)?;
        let loan_balance = note_balance(loan_position, &pool.loan_rate, pool.decimals)?;

        // the registered position's modifier wins over the pool default
        let weights = NoteWeights {
            deposit: deposit_position.map_or(pool.deposit_weight, |p| p.value_modifier),
            loan: loan_position.map_or(pool.loan_weight, |p| p.value_modifier),
        };
        let balances = PoolBalances {
            deposit: deposit_balance,
            loan: loan_balance,
            wallet: market.wallet_balance(token),
        };

        let max_trade_amounts = max_trade_amounts(
            pool,
            &balances,
            weights,
            valuation,
            prices.usd_price(&pool.token),
            config,
        );

        out.positions.push(PoolPosition {
            token: *token,
            symbol: pool.symbol.clone(),
            deposit_position: deposit_position.cloned(),
            loan_position: loan_position.cloned(),
            deposit_balance,
            deposit_value: note_value(deposit_position, prices)?,
            loan_balance,
            loan_value: note_value(loan_position, prices)?,
            max_trade_amounts,
        });
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::PositionKind;
    use crate::price::OraclePrice;
    use crate::types::{Address, Timestamp};
    use crate::valuation::valuate;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    const USDC: u8 = 1;
    const USDC_DEPOSIT_NOTE: u8 = 2;
    const USDC_LOAN_NOTE: u8 = 3;
    const SOL: u8 = 4;

    fn usdc_pool() -> PoolMetadata {
        PoolMetadata {
            token: TokenId::from_tag(USDC),
            symbol: "USDC".to_string(),
            decimals: 6,
            deposit_note: TokenId::from_tag(USDC_DEPOSIT_NOTE),
            loan_note: TokenId::from_tag(USDC_LOAN_NOTE),
            vault_liquidity: TokenAmount::clamped(dec!(1000)),
            total_borrowed: TokenAmount::clamped(dec!(500)),
            deposit_rate: ExchangeRate::new(dec!(1500), dec!(1200)),
            loan_rate: ExchangeRate::one(),
            deposit_weight: dec!(1),
            loan_weight: dec!(1),
            is_native: false,
        }
    }

    fn prices() -> HashMap<TokenId, OraclePrice> {
        [USDC, USDC_DEPOSIT_NOTE, USDC_LOAN_NOTE]
            .into_iter()
            .map(|t| (TokenId::from_tag(t), OraclePrice::new(dec!(1), 0, Timestamp::from_secs(0))))
            .collect()
    }

    #[test]
    fn exchange_rate_conversion() {
        let rate = ExchangeRate::new(dec!(1500), dec!(1200));
        assert_eq!(rate.to_underlying(dec!(100)), Some(dec!(125)));
        assert_eq!(ExchangeRate::new(dec!(0), dec!(0)).to_underlying(dec!(7)), Some(dec!(7)));
    }

    #[test]
    fn effective_vault_caps_utilization() {
        let pool = usdc_pool();
        // 1000 * 0.95 - 500 * 0.05
        assert_eq!(pool.effective_vault_for_borrow(dec!(0.95)).value(), dec!(925));

        let drained = PoolMetadata {
            vault_liquidity: TokenAmount::clamped(dec!(10)),
            total_borrowed: TokenAmount::clamped(dec!(1000)),
            ..usdc_pool()
        };
        assert_eq!(drained.effective_vault_for_borrow(dec!(0.95)), TokenAmount::zero());
    }

    #[test]
    fn untouched_pool_reports_zero_balances() {
        let market = MarketContext::new(vec![TokenId::from_tag(USDC)]).with_pool(usdc_pool());
        let config = MarginConfig::default();
        let p = prices();
        let valuation = valuate(&[], &p, &[], &config).unwrap();

        let pools = aggregate_pool_positions(&[], &market, &p, &valuation, &config).unwrap();
        let usdc = pools.by_symbol("USDC").unwrap();
        assert_eq!(usdc.deposit_balance, TokenAmount::zero());
        assert_eq!(usdc.loan_balance, TokenAmount::zero());
        assert!(usdc.deposit_position.is_none());
        assert_eq!(usdc.deposit_value, Usd::zero());
    }

    #[test]
    fn notes_convert_through_exchange_rate() {
        let deposit = Position::new(
            TokenId::from_tag(USDC_DEPOSIT_NOTE),
            Address::from_tag(20),
            120_000_000,
            -6,
            PositionKind::Deposit,
            dec!(1),
        )
        .unwrap();
        let market = MarketContext::new(vec![TokenId::from_tag(USDC)]).with_pool(usdc_pool());
        let config = MarginConfig::default();
        let p = prices();
        let positions = vec![deposit];
        let valuation = valuate(&positions, &p, &[], &config).unwrap();

        let pools = aggregate_pool_positions(&positions, &market, &p, &valuation, &config).unwrap();
        let usdc = pools.get(&TokenId::from_tag(USDC)).unwrap();
        // 120 notes * 1500 / 1200
        assert_eq!(usdc.deposit_balance.value(), dec!(150));
        assert_eq!(usdc.deposit_value.value(), dec!(120));
    }

    #[test]
    fn unloaded_pool_is_skipped() {
        let market = MarketContext::new(vec![TokenId::from_tag(USDC), TokenId::from_tag(SOL)]).with_pool(usdc_pool());
        let config = MarginConfig::default();
        let p = prices();
        let valuation = valuate(&[], &p, &[], &config).unwrap();

        let pools = aggregate_pool_positions(&[], &market, &p, &valuation, &config).unwrap();
        assert_eq!(pools.positions.len(), 1);
        assert_eq!(pools.skipped, vec![TokenId::from_tag(SOL)]);
        assert!(!pools.is_complete());
    }
}
