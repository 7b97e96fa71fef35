//! Property-based tests for the valuation and trade-bound math.
//!
//! These tests verify invariants hold under random inputs.

use margin_core::*;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;

// Strategies for generating test data
fn price_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|x| Decimal::new(x, 2)) // $0.01 to $10,000
}

fn balance_strategy() -> impl Strategy<Value = u128> {
    0u128..1_000_000_000u128
}

// modifiers whose inverse is exact, so sums do not depend on rounding order
fn weight_strategy() -> impl Strategy<Value = Decimal> {
    prop_oneof![Just(dec!(1)), Just(dec!(0.8)), Just(dec!(0.5)), Just(dec!(0.25))]
}

fn usd_strategy() -> impl Strategy<Value = Usd> {
    (0i64..10_000_000i64).prop_map(|x| Usd::new(Decimal::new(x, 2)))
}

fn kind_strategy() -> impl Strategy<Value = PositionKind> {
    prop_oneof![Just(PositionKind::Deposit), Just(PositionKind::Claim), Just(PositionKind::NoValue)]
}

fn position_set() -> impl Strategy<Value = Vec<(u128, PositionKind, Decimal, Decimal)>> {
    proptest::collection::vec((balance_strategy(), kind_strategy(), weight_strategy(), price_strategy()), 1..12)
}

fn build(entries: &[(u128, PositionKind, Decimal, Decimal)]) -> (Vec<Position>, HashMap<TokenId, OraclePrice>) {
    let mut positions = Vec::new();
    let mut prices = HashMap::new();
    for (i, (balance, kind, weight, price)) in entries.iter().enumerate() {
        let tag = i as u8 + 1;
        let token = TokenId::from_tag(tag);
        positions.push(Position::new(token, Address::from_tag(tag), *balance, -3, *kind, *weight).unwrap());
        prices.insert(token, OraclePrice::new(*price, 0, Timestamp::from_secs(0)));
    }
    (positions, prices)
}

fn pool(liquidity: Decimal, borrowed: Decimal, native: bool) -> PoolMetadata {
    PoolMetadata {
        token: TokenId::from_tag(1),
        symbol: "TKN".to_string(),
        decimals: 6,
        deposit_note: TokenId::from_tag(2),
        loan_note: TokenId::from_tag(3),
        vault_liquidity: TokenAmount::clamped(liquidity),
        total_borrowed: TokenAmount::clamped(borrowed),
        deposit_rate: ExchangeRate::one(),
        loan_rate: ExchangeRate::one(),
        deposit_weight: dec!(0.9),
        loan_weight: dec!(0.8),
        is_native: native,
    }
}

proptest! {
    /// Risk never decreases when liabilities grow, collateral held fixed
    #[test]
    fn risk_monotonic_in_liabilities(
        required in usd_strategy(),
        weighted in usd_strategy(),
        liabilities in usd_strategy(),
        extra in usd_strategy(),
    ) {
        let before = risk_indicator(required, weighted, liabilities).unwrap();
        let after = risk_indicator(required, weighted, liabilities.add(extra)).unwrap();
        prop_assert!(after >= before, "risk fell from {} to {}", before, after);
    }

    /// Risk is never negative and is unbounded exactly when debt meets no collateral
    #[test]
    fn risk_non_negative(
        required in usd_strategy(),
        weighted in usd_strategy(),
        liabilities in usd_strategy(),
    ) {
        let risk = risk_indicator(required, weighted, liabilities).unwrap();
        prop_assert!(risk >= RiskIndicator::zero());
        if weighted.is_zero() {
            let owes = !required.add(liabilities).is_zero();
            prop_assert_eq!(risk.is_unbounded(), owes);
        }
    }

    /// Withdraw never exceeds the deposit nor the pool's liquidity
    #[test]
    fn withdraw_bounded(
        deposit in 0i64..10_000_000i64,
        liquidity in 0i64..10_000_000i64,
        available in -1_000_000i64..1_000_000i64,
        price in price_strategy(),
    ) {
        let pool = pool(Decimal::new(liquidity, 2), dec!(0), false);
        let balances = PoolBalances {
            deposit: TokenAmount::clamped(Decimal::new(deposit, 2)),
            ..PoolBalances::default()
        };
        let valuation = Valuation {
            available_setup_collateral: Usd::new(Decimal::new(available, 2)),
            ..Valuation::default()
        };
        let weights = NoteWeights { deposit: dec!(0.9), loan: dec!(0.8) };
        let max = max_trade_amounts(&pool, &balances, weights, &valuation, Some(price), &MarginConfig::default());

        prop_assert!(max.withdraw <= balances.deposit);
        prop_assert!(max.withdraw <= pool.vault_liquidity);
        prop_assert_eq!(max.transfer, max.withdraw);
        if available <= 0 {
            prop_assert!(max.withdraw.is_zero());
        }
    }

    /// Borrow never pushes the pool past the utilization cap
    #[test]
    fn borrow_within_effective_vault(
        liquidity in 0i64..10_000_000i64,
        borrowed in 0i64..10_000_000i64,
        available in -1_000_000i64..100_000_000i64,
        price in price_strategy(),
        loan_weight in weight_strategy(),
    ) {
        let config = MarginConfig::default();
        let pool = pool(Decimal::new(liquidity, 2), Decimal::new(borrowed, 2), false);
        let valuation = Valuation {
            available_setup_collateral: Usd::new(Decimal::new(available, 2)),
            ..Valuation::default()
        };
        let weights = NoteWeights { deposit: dec!(0.9), loan: loan_weight };
        let max = max_trade_amounts(&pool, &PoolBalances::default(), weights, &valuation, Some(price), &config);

        prop_assert!(max.borrow <= pool.effective_vault_for_borrow(config.max_pool_util_ratio_after_borrow));
        prop_assert!(max.swap <= pool.vault_liquidity);
    }

    /// Repay bounds never exceed what is owed
    #[test]
    fn repay_bounded_by_loan(
        loan in 0i64..1_000_000i64,
        deposit in 0i64..1_000_000i64,
        wallet in 0i64..1_000_000i64,
        native in any::<bool>(),
    ) {
        let balances = PoolBalances {
            deposit: TokenAmount::clamped(Decimal::new(deposit, 2)),
            loan: TokenAmount::clamped(Decimal::new(loan, 2)),
            wallet: TokenAmount::clamped(Decimal::new(wallet, 2)),
        };
        let weights = NoteWeights { deposit: dec!(0.9), loan: dec!(0.8) };
        let max = max_trade_amounts(&pool(dec!(1000), dec!(0), native), &balances, weights, &Valuation::default(), None, &MarginConfig::default());

        prop_assert!(max.repay <= balances.loan);
        prop_assert!(max.repay <= balances.wallet);
        prop_assert!(max.repay_from_deposit <= balances.loan);
        prop_assert!(max.repay_from_deposit <= balances.deposit);
        prop_assert!(max.deposit <= balances.wallet);
    }

    /// Valuing the same input twice gives identical results
    #[test]
    fn valuation_idempotent(entries in position_set()) {
        let (positions, prices) = build(&entries);
        let config = MarginConfig::default();
        let first = valuate(&positions, &prices, &[], &config).unwrap();
        let second = valuate(&positions, &prices, &[], &config).unwrap();
        prop_assert_eq!(first, second);
    }

    /// Input order of positions does not change the valuation
    #[test]
    fn valuation_order_independent(entries in position_set()) {
        let (positions, prices) = build(&entries);
        let mut reversed = positions.clone();
        reversed.reverse();
        let config = MarginConfig::default();

        prop_assert_eq!(
            valuate(&positions, &prices, &[], &config).unwrap(),
            valuate(&reversed, &prices, &[], &config).unwrap()
        );
    }

    /// Weighted collateral never exceeds assets and required collateral never undercuts liabilities
    #[test]
    fn valuation_weights_bounded(entries in position_set()) {
        let (positions, prices) = build(&entries);
        let v = valuate(&positions, &prices, &[], &MarginConfig::default()).unwrap();
        prop_assert!(v.weighted_collateral <= v.assets);
        prop_assert!(v.required_collateral >= v.liabilities);
        prop_assert!(v.required_setup_collateral >= v.required_collateral);
        prop_assert_eq!(v.effective_collateral, v.weighted_collateral.sub(v.liabilities));
        prop_assert_eq!(v.available_collateral, v.effective_collateral.sub(v.required_collateral));
    }

    /// Underwater accounts report the leverage sentinel
    #[test]
    fn leverage_sentinel_when_underwater(
        assets in 0i64..1_000_000i64,
        shortfall in 0i64..1_000_000i64,
    ) {
        let config = MarginConfig::default();
        let valuation = Valuation {
            assets: Usd::new(Decimal::new(assets, 2)),
            liabilities: Usd::new(Decimal::new(assets + shortfall + 1, 2)),
            ..Valuation::default()
        };
        let summary = account_summary(&valuation, &config);
        prop_assert_eq!(summary.leverage, config.leverage_sentinel);
        prop_assert!(summary.account_balance.is_negative());
    }

    /// Positive equity gives leverage of at least 1x
    #[test]
    fn leverage_at_least_one(
        liabilities in 0i64..1_000_000i64,
        equity in 1i64..1_000_000i64,
    ) {
        let valuation = Valuation {
            assets: Usd::new(Decimal::new(liabilities + equity, 2)),
            liabilities: Usd::new(Decimal::new(liabilities, 2)),
            ..Valuation::default()
        };
        let summary = account_summary(&valuation, &MarginConfig::default());
        prop_assert!(summary.leverage >= Decimal::ONE);
    }

    /// A balance never goes below zero however large the withdrawal
    #[test]
    fn merged_balance_saturates(balance in balance_strategy(), delta in -2_000_000_000i128..0i128) {
        let token = TokenId::from_tag(1);
        let position = Position::new(token, Address::from_tag(1), balance, 0, PositionKind::Deposit, dec!(1)).unwrap();
        let change = PositionChange::new(token, PositionKind::Deposit, 0, dec!(1), delta).unwrap();
        let merged = merge_changes(&[position], &[change]).unwrap();

        let expected = (balance as i128 + delta).max(0) as u128;
        prop_assert_eq!(merged[0].balance, expected);
    }
}
