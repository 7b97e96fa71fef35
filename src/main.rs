//! Margin Account Simulation.
//!
//! Walks one account through deposit, borrow sizing, a price shock, liquidation and
//! the liquidation timeout, printing what a client would see at each step.

use margin_core::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing_subscriber::EnvFilter;

const USDC: u8 = 1;
const USDC_DEPOSIT: u8 = 2;
const USDC_LOAN: u8 = 3;
const SOL: u8 = 4;
const SOL_DEPOSIT: u8 = 5;
const SOL_LOAN: u8 = 6;

fn main() -> Result<(), EngineError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("Margin Account Engine Simulation");
    println!("Two Pools, Cross Collateral, Full Lifecycle\n");

    let mut engine = Engine::new(EngineConfig::default())?;

    scenario_1_fresh_deposit(&engine)?;
    scenario_2_borrow_sizing(&engine)?;
    scenario_3_price_shock_and_liquidation(&mut engine)?;
    scenario_4_liquidation_timeout(&mut engine)?;
    scenario_5_degraded_inputs(&engine)?;

    println!("\nAll simulations completed successfully.");
    Ok(())
}

fn pool(tag: u8, deposit_note: u8, loan_note: u8, symbol: &str, decimals: u32, native: bool) -> PoolMetadata {
    PoolMetadata {
        token: TokenId::from_tag(tag),
        symbol: symbol.to_string(),
        decimals,
        deposit_note: TokenId::from_tag(deposit_note),
        loan_note: TokenId::from_tag(loan_note),
        vault_liquidity: TokenAmount::clamped(dec!(1_000_000)),
        total_borrowed: TokenAmount::clamped(dec!(400_000)),
        deposit_rate: ExchangeRate::one(),
        loan_rate: ExchangeRate::one(),
        deposit_weight: dec!(0.9),
        loan_weight: dec!(0.8),
        is_native: native,
    }
}

fn market(sol_price: Decimal) -> MarketContext {
    let at = Timestamp::from_secs(0);
    let mut market = MarketContext::new(vec![TokenId::from_tag(USDC), TokenId::from_tag(SOL)])
        .with_pool(pool(USDC, USDC_DEPOSIT, USDC_LOAN, "USDC", 6, false))
        .with_pool(pool(SOL, SOL_DEPOSIT, SOL_LOAN, "SOL", 9, true))
        .with_wallet_balance(TokenId::from_tag(USDC), TokenAmount::clamped(dec!(2_500)))
        .with_wallet_balance(TokenId::from_tag(SOL), TokenAmount::clamped(dec!(3)));
    for (tag, price) in [
        (USDC, dec!(1)),
        (USDC_DEPOSIT, dec!(1)),
        (USDC_LOAN, dec!(1)),
        (SOL, sol_price),
        (SOL_DEPOSIT, sol_price),
        (SOL_LOAN, sol_price),
    ] {
        market.update_price(TokenId::from_tag(tag), OraclePrice::new(price, 0, at));
    }
    market
}

fn account(usdc_deposit: u128, sol_debt: u128) -> Result<PositionSnapshot, EngineError> {
    let mut positions = vec![Position::new(
        TokenId::from_tag(USDC_DEPOSIT),
        Address::from_tag(10),
        usdc_deposit,
        -6,
        PositionKind::Deposit,
        dec!(0.9),
    )?];
    if sol_debt > 0 {
        positions.push(Position::new(
            TokenId::from_tag(SOL_LOAN),
            Address::from_tag(11),
            sol_debt,
            -9,
            PositionKind::Claim,
            dec!(0.8),
        )?);
    }
    Ok(PositionSnapshot::new(
        Address::from_tag(100),
        Address::from_tag(101),
        positions,
        None,
        Timestamp::from_secs(0),
    )?)
}

fn print_report(label: &str, report: &AccountReport) {
    println!("  {}", label);
    println!(
        "    assets {}, liabilities {}, risk {} ({:?}), leverage {}x",
        report.valuation.assets,
        report.valuation.liabilities,
        report.risk_indicator,
        report.risk_level,
        report.summary.leverage.round_dp(2)
    );
    for pool in &report.pool_positions.positions {
        let max = &pool.max_trade_amounts;
        println!(
            "    {}: deposit {} loan {} | max withdraw {} borrow {} repay {} swap {}",
            pool.symbol, pool.deposit_balance, pool.loan_balance, max.withdraw, max.borrow, max.repay, max.swap
        );
    }
}

/// A fresh USDC deposit with nothing borrowed.
fn scenario_1_fresh_deposit(engine: &Engine) -> Result<(), EngineError> {
    println!("Scenario 1: Fresh Deposit\n");

    let snapshot = account(10_000_000_000, 0)?;
    let report = engine.evaluate(&snapshot, &market(dec!(20)), Timestamp::from_secs(1))?;
    print_report("10,000 USDC deposited", &report);
    println!();
    Ok(())
}

/// Sizing a SOL borrow, then projecting it before submitting.
fn scenario_2_borrow_sizing(engine: &Engine) -> Result<(), EngineError> {
    println!("Scenario 2: Borrow Sizing\n");

    let snapshot = account(10_000_000_000, 0)?;
    let market = market(dec!(20));
    let now = Timestamp::from_secs(1);
    let report = engine.evaluate(&snapshot, &market, now)?;

    let sol = report
        .pool_positions
        .by_symbol("SOL")
        .map(|p| p.max_trade_amounts.borrow)
        .unwrap_or_default();
    println!("  Max SOL borrow: {}", sol);

    let half = (sol.value() / dec!(2)).round_dp(9);
    let delta = (half * dec!(1_000_000_000)).trunc().mantissa();
    let borrow = PositionChange::new(TokenId::from_tag(SOL_LOAN), PositionKind::Claim, -9, dec!(0.8), delta)?;
    let projected = engine.project(&snapshot, &market, &[borrow], now)?;
    print_report(&format!("after borrowing {} SOL (projected)", half), &projected);
    println!();
    Ok(())
}

/// SOL rallies, the account turns liquidatable, a liquidator claims it.
fn scenario_3_price_shock_and_liquidation(engine: &mut Engine) -> Result<(), EngineError> {
    println!("Scenario 3: Price Shock and Liquidation\n");

    let snapshot = account(10_000_000_000, 150_000_000_000)?;
    let liquidator = Address::from_tag(200);

    for price in [dec!(20), dec!(24), dec!(28), dec!(32)] {
        let market = market(price);
        let report = engine.evaluate(&snapshot, &market, Timestamp::from_secs(10))?;
        println!("  SOL @ ${}: risk {} ({:?})", price, report.risk_indicator, report.liquidation_phase);

        if report.liquidation_phase == LiquidationPhase::LiquidationEligible {
            let claimed = engine.begin_liquidation(&snapshot, &market, liquidator, Timestamp::from_secs(10))?;
            println!("  Liquidator {} claimed the account", liquidator);

            let end = engine.end_liquidation(&claimed, &market, liquidator, Timestamp::from_secs(30))?;
            println!("  Liquidation ended: {:?}", end.event.reason);
            break;
        }
    }
    println!("  Events recorded: {}\n", engine.events().len());
    Ok(())
}

/// An abandoned liquidation: the owner may cancel once the timeout passes.
fn scenario_4_liquidation_timeout(engine: &mut Engine) -> Result<(), EngineError> {
    println!("Scenario 4: Liquidation Timeout\n");

    let market = market(dec!(32));
    let snapshot = account(10_000_000_000, 150_000_000_000)?;
    let claimed = engine.begin_liquidation(&snapshot, &market, Address::from_tag(200), Timestamp::from_secs(100))?;

    for t in [120, 160, 170] {
        let now = Timestamp::from_secs(t);
        let report = engine.evaluate(&claimed, &market, now)?;
        let remaining = report.remaining_liquidation_time.map(|d| d.num_seconds()).unwrap_or_default();
        match engine.end_liquidation(&claimed, &market, claimed.owner, now) {
            Ok(end) => {
                println!("  t={}s remaining {}s: owner ended liquidation ({:?})", t, remaining, end.event.reason);
                break;
            }
            Err(e) => println!("  t={}s remaining {}s: owner refused: {}", t, remaining, e),
        }
    }
    println!();
    Ok(())
}

/// Missing prices and unloaded pools degrade the view without failing it.
fn scenario_5_degraded_inputs(engine: &Engine) -> Result<(), EngineError> {
    println!("Scenario 5: Degraded Inputs\n");

    let mut market = market(dec!(20));
    market.prices.remove(&TokenId::from_tag(SOL_LOAN));
    market.pools.remove(&TokenId::from_tag(SOL));

    let snapshot = account(10_000_000_000, 50_000_000_000)?;
    let report = engine.evaluate(&snapshot, &market, Timestamp::from_secs(1))?;
    println!(
        "  unpriced positions: {}, skipped pools: {}, degraded: {}",
        report.valuation.unpriced_positions,
        report.pool_positions.skipped.len(),
        report.is_degraded()
    );
    print_report("view with SOL missing", &report);
    Ok(())
}
