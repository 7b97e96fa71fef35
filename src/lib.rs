// margin-core: valuation and risk-limit engine for a leveraged lending account.
// risk-first: every number a client needs before submitting a trade, and every
// predicate a liquidation monitor needs, computed from one decoded snapshot.
// all computation is deterministic with no external I/O.
//
// file map (search X.0 for structs, X.1+ for logic):
//   1.x  types.rs: primitives: TokenId, Address, Usd, TokenAmount, Timestamp
//   3.x  risk.rs: risk indicator, thresholds, risk levels
//   4.x  position.rs: positions, fixed point balances, hypothetical changes
//   5.x  valuation.rs: position sums into a Valuation
//   6.x  liquidation.rs: liquidation state machine, timeout
//   6.1  limits.rs: max trade amounts per pool action
//   7.x  config.rs: margin constants, env presets, validation
//   8.x  engine/: evaluate, project, liquidation bookkeeping
//   9.x  price.rs: oracle price seam, staleness filter
//   9.3  pool.rs: pool metadata, note exchange rates, pool positions
//   10.x snapshot.rs: decoded account snapshot
//   10.1 summary.rs: leverage and equity digest
//   11.x events.rs: liquidation events for audit
//   12.x market.rs: pools, prices and wallet balances for a refresh

// core valuation modules
pub mod position;
pub mod risk;
pub mod summary;
pub mod types;
pub mod valuation;

// limits and liquidation
pub mod limits;
pub mod liquidation;
pub mod pool;

// integration modules
pub mod config;
pub mod engine;
pub mod events;
pub mod market;
pub mod price;
pub mod snapshot;

// re exports for convenience
pub use engine::*;
pub use events::*;
pub use limits::*;
pub use liquidation::*;
pub use market::*;
pub use pool::*;
pub use position::*;
pub use risk::*;
pub use snapshot::*;
pub use summary::*;
pub use types::*;
pub use valuation::*;
pub use config::{
    ConfigError, Environment, MarginConfig, LEVERAGE_SENTINEL, LIQUIDATION_TIMEOUT_SECS,
    MAX_POOL_UTIL_RATIO_AFTER_BORROW, MAX_USER_POSITIONS, NATIVE_FEE_BUFFER, RISK_CRITICAL_LEVEL,
    RISK_LIQUIDATION_LEVEL, RISK_WARNING_LEVEL, SETUP_LEVERAGE_FRACTION,
};
pub use price::{FreshPrices, OraclePrice, PriceSource};
