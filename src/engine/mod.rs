// 8.0: account engine. turns a decoded snapshot plus market context into a full report:
// valuation, risk, pool positions, trade bounds, liquidation status.
// pure recompute per call; the only state kept is the liquidation event log.

mod config;
mod core;
mod liquidations;
mod results;

pub use config::EngineConfig;
pub use core::Engine;
pub use results::{AccountReport, EngineError, LiquidationEnd};
