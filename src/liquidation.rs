//! Liquidation state machine.
//!
//! An account whose risk indicator reaches the liquidation level becomes eligible.
//! A liquidator claims it, which records who and when. The liquidation ends when the
//! liquidator says so, or when the owner asks and either the account has recovered or
//! the liquidator has held it past the timeout. After the timeout anyone may end it.
//!
//! Nothing here is enforced on chain. These functions report what the execution layer
//! must check; the state is returned as new values, never patched in place.

use crate::config::MarginConfig;
use crate::risk::{is_liquidatable, RiskIndicator};
use crate::types::{Address, Timestamp};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LiquidationPhase {
    Healthy,
    LiquidationEligible,
    InLiquidation,
}

/// Persisted while an account is under liquidation; absent otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidationState {
    pub liquidator: Address,
    pub start_time: Timestamp,
    pub timeout_secs: i64,
}

impl LiquidationState {
    pub fn new(liquidator: Address, start_time: Timestamp, timeout_secs: i64) -> Self {
        Self {
            liquidator,
            start_time,
            timeout_secs,
        }
    }

    /// `timeout - (now - start)`. Negative once the liquidation has timed out.
    pub fn remaining_time(&self, now: Timestamp) -> chrono::Duration {
        chrono::Duration::seconds(self.timeout_secs) - now.since(self.start_time)
    }

    pub fn is_timed_out(&self, now: Timestamp) -> bool {
        self.remaining_time(now) < chrono::Duration::zero()
    }
}

pub fn liquidation_phase(
    state: Option<&LiquidationState>,
    risk: RiskIndicator,
    config: &MarginConfig,
) -> LiquidationPhase {
    match state {
        Some(_) => LiquidationPhase::InLiquidation,
        None if is_liquidatable(risk, config) => LiquidationPhase::LiquidationEligible,
        None => LiquidationPhase::Healthy,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeginOutcome {
    Started(LiquidationState),
    // the same liquidator claimed again, nothing changes
    AlreadyClaimed(LiquidationState),
}

impl BeginOutcome {
    pub fn state(&self) -> LiquidationState {
        match self {
            BeginOutcome::Started(s) | BeginOutcome::AlreadyClaimed(s) => *s,
        }
    }
}

/// A liquidator claims the account.
pub fn begin_liquidation(
    current: Option<&LiquidationState>,
    liquidator: Address,
    risk: RiskIndicator,
    now: Timestamp,
    config: &MarginConfig,
) -> Result<BeginOutcome, LiquidationError> {
    if liquidator.is_default() {
        return Err(LiquidationError::Unauthorized(liquidator));
    }
    if let Some(state) = current {
        if state.liquidator == liquidator {
            return Ok(BeginOutcome::AlreadyClaimed(*state));
        }
        return Err(LiquidationError::AlreadyLiquidating(state.liquidator));
    }
    if !is_liquidatable(risk, config) {
        return Err(LiquidationError::NotLiquidatable(risk));
    }

    let state = LiquidationState::new(liquidator, now, config.liquidation_timeout_secs);
    tracing::debug!(%liquidator, start = now.as_secs(), "liquidation claimed");
    Ok(BeginOutcome::Started(state))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndReason {
    /// The liquidator released the account.
    ByLiquidator,
    /// The owner ended it after risk dropped below the liquidation level.
    Recovered,
    /// The liquidator held the account past the timeout.
    TimedOut,
}

/// Decides whether `requester` may end the liquidation now.
pub fn authorize_end(
    state: Option<&LiquidationState>,
    requester: Address,
    owner: Address,
    risk: RiskIndicator,
    now: Timestamp,
    config: &MarginConfig,
) -> Result<EndReason, LiquidationError> {
    let state = state.ok_or(LiquidationError::NotBeingLiquidated)?;

    if requester == state.liquidator {
        return Ok(EndReason::ByLiquidator);
    }
    if state.is_timed_out(now) {
        return Ok(EndReason::TimedOut);
    }
    if requester == owner && !is_liquidatable(risk, config) {
        return Ok(EndReason::Recovered);
    }
    Err(LiquidationError::Unauthorized(requester))
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LiquidationError {
    #[error("Account is not liquidatable at risk {0}")]
    NotLiquidatable(RiskIndicator),

    #[error("Account is already being liquidated by {0}")]
    AlreadyLiquidating(Address),

    #[error("Account is not being liquidated")]
    NotBeingLiquidated,

    #[error("{0} does not have permission to do this")]
    Unauthorized(Address),
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const NOW: i64 = 1_700_000_000;

    fn owner() -> Address {
        Address::from_tag(1)
    }

    fn liquidator() -> Address {
        Address::from_tag(2)
    }

    fn stranger() -> Address {
        Address::from_tag(3)
    }

    fn unhealthy() -> RiskIndicator {
        RiskIndicator::Finite(dec!(1.2))
    }

    fn healthy() -> RiskIndicator {
        RiskIndicator::Finite(dec!(0.5))
    }

    fn claimed_at(start: i64) -> LiquidationState {
        LiquidationState::new(liquidator(), Timestamp::from_secs(start), 60)
    }

    #[test]
    fn phases() {
        let config = MarginConfig::default();
        assert_eq!(liquidation_phase(None, healthy(), &config), LiquidationPhase::Healthy);
        assert_eq!(liquidation_phase(None, unhealthy(), &config), LiquidationPhase::LiquidationEligible);
        assert_eq!(liquidation_phase(Some(&claimed_at(NOW)), healthy(), &config), LiquidationPhase::InLiquidation);
    }

    #[test]
    fn begin_requires_eligibility() {
        let config = MarginConfig::default();
        let err = begin_liquidation(None, liquidator(), healthy(), Timestamp::from_secs(NOW), &config);
        assert_eq!(err, Err(LiquidationError::NotLiquidatable(healthy())));

        let ok = begin_liquidation(None, liquidator(), RiskIndicator::Unbounded, Timestamp::from_secs(NOW), &config).unwrap();
        assert_eq!(ok, BeginOutcome::Started(claimed_at(NOW)));
    }

    #[test]
    fn second_liquidator_rejected() {
        let config = MarginConfig::default();
        let state = claimed_at(NOW);
        let err = begin_liquidation(Some(&state), stranger(), unhealthy(), Timestamp::from_secs(NOW + 1), &config);
        assert_eq!(err, Err(LiquidationError::AlreadyLiquidating(liquidator())));
    }

    #[test]
    fn same_liquidator_reclaim_is_noop() {
        let config = MarginConfig::default();
        let state = claimed_at(NOW);
        let again = begin_liquidation(Some(&state), liquidator(), unhealthy(), Timestamp::from_secs(NOW + 5), &config).unwrap();
        assert_eq!(again, BeginOutcome::AlreadyClaimed(state));
        assert_eq!(again.state().start_time, Timestamp::from_secs(NOW));
    }

    #[test]
    fn remaining_time_counts_down() {
        let state = claimed_at(NOW);
        assert_eq!(state.remaining_time(Timestamp::from_secs(NOW + 20)).num_seconds(), 40);
        assert!(!state.is_timed_out(Timestamp::from_secs(NOW + 60)));
        assert_eq!(state.remaining_time(Timestamp::from_secs(NOW + 70)).num_seconds(), -10);
        assert!(state.is_timed_out(Timestamp::from_secs(NOW + 70)));
    }

    #[test]
    fn liquidator_may_always_end() {
        let config = MarginConfig::default();
        let state = claimed_at(NOW);
        let reason = authorize_end(Some(&state), liquidator(), owner(), unhealthy(), Timestamp::from_secs(NOW + 1), &config);
        assert_eq!(reason, Ok(EndReason::ByLiquidator));
    }

    #[test]
    fn owner_needs_recovery_or_timeout() {
        let config = MarginConfig::default();
        let state = claimed_at(NOW);
        let early = Timestamp::from_secs(NOW + 10);

        assert_eq!(
            authorize_end(Some(&state), owner(), owner(), unhealthy(), early, &config),
            Err(LiquidationError::Unauthorized(owner()))
        );
        assert_eq!(authorize_end(Some(&state), owner(), owner(), healthy(), early, &config), Ok(EndReason::Recovered));

        let late = Timestamp::from_secs(NOW + 61);
        assert_eq!(authorize_end(Some(&state), owner(), owner(), unhealthy(), late, &config), Ok(EndReason::TimedOut));
    }

    #[test]
    fn stranger_only_after_timeout() {
        let config = MarginConfig::default();
        let state = claimed_at(NOW);
        assert_eq!(
            authorize_end(Some(&state), stranger(), owner(), healthy(), Timestamp::from_secs(NOW + 10), &config),
            Err(LiquidationError::Unauthorized(stranger()))
        );
        assert_eq!(
            authorize_end(Some(&state), stranger(), owner(), unhealthy(), Timestamp::from_secs(NOW + 100), &config),
            Ok(EndReason::TimedOut)
        );
    }

    #[test]
    fn end_without_liquidation() {
        let config = MarginConfig::default();
        assert_eq!(
            authorize_end(None, owner(), owner(), healthy(), Timestamp::from_secs(NOW), &config),
            Err(LiquidationError::NotBeingLiquidated)
        );
    }
}
