// 8.0 engine/core.rs: main engine. evaluates snapshots, holds the event log.

use super::config::EngineConfig;
use super::results::{AccountReport, EngineError};
use crate::events::{Event, EventId, EventPayload};
use crate::liquidation::liquidation_phase;
use crate::market::MarketContext;
use crate::pool::aggregate_pool_positions;
use crate::position::{merge_changes, PositionChange};
use crate::price::{FreshPrices, PriceSource};
use crate::risk::classify_risk;
use crate::snapshot::PositionSnapshot;
use crate::summary::account_summary;
use crate::types::Timestamp;
use crate::valuation::valuate;

/** 8.1: main engine struct. no per-account state lives here */
#[derive(Debug)]
pub struct Engine {
    pub(super) config: EngineConfig,
    pub(super) events: Vec<Event>,
    pub(super) next_event_id: u64,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        config.margin.validate()?;
        Ok(Self {
            config,
            events: Vec::new(),
            next_event_id: 1,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Full report for the snapshot as it stands.
    pub fn evaluate(
        &self,
        snapshot: &PositionSnapshot,
        market: &MarketContext,
        now: Timestamp,
    ) -> Result<AccountReport, EngineError> {
        self.project(snapshot, market, &[], now)
    }

    /// Full report as if `changes` had already landed on chain. The snapshot is untouched.
    pub fn project(
        &self,
        snapshot: &PositionSnapshot,
        market: &MarketContext,
        changes: &[PositionChange],
        now: Timestamp,
    ) -> Result<AccountReport, EngineError> {
        if self.config.enforce_price_staleness {
            let prices = FreshPrices::new(&market.prices, now, self.config.margin.max_price_age_secs);
            self.report(snapshot, market, &prices, changes, now)
        } else {
            self.report(snapshot, market, &market.prices, changes, now)
        }
    }

    fn report<P: PriceSource>(
        &self,
        snapshot: &PositionSnapshot,
        market: &MarketContext,
        prices: &P,
        changes: &[PositionChange],
        now: Timestamp,
    ) -> Result<AccountReport, EngineError> {
        let margin = &self.config.margin;

        let valuation = valuate(snapshot.positions(), prices, changes, margin)?;
        let risk_indicator = valuation.risk_indicator()?;
        let summary = account_summary(&valuation, margin);

        // trade bounds are sized against the projected positions too
        let positions = merge_changes(snapshot.positions(), changes)?;
        let pool_positions = aggregate_pool_positions(&positions, market, prices, &valuation, margin)?;

        let liquidation = snapshot.liquidation();
        let report = AccountReport {
            valuation,
            risk_indicator,
            risk_level: classify_risk(risk_indicator, margin),
            summary,
            pool_positions,
            is_being_liquidated: liquidation.is_some(),
            remaining_liquidation_time: liquidation.map(|l| l.remaining_time(now)),
            liquidation_phase: liquidation_phase(liquidation, risk_indicator, margin),
        };

        tracing::debug!(
            account = %snapshot.account,
            risk = %report.risk_indicator,
            level = ?report.risk_level,
            degraded = report.is_degraded(),
            "account evaluated"
        );

        Ok(report)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn recent_events(&self, count: usize) -> &[Event] {
        let start = self.events.len().saturating_sub(count);
        &self.events[start..]
    }

    pub(super) fn emit_event(&mut self, timestamp: Timestamp, payload: EventPayload) {
        let event = Event::new(EventId(self.next_event_id), timestamp, payload);
        self.next_event_id += 1;

        tracing::info!(id = event.id.0, payload = ?event.payload, "event");

        self.events.push(event);

        if self.events.len() > self.config.max_events {
            let drain_count = self.events.len() - self.config.max_events;
            self.events.drain(0..drain_count);
        }
    }
}
