//! Liquidation begin/end bookkeeping.

use super::core::Engine;
use super::results::{EngineError, LiquidationEnd};
use crate::events::{EventPayload, LiquidationBegunEvent, LiquidationEndedEvent};
use crate::liquidation::{authorize_end, begin_liquidation, BeginOutcome};
use crate::market::MarketContext;
use crate::snapshot::PositionSnapshot;
use crate::types::{Address, Timestamp};

impl Engine {
    /// A liquidator claims the account. Returns the snapshot with the liquidation recorded.
    ///
    /// Re-claiming by the current liquidator returns the snapshot as is, without an event.
    pub fn begin_liquidation(
        &mut self,
        snapshot: &PositionSnapshot,
        market: &MarketContext,
        liquidator: Address,
        now: Timestamp,
    ) -> Result<PositionSnapshot, EngineError> {
        let report = self.evaluate(snapshot, market, now)?;
        let outcome = begin_liquidation(
            snapshot.liquidation(),
            liquidator,
            report.risk_indicator,
            now,
            &self.config.margin,
        )?;

        match outcome {
            BeginOutcome::AlreadyClaimed(_) => Ok(snapshot.clone()),
            BeginOutcome::Started(state) => {
                self.emit_event(
                    now,
                    EventPayload::LiquidationBegun(LiquidationBegunEvent {
                        account: snapshot.account,
                        liquidator,
                        start_time: state.start_time,
                        risk_indicator: report.risk_indicator,
                        valuation: report.valuation,
                    }),
                );
                Ok(snapshot.with_liquidation(Some(state)))
            }
        }
    }

    /// Ends the liquidation if `requester` is allowed to. Returns the cleared snapshot.
    pub fn end_liquidation(
        &mut self,
        snapshot: &PositionSnapshot,
        market: &MarketContext,
        requester: Address,
        now: Timestamp,
    ) -> Result<LiquidationEnd, EngineError> {
        let report = self.evaluate(snapshot, market, now)?;
        let reason = authorize_end(
            snapshot.liquidation(),
            requester,
            snapshot.owner,
            report.risk_indicator,
            now,
            &self.config.margin,
        )?;

        let event = LiquidationEndedEvent {
            account: snapshot.account,
            authority: requester,
            reason,
        };
        self.emit_event(now, EventPayload::LiquidationEnded(event.clone()));

        Ok(LiquidationEnd {
            snapshot: snapshot.with_liquidation(None),
            event,
        })
    }
}
