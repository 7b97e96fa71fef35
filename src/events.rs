// 11.0: liquidation transitions produce events. used for audit trails and for notifying
// liquidation monitors. the EventPayload enum lists all event types.

use crate::liquidation::EndReason;
use crate::risk::RiskIndicator;
use crate::types::{Address, Timestamp};
use crate::valuation::Valuation;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventId(pub u64);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub timestamp: Timestamp,
    pub payload: EventPayload,
}

impl Event {
    pub fn new(id: EventId, timestamp: Timestamp, payload: EventPayload) -> Self {
        Self {
            id,
            timestamp,
            payload,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventPayload {
    LiquidationBegun(LiquidationBegunEvent),
    LiquidationEnded(LiquidationEndedEvent),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidationBegunEvent {
    pub account: Address,
    pub liquidator: Address,
    pub start_time: Timestamp,
    pub risk_indicator: RiskIndicator,
    pub valuation: Valuation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidationEndedEvent {
    pub account: Address,
    pub authority: Address,
    pub reason: EndReason,
}

impl LiquidationEndedEvent {
    pub fn timed_out(&self) -> bool {
        self.reason == EndReason::TimedOut
    }
}
