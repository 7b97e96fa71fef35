//! Decoded account snapshot.
//!
//! An immutable view of one margin account: its registered positions and, while it is
//! being liquidated, the liquidation record. The surrounding system fetches and decodes
//! it; everything the engine derives from it is recomputed, never written back.

use crate::config::MAX_USER_POSITIONS;
use crate::liquidation::LiquidationState;
use crate::position::{Position, PositionError};
use crate::types::{Address, TokenId, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionSnapshot {
    pub account: Address,
    pub owner: Address,
    positions: Vec<Position>,
    liquidation: Option<LiquidationState>,
    pub fetched_at: Timestamp,
}

impl PositionSnapshot {
    /// Drops unregistered slots (default address) and checks the rest.
    pub fn new(
        account: Address,
        owner: Address,
        positions: Vec<Position>,
        liquidation: Option<LiquidationState>,
        fetched_at: Timestamp,
    ) -> Result<Self, PositionError> {
        let positions: Vec<Position> = positions
            .into_iter()
            .filter(|p| !p.address.is_default())
            .collect();

        if positions.len() > MAX_USER_POSITIONS {
            return Err(PositionError::TooManyPositions {
                count: positions.len(),
                max: MAX_USER_POSITIONS,
            });
        }

        let mut seen = HashSet::with_capacity(positions.len());
        for p in &positions {
            p.validate()?;
            if !seen.insert(p.address) {
                return Err(PositionError::DuplicateAddress(p.address));
            }
        }

        Ok(Self {
            account,
            owner,
            positions,
            liquidation,
            fetched_at,
        })
    }

    /// An account with nothing registered.
    pub fn empty(account: Address, owner: Address, fetched_at: Timestamp) -> Self {
        Self {
            account,
            owner,
            positions: Vec::new(),
            liquidation: None,
            fetched_at,
        }
    }

    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    pub fn position(&self, token: &TokenId) -> Option<&Position> {
        self.positions.iter().find(|p| &p.token == token)
    }

    pub fn liquidation(&self) -> Option<&LiquidationState> {
        self.liquidation.as_ref()
    }

    pub fn is_being_liquidated(&self) -> bool {
        self.liquidation.is_some()
    }

    pub fn liquidator(&self) -> Option<Address> {
        self.liquidation.map(|l| l.liquidator)
    }

    /// Owner always; the liquidator only while the liquidation lasts.
    pub fn has_authority(&self, who: Address) -> bool {
        who == self.owner || self.liquidator() == Some(who)
    }

    /// Same positions with a different liquidation record.
    pub fn with_liquidation(&self, liquidation: Option<LiquidationState>) -> Self {
        Self {
            liquidation,
            ..self.clone()
        }
    }
}
