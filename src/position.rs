// 4.0: account positions. one entry per registered token, tagged collateral or debt.
// 4.1 converts raw fixed-point balances into human quantities, 4.2 merges hypothetical changes.

use crate::types::{Address, TokenId};
use rust_decimal::prelude::MathematicalOps;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How a position counts toward the account's valuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PositionKind {
    /// Collateral. Counted in assets and, weighted, in collateral.
    Deposit,
    /// Debt. Counted in liabilities and demands collateral.
    Claim,
    /// Registered but not valued (e.g. an adapter bookkeeping token).
    NoValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPosition")]
pub struct Position {
    pub token: TokenId,
    pub address: Address,
    // native base units
    pub balance: u128,
    pub exponent: i8,
    pub kind: PositionKind,
    pub value_modifier: Decimal,
}

impl Position {
    pub fn new(
        token: TokenId,
        address: Address,
        balance: u128,
        exponent: i8,
        kind: PositionKind,
        value_modifier: Decimal,
    ) -> Result<Self, PositionError> {
        validate_modifier(token, kind, value_modifier)?;
        Ok(Self {
            token,
            address,
            balance,
            exponent,
            kind,
            value_modifier,
        })
    }

    /// `balance * 10^exponent`, or `None` when it does not fit a `Decimal`.
    pub fn quantity(&self) -> Option<Decimal> {
        balance_as_decimal(self.balance, self.exponent)
    }

    pub fn is_empty(&self) -> bool {
        self.balance == 0
    }

    /// Re-checks the modifier; fields are public, so a value built by hand may skip `new`.
    pub fn validate(&self) -> Result<(), PositionError> {
        validate_modifier(self.token, self.kind, self.value_modifier)
    }
}

// decoded positions go through the same checks as `Position::new`
#[derive(Deserialize)]
struct RawPosition {
    token: TokenId,
    address: Address,
    balance: u128,
    exponent: i8,
    kind: PositionKind,
    value_modifier: Decimal,
}

impl TryFrom<RawPosition> for Position {
    type Error = PositionError;

    fn try_from(raw: RawPosition) -> Result<Self, Self::Error> {
        Position::new(raw.token, raw.address, raw.balance, raw.exponent, raw.kind, raw.value_modifier)
    }
}

fn validate_modifier(token: TokenId, kind: PositionKind, modifier: Decimal) -> Result<(), PositionError> {
    if modifier < Decimal::ZERO || modifier > Decimal::ONE {
        return Err(PositionError::InvalidValueModifier { token, modifier });
    }
    // claims divide by their modifier
    if kind == PositionKind::Claim && modifier.is_zero() {
        return Err(PositionError::ZeroClaimWeight(token));
    }
    Ok(())
}

// 4.1: fixed point to decimal. negative exponents become the decimal scale directly,
// positive ones multiply. both paths are checked since u128 is wider than Decimal's 96 bits.
pub fn balance_as_decimal(balance: u128, exponent: i8) -> Option<Decimal> {
    let raw = i128::try_from(balance).ok()?;
    if exponent <= 0 {
        let scale = u32::from(exponent.unsigned_abs());
        if scale <= 28 {
            return Decimal::try_from_i128_with_scale(raw, scale).ok();
        }
        // scale past 28 digits: drop the excess precision through division
        let base = Decimal::try_from_i128_with_scale(raw, 28).ok()?;
        let excess = Decimal::TEN.checked_powi(i64::from(scale - 28))?;
        return base.checked_div(excess);
    }
    let base = Decimal::try_from_i128_with_scale(raw, 0).ok()?;
    let factor = Decimal::TEN.checked_powi(i64::from(exponent))?;
    base.checked_mul(factor)
}

// 4.2: a hypothetical balance change not yet on-chain. delta is in base units.
// when the account has no position for the token, the change describes a new one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPositionChange")]
pub struct PositionChange {
    pub token: TokenId,
    pub kind: PositionKind,
    pub exponent: i8,
    pub value_modifier: Decimal,
    pub delta: i128,
}

impl PositionChange {
    pub fn new(
        token: TokenId,
        kind: PositionKind,
        exponent: i8,
        value_modifier: Decimal,
        delta: i128,
    ) -> Result<Self, PositionError> {
        validate_modifier(token, kind, value_modifier)?;
        Ok(Self {
            token,
            kind,
            exponent,
            value_modifier,
            delta,
        })
    }
}

#[derive(Deserialize)]
struct RawPositionChange {
    token: TokenId,
    kind: PositionKind,
    exponent: i8,
    value_modifier: Decimal,
    delta: i128,
}

impl TryFrom<RawPositionChange> for PositionChange {
    type Error = PositionError;

    fn try_from(raw: RawPositionChange) -> Result<Self, Self::Error> {
        PositionChange::new(raw.token, raw.kind, raw.exponent, raw.value_modifier, raw.delta)
    }
}

fn apply_delta(balance: u128, delta: i128) -> u128 {
    if delta >= 0 {
        balance.saturating_add(delta.unsigned_abs())
    } else {
        balance.saturating_sub(delta.unsigned_abs())
    }
}

/// Returns the positions with `changes` folded in. Inputs are untouched.
/// Balances never go below zero; a change against an existing token must keep its kind.
pub fn merge_changes(positions: &[Position], changes: &[PositionChange]) -> Result<Vec<Position>, PositionError> {
    let mut merged = positions.to_vec();
    for change in changes {
        match merged.iter_mut().find(|p| p.token == change.token) {
            Some(existing) => {
                if existing.kind != change.kind {
                    return Err(PositionError::KindMismatch {
                        token: change.token,
                        registered: existing.kind,
                        requested: change.kind,
                    });
                }
                existing.balance = apply_delta(existing.balance, change.delta);
            }
            None => merged.push(Position {
                token: change.token,
                address: Address::default(),
                balance: apply_delta(0, change.delta),
                exponent: change.exponent,
                kind: change.kind,
                value_modifier: change.value_modifier,
            }),
        }
    }
    Ok(merged)
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PositionError {
    #[error("Value modifier {modifier} for token {token} is outside [0, 1]")]
    InvalidValueModifier { token: TokenId, modifier: Decimal },

    #[error("Claim position for token {0} has a zero value modifier")]
    ZeroClaimWeight(TokenId),

    #[error("Position kind for token {token} is {registered:?}, change requested {requested:?}")]
    KindMismatch {
        token: TokenId,
        registered: PositionKind,
        requested: PositionKind,
    },

    #[error("Duplicate position address {0}")]
    DuplicateAddress(Address),

    #[error("Account holds {count} positions, maximum is {max}")]
    TooManyPositions { count: usize, max: usize },
}
