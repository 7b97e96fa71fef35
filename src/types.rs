// 1.0: all the primitives live here. nothing in the engine works without these types.
// ids, usd values, token quantities, timestamps. each is a newtype so the compiler catches mixups
// like adding a token quantity to a dollar value.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

// 1.1: 32 byte identifiers. TokenId names a mint (collateral, debt or note token),
// Address names a storage slot or a signer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TokenId(pub [u8; 32]);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address(pub [u8; 32]);

impl TokenId {
    /// Short deterministic id for tests and simulations: the tag fills the first byte.
    pub fn from_tag(tag: u8) -> Self {
        let mut bytes = [0u8; 32];
        bytes[0] = tag;
        Self(bytes)
    }
}

impl Address {
    pub fn from_tag(tag: u8) -> Self {
        let mut bytes = [0u8; 32];
        bytes[0] = tag;
        Self(bytes)
    }

    // the all-zero address marks an unused slot (no liquidator, unregistered position)
    pub fn is_default(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

fn write_short_hex(f: &mut fmt::Formatter<'_>, bytes: &[u8; 32]) -> fmt::Result {
    for b in &bytes[..4] {
        write!(f, "{:02x}", b)?;
    }
    write!(f, "..")
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_short_hex(f, &self.0)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_short_hex(f, &self.0)
    }
}

// 1.2: dollar amount. assets, liabilities, collateral figures all use this.
// may be negative: the "available" valuation fields report shortfalls that way.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Usd(Decimal);

impl Usd {
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    pub fn add(&self, other: Usd) -> Self {
        Self(self.0 + other.0)
    }

    pub fn sub(&self, other: Usd) -> Self {
        Self(self.0 - other.0)
    }
}

impl fmt::Display for Usd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", self.0)
    }
}

impl PartialOrd for Usd {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Usd {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

// 1.3: human token quantity (base units already scaled by the token's decimals).
// never negative; subtraction saturates at zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenAmount(Decimal);

impl TokenAmount {
    #[must_use]
    pub fn new(value: Decimal) -> Option<Self> {
        if value >= Decimal::ZERO {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Negative inputs become zero. Used wherever a formula result is clamped.
    pub fn clamped(value: Decimal) -> Self {
        Self(value.max(Decimal::ZERO))
    }

    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn add(&self, other: TokenAmount) -> Self {
        Self(self.0 + other.0)
    }

    pub fn saturating_sub(&self, other: TokenAmount) -> Self {
        Self::clamped(self.0 - other.0)
    }

    pub fn min(self, other: TokenAmount) -> Self {
        if other.0 < self.0 {
            other
        } else {
            self
        }
    }

    // truncate toward zero so a bound never rounds up past what is actually available
    pub fn round_down(&self, decimals: u32) -> Self {
        Self(self.0.round_dp_with_strategy(decimals, rust_decimal::RoundingStrategy::ToZero))
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl PartialOrd for TokenAmount {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TokenAmount {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

// 1.4: millisecond timestamp. on-chain liquidation records are in seconds, see from_secs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn from_secs(secs: i64) -> Self {
        Self(secs * 1000)
    }

    pub fn as_secs(&self) -> i64 {
        self.0.div_euclid(1000)
    }

    /// Signed time from `earlier` to `self`. Negative when `earlier` is in the future.
    pub fn since(&self, earlier: Timestamp) -> chrono::Duration {
        chrono::Duration::milliseconds(self.0 - earlier.0)
    }
}
