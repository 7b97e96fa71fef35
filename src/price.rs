// Price Feed Integration
//
// The valuation core does not fetch prices. Whatever oracle the surrounding system uses
// (Pyth, Switchboard, a cached store) hands prices in through the PriceSource trait.
// Staleness is the caller's policy; FreshPrices is the stock filter for callers that want it.

use crate::types::{TokenId, Timestamp};
use rust_decimal::prelude::MathematicalOps;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// A single oracle reading: `price * 10^exponent` dollars per whole token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OraclePrice {
    pub price: Decimal,
    pub exponent: i8,
    pub timestamp: Timestamp,
}

impl OraclePrice {
    pub fn new(price: Decimal, exponent: i8, timestamp: Timestamp) -> Self {
        Self {
            price,
            exponent,
            timestamp,
        }
    }

    /// Dollar price per whole token. `None` for non-positive or unrepresentable prices,
    /// which the valuation treats the same as a missing price.
    pub fn usd(&self) -> Option<Decimal> {
        let scale = Decimal::TEN.checked_powi(i64::from(self.exponent))?;
        let usd = self.price.checked_mul(scale)?;
        if usd > Decimal::ZERO {
            Some(usd)
        } else {
            None
        }
    }

    pub fn age_secs(&self, now: Timestamp) -> i64 {
        now.since(self.timestamp).num_seconds()
    }

    pub fn is_stale(&self, now: Timestamp, max_age_secs: i64) -> bool {
        self.age_secs(now) > max_age_secs
    }
}

/// Supplies the current price of a token, if one is known.
pub trait PriceSource {
    fn price(&self, token: &TokenId) -> Option<OraclePrice>;

    /// Dollar price per whole token, skipping non-positive readings.
    fn usd_price(&self, token: &TokenId) -> Option<Decimal> {
        self.price(token).and_then(|p| p.usd())
    }
}

impl PriceSource for HashMap<TokenId, OraclePrice> {
    fn price(&self, token: &TokenId) -> Option<OraclePrice> {
        self.get(token).copied()
    }
}

impl PriceSource for BTreeMap<TokenId, OraclePrice> {
    fn price(&self, token: &TokenId) -> Option<OraclePrice> {
        self.get(token).copied()
    }
}

impl<P: PriceSource + ?Sized> PriceSource for &P {
    fn price(&self, token: &TokenId) -> Option<OraclePrice> {
        (**self).price(token)
    }
}

/// Hides prices older than `max_age_secs`, so they value as missing.
#[derive(Debug, Clone, Copy)]
pub struct FreshPrices<P> {
    inner: P,
    now: Timestamp,
    max_age_secs: i64,
}

impl<P: PriceSource> FreshPrices<P> {
    pub fn new(inner: P, now: Timestamp, max_age_secs: i64) -> Self {
        Self {
            inner,
            now,
            max_age_secs,
        }
    }
}

impl<P: PriceSource> PriceSource for FreshPrices<P> {
    fn price(&self, token: &TokenId) -> Option<OraclePrice> {
        let price = self.inner.price(token)?;
        if price.is_stale(self.now, self.max_age_secs) {
            tracing::warn!(%token, age_secs = price.age_secs(self.now), "ignoring stale price");
            return None;
        }
        Some(price)
    }
}
