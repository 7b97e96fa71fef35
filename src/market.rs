//! Market context.
//!
//! Everything outside the account that the engine needs on a refresh: which tokens the
//! client is configured for, the pool metadata it has loaded so far, oracle prices and
//! the user's wallet balances. Missing entries are normal while data streams in.

use crate::pool::PoolMetadata;
use crate::price::OraclePrice;
use crate::types::{TokenAmount, TokenId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketContext {
    /// Configured underlying tokens, in display order.
    pub tokens: Vec<TokenId>,
    pub pools: HashMap<TokenId, PoolMetadata>,
    pub prices: HashMap<TokenId, OraclePrice>,
    pub wallet: HashMap<TokenId, TokenAmount>,
}

impl MarketContext {
    pub fn new(tokens: Vec<TokenId>) -> Self {
        Self {
            tokens,
            ..Self::default()
        }
    }

    pub fn with_pool(mut self, pool: PoolMetadata) -> Self {
        self.pools.insert(pool.token, pool);
        self
    }

    pub fn with_price(mut self, token: TokenId, price: OraclePrice) -> Self {
        self.prices.insert(token, price);
        self
    }

    pub fn with_wallet_balance(mut self, token: TokenId, amount: TokenAmount) -> Self {
        self.wallet.insert(token, amount);
        self
    }

    pub fn pool(&self, token: &TokenId) -> Option<&PoolMetadata> {
        self.pools.get(token)
    }

    /// Spendable wallet balance; zero when the wallet holds none.
    pub fn wallet_balance(&self, token: &TokenId) -> TokenAmount {
        self.wallet.get(token).copied().unwrap_or_default()
    }

    pub fn update_price(&mut self, token: TokenId, price: OraclePrice) {
        self.prices.insert(token, price);
    }
}
