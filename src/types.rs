//! The canonical data model shared by every adapter and consumed by the
//! [`crate::manager::FeedManager`]. Nothing in this module ever holds a
//! vendor-native name.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Coin-margined (inverse) vs. stablecoin/linear-margined settlement. Only
/// meaningful for venues that distinguish the two, e.g. Deribit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Settlement {
    Coin,
    Usd,
}

/// One configured tab: a named grouping of instruments around one
/// underlying and one settlement convention, routed to exactly one adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabConfig {
    pub tab_name: String,
    pub base_symbol: String,
    pub settlement: Settlement,
    pub source: String,
}

/// One canonical option (or reference) known in a tab. Append-only for the
/// process lifetime once bootstrap has produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentRecord {
    pub instrument_name: String,
    pub expiration_timestamp: Option<i64>,
    pub base_currency: String,
    pub quote_currency: String,
}

/// Top-of-book snapshot for one canonical name. All price/size fields are
/// optional because adapters never fabricate values the vendor message
/// didn't carry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ticker {
    pub instrument_name: String,
    pub best_bid_price: Option<f64>,
    pub best_bid_amount: Option<f64>,
    pub best_ask_price: Option<f64>,
    pub best_ask_amount: Option<f64>,
    pub last_price: Option<f64>,
    /// Opaque pass-through stats, e.g. 24h volume/OI. Never interpreted by
    /// the core, only carried to the consumer.
    #[serde(default)]
    pub stats: serde_json::Map<String, serde_json::Value>,
    pub timestamp_ms: Option<i64>,
}

pub type IndexPrices = HashMap<String, f64>;
pub type Tickers = HashMap<String, Ticker>;

/// A deep, immutable-from-the-consumer's-perspective copy of the feed's
/// current state (P3: mutating this must never mutate manager state).
#[derive(Debug, Clone, Serialize)]
pub struct MarketSnapshot {
    pub is_ready: bool,
    pub index_prices: IndexPrices,
    pub tickers: Tickers,
    pub config: Arc<[TabConfig]>,
    pub instruments_by_tab: HashMap<String, Vec<InstrumentRecord>>,
}

/// Flat credentials map, e.g. `{"client_id": "...", "client_secret": "..."}`.
/// Intentionally untyped beyond `String -> String`: each adapter picks the
/// keys it recognizes and ignores the rest.
pub type Credentials = HashMap<String, String>;
