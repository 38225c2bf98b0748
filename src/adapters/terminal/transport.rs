//! The pluggable seam a real institutional-terminal SDK implementation
//! would satisfy. The vendor SDK itself (e.g. Bloomberg's `blpapi`) is a
//! proprietary native library not published on crates.io — grounded in
//! `examples/original_source/src/market_feed/adapters/bloomberg.py`'s
//! `try: import blpapi except ImportError: HAS_BLPAPI = False` guard. A host
//! with the real SDK implements this trait; a host without one simply never
//! constructs a [`super::TerminalAdapter`].

use async_trait::async_trait;

/// One inbound tick, already carrying its correlation id (the canonical
/// name the subscription was made under — never derived from vendor
/// payload content).
#[derive(Debug, Clone)]
pub struct TerminalTick {
    pub correlation_id: String,
    pub last_price: Option<f64>,
    pub best_bid_price: Option<f64>,
    pub best_bid_amount: Option<f64>,
    pub best_ask_price: Option<f64>,
    pub best_ask_amount: Option<f64>,
}

/// The result of a synchronous reference-data fetch
/// (`fetch_reference_data`): either a single field value or a list of
/// security descriptions (an option chain).
#[derive(Debug, Clone)]
pub enum ReferenceValue {
    Float(f64),
    SecurityList(Vec<String>),
}

#[async_trait]
pub trait TerminalTransport: Send + Sync {
    /// Opens the session. Returns `false` on any failure; the adapter's
    /// session loop treats that as a `Backoff` transition.
    async fn connect(&self) -> bool;

    /// Closes the session. Idempotent.
    fn disconnect(&self);

    /// Subscribes to `(correlation_id, vendor_ticker)` pairs already
    /// deduped against this session's `active_subscriptions`.
    fn send_subscribe(&self, subscriptions: Vec<(String, String)>);

    /// Waits for the next subscription tick, or `None` if the session has
    /// gone away and should be reconnected.
    async fn poll_event(&self) -> Option<TerminalTick>;

    /// A synchronous reference-data request, covering both `OPT_CHAIN` and
    /// `LAST_PRICE`-style lookups. `None` on any failure.
    async fn fetch_reference_data(&self, vendor_ticker: &str, field: &str) -> Option<ReferenceValue>;
}
