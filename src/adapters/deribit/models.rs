//! Wire shapes for Deribit's REST and JSON-RPC-over-WebSocket surfaces.
//! Field names match the vendor's JSON verbatim; translation into the
//! canonical schema happens in `super::translator`/`super::http`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct RestEnvelope<T> {
    pub result: T,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawInstrument {
    pub instrument_name: String,
    pub expiration_timestamp: Option<i64>,
    pub base_currency: String,
    pub quote_currency: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawTickerResult {
    pub instrument_name: Option<String>,
    pub index_price: Option<f64>,
    pub last_price: Option<f64>,
    pub best_bid_price: Option<f64>,
    pub best_bid_amount: Option<f64>,
    pub best_ask_price: Option<f64>,
    pub best_ask_amount: Option<f64>,
    pub timestamp: Option<i64>,
    /// Opaque volume/high/low/price-change object, passed through untouched.
    pub stats: Option<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Debug, Serialize)]
pub struct JsonRpcRequest<'a, P> {
    pub jsonrpc: &'a str,
    pub id: u64,
    pub method: &'a str,
    pub params: P,
}

impl<'a, P> JsonRpcRequest<'a, P> {
    pub fn new(id: u64, method: &'a str, params: P) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            method,
            params,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SubscribeParams {
    pub channels: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct AuthParams<'a> {
    pub grant_type: &'a str,
    pub client_id: &'a str,
    pub client_secret: &'a str,
}

/// An inbound server message: either a JSON-RPC response to one of our
/// requests (has `id`), or a subscription notification (has `params`).
#[derive(Debug, Deserialize)]
pub struct InboundMessage {
    pub id: Option<u64>,
    pub params: Option<NotificationParams>,
}

#[derive(Debug, Deserialize)]
pub struct NotificationParams {
    pub channel: String,
    pub data: RawTickerResult,
}
