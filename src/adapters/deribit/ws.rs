//! The Deribit streaming session: JSON-RPC 2.0 over WebSocket,
//! reconnect-with-backoff, per-session channel-to-canonical-name table
//! confined to this loop. Grounded in
//! `examples/original_source/src/market_feed/adapters/deribit.py::_ws_loop`,
//! following the same connect/read-loop idiom as a `tokio-tungstenite`
//! client driving a long-lived session.

use std::collections::HashMap;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::{connect_async, tungstenite};

use super::models::{AuthParams, InboundMessage, JsonRpcRequest, SubscribeParams};
use super::DeribitAdapter;
use crate::adapter::{Adapter, SessionState, BACKOFF};
use crate::manager::{FeedManager, RawTicker};

const WS_URL: &str = "wss://www.deribit.com/ws/api/v2";

pub(super) async fn run(
    adapter: Arc<DeribitAdapter>,
    manager: Arc<FeedManager>,
    mut stop_rx: watch::Receiver<bool>,
) {
    let mut state = SessionState::Idle;
    loop {
        if *stop_rx.borrow() {
            state = SessionState::Stopped;
            tracing::debug!(?state, adapter = adapter.name(), "session stopped");
            return;
        }

        state = SessionState::Connecting;
        tracing::debug!(?state, adapter = adapter.name(), "connecting");
        match connect_async(WS_URL).await {
            Ok((ws_stream, _)) => {
                let (mut write, mut read) = ws_stream.split();

                if let Some((client_id, client_secret)) = &adapter.credentials {
                    state = SessionState::Authenticating;
                    let auth = JsonRpcRequest::new(
                        99,
                        "public/auth",
                        AuthParams {
                            grant_type: "client_credentials",
                            client_id,
                            client_secret,
                        },
                    );
                    if let Ok(body) = serde_json::to_string(&auth) {
                        let _ = write.send(tungstenite::Message::Text(body)).await;
                    }
                }

                state = SessionState::Streaming;
                adapter.connected.store(true, Ordering::Relaxed);
                tracing::info!(?state, adapter = adapter.name(), "streaming");
                manager.on_adapter_reconnect(adapter.name());

                let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Vec<String>>();
                *adapter.outbound.lock().expect("outbound mutex poisoned") = Some(outbound_tx);
                // channel -> canonical name, the correlation id recovered on
                // every inbound notification instead of re-deriving it from
                // the vendor-native payload name.
                let mut channel_subscriptions: HashMap<String, String> = HashMap::new();
                let mut request_id: u64 = 100;

                'streaming: loop {
                    tokio::select! {
                        _ = stop_rx.changed() => {
                            if *stop_rx.borrow() {
                                let _ = write.close().await;
                                break 'streaming;
                            }
                        }
                        Some(channels) = outbound_rx.recv() => {
                            send_subscribe(
                                &adapter,
                                &mut write,
                                &mut channel_subscriptions,
                                &mut request_id,
                                channels,
                            )
                            .await;
                        }
                        msg = read.next() => {
                            match msg {
                                Some(Ok(tungstenite::Message::Text(text))) => {
                                    handle_inbound(&manager, &channel_subscriptions, &text);
                                }
                                Some(Ok(tungstenite::Message::Ping(payload))) => {
                                    let _ = write.send(tungstenite::Message::Pong(payload)).await;
                                }
                                Some(Ok(tungstenite::Message::Close(_))) | None => break 'streaming,
                                Some(Ok(_)) => {}
                                Some(Err(err)) => {
                                    tracing::warn!(adapter = adapter.name(), error = %err, "transport read failed");
                                    break 'streaming;
                                }
                            }
                        }
                    }
                }

                adapter.connected.store(false, Ordering::Relaxed);
                *adapter.outbound.lock().expect("outbound mutex poisoned") = None;
            }
            Err(err) => {
                tracing::warn!(adapter = adapter.name(), error = %err, "connect failed");
            }
        }

        if *stop_rx.borrow() {
            state = SessionState::Stopped;
            tracing::debug!(?state, adapter = adapter.name(), "session stopped");
            return;
        }
        state = SessionState::Backoff;
        tracing::debug!(?state, adapter = adapter.name(), "backing off");
        tokio::time::sleep(BACKOFF).await;
    }
}

async fn send_subscribe(
    adapter: &DeribitAdapter,
    write: &mut (impl futures_util::Sink<tungstenite::Message, Error = tungstenite::Error> + Unpin),
    channel_subscriptions: &mut HashMap<String, String>,
    request_id: &mut u64,
    canonical_names: Vec<String>,
) {
    let channels: Vec<String> = canonical_names
        .into_iter()
        .filter_map(|name| {
            let channel = format!("ticker.{}.100ms", adapter.translator.to_vendor(&name));
            if channel_subscriptions.contains_key(&channel) {
                None
            } else {
                channel_subscriptions.insert(channel.clone(), name);
                Some(channel)
            }
        })
        .collect();
    if channels.is_empty() {
        return;
    }
    *request_id += 1;
    let req = JsonRpcRequest::new(*request_id, "public/subscribe", SubscribeParams { channels });
    if let Ok(body) = serde_json::to_string(&req) {
        let _ = write.send(tungstenite::Message::Text(body)).await;
    }
}

fn handle_inbound(manager: &FeedManager, channel_subscriptions: &HashMap<String, String>, text: &str) {
    let Ok(inbound) = serde_json::from_str::<InboundMessage>(text) else {
        return;
    };
    let Some(params) = inbound.params else {
        return;
    };
    let data = params.data;
    let last_price_absent = data.last_price.unwrap_or(0.0) == 0.0;
    let best_bid_absent = data.best_bid_price.unwrap_or(0.0) == 0.0;
    if last_price_absent && best_bid_absent {
        return;
    }
    let Some(canonical_name) = channel_subscriptions.get(&params.channel) else {
        return;
    };

    manager.ingest_ticker(RawTicker {
        instrument_name: canonical_name.clone(),
        best_bid_price: data.best_bid_price,
        best_bid_amount: data.best_bid_amount,
        best_ask_price: data.best_ask_price,
        best_ask_amount: data.best_ask_amount,
        last_price: data.last_price,
        index_price: data.index_price,
        stats: data.stats.unwrap_or_default(),
        timestamp_ms: data.timestamp,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn manager() -> Arc<FeedManager> {
        FeedManager::bootstrap(Vec::new(), |_| None).await
    }

    #[tokio::test]
    async fn inbound_ticker_is_keyed_by_channel_not_vendor_payload_name() {
        let manager = manager().await;
        let mut channel_subscriptions = HashMap::new();
        channel_subscriptions.insert(
            "ticker.BTC-8JAN21-16000-C.100ms".to_string(),
            "BTC-8JAN21-16000-C".to_string(),
        );

        let text = r#"{"params":{"channel":"ticker.BTC-8JAN21-16000-C.100ms","data":{"instrument_name":"some-other-vendor-name","last_price":50000.0}}}"#;
        handle_inbound(&manager, &channel_subscriptions, text);

        let snapshot = manager.get_snapshot();
        assert!(snapshot.tickers.contains_key("BTC-8JAN21-16000-C"));
        assert!(!snapshot.tickers.contains_key("some-other-vendor-name"));
    }

    #[tokio::test]
    async fn unknown_channel_is_dropped() {
        let manager = manager().await;
        let channel_subscriptions = HashMap::new();

        let text = r#"{"params":{"channel":"ticker.BTC-PERPETUAL.100ms","data":{"last_price":50000.0}}}"#;
        handle_inbound(&manager, &channel_subscriptions, text);

        assert!(manager.get_snapshot().tickers.is_empty());
    }

    #[tokio::test]
    async fn zero_last_price_with_no_bid_is_dropped() {
        let manager = manager().await;
        let mut channel_subscriptions = HashMap::new();
        channel_subscriptions.insert("ticker.BTC-PERPETUAL.100ms".to_string(), "BTC-PERPETUAL".to_string());

        let text = r#"{"params":{"channel":"ticker.BTC-PERPETUAL.100ms","data":{"last_price":0.0}}}"#;
        handle_inbound(&manager, &channel_subscriptions, text);

        assert!(!manager.get_snapshot().tickers.contains_key("BTC-PERPETUAL"));
    }
}
