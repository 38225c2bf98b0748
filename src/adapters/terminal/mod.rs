//! The generic institutional-terminal adapter: a translator grounded in the
//! Bloomberg original plus a [`TerminalTransport`] seam instead of a
//! concrete vendor SDK dependency (see `transport.rs`).

mod translator;
mod transport;

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::watch;

use crate::adapter::{Adapter, SessionState, BACKOFF};
use crate::manager::{FeedManager, RawTicker};
use crate::types::{InstrumentRecord, TabConfig};

pub use transport::{ReferenceValue, TerminalTick, TerminalTransport};
pub use translator::Translator;

const NOT_STARTED: u8 = 0;
const STARTED: u8 = 1;

/// An institutional-terminal venue integration, generic over the transport
/// that actually talks to the vendor SDK.
pub struct TerminalAdapter<T: TerminalTransport> {
    transport: T,
    translator: Translator,
    connected: Arc<AtomicBool>,
    started: AtomicU8,
    active_subscriptions: Mutex<HashSet<String>>,
    stop_tx: watch::Sender<bool>,
    stop_rx: watch::Receiver<bool>,
}

impl<T: TerminalTransport> TerminalAdapter<T> {
    pub fn new(transport: T, symbol_table_path: impl AsRef<std::path::Path>) -> Self {
        let (stop_tx, stop_rx) = watch::channel(false);
        Self {
            transport,
            translator: Translator::load(symbol_table_path),
            connected: Arc::new(AtomicBool::new(false)),
            started: AtomicU8::new(NOT_STARTED),
            active_subscriptions: Mutex::new(HashSet::new()),
            stop_tx,
            stop_rx,
        }
    }
}

#[async_trait]
impl<T: TerminalTransport + 'static> Adapter for TerminalAdapter<T> {
    fn name(&self) -> &str {
        "terminal"
    }

    async fn start(self: Arc<Self>, manager: Arc<FeedManager>) {
        if self
            .started
            .compare_exchange(NOT_STARTED, STARTED, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }
        let mut stop_rx = self.stop_rx.clone();
        tokio::spawn(async move {
            let mut state = SessionState::Idle;
            loop {
                if *stop_rx.borrow() {
                    state = SessionState::Stopped;
                    tracing::debug!(?state, adapter = self.name(), "session stopped");
                    return;
                }

                state = SessionState::Connecting;
                tracing::debug!(?state, adapter = self.name(), "connecting");
                if self.transport.connect().await {
                    self.active_subscriptions.lock().expect("mutex poisoned").clear();
                    self.connected.store(true, Ordering::Relaxed);
                    state = SessionState::Streaming;
                    tracing::info!(?state, adapter = self.name(), "streaming");
                    manager.on_adapter_reconnect(self.name());

                    loop {
                        tokio::select! {
                            _ = stop_rx.changed() => {
                                if *stop_rx.borrow() {
                                    self.transport.disconnect();
                                    break;
                                }
                            }
                            tick = self.transport.poll_event() => {
                                match tick {
                                    Some(tick) => ingest_tick(&manager, tick),
                                    None => break,
                                }
                            }
                        }
                    }
                    self.connected.store(false, Ordering::Relaxed);
                }

                if *stop_rx.borrow() {
                    state = SessionState::Stopped;
                    tracing::debug!(?state, adapter = self.name(), "session stopped");
                    return;
                }
                state = SessionState::Backoff;
                tracing::debug!(?state, adapter = self.name(), "backing off");
                tokio::time::sleep(BACKOFF).await;
            }
        });
    }

    fn stop(&self) {
        let _ = self.stop_tx.send(true);
    }

    async fn get_option_chain(&self, cfg: &TabConfig) -> Vec<InstrumentRecord> {
        let Some(root) = self.translator.to_vendor(&cfg.base_symbol) else {
            return Vec::new();
        };
        match self.transport.fetch_reference_data(&root, "OPT_CHAIN").await {
            Some(ReferenceValue::SecurityList(vendor_tickers)) => vendor_tickers
                .iter()
                .filter_map(|vendor| self.translator.to_canonical(vendor))
                .map(|parsed| InstrumentRecord {
                    instrument_name: parsed.instrument_name,
                    expiration_timestamp: parsed.expiration_timestamp,
                    base_currency: parsed.base_currency,
                    quote_currency: parsed.quote_currency,
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    async fn get_latest_price(&self, canonical_name: &str) -> f64 {
        let Some(vendor) = self.translator.to_vendor(canonical_name) else {
            return 0.0;
        };
        match self.transport.fetch_reference_data(&vendor, "LAST_PRICE").await {
            Some(ReferenceValue::Float(price)) => price,
            _ => 0.0,
        }
    }

    fn subscribe(&self, channels: Vec<String>) {
        let mut active = self.active_subscriptions.lock().expect("mutex poisoned");
        let subs: Vec<(String, String)> = channels
            .into_iter()
            .filter_map(|canonical| {
                let vendor = self.translator.to_vendor(&canonical)?;
                active.insert(vendor.clone()).then_some((canonical, vendor))
            })
            .collect();
        drop(active);
        if !subs.is_empty() {
            self.transport.send_subscribe(subs);
        }
    }

    fn get_reference_tickers(&self, cfg: &TabConfig) -> Vec<String> {
        vec![cfg.base_symbol.clone()]
    }

    fn connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }
}

fn ingest_tick(manager: &FeedManager, tick: TerminalTick) {
    let last_price_absent = tick.last_price.unwrap_or(0.0) == 0.0;
    let best_bid_absent = tick.best_bid_price.unwrap_or(0.0) == 0.0;
    if last_price_absent && best_bid_absent {
        return;
    }
    manager.ingest_ticker(RawTicker {
        instrument_name: tick.correlation_id,
        best_bid_price: tick.best_bid_price,
        best_bid_amount: tick.best_bid_amount,
        best_ask_price: tick.best_ask_price,
        best_ask_amount: tick.best_ask_amount,
        last_price: tick.last_price,
        index_price: None,
        stats: serde_json::Map::new(),
        timestamp_ms: None,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn manager() -> Arc<FeedManager> {
        FeedManager::bootstrap(Vec::new(), |_| None).await
    }

    fn tick(last_price: Option<f64>, best_bid_price: Option<f64>) -> TerminalTick {
        TerminalTick {
            correlation_id: "SPY".to_string(),
            last_price,
            best_bid_price,
            best_bid_amount: None,
            best_ask_price: None,
            best_ask_amount: None,
        }
    }

    #[tokio::test]
    async fn zero_last_price_with_no_bid_is_dropped() {
        let manager = manager().await;
        ingest_tick(&manager, tick(Some(0.0), None));
        assert!(!manager.get_snapshot().tickers.contains_key("SPY"));
    }

    #[tokio::test]
    async fn nonzero_last_price_is_ingested() {
        let manager = manager().await;
        ingest_tick(&manager, tick(Some(450.0), None));
        assert!(manager.get_snapshot().tickers.contains_key("SPY"));
    }
}
