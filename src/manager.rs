//! The Feed Manager: owns canonical state, serializes mutations behind one
//! mutex, orchestrates bootstrap, and produces snapshots. Grounded in
//! `examples/original_source/src/market_feed/manager.py`'s `FeedManager`.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use crate::adapter::Adapter;
use crate::types::{IndexPrices, InstrumentRecord, MarketSnapshot, TabConfig, Ticker, Tickers};

/// A raw, not-yet-validated ticker update as an adapter would hand it to
/// [`FeedManager::ingest_ticker`]. Mirrors the fields the Python original's
/// `ingest_ticker(raw_data)` read out of its free-form dict, but typed.
#[derive(Debug, Clone, Default)]
pub struct RawTicker {
    pub instrument_name: String,
    pub best_bid_price: Option<f64>,
    pub best_bid_amount: Option<f64>,
    pub best_ask_price: Option<f64>,
    pub best_ask_amount: Option<f64>,
    pub last_price: Option<f64>,
    pub index_price: Option<f64>,
    pub stats: serde_json::Map<String, serde_json::Value>,
    pub timestamp_ms: Option<i64>,
}

struct ManagerState {
    tickers: Tickers,
    index_prices: IndexPrices,
    instruments_by_tab: HashMap<String, Vec<InstrumentRecord>>,
    instrument_set_by_tab: HashMap<String, HashSet<String>>,
}

/// A predicate deciding whether a canonical name is a "reference" name
/// whose ticker updates should also feed `index_prices`. Defaults to the
/// `PERPETUAL`/`USDC` heuristic, which is known to be possibly
/// vendor-specific; a host that knows better can supply its own via
/// [`FeedManager::bootstrap_with_reference_predicate`].
pub type ReferencePredicate = Arc<dyn Fn(&str) -> bool + Send + Sync>;

fn default_reference_predicate() -> ReferencePredicate {
    Arc::new(|name: &str| name.contains("PERPETUAL") || name.contains("USDC"))
}

/// The central state store, bootstrap orchestrator, and subscription
/// planner entry point. Thread-safe: cheap to clone via `Arc<FeedManager>`
/// and share between the host's consumer thread(s) and each adapter's
/// streaming task.
pub struct FeedManager {
    state: Mutex<ManagerState>,
    market_config: Arc<[TabConfig]>,
    adapters: HashMap<String, Arc<dyn Adapter>>,
    is_reference: ReferencePredicate,
}

impl FeedManager {
    /// Blocking (relative to the caller — an `.await`ed async constructor)
    /// bootstrap: builds the adapters the config actually references, then
    /// fetches the option chain and reference prices for every tab. Must
    /// complete before [`FeedManager::start_stream`] is called.
    ///
    /// `build_adapter` is invoked once per distinct `TabConfig::source`
    /// key that the config references; it returns `None` if that source
    /// isn't registered — the tabs that name it are then silently skipped
    /// everywhere else. Credentials are the caller's
    /// concern: `build_adapter` closes over whatever it needs to construct
    /// each adapter, the manager itself never sees them.
    pub async fn bootstrap<F>(market_config: Vec<TabConfig>, build_adapter: F) -> Arc<Self>
    where
        F: FnMut(&str) -> Option<Arc<dyn Adapter>>,
    {
        Self::bootstrap_with_reference_predicate(
            market_config,
            build_adapter,
            default_reference_predicate(),
        )
        .await
    }

    /// Same as [`Self::bootstrap`], but with an explicit reference-name
    /// predicate instead of the built-in `PERPETUAL`/`USDC` heuristic.
    pub async fn bootstrap_with_reference_predicate<F>(
        market_config: Vec<TabConfig>,
        mut build_adapter: F,
        is_reference: ReferencePredicate,
    ) -> Arc<Self>
    where
        F: FnMut(&str) -> Option<Arc<dyn Adapter>>,
    {
        let mut instruments_by_tab = HashMap::new();
        let mut instrument_set_by_tab = HashMap::new();
        for cfg in &market_config {
            instruments_by_tab.insert(cfg.tab_name.clone(), Vec::new());
            instrument_set_by_tab.insert(cfg.tab_name.clone(), HashSet::new());
        }

        let mut adapters: HashMap<String, Arc<dyn Adapter>> = HashMap::new();
        let mut active_sources: Vec<String> = market_config
            .iter()
            .map(|c| c.source.to_lowercase())
            .collect();
        active_sources.sort();
        active_sources.dedup();
        for source in active_sources {
            match build_adapter(&source) {
                Some(adapter) => {
                    adapters.insert(source, adapter);
                }
                None => {
                    tracing::warn!(source = %source, "adapter not registered, tabs using it will be skipped");
                }
            }
        }

        let manager = Arc::new(Self {
            state: Mutex::new(ManagerState {
                tickers: HashMap::new(),
                index_prices: HashMap::new(),
                instruments_by_tab,
                instrument_set_by_tab,
            }),
            market_config: market_config.clone().into(),
            adapters,
            is_reference,
        });

        tracing::info!("bootstrapping instrument universe and reference prices");
        manager.bootstrap_instruments(&market_config).await;
        manager.bootstrap_prices(&market_config).await;
        manager
    }

    async fn bootstrap_instruments(&self, market_config: &[TabConfig]) {
        for cfg in market_config {
            let Some(adapter) = self.adapters.get(&cfg.source.to_lowercase()) else {
                continue;
            };
            let instruments = adapter.get_option_chain(cfg).await;
            let mut state = self.state.lock().expect("manager mutex poisoned");
            let set = state
                .instrument_set_by_tab
                .entry(cfg.tab_name.clone())
                .or_default();
            let list = state
                .instruments_by_tab
                .entry(cfg.tab_name.clone())
                .or_default();
            for inst in instruments {
                if set.insert(inst.instrument_name.clone()) {
                    list.push(inst);
                }
            }
        }
    }

    async fn bootstrap_prices(&self, market_config: &[TabConfig]) {
        for cfg in market_config {
            let Some(adapter) = self.adapters.get(&cfg.source.to_lowercase()) else {
                continue;
            };
            for name in adapter.get_reference_tickers(cfg) {
                let price = adapter.get_latest_price(&name).await;
                if price > 0.0 {
                    let mut state = self.state.lock().expect("manager mutex poisoned");
                    state.index_prices.insert(name.clone(), price);
                    tracing::info!(name = %name, price, "bootstrapped reference price");
                }
            }
        }
    }

    /// Fans `start` out to every adapter. Idempotent because each
    /// [`Adapter::start`] implementation must itself be idempotent.
    pub fn start_stream(self: &Arc<Self>) {
        for adapter in self.adapters.values() {
            tokio::spawn(Arc::clone(adapter).start(Arc::clone(self)));
        }
    }

    /// Fans `stop` out to every adapter. Idempotent.
    pub fn stop_stream(&self) {
        for adapter in self.adapters.values() {
            adapter.stop();
        }
    }

    pub fn adapter(&self, source: &str) -> Option<&Arc<dyn Adapter>> {
        self.adapters.get(&source.to_lowercase())
    }

    pub fn tab_config(&self, tab_name: &str) -> Option<&TabConfig> {
        self.market_config.iter().find(|c| c.tab_name == tab_name)
    }

    pub fn market_config(&self) -> &Arc<[TabConfig]> {
        &self.market_config
    }

    /// A deep copy of the current state plus `is_ready`. Mutating the
    /// returned snapshot never mutates manager state (P3).
    pub fn get_snapshot(&self) -> MarketSnapshot {
        let is_ready = self.adapters.values().any(|a| a.connected());
        let state = self.state.lock().expect("manager mutex poisoned");
        MarketSnapshot {
            is_ready,
            index_prices: state.index_prices.clone(),
            tickers: state.tickers.clone(),
            config: Arc::clone(&self.market_config),
            instruments_by_tab: state.instruments_by_tab.clone(),
        }
    }

    /// The `DDMMMYY` expiries known for a tab, ascending by parsed date;
    /// unparseable tokens sort last.
    pub fn get_expiries_for(&self, tab_name: &str) -> Vec<String> {
        let state = self.state.lock().expect("manager mutex poisoned");
        let Some(instruments) = state.instruments_by_tab.get(tab_name) else {
            return Vec::new();
        };
        let mut expiries: Vec<String> = instruments
            .iter()
            .filter_map(|i| crate::symbol::parse_canonical_option(&i.instrument_name))
            .map(|p| p.expiry.to_string())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        expiries.sort_by_key(|e| crate::symbol::parse_expiry(e).unwrap_or(chrono::NaiveDate::MAX));
        expiries
    }

    /// Invoked by adapters on the hot path: must not block on I/O.
    /// `tickers[name]` is always written before `index_prices[name]`, under
    /// the same lock acquisition.
    pub fn ingest_ticker(&self, raw: RawTicker) {
        let name = raw.instrument_name.clone();
        let ticker = Ticker {
            instrument_name: name.clone(),
            best_bid_price: raw.best_bid_price,
            best_bid_amount: raw.best_bid_amount,
            best_ask_price: raw.best_ask_price,
            best_ask_amount: raw.best_ask_amount,
            last_price: raw.last_price,
            stats: raw.stats,
            timestamp_ms: raw.timestamp_ms,
        };

        let mut state = self.state.lock().expect("manager mutex poisoned");
        state.tickers.insert(name.clone(), ticker);

        if (self.is_reference)(&name) {
            let price = raw.index_price.or(raw.last_price).unwrap_or(0.0);
            if price > 0.0 {
                state.index_prices.insert(name, price);
            }
        }
    }

    /// Hook invoked by an adapter when its session re-enters `Streaming`
    /// after a reconnect. A no-op by default — re-invoking the planner for
    /// previously interested tabs is the host's responsibility.
    pub fn on_adapter_reconnect(&self, source: &str) {
        tracing::info!(source = %source, "adapter reconnected");
    }

    pub(crate) fn instruments_for_tab(&self, tab_name: &str) -> Vec<InstrumentRecord> {
        let state = self.state.lock().expect("manager mutex poisoned");
        state
            .instruments_by_tab
            .get(tab_name)
            .cloned()
            .unwrap_or_default()
    }

    pub(crate) fn index_price(&self, name: &str) -> Option<f64> {
        let state = self.state.lock().expect("manager mutex poisoned");
        state.index_prices.get(name).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config() -> Vec<TabConfig> {
        vec![TabConfig {
            tab_name: "BTC-USD".to_string(),
            base_symbol: "BTC".to_string(),
            settlement: crate::types::Settlement::Usd,
            source: "deribit".to_string(),
        }]
    }

    #[tokio::test]
    async fn bootstrap_with_no_adapter_leaves_empty_state() {
        let manager = FeedManager::bootstrap(sample_config(), |_| None).await;
        let snapshot = manager.get_snapshot();
        assert!(!snapshot.is_ready);
        assert_eq!(snapshot.instruments_by_tab["BTC-USD"].len(), 0);
    }

    #[test]
    fn ingest_ticker_writes_ticker_before_index_price() {
        let manager = FeedManager {
            state: Mutex::new(ManagerState {
                tickers: HashMap::new(),
                index_prices: HashMap::new(),
                instruments_by_tab: HashMap::new(),
                instrument_set_by_tab: HashMap::new(),
            }),
            market_config: Vec::new().into(),
            adapters: HashMap::new(),
            is_reference: default_reference_predicate(),
        };

        manager.ingest_ticker(RawTicker {
            instrument_name: "BTC_USDC-PERPETUAL".to_string(),
            index_price: Some(50000.0),
            ..Default::default()
        });

        let snapshot = manager.get_snapshot();
        assert_eq!(
            snapshot.tickers["BTC_USDC-PERPETUAL"].instrument_name,
            "BTC_USDC-PERPETUAL"
        );
        assert_eq!(snapshot.index_prices["BTC_USDC-PERPETUAL"], 50000.0);
    }

    #[test]
    fn ingest_ticker_never_stores_a_zero_index_price() {
        let manager = FeedManager {
            state: Mutex::new(ManagerState {
                tickers: HashMap::new(),
                index_prices: HashMap::new(),
                instruments_by_tab: HashMap::new(),
                instrument_set_by_tab: HashMap::new(),
            }),
            market_config: Vec::new().into(),
            adapters: HashMap::new(),
            is_reference: default_reference_predicate(),
        };

        manager.ingest_ticker(RawTicker {
            instrument_name: "BTC_USDC-PERPETUAL".to_string(),
            index_price: None,
            last_price: None,
            ..Default::default()
        });

        let snapshot = manager.get_snapshot();
        assert!(!snapshot.index_prices.contains_key("BTC_USDC-PERPETUAL"));
    }

    #[test]
    fn snapshot_is_a_deep_copy() {
        let manager = FeedManager {
            state: Mutex::new(ManagerState {
                tickers: HashMap::new(),
                index_prices: HashMap::new(),
                instruments_by_tab: HashMap::from([(
                    "BTC-USD".to_string(),
                    vec![InstrumentRecord {
                        instrument_name: "BTC-20DEC24-50000-C".to_string(),
                        expiration_timestamp: None,
                        base_currency: "BTC".to_string(),
                        quote_currency: "USD".to_string(),
                    }],
                )]),
                instrument_set_by_tab: HashMap::new(),
            }),
            market_config: Vec::new().into(),
            adapters: HashMap::new(),
            is_reference: default_reference_predicate(),
        };

        let mut snapshot = manager.get_snapshot();
        snapshot
            .instruments_by_tab
            .get_mut("BTC-USD")
            .unwrap()
            .push(InstrumentRecord {
                instrument_name: "BTC-20DEC24-60000-C".to_string(),
                expiration_timestamp: None,
                base_currency: "BTC".to_string(),
                quote_currency: "USD".to_string(),
            });

        assert_eq!(manager.instruments_for_tab("BTC-USD").len(), 1);
    }
}
