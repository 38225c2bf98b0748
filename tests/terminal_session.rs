//! End-to-end session-level scenarios — subscribe dedup and reconnect
//! clearing active subscriptions — driven through `TerminalAdapter<T>`
//! against an in-memory fake transport instead of a real vendor SDK, which
//! is exactly what the `TerminalTransport` seam is for.
#![cfg(feature = "terminal")]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use marketfeed::adapters::terminal::{ReferenceValue, TerminalAdapter, TerminalTick, TerminalTransport};
use marketfeed::{Adapter, FeedManager};

#[derive(Default)]
struct FakeTransport {
    subscribed: Arc<Mutex<Vec<(String, String)>>>,
    events: Mutex<VecDeque<TerminalTick>>,
}

#[async_trait]
impl TerminalTransport for FakeTransport {
    async fn connect(&self) -> bool {
        true
    }

    fn disconnect(&self) {}

    fn send_subscribe(&self, subscriptions: Vec<(String, String)>) {
        self.subscribed.lock().unwrap().extend(subscriptions);
    }

    async fn poll_event(&self) -> Option<TerminalTick> {
        if let Some(tick) = self.events.lock().unwrap().pop_front() {
            return Some(tick);
        }
        tokio::time::sleep(Duration::from_secs(3600)).await;
        None
    }

    async fn fetch_reference_data(&self, _vendor_ticker: &str, _field: &str) -> Option<ReferenceValue> {
        None
    }
}

async fn idle_manager() -> Arc<FeedManager> {
    FeedManager::bootstrap(Vec::new(), |_| None).await
}

#[tokio::test]
async fn dedup_on_subscribe_forwards_each_vendor_name_once() {
    let subscribed = Arc::new(Mutex::new(Vec::new()));
    let transport = FakeTransport {
        subscribed: subscribed.clone(),
        events: Mutex::new(VecDeque::new()),
    };
    let adapter = Arc::new(TerminalAdapter::new(transport, "/nonexistent/feed_instruments.csv"));

    adapter.subscribe(vec!["SPY".to_string(), "SPX".to_string()]);
    adapter.subscribe(vec!["SPX".to_string(), "VIX".to_string()]);

    let sent = subscribed.lock().unwrap();
    let vendors: Vec<&str> = sent.iter().map(|(_, vendor)| vendor.as_str()).collect();
    assert_eq!(vendors, vec!["SPY US Equity", "SPX Index", "VIX Index"]);
}

#[tokio::test]
async fn reconnect_clears_active_subscriptions_so_the_planner_can_resend() {
    let subscribed = Arc::new(Mutex::new(Vec::new()));
    let transport = FakeTransport {
        subscribed: subscribed.clone(),
        events: Mutex::new(VecDeque::new()),
    };
    let adapter = Arc::new(TerminalAdapter::new(transport, "/nonexistent/feed_instruments.csv"));

    adapter.subscribe(vec!["SPY".to_string()]);

    let manager = idle_manager().await;
    adapter.clone().start(manager).await;
    tokio::time::sleep(Duration::from_millis(20)).await;

    adapter.subscribe(vec!["SPY".to_string()]);

    let sent = subscribed.lock().unwrap();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0], sent[1]);
}
