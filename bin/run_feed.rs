use std::sync::Arc;
use std::time::Duration;

use marketfeed::adapters::deribit::DeribitAdapter;
use marketfeed::types::{Credentials, Settlement, TabConfig};
use marketfeed::FeedManager;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let market_config = vec![TabConfig {
        tab_name: "BTC-USD".to_string(),
        base_symbol: "BTC".to_string(),
        settlement: Settlement::Usd,
        source: "deribit".to_string(),
    }];
    let credentials = Credentials::new();

    let manager = FeedManager::bootstrap(market_config, |source| match source {
        "deribit" => Some(Arc::new(DeribitAdapter::new(&credentials, "feed_instruments.csv")) as _),
        _ => None,
    })
    .await;

    manager.start_stream();

    loop {
        tokio::time::sleep(Duration::from_secs(5)).await;
        let snapshot = manager.get_snapshot();
        tracing::info!(
            ready = snapshot.is_ready,
            tickers = snapshot.tickers.len(),
            index_prices = ?snapshot.index_prices,
            "snapshot"
        );
    }
}
