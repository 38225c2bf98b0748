//! Deribit's REST bootstrap surface: one `reqwest::Client`, a small
//! `thiserror` enum for the adapter's own use, never surfaced past the
//! `Adapter` trait boundary.

use super::models::{RawInstrument, RawTickerResult, RestEnvelope};
use super::translator::Translator;
use crate::types::{InstrumentRecord, Settlement, TabConfig};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("unexpected status {0}")]
    Status(reqwest::StatusCode),
}

pub struct BootstrapClient {
    base_url: String,
    client: reqwest::Client,
}

impl BootstrapClient {
    pub fn new() -> Self {
        Self {
            base_url: "https://www.deribit.com/api/v2".to_string(),
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(5))
                .build()
                .expect("reqwest client builds with static config"),
        }
    }

    pub async fn fetch_option_chain(
        &self,
        cfg: &TabConfig,
        translator: &Translator,
    ) -> Vec<InstrumentRecord> {
        match self.try_fetch_option_chain(cfg).await {
            Ok(raw) => raw
                .into_iter()
                .filter(|inst| matches_settlement(&inst.instrument_name, &cfg.base_symbol, cfg.settlement))
                .map(|inst| InstrumentRecord {
                    instrument_name: translator.to_canonical(&inst.instrument_name).to_string(),
                    expiration_timestamp: inst.expiration_timestamp,
                    base_currency: inst.base_currency,
                    quote_currency: inst.quote_currency,
                })
                .collect(),
            Err(err) => {
                tracing::warn!(tab = %cfg.tab_name, error = %err, "deribit get_instruments failed, using empty chain");
                Vec::new()
            }
        }
    }

    async fn try_fetch_option_chain(&self, cfg: &TabConfig) -> Result<Vec<RawInstrument>> {
        let currency = if cfg.settlement == Settlement::Coin {
            cfg.base_symbol.as_str()
        } else {
            "USDC"
        };
        let url = format!(
            "{}/public/get_instruments?currency={currency}&kind=option&expired=false",
            self.base_url
        );
        let resp = self.client.get(url).send().await?;
        if !resp.status().is_success() {
            return Err(Error::Status(resp.status()));
        }
        Ok(resp.json::<RestEnvelope<Vec<RawInstrument>>>().await?.result)
    }

    pub async fn fetch_last_price(&self, canonical_name: &str, translator: &Translator) -> f64 {
        let target = translator.to_vendor(canonical_name);
        match self.try_fetch_ticker(target).await {
            Ok(ticker) => ticker.index_price.or(ticker.last_price).unwrap_or(0.0),
            Err(err) => {
                tracing::warn!(name = %canonical_name, error = %err, "deribit ticker fetch failed");
                0.0
            }
        }
    }

    async fn try_fetch_ticker(&self, instrument_name: &str) -> Result<RawTickerResult> {
        let url = format!(
            "{}/public/ticker?instrument_name={instrument_name}",
            self.base_url
        );
        let resp = self.client.get(url).send().await?;
        if !resp.status().is_success() {
            return Err(Error::Status(resp.status()));
        }
        Ok(resp.json::<RestEnvelope<RawTickerResult>>().await?.result)
    }
}

impl Default for BootstrapClient {
    fn default() -> Self {
        Self::new()
    }
}

fn matches_settlement(instrument_name: &str, base: &str, settlement: Settlement) -> bool {
    if settlement == Settlement::Usd {
        instrument_name.starts_with(&format!("{base}_USDC-"))
    } else {
        instrument_name.starts_with(&format!("{base}-")) && !instrument_name.contains("_USDC")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settlement_filter_matches_python_original() {
        assert!(matches_settlement("BTC_USDC-8JAN21-16000-C", "BTC", Settlement::Usd));
        assert!(!matches_settlement("BTC-8JAN21-16000-C", "BTC", Settlement::Usd));
        assert!(matches_settlement("BTC-8JAN21-16000-C", "BTC", Settlement::Coin));
        assert!(!matches_settlement("BTC_USDC-8JAN21-16000-C", "BTC", Settlement::Coin));
    }
}
