//! The full symbol-translation rule set for the institutional terminal
//! vendor, grounded verbatim in
//! `examples/original_source/src/market_feed/adapters/bloomberg.py`
//! (`_convert_to_bbg`, `_parse_bbg_to_app`, `bbg_regex`,
//! `bbg_underlying_regex`). Unlike Deribit, the vendor-native form here
//! (`SPY US 02/20/26 C688 Equity`) has no structural relationship to the
//! canonical grammar, so every rule is spelled out explicitly.

use std::collections::HashSet;

use chrono::NaiveDate;
use regex::Regex;

use crate::config::{load_symbol_table, Directive};
use crate::symbol::{format_expiry, format_strike, parse_expiry};

const DEFAULT_INDEX_TICKERS: &[&str] = &["SPX", "NDX", "VIX", "RTY", "HSI", "NKY", "UKX", "CAC", "DAX", "SX5E"];
const DEFAULT_FUTURE_PREFIXES: &[&str] = &["ES", "NQ", "YM", "QR", "HI", "NK", "VG", "GX", "JB", "RX", "VX"];

pub struct Translator {
    exact: std::collections::HashMap<String, String>,
    index_tickers: HashSet<String>,
    future_prefixes: HashSet<String>,
    option_regex: Regex,
    underlying_regex: Regex,
}

impl Translator {
    pub fn load(symbol_table_path: impl AsRef<std::path::Path>) -> Self {
        let path = symbol_table_path.as_ref();
        let rows = load_symbol_table(path, "terminal");

        let mut exact = std::collections::HashMap::new();
        let mut index_tickers = HashSet::new();
        let mut future_prefixes = HashSet::new();

        if rows.is_empty() && !path.exists() {
            index_tickers.extend(DEFAULT_INDEX_TICKERS.iter().map(|s| s.to_string()));
            future_prefixes.extend(DEFAULT_FUTURE_PREFIXES.iter().map(|s| s.to_string()));
        } else {
            for (symbol, directive) in rows {
                match directive {
                    Directive::Exact(vendor) => {
                        exact.insert(symbol, vendor);
                    }
                    Directive::Index => {
                        index_tickers.insert(symbol);
                    }
                    Directive::FuturePrefix => {
                        future_prefixes.insert(symbol);
                    }
                }
            }
        }

        Self {
            exact,
            index_tickers,
            future_prefixes,
            option_regex: Regex::new(
                r"^(\w+)\s+\w+\s+(\d{1,2}/\d{1,2}/\d{2})\s+([CP])([\d.]+)\s+(Equity|Index)$",
            )
            .expect("static regex compiles"),
            underlying_regex: Regex::new(r"^(\w+)\s+(?:\w+\s+)?(Equity|Index|Comdty)$")
                .expect("static regex compiles"),
        }
    }

    /// Canonical/internal name -> vendor-native ticker. `None` if the name
    /// can't be expressed (never happens for the grammars this handles, kept
    /// for symmetry with [`Self::to_canonical`]).
    pub fn to_vendor(&self, name: &str) -> Option<String> {
        if let Some(exact) = self.exact.get(name) {
            return Some(exact.clone());
        }
        if name.contains('-') {
            return self.option_to_vendor(name);
        }
        if let Some((root, suffix)) = name.rsplit_once('.') {
            return Some(format!("{root} {suffix} Equity"));
        }
        if !name.contains(' ') {
            if self.index_tickers.contains(name) {
                return Some(format!("{name} Index"));
            }
            if self
                .future_prefixes
                .iter()
                .any(|prefix| name.starts_with(prefix.as_str()) && name.ends_with(|c: char| c.is_ascii_digit()))
            {
                return Some(format!("{name} Index"));
            }
            return Some(format!("{name} US Equity"));
        }
        Some(name.to_string())
    }

    fn option_to_vendor(&self, canonical: &str) -> Option<String> {
        let parts: Vec<&str> = canonical.split('-').collect();
        if parts.len() != 4 {
            return None;
        }
        let [sym, expiry, strike, kind] = [parts[0], parts[1], parts[2], parts[3]];
        let date = parse_expiry(expiry)?;
        Some(format!(
            "{sym} US {date} {kind}{strike} Equity",
            date = date.format("%m/%d/%y")
        ))
    }

    /// Vendor-native ticker -> canonical name plus the instrument metadata
    /// bootstrap needs. `None` if it matches neither the option nor the
    /// underlying grammar.
    pub fn to_canonical(&self, vendor: &str) -> Option<ParsedVendorName> {
        if let Some(caps) = self.option_regex.captures(vendor) {
            let sym = &caps[1];
            let date = NaiveDate::parse_from_str(&caps[2], "%m/%d/%y").ok()?;
            let kind = &caps[3];
            let strike: f64 = caps[4].parse().ok()?;
            let instrument_name = format!(
                "{sym}-{expiry}-{strike}-{kind}",
                expiry = format_expiry(date),
                strike = format_strike(strike)
            );
            return Some(ParsedVendorName {
                instrument_name,
                expiration_timestamp: Some(crate::symbol::expiry_timestamp_ms(date)),
                base_currency: sym.to_string(),
                quote_currency: "USD".to_string(),
            });
        }
        if let Some(caps) = self.underlying_regex.captures(vendor) {
            let sym = caps[1].to_string();
            return Some(ParsedVendorName {
                instrument_name: sym.clone(),
                expiration_timestamp: None,
                base_currency: sym,
                quote_currency: "USD".to_string(),
            });
        }
        None
    }
}

/// The canonical-shaped fields recovered from a vendor-native name, prior to
/// being wrapped as an [`crate::types::InstrumentRecord`].
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedVendorName {
    pub instrument_name: String,
    pub expiration_timestamp: Option<i64>,
    pub base_currency: String,
    pub quote_currency: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn translator() -> Translator {
        Translator::load("/nonexistent/feed_instruments.csv")
    }

    #[test]
    fn option_round_trips_through_vendor_form() {
        let t = translator();
        let vendor = t.to_vendor("SPY-20FEB26-688-C").unwrap();
        assert_eq!(vendor, "SPY US 02/20/26 C688 Equity");
        let parsed = t.to_canonical(&vendor).unwrap();
        assert_eq!(parsed.instrument_name, "SPY-20FEB26-688-C");
        assert_eq!(parsed.base_currency, "SPY");
    }

    #[test]
    fn default_index_list_applies_when_no_csv_present() {
        let t = translator();
        assert_eq!(t.to_vendor("SPX"), Some("SPX Index".to_string()));
        assert_eq!(t.to_vendor("ESZ6"), Some("ESZ6 Index".to_string()));
        assert_eq!(t.to_vendor("SPY"), Some("SPY US Equity".to_string()));
    }

    #[test]
    fn dotted_international_equity() {
        let t = translator();
        assert_eq!(t.to_vendor("0700.HK"), Some("0700 HK Equity".to_string()));
    }

    #[test]
    fn underlying_vendor_form_parses_back_to_bare_symbol() {
        let t = translator();
        let parsed = t.to_canonical("SPY US Equity").unwrap();
        assert_eq!(parsed.instrument_name, "SPY");
    }
}
