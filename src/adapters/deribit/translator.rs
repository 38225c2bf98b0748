//! Deribit's translator: Deribit's own instrument names are already close
//! to canonical (`BTC-8JAN21-16000-C`), so the only real
//! translation work is the base-symbol override table, grounded in
//! `examples/original_source/src/market_feed/adapters/deribit.py`'s
//! `exact_map`/`reverse_map`.

use std::collections::HashMap;

use crate::config::{load_symbol_table, Directive};

/// Bidirectional `exact:<v>` override table: internal base symbol (`BTC`)
/// vs. vendor-native reference symbol (`BTC_USDC`).
#[derive(Debug, Clone, Default)]
pub struct Translator {
    exact: HashMap<String, String>,
    reverse: HashMap<String, String>,
}

impl Translator {
    pub fn load(symbol_table_path: impl AsRef<std::path::Path>) -> Self {
        let mut exact = HashMap::new();
        let mut reverse = HashMap::new();
        for (symbol, directive) in load_symbol_table(symbol_table_path, "deribit") {
            if let Directive::Exact(vendor) = directive {
                reverse.insert(vendor.clone(), symbol.clone());
                exact.insert(symbol, vendor);
            }
        }
        Self { exact, reverse }
    }

    /// Internal/canonical name -> vendor-native name, falling through to the
    /// input unchanged when no override applies.
    pub fn to_vendor<'a>(&'a self, canonical: &'a str) -> &'a str {
        self.exact.get(canonical).map(String::as_str).unwrap_or(canonical)
    }

    /// Vendor-native name -> canonical name, same passthrough fallback.
    pub fn to_canonical<'a>(&'a self, vendor: &'a str) -> &'a str {
        self.reverse.get(vendor).map(String::as_str).unwrap_or(vendor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unconfigured_name_passes_through_unchanged() {
        let t = Translator::default();
        assert_eq!(t.to_vendor("BTC-8JAN21-16000-C"), "BTC-8JAN21-16000-C");
        assert_eq!(t.to_canonical("BTC_USDC"), "BTC_USDC");
    }

    #[test]
    fn exact_override_round_trips() {
        let mut t = Translator::default();
        t.exact.insert("BTC".to_string(), "BTC_USDC".to_string());
        t.reverse.insert("BTC_USDC".to_string(), "BTC".to_string());

        assert_eq!(t.to_vendor("BTC"), "BTC_USDC");
        assert_eq!(t.to_canonical("BTC_USDC"), "BTC");
        assert_eq!(t.to_canonical(t.to_vendor("BTC")), "BTC");
    }
}
