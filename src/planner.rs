//! The Subscription Planner: given a tab, a set of target expiries and a
//! moneyness window, compute the strike-by-expiry structure and forward the
//! subscription request to the responsible adapter.

use std::collections::{BTreeMap, HashSet};

use ordered_float::OrderedFloat;

use crate::manager::FeedManager;
use crate::symbol::parse_canonical_option;

/// Call/put canonical names at one strike. Either side may be absent if the
/// chain doesn't list that leg.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StrikePair {
    pub call: Option<String>,
    pub put: Option<String>,
}

/// The strikes known for one expiry, in ascending order, plus the
/// strike -> {call, put} lookup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpiryStrikes {
    pub strikes: Vec<f64>,
    pub map: BTreeMap<OrderedFloat<f64>, StrikePair>,
}

/// `DDMMMYY -> ExpiryStrikes`, the planner's output structure.
pub type SubscriptionStructure = BTreeMap<String, ExpiryStrikes>;

/// Resolves a tab's reference price, filters its option chain to the target
/// expiries and moneyness window, and returns the resulting strike-by-expiry
/// structure. Also forwards the computed subscription list to the tab's
/// adapter as a side effect, not reflected in the return value.
pub fn get_subscription_map(
    manager: &FeedManager,
    tab_name: &str,
    target_dates: &HashSet<String>,
    min_pct: f64,
    max_pct: f64,
) -> SubscriptionStructure {
    let Some(cfg) = manager.tab_config(tab_name).cloned() else {
        return SubscriptionStructure::new();
    };
    let Some(adapter) = manager.adapter(&cfg.source) else {
        return SubscriptionStructure::new();
    };
    let adapter = adapter.clone();

    let reference_tickers = adapter.get_reference_tickers(&cfg);
    let spot = reference_tickers
        .iter()
        .find_map(|name| manager.index_price(name).filter(|p| *p > 0.0));
    let Some(spot) = spot else {
        return SubscriptionStructure::new();
    };

    let lo = spot * (1.0 + min_pct / 100.0);
    let hi = spot * (1.0 + max_pct / 100.0);

    let mut subs_to_send: Vec<String> = reference_tickers.clone();
    let mut structure = SubscriptionStructure::new();

    for inst in manager.instruments_for_tab(tab_name) {
        let Some(parsed) = parse_canonical_option(&inst.instrument_name) else {
            continue;
        };
        if !target_dates.contains(parsed.expiry) || parsed.strike < lo || parsed.strike > hi {
            continue;
        }

        let entry = structure.entry(parsed.expiry.to_string()).or_default();
        let key = OrderedFloat(parsed.strike);
        if !entry.map.contains_key(&key) {
            entry.strikes.push(parsed.strike);
            entry.map.insert(key, StrikePair::default());
        }
        let pair = entry.map.get_mut(&key).expect("just inserted");
        match parsed.kind {
            crate::symbol::OptionKind::Call => {
                if pair.call.is_none() {
                    pair.call = Some(inst.instrument_name.clone());
                }
            }
            crate::symbol::OptionKind::Put => {
                if pair.put.is_none() {
                    pair.put = Some(inst.instrument_name.clone());
                }
            }
        }
        subs_to_send.push(inst.instrument_name);
    }

    for expiry in structure.values_mut() {
        expiry.strikes.sort_by(|a, b| a.partial_cmp(b).unwrap());
    }

    if adapter.connected() {
        adapter.subscribe(subs_to_send);
    }

    structure
}
