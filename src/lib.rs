//! Multi-venue market-data aggregation under one canonical instrument
//! schema: a [`manager::FeedManager`] holds the state, per-venue
//! [`adapter::Adapter`] implementations translate vendor-native names and
//! stream ticker updates into it, and [`planner`] turns a moneyness window
//! into a concrete subscription request.

pub mod adapter;
pub mod config;
pub mod error;
pub mod manager;
pub mod planner;
pub mod symbol;
pub mod types;

pub mod adapters;

pub use adapter::Adapter;
pub use manager::FeedManager;
pub use types::{Credentials, InstrumentRecord, MarketSnapshot, Settlement, TabConfig, Ticker};
