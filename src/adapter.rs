//! The adapter contract every vendor integration implements, plus the
//! session state machine shape shared by their streaming loops.

use std::sync::Arc;

use async_trait::async_trait;

use crate::manager::FeedManager;
use crate::types::{InstrumentRecord, TabConfig};

/// Every adapter exposes exactly this surface to the [`FeedManager`]. None
/// of its methods return a `Result` — failures degrade to empty/zero/no-op
/// values, never surfaced as errors to the manager or its callers.
#[async_trait]
pub trait Adapter: Send + Sync {
    /// The adapter key this instance was registered under (`"deribit"`, …).
    fn name(&self) -> &str;

    /// Starts the long-lived streaming session as a background task. Must
    /// be idempotent: calling `start` while already started is a no-op.
    async fn start(self: Arc<Self>, manager: Arc<FeedManager>);

    /// Signals the session to stop and closes its transport. Idempotent.
    fn stop(&self);

    /// Synchronous (relative to the caller) REST/RPC fetch of the option
    /// chain for one tab. Empty on any failure; never panics.
    async fn get_option_chain(&self, cfg: &TabConfig) -> Vec<InstrumentRecord>;

    /// Fetches the latest price for one canonical name. `0.0` on failure.
    async fn get_latest_price(&self, canonical_name: &str) -> f64;

    /// Subscribes to a batch of canonical names. Dedups against the
    /// session's own `active_subscriptions`; a no-op if the session isn't
    /// currently streaming or if every name is already subscribed.
    fn subscribe(&self, channels: Vec<String>);

    /// The ordered list of canonical reference-ticker names (index/perp/spot)
    /// that serve as the underlying price reference for this tab.
    fn get_reference_tickers(&self, cfg: &TabConfig) -> Vec<String>;

    /// Whether the streaming session is currently in the `Streaming` state.
    /// Sampled without a lock; transient false-negatives are acceptable.
    fn connected(&self) -> bool;
}

/// Per-session connection state. Purely for tracing/diagnostics — the only
/// externally observable bit derived from it is [`Adapter::connected`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Connecting,
    Authenticating,
    Streaming,
    Backoff,
    Stopped,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Authenticating => "authenticating",
            Self::Streaming => "streaming",
            Self::Backoff => "backoff",
            Self::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

/// Minimum time spent in `Backoff` before attempting to reconnect. A fixed
/// interval, not exponential — see DESIGN.md for the reasoning.
pub const BACKOFF: std::time::Duration = std::time::Duration::from_secs(2);
