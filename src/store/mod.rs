//! Correlation Store
//!
//! Three independent stages, all keyed by the protocol correlation id
//! (quote id, transaction-request id or transfer id):
//!
//! - [`Stage::Request`]: one-shot snapshot of the inbound request, read-and-delete
//! - [`Stage::Correlation`]: latest payload per id, overwritten on every step
//! - [`Stage::Callback`]: one-shot snapshot of the latest inbound callback, read-and-delete
//!
//! Duplicate deliveries overwrite (last write wins); nothing is merged.
//! The shared per-flow registry lives in [`flows`].

pub mod flows;
pub mod ttl_map;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use crate::fspiop::InboundHeaders;
pub use flows::{FlowRecord, FlowRegistry};
pub use ttl_map::TtlMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Request,
    Correlation,
    Callback,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Request => "request",
            Stage::Correlation => "correlation",
            Stage::Callback => "callback",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Verbatim snapshot of one inbound request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CachedEnvelope {
    pub headers: BTreeMap<String, String>,
    pub data: Value,
}

impl CachedEnvelope {
    pub fn new(headers: &InboundHeaders, data: Value) -> Self {
        Self {
            headers: headers.as_map().clone(),
            data,
        }
    }
}

/// One simulated participant's snapshots
#[derive(Debug)]
pub struct CorrelationStore {
    requests: TtlMap<CachedEnvelope>,
    correlations: TtlMap<CachedEnvelope>,
    callbacks: TtlMap<CachedEnvelope>,
}

impl CorrelationStore {
    /// `ttl = None` keeps entries until read-and-delete
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            requests: TtlMap::new(ttl),
            correlations: TtlMap::new(ttl),
            callbacks: TtlMap::new(ttl),
        }
    }

    /// From a config value where 0 disables expiry
    pub fn with_ttl_secs(secs: u64) -> Self {
        Self::new((secs > 0).then(|| Duration::from_secs(secs)))
    }

    fn stage(&self, stage: Stage) -> &TtlMap<CachedEnvelope> {
        match stage {
            Stage::Request => &self.requests,
            Stage::Correlation => &self.correlations,
            Stage::Callback => &self.callbacks,
        }
    }

    pub fn put(&self, stage: Stage, id: &str, envelope: CachedEnvelope) {
        if self.stage(stage).put(id, envelope).is_some() {
            tracing::debug!(stage = %stage, id = %id, "Overwrote previous snapshot");
        }
    }

    pub fn get(&self, stage: Stage, id: &str) -> Option<CachedEnvelope> {
        self.stage(stage).get(id)
    }

    /// Atomic read-and-delete: concurrent callers never both receive the entry
    pub fn take_and_clear(&self, stage: Stage, id: &str) -> Option<CachedEnvelope> {
        self.stage(stage).take(id)
    }

    /// Inbound request (payee side: POST/GET that starts a flow)
    pub fn record_request(&self, id: &str, envelope: CachedEnvelope) {
        self.put(Stage::Correlation, id, envelope.clone());
        self.put(Stage::Request, id, envelope);
    }

    /// Inbound callback (PUT success or error)
    pub fn record_callback(&self, id: &str, envelope: CachedEnvelope) {
        self.put(Stage::Correlation, id, envelope.clone());
        self.put(Stage::Callback, id, envelope);
    }

    pub fn purge_expired(&self) -> usize {
        self.requests.purge_expired()
            + self.correlations.purge_expired()
            + self.callbacks.purge_expired()
    }
}

/// Periodically reclaim expired entries from every store
pub fn spawn_sweeper(
    stores: Vec<Arc<CorrelationStore>>,
    flows: Arc<FlowRegistry>,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let removed: usize =
                stores.iter().map(|s| s.purge_expired()).sum::<usize>() + flows.purge_expired();
            if removed > 0 {
                tracing::debug!(removed, "[store] Purged expired entries");
            }
        }
    })
}
