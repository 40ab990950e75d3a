use std::fmt;
use std::sync::Arc;

use crate::orchestrator::Orchestrator;
use crate::store::{CorrelationStore, FlowRegistry};

/// Which simulated participant a route belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Payer,
    Payee,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Payer => "payer",
            Side::Payee => "payee",
        }
    }

    /// Log prefix, e.g. `IN PAYERFSP::`
    pub fn tag(&self) -> &'static str {
        match self {
            Side::Payer => "IN PAYERFSP::",
            Side::Payee => "IN PAYEEFSP::",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Gateway shared state
#[derive(Clone)]
pub struct AppState {
    /// Snapshots received by the payer FSP
    pub payer: Arc<CorrelationStore>,
    /// Snapshots received by the payee FSP
    pub payee: Arc<CorrelationStore>,
    pub orchestrator: Arc<Orchestrator>,
}

impl AppState {
    pub fn new(
        payer: Arc<CorrelationStore>,
        payee: Arc<CorrelationStore>,
        orchestrator: Arc<Orchestrator>,
    ) -> Self {
        Self {
            payer,
            payee,
            orchestrator,
        }
    }

    pub fn store(&self, side: Side) -> &CorrelationStore {
        match side {
            Side::Payer => &self.payer,
            Side::Payee => &self.payee,
        }
    }

    pub fn flows(&self) -> &Arc<FlowRegistry> {
        self.orchestrator.flows()
    }
}
