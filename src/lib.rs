//! FSP Simulator - payer/payee test double for interoperability switches
//!
//! Acknowledges inbound protocol requests immediately, then plays the
//! counter-party's part out of band by building and sending the matching
//! asynchronous callbacks.
//!
//! # Modules
//!
//! - [`fspiop`] - Protocol vocabulary and the Signed-Callback Builder
//! - [`classifier`] - Amount-driven outcome selection
//! - [`store`] - Correlation snapshots and per-flow records
//! - [`dispatch`] - Outbound delivery, detached task boundary
//! - [`orchestrator`] - Step-by-step protocol decisions
//! - [`gateway`] - HTTP surface for both simulated participants

pub mod classifier;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod fspiop;
pub mod gateway;
pub mod logging;
pub mod orchestrator;
pub mod store;

// Convenient re-exports at crate root
pub use classifier::{AmountRange, OutcomeClassifier, ProtocolOutcome, classify};
pub use config::AppConfig;
pub use dispatch::{HttpTransport, MockTransport, OutboundDispatcher, Transport};
pub use error::{DispatchError, FlowError, SignError, SimulatorError};
pub use orchestrator::Orchestrator;
pub use orchestrator::state::FlowState;
pub use store::{CachedEnvelope, CorrelationStore, FlowRecord, FlowRegistry, Stage};
