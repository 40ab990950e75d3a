//! Protocol Orchestrator
//!
//! Decides, for each inbound protocol step, whether the flow continues,
//! branches into a rejection or branches into OTP authorization, and triggers
//! the builder and dispatcher accordingly. See [`state`] for the per-id
//! state machine.
//!
//! Steps run detached from the inbound request; the handler has already
//! acknowledged by the time any outbound call is made.

pub mod payee;
pub mod payer;
pub mod state;

use std::future::Future;
use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::classifier::OutcomeClassifier;
use crate::config::AppConfig;
use crate::dispatch::{OutboundDispatcher, Transport};
use crate::error::FlowError;
use crate::fspiop::{CallbackBuilder, OutboundCallback, Signer};
use crate::store::FlowRegistry;
use state::FlowState;

pub struct Orchestrator {
    builder: CallbackBuilder,
    classifier: OutcomeClassifier,
    dispatcher: OutboundDispatcher,
    flows: Arc<FlowRegistry>,
    suppress_transfer_fulfilment: bool,
}

impl Orchestrator {
    pub fn new(
        builder: CallbackBuilder,
        classifier: OutcomeClassifier,
        dispatcher: OutboundDispatcher,
        flows: Arc<FlowRegistry>,
        suppress_transfer_fulfilment: bool,
    ) -> Self {
        Self {
            builder,
            classifier,
            dispatcher,
            flows,
            suppress_transfer_fulfilment,
        }
    }

    /// Wire everything from configuration
    pub fn from_config(
        config: &AppConfig,
        signer: Arc<dyn Signer>,
        transport: Arc<dyn Transport>,
        flows: Arc<FlowRegistry>,
    ) -> Self {
        Self::new(
            CallbackBuilder::new(
                config.endpoints.clone(),
                config.test_material.clone(),
                signer,
            ),
            OutcomeClassifier::from_config(
                config.flows.rejected_amount_range.as_deref(),
                config.flows.otp_amount_range.as_deref(),
            ),
            OutboundDispatcher::new(transport),
            flows,
            config.flows.suppress_transfer_fulfilment,
        )
    }

    pub fn flows(&self) -> &Arc<FlowRegistry> {
        &self.flows
    }

    /// Run a step detached from the inbound request
    pub fn spawn_flow<F>(&self, fsp: &'static str, operation: &'static str, flow: F) -> JoinHandle<()>
    where
        F: Future<Output = Result<(), FlowError>> + Send + 'static,
    {
        self.dispatcher.spawn_flow(fsp, operation, flow)
    }

    /// Deliver, marking every id of the flow abandoned when the
    /// counter-party does not acknowledge.
    async fn deliver_or_abandon(
        &self,
        callback: &OutboundCallback,
        flow_ids: &[&str],
    ) -> Result<(), FlowError> {
        let result = self.dispatcher.deliver(callback).await;
        if result.is_err() {
            self.advance_all(flow_ids, FlowState::Abandoned);
        }
        Ok(result?)
    }

    /// Same as [`Self::deliver_or_abandon`] for a failed build step
    fn abandon_on_err<T>(&self, flow_ids: &[&str], result: Result<T, FlowError>) -> Result<T, FlowError> {
        if result.is_err() {
            self.advance_all(flow_ids, FlowState::Abandoned);
        }
        result
    }

    fn advance_all(&self, ids: &[&str], state: FlowState) {
        for id in ids {
            self.flows.advance(id, state);
        }
    }

    /// `id` plus the other ids its flow record is stored under
    fn linked_ids(&self, id: &str) -> Vec<String> {
        let mut ids = vec![id.to_string()];
        if let Some(record) = self.flows.get(id) {
            for other in [
                record.transaction_request_id,
                record.quote_id,
                record.transfer_id,
            ]
            .into_iter()
            .flatten()
            {
                if !ids.contains(&other) {
                    ids.push(other);
                }
            }
        }
        ids
    }
}
