//! Per-flow records.
//!
//! Stitches the transaction-request → quote → authorization → transfer steps
//! together. A record is stored under every correlation id the flow has
//! used so far (transaction-request id, quote id, transfer id), so each
//! inbound step can find its flow by the id it carries.

use std::time::Duration;

use serde::Serialize;

use super::ttl_map::TtlMap;
use crate::fspiop::TransferAmount;
use crate::orchestrator::state::FlowState;

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowRecord {
    pub transaction_request_id: Option<String>,
    pub quote_id: Option<String>,
    pub transfer_id: Option<String>,
    /// Amount agreed in the quote, reused after OTP authorization
    pub transfer_amount: Option<TransferAmount>,
    pub ilp_packet: Option<String>,
    pub condition: Option<String>,
    #[serde(serialize_with = "serialize_state")]
    pub state: FlowState,
}

fn serialize_state<S: serde::Serializer>(state: &FlowState, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(state.as_str())
}

#[derive(Debug)]
pub struct FlowRegistry {
    records: TtlMap<FlowRecord>,
}

impl FlowRegistry {
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            records: TtlMap::new(ttl),
        }
    }

    pub fn with_ttl_secs(secs: u64) -> Self {
        Self::new((secs > 0).then(|| Duration::from_secs(secs)))
    }

    pub fn get(&self, id: &str) -> Option<FlowRecord> {
        self.records.get(id)
    }

    /// Mutate (or create) the record under `id` atomically, returning the result
    pub fn update<F>(&self, id: &str, f: F) -> FlowRecord
    where
        F: FnOnce(&mut FlowRecord),
    {
        self.records.upsert(id, FlowRecord::default, f)
    }

    /// Store `record` under an additional id
    pub fn link(&self, id: &str, record: FlowRecord) {
        self.records.put(id, record);
    }

    /// Move the record under `id` to `state`. Unknown ids are ignored.
    pub fn advance(&self, id: &str, state: FlowState) {
        if self.records.get(id).is_none() {
            return;
        }
        self.records.upsert(id, FlowRecord::default, |r| {
            if r.state.is_terminal() {
                tracing::warn!(id = %id, from = %r.state, to = %state, "Flow re-entered after terminal state");
            }
            r.state = state;
        });
    }

    pub fn purge_expired(&self) -> usize {
        self.records.purge_expired()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_creates_and_mutates() {
        let flows = FlowRegistry::new(None);
        let rec = flows.update("trx-1", |r| {
            r.transaction_request_id = Some("trx-1".into());
            r.state = FlowState::TransactionRequestReceived;
        });
        assert_eq!(rec.transaction_request_id.as_deref(), Some("trx-1"));

        let rec = flows.update("trx-1", |r| r.quote_id = Some("q-1".into()));
        assert_eq!(rec.transaction_request_id.as_deref(), Some("trx-1"));
        assert_eq!(rec.quote_id.as_deref(), Some("q-1"));
        assert_eq!(rec.state, FlowState::TransactionRequestReceived);
    }

    #[test]
    fn test_link_and_advance() {
        let flows = FlowRegistry::new(None);
        let rec = flows.update("trx-1", |r| r.transaction_request_id = Some("trx-1".into()));
        flows.link("q-1", rec);

        flows.advance("q-1", FlowState::QuoteResponded);
        assert_eq!(flows.get("q-1").unwrap().state, FlowState::QuoteResponded);
        // links are copies: the original id keeps its own state
        assert_eq!(flows.get("trx-1").unwrap().state, FlowState::PartyRequested);

        flows.advance("unknown", FlowState::Abandoned);
        assert!(flows.get("unknown").is_none());
    }

    #[test]
    fn test_serializes_state_name() {
        let rec = FlowRecord {
            state: FlowState::AwaitingAuthorization,
            ..FlowRecord::default()
        };
        let value = serde_json::to_value(&rec).unwrap();
        assert_eq!(value["state"], "AWAITING_AUTHORIZATION");
        assert!(value["transferAmount"].is_null());
    }
}
