//! Payer-side steps: quote response, authorization response, transfer
//! notification.

use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use super::Orchestrator;
use super::state::FlowState;
use crate::classifier::ProtocolOutcome;
use crate::error::FlowError;
use crate::fspiop::{InboundHeaders, Money, TransactionRequestState};

impl Orchestrator {
    /// PUT /quotes/{id} received by the payer. The transfer amount decides
    /// whether the flow is rejected, needs OTP authorization or goes straight
    /// to transfer.
    pub async fn on_quote_response(
        &self,
        quote_id: &str,
        inbound: &InboundHeaders,
        payload: &Value,
    ) -> Result<(), FlowError> {
        let amount = payload
            .pointer("/transferAmount/amount")
            .and_then(Value::as_str);
        let outcome = self.classifier.classify(amount);

        let record = self.flows.update(quote_id, |r| {
            r.quote_id = Some(quote_id.to_string());
            r.state = FlowState::QuoteResponded;
        });
        let trx_id = record.transaction_request_id;
        if let Some(trx_id) = trx_id.as_deref() {
            self.flows.advance(trx_id, FlowState::QuoteResponded);
        }

        info!(
            quote_id = %quote_id,
            transaction_request_id = ?trx_id,
            amount = ?amount,
            outcome = %outcome,
            "Quote response classified"
        );

        match outcome {
            ProtocolOutcome::Rejected => {
                let Some(trx_id) = trx_id else {
                    warn!(quote_id = %quote_id, "Rejected amount but no transaction request for quote");
                    return Ok(());
                };
                self.reject_transaction_request(quote_id, &trx_id, inbound, payload)
                    .await
            }
            ProtocolOutcome::OtpVerification => {
                let Some(trx_id) = trx_id else {
                    warn!(quote_id = %quote_id, "OTP amount but no transaction request for quote");
                    return Ok(());
                };
                self.request_authorization(quote_id, &trx_id, inbound, payload)
                    .await
            }
            ProtocolOutcome::Normal => {
                let mut flow_ids = vec![quote_id];
                flow_ids.extend(trx_id.as_deref());

                let transfer_amount = self.abandon_on_err(
                    &flow_ids,
                    Money::from_pointer(payload, "/transferAmount")
                        .ok_or(FlowError::MissingField("transferAmount")),
                )?;
                let material = self.builder.material();
                let ilp_packet = payload
                    .get("ilpPacket")
                    .and_then(Value::as_str)
                    .unwrap_or(&material.ilp_packet);
                let condition = payload
                    .get("condition")
                    .and_then(Value::as_str)
                    .unwrap_or(&material.condition);

                self.initiate_transfer(inbound, &flow_ids, &transfer_amount, ilp_packet, condition)
                    .await
            }
        }
    }

    async fn reject_transaction_request(
        &self,
        quote_id: &str,
        trx_id: &str,
        inbound: &InboundHeaders,
        payload: &Value,
    ) -> Result<(), FlowError> {
        let flow_ids = [quote_id, trx_id];
        let callback = self.abandon_on_err(
            &flow_ids,
            self.builder.transaction_request_status(
                inbound,
                trx_id,
                TransactionRequestState::Rejected,
                payload.get("extensionList").cloned(),
            ),
        )?;

        self.deliver_or_abandon(&callback, &flow_ids).await?;
        self.advance_all(&flow_ids, FlowState::TransactionRequestRejected);
        info!(transaction_request_id = %trx_id, "Transaction request rejected");
        Ok(())
    }

    /// Ask the authorization service for an OTP; the flow resumes on
    /// PUT /authorizations/{trx_id}.
    async fn request_authorization(
        &self,
        quote_id: &str,
        trx_id: &str,
        inbound: &InboundHeaders,
        payload: &Value,
    ) -> Result<(), FlowError> {
        let flow_ids = [quote_id, trx_id];
        let amount = self.abandon_on_err(
            &flow_ids,
            Money::from_pointer(payload, "/transferAmount")
                .ok_or(FlowError::MissingField("transferAmount")),
        )?;

        for id in flow_ids {
            self.flows.update(id, |r| {
                r.transfer_amount = Some(amount.clone());
                r.state = FlowState::AwaitingAuthorization;
            });
        }

        let callback = self.abandon_on_err(
            &flow_ids,
            self.builder.authorization_request(inbound, trx_id, &amount),
        )?;
        self.deliver_or_abandon(&callback, &flow_ids).await
    }

    /// PUT /authorizations/{id} received by the payer: resume the suspended
    /// flow with the amount stored when authorization was requested.
    pub async fn on_authorization_response(
        &self,
        trx_id: &str,
        inbound: &InboundHeaders,
    ) -> Result<(), FlowError> {
        let record = self
            .flows
            .get(trx_id)
            .ok_or_else(|| FlowError::MissingFlowRecord(trx_id.to_string()))?;

        let mut flow_ids = vec![trx_id];
        flow_ids.extend(record.quote_id.as_deref());
        self.advance_all(&flow_ids, FlowState::AuthorizationReceived);

        let amount = self.abandon_on_err(
            &flow_ids,
            record
                .transfer_amount
                .ok_or(FlowError::MissingField("transferAmount")),
        )?;
        let material = self.builder.material();

        self.initiate_transfer(
            inbound,
            &flow_ids,
            &amount,
            &material.ilp_packet,
            &material.condition,
        )
        .await
    }

    /// POST /transfers under a fresh transfer id
    pub async fn initiate_transfer(
        &self,
        inbound: &InboundHeaders,
        flow_ids: &[&str],
        amount: &Money,
        ilp_packet: &str,
        condition: &str,
    ) -> Result<(), FlowError> {
        let transfer_id = Uuid::new_v4().to_string();
        let callback = self.abandon_on_err(
            flow_ids,
            self.builder
                .transfer_prepare(inbound, &transfer_id, amount, ilp_packet, condition),
        )?;

        let mut last = None;
        for id in flow_ids {
            last = Some(self.flows.update(id, |r| {
                r.transfer_id = Some(transfer_id.clone());
                r.transfer_amount = Some(amount.clone());
                r.ilp_packet = Some(ilp_packet.to_string());
                r.condition = Some(condition.to_string());
                r.state = FlowState::TransferInitiated;
            }));
        }
        if let Some(record) = last {
            self.flows.link(&transfer_id, record);
        }

        info!(
            transfer_id = %transfer_id,
            amount = %amount.amount,
            currency = %amount.currency,
            "Initiating transfer"
        );

        let mut tracked = flow_ids.to_vec();
        tracked.push(&transfer_id);
        self.deliver_or_abandon(&callback, &tracked).await
    }

    /// PUT /transfers/{id} received by the payer
    pub fn on_transfer_notification(&self, transfer_id: &str, payload: &Value) {
        let state = payload.get("transferState").and_then(Value::as_str);
        if state != Some("COMMITTED") {
            return;
        }
        let ids = self.linked_ids(transfer_id);
        let ids: Vec<&str> = ids.iter().map(String::as_str).collect();
        self.advance_all(&ids, FlowState::TransferFulfilled);
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{orchestrator, to_payer};
    use super::*;
    use crate::fspiop::{HttpMethod, Resource};
    use crate::store::FlowRecord;
    use serde_json::json;

    fn quote_payload(amount: &str) -> Value {
        json!({
            "transferAmount": {"amount": amount, "currency": "USD"},
            "expiration": "2026-10-18T10:00:00.000Z",
            "ilpPacket": "pkt-from-quote",
            "condition": "cond-from-quote"
        })
    }

    fn register_trx(orch: &Orchestrator, trx_id: &str, quote_id: &str) {
        let record = orch.flows().update(trx_id, |r| {
            r.transaction_request_id = Some(trx_id.to_string());
            r.quote_id = Some(quote_id.to_string());
            r.state = FlowState::QuoteRequested;
        });
        orch.flows().link(quote_id, record);
    }

    #[tokio::test]
    async fn test_no_ranges_goes_straight_to_transfer() {
        let (orch, mock) = orchestrator(None, None, false);
        orch.on_quote_response("q-1", &to_payer(), &quote_payload("100"))
            .await
            .unwrap();

        let sent = mock.sent();
        assert_eq!(sent.len(), 1);
        let prepare = &sent[0];
        assert_eq!(prepare.resource, Resource::Transfers);
        assert_eq!(prepare.method, HttpMethod::Post);

        let body = prepare.body_json().unwrap();
        assert_eq!(body["amount"]["amount"], "100");
        assert_eq!(body["payerFsp"], "payerfsp");
        assert_eq!(body["payeeFsp"], "payeefsp");
        assert_eq!(body["ilpPacket"], "pkt-from-quote");
        assert_eq!(body["condition"], "cond-from-quote");

        let transfer_id = body["transferId"].as_str().unwrap();
        let record = orch.flows().get(transfer_id).unwrap();
        assert_eq!(record.state, FlowState::TransferInitiated);
        assert_eq!(record.quote_id.as_deref(), Some("q-1"));
    }

    #[tokio::test]
    async fn test_rejected_sends_one_status_and_no_prepare() {
        let (orch, mock) = orchestrator(Some("10-20"), None, false);
        register_trx(&orch, "trx-1", "q-1");

        let mut payload = quote_payload("15");
        payload["extensionList"] = json!({"extension": [{"key": "k", "value": "v"}]});
        orch.on_quote_response("q-1", &to_payer(), &payload)
            .await
            .unwrap();

        let sent = mock.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].resource, Resource::TransactionRequests);
        assert_eq!(sent[0].url, "http://trx/transactionRequests/trx-1");
        let body = sent[0].body_json().unwrap();
        assert_eq!(body["transactionRequestState"], "REJECTED");
        assert_eq!(body["extensionList"]["extension"][0]["key"], "k");
        assert!(mock.sent_matching(Resource::Transfers, HttpMethod::Post).is_empty());

        assert_eq!(
            orch.flows().get("trx-1").unwrap().state,
            FlowState::TransactionRequestRejected
        );
    }

    #[tokio::test]
    async fn test_rejected_without_transaction_request_sends_nothing() {
        let (orch, mock) = orchestrator(Some("10-20"), None, false);
        orch.on_quote_response("q-9", &to_payer(), &quote_payload("10"))
            .await
            .unwrap();
        assert_eq!(mock.count(), 0);
    }

    #[tokio::test]
    async fn test_otp_then_authorization_resumes_transfer() {
        let (orch, mock) = orchestrator(None, Some("50-60"), false);
        register_trx(&orch, "trx-2", "q-2");

        orch.on_quote_response("q-2", &to_payer(), &quote_payload("55"))
            .await
            .unwrap();

        let sent = mock.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].resource, Resource::Authorizations);
        assert_eq!(
            sent[0].url,
            "http://auth/authorizations/trx-2?authenticationType=OTP&retriesLeft=3&amount=55&currency=USD"
        );
        let record = orch.flows().get("trx-2").unwrap();
        assert_eq!(record.state, FlowState::AwaitingAuthorization);
        assert_eq!(record.transfer_amount, Some(Money::new("55", "USD")));

        orch.on_authorization_response("trx-2", &to_payer())
            .await
            .unwrap();

        let prepares = mock.sent_matching(Resource::Transfers, HttpMethod::Post);
        assert_eq!(prepares.len(), 1);
        let body = prepares[0].body_json().unwrap();
        assert_eq!(body["amount"], json!({"amount": "55", "currency": "USD"}));
        assert_eq!(body["condition"], orch.builder.material().condition);
        assert_eq!(body["ilpPacket"], orch.builder.material().ilp_packet);
    }

    #[tokio::test]
    async fn test_concurrent_otp_flows_keep_their_own_amount() {
        let (orch, mock) = orchestrator(None, Some("50-60"), false);
        register_trx(&orch, "trx-a", "q-a");
        register_trx(&orch, "trx-b", "q-b");

        orch.on_quote_response("q-a", &to_payer(), &quote_payload("51"))
            .await
            .unwrap();
        orch.on_quote_response("q-b", &to_payer(), &quote_payload("59"))
            .await
            .unwrap();
        orch.on_authorization_response("trx-a", &to_payer())
            .await
            .unwrap();

        let prepares = mock.sent_matching(Resource::Transfers, HttpMethod::Post);
        assert_eq!(prepares.len(), 1);
        assert_eq!(prepares[0].body_json().unwrap()["amount"]["amount"], "51");
    }

    #[tokio::test]
    async fn test_authorization_without_flow_record() {
        let (orch, mock) = orchestrator(None, Some("50-60"), false);
        let err = orch
            .on_authorization_response("unknown", &to_payer())
            .await
            .unwrap_err();
        assert!(matches!(err, FlowError::MissingFlowRecord(_)));
        assert_eq!(mock.count(), 0);
    }

    #[tokio::test]
    async fn test_failed_send_abandons_flow() {
        let (orch, mock) = orchestrator(Some("10-20"), None, false);
        mock.set_status(Some(500));
        register_trx(&orch, "trx-3", "q-3");

        let err = orch
            .on_quote_response("q-3", &to_payer(), &quote_payload("12"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "UNEXPECTED_STATUS");
        assert_eq!(orch.flows().get("trx-3").unwrap().state, FlowState::Abandoned);
        assert_eq!(orch.flows().get("q-3").unwrap().state, FlowState::Abandoned);
    }

    #[tokio::test]
    async fn test_commit_notification_fulfils_flow() {
        let (orch, _mock) = orchestrator(None, None, false);
        orch.flows().link(
            "t-1",
            FlowRecord {
                quote_id: Some("q-1".into()),
                transfer_id: Some("t-1".into()),
                state: FlowState::TransferInitiated,
                ..FlowRecord::default()
            },
        );
        orch.flows().update("q-1", |r| r.state = FlowState::TransferInitiated);

        orch.on_transfer_notification("t-1", &json!({"transferState": "RESERVED"}));
        assert_eq!(orch.flows().get("t-1").unwrap().state, FlowState::TransferInitiated);

        orch.on_transfer_notification("t-1", &json!({"transferState": "COMMITTED"}));
        assert_eq!(orch.flows().get("t-1").unwrap().state, FlowState::TransferFulfilled);
        assert_eq!(orch.flows().get("q-1").unwrap().state, FlowState::TransferFulfilled);
    }
}
