//! Payee-side steps: party lookup, quote request, transaction request,
//! transfer prepare.

use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use super::Orchestrator;
use super::state::FlowState;
use crate::error::FlowError;
use crate::fspiop::{InboundHeaders, Money, TransactionRequestState};

impl Orchestrator {
    /// GET /parties/{type}/{id}: answer with a mocked party owned by this
    /// FSP. The lookup is tracked under the party identifier.
    pub async fn on_party_lookup(
        &self,
        inbound: &InboundHeaders,
        party_id_type: &str,
        party_identifier: &str,
    ) -> Result<(), FlowError> {
        self.flows.update(party_identifier, |r| r.state = FlowState::PartyRequested);
        let ids = [party_identifier];

        let callback = self.abandon_on_err(
            &ids,
            self.builder
                .party_confirmation(inbound, party_id_type, party_identifier),
        )?;
        self.deliver_or_abandon(&callback, &ids).await?;
        self.advance_all(&ids, FlowState::PartyConfirmed);
        Ok(())
    }

    /// POST /quotes: echo the requested amount in a signed quote response.
    /// Always proceeds, whatever the amount.
    pub fn on_quote_request(
        &self,
        quote_id: &str,
        inbound: &InboundHeaders,
        payload: &Value,
    ) -> Result<(), FlowError> {
        let amount =
            Money::from_pointer(payload, "/amount").ok_or(FlowError::MissingField("amount"))?;
        let callback = self.builder.quote_response(inbound, quote_id, &amount)?;
        self.dispatcher.dispatch(callback);
        Ok(())
    }

    /// POST /transactionRequests: report RECEIVED, then request a quote on
    /// the payee's behalf. The flow record is registered under both the
    /// transaction-request id and the new quote id before the quote leaves,
    /// so the quote response can find its transaction request.
    pub async fn on_transaction_request(
        &self,
        trx_id: &str,
        inbound: &InboundHeaders,
        payload: &Value,
    ) -> Result<(), FlowError> {
        self.flows.update(trx_id, |r| {
            r.transaction_request_id = Some(trx_id.to_string());
            r.state = FlowState::TransactionRequestReceived;
        });

        let status = self.abandon_on_err(
            &[trx_id],
            self.builder.transaction_request_status(
                inbound,
                trx_id,
                TransactionRequestState::Received,
                payload.get("extensionList").cloned(),
            ),
        )?;
        self.deliver_or_abandon(&status, &[trx_id]).await?;

        let quote_id = Uuid::new_v4().to_string();
        let transaction_id = Uuid::new_v4().to_string();
        let quote = self.abandon_on_err(
            &[trx_id],
            self.builder
                .payee_quote_request(inbound, &quote_id, &transaction_id, payload),
        )?;

        let record = self.flows.update(trx_id, |r| {
            r.quote_id = Some(quote_id.clone());
            r.transfer_amount = Money::from_pointer(payload, "/amount");
            r.state = FlowState::QuoteRequested;
        });
        self.flows.link(&quote_id, record);

        info!(
            transaction_request_id = %trx_id,
            quote_id = %quote_id,
            "Requesting quote for transaction request"
        );
        self.deliver_or_abandon(&quote, &[trx_id, quote_id.as_str()]).await
    }

    /// POST /transfers: answer with a signed COMMITTED fulfilment unless
    /// fulfilment is suppressed.
    pub async fn on_transfer_prepare(
        &self,
        transfer_id: &str,
        inbound: &InboundHeaders,
    ) -> Result<(), FlowError> {
        let ids = self.linked_ids(transfer_id);
        let ids: Vec<&str> = ids.iter().map(String::as_str).collect();

        if self.suppress_transfer_fulfilment {
            info!(transfer_id = %transfer_id, "Transfer fulfilment suppressed");
            self.advance_all(&ids, FlowState::TransferFulfilled);
            return Ok(());
        }

        let callback = self.abandon_on_err(&ids, self.builder.transfer_fulfil(inbound, transfer_id))?;
        self.deliver_or_abandon(&callback, &ids).await?;
        self.advance_all(&ids, FlowState::TransferFulfilled);
        Ok(())
    }
}
