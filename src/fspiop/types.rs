//! Wire payloads exchanged with counter-parties.
//!
//! Inbound bodies are kept as raw JSON (they are cached verbatim); only the
//! fields the orchestrator needs are pulled out through the helpers here.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Amount + ISO 4217 currency, amount kept as the decimal string sent on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    pub amount: String,
    pub currency: String,
}

impl Money {
    pub fn new(amount: impl Into<String>, currency: impl Into<String>) -> Self {
        Self {
            amount: amount.into(),
            currency: currency.into(),
        }
    }

    /// Read a `{amount, currency}` object at a JSON pointer
    pub fn from_pointer(payload: &Value, pointer: &str) -> Option<Self> {
        payload
            .pointer(pointer)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}

/// Amount carried from quote to authorization to transfer
pub type TransferAmount = Money;

/// States reported on a transaction-request status callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionRequestState {
    Received,
    Rejected,
}

impl TransactionRequestState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionRequestState::Received => "RECEIVED",
            TransactionRequestState::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for TransactionRequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// ISO-8601 timestamp with milliseconds and `Z` suffix
pub fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

// ============================================================================
// Outbound bodies
// ============================================================================

/// PUT /quotes/{id}
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponse {
    pub transfer_amount: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payee_fsp_fee: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payee_fsp_commission: Option<Money>,
    pub expiration: String,
    pub ilp_packet: String,
    pub condition: String,
}

/// POST /transfers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferPrepare {
    pub transfer_id: String,
    pub payer_fsp: String,
    pub payee_fsp: String,
    pub amount: Money,
    pub expiration: String,
    pub ilp_packet: String,
    pub condition: String,
}

/// PUT /transfers/{id}
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferFulfil {
    pub fulfilment: String,
    pub completed_timestamp: String,
    pub transfer_state: String,
}

/// PUT /transactionRequests/{id}
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequestStatus {
    pub transaction_id: String,
    pub transaction_request_state: TransactionRequestState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension_list: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyIdInfo {
    pub party_id_type: String,
    pub party_identifier: String,
    pub fsp_id: String,
}

/// PUT /parties/{type}/{id}
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartyResponse {
    pub party: Party,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Party {
    pub party_id_info: PartyIdInfo,
    pub name: String,
    pub personal_info: Value,
}
