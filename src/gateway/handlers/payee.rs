//! Payee FSP (`/payeefsp`) handlers
//!
//! All of them acknowledge with 202 Accepted; the answer to the requester
//! arrives later as a callback.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{OriginalUri, Path, State},
    http::{HeaderMap, StatusCode},
};
use serde_json::Value;
use tracing::{error, warn};

use super::{field, parse_body, store_request};
use crate::fspiop::InboundHeaders;
use crate::gateway::state::{AppState, Side};

/// GET /payeefsp/parties/{type}/{id}
pub async fn get_party(
    State(state): State<Arc<AppState>>,
    OriginalUri(uri): OriginalUri,
    Path((id_type, id)): Path<(String, String)>,
    headers: HeaderMap,
) -> StatusCode {
    let inbound = InboundHeaders::from_header_map(&headers);
    store_request(&state, Side::Payee, "GET", uri.path(), &id, &inbound, &Value::Null);

    let orchestrator = state.orchestrator.clone();
    state
        .orchestrator
        .spawn_flow("payee", "getPartiesByTypeAndId", async move {
            orchestrator.on_party_lookup(&inbound, &id_type, &id).await
        });
    StatusCode::ACCEPTED
}

/// POST /payeefsp/quotes
pub async fn post_quote(
    State(state): State<Arc<AppState>>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let inbound = InboundHeaders::from_header_map(&headers);
    let payload = parse_body(&body);
    let Some(quote_id) = field(&payload, "quoteId").map(str::to_string) else {
        warn!("{} POST {} without quoteId", Side::Payee.tag(), uri.path());
        return StatusCode::ACCEPTED;
    };
    store_request(&state, Side::Payee, "POST", uri.path(), &quote_id, &inbound, &payload);

    if let Err(e) = state
        .orchestrator
        .on_quote_request(&quote_id, &inbound, &payload)
    {
        error!(id = %quote_id, code = e.code(), error = %e, "Quote response not sent");
    }
    StatusCode::ACCEPTED
}

/// POST /payeefsp/transactionRequests
pub async fn post_transaction_request(
    State(state): State<Arc<AppState>>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let inbound = InboundHeaders::from_header_map(&headers);
    let payload = parse_body(&body);
    let Some(trx_id) = field(&payload, "transactionRequestId").map(str::to_string) else {
        warn!("{} POST {} without transactionRequestId", Side::Payee.tag(), uri.path());
        return StatusCode::ACCEPTED;
    };
    store_request(&state, Side::Payee, "POST", uri.path(), &trx_id, &inbound, &payload);

    let orchestrator = state.orchestrator.clone();
    state
        .orchestrator
        .spawn_flow("payee", "postTransactionRequests", async move {
            orchestrator
                .on_transaction_request(&trx_id, &inbound, &payload)
                .await
        });
    StatusCode::ACCEPTED
}

/// POST /payeefsp/transfers
pub async fn post_transfer(
    State(state): State<Arc<AppState>>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let inbound = InboundHeaders::from_header_map(&headers);
    let payload = parse_body(&body);
    let Some(transfer_id) = field(&payload, "transferId").map(str::to_string) else {
        warn!("{} POST {} without transferId", Side::Payee.tag(), uri.path());
        return StatusCode::ACCEPTED;
    };
    store_request(&state, Side::Payee, "POST", uri.path(), &transfer_id, &inbound, &payload);

    let orchestrator = state.orchestrator.clone();
    state
        .orchestrator
        .spawn_flow("payee", "postTransfers", async move {
            orchestrator
                .on_transfer_prepare(&transfer_id, &inbound)
                .await
        });
    StatusCode::ACCEPTED
}
