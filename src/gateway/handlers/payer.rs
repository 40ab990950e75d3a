//! Payer FSP (`/payerfsp`) handlers with follow-up flows

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{OriginalUri, Path, State},
    http::{HeaderMap, StatusCode},
};

use super::store_callback;
use crate::gateway::state::{AppState, Side};

/// PUT /payerfsp/quotes/{id}
pub async fn put_quote(
    State(state): State<Arc<AppState>>,
    OriginalUri(uri): OriginalUri,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let (inbound, payload) = store_callback(&state, Side::Payer, uri.path(), &id, &headers, &body);

    let orchestrator = state.orchestrator.clone();
    state
        .orchestrator
        .spawn_flow("payer", "putQuotesById", async move {
            orchestrator
                .on_quote_response(&id, &inbound, &payload)
                .await
        });
    StatusCode::OK
}

/// PUT /payerfsp/authorizations/{id}
pub async fn put_authorization(
    State(state): State<Arc<AppState>>,
    OriginalUri(uri): OriginalUri,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let (inbound, _payload) = store_callback(&state, Side::Payer, uri.path(), &id, &headers, &body);

    let orchestrator = state.orchestrator.clone();
    state
        .orchestrator
        .spawn_flow("payer", "putAuthorizations", async move {
            orchestrator.on_authorization_response(&id, &inbound).await
        });
    StatusCode::OK
}

/// PUT /payerfsp/transfers/{id}
pub async fn put_transfer(
    State(state): State<Arc<AppState>>,
    OriginalUri(uri): OriginalUri,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let (_inbound, payload) = store_callback(&state, Side::Payer, uri.path(), &id, &headers, &body);
    state.orchestrator.on_transfer_notification(&id, &payload);
    StatusCode::OK
}
