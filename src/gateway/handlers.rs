//! Inbound handlers
//!
//! Every protocol handler stores its snapshot, hands any follow-up work to a
//! detached flow and acknowledges immediately. The acknowledgement never
//! depends on what the flow does afterwards.

pub mod diagnostics;
pub mod health;
pub mod payee;
pub mod payer;

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Extension, OriginalUri, Path, State},
    http::{HeaderMap, StatusCode},
};
use serde_json::Value;
use tracing::{info, warn};

use super::state::{AppState, Side};
use crate::fspiop::InboundHeaders;
use crate::store::CachedEnvelope;

pub use diagnostics::{get_callback, get_correlation, get_flow, get_metadata, get_request};
pub use health::health_check;

/// Inbound bodies are taken as-is: empty is `null`, non-JSON is kept as a string
pub(crate) fn parse_body(body: &Bytes) -> Value {
    if body.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(body).unwrap_or_else(|e| {
        warn!(error = %e, "Inbound body is not JSON, storing raw text");
        Value::String(String::from_utf8_lossy(body).into_owned())
    })
}

/// Read a string field of an inbound payload
pub(crate) fn field<'a>(payload: &'a Value, name: &str) -> Option<&'a str> {
    payload.get(name).and_then(Value::as_str)
}

/// PUT {resource}/{id} and PUT {resource}/{id}/error: store the callback
pub async fn put_callback(
    State(state): State<Arc<AppState>>,
    Extension(side): Extension<Side>,
    OriginalUri(uri): OriginalUri,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    store_callback(&state, side, uri.path(), &id, &headers, &body);
    StatusCode::OK
}

/// PUT {resource}/{type}/{id} and its error variant, keyed by the party id
pub async fn put_party_callback(
    State(state): State<Arc<AppState>>,
    Extension(side): Extension<Side>,
    OriginalUri(uri): OriginalUri,
    Path((_id_type, id)): Path<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    store_callback(&state, side, uri.path(), &id, &headers, &body);
    StatusCode::OK
}

pub(crate) fn store_callback(
    state: &AppState,
    side: Side,
    path: &str,
    id: &str,
    headers: &HeaderMap,
    body: &Bytes,
) -> (InboundHeaders, Value) {
    let inbound = InboundHeaders::from_header_map(headers);
    let payload = parse_body(body);
    info!(
        side = %side,
        id = %id,
        source = ?inbound.source(),
        destination = ?inbound.destination(),
        "{} PUT {}",
        side.tag(),
        path
    );
    state
        .store(side)
        .record_callback(id, CachedEnvelope::new(&inbound, payload.clone()));
    (inbound, payload)
}

pub(crate) fn store_request(
    state: &AppState,
    side: Side,
    method: &str,
    path: &str,
    id: &str,
    inbound: &InboundHeaders,
    payload: &Value,
) {
    info!(side = %side, id = %id, "{} {} {}", side.tag(), method, path);
    state
        .store(side)
        .record_request(id, CachedEnvelope::new(inbound, payload.clone()));
}
