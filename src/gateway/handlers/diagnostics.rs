//! Snapshot retrieval for test harnesses
//!
//! - `correlationid/{id}`: latest payload, left in place, 202
//! - `requests/{id}` and `callbacks/{id}`: `{headers, data}`, read-and-delete, 200
//! - `/`: operation ids and URLs this participant serves
//!
//! An absent entry is answered with the same code and an empty body.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Map, Value, json};
use tracing::info;

use crate::gateway::api_routes;
use crate::gateway::state::{AppState, Side};
use crate::gateway::types::{ApiResponse, error_codes};
use crate::store::Stage;

fn respond<T: serde::Serialize>(status: StatusCode, body: Option<T>) -> Response {
    match body {
        Some(body) => (status, Json(body)).into_response(),
        None => status.into_response(),
    }
}

/// GET {side}/correlationid/{id}
pub async fn get_correlation(
    State(state): State<Arc<AppState>>,
    Extension(side): Extension<Side>,
    Path(id): Path<String>,
) -> Response {
    let data = state
        .store(side)
        .get(Stage::Correlation, &id)
        .map(|envelope| envelope.data);
    info!(side = %side, id = %id, found = data.is_some(), "{} GET correlationid", side.tag());
    respond(StatusCode::ACCEPTED, data)
}

/// GET {side}/requests/{id}
pub async fn get_request(
    State(state): State<Arc<AppState>>,
    Extension(side): Extension<Side>,
    Path(id): Path<String>,
) -> Response {
    let envelope = state.store(side).take_and_clear(Stage::Request, &id);
    info!(side = %side, id = %id, found = envelope.is_some(), "{} GET requests", side.tag());
    respond(StatusCode::OK, envelope)
}

/// GET {side}/callbacks/{id}
pub async fn get_callback(
    State(state): State<Arc<AppState>>,
    Extension(side): Extension<Side>,
    Path(id): Path<String>,
) -> Response {
    let envelope = state.store(side).take_and_clear(Stage::Callback, &id);
    info!(side = %side, id = %id, found = envelope.is_some(), "{} GET callbacks", side.tag());
    respond(StatusCode::OK, envelope)
}

/// GET {side}: the protocol operations this participant serves
pub async fn get_metadata(Extension(side): Extension<Side>) -> Json<Value> {
    let urls: Map<String, Value> = api_routes(side)
        .iter()
        .map(|(id, path)| {
            let path = path.replace('{', ":").replace('}', "");
            (
                id.to_string(),
                Value::String(format!("localhost/{}fsp{}", side, path)),
            )
        })
        .collect();
    Json(json!({ "directory": "localhost", "urls": urls }))
}

/// GET /flows/{id}: flow record stored under any of its ids
pub async fn get_flow(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Response {
    match state.flows().get(&id) {
        Some(record) => Json(ApiResponse::success(record)).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::<()>::error(
                error_codes::FLOW_NOT_FOUND,
                format!("no flow for {}", id),
            )),
        )
            .into_response(),
    }
}
