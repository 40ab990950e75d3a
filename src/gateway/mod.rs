pub mod handlers;
pub mod state;
pub mod types;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Extension, Router,
    routing::{get, post, put},
};
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::config::GatewayConfig;
use crate::error::SimulatorError;
use crate::store::spawn_sweeper;
use handlers::{payee, payer};
use state::{AppState, Side};

/// Protocol operations served by the payer, listed by the metadata endpoint
const PAYER_API: &[(&str, &str)] = &[
    ("putParticipantsByTypeId", "/participants/{type}/{id}"),
    ("putParticipantsByTypeIdError", "/participants/{type}/{id}/error"),
    ("putPartiesByTypeId", "/parties/{type}/{id}"),
    ("putPartiesByTypeIdError", "/parties/{type}/{id}/error"),
    ("putQuotesById", "/quotes/{id}"),
    ("putQuotesByIdError", "/quotes/{id}/error"),
    ("putTransactionRequestsById", "/transactionRequests/{id}"),
    ("putTransactionRequestsByIdError", "/transactionRequests/{id}/error"),
    ("putAuthorizationsById", "/authorizations/{id}"),
    ("putAuthorizationsByIdError", "/authorizations/{id}/error"),
    ("putTransfersById", "/transfers/{id}"),
    ("putTransfersByIdError", "/transfers/{id}/error"),
];

/// Protocol operations served by the payee
const PAYEE_API: &[(&str, &str)] = &[
    ("getPartiesByTypeId", "/parties/{type}/{id}"),
    ("putPartiesByTypeIdError", "/parties/{type}/{id}/error"),
    ("postQuotes", "/quotes"),
    ("putQuotesByIdError", "/quotes/{id}/error"),
    ("postTransactionRequests", "/transactionRequests"),
    ("putTransactionRequestsById", "/transactionRequests/{id}"),
    ("putTransactionRequestsByIdError", "/transactionRequests/{id}/error"),
    ("postTransfers", "/transfers"),
    ("putTransfersById", "/transfers/{id}"),
    ("putTransfersByIdError", "/transfers/{id}/error"),
];

/// (operation id, path relative to the participant root)
pub(crate) fn api_routes(side: Side) -> &'static [(&'static str, &'static str)] {
    match side {
        Side::Payer => PAYER_API,
        Side::Payee => PAYEE_API,
    }
}

/// Routes shared by both participants
fn diagnostics_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(handlers::get_metadata))
        .route("/correlationid/{id}", get(handlers::get_correlation))
        .route("/requests/{id}", get(handlers::get_request))
        .route("/callbacks/{id}", get(handlers::get_callback))
}

fn payer_routes() -> Router<Arc<AppState>> {
    Router::new()
        // Participants
        .route("/participants/{type}/{id}", put(handlers::put_party_callback))
        .route(
            "/participants/{type}/{id}/error",
            put(handlers::put_party_callback),
        )
        // Parties
        .route("/parties/{type}/{id}", put(handlers::put_party_callback))
        .route("/parties/{type}/{id}/error", put(handlers::put_party_callback))
        // Quotes
        .route("/quotes/{id}", put(payer::put_quote))
        .route("/quotes/{id}/error", put(handlers::put_callback))
        // Transaction requests
        .route("/transactionRequests/{id}", put(handlers::put_callback))
        .route("/transactionRequests/{id}/error", put(handlers::put_callback))
        // Authorizations
        .route("/authorizations/{id}", put(payer::put_authorization))
        .route("/authorizations/{id}/error", put(handlers::put_callback))
        // Transfers
        .route("/transfers/{id}", put(payer::put_transfer))
        .route("/transfers/{id}/error", put(handlers::put_callback))
        .merge(diagnostics_routes())
        .layer(Extension(Side::Payer))
}

fn payee_routes() -> Router<Arc<AppState>> {
    Router::new()
        // Parties
        .route("/parties/{type}/{id}", get(payee::get_party))
        .route("/parties/{type}/{id}/error", put(handlers::put_party_callback))
        // Quotes
        .route("/quotes", post(payee::post_quote))
        .route("/quotes/{id}/error", put(handlers::put_callback))
        // Transaction requests
        .route("/transactionRequests", post(payee::post_transaction_request))
        .route("/transactionRequests/{id}", put(handlers::put_callback))
        .route("/transactionRequests/{id}/error", put(handlers::put_callback))
        // Transfers
        .route("/transfers", post(payee::post_transfer))
        .route("/transfers/{id}", put(handlers::put_callback))
        .route("/transfers/{id}/error", put(handlers::put_callback))
        .merge(diagnostics_routes())
        .layer(Extension(Side::Payee))
}

/// Complete router: both participants plus service endpoints
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/flows/{id}", get(handlers::get_flow))
        .nest("/payerfsp", payer_routes())
        .nest("/payeefsp", payee_routes())
        .with_state(state)
}

/// Start HTTP Gateway server
///
/// With `ttl_seconds > 0` a background sweeper reclaims expired snapshots
/// and flow records.
pub async fn run_server(
    config: &GatewayConfig,
    state: Arc<AppState>,
    ttl_seconds: u64,
) -> Result<(), SimulatorError> {
    if ttl_seconds > 0 {
        spawn_sweeper(
            vec![state.payer.clone(), state.payee.clone()],
            state.flows().clone(),
            Duration::from_secs(ttl_seconds.clamp(1, 60)),
        );
        info!(ttl_seconds, "Snapshot expiry enabled");
    }

    let app = router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr).await.map_err(|e| {
        error!("Failed to bind to {}: {}", addr, e);
        SimulatorError::Server(format!("bind {}: {}", addr, e))
    })?;

    info!("Simulator listening on http://{}", addr);
    info!("Payer FSP: /payerfsp/*");
    info!("Payee FSP: /payeefsp/*");

    axum::serve(listener, app)
        .await
        .map_err(|e| SimulatorError::Server(e.to_string()))
}
