use std::sync::Arc;

use anyhow::Context;

use fsp_simulator::config::AppConfig;
use fsp_simulator::fspiop::{Ed25519Signer, FixedSigner, Signer};
use fsp_simulator::gateway::{self, state::AppState};
use fsp_simulator::{CorrelationStore, FlowRegistry, HttpTransport, Orchestrator};

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

/// Get port override from command line (--port argument)
fn get_port_override() -> Option<u16> {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if args[i] == "--port" && i + 1 < args.len() {
            return args[i + 1].parse().ok();
        }
    }
    None
}

fn build_signer(config: &AppConfig) -> anyhow::Result<Arc<dyn Signer>> {
    match config.test_material.signing_key.as_deref() {
        Some(seed) if !seed.is_empty() => {
            let signer = Ed25519Signer::from_hex_seed(seed).context("invalid signing_key")?;
            tracing::info!(public_key = %signer.public_key_hex(), "Signing callbacks with Ed25519");
            Ok(Arc::new(signer))
        }
        _ => Ok(Arc::new(FixedSigner::new(
            config.test_material.signature.clone(),
        ))),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = get_env();
    let mut config = AppConfig::load(&env).context("failed to load configuration")?;
    if let Some(port) = get_port_override() {
        config.gateway.port = port;
    }
    let _log_guard = fsp_simulator::logging::init_logging(&config);

    tracing::info!("Starting FSP simulator in {} mode", env);
    tracing::info!(
        rejected_range = ?config.flows.rejected_amount_range,
        otp_range = ?config.flows.otp_amount_range,
        suppress_transfer_fulfilment = config.flows.suppress_transfer_fulfilment,
        "Flow configuration"
    );

    let signer = build_signer(&config)?;
    let transport = Arc::new(HttpTransport::new(&config.outbound)?);
    let ttl = config.store.ttl_seconds;
    let flows = Arc::new(FlowRegistry::with_ttl_secs(ttl));
    let orchestrator = Arc::new(Orchestrator::from_config(&config, signer, transport, flows));

    let state = Arc::new(AppState::new(
        Arc::new(CorrelationStore::with_ttl_secs(ttl)),
        Arc::new(CorrelationStore::with_ttl_secs(ttl)),
        orchestrator,
    ));

    gateway::run_server(&config.gateway, state, ttl).await?;
    Ok(())
}
