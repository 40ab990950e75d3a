use serde::{Deserialize, Serialize};
use std::fs;

use crate::error::SimulatorError;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    #[serde(default)]
    pub gateway: GatewayConfig,
    /// Counter-party base URLs per resource type
    #[serde(default)]
    pub endpoints: EndpointsConfig,
    /// Amount ranges and fulfilment switch
    #[serde(default)]
    pub flows: FlowsConfig,
    /// Fixed artifacts used in place of real cryptography
    #[serde(default)]
    pub test_material: TestMaterialConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub outbound: OutboundConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8444,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EndpointsConfig {
    pub parties: String,
    pub quotes: String,
    pub transaction_requests: String,
    pub transfers: String,
    pub authorizations: String,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            parties: "http://localhost:1080".to_string(),
            quotes: "http://localhost:1080".to_string(),
            transaction_requests: "http://moja-transaction-requests-service".to_string(),
            transfers: "http://localhost:1080".to_string(),
            authorizations: "http://localhost:1080".to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct FlowsConfig {
    /// "<from>-<to>", absent disables the rejection branch
    #[serde(default)]
    pub rejected_amount_range: Option<String>,
    /// "<from>-<to>", absent disables the OTP branch
    #[serde(default)]
    pub otp_amount_range: Option<String>,
    #[serde(default)]
    pub suppress_transfer_fulfilment: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TestMaterialConfig {
    pub condition: String,
    pub fulfilment: String,
    pub ilp_packet: String,
    /// Returned by the fixed signer
    pub signature: String,
    /// Hex Ed25519 seed; when set, callbacks are really signed
    #[serde(default)]
    pub signing_key: Option<String>,
    /// Mocked payee fee on quote responses
    #[serde(default)]
    pub quote_fee: Option<String>,
    /// Mocked payee commission on quote responses
    #[serde(default)]
    pub quote_commission: Option<String>,
}

impl Default for TestMaterialConfig {
    fn default() -> Self {
        Self {
            condition: "HOr22-H3AfTDHrSkPjJtVPRdKouuMkDXTR4ejlQa8Ks".to_string(),
            fulfilment: "UNlJ98hZTY_dsw0cAqw4i_UN3v4utt7CZFB4yfLbVFA".to_string(),
            ilp_packet: "AQAAAAAAAADIEHByaXZhdGUucGF5ZWVmc3CCAiB7InRyYW5zYWN0aW9uSWQiOiIyZGY3NzRlMi1mMWRiLTRmZjctYTQ5NS0yZGRkMzdhZjdjMmMiLCJxdW90ZUlkIjoiMDNhNjA1NTAtNmYyZi00NTU2LThlMDQtMDcwM2UzOWI4N2ZmIiwicGF5ZWUiOnsicGFydHlJZEluZm8iOnsicGFydHlJZFR5cGUiOiJNU0lTRE4iLCJwYXJ0eUlkZW50aWZpZXIiOiIyNzcxMzgwMzkxMyIsImZzcElkIjoicGF5ZWVmc3AifSwicGVyc29uYWxJbmZvIjp7ImNvbXBsZXhOYW1lIjp7fX19LCJwYXllciI6eyJwYXJ0eUlkSW5mbyI6eyJwYXJ0eUlkVHlwZSI6Ik1TSVNETiIsInBhcnR5SWRlbnRpZmllciI6IjI3NzEzODAzOTExIiwiZnNwSWQiOiJwYXllcmZzcCJ9LCJwZXJzb25hbEluZm8iOnsiY29tcGxleE5hbWUiOnt9fX0sImFtb3VudCI6eyJjdXJyZW5jeSI6IlVTRCIsImFtb3VudCI6IjIwMCJ9LCJ0cmFuc2FjdGlvblR5cGUiOnsic2NlbmFyaW8iOiJERVBPU0lUIiwic3ViU2NlbmFyaW8iOiJERVBPU0lUIiwiaW5pdGlhdG9yIjoiUEFZRVIiLCJpbml0aWF0b3JUeXBlIjoiQ09OU1VNRVIiLCJyZWZ1bmRJbmZvIjp7fX19".to_string(),
            signature: "abcJjvNrkyK2KBieDUbGfhaBUn75aDUATNF4joqA8OLs4QgSD7i6EO8BIdy6Crph3LnXnTM20Ai1Z6nt0zliS_qPPLU9_vi6qLb15FOkl64DQs9hnfoGeo2tcjZJ88gm19uLY_s27AJqC1GH1B8E2emLrwQMDMikwQcYvXoyLrL7LL3CjaLMKdzR7KTcQi1tCK4sNg0noIQLpV3eA61kess".to_string(),
            signing_key: None,
            quote_fee: None,
            quote_commission: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StoreConfig {
    /// Entry lifetime in seconds, 0 keeps entries until deleted
    pub ttl_seconds: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { ttl_seconds: 0 }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OutboundConfig {
    pub timeout_ms: u64,
}

impl Default for OutboundConfig {
    fn default() -> Self {
        Self { timeout_ms: 30_000 }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_dir: "./logs".to_string(),
            log_file: "fsp_simulator.log".to_string(),
            use_json: false,
            rotation: "daily".to_string(),
            gateway: GatewayConfig::default(),
            endpoints: EndpointsConfig::default(),
            flows: FlowsConfig::default(),
            test_material: TestMaterialConfig::default(),
            store: StoreConfig::default(),
            outbound: OutboundConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load `config/{env}.yaml`, then apply environment overrides
    pub fn load(env: &str) -> Result<Self, SimulatorError> {
        let config_path = format!("config/{}.yaml", env);
        let content = fs::read_to_string(&config_path)
            .map_err(|e| SimulatorError::Config(format!("{}: {}", config_path, e)))?;
        let mut config = Self::from_yaml(&content)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self, SimulatorError> {
        serde_yaml::from_str(content).map_err(|e| SimulatorError::Config(e.to_string()))
    }

    /// Overlay settings from environment-style variables.
    ///
    /// `lookup` is injected so tests do not have to mutate the process env.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let set = |target: &mut String, key: &str| {
            if let Some(v) = lookup(key) {
                *target = v;
            }
        };

        set(&mut self.endpoints.parties, "PARTIES_ENDPOINT");
        set(&mut self.endpoints.quotes, "QUOTES_ENDPOINT");
        set(
            &mut self.endpoints.transaction_requests,
            "TRANSACTION_REQUESTS_ENDPOINT",
        );
        set(&mut self.endpoints.transfers, "TRANSFERS_ENDPOINT");
        set(&mut self.endpoints.authorizations, "AUTHORIZATIONS_ENDPOINT");

        set(&mut self.test_material.condition, "TRANSFERS_CONDITION");
        set(&mut self.test_material.fulfilment, "TRANSFERS_FULFILMENT");
        set(&mut self.test_material.ilp_packet, "TRANSFERS_ILPPACKET");
        set(&mut self.test_material.signature, "MOCK_JWS_SIGNATURE");

        if let Some(v) = lookup("AMOUNT_RANGE_FOR_REJECTED_TRANSACTION_FLOW") {
            self.flows.rejected_amount_range = Some(v);
        }
        if let Some(v) = lookup("AMOUNT_RANGE_FOR_OTP_VERIFICATION_FLOW") {
            self.flows.otp_amount_range = Some(v);
        }
        if let Some(v) = lookup("SUPPRESS_TRANSFER_FULFILMENT") {
            self.flows.suppress_transfer_fulfilment = v.eq_ignore_ascii_case("true");
        }
        if let Some(ttl) = lookup("CACHE_TTL_SECONDS").and_then(|v| v.parse().ok()) {
            self.store.ttl_seconds = ttl;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = r#"
log_level: "debug"
log_dir: "./logs"
log_file: "sim.log"
use_json: false
rotation: "never"
flows:
  rejected_amount_range: "10-20"
"#;
        let config = AppConfig::from_yaml(yaml).unwrap();

        assert_eq!(config.log_level, "debug");
        assert_eq!(config.gateway.port, 8444);
        assert_eq!(config.flows.rejected_amount_range.as_deref(), Some("10-20"));
        assert!(config.flows.otp_amount_range.is_none());
        assert!(!config.flows.suppress_transfer_fulfilment);
        assert_eq!(config.store.ttl_seconds, 0);
        assert!(config.test_material.signing_key.is_none());
    }

    #[test]
    fn test_full_yaml() {
        let yaml = r#"
log_level: "info"
log_dir: "./logs"
log_file: "sim.log"
use_json: true
rotation: "hourly"
gateway:
  host: "127.0.0.1"
  port: 9000
endpoints:
  parties: "http://als:4002"
  quotes: "http://quotes:3002"
  transaction_requests: "http://trx:4003"
  transfers: "http://ml-api:3000"
  authorizations: "http://auth:4004"
flows:
  otp_amount_range: "50-60"
  suppress_transfer_fulfilment: true
test_material:
  condition: "cond"
  fulfilment: "ful"
  ilp_packet: "pkt"
  signature: "sig"
  quote_fee: "1"
store:
  ttl_seconds: 300
outbound:
  timeout_ms: 1000
"#;
        let config = AppConfig::from_yaml(yaml).unwrap();

        assert_eq!(config.gateway.port, 9000);
        assert_eq!(config.endpoints.transfers, "http://ml-api:3000");
        assert_eq!(config.flows.otp_amount_range.as_deref(), Some("50-60"));
        assert!(config.flows.suppress_transfer_fulfilment);
        assert_eq!(config.test_material.quote_fee.as_deref(), Some("1"));
        assert!(config.test_material.quote_commission.is_none());
        assert_eq!(config.store.ttl_seconds, 300);
        assert_eq!(config.outbound.timeout_ms, 1000);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("QUOTES_ENDPOINT", "http://q:1"),
            ("AMOUNT_RANGE_FOR_REJECTED_TRANSACTION_FLOW", "10-20"),
            ("AMOUNT_RANGE_FOR_OTP_VERIFICATION_FLOW", "50-60"),
            ("TRANSFERS_CONDITION", "c2"),
            ("SUPPRESS_TRANSFER_FULFILMENT", "TRUE"),
            ("CACHE_TTL_SECONDS", "not-a-number"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config.apply_env_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.endpoints.quotes, "http://q:1");
        assert_eq!(config.endpoints.transfers, "http://localhost:1080");
        assert_eq!(config.flows.rejected_amount_range.as_deref(), Some("10-20"));
        assert_eq!(config.flows.otp_amount_range.as_deref(), Some("50-60"));
        assert_eq!(config.test_material.condition, "c2");
        assert!(config.flows.suppress_transfer_fulfilment);
        // unparsable ttl leaves the default in place
        assert_eq!(config.store.ttl_seconds, 0);
    }

    #[test]
    fn test_invalid_yaml_is_config_error() {
        let err = AppConfig::from_yaml("log_level: [").unwrap_err();
        assert!(matches!(err, SimulatorError::Config(_)));
    }

    #[test]
    fn test_shipped_dev_config_parses() {
        let config = AppConfig::from_yaml(include_str!("../config/dev.yaml")).unwrap();
        assert_eq!(config.gateway.port, 8444);
        assert_eq!(
            config.test_material.condition,
            TestMaterialConfig::default().condition
        );
        assert!(config.flows.rejected_amount_range.is_none());
    }
}
