//! HTTP/1 transport on hyper's pooled client
//!
//! The client sends exactly the headers a callback carries (plus `host` and
//! `content-length`). No `accept` or `user-agent` defaults are added.

use std::time::Duration;

use async_trait::async_trait;
use axum::body::Bytes;
use axum::http::{Method, Request};
use http_body_util::Full;
use hyper_util::client::legacy::{Client, connect::HttpConnector};
use hyper_util::rt::TokioExecutor;
use tracing::debug;

use super::Transport;
use crate::config::OutboundConfig;
use crate::error::{DispatchError, SimulatorError};
use crate::fspiop::{HttpMethod, OutboundCallback};

pub struct HttpTransport {
    client: Client<HttpConnector, Full<Bytes>>,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(config: &OutboundConfig) -> Result<Self, SimulatorError> {
        if config.timeout_ms == 0 {
            return Err(SimulatorError::Config(
                "outbound.timeout_ms must be greater than 0".to_string(),
            ));
        }
        let client = Client::builder(TokioExecutor::new()).build_http();
        Ok(Self {
            client,
            timeout: Duration::from_millis(config.timeout_ms),
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn send(&self, callback: &OutboundCallback) -> Result<u16, DispatchError> {
        let method = match callback.method {
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
        };

        let mut builder = Request::builder().method(method).uri(&callback.url);
        for (name, value) in &callback.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        let body = callback.body.clone().map(Bytes::from).unwrap_or_default();
        let request = builder
            .body(Full::new(body))
            .map_err(|e| DispatchError::InvalidRequest(e.to_string()))?;

        debug!(headers = ?callback.headers, body = ?callback.body, "Outbound request");

        let response = tokio::time::timeout(self.timeout, self.client.request(request))
            .await
            .map_err(|_| {
                DispatchError::Transport(format!("timed out after {}ms", self.timeout.as_millis()))
            })?
            .map_err(|e| DispatchError::Transport(e.to_string()))?;
        Ok(response.status().as_u16())
    }
}
