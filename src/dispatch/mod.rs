//! Outbound Dispatcher
//!
//! Delivers built callbacks to counter-parties. A delivery succeeds only when
//! the counter-party answers with the callback's expected acknowledgement
//! code; anything else is logged and the flow halts. No retries.
//!
//! Two detached entry points make the fire-and-forget contract explicit:
//! - [`OutboundDispatcher::dispatch`] sends one callback in its own task
//! - [`OutboundDispatcher::spawn_flow`] runs a multi-step flow in its own task
//!
//! Errors never leave those tasks.

pub mod http;
pub mod mock;

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::error::{DispatchError, FlowError};
use crate::fspiop::OutboundCallback;

pub use http::HttpTransport;
pub use mock::MockTransport;

/// Generic "send a request and return a status" capability
#[async_trait]
pub trait Transport: Send + Sync {
    /// Transport name for logging
    fn name(&self) -> &'static str;

    /// Send the callback and return the counter-party's status code
    async fn send(&self, callback: &OutboundCallback) -> Result<u16, DispatchError>;
}

#[derive(Clone)]
pub struct OutboundDispatcher {
    transport: Arc<dyn Transport>,
}

impl OutboundDispatcher {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Send and check the acknowledgement code
    pub async fn deliver(&self, callback: &OutboundCallback) -> Result<(), DispatchError> {
        info!(
            transport = self.transport.name(),
            id = %callback.correlation_id,
            "Executing {} {}",
            callback.method,
            callback.url
        );

        let status = self.transport.send(callback).await?;
        info!(id = %callback.correlation_id, status, "response: {}", status);

        if status != callback.expected_status {
            return Err(DispatchError::UnexpectedStatus {
                expected: callback.expected_status,
                actual: status,
            });
        }
        Ok(())
    }

    /// Fire-and-forget delivery of one callback
    pub fn dispatch(&self, callback: OutboundCallback) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move {
            if let Err(e) = this.deliver(&callback).await {
                error!(
                    id = %callback.correlation_id,
                    resource = %callback.resource,
                    url = %callback.url,
                    error = %e,
                    "Failed to send callback"
                );
            }
        })
    }

    /// Run a flow step detached from the inbound request. The outcome is only
    /// visible in logs: `fsp`, `operation`, `success` and `elapsed_ms` fields.
    pub fn spawn_flow<F>(&self, fsp: &'static str, operation: &'static str, flow: F) -> JoinHandle<()>
    where
        F: Future<Output = Result<(), FlowError>> + Send + 'static,
    {
        tokio::spawn(async move {
            let started = Instant::now();
            let result = flow.await;
            let elapsed_ms = started.elapsed().as_millis() as u64;
            match result {
                Ok(()) => info!(fsp, operation, success = true, elapsed_ms, "Flow step completed"),
                Err(e) => error!(
                    fsp,
                    operation,
                    success = false,
                    elapsed_ms,
                    code = e.code(),
                    error = %e,
                    "Flow step abandoned"
                ),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fspiop::{HttpMethod, Resource};

    fn callback(expected_status: u16) -> OutboundCallback {
        OutboundCallback {
            resource: Resource::Quotes,
            correlation_id: "q-1".into(),
            url: "http://localhost/quotes/q-1".into(),
            method: HttpMethod::Put,
            headers: vec![],
            signature: None,
            body: Some("{}".into()),
            expected_status,
        }
    }

    #[tokio::test]
    async fn test_deliver_accepts_expected_status() {
        let mock = Arc::new(MockTransport::new());
        let dispatcher = OutboundDispatcher::new(mock.clone());
        assert!(dispatcher.deliver(&callback(202)).await.is_ok());
        assert_eq!(mock.count(), 1);
    }

    #[tokio::test]
    async fn test_deliver_rejects_other_status() {
        let mock = Arc::new(MockTransport::new());
        mock.set_status(Some(500));
        let dispatcher = OutboundDispatcher::new(mock.clone());
        assert_eq!(
            dispatcher.deliver(&callback(202)).await,
            Err(DispatchError::UnexpectedStatus {
                expected: 202,
                actual: 500
            })
        );
    }

    #[tokio::test]
    async fn test_deliver_transport_failure() {
        let mock = Arc::new(MockTransport::new());
        mock.set_fail(true);
        let dispatcher = OutboundDispatcher::new(mock.clone());
        assert!(matches!(
            dispatcher.deliver(&callback(200)).await,
            Err(DispatchError::Transport(_))
        ));
        // the attempt is still recorded
        assert_eq!(mock.count(), 1);
    }

    #[tokio::test]
    async fn test_dispatch_swallows_errors() {
        let mock = Arc::new(MockTransport::new());
        mock.set_fail(true);
        let dispatcher = OutboundDispatcher::new(mock.clone());
        // the detached task completes without panicking
        dispatcher.dispatch(callback(200)).await.unwrap();
        assert_eq!(mock.count(), 1);
    }

    #[tokio::test]
    async fn test_spawn_flow_swallows_errors() {
        let dispatcher = OutboundDispatcher::new(Arc::new(MockTransport::new()));
        let handle = dispatcher.spawn_flow("payer", "test", async {
            Err(FlowError::MissingField("amount"))
        });
        assert!(handle.await.is_ok());
    }
}
