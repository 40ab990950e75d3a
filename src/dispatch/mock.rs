//! In-memory transport for tests
//!
//! Records every callback it is asked to send and answers with the
//! callback's own expected status unless told otherwise.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use super::Transport;
use crate::error::DispatchError;
use crate::fspiop::{HttpMethod, OutboundCallback, Resource};

pub struct MockTransport {
    sent: Mutex<Vec<OutboundCallback>>,
    send_count: AtomicUsize,
    /// Configured behavior
    status: Mutex<Option<u16>>,
    fail: Mutex<bool>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            send_count: AtomicUsize::new(0),
            status: Mutex::new(None),
            fail: Mutex::new(false),
        }
    }

    /// Answer every send with `status` (`None` echoes the expected status)
    pub fn set_status(&self, status: Option<u16>) {
        *self.status.lock().unwrap_or_else(|e| e.into_inner()) = status;
    }

    /// Fail every send at the transport level
    pub fn set_fail(&self, fail: bool) {
        *self.fail.lock().unwrap_or_else(|e| e.into_inner()) = fail;
    }

    pub fn count(&self) -> usize {
        self.send_count.load(Ordering::SeqCst)
    }

    /// Everything sent so far, in order
    pub fn sent(&self) -> Vec<OutboundCallback> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn sent_matching(&self, resource: Resource, method: HttpMethod) -> Vec<OutboundCallback> {
        self.sent()
            .into_iter()
            .filter(|cb| cb.resource == resource && cb.method == method)
            .collect()
    }

    /// Wait until at least `n` sends were attempted. Returns false on timeout.
    pub async fn wait_for(&self, n: usize, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        while self.count() < n {
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        true
    }
}

#[async_trait]
impl Transport for MockTransport {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn send(&self, callback: &OutboundCallback) -> Result<u16, DispatchError> {
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(callback.clone());
        self.send_count.fetch_add(1, Ordering::SeqCst);

        if *self.fail.lock().unwrap_or_else(|e| e.into_inner()) {
            return Err(DispatchError::Transport("mock: connection refused".into()));
        }
        let status = *self.status.lock().unwrap_or_else(|e| e.into_inner());
        Ok(status.unwrap_or(callback.expected_status))
    }
}
