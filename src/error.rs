//! Simulator error types
//!
//! Errors raised inside a detached flow never reach the inbound caller:
//! they are logged at the task boundary (see [`crate::dispatch::OutboundDispatcher::spawn_flow`]).

use thiserror::Error;

/// Startup / configuration errors
#[derive(Debug, Error)]
pub enum SimulatorError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Server error: {0}")]
    Server(String),
}

/// Outbound delivery errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// Request could not be sent or the connection failed
    #[error("Transport failure: {0}")]
    Transport(String),

    /// Counter-party answered with a code other than the protocol acknowledgement
    #[error("Unexpected status: expected {expected}, got {actual}")]
    UnexpectedStatus { expected: u16, actual: u16 },

    /// Callback could not be turned into an HTTP request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Signing capability errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignError {
    #[error("Invalid signing key: {0}")]
    InvalidKey(String),

    #[error("Failed to encode protected header: {0}")]
    Encoding(String),
}

/// Orchestration step errors
#[derive(Debug, Error)]
pub enum FlowError {
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    Sign(#[from] SignError),

    #[error("Missing field in inbound payload: {0}")]
    MissingField(&'static str),

    #[error("No flow record for {0}")]
    MissingFlowRecord(String),

    #[error("Failed to serialize payload: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl FlowError {
    /// Short code for log fields
    pub fn code(&self) -> &'static str {
        match self {
            FlowError::Dispatch(DispatchError::Transport(_)) => "TRANSPORT_FAILURE",
            FlowError::Dispatch(DispatchError::UnexpectedStatus { .. }) => "UNEXPECTED_STATUS",
            FlowError::Dispatch(DispatchError::InvalidRequest(_)) => "INVALID_REQUEST",
            FlowError::Sign(_) => "SIGN_ERROR",
            FlowError::MissingField(_) => "MISSING_FIELD",
            FlowError::MissingFlowRecord(_) => "MISSING_FLOW_RECORD",
            FlowError::Serialize(_) => "SERIALIZE_ERROR",
        }
    }
}
