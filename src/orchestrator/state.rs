//! Flow states per correlation id.
//!
//! ```text
//! PartyRequested → PartyConfirmed
//! QuoteRequested → QuoteResponded ─┬─ NORMAL ──────────────→ TransferInitiated → TransferFulfilled
//!                                  ├─ REJECTED ────────────→ TransactionRequestRejected
//!                                  └─ OTP ─→ AwaitingAuthorization → AuthorizationReceived → TransferInitiated
//! any send failure ──→ Abandoned
//! ```

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FlowState {
    #[default]
    PartyRequested,
    PartyConfirmed,
    TransactionRequestReceived,
    QuoteRequested,
    QuoteResponded,
    AwaitingAuthorization,
    AuthorizationReceived,
    TransferInitiated,
    /// Terminal: COMMITTED fulfilment sent (or suppressed)
    TransferFulfilled,
    /// Terminal: transaction request rejected, no transfer
    TransactionRequestRejected,
    /// Terminal: an outbound send failed
    Abandoned,
}

impl FlowState {
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            FlowState::TransferFulfilled
                | FlowState::TransactionRequestRejected
                | FlowState::Abandoned
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FlowState::PartyRequested => "PARTY_REQUESTED",
            FlowState::PartyConfirmed => "PARTY_CONFIRMED",
            FlowState::TransactionRequestReceived => "TRANSACTION_REQUEST_RECEIVED",
            FlowState::QuoteRequested => "QUOTE_REQUESTED",
            FlowState::QuoteResponded => "QUOTE_RESPONDED",
            FlowState::AwaitingAuthorization => "AWAITING_AUTHORIZATION",
            FlowState::AuthorizationReceived => "AUTHORIZATION_RECEIVED",
            FlowState::TransferInitiated => "TRANSFER_INITIATED",
            FlowState::TransferFulfilled => "TRANSFER_FULFILLED",
            FlowState::TransactionRequestRejected => "REJECTED",
            FlowState::Abandoned => "ABANDONED",
        }
    }
}

impl fmt::Display for FlowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(FlowState::TransferFulfilled.is_terminal());
        assert!(FlowState::TransactionRequestRejected.is_terminal());
        assert!(FlowState::Abandoned.is_terminal());

        assert!(!FlowState::QuoteResponded.is_terminal());
        assert!(!FlowState::AwaitingAuthorization.is_terminal());
        assert!(!FlowState::TransferInitiated.is_terminal());
    }

    #[test]
    fn test_rejected_wire_name() {
        assert_eq!(FlowState::TransactionRequestRejected.to_string(), "REJECTED");
    }
}
