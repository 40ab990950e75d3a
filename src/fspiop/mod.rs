//! Interoperability protocol vocabulary
//!
//! - [`headers`] - header names, content types, inbound header snapshot
//! - [`types`] - wire payloads
//! - [`signature`] - detached signature and the signing capability
//! - [`builder`] - Signed-Callback Builder

pub mod builder;
pub mod headers;
pub mod signature;
pub mod types;

pub use builder::{CallbackBuilder, HttpMethod, OutboundCallback, status};
pub use headers::{InboundHeaders, Resource};
pub use signature::{Ed25519Signer, FixedSigner, FspiopSignature, ProtectedHeader, Signer};
pub use types::{Money, TransactionRequestState, TransferAmount};
