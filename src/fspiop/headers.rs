//! Header names, content types and inbound header access.

use std::collections::BTreeMap;
use std::fmt;

use axum::http::HeaderMap;
use chrono::{DateTime, Utc};

pub const CONTENT_TYPE: &str = "Content-Type";
pub const DATE: &str = "Date";
pub const FSPIOP_SOURCE: &str = "FSPIOP-Source";
pub const FSPIOP_DESTINATION: &str = "FSPIOP-Destination";
pub const FSPIOP_SIGNATURE: &str = "FSPIOP-Signature";
pub const FSPIOP_HTTP_METHOD: &str = "FSPIOP-HTTP-Method";
pub const FSPIOP_URI: &str = "FSPIOP-URI";
pub const TRACEPARENT: &str = "traceparent";
pub const TRACESTATE: &str = "tracestate";

/// Protocol version advertised in outbound content types
pub const PROTOCOL_VERSION: &str = "1.0";

/// Resource families of the interoperability API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Parties,
    Quotes,
    TransactionRequests,
    Authorizations,
    Transfers,
}

impl Resource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Parties => "parties",
            Resource::Quotes => "quotes",
            Resource::TransactionRequests => "transactionRequests",
            Resource::Authorizations => "authorizations",
            Resource::Transfers => "transfers",
        }
    }

    /// e.g. `application/vnd.interoperability.quotes+json;version=1.0`
    pub fn content_type(&self) -> String {
        format!(
            "application/vnd.interoperability.{}+json;version={}",
            self.as_str(),
            PROTOCOL_VERSION
        )
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// RFC 7231 IMF-fixdate, as sent in the `Date` header
pub fn http_date(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Snapshot of inbound request headers, keys lower-cased.
///
/// Non UTF-8 header values are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InboundHeaders(BTreeMap<String, String>);

impl InboundHeaders {
    pub fn from_header_map(map: &HeaderMap) -> Self {
        let inner = map
            .iter()
            .filter_map(|(k, v)| {
                v.to_str()
                    .ok()
                    .map(|v| (k.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        Self(inner)
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into().to_ascii_lowercase(), v.into()))
                .collect(),
        )
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn source(&self) -> Option<&str> {
        self.get(FSPIOP_SOURCE)
    }

    pub fn destination(&self) -> Option<&str> {
        self.get(FSPIOP_DESTINATION)
    }

    /// Distributed-tracing headers to forward on outbound calls
    pub fn trace_headers(&self) -> Vec<(&'static str, String)> {
        [TRACEPARENT, TRACESTATE]
            .into_iter()
            .filter_map(|name| self.get(name).map(|v| (name, v.to_string())))
            .collect()
    }

    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.0
    }
}
