//! Signed-Callback Builder
//!
//! Turns a step outcome into an [`OutboundCallback`]: URL, method, routing
//! headers swapped from the inbound request, `Date`, propagated trace
//! headers and, for quote / transfer / transaction-request responses, a
//! detached `FSPIOP-Signature`. No `Accept` header is ever emitted: callbacks
//! are one-way notifications.

use std::fmt;
use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::Serialize;
use serde_json::{Value, json};

use super::headers::{
    self, CONTENT_TYPE, DATE, FSPIOP_DESTINATION, FSPIOP_HTTP_METHOD, FSPIOP_SIGNATURE,
    FSPIOP_SOURCE, FSPIOP_URI, InboundHeaders, Resource,
};
use super::signature::{FspiopSignature, ProtectedHeader, Signer};
use super::types::{
    Money, Party, PartyIdInfo, PartyResponse, QuoteResponse, TransactionRequestState,
    TransactionRequestStatus, TransferFulfil, TransferPrepare, iso_timestamp,
};
use crate::config::{EndpointsConfig, TestMaterialConfig};
use crate::error::FlowError;

/// Acknowledgement codes expected from counter-parties
pub mod status {
    pub const OK: u16 = 200;
    pub const ACCEPTED: u16 = 202;
}

/// Quote responses expire this long after creation
const QUOTE_EXPIRATION_MS: i64 = 10_000;
/// Transfer prepares expire this long after creation
const TRANSFER_EXPIRATION_MS: i64 = 600_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Post,
    Put,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A fully built outbound request. Never persisted.
#[derive(Debug, Clone)]
pub struct OutboundCallback {
    pub resource: Resource,
    /// Correlation id the callback belongs to (for logs)
    pub correlation_id: String,
    pub url: String,
    pub method: HttpMethod,
    pub headers: Vec<(String, String)>,
    pub signature: Option<FspiopSignature>,
    /// Serialized JSON body, exactly the bytes that were signed
    pub body: Option<String>,
    /// Status code the counter-party must answer with
    pub expected_status: u16,
}

impl OutboundCallback {
    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn body_json(&self) -> Option<Value> {
        self.body
            .as_deref()
            .and_then(|b| serde_json::from_str(b).ok())
    }
}

/// Everything `assemble` needs for one message
struct Draft<'a> {
    inbound: &'a InboundHeaders,
    resource: Resource,
    method: HttpMethod,
    base: &'a str,
    /// Path relative to the base, also used as `FSPIOP-URI`
    path: String,
    query: Option<String>,
    correlation_id: String,
    body: Option<String>,
    sign: bool,
    expected_status: u16,
}

pub struct CallbackBuilder {
    endpoints: EndpointsConfig,
    material: TestMaterialConfig,
    signer: Arc<dyn Signer>,
}

impl CallbackBuilder {
    pub fn new(
        endpoints: EndpointsConfig,
        material: TestMaterialConfig,
        signer: Arc<dyn Signer>,
    ) -> Self {
        Self {
            endpoints,
            material,
            signer,
        }
    }

    /// Fixed test artifacts (condition, fulfilment, ILP packet)
    pub fn material(&self) -> &TestMaterialConfig {
        &self.material
    }

    /// PUT /quotes/{id}: echo the requested amount with the test condition/packet
    pub fn quote_response(
        &self,
        inbound: &InboundHeaders,
        quote_id: &str,
        amount: &Money,
    ) -> Result<OutboundCallback, FlowError> {
        let mock_line = |v: &Option<String>| {
            v.as_ref()
                .map(|a| Money::new(a.clone(), amount.currency.clone()))
        };
        let body = QuoteResponse {
            transfer_amount: amount.clone(),
            payee_fsp_fee: mock_line(&self.material.quote_fee),
            payee_fsp_commission: mock_line(&self.material.quote_commission),
            expiration: iso_timestamp(Utc::now() + Duration::milliseconds(QUOTE_EXPIRATION_MS)),
            ilp_packet: self.material.ilp_packet.clone(),
            condition: self.material.condition.clone(),
        };

        self.assemble(Draft {
            inbound,
            resource: Resource::Quotes,
            method: HttpMethod::Put,
            base: &self.endpoints.quotes,
            path: format!("/quotes/{}", quote_id),
            query: None,
            correlation_id: quote_id.to_string(),
            body: Some(to_body(&body)?),
            sign: true,
            expected_status: status::ACCEPTED,
        })
    }

    /// PUT /transfers/{id} with state COMMITTED
    pub fn transfer_fulfil(
        &self,
        inbound: &InboundHeaders,
        transfer_id: &str,
    ) -> Result<OutboundCallback, FlowError> {
        let body = TransferFulfil {
            fulfilment: self.material.fulfilment.clone(),
            completed_timestamp: iso_timestamp(Utc::now()),
            transfer_state: "COMMITTED".to_string(),
        };

        self.assemble(Draft {
            inbound,
            resource: Resource::Transfers,
            method: HttpMethod::Put,
            base: &self.endpoints.transfers,
            path: format!("/transfers/{}", transfer_id),
            query: None,
            correlation_id: transfer_id.to_string(),
            body: Some(to_body(&body)?),
            sign: true,
            expected_status: status::OK,
        })
    }

    /// PUT /transactionRequests/{id}
    pub fn transaction_request_status(
        &self,
        inbound: &InboundHeaders,
        transaction_request_id: &str,
        state: TransactionRequestState,
        extension_list: Option<Value>,
    ) -> Result<OutboundCallback, FlowError> {
        let body = TransactionRequestStatus {
            transaction_id: transaction_request_id.to_string(),
            transaction_request_state: state,
            extension_list,
        };

        self.assemble(Draft {
            inbound,
            resource: Resource::TransactionRequests,
            method: HttpMethod::Put,
            base: &self.endpoints.transaction_requests,
            path: format!("/transactionRequests/{}", transaction_request_id),
            query: None,
            correlation_id: transaction_request_id.to_string(),
            body: Some(to_body(&body)?),
            sign: true,
            expected_status: status::OK,
        })
    }

    /// PUT /parties/{type}/{id} with a mocked party owned by this FSP
    pub fn party_confirmation(
        &self,
        inbound: &InboundHeaders,
        party_id_type: &str,
        party_identifier: &str,
    ) -> Result<OutboundCallback, FlowError> {
        let fsp_id = inbound
            .destination()
            .ok_or(FlowError::MissingField("fspiop-destination"))?;
        let body = PartyResponse {
            party: Party {
                party_id_info: PartyIdInfo {
                    party_id_type: party_id_type.to_string(),
                    party_identifier: party_identifier.to_string(),
                    fsp_id: fsp_id.to_string(),
                },
                name: "Siabelo Maroka".to_string(),
                personal_info: json!({
                    "complexName": {"firstName": "Siabelo", "lastName": "Maroka"},
                    "dateOfBirth": "1973-03-03"
                }),
            },
        };

        self.assemble(Draft {
            inbound,
            resource: Resource::Parties,
            method: HttpMethod::Put,
            base: &self.endpoints.parties,
            path: format!("/parties/{}/{}", party_id_type, party_identifier),
            query: None,
            correlation_id: party_identifier.to_string(),
            body: Some(to_body(&body)?),
            sign: false,
            expected_status: status::OK,
        })
    }

    /// POST /transfers. Payer is the inbound destination, payee the inbound source.
    pub fn transfer_prepare(
        &self,
        inbound: &InboundHeaders,
        transfer_id: &str,
        amount: &Money,
        ilp_packet: &str,
        condition: &str,
    ) -> Result<OutboundCallback, FlowError> {
        let (payer_fsp, payee_fsp) = swapped_route(inbound)?;
        let body = TransferPrepare {
            transfer_id: transfer_id.to_string(),
            payer_fsp,
            payee_fsp,
            amount: amount.clone(),
            expiration: iso_timestamp(
                Utc::now() + Duration::milliseconds(TRANSFER_EXPIRATION_MS),
            ),
            ilp_packet: ilp_packet.to_string(),
            condition: condition.to_string(),
        };

        self.assemble(Draft {
            inbound,
            resource: Resource::Transfers,
            method: HttpMethod::Post,
            base: &self.endpoints.transfers,
            path: "/transfers".to_string(),
            query: None,
            correlation_id: transfer_id.to_string(),
            body: Some(to_body(&body)?),
            sign: false,
            expected_status: status::ACCEPTED,
        })
    }

    /// POST /quotes on behalf of the payee, answering a transaction request
    pub fn payee_quote_request(
        &self,
        inbound: &InboundHeaders,
        quote_id: &str,
        transaction_id: &str,
        transaction_request: &Value,
    ) -> Result<OutboundCallback, FlowError> {
        let amount = Money::from_pointer(transaction_request, "/amount")
            .ok_or(FlowError::MissingField("amount"))?;
        let field = |p: &str| transaction_request.pointer(p).cloned().unwrap_or(Value::Null);

        let body = json!({
            "quoteId": quote_id,
            "transactionId": transaction_id,
            "transactionRequestId": field("/transactionRequestId"),
            "payer": {
                "partyIdInfo": {
                    "partyIdType": field("/payer/partyIdType"),
                    "partyIdentifier": field("/payer/partyIdentifier"),
                    "fspId": field("/payer/fspId")
                },
                "personalInfo": {
                    "complexName": {"firstName": "John", "lastName": "Doe"},
                    "dateOfBirth": "1970-01-01"
                }
            },
            "payee": {
                "partyIdInfo": {
                    "partyIdType": field("/payee/partyIdInfo/partyIdType"),
                    "partyIdentifier": field("/payee/partyIdInfo/partyIdentifier"),
                    "fspId": field("/payee/partyIdInfo/fspId")
                },
                "name": field("/payee/name"),
                "personalInfo": field("/payee/personalInfo")
            },
            "amountType": "SEND",
            "amount": amount,
            "transactionType": {
                "scenario": "PAYMENT",
                "initiator": "PAYEE",
                "initiatorType": field("/transactionType/initiatorType")
            },
            "note": field("/note")
        });

        self.assemble(Draft {
            inbound,
            resource: Resource::Quotes,
            method: HttpMethod::Post,
            base: &self.endpoints.quotes,
            path: "/quotes".to_string(),
            query: None,
            correlation_id: quote_id.to_string(),
            body: Some(to_body(&body)?),
            sign: false,
            expected_status: status::ACCEPTED,
        })
    }

    /// POST /authorizations/{id}?authenticationType=OTP&retriesLeft=3&amount=..&currency=..
    pub fn authorization_request(
        &self,
        inbound: &InboundHeaders,
        transaction_request_id: &str,
        amount: &Money,
    ) -> Result<OutboundCallback, FlowError> {
        self.assemble(Draft {
            inbound,
            resource: Resource::Authorizations,
            method: HttpMethod::Post,
            base: &self.endpoints.authorizations,
            path: format!("/authorizations/{}", transaction_request_id),
            query: Some(
                form_urlencoded::Serializer::new(String::new())
                    .append_pair("authenticationType", "OTP")
                    .append_pair("retriesLeft", "3")
                    .append_pair("amount", &amount.amount)
                    .append_pair("currency", &amount.currency)
                    .finish(),
            ),
            correlation_id: transaction_request_id.to_string(),
            body: None,
            sign: false,
            expected_status: status::ACCEPTED,
        })
    }

    fn assemble(&self, draft: Draft<'_>) -> Result<OutboundCallback, FlowError> {
        let (source, destination) = swapped_route(draft.inbound)?;

        let mut headers = vec![
            (CONTENT_TYPE.to_string(), draft.resource.content_type()),
            (FSPIOP_SOURCE.to_string(), source.clone()),
            (FSPIOP_DESTINATION.to_string(), destination.clone()),
            (DATE.to_string(), headers::http_date(Utc::now())),
        ];

        let signature = if draft.sign {
            let protected = ProtectedHeader {
                alg: self.signer.alg().to_string(),
                source,
                destination,
                uri: draft.path.clone(),
                http_method: draft.method.as_str().to_string(),
                date: String::new(),
            };
            let sig = FspiopSignature::create(
                self.signer.as_ref(),
                &protected,
                draft.body.as_deref().unwrap_or_default(),
            )?;
            headers.push((FSPIOP_SIGNATURE.to_string(), sig.to_header_value()?));
            Some(sig)
        } else {
            None
        };

        if draft.method == HttpMethod::Put {
            headers.push((FSPIOP_HTTP_METHOD.to_string(), draft.method.as_str().to_string()));
            headers.push((FSPIOP_URI.to_string(), draft.path.clone()));
        }

        for (name, value) in draft.inbound.trace_headers() {
            headers.push((name.to_string(), value));
        }

        let mut url = format!("{}{}", draft.base.trim_end_matches('/'), draft.path);
        if let Some(query) = draft.query {
            url.push('?');
            url.push_str(&query);
        }

        Ok(OutboundCallback {
            resource: draft.resource,
            correlation_id: draft.correlation_id,
            url,
            method: draft.method,
            headers,
            signature,
            body: draft.body,
            expected_status: draft.expected_status,
        })
    }
}

/// (source, destination) for a reply: the inbound pair swapped
fn swapped_route(inbound: &InboundHeaders) -> Result<(String, String), FlowError> {
    let source = inbound
        .destination()
        .ok_or(FlowError::MissingField("fspiop-destination"))?;
    let destination = inbound
        .source()
        .ok_or(FlowError::MissingField("fspiop-source"))?;
    Ok((source.to_string(), destination.to_string()))
}

fn to_body<T: Serialize>(body: &T) -> Result<String, FlowError> {
    Ok(serde_json::to_string(body)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fspiop::signature::FixedSigner;

    fn builder() -> CallbackBuilder {
        let endpoints = EndpointsConfig {
            parties: "http://als".into(),
            quotes: "http://quotes/".into(),
            transaction_requests: "http://trx".into(),
            transfers: "http://ml-api".into(),
            authorizations: "http://auth".into(),
        };
        CallbackBuilder::new(
            endpoints,
            TestMaterialConfig::default(),
            Arc::new(FixedSigner::new("sig-xyz")),
        )
    }

    fn inbound() -> InboundHeaders {
        InboundHeaders::from_pairs([
            ("fspiop-source", "payerfsp"),
            ("fspiop-destination", "payeefsp"),
            ("traceparent", "00-trace-01"),
            ("tracestate", "vendor=1"),
        ])
    }

    #[test]
    fn test_quote_response_is_signed_and_swapped() {
        let cb = builder()
            .quote_response(&inbound(), "q-1", &Money::new("100", "USD"))
            .unwrap();

        assert_eq!(cb.url, "http://quotes/quotes/q-1");
        assert_eq!(cb.method, HttpMethod::Put);
        assert_eq!(cb.expected_status, status::ACCEPTED);
        assert_eq!(cb.header("fspiop-source"), Some("payeefsp"));
        assert_eq!(cb.header("FSPIOP-Destination"), Some("payerfsp"));
        assert_eq!(
            cb.header("content-type"),
            Some("application/vnd.interoperability.quotes+json;version=1.0")
        );
        assert!(cb.header("date").is_some_and(|d| d.ends_with("GMT")));
        assert_eq!(cb.header("traceparent"), Some("00-trace-01"));
        assert_eq!(cb.header("tracestate"), Some("vendor=1"));
        assert_eq!(cb.header("FSPIOP-URI"), Some("/quotes/q-1"));
        assert!(cb.header("accept").is_none());

        let sig = cb.signature.as_ref().unwrap();
        assert_eq!(sig.signature, "sig-xyz");
        let protected = ProtectedHeader::decode(&sig.protected_header).unwrap();
        assert_eq!(protected.alg, "RS256");
        assert_eq!(protected.source, "payeefsp");
        assert_eq!(protected.destination, "payerfsp");
        assert_eq!(protected.uri, "/quotes/q-1");
        assert_eq!(protected.http_method, "PUT");

        let body = cb.body_json().unwrap();
        assert_eq!(body["transferAmount"]["amount"], "100");
        assert_eq!(body["condition"], TestMaterialConfig::default().condition);
        assert!(body.get("payeeFspFee").is_none());
    }

    #[test]
    fn test_quote_response_mocked_fee_lines() {
        let material = TestMaterialConfig {
            quote_fee: Some("1.5".into()),
            quote_commission: Some("0.5".into()),
            ..TestMaterialConfig::default()
        };
        let b = CallbackBuilder::new(
            EndpointsConfig::default(),
            material,
            Arc::new(FixedSigner::new("s")),
        );
        let body = b
            .quote_response(&inbound(), "q-2", &Money::new("9", "TZS"))
            .unwrap()
            .body_json()
            .unwrap();
        assert_eq!(body["payeeFspFee"], json!({"amount": "1.5", "currency": "TZS"}));
        assert_eq!(body["payeeFspCommission"]["amount"], "0.5");
    }

    #[test]
    fn test_transfer_prepare_swaps_payer_and_payee() {
        let cb = builder()
            .transfer_prepare(&inbound(), "t-1", &Money::new("5", "USD"), "pkt", "cond")
            .unwrap();

        assert_eq!(cb.url, "http://ml-api/transfers");
        assert_eq!(cb.method, HttpMethod::Post);
        assert!(cb.signature.is_none());
        assert!(cb.header("FSPIOP-URI").is_none());

        let body = cb.body_json().unwrap();
        assert_eq!(body["transferId"], "t-1");
        assert_eq!(body["payerFsp"], "payeefsp");
        assert_eq!(body["payeeFsp"], "payerfsp");
        assert_eq!(body["ilpPacket"], "pkt");
        assert_eq!(body["condition"], "cond");
    }

    #[test]
    fn test_authorization_request_url() {
        let cb = builder()
            .authorization_request(&inbound(), "trx-1", &Money::new("55", "USD"))
            .unwrap();
        assert_eq!(
            cb.url,
            "http://auth/authorizations/trx-1?authenticationType=OTP&retriesLeft=3&amount=55&currency=USD"
        );
        assert_eq!(cb.method, HttpMethod::Post);
        assert!(cb.body.is_none());
        assert!(cb.header("FSPIOP-Source").is_some());
    }

    #[test]
    fn test_authorization_query_values_escaped() {
        let cb = builder()
            .authorization_request(&inbound(), "trx-1", &Money::new("1&retriesLeft=9", "US#D"))
            .unwrap();
        assert_eq!(
            cb.url,
            "http://auth/authorizations/trx-1?authenticationType=OTP&retriesLeft=3&amount=1%26retriesLeft%3D9&currency=US%23D"
        );
    }

    #[test]
    fn test_transaction_request_status() {
        let cb = builder()
            .transaction_request_status(
                &inbound(),
                "trx-9",
                TransactionRequestState::Rejected,
                None,
            )
            .unwrap();
        assert_eq!(cb.url, "http://trx/transactionRequests/trx-9");
        assert_eq!(cb.expected_status, status::OK);
        assert!(cb.signature.is_some());
        assert_eq!(cb.body_json().unwrap()["transactionRequestState"], "REJECTED");
    }

    #[test]
    fn test_party_confirmation_uses_own_fsp_id() {
        let cb = builder()
            .party_confirmation(&inbound(), "MSISDN", "27713803912")
            .unwrap();
        assert_eq!(cb.url, "http://als/parties/MSISDN/27713803912");
        let body = cb.body_json().unwrap();
        assert_eq!(body["party"]["partyIdInfo"]["fspId"], "payeefsp");
        assert_eq!(body["party"]["partyIdInfo"]["partyIdentifier"], "27713803912");
    }

    #[test]
    fn test_payee_quote_request_maps_transaction_request() {
        let trx = json!({
            "transactionRequestId": "trx-1",
            "payer": {"partyIdType": "MSISDN", "partyIdentifier": "111", "fspId": "payerfsp"},
            "payee": {"partyIdInfo": {"partyIdType": "MSISDN", "partyIdentifier": "222", "fspId": "payeefsp"}},
            "amount": {"amount": "20", "currency": "USD"},
            "transactionType": {"initiatorType": "CONSUMER"}
        });
        let cb = builder()
            .payee_quote_request(&inbound(), "q-7", "tx-7", &trx)
            .unwrap();
        let body = cb.body_json().unwrap();
        assert_eq!(body["quoteId"], "q-7");
        assert_eq!(body["transactionRequestId"], "trx-1");
        assert_eq!(body["payer"]["partyIdInfo"]["partyIdentifier"], "111");
        assert_eq!(body["payee"]["partyIdInfo"]["fspId"], "payeefsp");
        assert_eq!(body["transactionType"]["initiator"], "PAYEE");
        assert_eq!(body["amount"]["amount"], "20");

        let err = builder()
            .payee_quote_request(&inbound(), "q-8", "tx-8", &json!({}))
            .unwrap_err();
        assert!(matches!(err, FlowError::MissingField("amount")));
    }

    #[test]
    fn test_missing_route_headers_rejected() {
        let headers = InboundHeaders::from_pairs([("fspiop-source", "payerfsp")]);
        let err = builder()
            .transfer_fulfil(&headers, "t-1")
            .unwrap_err();
        assert!(matches!(err, FlowError::MissingField("fspiop-destination")));
    }
}
