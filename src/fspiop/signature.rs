//! Detached callback signatures.
//!
//! The `FSPIOP-Signature` header carries `{signature, protectedHeader}` where
//! `protectedHeader` is the base64url JSON of the signed routing fields. The
//! signature value itself comes from a [`Signer`]; by default that is the
//! configured fixed test string, so no real cryptography is involved.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use ed25519_dalek::{Signer as _, SigningKey};
use serde::{Deserialize, Serialize};

use crate::error::SignError;

/// Opaque signing capability: `sign(payload, key) -> signature`
pub trait Signer: Send + Sync {
    /// JWS `alg` tag placed in the protected header
    fn alg(&self) -> &'static str;

    /// Sign the JWS signing input (`protected "." payload`)
    fn sign(&self, signing_input: &[u8]) -> Result<String, SignError>;
}

/// Returns the same configured signature for every payload
pub struct FixedSigner {
    signature: String,
}

impl FixedSigner {
    pub fn new(signature: impl Into<String>) -> Self {
        Self {
            signature: signature.into(),
        }
    }
}

impl Signer for FixedSigner {
    fn alg(&self) -> &'static str {
        "RS256"
    }

    fn sign(&self, _signing_input: &[u8]) -> Result<String, SignError> {
        Ok(self.signature.clone())
    }
}

/// Ed25519 signer for setups that verify callback signatures
pub struct Ed25519Signer {
    key: SigningKey,
}

impl Ed25519Signer {
    /// Build from a 32-byte hex seed
    pub fn from_hex_seed(seed_hex: &str) -> Result<Self, SignError> {
        let bytes = hex::decode(seed_hex.trim())
            .map_err(|e| SignError::InvalidKey(format!("not hex: {}", e)))?;
        let seed: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| SignError::InvalidKey(format!("expected 32 bytes, got {}", bytes.len())))?;
        Ok(Self {
            key: SigningKey::from_bytes(&seed),
        })
    }

    /// Hex-encoded public key, logged at startup so counter-parties can verify
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.key.verifying_key().as_bytes())
    }
}

impl Signer for Ed25519Signer {
    fn alg(&self) -> &'static str {
        "EdDSA"
    }

    fn sign(&self, signing_input: &[u8]) -> Result<String, SignError> {
        let sig = self.key.sign(signing_input);
        Ok(URL_SAFE_NO_PAD.encode(sig.to_bytes()))
    }
}

/// Fields covered by the signature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtectedHeader {
    pub alg: String,
    #[serde(rename = "FSPIOP-Source")]
    pub source: String,
    #[serde(rename = "FSPIOP-Destination")]
    pub destination: String,
    #[serde(rename = "FSPIOP-URI")]
    pub uri: String,
    #[serde(rename = "FSPIOP-HTTP-Method")]
    pub http_method: String,
    #[serde(rename = "Date")]
    pub date: String,
}

impl ProtectedHeader {
    pub fn encode(&self) -> Result<String, SignError> {
        let json = serde_json::to_vec(self).map_err(|e| SignError::Encoding(e.to_string()))?;
        Ok(URL_SAFE_NO_PAD.encode(json))
    }

    pub fn decode(encoded: &str) -> Result<Self, SignError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(encoded)
            .map_err(|e| SignError::Encoding(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| SignError::Encoding(e.to_string()))
    }
}

/// Value of the `FSPIOP-Signature` header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FspiopSignature {
    pub signature: String,
    pub protected_header: String,
}

impl FspiopSignature {
    /// Sign `body` under `header` with the detached JWS construction
    pub fn create(
        signer: &dyn Signer,
        header: &ProtectedHeader,
        body: &str,
    ) -> Result<Self, SignError> {
        let protected_header = header.encode()?;
        let signing_input = format!("{}.{}", protected_header, URL_SAFE_NO_PAD.encode(body));
        let signature = signer.sign(signing_input.as_bytes())?;
        Ok(Self {
            signature,
            protected_header,
        })
    }

    pub fn to_header_value(&self) -> Result<String, SignError> {
        serde_json::to_string(self).map_err(|e| SignError::Encoding(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signature, Verifier};

    fn header() -> ProtectedHeader {
        ProtectedHeader {
            alg: "RS256".to_string(),
            source: "payeefsp".to_string(),
            destination: "payerfsp".to_string(),
            uri: "/quotes/q-1".to_string(),
            http_method: "PUT".to_string(),
            date: String::new(),
        }
    }

    #[test]
    fn test_protected_header_roundtrip_and_field_names() {
        let encoded = header().encode().unwrap();
        assert!(!encoded.contains('='));
        assert_eq!(ProtectedHeader::decode(&encoded).unwrap(), header());

        let raw = String::from_utf8(URL_SAFE_NO_PAD.decode(&encoded).unwrap()).unwrap();
        assert!(raw.contains("\"FSPIOP-Source\":\"payeefsp\""));
        assert!(raw.contains("\"FSPIOP-HTTP-Method\":\"PUT\""));
        assert!(raw.contains("\"Date\":\"\""));
    }

    #[test]
    fn test_fixed_signer_ignores_payload() {
        let signer = FixedSigner::new("test-sig");
        let a = FspiopSignature::create(&signer, &header(), "{\"a\":1}").unwrap();
        let b = FspiopSignature::create(&signer, &header(), "{\"b\":2}").unwrap();
        assert_eq!(a.signature, "test-sig");
        assert_eq!(a.signature, b.signature);

        let value = a.to_header_value().unwrap();
        assert!(value.contains("\"protectedHeader\""));
    }

    #[test]
    fn test_ed25519_signature_verifies() {
        let seed = [7u8; 32];
        let signer = Ed25519Signer::from_hex_seed(&hex::encode(seed)).unwrap();
        assert_eq!(signer.alg(), "EdDSA");

        let body = "{\"transferState\":\"COMMITTED\"}";
        let sig = FspiopSignature::create(&signer, &header(), body).unwrap();

        let signing_input = format!("{}.{}", sig.protected_header, URL_SAFE_NO_PAD.encode(body));
        let sig_bytes: [u8; 64] = URL_SAFE_NO_PAD
            .decode(&sig.signature)
            .unwrap()
            .try_into()
            .unwrap();
        let verifying_key = SigningKey::from_bytes(&seed).verifying_key();
        assert!(
            verifying_key
                .verify(signing_input.as_bytes(), &Signature::from_bytes(&sig_bytes))
                .is_ok()
        );
        assert_eq!(signer.public_key_hex(), hex::encode(verifying_key.as_bytes()));
    }

    #[test]
    fn test_ed25519_generated_seed_roundtrip() {
        use rand::rngs::OsRng;

        let key = SigningKey::generate(&mut OsRng);
        let signer = Ed25519Signer::from_hex_seed(&hex::encode(key.as_bytes())).unwrap();
        assert_eq!(signer.public_key_hex(), hex::encode(key.verifying_key().as_bytes()));
    }

    #[test]
    fn test_ed25519_rejects_bad_seed() {
        assert!(matches!(
            Ed25519Signer::from_hex_seed("zz"),
            Err(SignError::InvalidKey(_))
        ));
        assert!(matches!(
            Ed25519Signer::from_hex_seed("0011"),
            Err(SignError::InvalidKey(_))
        ));
    }
}
