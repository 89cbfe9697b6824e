//! # DID Documents
//!
//! A simplified W3C DID document: controller, verification methods and
//! services. Credentials are services of type [`CREDENTIAL_SERVICE_TYPE`]
//! carrying a claims map.
//!
//! HMAC method records may carry a `secretKeyHex` on input. It is decoded
//! into a [`SecretKey`] and never written back out.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Map, Value};

use freed_core::hex_to_bytes;
use freed_dispute::{SecretKey, VerificationMethod, HMAC_METHOD_TYPE};

/// JSON-LD context written by [`DidDocument::to_value`].
pub const DID_CONTEXT: &str = "https://www.w3.org/ns/did/v1";

/// Service type of issued credentials.
pub const CREDENTIAL_SERVICE_TYPE: &str = "FreedIDCredential";

/// A verification method entry of a DID document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationMethodRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub method_type: String,
    pub controller: String,
    #[serde(
        rename = "secretKeyHex",
        default,
        skip_serializing,
        deserialize_with = "deserialize_secret"
    )]
    pub secret: Option<SecretKey>,
}

impl VerificationMethodRecord {
    /// An `HmacSha256VerificationKey2026` record.
    pub fn hmac(id: impl Into<String>, controller: impl Into<String>, secret: SecretKey) -> Self {
        Self {
            id: id.into(),
            method_type: HMAC_METHOD_TYPE.to_string(),
            controller: controller.into(),
            secret: Some(secret),
        }
    }

    /// The engine-side method, if this record has key material.
    pub fn to_method(&self) -> Option<VerificationMethod> {
        let secret = self.secret.clone()?;
        Some(VerificationMethod {
            id: self.id.clone(),
            controller: self.controller.clone(),
            method_type: self.method_type.clone(),
            secret,
        })
    }
}

fn deserialize_secret<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<SecretKey>, D::Error> {
    let Some(hex) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    hex_to_bytes(hex.trim())
        .map(|bytes| Some(SecretKey::from_bytes(bytes)))
        .map_err(|_| serde::de::Error::custom("secretKeyHex is not valid hex"))
}

/// A service endpoint; credentials live here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: String,
    #[serde(rename = "type")]
    pub service_type: String,
    #[serde(default)]
    pub credential: Map<String, Value>,
}

impl Service {
    pub fn is_credential(&self) -> bool {
        self.service_type == CREDENTIAL_SERVICE_TYPE
    }
}

/// A DID document as stored by the registry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DidDocument {
    /// Empty until registered when the registry should mint the DID.
    #[serde(rename = "id", default)]
    pub did: String,
    pub controller: String,
    #[serde(rename = "verificationMethod", default)]
    pub verification_methods: Vec<VerificationMethodRecord>,
    #[serde(rename = "service", default)]
    pub services: Vec<Service>,
    #[serde(default)]
    pub revoked: bool,
}

impl DidDocument {
    pub fn new(did: impl Into<String>, controller: impl Into<String>) -> Self {
        Self {
            did: did.into(),
            controller: controller.into(),
            ..Self::default()
        }
    }

    /// A document whose DID the registry will generate.
    pub fn unassigned(controller: impl Into<String>) -> Self {
        Self::new(String::new(), controller)
    }

    pub fn with_method(mut self, method: VerificationMethodRecord) -> Self {
        self.verification_methods.push(method);
        self
    }

    pub fn method(&self, method_id: &str) -> Option<&VerificationMethodRecord> {
        self.verification_methods.iter().find(|m| m.id == method_id)
    }

    pub fn credential(&self, credential_id: &str) -> Option<&Service> {
        self.services.iter().find(|s| s.id == credential_id)
    }

    /// External form with the DID context. Secrets are omitted.
    pub fn to_value(&self) -> Value {
        json!({
            "@context": DID_CONTEXT,
            "id": self.did,
            "controller": self.controller,
            "verificationMethod": self.verification_methods,
            "service": self.services,
            "revoked": self.revoked,
        })
    }
}
