//! JWS compact serialization: `base64url(header).base64url(payload).base64url(signature)`.
//!
//! A decoded [`Jws`] retains the exact signing input it was parsed from, so
//! verification operates on the original bytes — re-encoding a header or
//! payload is never assumed to be byte-identical.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::algorithm::Algorithm;
use crate::error::{Error, Result};
use crate::jwk::{b64_decode, b64_encode};

/// JWS protected header.
///
/// Issued tokens always carry `{"typ":"JWT","alg":...}`. Additional members
/// found while decoding foreign tokens are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Header {
    /// Token type tag; `"JWT"` on every issued token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,

    /// The signature algorithm.
    pub alg: Algorithm,
}

impl Header {
    /// The header issued tokens are signed under.
    #[must_use]
    pub fn jwt(alg: Algorithm) -> Self {
        Self {
            typ: Some("JWT".to_owned()),
            alg,
        }
    }
}

/// A signed token: header, payload, signature, and the signing input the
/// signature covers.
#[derive(Debug, Clone)]
pub struct Jws {
    header: Header,
    payload: Vec<u8>,
    signature: Vec<u8>,
    signing_input: String,
}

impl Jws {
    pub(crate) fn from_parts(
        header: Header,
        payload: Vec<u8>,
        signature: Vec<u8>,
        signing_input: String,
    ) -> Self {
        Self {
            header,
            payload,
            signature,
            signing_input,
        }
    }

    /// The protected header.
    #[must_use]
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// The raw payload bytes (JSON).
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// The signature bytes.
    #[must_use]
    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    /// The exact `base64url(header).base64url(payload)` string the signature
    /// was computed over.
    #[must_use]
    pub fn signing_input(&self) -> &str {
        &self.signing_input
    }

    /// Decode the payload into a claim map.
    ///
    /// # Errors
    ///
    /// [`Error::MalformedToken`] when the payload is not a JSON object.
    pub fn claims(&self) -> Result<Map<String, Value>> {
        let value: Value = serde_json::from_slice(&self.payload)
            .map_err(|err| Error::malformed(format!("payload is not valid JSON: {err}")))?;

        match value {
            Value::Object(map) => Ok(map),
            other => Err(Error::malformed(format!(
                "payload is not a JSON object (found {})",
                json_type(&other)
            ))),
        }
    }

    /// Compact serialization of this token.
    #[must_use]
    pub fn compact(&self) -> String {
        format!("{}.{}", self.signing_input, b64_encode(&self.signature))
    }

    /// Parse a compact-serialized token.
    ///
    /// # Errors
    ///
    /// [`Error::MalformedToken`] unless the input is exactly three valid
    /// base64url segments with a JSON header.
    pub fn decode(token: &str) -> Result<Self> {
        let parts: Vec<&str> = token.split('.').collect();
        if parts.len() != 3 {
            return Err(Error::malformed(format!(
                "expected 3 dot-separated segments, got {}",
                parts.len()
            )));
        }

        let header_bytes = b64_decode(parts[0])
            .map_err(|err| Error::malformed(format!("header is not valid base64url: {err}")))?;
        let header: Header = serde_json::from_slice(&header_bytes)
            .map_err(|err| Error::malformed(format!("header is not a valid JWS header: {err}")))?;

        let payload = b64_decode(parts[1])
            .map_err(|err| Error::malformed(format!("payload is not valid base64url: {err}")))?;
        let signature = b64_decode(parts[2])
            .map_err(|err| Error::malformed(format!("signature is not valid base64url: {err}")))?;

        Ok(Self {
            header,
            payload,
            signature,
            signing_input: format!("{}.{}", parts[0], parts[1]),
        })
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
