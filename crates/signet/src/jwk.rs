//! JSON Web Key material: the portable JSON form keys are generated into,
//! persisted as, and loaded from.
//!
//! A [`Jwk`] holds base64url-encoded components. Private components are
//! zeroized on drop and redacted from `Debug` output; key files are written
//! pretty-printed with owner-only permissions set explicitly after the write.

use std::fmt;
use std::fs;
use std::path::Path;

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::error::{Error, Result};

/// File mode for persisted key files: owner read/write only.
pub const KEY_FILE_MODE: u32 = 0o600;

pub(crate) fn b64_encode(bytes: impl AsRef<[u8]>) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

pub(crate) fn b64_decode(value: &str) -> std::result::Result<Vec<u8>, base64::DecodeError> {
    URL_SAFE_NO_PAD.decode(value)
}

/// A JSON Web Key, tagged by key type.
///
/// All components are base64url without padding, as RFC 7517/7518 specify.
/// Unknown members in a key file (`kid`, `use`, CRT exponents, ...) are
/// tolerated on load and dropped on the next write.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kty")]
pub enum Jwk {
    /// NIST-curve key for the ECDSA family.
    #[serde(rename = "EC")]
    Ec {
        /// Curve name (`P-256`, `P-384`, `P-521`).
        crv: String,
        /// X coordinate of the public point.
        x: String,
        /// Y coordinate of the public point.
        y: String,
        /// Private scalar; absent on public keys.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        d: Option<String>,
    },

    /// Octet key pair for the EdDSA family.
    #[serde(rename = "OKP")]
    Okp {
        /// Curve name (`Ed25519`).
        crv: String,
        /// Public key bytes.
        x: String,
        /// Private seed; absent on public keys.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        d: Option<String>,
    },

    /// Symmetric secret for the HMAC family.
    #[serde(rename = "oct")]
    Oct {
        /// The secret bytes.
        k: String,
    },

    /// RSA key for the PKCS#1 v1.5 and PSS algorithms.
    #[serde(rename = "RSA")]
    Rsa {
        /// Modulus.
        n: String,
        /// Public exponent.
        e: String,
        /// Private exponent; absent on public keys.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        d: Option<String>,
        /// First prime factor.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        p: Option<String>,
        /// Second prime factor.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        q: Option<String>,
    },
}

impl Jwk {
    /// The `kty` member of this key.
    #[must_use]
    pub fn key_type(&self) -> &'static str {
        match self {
            Self::Ec { .. } => "EC",
            Self::Okp { .. } => "OKP",
            Self::Oct { .. } => "oct",
            Self::Rsa { .. } => "RSA",
        }
    }

    /// Whether the private component is present.
    #[must_use]
    pub fn is_private(&self) -> bool {
        match self {
            Self::Ec { d, .. } | Self::Okp { d, .. } | Self::Rsa { d, .. } => d.is_some(),
            // A symmetric secret has no public half.
            Self::Oct { .. } => true,
        }
    }

    /// A copy with private components stripped, safe to hand to verifiers.
    ///
    /// Symmetric (`oct`) keys have no public form and are returned whole;
    /// sharing one shares the signing capability.
    #[must_use]
    pub fn to_public(&self) -> Self {
        match self {
            Self::Ec { crv, x, y, .. } => Self::Ec {
                crv: crv.clone(),
                x: x.clone(),
                y: y.clone(),
                d: None,
            },
            Self::Okp { crv, x, .. } => Self::Okp {
                crv: crv.clone(),
                x: x.clone(),
                d: None,
            },
            Self::Oct { k } => Self::Oct { k: k.clone() },
            Self::Rsa { n, e, .. } => Self::Rsa {
                n: n.clone(),
                e: e.clone(),
                d: None,
                p: None,
                q: None,
            },
        }
    }

    /// Load a key from its JSON file form.
    ///
    /// # Errors
    ///
    /// [`Error::Io`] when the file cannot be read, [`Error::Key`] when its
    /// contents are not a valid JWK.
    pub fn read_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|source| Error::io(path, source))?;

        serde_json::from_str(&raw).map_err(|err| {
            Error::key(format!("key file {} is not a valid JWK: {err}", path.display()))
        })
    }

    /// Persist this key as pretty-printed JSON with mode 0600.
    ///
    /// The permission bits are set explicitly after the write rather than
    /// relying on the process umask.
    ///
    /// # Errors
    ///
    /// [`Error::Io`] when the file cannot be written or its permissions
    /// cannot be restricted, [`Error::Key`] when serialization fails.
    pub fn write_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|err| Error::key(format!("could not serialize JWK: {err}")))?;

        fs::write(path, json).map_err(|source| Error::io(path, source))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = fs::Permissions::from_mode(KEY_FILE_MODE);
            fs::set_permissions(path, perms).map_err(|source| Error::io(path, source))?;
        }

        tracing::debug!(path = %path.display(), kty = self.key_type(), "wrote key file");
        Ok(())
    }
}

// Private components never reach logs or panic messages.
impl fmt::Debug for Jwk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ec { crv, x, y, d } => f
                .debug_struct("Jwk::Ec")
                .field("crv", crv)
                .field("x", x)
                .field("y", y)
                .field("d", &d.as_ref().map(|_| "<redacted>"))
                .finish(),
            Self::Okp { crv, x, d } => f
                .debug_struct("Jwk::Okp")
                .field("crv", crv)
                .field("x", x)
                .field("d", &d.as_ref().map(|_| "<redacted>"))
                .finish(),
            Self::Oct { .. } => f.debug_struct("Jwk::Oct").field("k", &"<redacted>").finish(),
            Self::Rsa { n, e, d, .. } => f
                .debug_struct("Jwk::Rsa")
                .field("n", n)
                .field("e", e)
                .field("d", &d.as_ref().map(|_| "<redacted>"))
                .finish(),
        }
    }
}

impl Zeroize for Jwk {
    fn zeroize(&mut self) {
        match self {
            Self::Ec { d, .. } | Self::Okp { d, .. } => {
                if let Some(d) = d {
                    d.zeroize();
                }
            }
            Self::Oct { k } => k.zeroize(),
            Self::Rsa { d, p, q, .. } => {
                for component in [d, p, q].into_iter().flatten() {
                    component.zeroize();
                }
            }
        }
    }
}

impl Drop for Jwk {
    fn drop(&mut self) {
        self.zeroize();
    }
}
