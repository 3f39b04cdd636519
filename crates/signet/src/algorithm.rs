//! Algorithm registry: JWS signature algorithms and the key families that
//! implement them.
//!
//! The mapping is closed: every algorithm belongs to exactly one family, and
//! the family decides which key shape and configuration parameters apply.
//! Families are cargo features; resolving an algorithm whose family is not
//! compiled in reports [`Error::MissingCapability`] rather than
//! [`Error::UnknownAlgorithm`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// JWS signature algorithms as registered in RFC 7518 (plus EdDSA, RFC 8037).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Algorithm {
    /// ECDSA with P-256 and SHA-256
    ES256,
    /// ECDSA with P-384 and SHA-384
    ES384,
    /// ECDSA with P-521 and SHA-512
    ES512,
    /// Edwards-curve signature with Ed25519
    EdDSA,
    /// HMAC with SHA-256
    HS256,
    /// HMAC with SHA-384
    HS384,
    /// HMAC with SHA-512
    HS512,
    /// RSASSA-PKCS1-v1_5 with SHA-256
    RS256,
    /// RSASSA-PKCS1-v1_5 with SHA-384
    RS384,
    /// RSASSA-PKCS1-v1_5 with SHA-512
    RS512,
    /// RSASSA-PSS with SHA-256
    PS256,
    /// RSASSA-PSS with SHA-384
    PS384,
    /// RSASSA-PSS with SHA-512
    PS512,
}

impl Algorithm {
    /// Every supported algorithm, in family order.
    pub const ALL: [Self; 13] = [
        Self::ES256,
        Self::ES384,
        Self::ES512,
        Self::EdDSA,
        Self::HS256,
        Self::HS384,
        Self::HS512,
        Self::RS256,
        Self::RS384,
        Self::RS512,
        Self::PS256,
        Self::PS384,
        Self::PS512,
    ];

    /// The algorithm name as it appears in a JWS header.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ES256 => "ES256",
            Self::ES384 => "ES384",
            Self::ES512 => "ES512",
            Self::EdDSA => "EdDSA",
            Self::HS256 => "HS256",
            Self::HS384 => "HS384",
            Self::HS512 => "HS512",
            Self::RS256 => "RS256",
            Self::RS384 => "RS384",
            Self::RS512 => "RS512",
            Self::PS256 => "PS256",
            Self::PS384 => "PS384",
            Self::PS512 => "PS512",
        }
    }

    /// The key family that implements this algorithm.
    #[must_use]
    pub fn family(self) -> KeyFamily {
        match self {
            Self::ES256 | Self::ES384 | Self::ES512 => KeyFamily::Ecdsa,
            Self::EdDSA => KeyFamily::EdDsa,
            Self::HS256 | Self::HS384 | Self::HS512 => KeyFamily::Hmac,
            Self::RS256 | Self::RS384 | Self::RS512 => KeyFamily::Rsa,
            Self::PS256 | Self::PS384 | Self::PS512 => KeyFamily::Rsa,
        }
    }

    /// Minimum key size in bits, for the families configured by size.
    ///
    /// `None` for ECDSA and EdDSA, whose key shape is fixed by the curve.
    #[must_use]
    pub fn minimum_bits(self) -> Option<u32> {
        match self {
            Self::HS256 => Some(256),
            Self::HS384 => Some(384),
            Self::HS512 => Some(512),
            Self::RS256 | Self::PS256 => Some(2048),
            Self::RS384 | Self::PS384 => Some(3072),
            Self::RS512 | Self::PS512 => Some(4096),
            _ => None,
        }
    }

    /// The named curve this ECDSA algorithm pairs with, per RFC 7518.
    #[must_use]
    pub fn ec_curve(self) -> Option<EcCurve> {
        match self {
            Self::ES256 => Some(EcCurve::P256),
            Self::ES384 => Some(EcCurve::P384),
            Self::ES512 => Some(EcCurve::P521),
            _ => None,
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|alg| alg.as_str() == name)
    }

    /// Resolve a caller-supplied algorithm name.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownAlgorithm`] when the name matches no supported
    /// algorithm, [`Error::MissingCapability`] when the algorithm is known
    /// but its family feature is disabled in this build.
    pub fn resolve(name: &str) -> Result<Self> {
        let algorithm = Self::from_name(name).ok_or_else(|| Error::UnknownAlgorithm {
            name: name.to_owned(),
        })?;
        let family = algorithm.family();

        if !family.available() {
            return Err(Error::MissingCapability {
                algorithm: algorithm.as_str().to_owned(),
                feature: family.feature(),
            });
        }

        Ok(algorithm)
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The four key families, each implemented by one driver module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyFamily {
    /// NIST-curve ECDSA (ES256, ES384, ES512)
    Ecdsa,
    /// Edwards-curve signatures (EdDSA)
    EdDsa,
    /// Symmetric HMAC (HS256, HS384, HS512)
    Hmac,
    /// RSA PKCS#1 v1.5 and PSS (RS*, PS*)
    Rsa,
}

impl KeyFamily {
    /// Short family name, used in configuration and diagnostics.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ecdsa => "ecdsa",
            Self::EdDsa => "eddsa",
            Self::Hmac => "hmac",
            Self::Rsa => "rsa",
        }
    }

    /// The cargo feature that compiles this family in.
    #[must_use]
    pub fn feature(self) -> &'static str {
        self.as_str()
    }

    /// Whether this family is compiled into the current build.
    #[must_use]
    pub fn available(self) -> bool {
        match self {
            Self::Ecdsa => cfg!(feature = "ecdsa"),
            Self::EdDsa => cfg!(feature = "eddsa"),
            Self::Hmac => cfg!(feature = "hmac"),
            Self::Rsa => cfg!(feature = "rsa"),
        }
    }

    /// The JWK `kty` value keys of this family carry.
    #[must_use]
    pub fn key_type(self) -> &'static str {
        match self {
            Self::Ecdsa => "EC",
            Self::EdDsa => "OKP",
            Self::Hmac => "oct",
            Self::Rsa => "RSA",
        }
    }
}

impl fmt::Display for KeyFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The curve name used by the EdDSA family.
pub const CURVE_ED25519: &str = "Ed25519";

/// Named NIST curves supported by the ECDSA family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EcCurve {
    /// P-256 (secp256r1)
    P256,
    /// P-384 (secp384r1)
    P384,
    /// P-521 (secp521r1)
    P521,
}

impl EcCurve {
    /// All supported curves.
    pub const ALL: [Self; 3] = [Self::P256, Self::P384, Self::P521];

    /// The curve name as it appears in a JWK `crv` member.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::P256 => "P-256",
            Self::P384 => "P-384",
            Self::P521 => "P-521",
        }
    }

    /// Field element size in bytes (the length of `x`, `y`, and `d`).
    #[must_use]
    pub fn field_size(self) -> usize {
        match self {
            Self::P256 => 32,
            Self::P384 => 48,
            Self::P521 => 66,
        }
    }

    /// Look a curve up by its JWK name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|curve| curve.as_str() == name)
    }
}

impl fmt::Display for EcCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_algorithm_round_trips_through_its_name() {
        for algorithm in Algorithm::ALL {
            assert_eq!(Algorithm::resolve(algorithm.as_str()).unwrap(), algorithm);
        }
    }

    #[test]
    fn unknown_names_are_rejected() {
        assert!(matches!(
            Algorithm::resolve("none"),
            Err(Error::UnknownAlgorithm { .. })
        ));
        assert!(matches!(
            Algorithm::resolve("hs256"),
            Err(Error::UnknownAlgorithm { .. })
        ));
    }

    #[test]
    fn family_mapping_is_closed() {
        assert_eq!(Algorithm::ES512.family(), KeyFamily::Ecdsa);
        assert_eq!(Algorithm::EdDSA.family(), KeyFamily::EdDsa);
        assert_eq!(Algorithm::HS384.family(), KeyFamily::Hmac);
        assert_eq!(Algorithm::RS256.family(), KeyFamily::Rsa);
        assert_eq!(Algorithm::PS512.family(), KeyFamily::Rsa);
    }

    #[test]
    fn minimums_follow_the_algorithm_strength() {
        assert_eq!(Algorithm::HS256.minimum_bits(), Some(256));
        assert_eq!(Algorithm::HS512.minimum_bits(), Some(512));
        assert_eq!(Algorithm::RS256.minimum_bits(), Some(2048));
        assert_eq!(Algorithm::PS512.minimum_bits(), Some(4096));
        assert_eq!(Algorithm::ES256.minimum_bits(), None);
        assert_eq!(Algorithm::EdDSA.minimum_bits(), None);
    }

    #[test]
    fn ecdsa_algorithms_pair_with_their_curve() {
        assert_eq!(Algorithm::ES256.ec_curve(), Some(EcCurve::P256));
        assert_eq!(Algorithm::ES384.ec_curve(), Some(EcCurve::P384));
        assert_eq!(Algorithm::ES512.ec_curve(), Some(EcCurve::P521));
        assert_eq!(Algorithm::HS256.ec_curve(), None);
    }

    #[test]
    fn header_names_serialize_verbatim() {
        let json = serde_json::to_string(&Algorithm::EdDSA).unwrap();
        assert_eq!(json, "\"EdDSA\"");
        let back: Algorithm = serde_json::from_str("\"ES512\"").unwrap();
        assert_eq!(back, Algorithm::ES512);
    }
}
