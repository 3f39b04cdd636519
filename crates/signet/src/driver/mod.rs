//! Drivers: one key, one algorithm, sign/verify/check.
//!
//! A [`Driver`] is built once from a [`KeyConfig`] and a [`ClaimsConfig`],
//! validating the configuration and loading or generating its key material
//! up front — construction either yields a fully usable driver or fails.
//! Once built it is immutable and safe to share across threads.
//!
//! Family-specific code lives in one module per family; the driver holds a
//! [`KeyParams`] tagged union and dispatches on it rather than subclassing.

#[cfg(feature = "ecdsa")]
mod ecdsa;
#[cfg(feature = "eddsa")]
mod eddsa;
#[cfg(feature = "hmac")]
mod hmac;
#[cfg(feature = "rsa")]
mod rsa;

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::algorithm::{Algorithm, EcCurve, KeyFamily};
use crate::claims::{ClaimsChecker, ClaimsGenerator};
use crate::config::{self, ClaimsConfig, KeyConfig, SignetConfig};
use crate::error::{Error, Result};
use crate::jwk::Jwk;
use crate::jws::{Header, Jws};

/// Validated, family-specific key parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum KeyParams {
    /// NIST-curve ECDSA.
    Ecdsa {
        /// The curve, always the one the algorithm pairs with.
        curve: EcCurve,
    },
    /// Ed25519.
    EdDsa,
    /// Symmetric HMAC secret.
    Hmac {
        /// Secret size in bits.
        size: u32,
    },
    /// RSA modulus.
    Rsa {
        /// Modulus size in bits.
        size: u32,
    },
}

impl KeyParams {
    /// Validate the family-specific configuration fields.
    fn from_config(algorithm: Algorithm, config: &KeyConfig) -> Result<Self> {
        match algorithm.family() {
            KeyFamily::Ecdsa => {
                let Some(paired) = algorithm.ec_curve() else {
                    return Err(Error::config(format!(
                        "{algorithm} is not an ECDSA algorithm"
                    )));
                };
                let curve = match &config.curve {
                    None => paired,
                    Some(name) => {
                        let curve = EcCurve::from_name(name).ok_or_else(|| {
                            Error::config(format!(
                                "unsupported curve {name}; expected one of P-256, P-384, P-521"
                            ))
                        })?;
                        if curve != paired {
                            return Err(Error::config(format!(
                                "curve {curve} cannot be used with {algorithm}, which pairs with {paired}"
                            )));
                        }
                        curve
                    }
                };
                Ok(Self::Ecdsa { curve })
            }

            KeyFamily::EdDsa => {
                if let Some(name) = &config.curve {
                    if name != crate::algorithm::CURVE_ED25519 {
                        return Err(Error::config(format!(
                            "unsupported curve {name}; the EdDSA family supports Ed25519"
                        )));
                    }
                }
                Ok(Self::EdDsa)
            }

            family @ (KeyFamily::Hmac | KeyFamily::Rsa) => {
                let size = config.size.ok_or_else(|| {
                    Error::config(format!("size is required for the {family} family"))
                })?;
                if size == 0 || size % 8 != 0 {
                    return Err(Error::config(format!(
                        "size must be a positive multiple of 8, got {size}"
                    )));
                }
                let minimum = algorithm.minimum_bits().unwrap_or(0);
                if size < minimum {
                    return Err(Error::config(format!(
                        "size {size} is below the {minimum}-bit minimum for {algorithm}"
                    )));
                }

                match family {
                    KeyFamily::Hmac => Ok(Self::Hmac { size }),
                    _ => Ok(Self::Rsa { size }),
                }
            }
        }
    }
}

/// A signing/verification driver owning one key.
///
/// Constructing two drivers concurrently against the same missing key file
/// is first-writer-wins: both generate a key and the last write ends up on
/// disk, so the two in-memory keys may disagree until one side reloads.
/// Serialize construction per path externally if that matters.
#[derive(Debug)]
pub struct Driver {
    algorithm: Algorithm,
    path: Option<PathBuf>,
    jwk: Jwk,
    claims_generator: ClaimsGenerator,
    claims_checker: ClaimsChecker,
}

impl Driver {
    /// Build a driver from a key configuration and a claims policy.
    ///
    /// Resolves and validates the algorithm and family parameters, then
    /// loads the key file (which must be readable and of the right key
    /// type), generates and persists a fresh key (mode 0600) when the file
    /// does not exist, or generates an ephemeral key when no path is set.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownAlgorithm`] / [`Error::MissingCapability`] from
    /// algorithm resolution, [`Error::InvalidConfiguration`] for bad
    /// curve/size/path, [`Error::Io`] / [`Error::Key`] when the key file
    /// cannot be read, written, or parsed.
    pub fn from_config(key_config: &KeyConfig, claims_config: &ClaimsConfig) -> Result<Self> {
        let algorithm = Algorithm::resolve(&key_config.algorithm)?;
        let params = KeyParams::from_config(algorithm, key_config)?;
        let jwk = load_or_generate(algorithm, &params, key_config.path.as_deref())?;
        check_key_shape(algorithm, &params, &jwk)?;

        debug!(
            algorithm = %algorithm,
            path = ?key_config.path,
            "constructed driver"
        );

        Ok(Self {
            algorithm,
            path: key_config.path.clone(),
            jwk,
            claims_generator: ClaimsGenerator::new(claims_config.clone()),
            claims_checker: ClaimsChecker::new(claims_config.clone()),
        })
    }

    /// Build the driver selected by a configuration's active profiles.
    ///
    /// # Errors
    ///
    /// Profile lookup failures, plus everything [`Driver::from_config`]
    /// reports.
    pub fn from_profiles(config: &SignetConfig) -> Result<Self> {
        Self::from_config(config.active_key()?, config.active_claims()?)
    }

    /// The configured algorithm.
    #[must_use]
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// The key file location, when the key is persisted.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// The verification half of the key, safe to share.
    #[must_use]
    pub fn public_jwk(&self) -> Jwk {
        self.jwk.to_public()
    }

    /// Sign a claim set.
    ///
    /// The configured standard claims are generated first and the caller's
    /// claims are merged over them — on conflicting names the caller wins.
    ///
    /// # Errors
    ///
    /// [`Error::Key`] when the key material cannot produce a signature.
    pub fn sign(&self, claims: &Map<String, Value>) -> Result<Jws> {
        let mut merged = self.claims_generator.generate();
        for (name, value) in claims {
            merged.insert(name.clone(), value.clone());
        }

        let payload = serde_json::to_vec(&merged)
            .map_err(|err| Error::key(format!("could not encode payload: {err}")))?;
        let header = Header::jwt(self.algorithm);
        let header_bytes = serde_json::to_vec(&header)
            .map_err(|err| Error::key(format!("could not encode header: {err}")))?;

        let signing_input = format!(
            "{}.{}",
            crate::jwk::b64_encode(header_bytes),
            crate::jwk::b64_encode(&payload)
        );
        let signature = sign_message(self.algorithm, &self.jwk, signing_input.as_bytes())?;

        debug!(algorithm = %self.algorithm, "signed token");
        Ok(Jws::from_parts(header, payload, signature, signing_input))
    }

    /// Sign a claim set carrying only a `sub` claim for the given subject.
    ///
    /// # Errors
    ///
    /// See [`Driver::sign`].
    pub fn sign_subject(&self, subject: &str) -> Result<Jws> {
        let mut claims = Map::new();
        claims.insert("sub".to_owned(), Value::from(subject));
        self.sign(&claims)
    }

    /// Sign and compact-serialize in one step.
    ///
    /// # Errors
    ///
    /// See [`Driver::sign`].
    pub fn sign_serialized(&self, claims: &Map<String, Value>) -> Result<String> {
        Ok(self.sign(claims)?.compact())
    }

    /// Compact serialization of a token.
    #[must_use]
    pub fn serialize(&self, jws: &Jws) -> String {
        jws.compact()
    }

    /// Parse a compact-serialized token.
    ///
    /// # Errors
    ///
    /// [`Error::MalformedToken`] unless the input is a valid three-part
    /// compact JWS.
    pub fn unserialize(&self, token: &str) -> Result<Jws> {
        Jws::decode(token)
    }

    /// Whether the token's signature verifies against this driver's key.
    ///
    /// An invalid signature is a routine negative result, not an error;
    /// unusable key material is logged and also reported as `false`.
    #[must_use]
    pub fn verify(&self, jws: &Jws) -> bool {
        let result = verify_message(
            self.algorithm,
            &self.jwk,
            jws.signing_input().as_bytes(),
            jws.signature(),
        );

        match result {
            Ok(valid) => valid,
            Err(err) => {
                warn!(algorithm = %self.algorithm, error = %err, "verification errored");
                false
            }
        }
    }

    /// Parse and verify a compact-serialized token.
    ///
    /// # Errors
    ///
    /// [`Error::MalformedToken`] when the string does not parse; an invalid
    /// signature still returns `Ok(false)`.
    pub fn verify_token(&self, token: &str) -> Result<bool> {
        Ok(self.verify(&self.unserialize(token)?))
    }

    /// Validate a token's header and claims against the configured policy.
    ///
    /// The header's `alg` must equal the configured algorithm (rejecting
    /// algorithm-confusion attempts), then the claims are checked in order.
    /// Does not verify the signature; pair with [`Driver::verify`] or use
    /// [`Driver::authenticate`].
    ///
    /// # Errors
    ///
    /// [`Error::AlgorithmMismatch`], [`Error::MalformedToken`], or the
    /// first claim violation found.
    pub fn check(&self, jws: &Jws) -> Result<Map<String, Value>> {
        let found = jws.header().alg;
        if found != self.algorithm {
            return Err(Error::AlgorithmMismatch {
                expected: self.algorithm.as_str(),
                found: found.as_str().to_owned(),
            });
        }

        let claims = jws.claims()?;
        self.claims_checker.check(&claims)?;
        Ok(claims)
    }

    /// Parse and check a compact-serialized token.
    ///
    /// # Errors
    ///
    /// See [`Driver::check`].
    pub fn check_token(&self, token: &str) -> Result<Map<String, Value>> {
        self.check(&self.unserialize(token)?)
    }

    /// Full bearer-token validation: parse, verify the signature, then
    /// check header and claims. Returns the validated claim map.
    ///
    /// # Errors
    ///
    /// [`Error::MalformedToken`], [`Error::InvalidSignature`], or the
    /// first header/claim violation.
    pub fn authenticate(&self, token: &str) -> Result<Map<String, Value>> {
        let jws = self.unserialize(token)?;

        if !self.verify(&jws) {
            return Err(Error::InvalidSignature);
        }

        self.check(&jws)
    }
}

fn load_or_generate(
    algorithm: Algorithm,
    params: &KeyParams,
    path: Option<&Path>,
) -> Result<Jwk> {
    match path {
        None => {
            debug!(algorithm = %algorithm, "generating ephemeral key");
            generate_key(algorithm, params)
        }
        Some(path) if path.exists() => {
            config::check_key_readable(path)?;
            Jwk::read_file(path)
        }
        Some(path) => {
            config::check_key_creatable(path)?;
            let jwk = generate_key(algorithm, params)?;
            jwk.write_file(path)?;
            Ok(jwk)
        }
    }
}

/// Reject key material whose shape does not fit the configured algorithm,
/// so a mismatched key file fails at construction instead of at first use.
fn check_key_shape(algorithm: Algorithm, params: &KeyParams, jwk: &Jwk) -> Result<()> {
    let expected = algorithm.family().key_type();
    if jwk.key_type() != expected {
        return Err(Error::config(format!(
            "key is a {} key but {algorithm} expects kty={expected}",
            jwk.key_type()
        )));
    }

    match (params, jwk) {
        (KeyParams::Ecdsa { curve }, Jwk::Ec { crv, .. }) if crv.as_str() != curve.as_str() => {
            Err(Error::config(format!(
                "key uses curve {crv} but {algorithm} requires {curve}"
            )))
        }
        (KeyParams::EdDsa, Jwk::Okp { crv, .. })
            if crv.as_str() != crate::algorithm::CURVE_ED25519 =>
        {
            Err(Error::config(format!(
                "key uses curve {crv} but {algorithm} requires Ed25519"
            )))
        }
        _ => Ok(()),
    }
}

fn generate_key(algorithm: Algorithm, params: &KeyParams) -> Result<Jwk> {
    match params {
        #[cfg(feature = "ecdsa")]
        KeyParams::Ecdsa { curve } => ecdsa::generate(*curve),
        #[cfg(feature = "eddsa")]
        KeyParams::EdDsa => Ok(eddsa::generate()),
        #[cfg(feature = "hmac")]
        KeyParams::Hmac { size } => Ok(hmac::generate(*size)),
        #[cfg(feature = "rsa")]
        KeyParams::Rsa { size } => rsa::generate(*size),
        #[allow(unreachable_patterns)]
        _ => Err(missing_capability(algorithm)),
    }
}

fn sign_message(algorithm: Algorithm, jwk: &Jwk, message: &[u8]) -> Result<Vec<u8>> {
    match algorithm.family() {
        #[cfg(feature = "ecdsa")]
        KeyFamily::Ecdsa => ecdsa::sign(algorithm, jwk, message),
        #[cfg(feature = "eddsa")]
        KeyFamily::EdDsa => eddsa::sign(jwk, message),
        #[cfg(feature = "hmac")]
        KeyFamily::Hmac => hmac::sign(algorithm, jwk, message),
        #[cfg(feature = "rsa")]
        KeyFamily::Rsa => rsa::sign(algorithm, jwk, message),
        #[allow(unreachable_patterns)]
        _ => Err(missing_capability(algorithm)),
    }
}

fn verify_message(
    algorithm: Algorithm,
    jwk: &Jwk,
    message: &[u8],
    signature: &[u8],
) -> Result<bool> {
    match algorithm.family() {
        #[cfg(feature = "ecdsa")]
        KeyFamily::Ecdsa => ecdsa::verify(algorithm, jwk, message, signature),
        #[cfg(feature = "eddsa")]
        KeyFamily::EdDsa => eddsa::verify(jwk, message, signature),
        #[cfg(feature = "hmac")]
        KeyFamily::Hmac => hmac::verify(algorithm, jwk, message, signature),
        #[cfg(feature = "rsa")]
        KeyFamily::Rsa => rsa::verify(algorithm, jwk, message, signature),
        #[allow(unreachable_patterns)]
        _ => Err(missing_capability(algorithm)),
    }
}

fn missing_capability(algorithm: Algorithm) -> Error {
    Error::MissingCapability {
        algorithm: algorithm.as_str().to_owned(),
        feature: algorithm.family().feature(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ecdsa_curve_defaults_to_the_algorithm_pairing() {
        let params =
            KeyParams::from_config(Algorithm::ES384, &KeyConfig::new("ES384")).unwrap();
        assert_eq!(params, KeyParams::Ecdsa { curve: EcCurve::P384 });
    }

    #[test]
    fn mismatched_curve_is_invalid_configuration() {
        let config = KeyConfig::new("ES256").with_curve("P-521");
        let err = KeyParams::from_config(Algorithm::ES256, &config).unwrap_err();
        assert!(matches!(err, Error::InvalidConfiguration { .. }));
    }

    #[test]
    fn unknown_curve_is_invalid_configuration() {
        let config = KeyConfig::new("ES256").with_curve("secp256k1");
        assert!(KeyParams::from_config(Algorithm::ES256, &config).is_err());
    }

    #[cfg(feature = "eddsa")]
    #[test]
    fn eddsa_accepts_only_ed25519() {
        let config = KeyConfig::new("EdDSA").with_curve("Ed25519");
        KeyParams::from_config(Algorithm::EdDSA, &config).unwrap();

        let config = KeyConfig::new("EdDSA").with_curve("Ed448");
        assert!(KeyParams::from_config(Algorithm::EdDSA, &config).is_err());
    }

    #[test]
    fn size_is_required_for_hmac_and_rsa() {
        for algorithm in [Algorithm::HS256, Algorithm::RS256] {
            let err =
                KeyParams::from_config(algorithm, &KeyConfig::new(algorithm.as_str()))
                    .unwrap_err();
            assert!(err.to_string().contains("size is required"));
        }
    }

    #[test]
    fn size_must_be_a_multiple_of_eight() {
        let config = KeyConfig::new("HS256").with_size(255);
        let err = KeyParams::from_config(Algorithm::HS256, &config).unwrap_err();
        assert!(err.to_string().contains("multiple of 8"));
    }

    #[test]
    fn size_must_meet_the_algorithm_minimum() {
        let config = KeyConfig::new("HS256").with_size(128);
        let err = KeyParams::from_config(Algorithm::HS256, &config).unwrap_err();
        assert!(err.to_string().contains("256-bit minimum"));

        let config = KeyConfig::new("RS384").with_size(2048);
        let err = KeyParams::from_config(Algorithm::RS384, &config).unwrap_err();
        assert!(err.to_string().contains("3072-bit minimum"));
    }

    #[test]
    fn exact_minimum_size_is_accepted() {
        let config = KeyConfig::new("HS256").with_size(256);
        assert_eq!(
            KeyParams::from_config(Algorithm::HS256, &config).unwrap(),
            KeyParams::Hmac { size: 256 }
        );
    }
}
