//! Error types for key configuration, token parsing, and claim validation.
//!
//! Configuration problems are fatal at driver construction; signature and
//! claim failures are the routine negative path of token checking and must be
//! handled by the caller, never treated as process-fatal. Messages never
//! include private key material.

use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by drivers, the claims pipeline, and key management.
#[derive(Debug, Error)]
pub enum Error {
    /// The key or claims configuration is invalid. Raised at driver
    /// construction; the driver is never partially built.
    #[error("invalid configuration: {reason}")]
    InvalidConfiguration {
        /// The violated rule.
        reason: String,
    },

    /// The algorithm name matches no supported JWS algorithm.
    #[error("unknown algorithm: {name}")]
    UnknownAlgorithm {
        /// The name as supplied by the caller.
        name: String,
    },

    /// The algorithm is recognized but its signature family is not compiled
    /// into this build.
    #[error("algorithm {algorithm} requires the `{feature}` cargo feature")]
    MissingCapability {
        /// The resolved algorithm name.
        algorithm: String,
        /// The cargo feature that provides the family.
        feature: &'static str,
    },

    /// The token is not a valid three-part compact JWS.
    #[error("malformed token: {reason}")]
    MalformedToken {
        /// What failed while parsing.
        reason: String,
    },

    /// The token header declares a different algorithm than the driver is
    /// configured with.
    #[error("token algorithm {found} does not match configured {expected}")]
    AlgorithmMismatch {
        /// The driver's configured algorithm name.
        expected: &'static str,
        /// The algorithm name found in the token header.
        found: String,
    },

    /// The token signature did not verify against the driver key.
    #[error("token signature verification failed")]
    InvalidSignature,

    /// A claim the policy marks as enforced is absent from the payload.
    #[error("missing mandatory claim: {claim}")]
    MissingMandatoryClaim {
        /// The registered claim name.
        claim: &'static str,
    },

    /// A claim is present but fails its policy check.
    #[error("invalid claim {claim}: {reason}")]
    InvalidClaim {
        /// The registered claim name.
        claim: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// The token's `exp` claim lies in the past.
    #[error("token expired at {expired_at} (unix)")]
    TokenExpired {
        /// The `exp` timestamp, in Unix epoch seconds.
        expired_at: i64,
    },

    /// The token's `nbf` claim lies in the future.
    #[error("token not valid before {valid_from} (unix)")]
    TokenNotYetValid {
        /// The `nbf` timestamp, in Unix epoch seconds.
        valid_from: i64,
    },

    /// No key profile with the requested name exists in the configuration.
    #[error("unknown key profile: {name}")]
    UnknownKeyProfile {
        /// The requested profile name.
        name: String,
    },

    /// No claims profile with the requested name exists in the configuration.
    #[error("unknown claims profile: {name}")]
    UnknownClaimsProfile {
        /// The requested profile name.
        name: String,
    },

    /// Key material could not be generated, parsed, or used.
    #[error("key failure: {reason}")]
    Key {
        /// What went wrong, without echoing key bytes.
        reason: String,
    },

    /// A key file could not be read or written.
    #[error("key I/O failure at {path}: {source}")]
    Io {
        /// The key file path involved.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}

impl Error {
    pub(crate) fn config(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            reason: reason.into(),
        }
    }

    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedToken {
            reason: reason.into(),
        }
    }

    pub(crate) fn key(reason: impl Into<String>) -> Self {
        Self::Key {
            reason: reason.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Crate-wide result type.
pub type Result<T> = std::result::Result<T, Error>;
