//! Validates a decoded payload against the configured claims policy.

use chrono::Utc;
use serde_json::{Map, Value};

use crate::config::ClaimsConfig;
use crate::error::{Error, Result};

/// Checks registered claims in the fixed order `iss`, `aud`, `exp`, `nbf`,
/// `iat`, stopping at the first violation.
///
/// Every claim the policy enables is mandatory: its absence fails with
/// [`Error::MissingMandatoryClaim`] before the value would be inspected.
/// The audience check is set-membership — an incoming `aud` may be a plain
/// string or an array of strings containing the configured audience.
#[derive(Debug, Clone)]
pub struct ClaimsChecker {
    config: ClaimsConfig,
}

impl ClaimsChecker {
    /// Create a checker for the given policy.
    #[must_use]
    pub fn new(config: ClaimsConfig) -> Self {
        Self { config }
    }

    /// Check a payload against the policy, using the system clock.
    ///
    /// # Errors
    ///
    /// The first violation found, in policy order: missing mandatory claim,
    /// issuer/audience mismatch, [`Error::TokenExpired`],
    /// [`Error::TokenNotYetValid`], or a future `iat`.
    pub fn check(&self, claims: &Map<String, Value>) -> Result<()> {
        self.check_at(claims, Utc::now().timestamp())
    }

    /// Check a payload as of `now` (Unix epoch seconds).
    ///
    /// # Errors
    ///
    /// See [`ClaimsChecker::check`].
    pub fn check_at(&self, claims: &Map<String, Value>, now: i64) -> Result<()> {
        if let Some(expected) = &self.config.iss {
            let iss = string_claim(claims, "iss")?;
            if iss != expected {
                return Err(Error::InvalidClaim {
                    claim: "iss",
                    reason: format!("expected issuer {expected:?}, got {iss:?}"),
                });
            }
        }

        if let Some(expected) = &self.config.aud {
            check_audience(claims, expected)?;
        }

        if self.config.ttl.is_some() {
            let exp = timestamp_claim(claims, "exp")?;
            if exp < now {
                return Err(Error::TokenExpired { expired_at: exp });
            }
        }

        if self.config.nbf {
            let nbf = timestamp_claim(claims, "nbf")?;
            if nbf > now {
                return Err(Error::TokenNotYetValid { valid_from: nbf });
            }
        }

        if self.config.iat {
            let iat = timestamp_claim(claims, "iat")?;
            if iat > now {
                return Err(Error::InvalidClaim {
                    claim: "iat",
                    reason: format!("issued in the future ({iat} > {now})"),
                });
            }
        }

        Ok(())
    }
}

fn string_claim<'a>(claims: &'a Map<String, Value>, name: &'static str) -> Result<&'a str> {
    let value = claims
        .get(name)
        .ok_or(Error::MissingMandatoryClaim { claim: name })?;

    value.as_str().ok_or_else(|| Error::InvalidClaim {
        claim: name,
        reason: "not a string".to_owned(),
    })
}

fn timestamp_claim(claims: &Map<String, Value>, name: &'static str) -> Result<i64> {
    let value = claims
        .get(name)
        .ok_or(Error::MissingMandatoryClaim { claim: name })?;

    value.as_i64().ok_or_else(|| Error::InvalidClaim {
        claim: name,
        reason: "not an integer Unix timestamp".to_owned(),
    })
}

fn check_audience(claims: &Map<String, Value>, expected: &str) -> Result<()> {
    let value = claims
        .get("aud")
        .ok_or(Error::MissingMandatoryClaim { claim: "aud" })?;

    let found = match value {
        Value::String(aud) => aud == expected,
        Value::Array(entries) => entries
            .iter()
            .any(|entry| entry.as_str() == Some(expected)),
        _ => {
            return Err(Error::InvalidClaim {
                claim: "aud",
                reason: "not a string or array of strings".to_owned(),
            });
        }
    };

    if found {
        Ok(())
    } else {
        Err(Error::InvalidClaim {
            claim: "aud",
            reason: format!("audience {expected:?} not present"),
        })
    }
}
