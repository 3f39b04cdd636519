//! Builds the registered claims stamped into every issued token.

use chrono::Utc;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::config::ClaimsConfig;

/// Produces the registered claims enabled by a [`ClaimsConfig`].
///
/// Time-based claims are evaluated against the wall clock at generation time
/// and expressed in Unix epoch seconds. The `jti` claim, when enabled, is a
/// fresh UUID v4 per token and is never reused.
#[derive(Debug, Clone)]
pub struct ClaimsGenerator {
    config: ClaimsConfig,
}

impl ClaimsGenerator {
    /// Create a generator for the given policy.
    #[must_use]
    pub fn new(config: ClaimsConfig) -> Self {
        Self { config }
    }

    /// Generate the configured claims at the current instant.
    #[must_use]
    pub fn generate(&self) -> Map<String, Value> {
        self.generate_at(Utc::now().timestamp())
    }

    /// Generate the configured claims as of `now` (Unix epoch seconds).
    #[must_use]
    pub fn generate_at(&self, now: i64) -> Map<String, Value> {
        let mut claims = Map::new();

        if let Some(iss) = &self.config.iss {
            claims.insert("iss".to_owned(), Value::from(iss.clone()));
        }

        if let Some(aud) = &self.config.aud {
            claims.insert("aud".to_owned(), Value::from(aud.clone()));
        }

        if let Some(ttl) = self.config.ttl {
            let expires_at = now.saturating_add(ttl as i64);
            claims.insert("exp".to_owned(), Value::from(expires_at));
        }

        if self.config.nbf {
            claims.insert("nbf".to_owned(), Value::from(now));
        }

        if self.config.iat {
            claims.insert("iat".to_owned(), Value::from(now));
        }

        if self.config.jti {
            let id = Uuid::new_v4().to_string();
            claims.insert("jti".to_owned(), Value::from(id));
        }

        claims
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn disabled_policy_generates_nothing() {
        let generator = ClaimsGenerator::new(ClaimsConfig::new());
        assert!(generator.generate_at(1_700_000_000).is_empty());
    }

    #[test]
    fn enabled_claims_are_stamped_from_now() {
        let config = ClaimsConfig::new()
            .issuer("acme")
            .audience("api")
            .ttl(3600)
            .not_before()
            .issued_at();
        let claims = ClaimsGenerator::new(config).generate_at(1_700_000_000);

        assert_eq!(claims["iss"], "acme");
        assert_eq!(claims["aud"], "api");
        assert_eq!(claims["exp"], 1_700_003_600i64);
        assert_eq!(claims["nbf"], 1_700_000_000i64);
        assert_eq!(claims["iat"], 1_700_000_000i64);
        assert!(!claims.contains_key("jti"));
    }

    #[test]
    fn token_ids_are_unique_per_generation() {
        let generator = ClaimsGenerator::new(ClaimsConfig::new().token_id());

        let first = generator.generate_at(0)["jti"].clone();
        let second = generator.generate_at(0)["jti"].clone();

        assert_ne!(first, second);
        assert!(Uuid::parse_str(first.as_str().unwrap()).is_ok());
    }
}
