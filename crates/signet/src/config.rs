//! Configuration surface: key parameters, claims policy, and named profiles.
//!
//! A [`SignetConfig`] mirrors the deployment layout: a map of key profiles
//! and a map of claims profiles, with one of each selected as active. The
//! library never reads environment variables or files on its own; callers
//! deserialize this structure from whatever store they use.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Parameters for one signing key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyConfig {
    /// Algorithm name (`ES256`, `HS512`, ...). Required.
    pub algorithm: String,

    /// Key file location. Absent means an ephemeral in-memory key that is
    /// never persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Named curve, for the ECDSA and EdDSA families. Defaults to the curve
    /// the algorithm pairs with.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub curve: Option<String>,

    /// Key size in bits, for the HMAC and RSA families.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
}

impl KeyConfig {
    /// A configuration with only the algorithm set.
    #[must_use]
    pub fn new(algorithm: impl Into<String>) -> Self {
        Self {
            algorithm: algorithm.into(),
            path: None,
            curve: None,
            size: None,
        }
    }

    /// Set the key file location.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Set the named curve.
    #[must_use]
    pub fn with_curve(mut self, curve: impl Into<String>) -> Self {
        self.curve = Some(curve.into());
        self
    }

    /// Set the key size in bits.
    #[must_use]
    pub fn with_size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }
}

/// Which registered claims are generated and enforced, and with what values.
///
/// Every enabled claim is mandatory at check time: a token lacking it fails
/// validation before its value would even be inspected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClaimsConfig {
    /// Issuer string; enables generation and exact-match enforcement of `iss`.
    pub iss: Option<String>,

    /// Audience string; enables generation of `aud` and its set-membership
    /// enforcement (an incoming `aud` may be a string or an array).
    pub aud: Option<String>,

    /// Token lifetime in seconds from issue time; enables `exp`.
    pub ttl: Option<u64>,

    /// Stamp and enforce `nbf` (not before), set to the issue instant.
    pub nbf: bool,

    /// Stamp and enforce `iat` (issued at).
    pub iat: bool,

    /// Stamp `jti` with a fresh UUID v4 per token.
    pub jti: bool,
}

impl ClaimsConfig {
    /// A policy with every claim disabled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable the `iss` claim.
    #[must_use]
    pub fn issuer(mut self, iss: impl Into<String>) -> Self {
        self.iss = Some(iss.into());
        self
    }

    /// Enable the `aud` claim.
    #[must_use]
    pub fn audience(mut self, aud: impl Into<String>) -> Self {
        self.aud = Some(aud.into());
        self
    }

    /// Enable the `exp` claim with the given lifetime in seconds.
    #[must_use]
    pub fn ttl(mut self, seconds: u64) -> Self {
        self.ttl = Some(seconds);
        self
    }

    /// Enable the `nbf` claim.
    #[must_use]
    pub fn not_before(mut self) -> Self {
        self.nbf = true;
        self
    }

    /// Enable the `iat` claim.
    #[must_use]
    pub fn issued_at(mut self) -> Self {
        self.iat = true;
        self
    }

    /// Enable the `jti` claim.
    #[must_use]
    pub fn token_id(mut self) -> Self {
        self.jti = true;
        self
    }
}

fn default_profile() -> String {
    "default".to_owned()
}

/// Named key and claims profiles with one of each selected as active.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SignetConfig {
    /// Name of the active key profile.
    pub key: String,

    /// Key profiles by name.
    pub keys: BTreeMap<String, KeyConfig>,

    /// Name of the active claims profile.
    pub payload: String,

    /// Claims profiles by name.
    pub payloads: BTreeMap<String, ClaimsConfig>,
}

impl Default for SignetConfig {
    fn default() -> Self {
        Self {
            key: default_profile(),
            keys: BTreeMap::new(),
            payload: default_profile(),
            payloads: BTreeMap::new(),
        }
    }
}

impl SignetConfig {
    /// Look up a key profile by name.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownKeyProfile`] when no profile carries that name.
    pub fn key_profile(&self, name: &str) -> Result<&KeyConfig> {
        self.keys.get(name).ok_or_else(|| Error::UnknownKeyProfile {
            name: name.to_owned(),
        })
    }

    /// Look up a claims profile by name.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownClaimsProfile`] when no profile carries that name.
    pub fn claims_profile(&self, name: &str) -> Result<&ClaimsConfig> {
        self.payloads
            .get(name)
            .ok_or_else(|| Error::UnknownClaimsProfile {
                name: name.to_owned(),
            })
    }

    /// The active key profile.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownKeyProfile`] when the active name has no profile.
    pub fn active_key(&self) -> Result<&KeyConfig> {
        self.key_profile(&self.key)
    }

    /// The active claims profile.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownClaimsProfile`] when the active name has no profile.
    pub fn active_claims(&self) -> Result<&ClaimsConfig> {
        self.claims_profile(&self.payload)
    }
}

/// Probe that an existing key file can actually be opened for reading.
pub(crate) fn check_key_readable(path: &Path) -> Result<()> {
    match fs::File::open(path) {
        Ok(_) => Ok(()),
        Err(err) => Err(Error::config(format!(
            "key exists at {} but is not readable: {err}",
            path.display()
        ))),
    }
}

/// Check that a missing key file could be created at `path`.
///
/// The immediate parent directory must exist and be writable. When it does
/// not exist, the loop walks up to the nearest existing ancestor (bounded by
/// the filesystem root) so the error distinguishes "not writable" from
/// "path invalid".
pub(crate) fn check_key_creatable(path: &Path) -> Result<()> {
    let parent = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    if parent.exists() {
        if !parent.is_dir() {
            return Err(Error::config(format!(
                "{} is not a directory and thus the key cannot be created at {}",
                parent.display(),
                path.display()
            )));
        }
        if is_write_protected(parent) {
            return Err(Error::config(format!(
                "directory {} exists but is not writable and thus the key cannot be created at {}",
                parent.display(),
                path.display()
            )));
        }
        return Ok(());
    }

    let mut ancestor = parent.parent();
    while let Some(dir) = ancestor {
        let dir = if dir.as_os_str().is_empty() {
            Path::new(".")
        } else {
            dir
        };
        if dir.exists() {
            if is_write_protected(dir) {
                return Err(Error::config(format!(
                    "directory {} does not exist and its nearest existing ancestor {} is not writable",
                    parent.display(),
                    dir.display()
                )));
            }
            break;
        }
        ancestor = dir.parent();
    }

    Err(Error::config(format!(
        "directory {} does not exist and thus the key cannot be created at {}",
        parent.display(),
        path.display()
    )))
}

// Mode-bit check; deliberately ignores ownership so the diagnosis is
// deterministic regardless of the calling user.
fn is_write_protected(dir: &Path) -> bool {
    fs::metadata(dir)
        .map(|meta| meta.permissions().readonly())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn profiles_resolve_by_name() {
        let mut config = SignetConfig::default();
        config
            .keys
            .insert("default".into(), KeyConfig::new("HS256").with_size(256));
        config
            .payloads
            .insert("default".into(), ClaimsConfig::new().issuer("acme"));

        assert_eq!(config.active_key().unwrap().algorithm, "HS256");
        assert_eq!(
            config.active_claims().unwrap().iss.as_deref(),
            Some("acme")
        );

        assert!(matches!(
            config.key_profile("missing"),
            Err(Error::UnknownKeyProfile { .. })
        ));
        assert!(matches!(
            config.claims_profile("missing"),
            Err(Error::UnknownClaimsProfile { .. })
        ));
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let value = serde_json::json!({
            "keys": {
                "default": { "algorithm": "ES512", "curve": "P-521" }
            },
            "payloads": {
                "default": { "iss": "acme", "ttl": 3600, "nbf": true }
            }
        });
        let config: SignetConfig = serde_json::from_value(value).unwrap();

        assert_eq!(config.key, "default");
        assert_eq!(config.payload, "default");
        let claims = config.active_claims().unwrap();
        assert_eq!(claims.ttl, Some(3600));
        assert!(claims.nbf);
        assert!(!claims.iat);
    }

    #[test]
    fn creatable_check_accepts_existing_writable_directory() {
        let dir = tempfile::tempdir().unwrap();
        check_key_creatable(&dir.path().join("key.json")).unwrap();
    }

    #[test]
    fn creatable_check_rejects_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let err = check_key_creatable(&dir.path().join("missing/deeper/key.json")).unwrap_err();
        assert!(matches!(err, Error::InvalidConfiguration { .. }));
        assert!(err.to_string().contains("does not exist"));
    }

    #[cfg(unix)]
    #[test]
    fn creatable_check_reports_write_protected_directory() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let locked = dir.path().join("locked");
        fs::create_dir(&locked).unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o555)).unwrap();

        let err = check_key_creatable(&locked.join("key.json")).unwrap_err();
        assert!(err.to_string().contains("not writable"));

        // restore so the tempdir can be cleaned up
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
    }
}
