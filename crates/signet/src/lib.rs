//! # Signet - JWT signing and verification core
//!
//! Signet issues and verifies JSON Web Tokens (compact JWS, RFC 7515/7519)
//! for stateless API authentication. One [`Driver`] owns one key: it
//! validates its configuration, lazily creates or loads the key file, and
//! exposes sign/verify/check operations plus the compact codec.
//!
//! ## Core Features
//!
//! - **Four signature families** - ECDSA (ES256/384/512), EdDSA (Ed25519),
//!   HMAC (HS256/384/512), RSA (RS/PS 256/384/512), each behind a cargo
//!   feature
//! - **Key management** - JWK key files generated on first use, persisted
//!   with owner-only permissions, or kept ephemeral in memory
//! - **Declarative claims** - one policy drives both claim generation at
//!   signing time and mandatory-claim enforcement at check time
//! - **Algorithm-confusion guard** - a token's header `alg` must match the
//!   driver's configured algorithm before claims are even looked at
//!
//! ## Architecture
//!
//! - `algorithm` - algorithm registry and family mapping
//! - `jwk` - portable key material and key-file persistence
//! - `jws` - compact serialization
//! - `config` - key/claims configuration and named profiles
//! - `driver` - the driver, its factory, and the per-family signature code
//! - `claims` - registered-claim generation and checking
//!
//! ## Example
//!
//! ```rust
//! use signet::{ClaimsConfig, Driver, KeyConfig};
//!
//! # fn main() -> signet::Result<()> {
//! // Ephemeral HMAC key; persistent keys take a `path`.
//! let driver = Driver::from_config(
//!     &KeyConfig::new("HS256").with_size(256),
//!     &ClaimsConfig::new().issuer("acme").ttl(3600),
//! )?;
//!
//! let token = driver.sign_subject("42")?.compact();
//! let claims = driver.authenticate(&token)?;
//! assert_eq!(claims["sub"], "42");
//! # Ok(())
//! # }
//! ```

pub mod algorithm;
pub mod claims;
pub mod config;
pub mod driver;
pub mod error;
pub mod jwk;
pub mod jws;

pub use algorithm::{Algorithm, CURVE_ED25519, EcCurve, KeyFamily};
pub use claims::{ClaimsChecker, ClaimsGenerator};
pub use config::{ClaimsConfig, KeyConfig, SignetConfig};
pub use driver::Driver;
pub use error::{Error, Result};
pub use jwk::{Jwk, KEY_FILE_MODE};
pub use jws::{Header, Jws};
