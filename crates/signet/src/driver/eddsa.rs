//! EdDSA family: Ed25519 only.

use ed25519_dalek::{Signature, Signer as _, SigningKey, Verifier as _, VerifyingKey};
use rand::rngs::OsRng;

use crate::algorithm::CURVE_ED25519;
use crate::error::{Error, Result};
use crate::jwk::{Jwk, b64_decode, b64_encode};

pub(crate) fn generate() -> Jwk {
    let key = SigningKey::generate(&mut OsRng);

    Jwk::Okp {
        crv: CURVE_ED25519.to_owned(),
        x: b64_encode(key.verifying_key().to_bytes()),
        d: Some(b64_encode(key.to_bytes())),
    }
}

pub(crate) fn sign(jwk: &Jwk, message: &[u8]) -> Result<Vec<u8>> {
    let Jwk::Okp { crv, d: Some(d), .. } = jwk else {
        return Err(Error::key("EdDSA requires an OKP key with a private seed"));
    };
    ensure_ed25519(crv)?;

    let seed: [u8; 32] = b64_decode(d)
        .map_err(|err| Error::key(format!("OKP 'd' is not base64url: {err}")))?
        .try_into()
        .map_err(|_| Error::key("Ed25519 seed must be exactly 32 bytes"))?;

    let key = SigningKey::from_bytes(&seed);
    Ok(key.sign(message).to_bytes().to_vec())
}

pub(crate) fn verify(jwk: &Jwk, message: &[u8], signature: &[u8]) -> Result<bool> {
    let Jwk::Okp { crv, x, .. } = jwk else {
        return Err(Error::key("not an OKP key"));
    };
    ensure_ed25519(crv)?;

    let public: [u8; 32] = b64_decode(x)
        .map_err(|err| Error::key(format!("OKP 'x' is not base64url: {err}")))?
        .try_into()
        .map_err(|_| Error::key("Ed25519 public key must be exactly 32 bytes"))?;

    let key = VerifyingKey::from_bytes(&public)
        .map_err(|err| Error::key(format!("invalid Ed25519 public key: {err}")))?;

    let Ok(signature) = Signature::from_slice(signature) else {
        return Ok(false);
    };
    Ok(key.verify(message, &signature).is_ok())
}

fn ensure_ed25519(crv: &str) -> Result<()> {
    if crv == CURVE_ED25519 {
        Ok(())
    } else {
        Err(Error::key(format!(
            "unsupported OKP curve {crv} (expected {CURVE_ED25519})"
        )))
    }
}
