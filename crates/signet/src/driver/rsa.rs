//! RSA family: RSASSA-PKCS1-v1_5 (RS256/384/512) and RSASSA-PSS
//! (PS256/384/512).
//!
//! Private keys persist `n`, `e`, `d`, `p`, `q`; the CRT parameters are
//! recomputed when the key is rebuilt from its components.

use rand::rngs::OsRng;
use rsa::signature::{RandomizedSigner, SignatureEncoding, Signer, Verifier};
use rsa::traits::{PrivateKeyParts, PublicKeyParts};
use rsa::{BigUint, RsaPrivateKey, RsaPublicKey, pkcs1v15, pss};
use sha2::{Sha256, Sha384, Sha512};

use crate::algorithm::Algorithm;
use crate::error::{Error, Result};
use crate::jwk::{Jwk, b64_decode, b64_encode};

// Upper bound for moduli accepted when rebuilding a public key, in bits.
const MAX_MODULUS_BITS: usize = 8192;

pub(crate) fn generate(size_bits: u32) -> Result<Jwk> {
    let mut rng = OsRng;
    let private = RsaPrivateKey::new(&mut rng, size_bits as usize)
        .map_err(|err| Error::key(format!("failed to generate RSA key: {err}")))?;

    let [p, q] = private.primes() else {
        return Err(Error::key("generated RSA key does not have exactly two primes"));
    };

    Ok(Jwk::Rsa {
        n: b64_encode(private.n().to_bytes_be()),
        e: b64_encode(private.e().to_bytes_be()),
        d: Some(b64_encode(private.d().to_bytes_be())),
        p: Some(b64_encode(p.to_bytes_be())),
        q: Some(b64_encode(q.to_bytes_be())),
    })
}

pub(crate) fn sign(algorithm: Algorithm, jwk: &Jwk, message: &[u8]) -> Result<Vec<u8>> {
    let private = private_key(jwk)?;

    let signature = match algorithm {
        Algorithm::RS256 => pkcs1v15::SigningKey::<Sha256>::new(private)
            .try_sign(message)
            .map(|sig| sig.to_vec()),
        Algorithm::RS384 => pkcs1v15::SigningKey::<Sha384>::new(private)
            .try_sign(message)
            .map(|sig| sig.to_vec()),
        Algorithm::RS512 => pkcs1v15::SigningKey::<Sha512>::new(private)
            .try_sign(message)
            .map(|sig| sig.to_vec()),
        Algorithm::PS256 => pss::SigningKey::<Sha256>::new(private)
            .try_sign_with_rng(&mut OsRng, message)
            .map(|sig| sig.to_vec()),
        Algorithm::PS384 => pss::SigningKey::<Sha384>::new(private)
            .try_sign_with_rng(&mut OsRng, message)
            .map(|sig| sig.to_vec()),
        Algorithm::PS512 => pss::SigningKey::<Sha512>::new(private)
            .try_sign_with_rng(&mut OsRng, message)
            .map(|sig| sig.to_vec()),
        other => return Err(Error::key(format!("{other} is not an RSA algorithm"))),
    };

    signature.map_err(|err| Error::key(format!("RSA signing failed: {err}")))
}

pub(crate) fn verify(
    algorithm: Algorithm,
    jwk: &Jwk,
    message: &[u8],
    signature: &[u8],
) -> Result<bool> {
    let public = public_key(jwk)?;

    let valid = match algorithm {
        Algorithm::RS256 => {
            let Ok(signature) = pkcs1v15::Signature::try_from(signature) else {
                return Ok(false);
            };
            pkcs1v15::VerifyingKey::<Sha256>::new(public)
                .verify(message, &signature)
                .is_ok()
        }
        Algorithm::RS384 => {
            let Ok(signature) = pkcs1v15::Signature::try_from(signature) else {
                return Ok(false);
            };
            pkcs1v15::VerifyingKey::<Sha384>::new(public)
                .verify(message, &signature)
                .is_ok()
        }
        Algorithm::RS512 => {
            let Ok(signature) = pkcs1v15::Signature::try_from(signature) else {
                return Ok(false);
            };
            pkcs1v15::VerifyingKey::<Sha512>::new(public)
                .verify(message, &signature)
                .is_ok()
        }
        Algorithm::PS256 => {
            let Ok(signature) = pss::Signature::try_from(signature) else {
                return Ok(false);
            };
            pss::VerifyingKey::<Sha256>::new(public)
                .verify(message, &signature)
                .is_ok()
        }
        Algorithm::PS384 => {
            let Ok(signature) = pss::Signature::try_from(signature) else {
                return Ok(false);
            };
            pss::VerifyingKey::<Sha384>::new(public)
                .verify(message, &signature)
                .is_ok()
        }
        Algorithm::PS512 => {
            let Ok(signature) = pss::Signature::try_from(signature) else {
                return Ok(false);
            };
            pss::VerifyingKey::<Sha512>::new(public)
                .verify(message, &signature)
                .is_ok()
        }
        other => return Err(Error::key(format!("{other} is not an RSA algorithm"))),
    };

    Ok(valid)
}

fn private_key(jwk: &Jwk) -> Result<RsaPrivateKey> {
    let Jwk::Rsa { n, e, d: Some(d), p, q } = jwk else {
        return Err(Error::key("RSA key holds no private exponent, cannot sign"));
    };

    let n = component(n, "n")?;
    let e = component(e, "e")?;
    let d = component(d, "d")?;

    // Files written by other tools may omit the primes; from_components
    // recovers them from n, e, d in that case.
    let primes = match (p, q) {
        (Some(p), Some(q)) => vec![component(p, "p")?, component(q, "q")?],
        _ => Vec::new(),
    };

    RsaPrivateKey::from_components(n, e, d, primes)
        .map_err(|err| Error::key(format!("invalid RSA private key components: {err}")))
}

fn public_key(jwk: &Jwk) -> Result<RsaPublicKey> {
    let Jwk::Rsa { n, e, .. } = jwk else {
        return Err(Error::key(format!(
            "RSA requires an RSA key, got kty={}",
            jwk.key_type()
        )));
    };

    RsaPublicKey::new_with_max_size(component(n, "n")?, component(e, "e")?, MAX_MODULUS_BITS)
        .map_err(|err| Error::key(format!("invalid RSA public key components: {err}")))
}

fn component(value: &str, name: &str) -> Result<BigUint> {
    let bytes = b64_decode(value)
        .map_err(|err| Error::key(format!("RSA '{name}' is not base64url: {err}")))?;
    Ok(BigUint::from_bytes_be(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pkcs1v15_round_trip() {
        let jwk = generate(2048).unwrap();
        let signature = sign(Algorithm::RS256, &jwk, b"message").unwrap();
        assert_eq!(signature.len(), 256);

        assert!(verify(Algorithm::RS256, &jwk, b"message", &signature).unwrap());
        assert!(!verify(Algorithm::RS256, &jwk, b"other", &signature).unwrap());
    }

    #[test]
    fn pss_round_trip() {
        let jwk = generate(2048).unwrap();
        let signature = sign(Algorithm::PS256, &jwk, b"message").unwrap();

        assert!(verify(Algorithm::PS256, &jwk, b"message", &signature).unwrap());
        assert!(!verify(Algorithm::PS256, &jwk, b"other", &signature).unwrap());
    }

    #[test]
    fn key_reloaded_from_components_signs_identically() {
        let jwk = generate(2048).unwrap();
        let json = serde_json::to_string(&jwk).unwrap();
        let reloaded: Jwk = serde_json::from_str(&json).unwrap();

        let signature = sign(Algorithm::RS256, &reloaded, b"message").unwrap();
        assert!(verify(Algorithm::RS256, &jwk, b"message", &signature).unwrap());
    }

    #[test]
    fn public_key_cannot_sign() {
        let public = generate(2048).unwrap().to_public();
        assert!(matches!(
            sign(Algorithm::RS256, &public, b"message"),
            Err(Error::Key { .. })
        ));
    }
}
