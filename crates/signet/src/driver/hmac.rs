//! HMAC family: HS256, HS384, HS512 with a random symmetric secret.

use hmac::{Hmac, Mac};
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::{Sha256, Sha384, Sha512};
use zeroize::Zeroize;

use crate::algorithm::Algorithm;
use crate::error::{Error, Result};
use crate::jwk::{Jwk, b64_decode, b64_encode};

pub(crate) fn generate(size_bits: u32) -> Jwk {
    let mut secret = vec![0u8; (size_bits / 8) as usize];
    OsRng.fill_bytes(&mut secret);

    let jwk = Jwk::Oct {
        k: b64_encode(&secret),
    };
    secret.zeroize();
    jwk
}

pub(crate) fn sign(algorithm: Algorithm, jwk: &Jwk, message: &[u8]) -> Result<Vec<u8>> {
    let secret = secret_bytes(jwk)?;

    match algorithm {
        Algorithm::HS256 => {
            let mut mac = Hmac::<Sha256>::new_from_slice(&secret)
                .map_err(|err| Error::key(err.to_string()))?;
            mac.update(message);
            Ok(mac.finalize().into_bytes().to_vec())
        }
        Algorithm::HS384 => {
            let mut mac = Hmac::<Sha384>::new_from_slice(&secret)
                .map_err(|err| Error::key(err.to_string()))?;
            mac.update(message);
            Ok(mac.finalize().into_bytes().to_vec())
        }
        Algorithm::HS512 => {
            let mut mac = Hmac::<Sha512>::new_from_slice(&secret)
                .map_err(|err| Error::key(err.to_string()))?;
            mac.update(message);
            Ok(mac.finalize().into_bytes().to_vec())
        }
        other => Err(Error::key(format!("{other} is not an HMAC algorithm"))),
    }
}

pub(crate) fn verify(
    algorithm: Algorithm,
    jwk: &Jwk,
    message: &[u8],
    signature: &[u8],
) -> Result<bool> {
    let secret = secret_bytes(jwk)?;

    // verify_slice compares in constant time
    match algorithm {
        Algorithm::HS256 => {
            let mut mac = Hmac::<Sha256>::new_from_slice(&secret)
                .map_err(|err| Error::key(err.to_string()))?;
            mac.update(message);
            Ok(mac.verify_slice(signature).is_ok())
        }
        Algorithm::HS384 => {
            let mut mac = Hmac::<Sha384>::new_from_slice(&secret)
                .map_err(|err| Error::key(err.to_string()))?;
            mac.update(message);
            Ok(mac.verify_slice(signature).is_ok())
        }
        Algorithm::HS512 => {
            let mut mac = Hmac::<Sha512>::new_from_slice(&secret)
                .map_err(|err| Error::key(err.to_string()))?;
            mac.update(message);
            Ok(mac.verify_slice(signature).is_ok())
        }
        other => Err(Error::key(format!("{other} is not an HMAC algorithm"))),
    }
}

fn secret_bytes(jwk: &Jwk) -> Result<Vec<u8>> {
    let Jwk::Oct { k } = jwk else {
        return Err(Error::key(format!(
            "HMAC requires an oct key, got kty={}",
            jwk.key_type()
        )));
    };

    b64_decode(k).map_err(|err| Error::key(format!("oct 'k' is not base64url: {err}")))
}
