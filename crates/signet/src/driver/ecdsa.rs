//! ECDSA family: ES256, ES384, ES512 over the NIST curves P-256, P-384,
//! P-521. Signatures are the fixed-size `r || s` form JWS requires.

use rand::rngs::OsRng;

use crate::algorithm::{Algorithm, EcCurve};
use crate::error::{Error, Result};
use crate::jwk::{Jwk, b64_decode, b64_encode};

pub(crate) fn generate(curve: EcCurve) -> Result<Jwk> {
    let (d, x, y) = match curve {
        EcCurve::P256 => {
            let key = p256::ecdsa::SigningKey::random(&mut OsRng);
            let point = key.verifying_key().to_encoded_point(false);
            (key.to_bytes().to_vec(), coordinate(point.x())?, coordinate(point.y())?)
        }
        EcCurve::P384 => {
            let key = p384::ecdsa::SigningKey::random(&mut OsRng);
            let point = key.verifying_key().to_encoded_point(false);
            (key.to_bytes().to_vec(), coordinate(point.x())?, coordinate(point.y())?)
        }
        EcCurve::P521 => {
            let key = p521::ecdsa::SigningKey::random(&mut OsRng);
            let point = p521::ecdsa::VerifyingKey::from(&key).to_encoded_point(false);
            (key.to_bytes().to_vec(), coordinate(point.x())?, coordinate(point.y())?)
        }
    };

    Ok(Jwk::Ec {
        crv: curve.as_str().to_owned(),
        x: b64_encode(x),
        y: b64_encode(y),
        d: Some(b64_encode(d)),
    })
}

pub(crate) fn sign(algorithm: Algorithm, jwk: &Jwk, message: &[u8]) -> Result<Vec<u8>> {
    let curve = key_curve(algorithm, jwk)?;
    let d = private_scalar(jwk)?;

    match curve {
        EcCurve::P256 => {
            use p256::ecdsa::{Signature, SigningKey, signature::Signer};
            let key = SigningKey::from_slice(&d)
                .map_err(|err| Error::key(format!("invalid P-256 private scalar: {err}")))?;
            let signature: Signature = key.sign(message);
            Ok(signature.to_bytes().to_vec())
        }
        EcCurve::P384 => {
            use p384::ecdsa::{Signature, SigningKey, signature::Signer};
            let key = SigningKey::from_slice(&d)
                .map_err(|err| Error::key(format!("invalid P-384 private scalar: {err}")))?;
            let signature: Signature = key.sign(message);
            Ok(signature.to_bytes().to_vec())
        }
        EcCurve::P521 => {
            use p521::ecdsa::{Signature, SigningKey, signature::Signer};
            let key = SigningKey::from_slice(&d)
                .map_err(|err| Error::key(format!("invalid P-521 private scalar: {err}")))?;
            let signature: Signature = key.sign(message);
            Ok(signature.to_bytes().to_vec())
        }
    }
}

pub(crate) fn verify(
    algorithm: Algorithm,
    jwk: &Jwk,
    message: &[u8],
    signature: &[u8],
) -> Result<bool> {
    let curve = key_curve(algorithm, jwk)?;
    let sec1 = public_point(jwk)?;

    match curve {
        EcCurve::P256 => {
            use p256::ecdsa::{Signature, VerifyingKey, signature::Verifier};
            let key = VerifyingKey::from_sec1_bytes(&sec1)
                .map_err(|err| Error::key(format!("invalid P-256 public key: {err}")))?;
            let Ok(signature) = Signature::from_slice(signature) else {
                return Ok(false);
            };
            Ok(key.verify(message, &signature).is_ok())
        }
        EcCurve::P384 => {
            use p384::ecdsa::{Signature, VerifyingKey, signature::Verifier};
            let key = VerifyingKey::from_sec1_bytes(&sec1)
                .map_err(|err| Error::key(format!("invalid P-384 public key: {err}")))?;
            let Ok(signature) = Signature::from_slice(signature) else {
                return Ok(false);
            };
            Ok(key.verify(message, &signature).is_ok())
        }
        EcCurve::P521 => {
            use p521::ecdsa::{Signature, VerifyingKey, signature::Verifier};
            let key = VerifyingKey::from_sec1_bytes(&sec1)
                .map_err(|err| Error::key(format!("invalid P-521 public key: {err}")))?;
            let Ok(signature) = Signature::from_slice(signature) else {
                return Ok(false);
            };
            Ok(key.verify(message, &signature).is_ok())
        }
    }
}

/// The key's curve, which must be the one the algorithm pairs with.
fn key_curve(algorithm: Algorithm, jwk: &Jwk) -> Result<EcCurve> {
    let Jwk::Ec { crv, .. } = jwk else {
        return Err(Error::key(format!(
            "{algorithm} requires an EC key, got kty={}",
            jwk.key_type()
        )));
    };

    let curve = EcCurve::from_name(crv)
        .ok_or_else(|| Error::key(format!("unsupported EC curve {crv}")))?;

    match algorithm.ec_curve() {
        Some(paired) if paired == curve => Ok(curve),
        Some(paired) => Err(Error::key(format!(
            "key curve {curve} cannot be used with {algorithm} (expects {paired})"
        ))),
        None => Err(Error::key(format!("{algorithm} is not an ECDSA algorithm"))),
    }
}

fn private_scalar(jwk: &Jwk) -> Result<Vec<u8>> {
    let Jwk::Ec { d: Some(d), .. } = jwk else {
        return Err(Error::key("EC key holds no private scalar, cannot sign"));
    };

    b64_decode(d).map_err(|err| Error::key(format!("EC private scalar is not base64url: {err}")))
}

/// Uncompressed SEC1 point: `0x04 || x || y`.
fn public_point(jwk: &Jwk) -> Result<Vec<u8>> {
    let Jwk::Ec { x, y, .. } = jwk else {
        return Err(Error::key("not an EC key"));
    };

    let mut sec1 = vec![0x04];
    sec1.extend(
        b64_decode(x).map_err(|err| Error::key(format!("EC 'x' is not base64url: {err}")))?,
    );
    sec1.extend(
        b64_decode(y).map_err(|err| Error::key(format!("EC 'y' is not base64url: {err}")))?,
    );
    Ok(sec1)
}

fn coordinate(bytes: Option<&impl AsRef<[u8]>>) -> Result<Vec<u8>> {
    bytes
        .map(|b| b.as_ref().to_vec())
        .ok_or_else(|| Error::key("failed to extract coordinate from public key point"))
}
