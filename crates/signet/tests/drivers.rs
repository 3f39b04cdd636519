//! Driver behavior across all signature families: round trips, tamper
//! detection, key-file handling, and configuration validation.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use serde_json::{Map, Value, json};
use signet::{ClaimsConfig, Driver, Error, Jws, KeyConfig};

fn claims_of(token: &str) -> Map<String, Value> {
    Jws::decode(token).unwrap().claims().unwrap()
}

fn subject_claims() -> Map<String, Value> {
    json!({ "sub": "42" }).as_object().unwrap().clone()
}

/// Ephemeral configurations covering every family. RSA runs at its 2048-bit
/// floor; the larger RSA minimums make key generation too slow for a test.
fn ephemeral_configs() -> Vec<KeyConfig> {
    vec![
        KeyConfig::new("HS256").with_size(256),
        KeyConfig::new("HS384").with_size(384),
        KeyConfig::new("HS512").with_size(512),
        KeyConfig::new("ES256"),
        KeyConfig::new("ES384"),
        KeyConfig::new("ES512"),
        KeyConfig::new("EdDSA"),
        KeyConfig::new("RS256").with_size(2048),
        KeyConfig::new("PS256").with_size(2048),
    ]
}

#[test]
fn round_trip_every_family() {
    for config in ephemeral_configs() {
        let driver = Driver::from_config(&config, &ClaimsConfig::new()).unwrap();

        let jws = driver.sign(&subject_claims()).unwrap();
        assert!(driver.verify(&jws), "{} round trip failed", config.algorithm);

        let token = driver.serialize(&jws);
        assert!(driver.verify_token(&token).unwrap());
        assert_eq!(claims_of(&token)["sub"], "42");

        let checked = driver.authenticate(&token).unwrap();
        assert_eq!(checked["sub"], "42");
    }
}

#[test]
#[ignore = "3072/4096-bit RSA key generation takes minutes in debug builds"]
fn round_trip_large_rsa_variants() {
    for config in [
        KeyConfig::new("RS384").with_size(3072),
        KeyConfig::new("RS512").with_size(4096),
        KeyConfig::new("PS384").with_size(3072),
        KeyConfig::new("PS512").with_size(4096),
    ] {
        let driver = Driver::from_config(&config, &ClaimsConfig::new()).unwrap();
        let token = driver.sign_serialized(&subject_claims()).unwrap();
        assert!(driver.verify_token(&token).unwrap(), "{}", config.algorithm);
    }
}

#[test]
fn tampered_signature_does_not_verify() {
    for config in [
        KeyConfig::new("HS256").with_size(256),
        KeyConfig::new("ES256"),
        KeyConfig::new("EdDSA"),
    ] {
        let driver = Driver::from_config(&config, &ClaimsConfig::new()).unwrap();
        let token = driver.sign_serialized(&subject_claims()).unwrap();

        let (prefix, signature) = token.rsplit_once('.').unwrap();
        let mut raw = URL_SAFE_NO_PAD.decode(signature).unwrap();
        raw[0] ^= 0x01;
        let tampered = format!("{prefix}.{}", URL_SAFE_NO_PAD.encode(raw));

        assert!(
            !driver.verify_token(&tampered).unwrap(),
            "{} accepted a tampered signature",
            config.algorithm
        );
    }
}

#[test]
fn tampered_payload_does_not_verify() {
    let driver =
        Driver::from_config(&KeyConfig::new("HS256").with_size(256), &ClaimsConfig::new())
            .unwrap();
    let token = driver.sign_serialized(&subject_claims()).unwrap();

    let parts: Vec<&str> = token.split('.').collect();
    let forged_payload = URL_SAFE_NO_PAD.encode(br#"{"sub":"1337"}"#);
    let forged = format!("{}.{}.{}", parts[0], forged_payload, parts[2]);

    assert!(!driver.verify_token(&forged).unwrap());
}

#[test]
fn check_rejects_a_foreign_algorithm_header() {
    // A validly signed HMAC token must not pass an ECDSA driver's check,
    // regardless of its signature.
    let hmac = Driver::from_config(&KeyConfig::new("HS256").with_size(256), &ClaimsConfig::new())
        .unwrap();
    let ecdsa = Driver::from_config(&KeyConfig::new("ES256"), &ClaimsConfig::new()).unwrap();

    let token = hmac.sign_serialized(&subject_claims()).unwrap();
    let err = ecdsa.check_token(&token).unwrap_err();

    assert!(matches!(
        err,
        Error::AlgorithmMismatch { expected: "ES256", .. }
    ));
}

#[test]
fn same_path_drivers_cross_verify() {
    let dir = tempfile::tempdir().unwrap();
    let config = KeyConfig::new("ES256").with_path(dir.path().join("shared.json"));

    let first = Driver::from_config(&config, &ClaimsConfig::new()).unwrap();
    let second = Driver::from_config(&config, &ClaimsConfig::new()).unwrap();

    let from_first = first.sign_serialized(&subject_claims()).unwrap();
    let from_second = second.sign_serialized(&subject_claims()).unwrap();

    assert!(second.verify_token(&from_first).unwrap());
    assert!(first.verify_token(&from_second).unwrap());
    assert_eq!(first.public_jwk(), second.public_jwk());
}

#[test]
#[cfg(unix)]
fn first_construction_writes_an_owner_only_jwk() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("es512.json");
    let config = KeyConfig::new("ES512")
        .with_curve("P-521")
        .with_path(&path);

    Driver::from_config(&config, &ClaimsConfig::new()).unwrap();

    let raw = std::fs::read_to_string(&path).unwrap();
    let jwk: Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(jwk["kty"], "EC");
    assert_eq!(jwk["crv"], "P-521");

    let mode = std::fs::metadata(&path).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
}

#[test]
fn hmac_size_rules_are_enforced() {
    // Not a multiple of 8.
    let err = Driver::from_config(
        &KeyConfig::new("HS256").with_size(255),
        &ClaimsConfig::new(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::InvalidConfiguration { .. }));

    // Below the HS256 minimum.
    let err = Driver::from_config(
        &KeyConfig::new("HS256").with_size(128),
        &ClaimsConfig::new(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::InvalidConfiguration { .. }));

    // Exactly the minimum.
    Driver::from_config(
        &KeyConfig::new("HS256").with_size(256),
        &ClaimsConfig::new(),
    )
    .unwrap();
}

#[test]
fn unknown_algorithm_is_reported_as_such() {
    let err =
        Driver::from_config(&KeyConfig::new("XS256"), &ClaimsConfig::new()).unwrap_err();
    assert!(matches!(err, Error::UnknownAlgorithm { .. }));
}

#[test]
fn missing_key_directory_is_invalid_configuration() {
    let dir = tempfile::tempdir().unwrap();
    let config = KeyConfig::new("ES256").with_path(dir.path().join("no/such/dir/key.json"));

    let err = Driver::from_config(&config, &ClaimsConfig::new()).unwrap_err();
    assert!(matches!(err, Error::InvalidConfiguration { .. }));
}

#[test]
fn key_file_of_the_wrong_family_is_rejected_at_construction() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("oct.json");

    // Persist an HMAC secret, then point an ECDSA driver at it.
    Driver::from_config(
        &KeyConfig::new("HS256").with_size(256).with_path(&path),
        &ClaimsConfig::new(),
    )
    .unwrap();

    let err = Driver::from_config(
        &KeyConfig::new("ES256").with_path(&path),
        &ClaimsConfig::new(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::InvalidConfiguration { .. }));
}

#[test]
fn public_jwk_exposes_no_private_components() {
    let driver = Driver::from_config(&KeyConfig::new("ES256"), &ClaimsConfig::new()).unwrap();
    let json = serde_json::to_value(driver.public_jwk()).unwrap();

    assert_eq!(json["kty"], "EC");
    assert!(json.get("d").is_none());
}

#[test]
fn malformed_tokens_are_distinguished_from_invalid_ones() {
    let driver =
        Driver::from_config(&KeyConfig::new("HS256").with_size(256), &ClaimsConfig::new())
            .unwrap();

    for garbage in ["", "only-one-part", "two.parts", "a.b.c.d", "$$$.e30.c2ln"] {
        assert!(matches!(
            driver.verify_token(garbage),
            Err(Error::MalformedToken { .. })
        ));
        assert!(matches!(
            driver.authenticate(garbage),
            Err(Error::MalformedToken { .. })
        ));
    }
}

#[test]
fn authenticate_rejects_a_signature_from_another_key() {
    let signer = Driver::from_config(&KeyConfig::new("ES256"), &ClaimsConfig::new()).unwrap();
    let verifier = Driver::from_config(&KeyConfig::new("ES256"), &ClaimsConfig::new()).unwrap();

    let token = signer.sign_serialized(&subject_claims()).unwrap();
    assert!(matches!(
        verifier.authenticate(&token),
        Err(Error::InvalidSignature)
    ));
}
