//! Parameter-block byte exactness and KDF determinism.

use pgp_ecdh::{kdf, Curve, HashAlgorithm, PublicKeyAlgorithm, SymmetricAlgorithm};

const ALL_CURVES: [Curve; 4] = [
    Curve::Curve25519,
    Curve::NistP256,
    Curve::NistP384,
    Curve::NistP521,
];

#[test]
fn param_length_decomposes_exactly() {
    // fingerprint longer than 20 octets: only the first 20 must be bound.
    let fingerprint: Vec<u8> = (0..25).collect();
    for curve in ALL_CURVES {
        let (hash, cipher) = curve.default_kdf();
        let param =
            kdf::build_param(PublicKeyAlgorithm::Ecdh, curve, hash, cipher, &fingerprint).unwrap();
        let oid_wire_len = 1 + curve.oid().len();
        assert_eq!(param.len(), oid_wire_len + 1 + 4 + 20 + 20);
        assert_eq!(&param[param.len() - 20..], &fingerprint[..20]);
        assert_eq!(param[oid_wire_len], 18);
        assert_eq!(
            &param[oid_wire_len + 1..oid_wire_len + 5],
            &[0x03, 0x01, hash.id(), cipher.id()]
        );
        assert_eq!(
            &param[oid_wire_len + 5..oid_wire_len + 25],
            b"Anonymous Sender    "
        );
    }
}

#[test]
fn derivation_is_deterministic() {
    let fingerprint = [0xD1u8; 20];
    let param = kdf::build_param(
        PublicKeyAlgorithm::Ecdh,
        Curve::NistP384,
        HashAlgorithm::Sha384,
        SymmetricAlgorithm::Aes192,
        &fingerprint,
    )
    .unwrap();
    let shared: Vec<u8> = (0..48).map(|i| i as u8 ^ 0x5A).collect();
    let first = kdf::derive(HashAlgorithm::Sha384, &shared, 24, &param, false, false).unwrap();
    let second = kdf::derive(HashAlgorithm::Sha384, &shared.clone(), 24, &param, false, false)
        .unwrap();
    assert_eq!(&first[..], &second[..]);
    assert_eq!(first.len(), 24);
}

#[test]
fn distinct_inputs_change_the_key() {
    let param_a = kdf::build_param(
        PublicKeyAlgorithm::Ecdh,
        Curve::NistP256,
        HashAlgorithm::Sha256,
        SymmetricAlgorithm::Aes128,
        &[0xA0; 20],
    )
    .unwrap();
    let param_b = kdf::build_param(
        PublicKeyAlgorithm::Ecdh,
        Curve::NistP256,
        HashAlgorithm::Sha256,
        SymmetricAlgorithm::Aes128,
        &[0xB0; 20],
    )
    .unwrap();
    let shared = [0x33u8; 32];
    let key_a = kdf::derive(HashAlgorithm::Sha256, &shared, 16, &param_a, false, false).unwrap();
    let key_b = kdf::derive(HashAlgorithm::Sha256, &shared, 16, &param_b, false, false).unwrap();
    assert_ne!(&key_a[..], &key_b[..]);
}

#[test]
fn recommended_pairings_follow_curve_strength() {
    assert_eq!(
        Curve::Curve25519.default_kdf(),
        (HashAlgorithm::Sha256, SymmetricAlgorithm::Aes128)
    );
    assert_eq!(
        Curve::NistP384.default_kdf(),
        (HashAlgorithm::Sha384, SymmetricAlgorithm::Aes192)
    );
    assert_eq!(
        Curve::NistP521.default_kdf(),
        (HashAlgorithm::Sha512, SymmetricAlgorithm::Aes256)
    );
}
