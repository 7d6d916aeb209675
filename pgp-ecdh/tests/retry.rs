//! Decrypt-side KDF strip-variant retry behavior, pinned with senders that
//! reproduce the two historical derivation bugs.

use std::sync::Arc;

use async_trait::async_trait;
use pgp_ecdh::{
    kdf, keywrap, Capabilities, Curve, Error, HashAlgorithm, OsKeyPair, OsModuleEcdh,
    PublicKeyAlgorithm, Result, SessionKeyCodec, SymmetricAlgorithm,
};

const FINGERPRINT: [u8; 20] = [0x1F; 20];
const SESSION_KEY: [u8; 16] = [0x99; 16];

/// OS module whose agreements always land on a fixed shared secret, letting
/// tests pin the exact bytes fed into the KDF.
struct FixedSecretOsModule {
    secret: Vec<u8>,
}

#[async_trait]
impl OsModuleEcdh for FixedSecretOsModule {
    async fn generate_keys(&self, _curve_id: &str) -> Result<OsKeyPair> {
        Err(Error::BackendUnavailable("decrypt-only module".into()))
    }

    async fn compute_secret(
        &self,
        _curve_id: &str,
        _peer_public: &[u8],
        _private_key: &[u8],
    ) -> Result<Vec<u8>> {
        Ok(self.secret.clone())
    }
}

fn fixture(shared_secret: &[u8]) -> (SessionKeyCodec, Vec<u8>, Vec<u8>, Vec<u8>) {
    let codec = SessionKeyCodec::new(Capabilities::none().with_os_module(Arc::new(
        FixedSecretOsModule {
            secret: shared_secret.to_vec(),
        },
    )));
    // Point contents are irrelevant here; the fixed-secret module only needs
    // well-formed framing to get past the input checks.
    let ephemeral_public = {
        let mut wire = vec![0x04];
        wire.extend_from_slice(&[0x5Au8; 64]);
        wire
    };
    let recipient_public = {
        let mut wire = vec![0x04];
        wire.extend_from_slice(&[0x3Cu8; 64]);
        wire
    };
    let recipient_private = vec![0x02u8; 32];
    (codec, ephemeral_public, recipient_public, recipient_private)
}

fn wrap_with_variant(
    shared_secret: &[u8],
    strip_leading: bool,
    strip_trailing: bool,
) -> Vec<u8> {
    let param = kdf::build_param(
        PublicKeyAlgorithm::Ecdh,
        Curve::NistP256,
        HashAlgorithm::Sha256,
        SymmetricAlgorithm::Aes128,
        &FINGERPRINT,
    )
    .unwrap();
    let kek = kdf::derive(
        HashAlgorithm::Sha256,
        shared_secret,
        16,
        &param,
        strip_leading,
        strip_trailing,
    )
    .unwrap();
    let padded = keywrap::pad(&SESSION_KEY);
    keywrap::wrap(SymmetricAlgorithm::Aes128, &kek, &padded).unwrap()
}

#[tokio::test]
async fn leading_zero_stripping_sender_needs_the_second_variant() {
    let mut shared = vec![0u8; 32];
    shared[0] = 0x00;
    for (i, byte) in shared.iter_mut().enumerate().skip(1) {
        *byte = i as u8;
    }
    let wrapped = wrap_with_variant(&shared, true, false);

    // The canonical derivation must not unwrap this ciphertext.
    let param = kdf::build_param(
        PublicKeyAlgorithm::Ecdh,
        Curve::NistP256,
        HashAlgorithm::Sha256,
        SymmetricAlgorithm::Aes128,
        &FINGERPRINT,
    )
    .unwrap();
    let canonical = kdf::derive(HashAlgorithm::Sha256, &shared, 16, &param, false, false).unwrap();
    assert!(keywrap::unwrap(SymmetricAlgorithm::Aes128, &canonical, &wrapped).is_err());

    let (codec, ephemeral_public, recipient_public, recipient_private) = fixture(&shared);
    let decrypted = codec
        .decrypt(
            Curve::NistP256.oid(),
            SymmetricAlgorithm::Aes128,
            HashAlgorithm::Sha256,
            &ephemeral_public,
            &wrapped,
            &recipient_public,
            &recipient_private,
            &FINGERPRINT,
        )
        .await
        .unwrap();
    assert_eq!(&decrypted[..], &SESSION_KEY[..]);
}

#[tokio::test]
async fn trailing_zero_stripping_sender_needs_the_third_variant() {
    let mut shared = vec![0u8; 32];
    for (i, byte) in shared.iter_mut().enumerate().take(31) {
        *byte = (i + 1) as u8;
    }
    shared[31] = 0x00;
    let wrapped = wrap_with_variant(&shared, false, true);

    let (codec, ephemeral_public, recipient_public, recipient_private) = fixture(&shared);
    let decrypted = codec
        .decrypt(
            Curve::NistP256.oid(),
            SymmetricAlgorithm::Aes128,
            HashAlgorithm::Sha256,
            &ephemeral_public,
            &wrapped,
            &recipient_public,
            &recipient_private,
            &FINGERPRINT,
        )
        .await
        .unwrap();
    assert_eq!(&decrypted[..], &SESSION_KEY[..]);
}

#[tokio::test]
async fn conforming_sender_decrypts_on_the_first_variant() {
    let shared: Vec<u8> = (1..=32).collect();
    let wrapped = wrap_with_variant(&shared, false, false);
    let (codec, ephemeral_public, recipient_public, recipient_private) = fixture(&shared);
    let decrypted = codec
        .decrypt(
            Curve::NistP256.oid(),
            SymmetricAlgorithm::Aes128,
            HashAlgorithm::Sha256,
            &ephemeral_public,
            &wrapped,
            &recipient_public,
            &recipient_private,
            &FINGERPRINT,
        )
        .await
        .unwrap();
    assert_eq!(&decrypted[..], &SESSION_KEY[..]);
}

#[tokio::test]
async fn exhausted_variants_surface_only_the_last_error() {
    let shared: Vec<u8> = (1..=32).collect();
    let (codec, ephemeral_public, recipient_public, recipient_private) = fixture(&shared);
    let err = codec
        .decrypt(
            Curve::NistP256.oid(),
            SymmetricAlgorithm::Aes128,
            HashAlgorithm::Sha256,
            &ephemeral_public,
            &[0xEE; 24],
            &recipient_public,
            &recipient_private,
            &FINGERPRINT,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::UnwrapFailed(_)));
}
