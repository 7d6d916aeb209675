#![forbid(unsafe_code)]

use tracing::debug;
use zeroize::Zeroizing;

use crate::agreement::EphemeralKeyAgreement;
use crate::algo::{HashAlgorithm, PublicKeyAlgorithm, SymmetricAlgorithm};
use crate::backend::Capabilities;
use crate::curve::Curve;
use crate::{kdf, keywrap, Error, Result};

/// Strip-flag variants attempted during decryption, in fixed order: the
/// RFC-correct derivation first, then the two known historical deviations.
const KDF_VARIANTS: [(bool, bool); 3] = [(false, false), (true, false), (false, true)];

/// Output of wrapping a session key to one recipient.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Encrypted {
    /// Wire-framed ephemeral public key: `0x40 ∥ point` or `0x04 ∥ X ∥ Y`.
    pub ephemeral_public_key: Vec<u8>,
    /// AES-KW ciphertext of the padded session key.
    pub wrapped_session_key: Vec<u8>,
}

/// Top-level encrypt/decrypt orchestration over agreement, KDF, and the
/// AES Key-Wrap collaborator.
#[derive(Debug)]
pub struct SessionKeyCodec {
    agreement: EphemeralKeyAgreement,
}

impl SessionKeyCodec {
    pub fn new(capabilities: Capabilities) -> Self {
        Self {
            agreement: EphemeralKeyAgreement::new(capabilities),
        }
    }

    /// The underlying key-agreement component.
    pub fn agreement(&self) -> &EphemeralKeyAgreement {
        &self.agreement
    }

    /// Wrap `session_key` (big-endian value octets) to `recipient_public`.
    /// Any failure propagates immediately; there is no retry on this side.
    pub async fn encrypt(
        &self,
        curve_oid: &[u8],
        cipher: SymmetricAlgorithm,
        hash: HashAlgorithm,
        session_key: &[u8],
        recipient_public: &[u8],
        fingerprint: &[u8],
    ) -> Result<Encrypted> {
        let curve = Curve::from_oid(curve_oid)?;
        let pair = self
            .agreement
            .generate_for_encryption(curve, recipient_public)
            .await?;
        let param = kdf::build_param(PublicKeyAlgorithm::Ecdh, curve, hash, cipher, fingerprint)?;
        // The encrypting side always derives with the RFC-correct convention.
        let kek = kdf::derive(
            hash,
            pair.shared_secret.as_bytes(),
            cipher.key_size(),
            &param,
            false,
            false,
        )?;
        let padded = keywrap::pad(session_key);
        let wrapped = keywrap::wrap(cipher, &kek, &padded)?;
        Ok(Encrypted {
            ephemeral_public_key: pair.public_key,
            wrapped_session_key: wrapped,
        })
    }

    /// Recover the session key from a wrapped blob and the sender's ephemeral
    /// public key. The shared secret and parameter block are computed once;
    /// KDF derivation and unwrap are retried across the fixed variant list,
    /// and only the last variant's failure is surfaced on exhaustion.
    #[allow(clippy::too_many_arguments)]
    pub async fn decrypt(
        &self,
        curve_oid: &[u8],
        cipher: SymmetricAlgorithm,
        hash: HashAlgorithm,
        ephemeral_public: &[u8],
        wrapped_session_key: &[u8],
        recipient_public: &[u8],
        recipient_private: &[u8],
        fingerprint: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>> {
        let curve = Curve::from_oid(curve_oid)?;
        let shared = self
            .agreement
            .derive_for_decryption(
                curve,
                ephemeral_public,
                recipient_private,
                Some(recipient_public),
            )
            .await?;
        let param = kdf::build_param(PublicKeyAlgorithm::Ecdh, curve, hash, cipher, fingerprint)?;
        let mut last_error = Error::UnwrapFailed("no KDF variant attempted".into());
        for (strip_leading, strip_trailing) in KDF_VARIANTS {
            let kek = kdf::derive(
                hash,
                shared.as_bytes(),
                cipher.key_size(),
                &param,
                strip_leading,
                strip_trailing,
            )?;
            let attempt = keywrap::unwrap(cipher, &kek, wrapped_session_key)
                .and_then(|padded| keywrap::unpad(&padded));
            match attempt {
                Ok(session_key) => return Ok(session_key),
                Err(error) => {
                    debug!(
                        strip_leading,
                        strip_trailing,
                        %error,
                        "session key unwrap failed under KDF variant"
                    );
                    last_error = error;
                }
            }
        }
        Err(last_error)
    }
}
