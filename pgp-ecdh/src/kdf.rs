#![forbid(unsafe_code)]

use zeroize::{Zeroize, Zeroizing};

use crate::algo::{HashAlgorithm, PublicKeyAlgorithm, SymmetricAlgorithm};
use crate::curve::Curve;
use crate::{Error, Result};

/// Fixed 20-octet sender label bound into every parameter block.
const ANONYMOUS_SENDER: &[u8; 20] = b"Anonymous Sender    ";
/// Number of recipient fingerprint octets bound into the parameter block.
const FINGERPRINT_LEN: usize = 20;

/// Assemble the RFC 6637 "other info" parameter block:
/// `oid ∥ algo-id ∥ kdf-params ∥ "Anonymous Sender    " ∥ fingerprint[..20]`.
///
/// Deterministic; the only failure mode is a fingerprint shorter than
/// 20 octets, which is a caller contract violation and fails fast.
pub fn build_param(
    public_key_algo: PublicKeyAlgorithm,
    curve: Curve,
    hash: HashAlgorithm,
    cipher: SymmetricAlgorithm,
    fingerprint: &[u8],
) -> Result<Vec<u8>> {
    if fingerprint.len() < FINGERPRINT_LEN {
        return Err(Error::MalformedInput(format!(
            "fingerprint must carry at least {FINGERPRINT_LEN} octets, got {}",
            fingerprint.len()
        )));
    }
    let oid = curve.oid_wire();
    let mut param = Vec::with_capacity(oid.len() + 1 + 4 + ANONYMOUS_SENDER.len() + FINGERPRINT_LEN);
    param.extend_from_slice(&oid);
    param.push(public_key_algo.id());
    // KDF parameters field: length, reserved format octet, hash id, cipher id.
    param.extend_from_slice(&[0x03, 0x01, hash.id(), cipher.id()]);
    param.extend_from_slice(ANONYMOUS_SENDER);
    param.extend_from_slice(&fingerprint[..FINGERPRINT_LEN]);
    Ok(param)
}

/// One-round KDF: `hash(00 00 00 01 ∥ S ∥ param)` truncated to `output_len`.
///
/// The strip flags reproduce two historical peer implementations that fed a
/// shortened shared secret into the KDF: one dropped leading zero octets of
/// the big-endian secret, the other dropped trailing zero octets. Both
/// default to false (the RFC-correct behavior); decryption retries each
/// variant, encryption never does.
pub fn derive(
    hash: HashAlgorithm,
    shared_secret: &[u8],
    output_len: usize,
    param: &[u8],
    strip_leading_zeros: bool,
    strip_trailing_zeros: bool,
) -> Result<Zeroizing<Vec<u8>>> {
    if output_len > hash.digest_size() {
        return Err(Error::MalformedInput(format!(
            "cannot derive {output_len} octets from a {} octet digest",
            hash.digest_size()
        )));
    }
    let mut secret = shared_secret;
    if strip_leading_zeros {
        while secret.first() == Some(&0) {
            secret = &secret[1..];
        }
    }
    if strip_trailing_zeros {
        while secret.last() == Some(&0) {
            secret = &secret[..secret.len() - 1];
        }
    }
    let mut message = Vec::with_capacity(4 + secret.len() + param.len());
    message.extend_from_slice(&1u32.to_be_bytes());
    message.extend_from_slice(secret);
    message.extend_from_slice(param);
    let mut digest = hash.digest(&message);
    message.zeroize();
    let key = Zeroizing::new(digest[..output_len].to_vec());
    digest.zeroize();
    Ok(key)
}
