#![forbid(unsafe_code)]

// AES Key-Wrap boundary (RFC 3394) plus the PKCS#5-style padding that brings
// a session key to the key-wrap granularity.

use aes_kw::{KekAes128, KekAes192, KekAes256};
use zeroize::Zeroizing;

use crate::algo::SymmetricAlgorithm;
use crate::{Error, Result};

/// Key-wrap block granularity in octets.
const BLOCK: usize = 8;

fn kek_error(cipher: SymmetricAlgorithm) -> Error {
    Error::MalformedInput(format!(
        "key-encryption key must be {} octets for {cipher:?}",
        cipher.key_size()
    ))
}

/// Wrap `plaintext` under `kek`. The input must already be padded to the
/// key-wrap granularity.
pub fn wrap(cipher: SymmetricAlgorithm, kek: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    let wrapped = match cipher {
        SymmetricAlgorithm::Aes128 => KekAes128::try_from(kek)
            .map_err(|_| kek_error(cipher))?
            .wrap_vec(plaintext),
        SymmetricAlgorithm::Aes192 => KekAes192::try_from(kek)
            .map_err(|_| kek_error(cipher))?
            .wrap_vec(plaintext),
        SymmetricAlgorithm::Aes256 => KekAes256::try_from(kek)
            .map_err(|_| kek_error(cipher))?
            .wrap_vec(plaintext),
    };
    wrapped.map_err(|error| Error::MalformedInput(format!("AES key wrap rejected the input: {error}")))
}

/// Unwrap `wrapped` under `kek`. An integrity failure means the key is wrong
/// or the ciphertext corrupted; the decrypt retry loop feeds on it.
pub fn unwrap(cipher: SymmetricAlgorithm, kek: &[u8], wrapped: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
    let plaintext = match cipher {
        SymmetricAlgorithm::Aes128 => KekAes128::try_from(kek)
            .map_err(|_| kek_error(cipher))?
            .unwrap_vec(wrapped),
        SymmetricAlgorithm::Aes192 => KekAes192::try_from(kek)
            .map_err(|_| kek_error(cipher))?
            .unwrap_vec(wrapped),
        SymmetricAlgorithm::Aes256 => KekAes256::try_from(kek)
            .map_err(|_| kek_error(cipher))?
            .unwrap_vec(wrapped),
    };
    plaintext.map(Zeroizing::new).map_err(|_| {
        Error::UnwrapFailed("integrity check failed for the wrapped session key".into())
    })
}

/// Pad to the key-wrap granularity; always adds at least one octet, each
/// carrying the pad length.
pub fn pad(data: &[u8]) -> Zeroizing<Vec<u8>> {
    let pad_len = BLOCK - data.len() % BLOCK;
    let mut padded = Zeroizing::new(Vec::with_capacity(data.len() + pad_len));
    padded.extend_from_slice(data);
    padded.extend(std::iter::repeat(pad_len as u8).take(pad_len));
    padded
}

/// Strip and verify the padding added by [`pad`].
pub fn unpad(data: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
    let bad_pad = || Error::UnwrapFailed("invalid session key padding".into());
    let &last = data.last().ok_or_else(bad_pad)?;
    let pad_len = last as usize;
    if pad_len == 0 || pad_len > BLOCK || pad_len > data.len() {
        return Err(bad_pad());
    }
    if !data[data.len() - pad_len..].iter().all(|&b| b == last) {
        return Err(bad_pad());
    }
    Ok(Zeroizing::new(data[..data.len() - pad_len].to_vec()))
}
