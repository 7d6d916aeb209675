#![forbid(unsafe_code)]

use sha1::Sha1;
use sha2::{Digest, Sha256, Sha384, Sha512};

use crate::{Error, Result};

/// Public-key algorithm identifiers bound into the KDF parameter block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PublicKeyAlgorithm {
    /// ECDH key agreement (RFC 6637).
    Ecdh = 18,
}

impl PublicKeyAlgorithm {
    pub fn id(self) -> u8 {
        self as u8
    }
}

/// Hash algorithms usable inside the one-round KDF.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HashAlgorithm {
    Sha1 = 2,
    Sha256 = 8,
    Sha384 = 9,
    Sha512 = 10,
}

impl HashAlgorithm {
    pub fn from_id(id: u8) -> Result<Self> {
        match id {
            2 => Ok(Self::Sha1),
            8 => Ok(Self::Sha256),
            9 => Ok(Self::Sha384),
            10 => Ok(Self::Sha512),
            other => Err(Error::UnsupportedAlgorithm(other)),
        }
    }

    pub fn id(self) -> u8 {
        self as u8
    }

    /// Digest length in octets.
    pub fn digest_size(self) -> usize {
        match self {
            Self::Sha1 => 20,
            Self::Sha256 => 32,
            Self::Sha384 => 48,
            Self::Sha512 => 64,
        }
    }

    /// Single-shot digest of `message`.
    pub fn digest(self, message: &[u8]) -> Vec<u8> {
        match self {
            Self::Sha1 => Sha1::digest(message).to_vec(),
            Self::Sha256 => Sha256::digest(message).to_vec(),
            Self::Sha384 => Sha384::digest(message).to_vec(),
            Self::Sha512 => Sha512::digest(message).to_vec(),
        }
    }
}

/// Symmetric ciphers usable for AES Key-Wrap of the session key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SymmetricAlgorithm {
    Aes128 = 7,
    Aes192 = 8,
    Aes256 = 9,
}

impl SymmetricAlgorithm {
    pub fn from_id(id: u8) -> Result<Self> {
        match id {
            7 => Ok(Self::Aes128),
            8 => Ok(Self::Aes192),
            9 => Ok(Self::Aes256),
            other => Err(Error::UnsupportedAlgorithm(other)),
        }
    }

    pub fn id(self) -> u8 {
        self as u8
    }

    /// Key length in octets; also the KDF output length.
    pub fn key_size(self) -> usize {
        match self {
            Self::Aes128 => 16,
            Self::Aes192 => 24,
            Self::Aes256 => 32,
        }
    }
}
