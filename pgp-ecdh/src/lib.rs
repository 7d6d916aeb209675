//! ECDH session-key wrapping per RFC 6637.
//! - Curves: Curve25519 plus NIST P-256/P-384/P-521
//! - Backends: platform crypto API and OS crypto module when injected,
//!   pure-software fallback always available
//! - KDF: one-round hash-and-truncate over the RFC 6637 parameter block,
//!   with two decrypt-side interop retry variants
//! - Key wrap: AES Key-Wrap through the `aes-kw` collaborator
#![forbid(unsafe_code)]
#![warn(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::unreachable,
    clippy::todo,
    clippy::unimplemented
)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![allow(missing_docs)]

/// Ephemeral key agreement and backend dispatch.
pub mod agreement;
/// OpenPGP algorithm identifiers consumed by the KDF layer.
pub mod algo;
/// Injected platform/OS crypto capability providers.
pub mod backend;
/// Supported curves and their static descriptors.
pub mod curve;
/// JWK-style structured key views for the platform boundary.
pub mod jwk;
/// KDF parameter block and one-round key derivation.
pub mod kdf;
/// AES Key-Wrap boundary and session-key padding.
pub mod keywrap;
/// Session-key encrypt/decrypt orchestration.
pub mod session;

/// Error type for key agreement and session-key wrapping.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum Error {
    #[error("backend unavailable: {0}")]
    /// A preferred backend cannot perform the operation; recovered locally
    /// by falling through to the next backend in the chain.
    BackendUnavailable(String),
    #[error("key agreement failed: {0}")]
    /// The terminal software backend failed; fatal for the call.
    KeyAgreement(String),
    #[error("session key unwrap failed: {0}")]
    /// AES Key-Wrap rejected the ciphertext under the derived key.
    UnwrapFailed(String),
    #[error("malformed input: {0}")]
    /// Wrong-length keys, fingerprints, or octet strings.
    MalformedInput(String),
    #[error("unsupported curve oid: {0}")]
    /// OID not present in the curve table.
    UnsupportedCurve(String),
    #[error("unsupported algorithm id: {0}")]
    /// Unknown hash or symmetric cipher identifier.
    UnsupportedAlgorithm(u8),
}

/// Convenient Result alias for this crate.
pub type Result<T> = core::result::Result<T, Error>;

pub use agreement::{EphemeralKeyAgreement, EphemeralKeyPair, SharedSecret};
pub use algo::{HashAlgorithm, PublicKeyAlgorithm, SymmetricAlgorithm};
pub use backend::{
    Capabilities, OsKeyPair, OsModuleEcdh, PlatformEcdh, PlatformKey, PlatformKeyPair,
};
pub use curve::Curve;
pub use session::{Encrypted, SessionKeyCodec};
