//! Ephemeral ECDH key agreement with per-curve backend dispatch.
//!
//! Curve25519 always takes the dedicated software path. NIST curves walk a
//! priority-ordered chain (platform API, OS module, pure software); every
//! non-terminal failure is logged and swallowed, only the terminal software
//! backend's failure reaches the caller.
#![forbid(unsafe_code)]

use std::fmt;

use elliptic_curve::ecdh::diffie_hellman;
use elliptic_curve::sec1::{FromEncodedPoint, ModulusSize, ToEncodedPoint};
use elliptic_curve::{CurveArithmetic, FieldBytesSize, PublicKey, SecretKey};
use rand::rngs::OsRng;
use rand::RngCore;
use tracing::{debug, warn};
use x25519_dalek::{PublicKey as X25519Public, StaticSecret};
use zeroize::{Zeroize, Zeroizing};

use crate::backend::Capabilities;
use crate::curve::{Curve, CURVE25519_POINT_TAG, NIST_POINT_TAG};
use crate::jwk;
use crate::{Error, Result};

/// Shared secret produced by key agreement.
///
/// Byte order is curve-dependent: little-endian for Curve25519, big-endian
/// fixed field width for the NIST curves. Callers must track this per curve.
pub struct SharedSecret(Zeroizing<Vec<u8>>);

impl SharedSecret {
    fn new(bytes: Vec<u8>) -> Self {
        Self(Zeroizing::new(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedSecret")
            .field("len", &self.0.len())
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Ephemeral key material for one encryption operation, never reused.
pub struct EphemeralKeyPair {
    /// Wire-framed public key: `0x40 ∥ point` or `0x04 ∥ X ∥ Y`.
    pub public_key: Vec<u8>,
    /// Secret scalar in curve-native encoding, zeroized on drop.
    pub secret_key: Zeroizing<Vec<u8>>,
    /// Shared secret against the recipient key.
    pub shared_secret: SharedSecret,
}

impl fmt::Debug for EphemeralKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EphemeralKeyPair")
            .field("public_key_len", &self.public_key.len())
            .field("secrets", &"[REDACTED]")
            .finish()
    }
}

#[derive(Clone, Copy, Debug)]
enum Backend {
    Platform,
    OsModule,
    Software,
}

/// Per-curve ECDH dispatcher over the injected capability providers.
#[derive(Debug)]
pub struct EphemeralKeyAgreement {
    capabilities: Capabilities,
}

impl EphemeralKeyAgreement {
    pub fn new(capabilities: Capabilities) -> Self {
        Self { capabilities }
    }

    /// Generate an ephemeral key pair against `recipient_public` and compute
    /// the shared secret (encryption side).
    pub async fn generate_for_encryption(
        &self,
        curve: Curve,
        recipient_public: &[u8],
    ) -> Result<EphemeralKeyPair> {
        if curve == Curve::Curve25519 {
            return x25519_generate(recipient_public);
        }
        let chain = self.backend_chain(curve);
        for (index, backend) in chain.iter().enumerate() {
            let attempt = match backend {
                Backend::Platform => self.platform_generate(curve, recipient_public).await,
                Backend::OsModule => self.os_generate(curve, recipient_public).await,
                Backend::Software => software_generate(curve, recipient_public),
            };
            match attempt {
                Ok(pair) => {
                    debug!(curve = %curve, backend = ?backend, "ephemeral key agreement complete");
                    return Ok(pair);
                }
                Err(error) if index + 1 == chain.len() => return Err(error),
                Err(error) => {
                    warn!(curve = %curve, backend = ?backend, %error, "ECDH backend failed, trying next");
                }
            }
        }
        Err(Error::KeyAgreement(format!(
            "no ECDH backend available for {curve}"
        )))
    }

    /// Recompute the shared secret from a peer's ephemeral public key and the
    /// recipient private key (decryption side). `recipient_public` is only
    /// needed by backends that must rebuild a full key object.
    pub async fn derive_for_decryption(
        &self,
        curve: Curve,
        peer_ephemeral_public: &[u8],
        recipient_private: &[u8],
        recipient_public: Option<&[u8]>,
    ) -> Result<SharedSecret> {
        if curve == Curve::Curve25519 {
            return x25519_derive(peer_ephemeral_public, recipient_private);
        }
        let chain = self.backend_chain(curve);
        for (index, backend) in chain.iter().enumerate() {
            let attempt = match backend {
                Backend::Platform => {
                    self.platform_derive(
                        curve,
                        peer_ephemeral_public,
                        recipient_private,
                        recipient_public,
                    )
                    .await
                }
                Backend::OsModule => {
                    self.os_derive(curve, peer_ephemeral_public, recipient_private)
                        .await
                }
                Backend::Software => software_derive(curve, peer_ephemeral_public, recipient_private),
            };
            match attempt {
                Ok(shared) => {
                    debug!(curve = %curve, backend = ?backend, "shared secret derived");
                    return Ok(shared);
                }
                Err(error) if index + 1 == chain.len() => return Err(error),
                Err(error) => {
                    warn!(curve = %curve, backend = ?backend, %error, "ECDH backend failed, trying next");
                }
            }
        }
        Err(Error::KeyAgreement(format!(
            "no ECDH backend available for {curve}"
        )))
    }

    fn backend_chain(&self, curve: Curve) -> Vec<Backend> {
        let descriptor = curve.descriptor();
        let mut chain = Vec::with_capacity(3);
        if descriptor.platform_curve_id.is_some() && self.capabilities.platform().is_some() {
            chain.push(Backend::Platform);
        }
        if descriptor.os_module_curve_id.is_some() && self.capabilities.os_module().is_some() {
            chain.push(Backend::OsModule);
        }
        if descriptor.software_fallback {
            chain.push(Backend::Software);
        }
        chain
    }

    async fn platform_generate(
        &self,
        curve: Curve,
        recipient_public: &[u8],
    ) -> Result<EphemeralKeyPair> {
        let provider = self.capabilities.platform().ok_or_else(|| {
            Error::BackendUnavailable("platform crypto API not present".into())
        })?;
        let crv = curve.platform_curve_id().ok_or_else(|| {
            Error::BackendUnavailable(format!("{curve} is not supported by the platform API"))
        })?;
        nist_point_check(curve, recipient_public)?;
        let payload = curve.payload_size();
        let recipient_jwk = jwk::public_from_raw(payload, crv, recipient_public)?;
        // Key-pair generation and recipient import are independent; join
        // both before the derivation that depends on them.
        let (pair, recipient_key) = tokio::try_join!(
            provider.generate_key_pair(crv),
            provider.import_public(&recipient_jwk)
        )?;
        let (shared, ephemeral_jwk) = tokio::try_join!(
            provider.derive_bits(&pair.private, &recipient_key, payload * 8),
            provider.export_private(&pair.private)
        )?;
        if shared.len() != payload {
            return Err(Error::BackendUnavailable(format!(
                "platform derived {} octets, expected {payload}",
                shared.len()
            )));
        }
        let public_key = jwk::public_to_raw(&ephemeral_jwk.to_public())?;
        let secret_key = jwk::private_scalar(&ephemeral_jwk)?;
        Ok(EphemeralKeyPair {
            public_key,
            secret_key,
            shared_secret: SharedSecret::new(shared),
        })
    }

    async fn platform_derive(
        &self,
        curve: Curve,
        peer_public: &[u8],
        recipient_private: &[u8],
        recipient_public: Option<&[u8]>,
    ) -> Result<SharedSecret> {
        let provider = self.capabilities.platform().ok_or_else(|| {
            Error::BackendUnavailable("platform crypto API not present".into())
        })?;
        let crv = curve.platform_curve_id().ok_or_else(|| {
            Error::BackendUnavailable(format!("{curve} is not supported by the platform API"))
        })?;
        let recipient_public = recipient_public.ok_or_else(|| {
            Error::BackendUnavailable(
                "platform backend needs the recipient public coordinates".into(),
            )
        })?;
        nist_point_check(curve, peer_public)?;
        let payload = curve.payload_size();
        let peer_jwk = jwk::public_from_raw(payload, crv, peer_public)?;
        let private_jwk = jwk::private_from_raw(payload, crv, recipient_private, recipient_public)?;
        let (peer_key, private_key) = tokio::try_join!(
            provider.import_public(&peer_jwk),
            provider.import_private(&private_jwk)
        )?;
        let shared = provider
            .derive_bits(&private_key, &peer_key, payload * 8)
            .await?;
        if shared.len() != payload {
            return Err(Error::BackendUnavailable(format!(
                "platform derived {} octets, expected {payload}",
                shared.len()
            )));
        }
        Ok(SharedSecret::new(shared))
    }

    async fn os_generate(&self, curve: Curve, recipient_public: &[u8]) -> Result<EphemeralKeyPair> {
        let provider = self.capabilities.os_module().ok_or_else(|| {
            Error::BackendUnavailable("OS crypto module not present".into())
        })?;
        let curve_id = curve.os_module_curve_id().ok_or_else(|| {
            Error::BackendUnavailable(format!("{curve} is not supported by the OS module"))
        })?;
        nist_point_check(curve, recipient_public)?;
        let pair = provider.generate_keys(curve_id).await?;
        nist_point_check(curve, &pair.public)
            .map_err(|_| Error::BackendUnavailable("OS module returned a malformed point".into()))?;
        let shared = provider
            .compute_secret(curve_id, recipient_public, &pair.private)
            .await?;
        Ok(EphemeralKeyPair {
            public_key: pair.public,
            secret_key: pair.private,
            shared_secret: SharedSecret::new(shared),
        })
    }

    async fn os_derive(
        &self,
        curve: Curve,
        peer_public: &[u8],
        recipient_private: &[u8],
    ) -> Result<SharedSecret> {
        let provider = self.capabilities.os_module().ok_or_else(|| {
            Error::BackendUnavailable("OS crypto module not present".into())
        })?;
        let curve_id = curve.os_module_curve_id().ok_or_else(|| {
            Error::BackendUnavailable(format!("{curve} is not supported by the OS module"))
        })?;
        nist_point_check(curve, peer_public)?;
        let shared = provider
            .compute_secret(curve_id, peer_public, recipient_private)
            .await?;
        Ok(SharedSecret::new(shared))
    }
}

/// Normalize a Curve25519 secret scalar: set bit 255, clear bits 0-2.
fn clamp_scalar(mut scalar: [u8; 32]) -> [u8; 32] {
    scalar[0] &= 0b1111_1000;
    scalar[31] |= 0b1000_0000;
    scalar
}

fn x25519_point(public: &[u8]) -> Result<[u8; 32]> {
    if public.len() != 33 || public[0] != CURVE25519_POINT_TAG {
        return Err(Error::MalformedInput(format!(
            "curve25519 point must be 33 tagged octets, got {}",
            public.len()
        )));
    }
    let mut point = [0u8; 32];
    point.copy_from_slice(&public[1..]);
    Ok(point)
}

fn x25519_generate(recipient_public: &[u8]) -> Result<EphemeralKeyPair> {
    let peer = x25519_point(recipient_public)?;
    let mut secret = [0u8; 32];
    OsRng.fill_bytes(&mut secret);
    let mut secret = clamp_scalar(secret);
    let scalar = StaticSecret::from(secret);
    let public = X25519Public::from(&scalar);
    // Little-endian u-coordinate, the curve-native convention.
    let shared = scalar.diffie_hellman(&X25519Public::from(peer));
    let mut public_key = Vec::with_capacity(33);
    public_key.push(CURVE25519_POINT_TAG);
    public_key.extend_from_slice(public.as_bytes());
    let pair = EphemeralKeyPair {
        public_key,
        secret_key: Zeroizing::new(secret.to_vec()),
        shared_secret: SharedSecret::new(shared.as_bytes().to_vec()),
    };
    secret.zeroize();
    Ok(pair)
}

fn x25519_derive(peer_public: &[u8], recipient_private: &[u8]) -> Result<SharedSecret> {
    let peer = x25519_point(peer_public)?;
    let mut secret: [u8; 32] = recipient_private.try_into().map_err(|_| {
        Error::MalformedInput(format!(
            "curve25519 secret must be 32 octets, got {}",
            recipient_private.len()
        ))
    })?;
    let scalar = StaticSecret::from(secret);
    secret.zeroize();
    let shared = scalar.diffie_hellman(&X25519Public::from(peer));
    Ok(SharedSecret::new(shared.as_bytes().to_vec()))
}

fn nist_point_check(curve: Curve, public: &[u8]) -> Result<()> {
    let expected = 1 + 2 * curve.payload_size();
    if public.len() != expected || public[0] != NIST_POINT_TAG {
        return Err(Error::MalformedInput(format!(
            "{curve} public key must be an uncompressed point of {expected} octets"
        )));
    }
    Ok(())
}

fn software_generate(curve: Curve, recipient_public: &[u8]) -> Result<EphemeralKeyPair> {
    nist_point_check(curve, recipient_public)?;
    match curve {
        Curve::NistP256 => nist_generate::<p256::NistP256>(recipient_public),
        Curve::NistP384 => nist_generate::<p384::NistP384>(recipient_public),
        Curve::NistP521 => nist_generate::<p521::NistP521>(recipient_public),
        Curve::Curve25519 => Err(Error::BackendUnavailable(
            "curve25519 does not use the NIST software path".into(),
        )),
    }
}

fn software_derive(
    curve: Curve,
    peer_public: &[u8],
    recipient_private: &[u8],
) -> Result<SharedSecret> {
    nist_point_check(curve, peer_public)?;
    match curve {
        Curve::NistP256 => nist_derive::<p256::NistP256>(peer_public, recipient_private),
        Curve::NistP384 => nist_derive::<p384::NistP384>(peer_public, recipient_private),
        Curve::NistP521 => nist_derive::<p521::NistP521>(peer_public, recipient_private),
        Curve::Curve25519 => Err(Error::BackendUnavailable(
            "curve25519 does not use the NIST software path".into(),
        )),
    }
}

fn nist_generate<C>(recipient_public: &[u8]) -> Result<EphemeralKeyPair>
where
    C: CurveArithmetic,
    C::AffinePoint: FromEncodedPoint<C> + ToEncodedPoint<C>,
    FieldBytesSize<C>: ModulusSize,
{
    let recipient = PublicKey::<C>::from_sec1_bytes(recipient_public)
        .map_err(|_| Error::MalformedInput("recipient public key is not a valid curve point".into()))?;
    let secret = SecretKey::<C>::random(&mut OsRng);
    let public = secret.public_key().to_encoded_point(false);
    // Big-endian x-coordinate at the full field width.
    let shared = diffie_hellman(secret.to_nonzero_scalar(), recipient.as_affine());
    Ok(EphemeralKeyPair {
        public_key: public.as_bytes().to_vec(),
        secret_key: Zeroizing::new(secret.to_bytes().as_slice().to_vec()),
        shared_secret: SharedSecret::new(shared.raw_secret_bytes().as_slice().to_vec()),
    })
}

fn nist_derive<C>(peer_public: &[u8], recipient_private: &[u8]) -> Result<SharedSecret>
where
    C: CurveArithmetic,
    C::AffinePoint: FromEncodedPoint<C> + ToEncodedPoint<C>,
    FieldBytesSize<C>: ModulusSize,
{
    let peer = PublicKey::<C>::from_sec1_bytes(peer_public)
        .map_err(|_| Error::MalformedInput("peer public key is not a valid curve point".into()))?;
    let secret = SecretKey::<C>::from_slice(recipient_private).map_err(|_| {
        Error::MalformedInput("recipient private scalar has an invalid length or value".into())
    })?;
    let shared = diffie_hellman(secret.to_nonzero_scalar(), peer.as_affine());
    Ok(SharedSecret::new(shared.raw_secret_bytes().as_slice().to_vec()))
}
