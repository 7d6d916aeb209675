#![forbid(unsafe_code)]

// Capability providers for the optional crypto backends. Availability is
// injected once at construction and immutable afterwards, so tests can
// simulate any environment combination deterministically.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use zeroize::Zeroizing;

use crate::jwk::{EcJwkPrivate, EcJwkPublic};
use crate::Result;

/// Opaque key material held by a platform provider. The crate never looks
/// inside; providers downcast to whatever they stored.
pub struct PlatformKey {
    inner: Box<dyn Any + Send + Sync>,
}

impl PlatformKey {
    pub fn new<T: Any + Send + Sync>(material: T) -> Self {
        Self {
            inner: Box::new(material),
        }
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref()
    }
}

impl fmt::Debug for PlatformKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlatformKey")
            .field("material", &"[opaque]")
            .finish()
    }
}

/// Handle pair produced by platform key-pair generation.
#[derive(Debug)]
pub struct PlatformKeyPair {
    pub public: PlatformKey,
    pub private: PlatformKey,
}

/// Platform-native crypto API for NIST-curve ECDH, shaped after the
/// WebCrypto subtle interface: keys cross the boundary as JWK views or
/// opaque handles, and the provider may do its work off-thread.
#[async_trait]
pub trait PlatformEcdh: Send + Sync {
    /// Generate an ephemeral key pair on the curve named by `crv`.
    async fn generate_key_pair(&self, crv: &str) -> Result<PlatformKeyPair>;
    /// Import a public key for agreement.
    async fn import_public(&self, jwk: &EcJwkPublic) -> Result<PlatformKey>;
    /// Import a private key for agreement.
    async fn import_private(&self, jwk: &EcJwkPrivate) -> Result<PlatformKey>;
    /// Derive `bits` bits of shared secret from a private and a public key.
    async fn derive_bits(
        &self,
        private_key: &PlatformKey,
        public_key: &PlatformKey,
        bits: usize,
    ) -> Result<Vec<u8>>;
    /// Export generated private key material as a JWK view.
    async fn export_private(&self, key: &PlatformKey) -> Result<EcJwkPrivate>;
}

/// Ephemeral key material produced by an OS crypto module.
#[derive(Debug)]
pub struct OsKeyPair {
    /// Uncompressed public point, `0x04 ∥ X ∥ Y`.
    pub public: Vec<u8>,
    /// Private scalar, zeroized on drop.
    pub private: Zeroizing<Vec<u8>>,
}

/// OS-level crypto module for NIST-curve ECDH, shaped after an OpenSSL-style
/// interface: raw octets in, raw octets out.
#[async_trait]
pub trait OsModuleEcdh: Send + Sync {
    /// Generate an ephemeral key pair on the curve named by `curve_id`.
    async fn generate_keys(&self, curve_id: &str) -> Result<OsKeyPair>;
    /// Compute the shared secret between `private_key` and `peer_public`.
    async fn compute_secret(
        &self,
        curve_id: &str,
        peer_public: &[u8],
        private_key: &[u8],
    ) -> Result<Vec<u8>>;
}

/// Optional backend providers, resolved once at process start.
#[derive(Clone, Default)]
pub struct Capabilities {
    platform: Option<Arc<dyn PlatformEcdh>>,
    os_module: Option<Arc<dyn OsModuleEcdh>>,
}

impl Capabilities {
    /// No optional backends; every operation lands on the software path.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_platform(mut self, provider: Arc<dyn PlatformEcdh>) -> Self {
        self.platform = Some(provider);
        self
    }

    pub fn with_os_module(mut self, provider: Arc<dyn OsModuleEcdh>) -> Self {
        self.os_module = Some(provider);
        self
    }

    pub fn platform(&self) -> Option<&dyn PlatformEcdh> {
        self.platform.as_deref()
    }

    pub fn os_module(&self) -> Option<&dyn OsModuleEcdh> {
        self.os_module.as_deref()
    }
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capabilities")
            .field("platform", &self.platform.is_some())
            .field("os_module", &self.os_module.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_capabilities_expose_nothing() {
        let caps = Capabilities::none();
        assert!(caps.platform().is_none());
        assert!(caps.os_module().is_none());
        assert_eq!(
            format!("{caps:?}"),
            "Capabilities { platform: false, os_module: false }"
        );
    }

    #[test]
    fn platform_key_downcasts_to_stored_type() {
        let key = PlatformKey::new(vec![1u8, 2, 3]);
        assert_eq!(key.downcast_ref::<Vec<u8>>().unwrap(), &vec![1u8, 2, 3]);
        assert!(key.downcast_ref::<String>().is_none());
    }
}
