#![forbid(unsafe_code)]

use std::fmt;

use crate::algo::{HashAlgorithm, SymmetricAlgorithm};
use crate::{Error, Result};

/// Tag octet prefixing a Curve25519 public point on the wire.
pub const CURVE25519_POINT_TAG: u8 = 0x40;
/// Tag octet prefixing an uncompressed NIST public point on the wire.
pub const NIST_POINT_TAG: u8 = 0x04;

/// Curves supported for ECDH session-key wrapping.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Curve {
    Curve25519,
    NistP256,
    NistP384,
    NistP521,
}

/// Static per-curve configuration, resolved through the OID table.
#[derive(Debug)]
pub struct CurveDescriptor {
    pub curve: Curve,
    /// Coordinate length in octets.
    pub payload_size: usize,
    /// DER OID body (the wire form prepends a length octet).
    pub oid: &'static [u8],
    /// JWK `crv` label understood by a platform crypto API, if any.
    pub platform_curve_id: Option<&'static str>,
    /// Curve name understood by an OS crypto module, if any.
    pub os_module_curve_id: Option<&'static str>,
    /// The pure-software backend covers every curve.
    pub software_fallback: bool,
}

const CURVE25519_OID: &[u8] = &[0x2b, 0x06, 0x01, 0x04, 0x01, 0x97, 0x55, 0x01, 0x05, 0x01];
const NIST_P256_OID: &[u8] = &[0x2a, 0x86, 0x48, 0xce, 0x3d, 0x03, 0x01, 0x07];
const NIST_P384_OID: &[u8] = &[0x2b, 0x81, 0x04, 0x00, 0x22];
const NIST_P521_OID: &[u8] = &[0x2b, 0x81, 0x04, 0x00, 0x23];

static CURVES: [CurveDescriptor; 4] = [
    CurveDescriptor {
        curve: Curve::Curve25519,
        payload_size: 32,
        oid: CURVE25519_OID,
        platform_curve_id: None,
        os_module_curve_id: None,
        software_fallback: true,
    },
    CurveDescriptor {
        curve: Curve::NistP256,
        payload_size: 32,
        oid: NIST_P256_OID,
        platform_curve_id: Some("P-256"),
        os_module_curve_id: Some("prime256v1"),
        software_fallback: true,
    },
    CurveDescriptor {
        curve: Curve::NistP384,
        payload_size: 48,
        oid: NIST_P384_OID,
        platform_curve_id: Some("P-384"),
        os_module_curve_id: Some("secp384r1"),
        software_fallback: true,
    },
    CurveDescriptor {
        curve: Curve::NistP521,
        payload_size: 66,
        oid: NIST_P521_OID,
        platform_curve_id: Some("P-521"),
        os_module_curve_id: Some("secp521r1"),
        software_fallback: true,
    },
];

impl Curve {
    /// Resolve a curve from its OID body.
    pub fn from_oid(oid: &[u8]) -> Result<Self> {
        CURVES
            .iter()
            .find(|descriptor| descriptor.oid == oid)
            .map(|descriptor| descriptor.curve)
            .ok_or_else(|| Error::UnsupportedCurve(hex::encode(oid)))
    }

    pub fn descriptor(&self) -> &'static CurveDescriptor {
        match self {
            Curve::Curve25519 => &CURVES[0],
            Curve::NistP256 => &CURVES[1],
            Curve::NistP384 => &CURVES[2],
            Curve::NistP521 => &CURVES[3],
        }
    }

    /// Coordinate length in octets.
    pub fn payload_size(&self) -> usize {
        self.descriptor().payload_size
    }

    /// DER OID body.
    pub fn oid(&self) -> &'static [u8] {
        self.descriptor().oid
    }

    /// Length-prefixed OID form bound into the KDF parameter block.
    pub fn oid_wire(&self) -> Vec<u8> {
        let oid = self.oid();
        let mut wire = Vec::with_capacity(1 + oid.len());
        wire.push(oid.len() as u8);
        wire.extend_from_slice(oid);
        wire
    }

    pub fn platform_curve_id(&self) -> Option<&'static str> {
        self.descriptor().platform_curve_id
    }

    pub fn os_module_curve_id(&self) -> Option<&'static str> {
        self.descriptor().os_module_curve_id
    }

    /// RFC 6637 recommended KDF hash and key-wrap cipher for this curve.
    pub fn default_kdf(&self) -> (HashAlgorithm, SymmetricAlgorithm) {
        match self {
            Curve::Curve25519 | Curve::NistP256 => {
                (HashAlgorithm::Sha256, SymmetricAlgorithm::Aes128)
            }
            Curve::NistP384 => (HashAlgorithm::Sha384, SymmetricAlgorithm::Aes192),
            Curve::NistP521 => (HashAlgorithm::Sha512, SymmetricAlgorithm::Aes256),
        }
    }
}

impl fmt::Display for Curve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Curve::Curve25519 => "curve25519",
            Curve::NistP256 => "p256",
            Curve::NistP384 => "p384",
            Curve::NistP521 => "p521",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oid_lookup_roundtrip() {
        for curve in [
            Curve::Curve25519,
            Curve::NistP256,
            Curve::NistP384,
            Curve::NistP521,
        ] {
            assert_eq!(Curve::from_oid(curve.oid()).unwrap(), curve);
        }
    }

    #[test]
    fn unknown_oid_is_rejected() {
        let err = Curve::from_oid(&[0x2b, 0x81, 0x04, 0x00, 0x0a]).unwrap_err();
        assert!(matches!(err, Error::UnsupportedCurve(_)));
    }

    #[test]
    fn oid_wire_is_length_prefixed() {
        let wire = Curve::NistP256.oid_wire();
        assert_eq!(wire[0] as usize, Curve::NistP256.oid().len());
        assert_eq!(&wire[1..], Curve::NistP256.oid());
    }

    #[test]
    fn only_nist_curves_have_optional_backends() {
        assert!(Curve::Curve25519.platform_curve_id().is_none());
        assert!(Curve::Curve25519.os_module_curve_id().is_none());
        for curve in [Curve::NistP256, Curve::NistP384, Curve::NistP521] {
            assert!(curve.platform_curve_id().is_some());
            assert!(curve.os_module_curve_id().is_some());
            assert!(curve.descriptor().software_fallback);
        }
    }
}
