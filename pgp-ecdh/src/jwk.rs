#![forbid(unsafe_code)]

// Transient structured key views crossing the platform crypto API boundary.
// Purely octet/encoding transforms; no cryptography happens here.

use std::fmt;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::curve::NIST_POINT_TAG;
use crate::{Error, Result};

/// Public EC key in JWK form, coordinates base64url encoded without padding.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EcJwkPublic {
    pub kty: String,
    pub crv: String,
    pub x: String,
    pub y: String,
    pub ext: bool,
}

/// Private EC key in JWK form; dropped material is zeroized.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct EcJwkPrivate {
    pub kty: String,
    pub crv: String,
    pub x: String,
    pub y: String,
    pub d: String,
    pub ext: bool,
}

impl EcJwkPrivate {
    /// Public half of this key.
    pub fn to_public(&self) -> EcJwkPublic {
        EcJwkPublic {
            kty: self.kty.clone(),
            crv: self.crv.clone(),
            x: self.x.clone(),
            y: self.y.clone(),
            ext: self.ext,
        }
    }
}

impl fmt::Debug for EcJwkPrivate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EcJwkPrivate")
            .field("kty", &self.kty)
            .field("crv", &self.crv)
            .field("d", &"[REDACTED]")
            .finish()
    }
}

/// Split a raw uncompressed point into a structured public view.
pub fn public_from_raw(payload_size: usize, crv: &str, raw_public: &[u8]) -> Result<EcJwkPublic> {
    let expected = 1 + 2 * payload_size;
    if raw_public.len() != expected || raw_public[0] != NIST_POINT_TAG {
        return Err(Error::MalformedInput(format!(
            "uncompressed point of {expected} octets expected, got {}",
            raw_public.len()
        )));
    }
    let x = &raw_public[1..1 + payload_size];
    let y = &raw_public[1 + payload_size..];
    Ok(EcJwkPublic {
        kty: "EC".into(),
        crv: crv.into(),
        x: URL_SAFE_NO_PAD.encode(x),
        y: URL_SAFE_NO_PAD.encode(y),
        ext: true,
    })
}

/// Structured private view from raw scalar plus the matching public point.
/// Short scalars are left-padded to the full field width.
pub fn private_from_raw(
    payload_size: usize,
    crv: &str,
    raw_private: &[u8],
    raw_public: &[u8],
) -> Result<EcJwkPrivate> {
    if raw_private.is_empty() || raw_private.len() > payload_size {
        return Err(Error::MalformedInput(format!(
            "private scalar must be 1..={payload_size} octets, got {}",
            raw_private.len()
        )));
    }
    let public = public_from_raw(payload_size, crv, raw_public)?;
    let mut scalar = Zeroizing::new(vec![0u8; payload_size]);
    scalar[payload_size - raw_private.len()..].copy_from_slice(raw_private);
    Ok(EcJwkPrivate {
        kty: public.kty,
        crv: public.crv,
        x: public.x,
        y: public.y,
        d: URL_SAFE_NO_PAD.encode(&scalar[..]),
        ext: true,
    })
}

/// Rebuild the raw `0x04`-tagged uncompressed point from a public view.
pub fn public_to_raw(jwk: &EcJwkPublic) -> Result<Vec<u8>> {
    let decode = |field: &str, name: &str| {
        URL_SAFE_NO_PAD
            .decode(field)
            .map_err(|_| Error::MalformedInput(format!("JWK {name} coordinate is not base64url")))
    };
    let x = decode(&jwk.x, "x")?;
    let y = decode(&jwk.y, "y")?;
    if x.len() != y.len() {
        return Err(Error::MalformedInput(
            "JWK coordinates have mismatched lengths".into(),
        ));
    }
    let mut raw = Vec::with_capacity(1 + x.len() + y.len());
    raw.push(NIST_POINT_TAG);
    raw.extend_from_slice(&x);
    raw.extend_from_slice(&y);
    Ok(raw)
}

/// Raw private scalar carried by a private view.
pub fn private_scalar(jwk: &EcJwkPrivate) -> Result<Zeroizing<Vec<u8>>> {
    URL_SAFE_NO_PAD
        .decode(&jwk.d)
        .map(Zeroizing::new)
        .map_err(|_| Error::MalformedInput("JWK private scalar is not base64url".into()))
}
