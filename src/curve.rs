// Copyright (c) 2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! BLS12-381 G1 arithmetic and the bridge between [`BigNumber`] and the
//! scalar field.
//!
//! Two numeric domains meet here. Moduli, their products, and unreduced
//! partial signatures live in the integers as [`BigNumber`]; group exponents
//! live in the scalar field of G1. Conversions are lossy in one direction
//! only: an integer is reduced mod the group order `r` on its way into the
//! field, and a scalar lifts to its canonical representative in `[0, r)`.

use bls12_381::{G1Affine, G1Projective, Scalar};
use ff::Field;
use group::{Curve, Group};
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::ops::Add;
use tracing::error;
use unknown_order::BigNumber;
use zeroize::Zeroize;

use crate::errors::{CallerError, InternalError, Result};

/// Length in bytes of a compressed G1 encoding.
pub const COMPRESSED_POINT_LEN: usize = 48;

/// Big-endian bytes of the order `r` of the G1 subgroup.
const ORDER_BYTES: [u8; 32] = [
    0x73, 0xed, 0xa7, 0x53, 0x29, 0x9d, 0x7d, 0x48, 0x33, 0x39, 0xd8, 0x08, 0x09, 0xa1, 0xd8,
    0x05, 0x53, 0xbd, 0xe4, 0x02, 0xff, 0xfe, 0x5b, 0xfe, 0xff, 0xff, 0xff, 0xff, 0x00, 0x00,
    0x00, 0x01,
];

/// The order of the G1 subgroup as a [`BigNumber`].
pub(crate) fn curve_order() -> BigNumber {
    BigNumber::from_slice(ORDER_BYTES)
}

/// Wrapper around [`G1Projective`] so that we can define our own
/// serialization (the 48-byte compressed affine encoding) for it.
///
/// Note that this type derives [`Debug`]; if a [`CurvePoint`] appears in a
/// secret-bearing type, that type's `Debug` should redact the field.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CurvePoint(G1Projective);

impl CurvePoint {
    /// The fixed generator `G` of the G1 subgroup.
    pub fn generator() -> Self {
        Self(G1Projective::generator())
    }

    /// The identity element.
    pub fn identity() -> Self {
        Self(G1Projective::identity())
    }

    /// Multiply `self` by a scalar.
    pub fn multiply_by_scalar(&self, scalar: &Scalar) -> Self {
        Self(self.0 * scalar)
    }

    /// Multiply `self` by a [`BigNumber`], which is first reduced into the
    /// scalar field.
    pub fn multiply_by_bignum(&self, exponent: &BigNumber) -> Result<Self> {
        let scalar = bn_to_scalar(exponent)?;
        Ok(self.multiply_by_scalar(&scalar))
    }

    /// Serialize as the 48-byte compressed affine encoding.
    pub fn to_compressed(self) -> [u8; COMPRESSED_POINT_LEN] {
        self.0.to_affine().to_compressed()
    }

    /// Deserialize a compressed affine encoding. Rejects byte strings of
    /// the wrong length and encodings that are not valid subgroup elements.
    pub fn try_from_compressed(bytes: &[u8]) -> Result<Self> {
        let fixed: [u8; COMPRESSED_POINT_LEN] = bytes.try_into().map_err(|_| {
            error!(
                "expected {COMPRESSED_POINT_LEN} bytes of compressed G1, got {}",
                bytes.len()
            );
            CallerError::InvalidPoint
        })?;
        let point: Option<G1Affine> = G1Affine::from_compressed(&fixed).into();
        match point {
            Some(point) => Ok(Self(point.into())),
            None => {
                error!("bytes are not a valid compressed G1 element");
                Err(CallerError::InvalidPoint)?
            }
        }
    }
}

impl Add for CurvePoint {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl AsRef<CurvePoint> for CurvePoint {
    fn as_ref(&self) -> &CurvePoint {
        self
    }
}

impl From<G1Projective> for CurvePoint {
    fn from(p: G1Projective) -> Self {
        Self(p)
    }
}

impl Serialize for CurvePoint {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_compressed().to_vec().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for CurvePoint {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bytes = Vec::<u8>::deserialize(deserializer)?;
        CurvePoint::try_from_compressed(&bytes)
            .map_err(|_| serde::de::Error::custom("invalid compressed G1 point"))
    }
}

/// Reduce a [`BigNumber`] into the scalar field. Negative inputs reduce to
/// their non-negative residue first.
pub(crate) fn bn_to_scalar(x: &BigNumber) -> Result<Scalar> {
    let mut reduced = x.nmod(&curve_order());
    let mut be_bytes = reduced.to_bytes();
    reduced.zeroize();
    if be_bytes.len() > 32 {
        error!("reduced integer does not fit in 32 bytes");
        return Err(InternalError::InternalInvariantFailed);
    }

    // Right-aligned big-endian, reversed, is left-aligned little-endian.
    let mut le_bytes = [0u8; 32];
    for (dst, src) in le_bytes.iter_mut().zip(be_bytes.iter().rev()) {
        *dst = *src;
    }
    be_bytes.zeroize();

    let scalar: Option<Scalar> = Scalar::from_bytes(&le_bytes).into();
    le_bytes.zeroize();
    scalar.ok_or_else(|| {
        error!("canonical residue failed to decode as a scalar");
        InternalError::InternalInvariantFailed
    })
}

/// Lift a scalar to its canonical integer representative in `[0, r)`.
pub(crate) fn scalar_to_bn(s: &Scalar) -> BigNumber {
    let mut bytes = s.to_bytes();
    bytes.reverse();
    let lifted = BigNumber::from_slice(bytes);
    bytes.zeroize();
    lifted
}

/// Interpret a 32-byte digest as a little-endian integer and reduce it into
/// the scalar field. This is the ingestion rule for every hash-derived
/// scalar in the scheme.
pub(crate) fn scalar_from_hash(digest: &[u8; 32]) -> Scalar {
    let mut wide = [0u8; 64];
    wide[..32].copy_from_slice(digest);
    let scalar = Scalar::from_bytes_wide(&wide);
    wide.zeroize();
    scalar
}

/// Sample a uniformly random scalar.
pub fn random_scalar<R: RngCore + CryptoRng>(rng: &mut R) -> Scalar {
    Scalar::random(rng)
}
