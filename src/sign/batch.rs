// Copyright (c) 2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

use bls12_381::Scalar;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::error;
use unknown_order::BigNumber;
use zeroize::Zeroize;

use crate::{
    curve::{scalar_from_hash, CurvePoint},
    errors::{CallerError, InternalError, Result},
};

/// One signer's entry in a commitment batch: its modulus and its two nonce
/// commitments for the session.
///
/// Following the usual threshold-Schnorr naming, the *hiding* commitment
/// (`D = d · G`) enters the session commitment directly and the *binding*
/// commitment (`E = e · G`) enters scaled by the binding factor ρ.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchItem {
    /// The signer's prime modulus.
    #[serde(rename = "P")]
    modulus: BigNumber,
    /// The binding nonce commitment `E`.
    #[serde(rename = "E")]
    binding: CurvePoint,
    /// The hiding nonce commitment `D`.
    #[serde(rename = "D")]
    hiding: CurvePoint,
}

impl BatchItem {
    /// Assemble a batch entry.
    pub fn new(modulus: BigNumber, binding: CurvePoint, hiding: CurvePoint) -> Self {
        Self {
            modulus,
            binding,
            hiding,
        }
    }

    /// The signer's prime modulus.
    pub fn modulus(&self) -> &BigNumber {
        &self.modulus
    }

    /// The binding nonce commitment `E`.
    pub fn binding(&self) -> &CurvePoint {
        &self.binding
    }

    /// The hiding nonce commitment `D`.
    pub fn hiding(&self) -> &CurvePoint {
        &self.hiding
    }
}

/// The ordered roster of a signing session: one [`BatchItem`] per
/// participant, canonically sorted ascending by modulus.
///
/// Every participant must derive a bit-identical batch: the binding
/// factor hashes the roster in order, so any disagreement about membership
/// or order makes the session commitment (and therefore the signature)
/// diverge. The constructor enforces the canonical order, so independently
/// assembled rosters with the same membership always agree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    items: Vec<BatchItem>,
}

impl Batch {
    /// Canonicalize `items` into a batch: sort ascending by modulus and
    /// reject duplicates (moduli are unique by construction, so a duplicate
    /// means two entries claim the same signer).
    pub fn new(mut items: Vec<BatchItem>) -> Result<Self> {
        if items.is_empty() {
            error!("a signing session needs at least one participant");
            Err(CallerError::BadInput)?;
        }
        // Wire-supplied moduli have to be sensible before any of them is
        // used as an inversion modulus.
        for item in &items {
            if item.modulus < BigNumber::from(2u64) {
                error!("batch entry carries a degenerate modulus");
                Err(CallerError::InvalidBigInt)?;
            }
        }
        items.sort_by(|a, b| a.modulus.cmp(&b.modulus));
        for pair in items.windows(2) {
            if pair[0].modulus == pair[1].modulus {
                error!("two batch entries share a modulus");
                Err(CallerError::DuplicateModulus)?;
            }
        }
        Ok(Self { items })
    }

    /// Number of participants.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True if the batch has no participants. (Unreachable through
    /// [`Batch::new`], which rejects empty rosters.)
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The entries, in canonical order.
    pub fn items(&self) -> &[BatchItem] {
        &self.items
    }

    /// Whether a signer with the given modulus participates.
    pub fn contains(&self, modulus: &BigNumber) -> bool {
        self.items.iter().any(|item| &item.modulus == modulus)
    }

    /// The binding factor ρ = H(m ‖ E_0 ‖ D_0 ‖ E_1 ‖ D_1 ‖ …), hashing
    /// the compressed encodings in canonical roster order.
    pub fn binding_factor(&self, message: &str) -> Scalar {
        let mut hasher = Sha256::new();
        hasher.update(message.as_bytes());
        for item in &self.items {
            hasher.update(item.binding.to_compressed());
            hasher.update(item.hiding.to_compressed());
        }
        scalar_from_hash(&hasher.finalize().into())
    }

    /// The session commitment R = Σ D_j + ρ · Σ E_j. Identical for every
    /// participant because ρ is derived from the whole roster.
    pub fn commitment(&self, binding_factor: &Scalar) -> CurvePoint {
        let mut hiding_sum = CurvePoint::identity();
        let mut binding_sum = CurvePoint::identity();
        for item in &self.items {
            hiding_sum = hiding_sum + item.hiding;
            binding_sum = binding_sum + item.binding;
        }
        hiding_sum + binding_sum.multiply_by_scalar(binding_factor)
    }

    /// The product of all participating moduli.
    pub fn product(&self) -> BigNumber {
        self.items
            .iter()
            .fold(BigNumber::one(), |acc, item| acc * &item.modulus)
    }

    /// The CRT reconstruction coefficient for the participant with the
    /// given modulus: Λ = Q · (Q⁻¹ mod P_i) with Q the product of everyone
    /// else's moduli. As an integer (not reduced), Λ ≡ 1 (mod P_i) and
    /// Λ ≡ 0 (mod P_j) for j ≠ i.
    pub fn lagrange_coefficient(&self, modulus: &BigNumber) -> Result<BigNumber> {
        if !self.contains(modulus) {
            error!("modulus is not part of this batch");
            Err(CallerError::NotInBatch)?;
        }
        let mut quotient = self.product() / modulus;
        // The inverse exists because the moduli are pairwise coprime.
        let mut inverse = quotient.invert(modulus).ok_or_else(|| {
            error!("batch moduli are not pairwise coprime");
            InternalError::InternalInvariantFailed
        })?;
        let coefficient = &quotient * &inverse;
        quotient.zeroize();
        inverse.zeroize();
        Ok(coefficient)
    }
}
