// Copyright (c) 2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use unknown_order::BigNumber;
use uuid::Uuid;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::curve::CurvePoint;

/// A signer's long-lived secret share: its prime modulus and the residue of
/// the master secret modulo that prime.
///
/// # 🔒 Storage requirements
/// The residue is secret key material and must be stored securely by the
/// calling application. It is zeroized on drop.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct KeySharePrivate {
    modulus: BigNumber,
    remainder: BigNumber,
}

impl KeySharePrivate {
    /// Wrap a modulus and residue as a private share.
    pub fn new(modulus: BigNumber, remainder: BigNumber) -> Self {
        Self { modulus, remainder }
    }

    /// The signer's prime modulus. This is public information (it appears
    /// in every commitment batch the signer joins).
    pub fn modulus(&self) -> &BigNumber {
        &self.modulus
    }

    /// The residue of the master secret modulo [`modulus`](Self::modulus).
    pub(crate) fn remainder(&self) -> &BigNumber {
        &self.remainder
    }
}

impl Debug for KeySharePrivate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeySharePrivate")
            .field("modulus", &self.modulus)
            .field("remainder", &"[redacted]")
            .finish()
    }
}

/// The dealer's one-time handout to a single signer.
///
/// This is the registration payload: the signer's identity, its weight tier
/// and modulus, its secret residue, and the aggregate public key every
/// signature verifies under.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct ShareParams {
    /// Registration id assigned by the dealer.
    #[zeroize(skip)]
    pub id: Uuid,
    /// Bit-length tier of the modulus.
    pub weight: usize,
    /// The signer's prime modulus.
    pub modulus: BigNumber,
    /// The signer's secret residue.
    pub remainder: BigNumber,
    /// The aggregate public key, `S · G`.
    #[zeroize(skip)]
    #[serde(rename = "pub")]
    pub public_key: CurvePoint,
}

impl ShareParams {
    /// Split the packet into the signer's private share and the aggregate
    /// public key.
    pub fn into_parts(mut self) -> (Uuid, KeySharePrivate, CurvePoint) {
        let share = KeySharePrivate::new(
            std::mem::replace(&mut self.modulus, BigNumber::zero()),
            std::mem::replace(&mut self.remainder, BigNumber::zero()),
        );
        (self.id, share, self.public_key)
    }
}

impl Debug for ShareParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShareParams")
            .field("id", &self.id)
            .field("weight", &self.weight)
            .field("modulus", &self.modulus)
            .field("remainder", &"[redacted]")
            .field("public_key", &self.public_key)
            .finish()
    }
}
