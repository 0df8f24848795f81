// Copyright (c) 2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

use serde::{Deserialize, Serialize};
use unknown_order::BigNumber;

use crate::curve::CurvePoint;

/// A single participant's share of the signature: the unreduced integer
/// contribution `s_i` together with the session commitment `R` it was
/// computed against.
///
/// The integer stays unreduced on purpose: CRT reconstruction happens in
/// the integers, and the aggregator reduces only after summing (first mod
/// the session's modulus product, then mod the group order). Reducing
/// per-signer would destroy the reconstruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialSignature {
    share: BigNumber,
    commitment: CurvePoint,
}

impl PartialSignature {
    pub(crate) fn new(share: BigNumber, commitment: CurvePoint) -> Self {
        Self { share, commitment }
    }

    /// The unreduced integer contribution `s_i`.
    pub fn share(&self) -> &BigNumber {
        &self.share
    }

    /// The session commitment `R`; every participant in the session
    /// reports the same point.
    pub fn commitment(&self) -> &CurvePoint {
        &self.commitment
    }
}
