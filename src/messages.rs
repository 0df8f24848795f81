// Copyright (c) 2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Wire payloads exchanged with external collaborators.
//!
//! These are the only bytes that cross the core's boundary. The transport
//! (RPC, WebSocket, files) is someone else's concern; the shapes here are
//! normative. Group elements travel as 48-byte compressed G1 encodings and
//! big integers through [`BigNumber`]'s serialization.
//!
//! Messages that flow through a single connection are wrapped in the
//! [`Envelope`] enum, one arm per message kind, replacing dispatch on a
//! free-form type string.

use serde::{Deserialize, Serialize};
use unknown_order::BigNumber;
use uuid::Uuid;

use crate::{
    curve::CurvePoint,
    errors::Result,
    keygen::ShareParams,
    sign::{Batch, BatchItem, PartialSignature},
};

/// A signer's per-session nonce commitments, published to the coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerCommitment {
    /// The signer's registration id.
    pub id: Uuid,
    /// The binding nonce commitment `E = e · G`.
    #[serde(rename = "E")]
    binding: CurvePoint,
    /// The hiding nonce commitment `D = d · G`.
    #[serde(rename = "D")]
    hiding: CurvePoint,
    /// The signer's prime modulus.
    #[serde(rename = "P")]
    modulus: BigNumber,
}

impl SignerCommitment {
    /// Assemble a commitment payload.
    pub fn new(id: Uuid, binding: CurvePoint, hiding: CurvePoint, modulus: BigNumber) -> Self {
        Self {
            id,
            binding,
            hiding,
            modulus,
        }
    }

    /// The binding nonce commitment `E`.
    pub fn binding(&self) -> &CurvePoint {
        &self.binding
    }

    /// The hiding nonce commitment `D`.
    pub fn hiding(&self) -> &CurvePoint {
        &self.hiding
    }

    /// The signer's prime modulus.
    pub fn modulus(&self) -> &BigNumber {
        &self.modulus
    }

    /// The roster entry this commitment contributes to a session batch.
    pub fn batch_item(&self) -> BatchItem {
        BatchItem::new(self.modulus.clone(), self.binding, self.hiding)
    }
}

/// The coordinator's broadcast that opens a signing round: the message and
/// the frozen roster, in canonical order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignPrep {
    /// The message to sign.
    #[serde(rename = "msg")]
    message: String,
    /// The roster entries, ascending by modulus.
    #[serde(rename = "B")]
    items: Vec<BatchItem>,
}

impl SignPrep {
    /// Snapshot a frozen batch into a broadcast payload.
    pub fn new(message: impl Into<String>, batch: &Batch) -> Self {
        Self {
            message: message.into(),
            items: batch.items().to_vec(),
        }
    }

    /// The message to sign.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Rebuild the canonical batch on the receiving side. Re-sorting is
    /// deliberate: a malformed or reordered payload still canonicalizes to
    /// the same batch every honest participant derives.
    pub fn batch(&self) -> Result<Batch> {
        Batch::new(self.items.clone())
    }
}

/// A signer's reply to a signing round: its unreduced integer share and
/// the session commitment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignResult {
    /// The unreduced integer contribution `s_i`.
    #[serde(rename = "s")]
    share: BigNumber,
    /// The session commitment `R`.
    #[serde(rename = "R")]
    commitment: CurvePoint,
}

impl SignResult {
    /// The unreduced integer contribution `s_i`.
    pub fn share(&self) -> &BigNumber {
        &self.share
    }

    /// The session commitment `R`.
    pub fn commitment(&self) -> &CurvePoint {
        &self.commitment
    }

    /// View the payload as a partial signature for aggregation.
    pub fn into_partial(self) -> PartialSignature {
        PartialSignature::new(self.share, self.commitment)
    }
}

impl From<PartialSignature> for SignResult {
    fn from(partial: PartialSignature) -> Self {
        Self {
            share: partial.share().clone(),
            commitment: *partial.commitment(),
        }
    }
}

/// Everything that can travel over a coordinator connection, one variant
/// per message kind. The variant names mirror the legacy type tags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Envelope {
    /// Dealer → signer: registration handout.
    #[serde(rename = "PARAMS")]
    Params(ShareParams),
    /// Signer → coordinator: nonce commitments for the next session.
    #[serde(rename = "COMMIT")]
    Commitment(SignerCommitment),
    /// Coordinator → signer: frozen roster and message.
    #[serde(rename = "SIGNPREP")]
    SignPrep(SignPrep),
    /// Coordinator → signer: produce your partial signature now.
    #[serde(rename = "SIGN")]
    Sign,
    /// Signer → coordinator: partial signature.
    #[serde(rename = "SIGNRES")]
    SignResult(SignResult),
}
