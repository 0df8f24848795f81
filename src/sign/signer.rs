// Copyright (c) 2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

use bls12_381::Scalar;
use ff::Field;
use rand::{CryptoRng, RngCore};
use std::fmt::Debug;
use tracing::{error, info};
use unknown_order::BigNumber;
use uuid::Uuid;
use zeroize::Zeroize;

use crate::{
    curve::{random_scalar, scalar_to_bn, CurvePoint},
    errors::{CallerError, Result},
    keygen::{KeySharePrivate, ShareParams},
    messages::SignerCommitment,
    sign::{batch::Batch, challenge, share::PartialSignature},
};

/// A fresh nonce pair for one signing session.
///
/// # 🔒 Lifetime requirements
/// A pair must be used for at most one partial signature and must never be
/// revived for a later session, even if the session it was drawn for is
/// abandoned. The pair is scrubbed when it is consumed or dropped.
pub(crate) struct SigningNonces {
    /// The binding nonce `e`; its commitment enters R scaled by ρ.
    binding: Scalar,
    /// The hiding nonce `d`.
    hiding: Scalar,
}

impl SigningNonces {
    fn sample<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        Self {
            binding: random_scalar(rng),
            hiding: random_scalar(rng),
        }
    }

    /// The public commitments `(E, D) = (e · G, d · G)`.
    fn commitments(&self) -> (CurvePoint, CurvePoint) {
        let generator = CurvePoint::generator();
        (
            generator.multiply_by_scalar(&self.binding),
            generator.multiply_by_scalar(&self.hiding),
        )
    }

    /// The session nonce `k = d + ρ · e`.
    fn session_scalar(&self, binding_factor: &Scalar) -> Scalar {
        self.hiding + binding_factor * self.binding
    }
}

impl Zeroize for SigningNonces {
    fn zeroize(&mut self) {
        self.binding = Scalar::ZERO;
        self.hiding = Scalar::ZERO;
    }
}

impl Drop for SigningNonces {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl Debug for SigningNonces {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningNonces")
            .field("binding", &"[redacted]")
            .field("hiding", &"[redacted]")
            .finish()
    }
}

/// One participant in the threshold signing protocol.
///
/// A signer holds its long-lived [`KeySharePrivate`] and the aggregate
/// public key, plus at most one in-flight nonce pair. Per session it moves
/// through a small state machine:
///
/// - *idle*: no nonce pair. [`Signer::commit`] samples a fresh pair and
///   publishes its commitments.
/// - *awaiting batch*: a pair is armed. [`Signer::sign`] consumes it to
///   produce a [`PartialSignature`] and returns the signer to idle,
///   scrubbing the pair.
///
/// Committing again before signing discards (and scrubs) the previous
/// pair, which is the correct behavior when a session is abandoned.
#[derive(Debug)]
pub struct Signer {
    id: Uuid,
    share: KeySharePrivate,
    public_key: CurvePoint,
    nonces: Option<SigningNonces>,
}

impl Signer {
    /// Build a signer from its long-lived share material.
    pub fn new(id: Uuid, share: KeySharePrivate, public_key: CurvePoint) -> Self {
        Self {
            id,
            share,
            public_key,
            nonces: None,
        }
    }

    /// Build a signer directly from the dealer's registration packet.
    pub fn from_share_params(params: ShareParams) -> Self {
        let (id, share, public_key) = params.into_parts();
        Self::new(id, share, public_key)
    }

    /// The signer's registration id.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The signer's prime modulus.
    pub fn modulus(&self) -> &BigNumber {
        self.share.modulus()
    }

    /// The aggregate public key this signer's partial signatures roll up
    /// under.
    pub fn public_key(&self) -> CurvePoint {
        self.public_key
    }

    /// Whether a nonce pair is armed for the current session.
    pub fn has_pending_nonces(&self) -> bool {
        self.nonces.is_some()
    }

    /// Sample a fresh nonce pair for a new session and return the
    /// commitment payload to publish to the coordinator.
    ///
    /// Any previously armed pair is discarded and scrubbed; nonces never
    /// carry over between sessions.
    pub fn commit<R: RngCore + CryptoRng>(&mut self, rng: &mut R) -> SignerCommitment {
        let nonces = SigningNonces::sample(rng);
        let (binding, hiding) = nonces.commitments();
        self.nonces = Some(nonces);
        SignerCommitment::new(self.id, binding, hiding, self.share.modulus().clone())
    }

    /// Produce this signer's partial signature on `message` for the frozen
    /// roster `batch`.
    ///
    /// Fails with [`NotInBatch`](CallerError::NotInBatch) if the signer's
    /// modulus is absent from the roster (the signer must refuse rather
    /// than sign), and with
    /// [`NonceNotCommitted`](CallerError::NonceNotCommitted) if no fresh
    /// nonce pair is armed. On success the nonce pair is consumed.
    pub fn sign(&mut self, message: &str, batch: &Batch) -> Result<PartialSignature> {
        if !batch.contains(self.share.modulus()) {
            error!("refusing to sign: signer is not part of the session roster");
            Err(CallerError::NotInBatch)?;
        }
        let nonces = self.nonces.take().ok_or_else(|| {
            error!("refusing to sign: no fresh nonce pair for this session");
            CallerError::NonceNotCommitted
        })?;

        let binding_factor = batch.binding_factor(message);
        let commitment = batch.commitment(&binding_factor);

        // k = d + ρ·e in the scalar field; the pair is consumed here.
        let session_scalar = nonces.session_scalar(&binding_factor);
        drop(nonces);

        // c = H(m ‖ R), lifted to the integers alongside k.
        let challenge_int = scalar_to_bn(&challenge(message, &commitment));
        let mut nonce_int = scalar_to_bn(&session_scalar);

        // s_i = k + Λ·share·c, deliberately unreduced: the aggregator
        // reduces once, after summation.
        let lambda = batch.lagrange_coefficient(self.share.modulus())?;
        let mut keyed = &lambda * self.share.remainder();
        let mut scaled = &keyed * &challenge_int;
        let share = &nonce_int + &scaled;
        nonce_int.zeroize();
        keyed.zeroize();
        scaled.zeroize();

        info!("produced partial signature over a roster of {}", batch.len());
        Ok(PartialSignature::new(share, commitment))
    }
}
