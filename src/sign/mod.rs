// Copyright (c) 2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Types and functions for the signing protocol.
//!
//! # High-level protocol description
//! One signing session runs in three moves around a frozen roster:
//! - Each participating signer samples a fresh nonce pair `(e, d)` and
//!   publishes the commitments `(E, D) = (e · G, d · G)` together with its
//!   modulus.
//! - The coordinator freezes the roster into a canonical [`Batch`] and
//!   broadcasts it with the message. Every signer independently derives the
//!   binding factor ρ and the shared session commitment `R`, then returns
//!   the unreduced integer `s_i = (d + ρe) + Λ_i · share_i · c`, where `c`
//!   is the Schnorr challenge and `Λ_i` the CRT coefficient that makes the
//!   weighted shares sum to the master secret modulo the roster's modulus
//!   product.
//! - [`aggregate`] sums the integers, reduces modulo the modulus product
//!   (recovering `Σk + c·S` exactly, because the roster met the signing
//!   threshold) and then modulo the group order, yielding an ordinary
//!   Schnorr pair `(s, R)` that [`Signature::verify`] checks against the
//!   aggregate public key.

use sha2::{Digest, Sha256};
use tracing::{error, info};
use unknown_order::BigNumber;

use bls12_381::Scalar;
use serde::{Deserialize, Serialize};

use crate::{
    curve::{bn_to_scalar, curve_order, scalar_from_hash, CurvePoint},
    errors::{CallerError, Result},
};

mod batch;
mod share;
mod signer;

pub use batch::{Batch, BatchItem};
pub use share::PartialSignature;
pub use signer::Signer;

/// The Schnorr challenge `c = H(m ‖ R)`, over the compressed encoding of
/// the session commitment.
pub(crate) fn challenge(message: &str, commitment: &CurvePoint) -> Scalar {
    let mut hasher = Sha256::new();
    hasher.update(message.as_bytes());
    hasher.update(commitment.to_compressed());
    scalar_from_hash(&hasher.finalize().into())
}

/// A complete threshold Schnorr signature `(s, R)`.
///
/// `s` is carried as an integer (already reduced modulo the group order by
/// [`aggregate`]); it is converted into the scalar field only inside
/// [`verify`](Signature::verify). That keeps the wire form independent of
/// the field encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    s: BigNumber,
    commitment: CurvePoint,
}

impl Signature {
    /// The scalar part `s` as its canonical integer representative.
    pub fn s(&self) -> &BigNumber {
        &self.s
    }

    /// The session commitment `R`.
    pub fn commitment(&self) -> &CurvePoint {
        &self.commitment
    }

    /// Check the signature on `message` against the aggregate public key:
    /// `s · G == R + c · Pub`.
    ///
    /// Total: every failure mode, including ill-formed `s`, verifies as
    /// `false`.
    pub fn verify(&self, message: &str, public_key: &CurvePoint) -> bool {
        let c = challenge(message, &self.commitment);
        let s = match bn_to_scalar(&self.s) {
            Ok(s) => s,
            Err(_) => return false,
        };
        let lhs = CurvePoint::generator().multiply_by_scalar(&s);
        let rhs = self.commitment + public_key.multiply_by_scalar(&c);
        lhs == rhs
    }
}

/// Combine partial signatures into a single Schnorr signature.
///
/// `product` is the product of the participating signers' moduli. The
/// partials are commutative under integer addition, so their order is
/// irrelevant; the common session commitment is taken from the first
/// entry. Fails with [`NoSignatures`](CallerError::NoSignatures) on an
/// empty list.
pub fn aggregate(partials: &[PartialSignature], product: &BigNumber) -> Result<Signature> {
    let Some(first) = partials.first() else {
        error!("cannot aggregate zero partial signatures");
        return Err(CallerError::NoSignatures.into());
    };

    let sum = partials
        .iter()
        .fold(BigNumber::zero(), |acc, partial| acc + partial.share());
    let s = sum.nmod(product).nmod(&curve_order());

    info!("aggregated {} partial signatures", partials.len());
    Ok(Signature {
        s,
        commitment: *first.commitment(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        keygen::{reconstruct, CrtSharing},
        primes::generate_moduli,
        utils::testing::init_testing,
    };
    use rand::{rngs::StdRng, seq::SliceRandom, CryptoRng, RngCore};

    /// A dealer setup plus one armed signer per participant.
    struct TestQuorum {
        sharing: CrtSharing,
        signers: Vec<Signer>,
    }

    impl TestQuorum {
        fn new(
            n: usize,
            t: usize,
            weight_opts: &[usize],
            rng: &mut (impl RngCore + CryptoRng),
        ) -> Self {
            let moduli = generate_moduli(weight_opts, n, rng).unwrap();
            let sharing = CrtSharing::new(n, t, moduli, rng).unwrap();
            let signers = sharing
                .share_packets()
                .into_iter()
                .map(Signer::from_share_params)
                .collect();
            Self { sharing, signers }
        }

        /// Commit the first `count` signers (the lightest moduli) and
        /// freeze their roster.
        fn session(&mut self, count: usize, rng: &mut StdRng) -> Batch {
            let items = self.signers[..count]
                .iter_mut()
                .map(|signer| signer.commit(rng).batch_item())
                .collect();
            Batch::new(items).unwrap()
        }

        /// Run a full signing round over `batch` for the first `count`
        /// signers.
        fn partials(&mut self, message: &str, batch: &Batch, count: usize) -> Vec<PartialSignature> {
            self.signers[..count]
                .iter_mut()
                .map(|signer| signer.sign(message, batch).unwrap())
                .collect()
        }
    }

    #[test]
    fn threshold_session_produces_a_verifying_signature() {
        let mut rng = init_testing();
        let mut quorum = TestQuorum::new(5, 2, &[256], &mut rng);
        let count = quorum.sharing.signing_threshold();

        let batch = quorum.session(count, &mut rng);
        let partials = quorum.partials("hello", &batch, count);
        let signature = aggregate(&partials, &batch.product()).unwrap();

        assert!(signature.verify("hello", &quorum.sharing.public_key()));
        // A verifying signature is bound to its message.
        assert!(!signature.verify("Hello", &quorum.sharing.public_key()));
    }

    #[test]
    fn all_participants_derive_the_same_session_commitment() {
        let mut rng = init_testing();
        let mut quorum = TestQuorum::new(5, 2, &[256], &mut rng);
        let count = quorum.sharing.signing_threshold();

        let batch = quorum.session(count, &mut rng);
        let partials = quorum.partials("same R", &batch, count);
        for pair in partials.windows(2) {
            assert_eq!(pair[0].commitment(), pair[1].commitment());
        }
    }

    #[test]
    fn weighted_shares_reconstruct_through_the_lagrange_coefficients() {
        let mut rng = init_testing();
        let mut quorum = TestQuorum::new(5, 2, &[256], &mut rng);
        let count = quorum.sharing.signing_threshold();
        let batch = quorum.session(count, &mut rng);

        // Σ Λ_j · remainder_j ≡ S (mod Π P_j).
        let weighted_sum = batch
            .items()
            .iter()
            .zip(quorum.sharing.remainders())
            .fold(BigNumber::zero(), |acc, (item, remainder)| {
                let lambda = batch.lagrange_coefficient(item.modulus()).unwrap();
                acc + &(&lambda * remainder)
            });
        let product = batch.product();
        assert_eq!(
            weighted_sum.nmod(&product),
            quorum.sharing.secret().nmod(&product)
        );
    }

    #[test]
    fn undersized_roster_signs_but_does_not_verify() {
        let mut rng = init_testing();
        let mut quorum = TestQuorum::new(5, 2, &[256], &mut rng);
        let count = quorum.sharing.signing_threshold() - 1;

        // Signing itself runs fine; the result just cannot clear
        // verification because the modulus product is below the signing
        // bound and the reduction corrupts c·S.
        let batch = quorum.session(count, &mut rng);
        let partials = quorum.partials("underweight", &batch, count);
        let signature = aggregate(&partials, &batch.product()).unwrap();
        assert!(!signature.verify("underweight", &quorum.sharing.public_key()));
    }

    #[test]
    fn disjoint_sessions_verify_independently_and_do_not_mix() {
        let mut rng = init_testing();
        let mut quorum = TestQuorum::new(12, 2, &[128, 256], &mut rng);
        let count = quorum.sharing.signing_threshold();

        let batch_one = quorum.session(count, &mut rng);
        let partials_one = quorum.partials("first message", &batch_one, count);
        let sig_one = aggregate(&partials_one, &batch_one.product()).unwrap();

        let batch_two = quorum.session(count, &mut rng);
        let partials_two = quorum.partials("second message", &batch_two, count);
        let sig_two = aggregate(&partials_two, &batch_two.product()).unwrap();

        let public_key = quorum.sharing.public_key();
        assert!(sig_one.verify("first message", &public_key));
        assert!(sig_two.verify("second message", &public_key));

        // Splicing s from one session with R from the other fails.
        let spliced = Signature {
            s: sig_one.s().clone(),
            commitment: *sig_two.commitment(),
        };
        assert!(!spliced.verify("first message", &public_key));
        assert!(!spliced.verify("second message", &public_key));
    }

    #[test]
    fn bit_flips_break_verification() {
        let mut rng = init_testing();
        let mut quorum = TestQuorum::new(5, 2, &[256], &mut rng);
        let count = quorum.sharing.signing_threshold();

        let batch = quorum.session(count, &mut rng);
        let partials = quorum.partials("foo", &batch, count);
        let signature = aggregate(&partials, &batch.product()).unwrap();
        let public_key = quorum.sharing.public_key();
        assert!(signature.verify("foo", &public_key));

        // Tampered message.
        assert!(!signature.verify("Foo", &public_key));

        // Tampered s.
        let tampered_s = Signature {
            s: signature.s() + BigNumber::one(),
            commitment: *signature.commitment(),
        };
        assert!(!tampered_s.verify("foo", &public_key));

        // Tampered R.
        let tampered_r = Signature {
            s: signature.s().clone(),
            commitment: *signature.commitment() + CurvePoint::generator(),
        };
        assert!(!tampered_r.verify("foo", &public_key));
    }

    #[test]
    fn aggregation_is_order_independent() {
        let mut rng = init_testing();
        let mut quorum = TestQuorum::new(5, 2, &[256], &mut rng);
        let count = quorum.sharing.signing_threshold();

        let batch = quorum.session(count, &mut rng);
        let mut partials = quorum.partials("shuffle", &batch, count);
        let product = batch.product();
        let baseline = aggregate(&partials, &product).unwrap();

        for _ in 0..4 {
            partials.shuffle(&mut rng);
            assert_eq!(aggregate(&partials, &product).unwrap(), baseline);
        }
    }

    #[test]
    fn aggregating_nothing_is_a_caller_error() {
        let product = BigNumber::from(15u64);
        assert_eq!(
            aggregate(&[], &product).err(),
            Some(CallerError::NoSignatures.into())
        );
    }

    #[test]
    fn full_quorum_reconstruction_matches_the_signing_key() {
        // Sanity link between the two halves of the scheme: the secret the
        // shares reconstruct is the discrete log of the public key.
        let mut rng = init_testing();
        let quorum = TestQuorum::new(5, 2, &[256], &mut rng);
        let secret = reconstruct(quorum.sharing.moduli(), quorum.sharing.remainders()).unwrap();
        assert_eq!(&secret, quorum.sharing.secret());
        let public_key = CurvePoint::generator()
            .multiply_by_bignum(&secret)
            .unwrap();
        assert_eq!(public_key, quorum.sharing.public_key());
    }
}
