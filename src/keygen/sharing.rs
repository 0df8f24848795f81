// Copyright (c) 2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

use rand::{CryptoRng, RngCore};
use std::fmt::Debug;
use tracing::{error, info};
use unknown_order::BigNumber;
use uuid::Uuid;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::{
    curve::CurvePoint,
    errors::{CallerError, InternalError, Result},
    keygen::{DealerConfig, ShareParams},
    primes::{gen_prime, generate_moduli},
};

/// Statistical security margin, in bits, between the master secret and the
/// best reconstruction an adversary-sized coalition can attempt.
pub const STAT_SECURITY: usize = 128;

/// Bit size of the Schnorr challenge hash (SHA-256).
pub const CHALLENGE_BITS: usize = 256;

/// The dealer's view of a completed setup: moduli, thresholds, residues,
/// the master secret, and the aggregate public key.
///
/// # 🔒 Storage requirements
/// The master secret and the residues are key material; both are zeroized
/// on drop. The dealer only needs to retain this record long enough to hand
/// out [`ShareParams`] packets; afterwards the aggregate public key is the
/// only piece anyone else ever needs.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct CrtSharing {
    #[zeroize(skip)]
    participants: usize,
    #[zeroize(skip)]
    max_corrupt: usize,
    #[zeroize(skip)]
    recovery_threshold: usize,
    #[zeroize(skip)]
    signing_threshold: usize,
    #[zeroize(skip)]
    weights: Vec<usize>,
    #[zeroize(skip)]
    moduli: Vec<BigNumber>,
    remainders: Vec<BigNumber>,
    secret: BigNumber,
    #[zeroize(skip)]
    recovery_product: BigNumber,
    #[zeroize(skip)]
    signing_product: BigNumber,
    #[zeroize(skip)]
    adversary_product: BigNumber,
    #[zeroize(skip)]
    public_key: CurvePoint,
}

impl CrtSharing {
    /// Run the full dealer setup for `config`: draw moduli in the
    /// configured weight tiers, then call [`CrtSharing::new`].
    pub fn generate<R: RngCore + CryptoRng>(config: &DealerConfig, rng: &mut R) -> Result<Self> {
        let moduli = generate_moduli(config.weight_options(), config.participants(), rng)?;
        Self::new(config.participants(), config.max_corrupt(), moduli, rng)
    }

    /// Build a sharing over precomputed `moduli`.
    ///
    /// `n` is the number of signers and `t` the adversarial bound: the
    /// product of the largest `t` moduli must stay a statistical-security
    /// margin below the master secret's range. The moduli must be sorted
    /// ascending and pairwise distinct.
    ///
    /// Fails with
    /// [`InsufficientWeight`](CallerError::InsufficientWeight) when no
    /// prefix of the moduli accumulates enough weight for reconstruction or
    /// signing; such a failure is fatal for the configuration (more or
    /// heavier moduli are required).
    pub fn new<R: RngCore + CryptoRng>(
        n: usize,
        t: usize,
        moduli: Vec<BigNumber>,
        rng: &mut R,
    ) -> Result<Self> {
        if t == 0 || t >= n || moduli.len() != n {
            error!(
                "invalid sharing shape: n={n}, t={t}, moduli={}",
                moduli.len()
            );
            Err(CallerError::BadInput)?;
        }
        for pair in moduli.windows(2) {
            if pair[0] >= pair[1] {
                error!("moduli must be sorted ascending and pairwise distinct");
                Err(CallerError::DuplicateModulus)?;
            }
        }

        let weights: Vec<usize> = moduli.iter().map(|m| m.bit_length()).collect();

        // Product of the largest t moduli: the heaviest coalition that must
        // not learn anything about the secret.
        let adversary_product = moduli[n - t..]
            .iter()
            .fold(BigNumber::one(), |acc, m| acc * m);

        // L = 2^(lambda + |PMax|), the slack that keeps the secret's high
        // part out of the coalition's reach.
        let slack = BigNumber::one() << (STAT_SECURITY + adversary_product.bit_length());

        let mut p = gen_prime(STAT_SECURITY, rng)?;
        let mut fresh = gen_prime(STAT_SECURITY, rng)?;
        let mut p0 = fresh.nmod(&p);
        fresh.zeroize();

        // S = p0 + p * L, which must stay within (L + 1) * p.
        let mut reconstruction_bound = (&slack + BigNumber::one()) * &p;
        let secret = &p0 + &(&p * &slack);
        p.zeroize();
        p0.zeroize();
        if secret > reconstruction_bound {
            error!("master secret exceeds (L + 1) * p");
            Err(CallerError::SecretOutOfRange)?;
        }

        // Smallest prefix of moduli whose product exceeds the
        // reconstruction bound.
        let mut recovery_product = BigNumber::one();
        let mut recovery_threshold = 0usize;
        while recovery_threshold < n && recovery_product <= reconstruction_bound {
            recovery_product = recovery_product * &moduli[recovery_threshold];
            recovery_threshold += 1;
        }
        if recovery_product <= reconstruction_bound {
            error!("all {n} moduli together cannot exceed the reconstruction bound");
            Err(CallerError::InsufficientWeight)?;
        }
        reconstruction_bound.zeroize();

        // Continue to the smallest prefix that also exceeds 2^256 * S; this
        // is what keeps a 256-bit challenge from overflowing the modulus
        // product during aggregation.
        let mut challenge_bound = (BigNumber::one() << CHALLENGE_BITS) * &secret;
        let mut signing_product = recovery_product.clone();
        let mut signing_threshold = recovery_threshold;
        while signing_threshold < n && signing_product <= challenge_bound {
            signing_product = signing_product * &moduli[signing_threshold];
            signing_threshold += 1;
        }
        if signing_product <= challenge_bound {
            error!("all {n} moduli together cannot exceed the signing bound");
            Err(CallerError::InsufficientWeight)?;
        }
        challenge_bound.zeroize();

        let remainders: Vec<BigNumber> = moduli.iter().map(|m| secret.nmod(m)).collect();
        let public_key = CurvePoint::generator().multiply_by_bignum(&secret)?;

        info!(
            "dealer setup complete: n={n}, t={t}, recovery threshold {recovery_threshold}, \
             signing threshold {signing_threshold}"
        );

        Ok(Self {
            participants: n,
            max_corrupt: t,
            recovery_threshold,
            signing_threshold,
            weights,
            moduli,
            remainders,
            secret,
            recovery_product,
            signing_product,
            adversary_product,
            public_key,
        })
    }

    /// Number of signers.
    pub fn participants(&self) -> usize {
        self.participants
    }

    /// The adversarial bound `t`.
    pub fn max_corrupt(&self) -> usize {
        self.max_corrupt
    }

    /// Minimum number of signers (taken smallest-modulus first) whose
    /// moduli product exceeds the reconstruction bound.
    pub fn recovery_threshold(&self) -> usize {
        self.recovery_threshold
    }

    /// Minimum number of signers whose moduli product also exceeds
    /// `2^256 · S`. A signing session needs at least this many
    /// participants.
    pub fn signing_threshold(&self) -> usize {
        self.signing_threshold
    }

    /// Bit-length weight of each modulus, in modulus order.
    pub fn weights(&self) -> &[usize] {
        &self.weights
    }

    /// The signers' prime moduli, sorted ascending.
    pub fn moduli(&self) -> &[BigNumber] {
        &self.moduli
    }

    /// Each signer's residue of the master secret, in modulus order.
    pub fn remainders(&self) -> &[BigNumber] {
        &self.remainders
    }

    /// The master secret. Exposed for reconstruction tests and key
    /// recovery; not used on the signing path.
    pub fn secret(&self) -> &BigNumber {
        &self.secret
    }

    /// Product of the first [`recovery_threshold`](Self::recovery_threshold)
    /// moduli.
    pub fn recovery_product(&self) -> &BigNumber {
        &self.recovery_product
    }

    /// Product of the first [`signing_threshold`](Self::signing_threshold)
    /// moduli.
    pub fn signing_product(&self) -> &BigNumber {
        &self.signing_product
    }

    /// Product of the largest [`max_corrupt`](Self::max_corrupt) moduli.
    pub fn adversary_product(&self) -> &BigNumber {
        &self.adversary_product
    }

    /// The aggregate public key `S · G`.
    pub fn public_key(&self) -> CurvePoint {
        self.public_key
    }

    /// Produce one registration packet per signer, in modulus order, each
    /// under a fresh UUID.
    pub fn share_packets(&self) -> Vec<ShareParams> {
        self.moduli
            .iter()
            .zip(self.remainders.iter())
            .zip(self.weights.iter())
            .map(|((modulus, remainder), &weight)| ShareParams {
                id: Uuid::new_v4(),
                weight,
                modulus: modulus.clone(),
                remainder: remainder.clone(),
                public_key: self.public_key,
            })
            .collect()
    }
}

impl Debug for CrtSharing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrtSharing")
            .field("participants", &self.participants)
            .field("max_corrupt", &self.max_corrupt)
            .field("recovery_threshold", &self.recovery_threshold)
            .field("signing_threshold", &self.signing_threshold)
            .field("weights", &self.weights)
            .field("secret", &"[redacted]")
            .field("remainders", &"[redacted]")
            .field("public_key", &self.public_key)
            .finish()
    }
}

/// Reconstruct the shared secret from a subset of shares by the Chinese
/// Remainder Theorem. The result equals the master secret whenever the
/// subset's moduli product exceeds the reconstruction bound (at least
/// [`recovery_threshold`](CrtSharing::recovery_threshold) shares, smallest
/// first). Used for testing and key recovery; never on the signing path.
pub fn reconstruct(moduli: &[BigNumber], remainders: &[BigNumber]) -> Result<BigNumber> {
    if moduli.is_empty() || moduli.len() != remainders.len() {
        error!(
            "reconstruction needs matching nonempty share lists, got {} moduli and {} remainders",
            moduli.len(),
            remainders.len()
        );
        Err(CallerError::BadInput)?;
    }

    let product = moduli.iter().fold(BigNumber::one(), |acc, m| acc * m);
    let mut total = BigNumber::zero();
    for (modulus, remainder) in moduli.iter().zip(remainders.iter()) {
        let partial = &product / modulus;
        let inverse = partial.invert(modulus).ok_or_else(|| {
            error!("modulus is not coprime with the rest of the subset");
            InternalError::from(CallerError::BadInput)
        })?;
        let term = (&partial * &inverse * remainder).nmod(&product);
        total = (&total + &term).nmod(&product);
    }
    Ok(total)
}
