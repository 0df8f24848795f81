// Copyright (c) 2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Random prime generation for signer moduli.
//!
//! Moduli come in caller-chosen bit-length tiers (the signer "weights").
//! Primes of the same tier are additionally constrained to the top
//! `n/(n+1)` slice of their range so that prefix products over a sorted
//! moduli list grow predictably with the participant count.

use rand::{CryptoRng, Rng, RngCore};
use std::sync::mpsc;
use std::thread;
use tracing::{debug, error};
use unknown_order::BigNumber;

use crate::{
    errors::{CallerError, Result},
    utils::random_positive_bn,
};

/// Number of Miller-Rabin witnesses checked per candidate.
pub const MILLER_RABIN_ROUNDS: usize = 20;

/// Size of the worker pool used by [`generate_moduli`].
const PRIME_WORKERS: usize = 16;

/// First odd primes, used to cheaply reject candidates before Miller-Rabin.
const SMALL_PRIMES: [u64; 15] = [3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53];

fn validate_bits(bits: usize) -> Result<()> {
    if bits < 16 || bits % 8 != 0 {
        error!("prime bit-length must be a multiple of 8 and at least 16, got {bits}");
        Err(CallerError::BadInput)?;
    }
    Ok(())
}

/// Generate a random prime of exactly `bits` bits, with both the top and
/// bottom bit set.
pub fn gen_prime<R: RngCore + CryptoRng>(bits: usize, rng: &mut R) -> Result<BigNumber> {
    validate_bits(bits)?;
    let mut buf = vec![0u8; bits / 8];
    loop {
        rng.fill_bytes(&mut buf);
        // Force the top bit so the candidate has exactly `bits` bits, and
        // the bottom bit so it is odd.
        buf[0] |= 0b1000_0000;
        buf[bits / 8 - 1] |= 0b0000_0001;

        let candidate = BigNumber::from_slice(&buf);
        if is_probable_prime(&candidate, MILLER_RABIN_ROUNDS, rng) {
            return Ok(candidate);
        }
    }
}

/// Generate a random prime `p` with `n/(n+1) * 2^bits <= p < 2^bits`, by
/// rejection-sampling [`gen_prime`] until the lower bound holds.
pub fn gen_range_prime<R: RngCore + CryptoRng>(
    bits: usize,
    n: usize,
    rng: &mut R,
) -> Result<BigNumber> {
    validate_bits(bits)?;
    if n == 0 {
        Err(CallerError::BadInput)?;
    }
    let lower = (BigNumber::one() << bits) * BigNumber::from(n as u64)
        / BigNumber::from(n as u64 + 1);
    loop {
        let candidate = gen_prime(bits, rng)?;
        if candidate >= lower {
            return Ok(candidate);
        }
    }
}

/// Draw `n` weights uniformly from `weight_opts` and generate one prime
/// modulus per weight on a bounded worker pool. Returns the moduli sorted
/// ascending; fails with
/// [`DuplicateModulus`](crate::errors::CallerError::DuplicateModulus) in the
/// (negligible, for sane parameters) event that two workers produced the
/// same prime.
///
/// The weight draw comes from the caller's RNG; the primes themselves come
/// from each worker's thread-local CSPRNG. The returned list depends only
/// on the drawn weights and the workers' output, never on scheduling.
pub fn generate_moduli<R: RngCore + CryptoRng>(
    weight_opts: &[usize],
    n: usize,
    rng: &mut R,
) -> Result<Vec<BigNumber>> {
    if weight_opts.is_empty() || n == 0 {
        error!("moduli generation needs a nonempty weight set and a positive count");
        Err(CallerError::BadInput)?;
    }
    for &bits in weight_opts {
        validate_bits(bits)?;
    }

    let weights: Vec<usize> = (0..n)
        .map(|_| weight_opts[rng.gen_range(0..weight_opts.len())])
        .collect();
    debug!("generating {n} moduli over weight tiers {weight_opts:?}");

    let workers = PRIME_WORKERS.min(n);
    let mut moduli = thread::scope(|scope| -> Result<Vec<BigNumber>> {
        let (tx, rx) = mpsc::channel();
        for offset in 0..workers {
            let tx = tx.clone();
            let weights = &weights;
            scope.spawn(move || {
                let mut rng = rand::thread_rng();
                for &bits in weights.iter().skip(offset).step_by(workers) {
                    if tx.send(gen_range_prime(bits, n, &mut rng)).is_err() {
                        break;
                    }
                }
            });
        }
        drop(tx);
        rx.iter().collect()
    })?;

    moduli.sort();
    moduli.dedup();
    if moduli.len() < n {
        error!("prime generation produced a duplicate modulus");
        Err(CallerError::DuplicateModulus)?;
    }
    Ok(moduli)
}

/// Miller-Rabin primality check with `rounds` uniformly drawn witnesses,
/// preceded by trial division against the first few odd primes.
pub(crate) fn is_probable_prime<R: RngCore + CryptoRng>(
    candidate: &BigNumber,
    rounds: usize,
    rng: &mut R,
) -> bool {
    let one = BigNumber::one();
    let two = BigNumber::from(2u64);
    if candidate < &two {
        return false;
    }
    if candidate == &two {
        return true;
    }
    if (candidate % &two) == BigNumber::zero() {
        return false;
    }
    for p in SMALL_PRIMES {
        let p = BigNumber::from(p);
        if candidate == &p {
            return true;
        }
        if (candidate % &p) == BigNumber::zero() {
            return false;
        }
    }

    // Write candidate - 1 as d * 2^s with d odd.
    let n_minus_1 = candidate - &one;
    let mut d = n_minus_1.clone();
    let mut s = 0usize;
    while (&d % &two) == BigNumber::zero() {
        d = &d / &two;
        s += 1;
    }

    let witness_range = candidate - &BigNumber::from(3u64);
    'witness: for _ in 0..rounds {
        // Witness in [2, candidate - 2].
        let a = random_positive_bn(rng, &witness_range) + &two;
        let mut x = a.modpow(&d, candidate);
        if x == one || x == n_minus_1 {
            continue;
        }
        for _ in 1..s {
            x = x.modpow(&two, candidate);
            if x == n_minus_1 {
                continue 'witness;
            }
        }
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::testing::init_testing;

    #[test]
    fn known_primes_and_composites() {
        let mut rng = init_testing();
        for p in [104_729u64, 65_537, 2_147_483_647] {
            assert!(is_probable_prime(&BigNumber::from(p), 10, &mut rng));
        }
        // 3599 = 59 * 61; the others are Carmichael numbers.
        for c in [3599u64, 561, 41_041, 825_265] {
            assert!(!is_probable_prime(&BigNumber::from(c), 10, &mut rng));
        }
    }

    #[test]
    fn generated_primes_have_exact_bit_length() {
        let mut rng = init_testing();
        for bits in [32, 64] {
            let p = gen_prime(bits, &mut rng).unwrap();
            assert_eq!(p.bit_length(), bits);
            assert_eq!(&p % &BigNumber::from(2u64), BigNumber::one());
            assert!(is_probable_prime(&p, 10, &mut rng));
        }
    }

    #[test]
    fn range_primes_respect_the_lower_bound() {
        let mut rng = init_testing();
        let n = 8usize;
        let lower = (BigNumber::one() << 32) * BigNumber::from(n as u64)
            / BigNumber::from(n as u64 + 1);
        for _ in 0..4 {
            let p = gen_range_prime(32, n, &mut rng).unwrap();
            assert!(p >= lower);
            assert_eq!(p.bit_length(), 32);
        }
    }

    #[test]
    fn moduli_are_sorted_distinct_and_sized() {
        let mut rng = init_testing();
        let moduli = generate_moduli(&[32, 64], 8, &mut rng).unwrap();
        assert_eq!(moduli.len(), 8);
        for pair in moduli.windows(2) {
            assert!(pair[0] < pair[1]);
        }
        for p in &moduli {
            assert!(p.bit_length() == 32 || p.bit_length() == 64);
        }
    }

    #[test]
    fn rejects_bad_parameters() {
        let mut rng = init_testing();
        assert!(gen_prime(0, &mut rng).is_err());
        assert!(gen_prime(33, &mut rng).is_err());
        assert!(generate_moduli(&[], 4, &mut rng).is_err());
        assert!(generate_moduli(&[64], 0, &mut rng).is_err());
    }
}
