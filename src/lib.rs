// Copyright (c) 2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Weighted threshold Schnorr signatures over BLS12-381.
//!
//! A group of signers jointly produces a single, constant-size Schnorr
//! signature that verifies under one aggregate public key. Unlike a
//! count-based threshold scheme, the threshold here is *weighted*: a
//! trusted dealer shares the signing key by the Chinese Remainder Theorem,
//! giving each signer the key's residue modulo a distinct prime, and a
//! coalition can sign exactly when the product of its members' moduli is
//! large enough. A signer with a bigger modulus therefore carries
//! proportionally more weight.
//!
//! # Protocol roles
//! - The **dealer** ([`CrtSharing`]) runs once: it draws prime moduli in
//!   configured bit-length tiers, derives the master secret and the two
//!   weight thresholds (recovery and signing), and hands each signer a
//!   [`ShareParams`] packet.
//! - Each **signer** ([`Signer`]) holds its share for its lifetime. Per
//!   session it publishes a fresh pair of nonce commitments, then answers
//!   a frozen roster ([`Batch`]) and message with an unreduced integer
//!   partial signature.
//! - The **coordinator** ([`SignSession`]) collects commitments, freezes
//!   the roster, gathers partials in any order, and [`aggregate`]s them
//!   into a [`Signature`] anyone can verify against the aggregate public
//!   key.
//!
//! The arithmetic core is deliberately transport-agnostic: the payloads in
//! [`messages`] are the only bytes that cross its boundary.
//!
//! # 🔒 Security notes
//! Public keys are assumed to be registered honestly by the trusted dealer;
//! the scheme targets no rogue-key resistance beyond hashing the aggregate
//! key into the challenge's commitment. Nonce pairs are strictly
//! single-use; the library scrubs them (and its big-integer secret
//! scratch) eagerly, but the calling application owns the secure storage
//! of share packets.

#![warn(missing_docs)]

pub mod curve;
pub mod errors;
pub mod keygen;
pub mod messages;
pub mod primes;
pub mod session;
pub mod sign;
mod utils;

pub use curve::{random_scalar, CurvePoint, COMPRESSED_POINT_LEN};
pub use keygen::{
    reconstruct, CrtSharing, DealerConfig, KeySharePrivate, ShareParams, CHALLENGE_BITS,
    STAT_SECURITY,
};
pub use messages::{Envelope, SignPrep, SignResult, SignerCommitment};
pub use primes::{gen_prime, gen_range_prime, generate_moduli, MILLER_RABIN_ROUNDS};
pub use session::{CommitmentStore, SessionStatus, SignSession};
pub use sign::{aggregate, Batch, BatchItem, PartialSignature, Signature, Signer};

// The two numeric domains of the scheme, re-exported so callers don't need
// to name the backing crates.
pub use bls12_381::Scalar;
pub use unknown_order::BigNumber;
