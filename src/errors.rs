// Copyright (c) 2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Error types for the crate.
//!
//! Errors are split by fault domain: [`CallerError`] covers mistakes made by
//! the calling application (bad configuration, malformed bytes, protocol
//! misuse) and is always recoverable by fixing the input; [`InternalError`]
//! covers broken invariants inside the library, which indicate a bug rather
//! than a usage problem.

use thiserror::Error;

/// Results of library operations. Errors the caller can act on are wrapped
/// in [`InternalError::CallingApplicationMistake`].
pub type Result<T> = std::result::Result<T, InternalError>;

/// Errors caused by incorrect use of the library.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CallerError {
    /// The configured signer set cannot reach the required thresholds: the
    /// combined weight of all moduli is too small for the chosen adversary
    /// bound. Fatal for this configuration; pick heavier weights or more
    /// signers.
    #[error("combined moduli weight cannot satisfy the sharing thresholds")]
    InsufficientWeight,

    /// The dealer's secret fell outside its admissible range. Fatal; signals
    /// a broken parameter choice.
    #[error("master secret exceeds its reconstruction bound")]
    SecretOutOfRange,

    /// Two signers were assigned the same modulus, or deduplication reduced
    /// the generated moduli below the requested count.
    #[error("moduli are not pairwise distinct")]
    DuplicateModulus,

    /// A signer was asked to sign for a session whose commitment batch does
    /// not include it.
    #[error("signer's modulus does not appear in the commitment batch")]
    NotInBatch,

    /// Aggregation was invoked with no partial signatures.
    #[error("cannot aggregate an empty set of partial signatures")]
    NoSignatures,

    /// Bytes failed to decode as a G1 group element.
    #[error("invalid compressed G1 point encoding")]
    InvalidPoint,

    /// Bytes failed to decode as a big integer.
    #[error("invalid big integer encoding")]
    InvalidBigInt,

    /// A signer was asked to sign without a live nonce pair, either because
    /// it never committed for this session or because its nonces were
    /// already consumed.
    #[error("no fresh nonce pair; publish a commitment before signing")]
    NonceNotCommitted,

    /// The session already produced its aggregate signature; start a new
    /// commitment round instead.
    #[error("signing session already terminated")]
    SessionTerminated,

    /// A message arrived in a session phase that cannot accept it.
    #[error("message not valid in the session's current state")]
    OutOfOrderMessage,

    /// Input failed basic validation.
    #[error("invalid input to a library call")]
    BadInput,
}

/// Errors that indicate a bug in the library or a broken internal
/// invariant. With the exception of
/// [`CallingApplicationMistake`](InternalError::CallingApplicationMistake),
/// these should never be observed in correct usage.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum InternalError {
    /// An invariant the library relies on did not hold.
    #[error("internal invariant failed")]
    InternalInvariantFailed,

    /// The calling application made a mistake; see the wrapped error.
    #[error("calling application mistake: {0}")]
    CallingApplicationMistake(#[from] CallerError),
}
