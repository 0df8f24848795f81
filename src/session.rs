// Copyright (c) 2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Coordinator-side session management.
//!
//! The coordinator collects nonce commitments from whichever signers are
//! reachable, freezes them into a canonical roster together with the
//! message, gathers the resulting partial signatures in any order, and
//! aggregates. A session is single-use: once aggregated it is terminal,
//! and a new signing round starts from a fresh commitment collection.
//!
//! The commitment store is shared state that connection handlers
//! write into concurrently, so it is guarded by a mutex and only ever
//! snapshotted under the lock.

use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{error, info};
use unknown_order::BigNumber;
use uuid::Uuid;

use crate::{
    errors::{CallerError, Result},
    messages::{SignPrep, SignResult, SignerCommitment},
    sign::{aggregate, Batch, PartialSignature, Signature},
};

/// A mutex-guarded map from signer id to that signer's commitment for the
/// upcoming session. Admits concurrent writers; the batch snapshot and the
/// modulus product are computed under the lock.
#[derive(Debug, Default)]
pub struct CommitmentStore {
    inner: Mutex<HashMap<Uuid, SignerCommitment>>,
}

impl CommitmentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a signer's commitment. Returns the previous
    /// commitment when the signer re-committed.
    pub fn add(&self, commitment: SignerCommitment) -> Option<SignerCommitment> {
        let mut inner = self.inner.lock().expect("commitment store poisoned");
        inner.insert(commitment.id, commitment)
    }

    /// Look up a signer's commitment.
    pub fn get(&self, id: &Uuid) -> Option<SignerCommitment> {
        let inner = self.inner.lock().expect("commitment store poisoned");
        inner.get(id).cloned()
    }

    /// Drop a signer's commitment (e.g. on disconnect).
    pub fn remove(&self, id: &Uuid) -> Option<SignerCommitment> {
        let mut inner = self.inner.lock().expect("commitment store poisoned");
        inner.remove(id)
    }

    /// Number of stored commitments.
    pub fn len(&self) -> usize {
        let inner = self.inner.lock().expect("commitment store poisoned");
        inner.len()
    }

    /// True when no commitments are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The product of all stored moduli, taken under the lock.
    pub fn moduli_product(&self) -> BigNumber {
        let inner = self.inner.lock().expect("commitment store poisoned");
        inner
            .values()
            .fold(BigNumber::one(), |acc, c| acc * c.modulus())
    }

    /// Snapshot the store into a canonical batch.
    pub fn snapshot_batch(&self) -> Result<Batch> {
        let inner = self.inner.lock().expect("commitment store poisoned");
        Batch::new(inner.values().map(|c| c.batch_item()).collect())
    }
}

/// Where a [`SignSession`] is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// Accepting nonce commitments.
    Collecting,
    /// The roster and message are frozen; waiting for the round to start.
    Prepared,
    /// Partial signatures are arriving.
    Signing,
    /// The aggregate signature has been produced. Terminal.
    Aggregated,
}

/// One signing session, from commitment collection to the aggregate
/// signature.
#[derive(Debug)]
pub struct SignSession {
    store: CommitmentStore,
    message: Option<String>,
    batch: Option<Batch>,
    partials: Vec<PartialSignature>,
    status: SessionStatus,
}

impl SignSession {
    /// Open a session and start collecting commitments.
    pub fn new() -> Self {
        Self {
            store: CommitmentStore::new(),
            message: None,
            batch: None,
            partials: Vec::new(),
            status: SessionStatus::Collecting,
        }
    }

    /// Current lifecycle phase.
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// The commitment store, e.g. for connection handlers to write into.
    pub fn store(&self) -> &CommitmentStore {
        &self.store
    }

    /// The frozen roster, once [`prepare`](Self::prepare) has run.
    pub fn batch(&self) -> Option<&Batch> {
        self.batch.as_ref()
    }

    /// The message being signed, once [`prepare`](Self::prepare) has run.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Record a signer's commitment. Only valid while collecting.
    pub fn register(&mut self, commitment: SignerCommitment) -> Result<()> {
        if self.status != SessionStatus::Collecting {
            error!("commitment arrived after the roster was frozen");
            Err(CallerError::OutOfOrderMessage)?;
        }
        if self.store.add(commitment).is_some() {
            info!("signer replaced its commitment before the roster froze");
        }
        Ok(())
    }

    /// Freeze the roster and fix the message, producing the broadcast that
    /// opens the signing round. The roster must be nonempty; whether it
    /// carries enough weight is session policy (compare against
    /// [`signing_threshold`](crate::keygen::CrtSharing::signing_threshold)).
    pub fn prepare(&mut self, message: impl Into<String>) -> Result<SignPrep> {
        if self.status != SessionStatus::Collecting {
            error!("session roster is already frozen");
            Err(CallerError::OutOfOrderMessage)?;
        }
        let batch = self.store.snapshot_batch()?;
        let message = message.into();
        let prep = SignPrep::new(message.clone(), &batch);
        info!("froze a roster of {} for signing", batch.len());
        self.batch = Some(batch);
        self.message = Some(message);
        self.status = SessionStatus::Prepared;
        Ok(prep)
    }

    /// Ingest one signer's partial signature. Valid (in any order) from
    /// the moment the roster froze until aggregation; results for a
    /// different session commitment are rejected.
    pub fn submit(&mut self, result: SignResult) -> Result<()> {
        match self.status {
            SessionStatus::Prepared => self.status = SessionStatus::Signing,
            SessionStatus::Signing => {}
            _ => {
                error!("partial signature arrived outside the signing phase");
                Err(CallerError::OutOfOrderMessage)?;
            }
        }
        let partial = result.into_partial();
        if let Some(first) = self.partials.first() {
            if first.commitment() != partial.commitment() {
                error!("partial signature reports a different session commitment");
                Err(CallerError::BadInput)?;
            }
        }
        self.partials.push(partial);
        Ok(())
    }

    /// Number of partial signatures received so far.
    pub fn partial_count(&self) -> usize {
        self.partials.len()
    }

    /// Aggregate the collected partial signatures. Terminal: afterwards
    /// the session accepts nothing further.
    pub fn aggregate(&mut self) -> Result<Signature> {
        match self.status {
            SessionStatus::Prepared | SessionStatus::Signing => {}
            SessionStatus::Collecting => {
                error!("aggregation requested before the roster was frozen");
                Err(CallerError::OutOfOrderMessage)?;
            }
            SessionStatus::Aggregated => {
                error!("session already produced its aggregate signature");
                Err(CallerError::SessionTerminated)?;
            }
        }
        let product = self.store.moduli_product();
        let signature = aggregate(&self.partials, &product)?;
        self.status = SessionStatus::Aggregated;
        Ok(signature)
    }
}

impl Default for SignSession {
    fn default() -> Self {
        Self::new()
    }
}
