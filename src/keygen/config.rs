// Copyright (c) 2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

use serde::{Deserialize, Serialize};
use tracing::error;

use crate::errors::{CallerError, Result};

/// Configuration for a dealer setup run: how many signers there are, how
/// many of them may collude, and which modulus bit-length tiers are in play.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DealerConfig {
    participants: usize,
    max_corrupt: usize,
    weight_options: Vec<usize>,
}

impl DealerConfig {
    /// Validate and build a config.
    ///
    /// `max_corrupt` is the adversarial bound `t`: the largest number of
    /// signers whose pooled shares must stay useless. It must satisfy
    /// `0 < t < participants`. `weight_options` is the set of modulus
    /// bit-lengths the dealer draws from; it must be nonempty.
    pub fn new(participants: usize, max_corrupt: usize, weight_options: Vec<usize>) -> Result<Self> {
        if max_corrupt == 0 || max_corrupt >= participants {
            error!(
                "adversarial bound must satisfy 0 < t < n, got t={max_corrupt}, n={participants}"
            );
            Err(CallerError::BadInput)?;
        }
        if weight_options.is_empty() {
            error!("at least one weight tier is required");
            Err(CallerError::BadInput)?;
        }
        Ok(Self {
            participants,
            max_corrupt,
            weight_options,
        })
    }

    /// Number of signers `n`.
    pub fn participants(&self) -> usize {
        self.participants
    }

    /// Adversarial bound `t`.
    pub fn max_corrupt(&self) -> usize {
        self.max_corrupt
    }

    /// Modulus bit-length tiers.
    pub fn weight_options(&self) -> &[usize] {
        &self.weight_options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_degenerate_thresholds() {
        assert!(DealerConfig::new(5, 0, vec![64]).is_err());
        assert!(DealerConfig::new(5, 5, vec![64]).is_err());
        assert!(DealerConfig::new(5, 6, vec![64]).is_err());
        assert!(DealerConfig::new(5, 2, vec![]).is_err());
        assert!(DealerConfig::new(5, 2, vec![64]).is_ok());
    }
}
