use std::collections::{hash_map::Entry, HashMap, HashSet};

use serde::Serialize;
use types::primitives::{Slot, ValidatorIndex, H256};

/// Where an attestation was first seen: the slot of the including block and its position there.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub struct AttestationOrigin {
    pub block: Slot,
    pub index: usize,
}

/// Keeps a vote from being counted twice when it is aggregated into more than one block.
///
/// Whole attestations are recognized by their identity root.
/// Individual votes are recognized by validator and attestation slot, which also catches
/// overlapping aggregates that are not identical.
#[derive(Default)]
pub struct DuplicateTracker {
    origins: HashMap<H256, AttestationOrigin>,
    credited: HashSet<(Slot, ValidatorIndex)>,
}

impl DuplicateTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the earlier origin if the attestation has been recorded before.
    /// The first origin recorded for a root is kept.
    pub fn record_attestation(
        &mut self,
        root: H256,
        origin: AttestationOrigin,
    ) -> Option<AttestationOrigin> {
        match self.origins.entry(root) {
            Entry::Occupied(occupied) => Some(*occupied.get()),
            Entry::Vacant(vacant) => {
                vacant.insert(origin);
                None
            }
        }
    }

    /// Returns `true` if this is the first vote credited to `validator_index` for `slot`.
    pub fn credit(&mut self, slot: Slot, validator_index: ValidatorIndex) -> bool {
        self.credited.insert((slot, validator_index))
    }
}
