use std::collections::BTreeMap;

use serde::Serialize;
use types::{
    containers::SyncAggregate,
    error::DataError,
    primitives::{Slot, ValidatorIndex},
};

#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
pub struct SyncCommitteeMisses {
    pub validator_index: ValidatorIndex,
    pub missed: usize,
    pub missed_slots: Vec<Slot>,
}

/// Sync committee members that failed to sign, counted over the blocks of an epoch.
///
/// Slots without a block are not fed in, so a missed proposal is never held against the
/// sync committee.
pub struct SyncCommitteeTally<'committee> {
    members: &'committee [ValidatorIndex],
    missed_slots: BTreeMap<ValidatorIndex, Vec<Slot>>,
}

impl<'committee> SyncCommitteeTally<'committee> {
    #[must_use]
    pub const fn new(members: &'committee [ValidatorIndex]) -> Self {
        Self {
            members,
            missed_slots: BTreeMap::new(),
        }
    }

    pub fn record(
        &mut self,
        slot: Slot,
        aggregate: &SyncAggregate,
        selected: impl Fn(ValidatorIndex) -> bool,
    ) -> Result<(), DataError> {
        let bits = &aggregate.sync_committee_bits;

        if bits.len() != self.members.len() {
            return Err(DataError::SyncCommitteeSizeMismatch {
                bits: bits.len(),
                members: self.members.len(),
            });
        }

        for (signed, validator_index) in bits.iter().by_vals().zip(self.members.iter().copied()) {
            if !signed && selected(validator_index) {
                self.missed_slots
                    .entry(validator_index)
                    .or_default()
                    .push(slot);
            }
        }

        Ok(())
    }

    /// Members with at least one miss, most misses first.
    #[must_use]
    pub fn finish(self) -> Vec<SyncCommitteeMisses> {
        let mut misses = self
            .missed_slots
            .into_iter()
            .map(|(validator_index, missed_slots)| SyncCommitteeMisses {
                validator_index,
                missed: missed_slots.len(),
                missed_slots,
            })
            .collect::<Vec<_>>();

        misses.sort_by(|left, right| {
            right
                .missed
                .cmp(&left.missed)
                .then(left.validator_index.cmp(&right.validator_index))
        });

        misses
    }
}
