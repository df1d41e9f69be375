use serde::Serialize;
use types::{
    containers::AttestationData,
    primitives::{CommitteeIndex, Gwei, Slot, ValidatorIndex, H256},
};

use crate::classifier::Classification;

#[expect(clippy::struct_excessive_bools)]
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug, Serialize)]
pub struct VoteFlags {
    pub head_correct: bool,
    pub head_timely: bool,
    pub source_timely: bool,
    pub target_correct: bool,
    pub target_timely: bool,
}

impl VoteFlags {
    /// Flags never go from set to unset. A later, better attestation can only add to them.
    pub fn merge(&mut self, other: Self) {
        self.head_correct |= other.head_correct;
        self.head_timely |= other.head_timely;
        self.source_timely |= other.source_timely;
        self.target_correct |= other.target_correct;
        self.target_timely |= other.target_timely;
    }
}

/// What is known about one validator's attestation duty in an epoch.
///
/// The vote fields come from the first attestation that credited the validator.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub struct ValidatorParticipation {
    pub validator_index: ValidatorIndex,
    pub effective_balance: Gwei,
    pub slot: Slot,
    pub committee_index: CommitteeIndex,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head_vote: Option<H256>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head: Option<H256>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_vote: Option<H256>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<H256>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inclusion_slot: Option<Slot>,
    #[serde(flatten)]
    pub flags: VoteFlags,
}

impl ValidatorParticipation {
    #[must_use]
    pub const fn new(
        validator_index: ValidatorIndex,
        effective_balance: Gwei,
        slot: Slot,
        committee_index: CommitteeIndex,
    ) -> Self {
        Self {
            validator_index,
            effective_balance,
            slot,
            committee_index,
            head_vote: None,
            head: None,
            target_vote: None,
            target: None,
            inclusion_slot: None,
            flags: VoteFlags {
                head_correct: false,
                head_timely: false,
                source_timely: false,
                target_correct: false,
                target_timely: false,
            },
        }
    }

    #[must_use]
    pub const fn participated(&self) -> bool {
        self.inclusion_slot.is_some()
    }

    pub fn record(
        &mut self,
        data: &AttestationData,
        classification: &Classification,
        inclusion_slot: Slot,
    ) {
        if self.inclusion_slot.is_none() {
            self.head_vote = Some(data.beacon_block_root);
            self.head = Some(classification.head);
            self.target_vote = Some(data.target.root);
            self.target = Some(classification.target);
            self.inclusion_slot = Some(inclusion_slot);
        }

        self.flags.merge(classification.flags);
    }
}
