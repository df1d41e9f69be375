use anyhow::{Context as _, Result};
use beacon_api::BeaconNode;
use chain_time::ChainTime;
use log::trace;
use types::{
    combined::AttestationRef,
    consts::{MAX_TIMELY_HEAD_DELAY, MAX_TIMELY_SOURCE_DELAY, MAX_TIMELY_TARGET_DELAY},
    containers::AttestationData,
    error::DataError,
    nonstandard::Phase,
    primitives::{CommitteeIndex, Slot, ValidatorIndex, H256},
};

use crate::{committees::EpochCommittees, headers::HeaderCache, participation::VoteFlags};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct AttestingMember {
    pub committee_index: CommitteeIndex,
    pub validator_index: ValidatorIndex,
}

/// Validators whose aggregation bits are set in `attestation`.
///
/// The committees an attestation names are laid out back to back in ascending index order.
/// Before Electra that is always the single committee in `data.index`.
pub fn attesting_members(
    attestation: AttestationRef,
    committees: &EpochCommittees,
) -> Result<Vec<AttestingMember>, DataError> {
    let slot = attestation.data().slot;
    let mut members = vec![];

    for committee_index in attestation.committee_indices() {
        let committee = committees
            .get(slot, committee_index)
            .ok_or(DataError::UnknownCommittee {
                slot,
                committee_index,
            })?;

        members.extend(
            committee
                .iter()
                .map(|validator_index| AttestingMember {
                    committee_index,
                    validator_index: *validator_index,
                }),
        );
    }

    attestation
        .aggregation_bits()
        .iter_ones()
        .map(|position| {
            members
                .get(position)
                .copied()
                .ok_or(DataError::AggregationBitOutOfRange {
                    slot,
                    position,
                    size: members.len(),
                })
        })
        .collect()
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Classification {
    /// Root of the canonical block at or before the attestation slot.
    pub head: H256,
    /// Root of the canonical block at or before the first slot of the target epoch.
    pub target: H256,
    pub inclusion_delay: u64,
    /// Phase of the chain at the inclusion slot.
    pub phase: Phase,
    pub flags: VoteFlags,
}

pub struct AttestationClassifier<'chain> {
    chain_time: &'chain ChainTime,
}

impl<'chain> AttestationClassifier<'chain> {
    #[must_use]
    pub const fn new(chain_time: &'chain ChainTime) -> Self {
        Self { chain_time }
    }

    pub fn classify<N: BeaconNode + ?Sized>(
        &self,
        headers: &mut HeaderCache<N>,
        data: &AttestationData,
        inclusion_slot: Slot,
    ) -> Result<Classification> {
        let inclusion_delay = inclusion_slot
            .checked_sub(data.slot)
            .filter(|delay| *delay > 0)
            .ok_or(DataError::InclusionBeforeAttestation {
                attestation_slot: data.slot,
                inclusion_slot,
            })?;

        let head = headers
            .canonical_at_or_before(data.slot)
            .with_context(|| format!("failed to resolve head for slot {}", data.slot))?
            .root;

        let target_slot = self.chain_time.first_slot_of_epoch(data.target.epoch);

        let target = headers
            .canonical_at_or_before(target_slot)
            .with_context(|| format!("failed to resolve target for epoch {}", data.target.epoch))?
            .root;

        let phase = self.chain_time.phase_at_slot(inclusion_slot);

        let flags = vote_flags(
            phase,
            inclusion_delay,
            head == data.beacon_block_root,
            target == data.target.root,
        );

        trace!(
            "attestation for slot {} included at slot {inclusion_slot}: {flags:?}",
            data.slot,
        );

        Ok(Classification {
            head,
            target,
            inclusion_delay,
            phase,
            flags,
        })
    }
}

#[must_use]
pub fn vote_flags(
    phase: Phase,
    inclusion_delay: u64,
    head_correct: bool,
    target_correct: bool,
) -> VoteFlags {
    VoteFlags {
        head_correct,
        head_timely: head_correct && head_in_time(inclusion_delay),
        source_timely: source_in_time(inclusion_delay),
        target_correct,
        target_timely: if phase >= Phase::Deneb {
            true
        } else {
            target_correct && target_in_time(phase, inclusion_delay)
        },
    }
}

#[must_use]
pub const fn head_in_time(inclusion_delay: u64) -> bool {
    inclusion_delay <= MAX_TIMELY_HEAD_DELAY
}

#[must_use]
pub const fn source_in_time(inclusion_delay: u64) -> bool {
    inclusion_delay <= MAX_TIMELY_SOURCE_DELAY
}

/// Deneb removed the inclusion distance limit for target votes.
#[must_use]
pub fn target_in_time(phase: Phase, inclusion_delay: u64) -> bool {
    phase >= Phase::Deneb || inclusion_delay <= MAX_TIMELY_TARGET_DELAY
}
