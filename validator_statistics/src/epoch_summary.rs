use std::collections::{BTreeMap, BTreeSet};

use anyhow::{bail, Context as _, Result};
use beacon_api::{containers::ValidatorInfo, require, BeaconNode, Capability, StateId};
use enumset::EnumSet;
use log::{debug, info};
use serde::Serialize;
use types::{
    nonstandard::ValidatorId,
    primitives::{Epoch, Gwei, Slot, ValidatorIndex},
};

use crate::{
    blocks::BlockCache,
    chain::{AnalysisOptions, ChainContext},
    classifier::{attesting_members, AttestationClassifier},
    committees::CommitteeCache,
    duplicates::{AttestationOrigin, DuplicateTracker},
    headers::HeaderCache,
    participation::ValidatorParticipation,
    sync_committees::{SyncCommitteeMisses, SyncCommitteeTally},
};

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub struct EpochProposal {
    pub slot: Slot,
    pub validator_index: ValidatorIndex,
    pub block: bool,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
pub struct EpochSummary {
    pub epoch: Epoch,
    pub first_slot: Slot,
    pub last_slot: Slot,
    pub blocks: usize,
    pub proposals: Vec<EpochProposal>,
    pub sync_committee_validators: usize,
    pub sync_committee: Vec<SyncCommitteeMisses>,
    pub active_validators: usize,
    pub active_balance: Gwei,
    pub participating_validators: usize,
    pub participating_balance: Gwei,
    pub head_correct_validators: usize,
    pub head_correct_balance: Gwei,
    pub head_timely_validators: usize,
    pub head_timely_balance: Gwei,
    pub source_timely_validators: usize,
    pub source_timely_balance: Gwei,
    pub target_correct_validators: usize,
    pub target_correct_balance: Gwei,
    pub target_timely_validators: usize,
    pub target_timely_balance: Gwei,
    pub nonparticipating_validators: Vec<ValidatorParticipation>,
    pub nonheadcorrect_validators: Vec<ValidatorParticipation>,
    pub nonheadtimely_validators: Vec<ValidatorParticipation>,
    pub nonsourcetimely_validators: Vec<ValidatorParticipation>,
    pub nontargetcorrect_validators: Vec<ValidatorParticipation>,
    pub nontargettimely_validators: Vec<ValidatorParticipation>,
    pub blobs: usize,
}

/// Validators the summary is restricted to. `None` means every validator.
struct Selection {
    indices: Option<BTreeSet<ValidatorIndex>>,
}

impl Selection {
    fn contains(&self, validator_index: ValidatorIndex) -> bool {
        self.indices
            .as_ref()
            .is_none_or(|indices| indices.contains(&validator_index))
    }

    fn ids(&self) -> Vec<ValidatorId> {
        self.indices
            .iter()
            .flatten()
            .copied()
            .map(ValidatorId::Index)
            .collect()
    }
}

/// Proposals, attestations and sync committee participation over one epoch.
pub struct EpochSummaryAnalysis<'run, N: ?Sized> {
    node: &'run N,
    context: &'run ChainContext,
    options: AnalysisOptions,
}

impl<'run, N: BeaconNode + ?Sized> EpochSummaryAnalysis<'run, N> {
    pub fn new(node: &'run N, context: &'run ChainContext, options: AnalysisOptions) -> Result<Self> {
        require(node, Self::required_capabilities())?;

        Ok(Self {
            node,
            context,
            options,
        })
    }

    fn required_capabilities() -> EnumSet<Capability> {
        Capability::ProposerDuties
            | Capability::SignedBeaconBlocks
            | Capability::SyncCommittees
            | Capability::Validators
            | Capability::BeaconCommittees
            | Capability::BeaconBlockHeaders
    }

    /// Summarizes `epoch` for the validators in `validator_ids`, or for all validators if empty.
    ///
    /// Blocks after `current_slot` are not looked for.
    pub fn run(
        &self,
        epoch: Epoch,
        validator_ids: &[ValidatorId],
        current_slot: Slot,
    ) -> Result<EpochSummary> {
        let chain_time = &self.context.chain_time;
        let first_slot = chain_time.first_slot_of_epoch(epoch);
        let last_slot = chain_time.last_slot_of_epoch(epoch);

        info!("summarizing epoch {epoch} (slots {first_slot}..={last_slot})");

        let selection = self.selection(validator_ids)?;
        let mut blocks = BlockCache::new(self.node);

        let (block_count, proposals) = self.proposals(&mut blocks, epoch, &selection)?;

        let validators = self
            .node
            .validators(StateId::Slot(first_slot), &selection.ids())
            .context("failed to obtain validators for epoch")?
            .into_iter()
            .filter(|info| selection.contains(info.index))
            .map(|info| (info.index, info))
            .collect::<BTreeMap<_, _>>();

        let participations =
            self.participations(&mut blocks, epoch, &selection, &validators, current_slot)?;

        let (sync_committee_validators, sync_committee) =
            self.sync_committee(&mut blocks, epoch, &selection)?;

        let mut blobs = 0;

        for proposal in proposals.iter().filter(|proposal| proposal.block) {
            if let Some(block) = blocks
                .at_slot(proposal.slot)
                .with_context(|| format!("failed to obtain block for slot {}", proposal.slot))?
            {
                blobs += block.blob_kzg_commitment_count();
            }
        }

        let mut active = validators
            .values()
            .filter(|info| info.is_active_in(epoch))
            .filter_map(|info| participations.get(&info.index))
            .copied()
            .collect::<Vec<_>>();

        active.sort_by_key(|participation| {
            (
                participation.slot,
                participation.committee_index,
                participation.validator_index,
            )
        });

        let active_validators = validators
            .values()
            .filter(|info| info.is_active_in(epoch))
            .map(ValidatorInfo::effective_balance)
            .collect::<Vec<_>>();

        let (participating_validators, participating_balance) =
            tally(&active, ValidatorParticipation::participated);
        let (head_correct_validators, head_correct_balance) =
            tally(&active, |record| record.flags.head_correct);
        let (head_timely_validators, head_timely_balance) =
            tally(&active, |record| record.flags.head_timely);
        let (source_timely_validators, source_timely_balance) =
            tally(&active, |record| record.flags.source_timely);
        let (target_correct_validators, target_correct_balance) =
            tally(&active, |record| record.flags.target_correct);
        let (target_timely_validators, target_timely_balance) =
            tally(&active, |record| record.flags.target_timely);

        Ok(EpochSummary {
            epoch,
            first_slot,
            last_slot,
            blocks: block_count,
            proposals,
            sync_committee_validators,
            sync_committee,
            active_validators: active_validators.len(),
            active_balance: active_validators.iter().sum(),
            participating_validators,
            participating_balance,
            head_correct_validators,
            head_correct_balance,
            head_timely_validators,
            head_timely_balance,
            source_timely_validators,
            source_timely_balance,
            target_correct_validators,
            target_correct_balance,
            target_timely_validators,
            target_timely_balance,
            nonparticipating_validators: lacking(&active, ValidatorParticipation::participated),
            nonheadcorrect_validators: lacking(&active, |record| record.flags.head_correct),
            nonheadtimely_validators: lacking(&active, |record| record.flags.head_timely),
            nonsourcetimely_validators: lacking(&active, |record| record.flags.source_timely),
            nontargetcorrect_validators: lacking(&active, |record| record.flags.target_correct),
            nontargettimely_validators: lacking(&active, |record| record.flags.target_timely),
            blobs,
        })
    }

    fn selection(&self, validator_ids: &[ValidatorId]) -> Result<Selection> {
        if validator_ids.is_empty() {
            return Ok(Selection { indices: None });
        }

        let indices = self
            .node
            .validators(StateId::Head, validator_ids)
            .context("failed to obtain validators")?
            .into_iter()
            .map(|info| info.index)
            .collect::<BTreeSet<_>>();

        if indices.is_empty() {
            bail!("none of the requested validators are known");
        }

        Ok(Selection {
            indices: Some(indices),
        })
    }

    fn proposals(
        &self,
        blocks: &mut BlockCache<N>,
        epoch: Epoch,
        selection: &Selection,
    ) -> Result<(usize, Vec<EpochProposal>)> {
        let duties = self
            .node
            .proposer_duties(epoch)
            .context("failed to obtain proposer duties")?;

        let mut block_count = 0;
        let mut proposals = vec![];

        for duty in duties {
            let present = blocks
                .at_slot(duty.slot)
                .with_context(|| format!("failed to obtain block for slot {}", duty.slot))?
                .is_some();

            if present {
                block_count += 1;
            }

            if selection.contains(duty.validator_index) {
                proposals.push(EpochProposal {
                    slot: duty.slot,
                    validator_index: duty.validator_index,
                    block: present,
                });
            }
        }

        Ok((block_count, proposals))
    }

    fn participations(
        &self,
        blocks: &mut BlockCache<N>,
        epoch: Epoch,
        selection: &Selection,
        validators: &BTreeMap<ValidatorIndex, ValidatorInfo>,
        current_slot: Slot,
    ) -> Result<BTreeMap<ValidatorIndex, ValidatorParticipation>> {
        let chain_time = &self.context.chain_time;
        let mut committees = CommitteeCache::new(self.node);
        let mut headers =
            HeaderCache::new(self.node, self.options.deadline, self.options.max_walk_steps);
        let mut duplicates = DuplicateTracker::new();
        let classifier = AttestationClassifier::new(chain_time);

        let epoch_committees = committees.for_epoch(chain_time, epoch)?;

        let mut participations = BTreeMap::new();

        for (slot, committee_index, validator_index) in epoch_committees.assignments() {
            if selection.contains(validator_index) {
                let effective_balance = validators
                    .get(&validator_index)
                    .map(ValidatorInfo::effective_balance)
                    .unwrap_or_default();

                participations.entry(validator_index).or_insert_with(|| {
                    ValidatorParticipation::new(
                        validator_index,
                        effective_balance,
                        slot,
                        committee_index,
                    )
                });
            }
        }

        for inclusion_slot in self.context.inclusion_window(epoch, current_slot) {
            self.options.deadline.check()?;

            let Some(block) = blocks
                .at_slot(inclusion_slot)
                .with_context(|| format!("failed to obtain block for slot {inclusion_slot}"))?
            else {
                continue;
            };

            debug!("processing attestations in block at slot {inclusion_slot}");

            for (index, attestation) in block.attestations().enumerate() {
                let data = attestation.data();

                if chain_time.slot_to_epoch(data.slot) != epoch {
                    continue;
                }

                let origin = AttestationOrigin {
                    block: inclusion_slot,
                    index,
                };

                // An identical aggregate included later cannot improve on the first inclusion.
                if duplicates
                    .record_attestation(attestation.identity_root(), origin)
                    .is_some()
                {
                    continue;
                }

                let members = attesting_members(attestation, &epoch_committees)
                    .with_context(|| {
                        format!("failed to decode attestation {index} in block at slot {inclusion_slot}")
                    })?;

                let mut cached = None;

                for member in members {
                    let Some(participation) = participations.get_mut(&member.validator_index)
                    else {
                        continue;
                    };

                    let classification = match cached {
                        Some(classification) => classification,
                        None => {
                            *cached.insert(classifier.classify(&mut headers, data, inclusion_slot)?)
                        }
                    };

                    participation.record(data, &classification, inclusion_slot);
                }
            }
        }

        Ok(participations)
    }

    fn sync_committee(
        &self,
        blocks: &mut BlockCache<N>,
        epoch: Epoch,
        selection: &Selection,
    ) -> Result<(usize, Vec<SyncCommitteeMisses>)> {
        let chain_time = &self.context.chain_time;

        if epoch < chain_time.altair_fork_epoch() {
            return Ok((0, vec![]));
        }

        let first_slot = chain_time.first_slot_of_epoch(epoch);

        let committee = self
            .node
            .sync_committee(StateId::Slot(first_slot), Some(epoch))
            .context("failed to obtain sync committee")?;

        if committee.validators.is_empty() {
            bail!("sync committee for epoch {epoch} is empty");
        }

        let members = committee
            .validators
            .iter()
            .filter(|validator_index| selection.contains(**validator_index))
            .count();

        let mut tally = SyncCommitteeTally::new(&committee.validators);

        for slot in first_slot..=chain_time.last_slot_of_epoch(epoch) {
            let Some(block) = blocks
                .at_slot(slot)
                .with_context(|| format!("failed to obtain block for slot {slot}"))?
            else {
                continue;
            };

            let Some(aggregate) = block.sync_aggregate() else {
                break;
            };

            tally
                .record(slot, aggregate, |validator_index| {
                    selection.contains(validator_index)
                })
                .with_context(|| format!("failed to process sync aggregate for slot {slot}"))?;
        }

        Ok((members, tally.finish()))
    }
}

fn tally(
    records: &[ValidatorParticipation],
    predicate: impl Fn(&ValidatorParticipation) -> bool,
) -> (usize, Gwei) {
    records
        .iter()
        .filter(|record| predicate(record))
        .fold((0, 0), |(count, balance), record| {
            (count + 1, balance + record.effective_balance)
        })
}

fn lacking(
    records: &[ValidatorParticipation],
    predicate: impl Fn(&ValidatorParticipation) -> bool,
) -> Vec<ValidatorParticipation> {
    records
        .iter()
        .filter(|record| !predicate(record))
        .copied()
        .collect()
}
