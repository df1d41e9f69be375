use std::collections::{BTreeMap, HashMap, HashSet};

use anyhow::{bail, Context as _, Result};
use beacon_api::{containers::AttesterDuty, require, BeaconNode, Capability, StateId};
use enumset::EnumSet;
use log::{debug, info};
use serde::Serialize;
use types::{
    nonstandard::ValidatorId,
    primitives::{CommitteeIndex, Epoch, Slot, ValidatorIndex},
};

use crate::{
    blocks::BlockCache,
    chain::{AnalysisOptions, ChainContext},
    classifier::{
        attesting_members, head_in_time, source_in_time, target_in_time, AttestationClassifier,
    },
    committees::CommitteeCache,
    duplicates::DuplicateTracker,
    epoch_summary::EpochProposal,
    headers::HeaderCache,
};

#[derive(Clone, Copy, PartialEq, Eq, Default, Debug, Serialize)]
pub struct SlotAttestations {
    pub slot: Slot,
    pub attestations_expected: usize,
    pub attestations_included: usize,
    pub correct_head: usize,
    pub timely_head: usize,
    pub correct_target: usize,
    pub timely_target: usize,
    pub timely_source: usize,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub struct ValidatorFault {
    pub validator_index: ValidatorIndex,
    pub slot: Slot,
    pub committee_index: CommitteeIndex,
    pub inclusion_slot: Slot,
    pub inclusion_delay: u64,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub struct MissedAttestation {
    pub validator_index: ValidatorIndex,
    pub slot: Slot,
    pub committee_index: CommitteeIndex,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
pub struct ValidatorSummary {
    pub epoch: Epoch,
    pub first_slot: Slot,
    pub last_slot: Slot,
    pub validators: Vec<ValidatorIndex>,
    pub active_validators: usize,
    pub participating_validators: usize,
    pub non_participating_validators: Vec<MissedAttestation>,
    pub incorrect_head_validators: Vec<ValidatorFault>,
    pub untimely_head_validators: Vec<ValidatorFault>,
    pub untimely_source_validators: Vec<ValidatorFault>,
    pub incorrect_target_validators: Vec<ValidatorFault>,
    pub untimely_target_validators: Vec<ValidatorFault>,
    pub slots: Vec<SlotAttestations>,
    pub proposals: Vec<EpochProposal>,
}

/// Attestation and proposal performance of a named set of validators over one epoch.
pub struct ValidatorSummaryAnalysis<'run, N: ?Sized> {
    node: &'run N,
    context: &'run ChainContext,
    options: AnalysisOptions,
}

impl<'run, N: BeaconNode + ?Sized> ValidatorSummaryAnalysis<'run, N> {
    pub fn new(node: &'run N, context: &'run ChainContext, options: AnalysisOptions) -> Result<Self> {
        require(node, Self::required_capabilities())?;

        Ok(Self {
            node,
            context,
            options,
        })
    }

    fn required_capabilities() -> EnumSet<Capability> {
        Capability::Validators
            | Capability::ProposerDuties
            | Capability::AttesterDuties
            | Capability::SignedBeaconBlocks
            | Capability::BeaconBlockHeaders
            | Capability::BeaconCommittees
    }

    pub fn run(
        &self,
        epoch: Epoch,
        validator_ids: &[ValidatorId],
        current_slot: Slot,
    ) -> Result<ValidatorSummary> {
        if validator_ids.is_empty() {
            bail!("no validators supplied");
        }

        let chain_time = &self.context.chain_time;
        let first_slot = chain_time.first_slot_of_epoch(epoch);
        let last_slot = chain_time.last_slot_of_epoch(epoch);

        let mut validators = self
            .node
            .validators(StateId::Slot(first_slot), validator_ids)
            .context("failed to obtain validators for epoch")?;

        if validators.is_empty() {
            bail!("none of the requested validators are known");
        }

        validators.sort_by_key(|info| info.index);

        info!(
            "summarizing {} validators in epoch {epoch}",
            validators.len(),
        );

        let mut blocks = BlockCache::new(self.node);
        let mut proposals = vec![];

        for duty in self
            .node
            .proposer_duties(epoch)
            .context("failed to obtain proposer duties")?
        {
            if validators.iter().any(|info| info.index == duty.validator_index) {
                let block = blocks
                    .at_slot(duty.slot)
                    .with_context(|| format!("failed to obtain block for slot {}", duty.slot))?
                    .is_some();

                proposals.push(EpochProposal {
                    slot: duty.slot,
                    validator_index: duty.validator_index,
                    block,
                });
            }
        }

        let active = validators
            .iter()
            .filter(|info| info.is_active_in(epoch))
            .map(|info| info.index)
            .collect::<Vec<_>>();

        let duties = if active.is_empty() {
            HashMap::new()
        } else {
            self.node
                .attester_duties(epoch, &active)
                .context("failed to obtain attester duties")?
                .into_iter()
                .map(|duty| (duty.validator_index, duty))
                .collect::<HashMap<_, _>>()
        };

        let mut slots = BTreeMap::<Slot, SlotAttestations>::new();

        for duty in duties.values() {
            let slot = slots.entry(duty.slot).or_insert_with(|| SlotAttestations {
                slot: duty.slot,
                ..SlotAttestations::default()
            });

            slot.attestations_expected += 1;
        }

        let mut summary = ValidatorSummary {
            epoch,
            first_slot,
            last_slot,
            validators: validators.iter().map(|info| info.index).collect(),
            active_validators: active.len(),
            participating_validators: 0,
            non_participating_validators: vec![],
            incorrect_head_validators: vec![],
            untimely_head_validators: vec![],
            untimely_source_validators: vec![],
            incorrect_target_validators: vec![],
            untimely_target_validators: vec![],
            slots: vec![],
            proposals,
        };

        let credited = self.scan_inclusions(
            &mut blocks,
            epoch,
            current_slot,
            &duties,
            &mut slots,
            &mut summary,
        )?;

        summary.participating_validators = credited.len();

        summary.non_participating_validators = duties
            .values()
            .filter(|duty| !credited.contains(&duty.validator_index))
            .map(|duty| MissedAttestation {
                validator_index: duty.validator_index,
                slot: duty.slot,
                committee_index: duty.committee_index,
            })
            .collect();

        summary
            .non_participating_validators
            .sort_by_key(|missed| (missed.slot, missed.committee_index, missed.validator_index));

        for faults in [
            &mut summary.incorrect_head_validators,
            &mut summary.untimely_head_validators,
            &mut summary.untimely_source_validators,
            &mut summary.incorrect_target_validators,
            &mut summary.untimely_target_validators,
        ] {
            faults.sort_by_key(|fault| (fault.slot, fault.committee_index, fault.validator_index));
        }

        summary.slots = slots.into_values().collect();

        Ok(summary)
    }

    /// Credits each duty with its first inclusion and records what was wrong with it.
    ///
    /// Returns the validators that were credited.
    fn scan_inclusions(
        &self,
        blocks: &mut BlockCache<N>,
        epoch: Epoch,
        current_slot: Slot,
        duties: &HashMap<ValidatorIndex, AttesterDuty>,
        slots: &mut BTreeMap<Slot, SlotAttestations>,
        summary: &mut ValidatorSummary,
    ) -> Result<HashSet<ValidatorIndex>> {
        let chain_time = &self.context.chain_time;
        let mut committees = CommitteeCache::new(self.node);
        let mut headers =
            HeaderCache::new(self.node, self.options.deadline, self.options.max_walk_steps);
        let mut duplicates = DuplicateTracker::new();
        let classifier = AttestationClassifier::new(chain_time);
        let mut credited = HashSet::new();

        if duties.is_empty() {
            return Ok(credited);
        }

        let epoch_committees = committees.for_epoch(chain_time, epoch)?;

        for inclusion_slot in self.context.inclusion_window(epoch, current_slot) {
            self.options.deadline.check()?;

            let Some(block) = blocks
                .at_slot(inclusion_slot)
                .with_context(|| format!("failed to obtain block for slot {inclusion_slot}"))?
            else {
                continue;
            };

            debug!("looking for duties in block at slot {inclusion_slot}");

            for attestation in block.attestations() {
                let data = attestation.data();

                if chain_time.slot_to_epoch(data.slot) != epoch {
                    continue;
                }

                let mut cached = None;

                for member in attesting_members(attestation, &epoch_committees)? {
                    let Some(duty) = duties.get(&member.validator_index) else {
                        continue;
                    };

                    if duty.slot != data.slot || !duplicates.credit(data.slot, duty.validator_index)
                    {
                        continue;
                    }

                    let classification = match cached {
                        Some(classification) => classification,
                        None => {
                            *cached.insert(classifier.classify(&mut headers, data, inclusion_slot)?)
                        }
                    };

                    let flags = classification.flags;
                    let inclusion_delay = classification.inclusion_delay;

                    credited.insert(duty.validator_index);

                    if let Some(slot) = slots.get_mut(&duty.slot) {
                        slot.attestations_included += 1;
                        slot.correct_head += usize::from(flags.head_correct);
                        slot.timely_head += usize::from(flags.head_timely);
                        slot.correct_target += usize::from(flags.target_correct);
                        slot.timely_target +=
                            usize::from(flags.target_correct && flags.target_timely);
                        slot.timely_source += usize::from(flags.source_timely);
                    }

                    let fault = ValidatorFault {
                        validator_index: duty.validator_index,
                        slot: duty.slot,
                        committee_index: duty.committee_index,
                        inclusion_slot,
                        inclusion_delay,
                    };

                    if !flags.head_correct {
                        summary.incorrect_head_validators.push(fault);
                    }

                    if !head_in_time(inclusion_delay) {
                        summary.untimely_head_validators.push(fault);
                    }

                    if !source_in_time(inclusion_delay) {
                        summary.untimely_source_validators.push(fault);
                    }

                    if !flags.target_correct {
                        summary.incorrect_target_validators.push(fault);
                    }

                    if !target_in_time(classification.phase, inclusion_delay) {
                        summary.untimely_target_validators.push(fault);
                    }
                }
            }
        }

        Ok(credited)
    }
}
