use std::{
    collections::{BTreeMap, HashMap},
    rc::Rc,
};

use anyhow::{Context as _, Result};
use beacon_api::{containers::BeaconCommittee, BeaconNode, StateId};
use chain_time::ChainTime;
use log::debug;
use types::primitives::{CommitteeIndex, Epoch, Slot, ValidatorIndex};

/// Committee assignments for one epoch, keyed by slot and committee index.
#[derive(Default, Debug)]
pub struct EpochCommittees {
    committees: BTreeMap<(Slot, CommitteeIndex), Vec<ValidatorIndex>>,
}

impl EpochCommittees {
    #[must_use]
    pub fn get(&self, slot: Slot, committee_index: CommitteeIndex) -> Option<&[ValidatorIndex]> {
        self.committees
            .get(&(slot, committee_index))
            .map(Vec::as_slice)
    }

    /// Every assignment in the epoch as `(slot, committee index, validator index)`.
    pub fn assignments(
        &self,
    ) -> impl Iterator<Item = (Slot, CommitteeIndex, ValidatorIndex)> + '_ {
        self.committees
            .iter()
            .flat_map(|((slot, committee_index), validators)| {
                validators
                    .iter()
                    .map(move |validator_index| (*slot, *committee_index, *validator_index))
            })
    }
}

impl FromIterator<BeaconCommittee> for EpochCommittees {
    fn from_iter<I: IntoIterator<Item = BeaconCommittee>>(committees: I) -> Self {
        let committees = committees
            .into_iter()
            .map(|committee| ((committee.slot, committee.index), committee.validators))
            .collect();

        Self { committees }
    }
}

/// Committees fetched per epoch, once per run.
pub struct CommitteeCache<'node, N: ?Sized> {
    node: &'node N,
    epochs: HashMap<Epoch, Rc<EpochCommittees>>,
}

impl<'node, N: BeaconNode + ?Sized> CommitteeCache<'node, N> {
    #[must_use]
    pub fn new(node: &'node N) -> Self {
        Self {
            node,
            epochs: HashMap::new(),
        }
    }

    pub fn for_epoch(&mut self, chain_time: &ChainTime, epoch: Epoch) -> Result<Rc<EpochCommittees>> {
        if let Some(committees) = self.epochs.get(&epoch) {
            return Ok(Rc::clone(committees));
        }

        let first_slot = chain_time.first_slot_of_epoch(epoch);

        let committees = self
            .node
            .beacon_committees(StateId::Slot(first_slot), Some(epoch))
            .with_context(|| format!("failed to obtain committees for slot {first_slot}"))?
            .into_iter()
            .collect::<EpochCommittees>();

        debug!(
            "obtained {} committees for epoch {epoch}",
            committees.committees.len(),
        );

        let committees = Rc::new(committees);
        self.epochs.insert(epoch, Rc::clone(&committees));

        Ok(committees)
    }
}
