//! An in-memory [`BeaconNode`] for tests.
//!
//! Every lookup is counted so that caching can be asserted on.
//! The chain it describes has 8 slots per epoch, Altair through Capella active from genesis and
//! Deneb from epoch 10.

use core::cell::Cell;
use std::collections::{BTreeMap, HashMap, HashSet};

use anyhow::Result;
use beacon_api::{
    containers::{
        AttesterDuty, BeaconCommittee, Genesis, ProposerDuty, SyncCommittee, Validator,
        ValidatorInfo, ValidatorStatus,
    },
    ApiError, BeaconNode, BlockId, Capability, StateId,
};
use chain_time::ChainTime;
use enumset::EnumSet;
use types::{
    combined::SignedBeaconBlock,
    config::{SpecMap, SpecValue},
    consts::FAR_FUTURE_EPOCH,
    containers::{
        AltairBeaconBlockBody, AttestationData, BeaconBlock, Checkpoint, DenebBeaconBlockBody,
        ElectraAttestation, ElectraBeaconBlockBody, Fork, Phase0Attestation,
        Phase0BeaconBlockBody, SignedBeaconBlock as Signed, SyncAggregate,
    },
    nonstandard::{BeaconBlockHeader, ValidatorId},
    primitives::{
        CommitteeIndex, Epoch, Gwei, KzgCommitment, PublicKeyBytes, Slot, ValidatorIndex,
        Version, H256,
    },
};

pub const SLOTS_PER_EPOCH: u64 = 8;
pub const EFFECTIVE_BALANCE: Gwei = 32_000_000_000;

const SPEC: &[(&str, &str)] = &[
    ("SECONDS_PER_SLOT", "12"),
    ("SLOTS_PER_EPOCH", "8"),
    ("ALTAIR_FORK_EPOCH", "0"),
    ("BELLATRIX_FORK_EPOCH", "0"),
    ("CAPELLA_FORK_EPOCH", "0"),
    ("DENEB_FORK_EPOCH", "10"),
];

pub struct FakeBeaconNode {
    capabilities: EnumSet<Capability>,
    spec: SpecMap,
    headers: HashMap<Slot, BeaconBlockHeader>,
    blocks: HashMap<Slot, SignedBeaconBlock>,
    block_slots: HashMap<H256, Slot>,
    committees: BTreeMap<Epoch, Vec<BeaconCommittee>>,
    validators: Vec<ValidatorInfo>,
    proposer_duties: Vec<ProposerDuty>,
    sync_committee: SyncCommittee,
    failing_header_slots: HashSet<Slot>,
    failing_block_slots: HashSet<Slot>,
    header_calls: Cell<usize>,
    block_calls: Cell<usize>,
    committee_calls: Cell<usize>,
}

impl Default for FakeBeaconNode {
    fn default() -> Self {
        Self {
            capabilities: EnumSet::all(),
            spec: spec(),
            headers: HashMap::new(),
            blocks: HashMap::new(),
            block_slots: HashMap::new(),
            committees: BTreeMap::new(),
            validators: vec![],
            proposer_duties: vec![],
            sync_committee: SyncCommittee::default(),
            failing_header_slots: HashSet::new(),
            failing_block_slots: HashSet::new(),
            header_calls: Cell::new(0),
            block_calls: Cell::new(0),
            committee_calls: Cell::new(0),
        }
    }
}

impl FakeBeaconNode {
    pub fn without(&mut self, capability: Capability) {
        self.capabilities.remove(capability);
    }

    pub fn set_spec_value(&mut self, key: &str, raw: &str) {
        self.spec.insert(key, SpecValue::classify(key, raw));
    }

    pub fn insert_header(&mut self, slot: Slot, root: H256, canonical: bool) -> BeaconBlockHeader {
        let header = BeaconBlockHeader {
            slot,
            root,
            parent_root: H256::zero(),
            canonical,
        };

        self.headers.insert(slot, header);

        header
    }

    /// Stores `block` along with a canonical header for it.
    pub fn insert_block(&mut self, root: H256, block: SignedBeaconBlock) {
        let slot = block.slot();

        self.headers.insert(
            slot,
            BeaconBlockHeader {
                slot,
                root,
                parent_root: block.parent_root(),
                canonical: true,
            },
        );
        self.block_slots.insert(root, slot);
        self.blocks.insert(slot, block);
    }

    pub fn insert_committee(
        &mut self,
        slot: Slot,
        index: CommitteeIndex,
        validators: Vec<ValidatorIndex>,
    ) {
        self.committees
            .entry(slot / SLOTS_PER_EPOCH)
            .or_default()
            .push(BeaconCommittee {
                index,
                slot,
                validators,
            });
    }

    pub fn insert_validators(&mut self, validators: impl IntoIterator<Item = ValidatorInfo>) {
        self.validators.extend(validators);
    }

    pub fn insert_proposer_duty(&mut self, slot: Slot, validator_index: ValidatorIndex) {
        self.proposer_duties.push(ProposerDuty {
            pubkey: public_key(validator_index),
            validator_index,
            slot,
        });
    }

    pub fn set_sync_committee(&mut self, validators: Vec<ValidatorIndex>) {
        self.sync_committee = SyncCommittee { validators };
    }

    pub fn fail_header_lookups_at(&mut self, slot: Slot) {
        self.failing_header_slots.insert(slot);
    }

    pub fn fail_block_lookups_at(&mut self, slot: Slot) {
        self.failing_block_slots.insert(slot);
    }

    pub fn header_calls(&self) -> usize {
        self.header_calls.get()
    }

    pub fn block_calls(&self) -> usize {
        self.block_calls.get()
    }

    pub fn committee_calls(&self) -> usize {
        self.committee_calls.get()
    }
}

impl BeaconNode for FakeBeaconNode {
    fn capabilities(&self) -> EnumSet<Capability> {
        self.capabilities
    }

    fn genesis(&self) -> Result<Genesis, ApiError> {
        Ok(Genesis {
            genesis_time: 0,
            genesis_validators_root: H256::zero(),
            genesis_fork_version: Version::zero(),
        })
    }

    fn spec(&self) -> Result<SpecMap, ApiError> {
        Ok(self.spec.clone())
    }

    fn fork_schedule(&self) -> Result<Vec<Fork>, ApiError> {
        Ok(vec![])
    }

    fn validators(
        &self,
        _state: StateId,
        ids: &[ValidatorId],
    ) -> Result<Vec<ValidatorInfo>, ApiError> {
        let selected = |info: &ValidatorInfo| {
            ids.is_empty()
                || ids.iter().any(|id| match id {
                    ValidatorId::Index(index) => info.index == *index,
                    ValidatorId::PublicKey(public_key) => info.validator.pubkey == *public_key,
                })
        };

        Ok(self
            .validators
            .iter()
            .copied()
            .filter(selected)
            .collect())
    }

    fn proposer_duties(&self, epoch: Epoch) -> Result<Vec<ProposerDuty>, ApiError> {
        Ok(self
            .proposer_duties
            .iter()
            .copied()
            .filter(|duty| duty.slot / SLOTS_PER_EPOCH == epoch)
            .collect())
    }

    fn attester_duties(
        &self,
        epoch: Epoch,
        indices: &[ValidatorIndex],
    ) -> Result<Vec<AttesterDuty>, ApiError> {
        let committees = self
            .committees
            .get(&epoch)
            .map(Vec::as_slice)
            .unwrap_or_default();

        let duties = committees
            .iter()
            .flat_map(|committee| {
                let committees_at_slot = committees
                    .iter()
                    .filter(|other| other.slot == committee.slot)
                    .count() as u64;

                committee
                    .validators
                    .iter()
                    .enumerate()
                    .filter(|(_, validator_index)| indices.contains(validator_index))
                    .map(move |(position, validator_index)| AttesterDuty {
                        pubkey: public_key(*validator_index),
                        validator_index: *validator_index,
                        committee_index: committee.index,
                        committee_length: committee.validators.len(),
                        committees_at_slot,
                        validator_committee_index: position,
                        slot: committee.slot,
                    })
            })
            .collect();

        Ok(duties)
    }

    fn beacon_committees(
        &self,
        _state: StateId,
        epoch: Option<Epoch>,
    ) -> Result<Vec<BeaconCommittee>, ApiError> {
        self.committee_calls.set(self.committee_calls.get() + 1);

        Ok(self
            .committees
            .get(&epoch.unwrap_or_default())
            .cloned()
            .unwrap_or_default())
    }

    fn sync_committee(
        &self,
        _state: StateId,
        _epoch: Option<Epoch>,
    ) -> Result<SyncCommittee, ApiError> {
        Ok(self.sync_committee.clone())
    }

    fn signed_beacon_block(
        &self,
        block_id: BlockId,
    ) -> Result<Option<SignedBeaconBlock>, ApiError> {
        self.block_calls.set(self.block_calls.get() + 1);

        let slot = match block_id {
            BlockId::Slot(slot) => Some(slot),
            BlockId::Root(root) => self.block_slots.get(&root).copied(),
            BlockId::Head | BlockId::Genesis | BlockId::Finalized => None,
        };

        if slot.is_some_and(|slot| self.failing_block_slots.contains(&slot)) {
            return Err(ApiError::Timeout);
        }

        Ok(slot.and_then(|slot| self.blocks.get(&slot)).cloned())
    }

    fn beacon_block_header(
        &self,
        block_id: BlockId,
    ) -> Result<Option<BeaconBlockHeader>, ApiError> {
        self.header_calls.set(self.header_calls.get() + 1);

        let BlockId::Slot(slot) = block_id else {
            return Ok(None);
        };

        if self.failing_header_slots.contains(&slot) {
            return Err(ApiError::Timeout);
        }

        Ok(self.headers.get(&slot).copied())
    }
}

/// Epoch 1 (slots 8 to 15) with attestations included at slots 10 and 11.
///
/// Validators 0 to 2 attest at slot 8 and validators 3 to 5 at slot 9.
/// Validators 4 and 5 never attest and form the sync committee. Validator 6 activates later.
/// The attestation included at slot 10 is included again at slot 11.
pub fn attested_epoch() -> FakeBeaconNode {
    let target = checkpoint(1, root(8));
    let mut node = FakeBeaconNode::default();

    node.insert_validators((0..6).map(validator));
    node.insert_validators([validator_active_between(6, 5, FAR_FUTURE_EPOCH)]);
    node.insert_committee(8, 0, vec![0, 1, 2]);
    node.insert_committee(9, 0, vec![3, 4, 5]);
    node.set_sync_committee(vec![4, 5]);

    for (slot, proposer) in [(8, 1), (9, 2), (10, 3), (11, 4)] {
        node.insert_proposer_duty(slot, proposer);
    }

    let first = attestation(8, 0, root(8), target, &[true, true, false]);
    let overlapping = attestation(8, 0, root(8), target, &[true, false, true]);
    let next_slot = attestation(9, 0, root(8), target, &[true, false, false]);

    node.insert_block(
        root(8),
        altair_block_with_sync_bits(8, root(7), vec![], &[true, true]),
    );
    node.insert_block(
        root(10),
        altair_block_with_sync_bits(
            10,
            root(8),
            vec![first.clone(), next_slot],
            &[false, true],
        ),
    );
    node.insert_block(
        root(11),
        altair_block_with_sync_bits(
            11,
            root(10),
            vec![overlapping, first],
            &[false, false],
        ),
    );

    node
}

pub fn spec() -> SpecMap {
    SPEC.iter()
        .map(|(key, raw)| (*key, SpecValue::classify(key, raw)))
        .collect()
}

pub fn chain_time() -> Result<ChainTime> {
    ChainTime::new(0, &spec(), &[]).map_err(Into::into)
}

pub fn root(byte: u8) -> H256 {
    H256::repeat_byte(byte)
}

pub fn public_key(validator_index: ValidatorIndex) -> PublicKeyBytes {
    PublicKeyBytes::from_low_u64_be(validator_index + 1)
}

pub fn validator(index: ValidatorIndex) -> ValidatorInfo {
    validator_active_between(index, 0, FAR_FUTURE_EPOCH)
}

pub fn validator_active_between(
    index: ValidatorIndex,
    activation_epoch: Epoch,
    exit_epoch: Epoch,
) -> ValidatorInfo {
    ValidatorInfo {
        index,
        balance: EFFECTIVE_BALANCE,
        status: ValidatorStatus::ActiveOngoing,
        validator: Validator {
            pubkey: public_key(index),
            withdrawal_credentials: H256::zero(),
            effective_balance: EFFECTIVE_BALANCE,
            slashed: false,
            activation_eligibility_epoch: 0,
            activation_epoch,
            exit_epoch,
            withdrawable_epoch: FAR_FUTURE_EPOCH,
        },
    }
}

pub const fn checkpoint(epoch: Epoch, root: H256) -> Checkpoint {
    Checkpoint { epoch, root }
}

pub fn attestation(
    slot: Slot,
    index: CommitteeIndex,
    head: H256,
    target: Checkpoint,
    bits: &[bool],
) -> Phase0Attestation {
    Phase0Attestation {
        aggregation_bits: bits.iter().copied().collect(),
        data: AttestationData {
            slot,
            index,
            beacon_block_root: head,
            source: Checkpoint::default(),
            target,
        },
        ..Phase0Attestation::default()
    }
}

pub fn electra_attestation(
    slot: Slot,
    committee_bits: &[bool],
    head: H256,
    target: Checkpoint,
    bits: &[bool],
) -> ElectraAttestation {
    ElectraAttestation {
        aggregation_bits: bits.iter().copied().collect(),
        data: AttestationData {
            slot,
            index: 0,
            beacon_block_root: head,
            source: Checkpoint::default(),
            target,
        },
        committee_bits: committee_bits.iter().copied().collect(),
        ..ElectraAttestation::default()
    }
}

pub fn phase0_block(
    slot: Slot,
    parent_root: H256,
    attestations: Vec<Phase0Attestation>,
) -> SignedBeaconBlock {
    SignedBeaconBlock::Phase0(Signed {
        message: BeaconBlock {
            slot,
            parent_root,
            body: Phase0BeaconBlockBody { attestations },
            ..BeaconBlock::default()
        },
        ..Signed::default()
    })
}

pub fn altair_block(
    slot: Slot,
    parent_root: H256,
    attestations: Vec<Phase0Attestation>,
) -> SignedBeaconBlock {
    altair_block_with_sync_bits(slot, parent_root, attestations, &[])
}

pub fn altair_block_with_sync_bits(
    slot: Slot,
    parent_root: H256,
    attestations: Vec<Phase0Attestation>,
    sync_bits: &[bool],
) -> SignedBeaconBlock {
    SignedBeaconBlock::Altair(Signed {
        message: BeaconBlock {
            slot,
            parent_root,
            body: AltairBeaconBlockBody {
                attestations,
                sync_aggregate: sync_aggregate(sync_bits),
            },
            ..BeaconBlock::default()
        },
        ..Signed::default()
    })
}

pub fn deneb_block(
    slot: Slot,
    parent_root: H256,
    attestations: Vec<Phase0Attestation>,
    sync_bits: &[bool],
    blobs: usize,
) -> SignedBeaconBlock {
    SignedBeaconBlock::Deneb(Signed {
        message: BeaconBlock {
            slot,
            parent_root,
            body: DenebBeaconBlockBody {
                attestations,
                sync_aggregate: sync_aggregate(sync_bits),
                blob_kzg_commitments: vec![KzgCommitment::zero(); blobs],
                ..DenebBeaconBlockBody::default()
            },
            ..BeaconBlock::default()
        },
        ..Signed::default()
    })
}

pub fn electra_block(
    slot: Slot,
    parent_root: H256,
    attestations: Vec<ElectraAttestation>,
) -> SignedBeaconBlock {
    SignedBeaconBlock::Electra(Signed {
        message: BeaconBlock {
            slot,
            parent_root,
            body: ElectraBeaconBlockBody {
                attestations,
                ..ElectraBeaconBlockBody::default()
            },
            ..BeaconBlock::default()
        },
        ..Signed::default()
    })
}

fn sync_aggregate(bits: &[bool]) -> SyncAggregate {
    SyncAggregate {
        sync_committee_bits: bits.iter().copied().collect(),
        ..SyncAggregate::default()
    }
}
