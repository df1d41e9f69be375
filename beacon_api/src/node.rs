use enumset::{EnumSet, EnumSetType};
use strum::Display;
use types::{
    combined::SignedBeaconBlock,
    config::SpecMap,
    containers::Fork,
    nonstandard::{BeaconBlockHeader, ValidatorId},
    primitives::{Epoch, ValidatorIndex},
};

use crate::{
    containers::{AttesterDuty, BeaconCommittee, Genesis, ProposerDuty, SyncCommittee, ValidatorInfo},
    error::ApiError,
    ids::{BlockId, StateId},
};

#[derive(Debug, Display, EnumSetType)]
#[strum(serialize_all = "snake_case")]
pub enum Capability {
    Genesis,
    Spec,
    ForkSchedule,
    Validators,
    ProposerDuties,
    AttesterDuties,
    BeaconCommittees,
    SyncCommittees,
    SignedBeaconBlocks,
    BeaconBlockHeaders,
}

/// The parts of a beacon node an analysis reads from.
///
/// Implementations advertise what they support through [`BeaconNode::capabilities`].
/// Methods outside that set fail with [`ApiError::Unsupported`].
/// Analyses call [`require`] once when they are constructed so that a missing endpoint is
/// reported before any work is done.
pub trait BeaconNode {
    fn capabilities(&self) -> EnumSet<Capability>;

    fn genesis(&self) -> Result<Genesis, ApiError> {
        Err(ApiError::Unsupported(Capability::Genesis))
    }

    fn spec(&self) -> Result<SpecMap, ApiError> {
        Err(ApiError::Unsupported(Capability::Spec))
    }

    fn fork_schedule(&self) -> Result<Vec<Fork>, ApiError> {
        Err(ApiError::Unsupported(Capability::ForkSchedule))
    }

    /// Validators in `state`. An empty `ids` selects every validator.
    fn validators(
        &self,
        _state: StateId,
        _ids: &[ValidatorId],
    ) -> Result<Vec<ValidatorInfo>, ApiError> {
        Err(ApiError::Unsupported(Capability::Validators))
    }

    fn proposer_duties(&self, _epoch: Epoch) -> Result<Vec<ProposerDuty>, ApiError> {
        Err(ApiError::Unsupported(Capability::ProposerDuties))
    }

    fn attester_duties(
        &self,
        _epoch: Epoch,
        _indices: &[ValidatorIndex],
    ) -> Result<Vec<AttesterDuty>, ApiError> {
        Err(ApiError::Unsupported(Capability::AttesterDuties))
    }

    fn beacon_committees(
        &self,
        _state: StateId,
        _epoch: Option<Epoch>,
    ) -> Result<Vec<BeaconCommittee>, ApiError> {
        Err(ApiError::Unsupported(Capability::BeaconCommittees))
    }

    fn sync_committee(
        &self,
        _state: StateId,
        _epoch: Option<Epoch>,
    ) -> Result<SyncCommittee, ApiError> {
        Err(ApiError::Unsupported(Capability::SyncCommittees))
    }

    /// `Ok(None)` means the node has no block for `block_id`, typically an empty slot.
    fn signed_beacon_block(
        &self,
        _block_id: BlockId,
    ) -> Result<Option<SignedBeaconBlock>, ApiError> {
        Err(ApiError::Unsupported(Capability::SignedBeaconBlocks))
    }

    /// `Ok(None)` means the node has no header for `block_id`, typically an empty slot.
    fn beacon_block_header(
        &self,
        _block_id: BlockId,
    ) -> Result<Option<BeaconBlockHeader>, ApiError> {
        Err(ApiError::Unsupported(Capability::BeaconBlockHeaders))
    }
}

pub fn require<N: BeaconNode + ?Sized>(
    node: &N,
    required: EnumSet<Capability>,
) -> Result<(), ApiError> {
    match (required - node.capabilities()).iter().next() {
        Some(missing) => Err(ApiError::MissingCapability(missing)),
        None => Ok(()),
    }
}
