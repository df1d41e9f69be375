//! The parts of consensus containers that attestation and sync analysis reads.
//!
//! Fields the analysis has no use for (slashings, deposits, most of the execution payload)
//! are not modeled. Unknown fields are ignored on deserialization.

use serde::{Deserialize, Serialize};

use crate::{
    bits::{BitList, BitVector},
    primitives::{
        CommitteeIndex, Epoch, ExecutionBlockNumber, Gwei, KzgCommitment, SignatureBytes, Slot,
        ValidatorIndex, Version, H160, H256,
    },
};

#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Debug, Deserialize, Serialize,
)]
pub struct Checkpoint {
    #[serde(with = "serde_utils::string_or_native")]
    pub epoch: Epoch,
    pub root: H256,
}

#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Debug, Deserialize, Serialize,
)]
pub struct AttestationData {
    #[serde(with = "serde_utils::string_or_native")]
    pub slot: Slot,
    #[serde(with = "serde_utils::string_or_native")]
    pub index: CommitteeIndex,
    pub beacon_block_root: H256,
    pub source: Checkpoint,
    pub target: Checkpoint,
}

#[derive(Clone, Copy, PartialEq, Eq, Default, Debug, Deserialize, Serialize)]
pub struct Fork {
    pub previous_version: Version,
    pub current_version: Version,
    #[serde(with = "serde_utils::string_or_native")]
    pub epoch: Epoch,
}

#[derive(Clone, PartialEq, Eq, Default, Debug, Deserialize, Serialize)]
pub struct Phase0Attestation {
    pub aggregation_bits: BitList,
    pub data: AttestationData,
    pub signature: SignatureBytes,
}

/// From Electra onward an attestation may aggregate votes from several committees of one slot.
/// `data.index` is always zero and the committees are named by `committee_bits`.
#[derive(Clone, PartialEq, Eq, Default, Debug, Deserialize, Serialize)]
pub struct ElectraAttestation {
    pub aggregation_bits: BitList,
    pub data: AttestationData,
    pub signature: SignatureBytes,
    pub committee_bits: BitVector,
}

#[derive(Clone, PartialEq, Eq, Default, Debug, Deserialize, Serialize)]
pub struct SyncAggregate {
    pub sync_committee_bits: BitVector,
    pub sync_committee_signature: SignatureBytes,
}

#[derive(Clone, Copy, PartialEq, Eq, Default, Debug, Deserialize, Serialize)]
pub struct Withdrawal {
    #[serde(with = "serde_utils::string_or_native")]
    pub index: u64,
    #[serde(with = "serde_utils::string_or_native")]
    pub validator_index: ValidatorIndex,
    pub address: H160,
    #[serde(with = "serde_utils::string_or_native")]
    pub amount: Gwei,
}

#[derive(Clone, PartialEq, Eq, Default, Debug, Deserialize, Serialize)]
pub struct ExecutionPayload {
    #[serde(with = "serde_utils::string_or_native")]
    pub block_number: ExecutionBlockNumber,
    pub block_hash: H256,
    // Absent before Capella.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub withdrawals: Vec<Withdrawal>,
}

#[derive(Clone, PartialEq, Eq, Default, Debug, Deserialize, Serialize)]
pub struct BeaconBlock<B> {
    #[serde(with = "serde_utils::string_or_native")]
    pub slot: Slot,
    #[serde(with = "serde_utils::string_or_native")]
    pub proposer_index: ValidatorIndex,
    pub parent_root: H256,
    pub state_root: H256,
    pub body: B,
}

#[derive(Clone, PartialEq, Eq, Default, Debug, Deserialize, Serialize)]
pub struct SignedBeaconBlock<B> {
    pub message: BeaconBlock<B>,
    pub signature: SignatureBytes,
}

#[derive(Clone, PartialEq, Eq, Default, Debug, Deserialize, Serialize)]
pub struct Phase0BeaconBlockBody {
    pub attestations: Vec<Phase0Attestation>,
}

#[derive(Clone, PartialEq, Eq, Default, Debug, Deserialize, Serialize)]
pub struct AltairBeaconBlockBody {
    pub attestations: Vec<Phase0Attestation>,
    pub sync_aggregate: SyncAggregate,
}

/// Shared by Bellatrix and Capella. Capella only adds withdrawals to the payload.
#[derive(Clone, PartialEq, Eq, Default, Debug, Deserialize, Serialize)]
pub struct BellatrixBeaconBlockBody {
    pub attestations: Vec<Phase0Attestation>,
    pub sync_aggregate: SyncAggregate,
    pub execution_payload: ExecutionPayload,
}

#[derive(Clone, PartialEq, Eq, Default, Debug, Deserialize, Serialize)]
pub struct DenebBeaconBlockBody {
    pub attestations: Vec<Phase0Attestation>,
    pub sync_aggregate: SyncAggregate,
    pub execution_payload: ExecutionPayload,
    pub blob_kzg_commitments: Vec<KzgCommitment>,
}

/// Shared by Electra and Fulu.
#[derive(Clone, PartialEq, Eq, Default, Debug, Deserialize, Serialize)]
pub struct ElectraBeaconBlockBody {
    pub attestations: Vec<ElectraAttestation>,
    pub sync_aggregate: SyncAggregate,
    pub execution_payload: ExecutionPayload,
    pub blob_kzg_commitments: Vec<KzgCommitment>,
}

pub type Phase0SignedBeaconBlock = SignedBeaconBlock<Phase0BeaconBlockBody>;
pub type AltairSignedBeaconBlock = SignedBeaconBlock<AltairBeaconBlockBody>;
pub type BellatrixSignedBeaconBlock = SignedBeaconBlock<BellatrixBeaconBlockBody>;
pub type CapellaSignedBeaconBlock = SignedBeaconBlock<BellatrixBeaconBlockBody>;
pub type DenebSignedBeaconBlock = SignedBeaconBlock<DenebBeaconBlockBody>;
pub type ElectraSignedBeaconBlock = SignedBeaconBlock<ElectraBeaconBlockBody>;
pub type FuluSignedBeaconBlock = SignedBeaconBlock<ElectraBeaconBlockBody>;
