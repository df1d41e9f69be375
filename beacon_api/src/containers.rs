//! Beacon API response shapes for the endpoints the auditor consumes.

use parse_display::{Display, FromStr};
use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use types::{
    nonstandard::BeaconBlockHeader,
    primitives::{
        CommitteeIndex, Epoch, Gwei, PublicKeyBytes, Slot, UnixSeconds, ValidatorIndex, Version,
        H256,
    },
};

/// The `data` field wrapping most Beacon API responses.
#[derive(Deserialize)]
pub(crate) struct EthResponse<T> {
    pub data: T,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Deserialize)]
pub struct Genesis {
    #[serde(with = "serde_utils::string_or_native")]
    pub genesis_time: UnixSeconds,
    pub genesis_validators_root: H256,
    pub genesis_fork_version: Version,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Deserialize, Serialize)]
pub struct Validator {
    pub pubkey: PublicKeyBytes,
    pub withdrawal_credentials: H256,
    #[serde(with = "serde_utils::string_or_native")]
    pub effective_balance: Gwei,
    pub slashed: bool,
    #[serde(with = "serde_utils::string_or_native")]
    pub activation_eligibility_epoch: Epoch,
    #[serde(with = "serde_utils::string_or_native")]
    pub activation_epoch: Epoch,
    #[serde(with = "serde_utils::string_or_native")]
    pub exit_epoch: Epoch,
    #[serde(with = "serde_utils::string_or_native")]
    pub withdrawable_epoch: Epoch,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Display, FromStr, DeserializeFromStr, SerializeDisplay)]
#[display(style = "snake_case")]
pub enum ValidatorStatus {
    PendingInitialized,
    PendingQueued,
    ActiveOngoing,
    ActiveExiting,
    ActiveSlashed,
    ExitedUnslashed,
    ExitedSlashed,
    WithdrawalPossible,
    WithdrawalDone,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Deserialize, Serialize)]
pub struct ValidatorInfo {
    #[serde(with = "serde_utils::string_or_native")]
    pub index: ValidatorIndex,
    #[serde(with = "serde_utils::string_or_native")]
    pub balance: Gwei,
    pub status: ValidatorStatus,
    pub validator: Validator,
}

impl ValidatorInfo {
    #[must_use]
    pub const fn is_active_in(&self, epoch: Epoch) -> bool {
        self.validator.activation_epoch <= epoch && epoch < self.validator.exit_epoch
    }

    #[must_use]
    pub const fn effective_balance(&self) -> Gwei {
        self.validator.effective_balance
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Deserialize, Serialize)]
pub struct ProposerDuty {
    pub pubkey: PublicKeyBytes,
    #[serde(with = "serde_utils::string_or_native")]
    pub validator_index: ValidatorIndex,
    #[serde(with = "serde_utils::string_or_native")]
    pub slot: Slot,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Deserialize, Serialize)]
pub struct AttesterDuty {
    pub pubkey: PublicKeyBytes,
    #[serde(with = "serde_utils::string_or_native")]
    pub validator_index: ValidatorIndex,
    #[serde(with = "serde_utils::string_or_native")]
    pub committee_index: CommitteeIndex,
    #[serde(with = "serde_utils::string_or_native")]
    pub committee_length: usize,
    #[serde(with = "serde_utils::string_or_native")]
    pub committees_at_slot: u64,
    #[serde(with = "serde_utils::string_or_native")]
    pub validator_committee_index: usize,
    #[serde(with = "serde_utils::string_or_native")]
    pub slot: Slot,
}

#[derive(Clone, PartialEq, Eq, Debug, Deserialize, Serialize)]
pub struct BeaconCommittee {
    #[serde(with = "serde_utils::string_or_native")]
    pub index: CommitteeIndex,
    #[serde(with = "serde_utils::string_or_native")]
    pub slot: Slot,
    #[serde(with = "serde_utils::string_or_native_sequence")]
    pub validators: Vec<ValidatorIndex>,
}

/// Members of a sync committee in bit order of `SyncAggregate::sync_committee_bits`.
#[derive(Clone, PartialEq, Eq, Default, Debug, Deserialize, Serialize)]
pub struct SyncCommittee {
    #[serde(with = "serde_utils::string_or_native_sequence")]
    pub validators: Vec<ValidatorIndex>,
}

#[derive(Deserialize)]
pub(crate) struct BlockHeaderResponse {
    root: H256,
    canonical: bool,
    header: SignedBlockHeader,
}

#[derive(Deserialize)]
struct SignedBlockHeader {
    message: BlockHeaderMessage,
}

#[derive(Deserialize)]
struct BlockHeaderMessage {
    #[serde(with = "serde_utils::string_or_native")]
    slot: Slot,
    parent_root: H256,
}

impl From<BlockHeaderResponse> for BeaconBlockHeader {
    fn from(response: BlockHeaderResponse) -> Self {
        let BlockHeaderResponse {
            root,
            canonical,
            header,
        } = response;

        Self {
            slot: header.message.slot,
            root,
            parent_root: header.message.parent_root,
            canonical,
        }
    }
}
