use hex::FromHexError;
use thiserror::Error;

use crate::primitives::{CommitteeIndex, Slot};

#[derive(Debug, Error)]
#[cfg_attr(test, derive(PartialEq))]
pub enum DataError {
    #[error("aggregation bit {position} lies outside committees of combined size {size} at slot {slot}")]
    AggregationBitOutOfRange {
        slot: Slot,
        position: usize,
        size: usize,
    },
    #[error("attestation for slot {attestation_slot} included at slot {inclusion_slot}")]
    InclusionBeforeAttestation {
        attestation_slot: Slot,
        inclusion_slot: Slot,
    },
    #[error("bitlist is empty or missing its length sentinel")]
    BitlistWithoutSentinel,
    #[error("hex string is missing its 0x prefix")]
    MissingHexPrefix,
    #[error("invalid hex string: {0}")]
    InvalidHex(#[from] FromHexError),
    #[error("sync aggregate has {bits} bits but sync committee has {members} members")]
    SyncCommitteeSizeMismatch { bits: usize, members: usize },
    #[error("committee {committee_index} is not among committees for slot {slot}")]
    UnknownCommittee {
        slot: Slot,
        committee_index: CommitteeIndex,
    },
}
