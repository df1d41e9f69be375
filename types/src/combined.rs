use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};

use crate::{
    bits::{BitList, BitVector},
    containers::{
        AltairSignedBeaconBlock, AttestationData, BellatrixSignedBeaconBlock,
        CapellaSignedBeaconBlock, DenebSignedBeaconBlock, ElectraAttestation,
        ElectraSignedBeaconBlock, ExecutionPayload, FuluSignedBeaconBlock, Phase0Attestation,
        Phase0SignedBeaconBlock, SyncAggregate, Withdrawal,
    },
    nonstandard::Phase,
    primitives::{CommitteeIndex, ExecutionBlockNumber, Slot, ValidatorIndex, H256},
};

/// A signed block of any supported phase.
///
/// Deserializes from the versioned envelope used by the Beacon API
/// (`{"version": "deneb", "data": {...}}`). An unknown version fails deserialization.
#[derive(Clone, PartialEq, Eq, Debug, Deserialize, Serialize)]
#[serde(tag = "version", content = "data", rename_all = "lowercase")]
pub enum SignedBeaconBlock {
    Phase0(Phase0SignedBeaconBlock),
    Altair(AltairSignedBeaconBlock),
    Bellatrix(BellatrixSignedBeaconBlock),
    Capella(CapellaSignedBeaconBlock),
    Deneb(DenebSignedBeaconBlock),
    Electra(ElectraSignedBeaconBlock),
    Fulu(FuluSignedBeaconBlock),
}

impl SignedBeaconBlock {
    #[must_use]
    pub const fn phase(&self) -> Phase {
        match self {
            Self::Phase0(_) => Phase::Phase0,
            Self::Altair(_) => Phase::Altair,
            Self::Bellatrix(_) => Phase::Bellatrix,
            Self::Capella(_) => Phase::Capella,
            Self::Deneb(_) => Phase::Deneb,
            Self::Electra(_) => Phase::Electra,
            Self::Fulu(_) => Phase::Fulu,
        }
    }

    #[must_use]
    pub const fn slot(&self) -> Slot {
        match self {
            Self::Phase0(block) => block.message.slot,
            Self::Altair(block) => block.message.slot,
            Self::Bellatrix(block) | Self::Capella(block) => block.message.slot,
            Self::Deneb(block) => block.message.slot,
            Self::Electra(block) | Self::Fulu(block) => block.message.slot,
        }
    }

    #[must_use]
    pub const fn proposer_index(&self) -> ValidatorIndex {
        match self {
            Self::Phase0(block) => block.message.proposer_index,
            Self::Altair(block) => block.message.proposer_index,
            Self::Bellatrix(block) | Self::Capella(block) => block.message.proposer_index,
            Self::Deneb(block) => block.message.proposer_index,
            Self::Electra(block) | Self::Fulu(block) => block.message.proposer_index,
        }
    }

    #[must_use]
    pub const fn parent_root(&self) -> H256 {
        match self {
            Self::Phase0(block) => block.message.parent_root,
            Self::Altair(block) => block.message.parent_root,
            Self::Bellatrix(block) | Self::Capella(block) => block.message.parent_root,
            Self::Deneb(block) => block.message.parent_root,
            Self::Electra(block) | Self::Fulu(block) => block.message.parent_root,
        }
    }

    pub fn attestations(&self) -> impl Iterator<Item = AttestationRef<'_>> {
        let (phase0, electra): (&[Phase0Attestation], &[ElectraAttestation]) = match self {
            Self::Phase0(block) => (&block.message.body.attestations, &[]),
            Self::Altair(block) => (&block.message.body.attestations, &[]),
            Self::Bellatrix(block) | Self::Capella(block) => {
                (&block.message.body.attestations, &[])
            }
            Self::Deneb(block) => (&block.message.body.attestations, &[]),
            Self::Electra(block) | Self::Fulu(block) => (&[], &block.message.body.attestations),
        };

        phase0
            .iter()
            .map(AttestationRef::Phase0)
            .chain(electra.iter().map(AttestationRef::Electra))
    }

    #[must_use]
    pub const fn sync_aggregate(&self) -> Option<&SyncAggregate> {
        match self {
            Self::Phase0(_) => None,
            Self::Altair(block) => Some(&block.message.body.sync_aggregate),
            Self::Bellatrix(block) | Self::Capella(block) => {
                Some(&block.message.body.sync_aggregate)
            }
            Self::Deneb(block) => Some(&block.message.body.sync_aggregate),
            Self::Electra(block) | Self::Fulu(block) => Some(&block.message.body.sync_aggregate),
        }
    }

    #[must_use]
    pub const fn execution_payload(&self) -> Option<&ExecutionPayload> {
        match self {
            Self::Phase0(_) | Self::Altair(_) => None,
            Self::Bellatrix(block) | Self::Capella(block) => {
                Some(&block.message.body.execution_payload)
            }
            Self::Deneb(block) => Some(&block.message.body.execution_payload),
            Self::Electra(block) | Self::Fulu(block) => Some(&block.message.body.execution_payload),
        }
    }

    #[must_use]
    pub fn execution_block_number(&self) -> Option<ExecutionBlockNumber> {
        self.execution_payload()
            .map(|payload| payload.block_number)
    }

    #[must_use]
    pub fn withdrawals(&self) -> &[Withdrawal] {
        self.execution_payload()
            .map(|payload| payload.withdrawals.as_slice())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn blob_kzg_commitment_count(&self) -> usize {
        match self {
            Self::Phase0(_) | Self::Altair(_) | Self::Bellatrix(_) | Self::Capella(_) => 0,
            Self::Deneb(block) => block.message.body.blob_kzg_commitments.len(),
            Self::Electra(block) | Self::Fulu(block) => {
                block.message.body.blob_kzg_commitments.len()
            }
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AttestationRef<'block> {
    Phase0(&'block Phase0Attestation),
    Electra(&'block ElectraAttestation),
}

impl<'block> AttestationRef<'block> {
    #[must_use]
    pub const fn data(self) -> &'block AttestationData {
        match self {
            Self::Phase0(attestation) => &attestation.data,
            Self::Electra(attestation) => &attestation.data,
        }
    }

    #[must_use]
    pub const fn aggregation_bits(self) -> &'block BitList {
        match self {
            Self::Phase0(attestation) => &attestation.aggregation_bits,
            Self::Electra(attestation) => &attestation.aggregation_bits,
        }
    }

    #[must_use]
    pub const fn committee_bits(self) -> Option<&'block BitVector> {
        match self {
            Self::Phase0(_) => None,
            Self::Electra(attestation) => Some(&attestation.committee_bits),
        }
    }

    /// Committees whose members are covered by the aggregation bits, in ascending order.
    #[must_use]
    pub fn committee_indices(self) -> Vec<CommitteeIndex> {
        match self {
            Self::Phase0(attestation) => vec![attestation.data.index],
            Self::Electra(attestation) => attestation
                .committee_bits
                .iter_ones()
                .map(|index| index as CommitteeIndex)
                .collect(),
        }
    }

    /// A digest identifying the attestation by its full contents.
    ///
    /// Two attestations have the same identity root if and only if they carry the same data,
    /// bits and signature. This is what makes an attestation re-included in a later block
    /// recognizable as the same one.
    #[must_use]
    pub fn identity_root(self) -> H256 {
        let data = self.data();
        let mut hasher = Sha256::new();

        hasher.update(self.aggregation_bits().to_ssz_bytes());
        hasher.update(data.slot.to_le_bytes());
        hasher.update(data.index.to_le_bytes());
        hasher.update(data.beacon_block_root);
        hasher.update(data.source.epoch.to_le_bytes());
        hasher.update(data.source.root);
        hasher.update(data.target.epoch.to_le_bytes());
        hasher.update(data.target.root);

        match self {
            Self::Phase0(attestation) => hasher.update(attestation.signature),
            Self::Electra(attestation) => {
                hasher.update(attestation.signature);
                hasher.update(attestation.committee_bits.to_ssz_bytes());
            }
        }

        H256(hasher.finalize().into())
    }
}
