pub use crate::{
    block_analysis::{AttestationAnalysis, BlockAnalysis, BlockAnalyzer, SyncCommitteeAnalysis},
    chain::{AnalysisOptions, ChainContext, DEFAULT_MAX_WALK_STEPS},
    classifier::{AttestationClassifier, AttestingMember, Classification},
    duplicates::{AttestationOrigin, DuplicateTracker},
    epoch_summary::{EpochProposal, EpochSummary, EpochSummaryAnalysis},
    headers::{HeaderCache, WalkError},
    participation::{ValidatorParticipation, VoteFlags},
    sync_committees::SyncCommitteeMisses,
    validator_summary::{
        MissedAttestation, SlotAttestations, ValidatorFault, ValidatorSummary,
        ValidatorSummaryAnalysis,
    },
    weights::RewardWeights,
};

mod block_analysis;
mod blocks;
mod chain;
mod classifier;
mod committees;
mod duplicates;
mod epoch_summary;
mod headers;
mod participation;
mod sync_committees;
mod validator_summary;
mod weights;

#[cfg(test)]
mod fake;
