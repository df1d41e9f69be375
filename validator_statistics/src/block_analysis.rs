use core::iter;
use std::rc::Rc;

use anyhow::{anyhow, Context as _, Result};
use beacon_api::{require, BeaconNode, BlockId, Capability};
use log::{debug, info};
use serde::Serialize;
use types::{
    combined::SignedBeaconBlock,
    consts::GENESIS_SLOT,
    primitives::{Slot, H256},
};

use crate::{
    blocks::BlockCache,
    chain::{AnalysisOptions, ChainContext},
    classifier::{attesting_members, AttestationClassifier},
    committees::CommitteeCache,
    duplicates::{AttestationOrigin, DuplicateTracker},
    headers::{HeaderCache, WalkError},
    participation::VoteFlags,
};

#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct AttestationAnalysis {
    /// Block root the attestation votes for as head.
    pub head: H256,
    pub target: H256,
    pub distance: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplicate: Option<AttestationOrigin>,
    pub new_votes: usize,
    pub votes: usize,
    pub possible_votes: usize,
    #[serde(flatten)]
    pub flags: VoteFlags,
    pub score: f64,
    pub value: f64,
}

#[derive(Clone, Copy, PartialEq, Default, Debug, Serialize)]
pub struct SyncCommitteeAnalysis {
    pub contributions: usize,
    pub possible_contributions: usize,
    pub score: f64,
    pub value: f64,
}

#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct BlockAnalysis {
    pub slot: Slot,
    pub attestations: Vec<AttestationAnalysis>,
    pub sync_committee: SyncCommitteeAnalysis,
    pub value: f64,
}

/// Scores the attestations and sync aggregate in a single block.
///
/// Votes already included by an ancestor of the block earn nothing, so the ancestors back to
/// the oldest attested slot are scanned first.
pub struct BlockAnalyzer<'run, N: ?Sized> {
    node: &'run N,
    context: &'run ChainContext,
    options: AnalysisOptions,
}

impl<'run, N: BeaconNode + ?Sized> BlockAnalyzer<'run, N> {
    pub fn new(node: &'run N, context: &'run ChainContext, options: AnalysisOptions) -> Result<Self> {
        require(
            node,
            Capability::SignedBeaconBlocks
                | Capability::BeaconBlockHeaders
                | Capability::BeaconCommittees,
        )?;

        Ok(Self {
            node,
            context,
            options,
        })
    }

    pub fn run(&self, block_id: BlockId) -> Result<BlockAnalysis> {
        let block = self
            .node
            .signed_beacon_block(block_id)
            .with_context(|| format!("failed to obtain block {block_id}"))?
            .ok_or_else(|| anyhow!("no block found for {block_id}"))?;

        let slot = block.slot();

        info!("analyzing block at slot {slot}");

        let chain_time = &self.context.chain_time;
        let weights = &self.context.weights;
        let mut blocks = BlockCache::new(self.node);
        let mut committees = CommitteeCache::new(self.node);
        let mut headers =
            HeaderCache::new(self.node, self.options.deadline, self.options.max_walk_steps);
        let mut duplicates = DuplicateTracker::new();
        let classifier = AttestationClassifier::new(chain_time);

        let min_slot = block
            .attestations()
            .map(|attestation| attestation.data().slot)
            .min()
            .unwrap_or(slot)
            .min(slot);

        for ancestor in self.ancestors(&mut blocks, &block, min_slot)?.iter().rev() {
            debug!("indexing attestations in ancestor at slot {}", ancestor.slot());

            for (index, attestation) in ancestor.attestations().enumerate() {
                let origin = AttestationOrigin {
                    block: ancestor.slot(),
                    index,
                };

                duplicates.record_attestation(attestation.identity_root(), origin);

                let data = attestation.data();

                if data.slot < min_slot {
                    continue;
                }

                let epoch_committees =
                    committees.for_epoch(chain_time, chain_time.slot_to_epoch(data.slot))?;

                for member in attesting_members(attestation, &epoch_committees)? {
                    duplicates.credit(data.slot, member.validator_index);
                }
            }
        }

        let mut attestations = vec![];

        for (index, attestation) in block.attestations().enumerate() {
            let data = attestation.data();
            let origin = AttestationOrigin { block: slot, index };

            if let Some(duplicate) =
                duplicates.record_attestation(attestation.identity_root(), origin)
            {
                attestations.push(AttestationAnalysis {
                    head: data.beacon_block_root,
                    target: data.target.root,
                    distance: slot.saturating_sub(data.slot),
                    duplicate: Some(duplicate),
                    new_votes: 0,
                    votes: 0,
                    possible_votes: 0,
                    flags: VoteFlags::default(),
                    score: 0.0,
                    value: 0.0,
                });

                continue;
            }

            let epoch_committees =
                committees.for_epoch(chain_time, chain_time.slot_to_epoch(data.slot))?;

            let members = attesting_members(attestation, &epoch_committees)
                .with_context(|| format!("failed to decode attestation {index} in block at slot {slot}"))?;

            let new_votes = members
                .iter()
                .filter(|member| duplicates.credit(data.slot, member.validator_index))
                .count();

            let classification = classifier.classify(&mut headers, data, slot)?;
            let score = weights.attestation_score(classification.flags);

            attestations.push(AttestationAnalysis {
                head: data.beacon_block_root,
                target: data.target.root,
                distance: classification.inclusion_delay,
                duplicate: None,
                new_votes,
                votes: members.len(),
                possible_votes: attestation.aggregation_bits().len(),
                flags: classification.flags,
                score,
                value: scale(score, new_votes),
            });
        }

        let sync_committee = block
            .sync_aggregate()
            .map(|aggregate| {
                let bits = &aggregate.sync_committee_bits;
                let contributions = bits.count_ones();
                let score = weights.sync_score();

                SyncCommitteeAnalysis {
                    contributions,
                    possible_contributions: bits.len(),
                    score,
                    value: scale(score, contributions),
                }
            })
            .unwrap_or_default();

        let value = attestations
            .iter()
            .map(|attestation| attestation.value)
            .chain(iter::once(sync_committee.value))
            .sum();

        Ok(BlockAnalysis {
            slot,
            attestations,
            sync_committee,
            value,
        })
    }

    /// Ancestors of `block` at or after `min_slot`, newest first.
    fn ancestors(
        &self,
        blocks: &mut BlockCache<N>,
        block: &SignedBeaconBlock,
        min_slot: Slot,
    ) -> Result<Vec<Rc<SignedBeaconBlock>>> {
        let start = block.slot();
        let mut ancestors = vec![];
        let mut parent_root = block.parent_root();

        if start == GENESIS_SLOT {
            return Ok(ancestors);
        }

        // Every ancestor down to `min_slot` must be known.
        loop {
            let parent = blocks
                .with_root(parent_root)
                .with_context(|| format!("failed to obtain block {parent_root:?}"))?
                .ok_or_else(|| anyhow!("unable to obtain parent block {parent_root:?}"))?;

            if parent.slot() < min_slot {
                break;
            }

            let steps = ancestors.len() as u64;

            if steps >= self.options.max_walk_steps {
                return Err(WalkError::StepLimit { start, steps }.into());
            }

            self.options.deadline.check()?;

            parent_root = parent.parent_root();

            let reached_genesis = parent.slot() == GENESIS_SLOT;

            ancestors.push(parent);

            if reached_genesis {
                break;
            }
        }

        Ok(ancestors)
    }
}

#[expect(clippy::cast_precision_loss)]
#[expect(clippy::float_arithmetic)]
fn scale(score: f64, votes: usize) -> f64 {
    score * votes as f64
}

#[cfg(test)]
mod tests {
    use beacon_api::ApiError;
    use serde_json::json;
    use types::containers::Phase0Attestation;

    use crate::fake::{self, FakeBeaconNode};

    use super::*;

    fn committee_node(size: u64) -> FakeBeaconNode {
        let mut node = FakeBeaconNode::default();
        node.insert_committee(8, 0, (0..size).collect());
        node.insert_block(fake::root(7), fake::altair_block(7, fake::root(6), vec![]));
        node.insert_block(fake::root(8), fake::altair_block(8, fake::root(7), vec![]));
        node
    }

    fn full_attestation(size: usize) -> Phase0Attestation {
        fake::attestation(
            8,
            0,
            fake::root(8),
            fake::checkpoint(1, fake::root(8)),
            &vec![true; size],
        )
    }

    fn analyze(node: &FakeBeaconNode, slot: Slot) -> Result<BlockAnalysis> {
        let context = ChainContext::load(node)?;
        BlockAnalyzer::new(node, &context, AnalysisOptions::default())?.run(BlockId::Slot(slot))
    }

    #[test]
    #[expect(clippy::float_cmp, reason = "the expected values are exact in binary")]
    fn timely_correct_attestation_earns_full_score() -> Result<()> {
        let mut node = committee_node(100);
        node.insert_block(
            fake::root(9),
            fake::altair_block(9, fake::root(8), vec![full_attestation(100)]),
        );

        let analysis = analyze(&node, 9)?;
        let [attestation] = analysis.attestations.as_slice() else {
            panic!("expected one attestation, found {}", analysis.attestations.len());
        };

        assert_eq!(attestation.distance, 1);
        assert_eq!(attestation.head, fake::root(8));
        assert_eq!(attestation.target, fake::root(8));
        assert_eq!(attestation.new_votes, 100);
        assert_eq!(attestation.votes, 100);
        assert_eq!(attestation.possible_votes, 100);
        assert_eq!(attestation.score, 0.84375);
        assert_eq!(attestation.value, 84.375);
        assert_eq!(analysis.value, 84.375);

        Ok(())
    }

    #[test]
    #[expect(clippy::float_cmp, reason = "the expected values are exact in binary")]
    fn late_attestation_only_earns_target_component() -> Result<()> {
        let mut node = committee_node(4);
        node.insert_block(
            fake::root(14),
            fake::altair_block(14, fake::root(8), vec![full_attestation(4)]),
        );

        let analysis = analyze(&node, 14)?;
        let [attestation] = analysis.attestations.as_slice() else {
            panic!("expected one attestation, found {}", analysis.attestations.len());
        };

        assert_eq!(attestation.distance, 6);
        assert!(attestation.flags.head_correct);
        assert!(!attestation.flags.head_timely);
        assert!(!attestation.flags.source_timely);
        assert!(attestation.flags.target_timely);
        assert_eq!(attestation.score, 0.40625);
        assert_eq!(attestation.value, 1.625);

        Ok(())
    }

    #[test]
    fn attestation_included_by_ancestor_is_duplicate() -> Result<()> {
        let mut node = committee_node(4);
        node.insert_block(
            fake::root(9),
            fake::altair_block(9, fake::root(8), vec![full_attestation(4)]),
        );
        node.insert_block(
            fake::root(10),
            fake::altair_block(10, fake::root(9), vec![full_attestation(4)]),
        );

        let analysis = analyze(&node, 10)?;
        let [attestation] = analysis.attestations.as_slice() else {
            panic!("expected one attestation, found {}", analysis.attestations.len());
        };

        assert_eq!(
            attestation.duplicate,
            Some(AttestationOrigin { block: 9, index: 0 }),
        );
        assert_eq!(attestation.new_votes, 0);
        assert_eq!(attestation.votes, 0);

        Ok(())
    }

    #[test]
    fn overlapping_aggregates_only_count_new_votes() -> Result<()> {
        let target = fake::checkpoint(1, fake::root(8));
        let mut node = committee_node(4);
        node.insert_block(
            fake::root(9),
            fake::altair_block(
                9,
                fake::root(8),
                vec![fake::attestation(8, 0, fake::root(8), target, &[true, true, false, false])],
            ),
        );
        node.insert_block(
            fake::root(10),
            fake::altair_block(
                10,
                fake::root(9),
                vec![
                    fake::attestation(8, 0, fake::root(8), target, &[false, true, true, false]),
                    fake::attestation(8, 0, fake::root(8), target, &[false, false, true, true]),
                ],
            ),
        );

        let analysis = analyze(&node, 10)?;

        assert_eq!(
            analysis
                .attestations
                .iter()
                .map(|attestation| (attestation.new_votes, attestation.votes))
                .collect::<Vec<_>>(),
            [(1, 2), (1, 2)],
        );
        assert!(analysis
            .attestations
            .iter()
            .all(|attestation| attestation.duplicate.is_none()));

        Ok(())
    }

    #[test]
    fn identical_attestations_in_one_block_are_duplicates() -> Result<()> {
        let mut node = committee_node(4);
        node.insert_block(
            fake::root(9),
            fake::altair_block(9, fake::root(8), vec![full_attestation(4), full_attestation(4)]),
        );

        let analysis = analyze(&node, 9)?;

        assert_eq!(
            analysis
                .attestations
                .iter()
                .map(|attestation| attestation.duplicate)
                .collect::<Vec<_>>(),
            [None, Some(AttestationOrigin { block: 9, index: 0 })],
        );

        let json = serde_json::to_value(&analysis.attestations)?;

        assert_eq!(json[0]["head_correct"], json!(true));
        assert_eq!(json[1]["duplicate"], json!({ "block": 9, "index": 0 }));
        assert_eq!(json[1]["head"], json!(fake::root(8)));
        assert_eq!(json[1]["target"], json!(fake::root(8)));

        Ok(())
    }

    #[test]
    #[expect(clippy::float_cmp, reason = "the expected values are exact in binary")]
    fn sync_aggregate_adds_to_block_value() -> Result<()> {
        let mut node = committee_node(4);
        node.insert_block(
            fake::root(9),
            fake::altair_block_with_sync_bits(9, fake::root(8), vec![], &[true, true, false, true]),
        );

        let analysis = analyze(&node, 9)?;

        assert_eq!(
            analysis.sync_committee,
            SyncCommitteeAnalysis {
                contributions: 3,
                possible_contributions: 4,
                score: 0.03125,
                value: 0.09375,
            },
        );
        assert_eq!(analysis.value, 0.09375);

        Ok(())
    }

    #[test]
    fn phase0_block_has_no_sync_contributions() -> Result<()> {
        let mut node = committee_node(4);
        node.insert_block(fake::root(9), fake::phase0_block(9, fake::root(8), vec![]));

        let analysis = analyze(&node, 9)?;

        assert_eq!(analysis.sync_committee, SyncCommitteeAnalysis::default());

        Ok(())
    }

    #[test]
    fn electra_attestation_spans_committees() -> Result<()> {
        let mut node = FakeBeaconNode::default();
        node.set_spec_value("DENEB_FORK_EPOCH", "0");
        node.set_spec_value("ELECTRA_FORK_EPOCH", "0");
        node.insert_committee(8, 0, vec![0, 1]);
        node.insert_committee(8, 1, vec![2, 3, 4]);
        node.insert_block(fake::root(7), fake::altair_block(7, fake::root(6), vec![]));
        node.insert_block(fake::root(8), fake::altair_block(8, fake::root(7), vec![]));
        node.insert_block(
            fake::root(9),
            fake::electra_block(
                9,
                fake::root(8),
                vec![fake::electra_attestation(
                    8,
                    &[true, true],
                    fake::root(8),
                    fake::checkpoint(1, fake::root(8)),
                    &[true, false, false, true, true],
                )],
            ),
        );

        let analysis = analyze(&node, 9)?;
        let [attestation] = analysis.attestations.as_slice() else {
            panic!("expected one attestation, found {}", analysis.attestations.len());
        };

        assert_eq!(attestation.new_votes, 3);
        assert_eq!(attestation.possible_votes, 5);

        Ok(())
    }

    #[test]
    fn ancestor_walk_is_bounded() -> Result<()> {
        let mut node = committee_node(4);
        node.insert_block(fake::root(9), fake::altair_block(9, fake::root(8), vec![]));
        node.insert_block(
            fake::root(10),
            fake::altair_block(10, fake::root(9), vec![full_attestation(4)]),
        );

        let context = ChainContext::load(&node)?;
        let options = AnalysisOptions {
            max_walk_steps: 1,
            ..AnalysisOptions::default()
        };

        let error = BlockAnalyzer::new(&node, &context, options)?
            .run(BlockId::Slot(10))
            .expect_err("walk needs two steps");

        assert!(matches!(
            error.downcast_ref::<WalkError>(),
            Some(WalkError::StepLimit { start: 10, steps: 1 }),
        ));

        Ok(())
    }

    #[test]
    fn missing_ancestor_is_an_error() -> Result<()> {
        let mut node = committee_node(4);
        node.insert_block(
            fake::root(10),
            fake::altair_block(10, fake::root(9), vec![full_attestation(4)]),
        );

        let error = analyze(&node, 10).expect_err("the parent of block 10 is unknown");

        assert_eq!(
            error.to_string(),
            format!("unable to obtain parent block {:?}", fake::root(9)),
        );

        Ok(())
    }

    #[test]
    fn missing_block_is_an_error() -> Result<()> {
        let node = committee_node(4);

        let error = analyze(&node, 9).expect_err("there is no block at slot 9");

        assert_eq!(error.to_string(), "no block found for 9");

        Ok(())
    }

    #[test]
    fn failed_header_lookup_aborts_analysis() -> Result<()> {
        let mut node = committee_node(4);
        node.fail_header_lookups_at(8);
        node.insert_block(
            fake::root(9),
            fake::altair_block(9, fake::root(8), vec![full_attestation(4)]),
        );

        let error = analyze(&node, 9).expect_err("header lookup fails");

        assert!(matches!(
            error.downcast_ref::<ApiError>(),
            Some(ApiError::Timeout),
        ));

        Ok(())
    }

    #[test]
    fn node_without_committees_is_rejected() -> Result<()> {
        let mut node = committee_node(4);
        let context = ChainContext::load(&node)?;
        node.without(Capability::BeaconCommittees);

        assert!(BlockAnalyzer::new(&node, &context, AnalysisOptions::default()).is_err());

        Ok(())
    }
}
