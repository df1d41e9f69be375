use core::num::NonZeroU64;

use serde::Serialize;
use types::{
    config::{ConfigError, SpecMap},
    consts::{
        PROPOSER_WEIGHT, SYNC_REWARD_WEIGHT, TIMELY_HEAD_WEIGHT, TIMELY_SOURCE_WEIGHT,
        TIMELY_TARGET_WEIGHT, WEIGHT_DENOMINATOR,
    },
};

use crate::participation::VoteFlags;

/// Altair reward weights as configured on the chain being analyzed.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub struct RewardWeights {
    pub timely_source: u64,
    pub timely_target: u64,
    pub timely_head: u64,
    pub sync_reward: u64,
    pub proposer: u64,
    pub denominator: NonZeroU64,
}

impl Default for RewardWeights {
    fn default() -> Self {
        Self {
            timely_source: TIMELY_SOURCE_WEIGHT,
            timely_target: TIMELY_TARGET_WEIGHT,
            timely_head: TIMELY_HEAD_WEIGHT,
            sync_reward: SYNC_REWARD_WEIGHT,
            proposer: PROPOSER_WEIGHT,
            denominator: WEIGHT_DENOMINATOR,
        }
    }
}

impl RewardWeights {
    /// Missing weights fall back to their Altair values. Weights of the wrong kind are errors.
    pub fn from_spec(spec: &SpecMap) -> Result<Self, ConfigError> {
        let denominator = spec.uint_or("WEIGHT_DENOMINATOR", WEIGHT_DENOMINATOR.get())?;

        Ok(Self {
            timely_source: spec.uint_or("TIMELY_SOURCE_WEIGHT", TIMELY_SOURCE_WEIGHT)?,
            timely_target: spec.uint_or("TIMELY_TARGET_WEIGHT", TIMELY_TARGET_WEIGHT)?,
            timely_head: spec.uint_or("TIMELY_HEAD_WEIGHT", TIMELY_HEAD_WEIGHT)?,
            sync_reward: spec.uint_or("SYNC_REWARD_WEIGHT", SYNC_REWARD_WEIGHT)?,
            proposer: spec.uint_or("PROPOSER_WEIGHT", PROPOSER_WEIGHT)?,
            denominator: NonZeroU64::new(denominator).ok_or(ConfigError::ZeroValue {
                key: "WEIGHT_DENOMINATOR",
            })?,
        })
    }

    /// The share of a full attestation reward earned by a vote with `flags`.
    #[must_use]
    pub fn attestation_score(&self, flags: VoteFlags) -> f64 {
        let earned = [
            (flags.target_correct && flags.target_timely, self.timely_target),
            (flags.source_timely, self.timely_source),
            (flags.head_correct && flags.head_timely, self.timely_head),
        ]
        .into_iter()
        .filter_map(|(satisfied, weight)| satisfied.then_some(weight))
        .sum();

        self.fraction(earned)
    }

    #[must_use]
    pub fn sync_score(&self) -> f64 {
        self.fraction(self.sync_reward)
    }

    #[expect(clippy::cast_precision_loss)]
    #[expect(clippy::float_arithmetic)]
    fn fraction(&self, weight: u64) -> f64 {
        weight as f64 / self.denominator.get() as f64
    }
}
