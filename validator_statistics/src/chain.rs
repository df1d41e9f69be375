use core::ops::RangeInclusive;

use anyhow::{Context as _, Result};
use beacon_api::{require, BeaconNode, Capability, Deadline};
use chain_time::ChainTime;
use log::info;
use types::primitives::{Epoch, Slot};

use crate::weights::RewardWeights;

pub const DEFAULT_MAX_WALK_STEPS: u64 = 1024;

#[derive(Clone, Copy, Debug)]
pub struct AnalysisOptions {
    /// Applies to every request made during the analysis, including backward walks.
    pub deadline: Deadline,
    /// Longest walk back through empty or orphaned slots before giving up.
    pub max_walk_steps: u64,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            deadline: Deadline::none(),
            max_walk_steps: DEFAULT_MAX_WALK_STEPS,
        }
    }
}

/// Chain parameters every analysis needs, obtained from the node once per run.
#[derive(Clone, Debug)]
pub struct ChainContext {
    pub chain_time: ChainTime,
    pub weights: RewardWeights,
}

impl ChainContext {
    pub fn load<N: BeaconNode + ?Sized>(node: &N) -> Result<Self> {
        require(
            node,
            Capability::Genesis | Capability::Spec | Capability::ForkSchedule,
        )?;

        let genesis = node.genesis().context("failed to obtain genesis")?;
        let spec = node.spec().context("failed to obtain spec")?;
        let fork_schedule = node
            .fork_schedule()
            .context("failed to obtain fork schedule")?;

        let chain_time = ChainTime::new(genesis.genesis_time, &spec, &fork_schedule)
            .context("failed to set up chain time")?;

        let weights =
            RewardWeights::from_spec(&spec).context("failed to obtain reward weights")?;

        info!(
            "connected to chain with genesis at {}, current slot {}",
            genesis.genesis_time,
            chain_time.current_slot(),
        );

        Ok(Self {
            chain_time,
            weights,
        })
    }

    /// Slots whose blocks may include attestations for `epoch`, cut off at `current_slot`.
    #[must_use]
    pub fn inclusion_window(&self, epoch: Epoch, current_slot: Slot) -> RangeInclusive<Slot> {
        let first_slot = self.chain_time.first_slot_of_epoch(epoch);
        let last_slot = self
            .chain_time
            .first_slot_of_epoch(epoch.saturating_add(2))
            .min(current_slot);

        first_slot.saturating_add(1)..=last_slot
    }
}
