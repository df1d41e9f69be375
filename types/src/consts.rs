use core::num::NonZeroU64;

use nonzero_ext::nonzero;

use crate::primitives::{Epoch, Slot};

pub const FAR_FUTURE_EPOCH: Epoch = Epoch::MAX;
pub const GENESIS_EPOCH: Epoch = 0;
pub const GENESIS_SLOT: Slot = 0;

// Altair reward weights. Used when a node omits them from its spec.
pub const TIMELY_SOURCE_WEIGHT: u64 = 14;
pub const TIMELY_TARGET_WEIGHT: u64 = 26;
pub const TIMELY_HEAD_WEIGHT: u64 = 14;
pub const SYNC_REWARD_WEIGHT: u64 = 2;
pub const PROPOSER_WEIGHT: u64 = 8;
pub const WEIGHT_DENOMINATOR: NonZeroU64 = nonzero!(64_u64);

// Inclusion distances past which a vote stops earning its reward component.
pub const MAX_TIMELY_HEAD_DELAY: u64 = 1;
pub const MAX_TIMELY_SOURCE_DELAY: u64 = 5;
pub const MAX_TIMELY_TARGET_DELAY: u64 = 32;
