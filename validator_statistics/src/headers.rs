use std::collections::HashMap;

use anyhow::Result;
use beacon_api::{ApiError, BeaconNode, BlockId, Deadline};
use log::trace;
use thiserror::Error;
use types::{nonstandard::BeaconBlockHeader, primitives::Slot};

#[derive(Debug, Error)]
#[cfg_attr(test, derive(PartialEq, Eq))]
pub enum WalkError {
    #[error("no canonical block found at or before slot {start} down to genesis")]
    ReachedGenesis { start: Slot },
    #[error("gave up walking back from slot {start} after {steps} steps")]
    StepLimit { start: Slot, steps: u64 },
}

/// Block headers by slot, each looked up at most once per run.
///
/// Empty slots are remembered too, so repeated walks over the same gap cost nothing.
pub struct HeaderCache<'node, N: ?Sized> {
    node: &'node N,
    deadline: Deadline,
    max_walk_steps: u64,
    entries: HashMap<Slot, Option<BeaconBlockHeader>>,
}

impl<'node, N: BeaconNode + ?Sized> HeaderCache<'node, N> {
    #[must_use]
    pub fn new(node: &'node N, deadline: Deadline, max_walk_steps: u64) -> Self {
        Self {
            node,
            deadline,
            max_walk_steps,
            entries: HashMap::new(),
        }
    }

    pub fn fetch(&mut self, slot: Slot) -> Result<Option<BeaconBlockHeader>, ApiError> {
        if let Some(entry) = self.entries.get(&slot) {
            return Ok(*entry);
        }

        let header = self.node.beacon_block_header(BlockId::Slot(slot))?;

        trace!("header at slot {slot}: {header:?}");

        self.entries.insert(slot, header);

        Ok(header)
    }

    /// The canonical header at `slot`, or at the closest earlier slot that has one.
    pub fn canonical_at_or_before(&mut self, slot: Slot) -> Result<BeaconBlockHeader> {
        let mut current = slot;

        for _ in 0..self.max_walk_steps {
            self.deadline.check()?;

            match self.fetch(current)? {
                Some(header) if header.canonical => return Ok(header),
                Some(_) => trace!("header at slot {current} is not canonical"),
                None => trace!("no header at slot {current}"),
            }

            current = current
                .checked_sub(1)
                .ok_or(WalkError::ReachedGenesis { start: slot })?;
        }

        Err(WalkError::StepLimit {
            start: slot,
            steps: self.max_walk_steps,
        }
        .into())
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
