use std::{collections::HashMap, rc::Rc};

use beacon_api::{ApiError, BeaconNode};
use log::trace;
use types::{
    combined::SignedBeaconBlock,
    primitives::{Slot, H256},
};

/// Blocks fetched during one run, by slot and by root.
///
/// A slot without a block is cached as `None` and never requested again.
pub struct BlockCache<'node, N: ?Sized> {
    node: &'node N,
    by_slot: HashMap<Slot, Option<Rc<SignedBeaconBlock>>>,
    by_root: HashMap<H256, Option<Rc<SignedBeaconBlock>>>,
}

impl<'node, N: BeaconNode + ?Sized> BlockCache<'node, N> {
    #[must_use]
    pub fn new(node: &'node N) -> Self {
        Self {
            node,
            by_slot: HashMap::new(),
            by_root: HashMap::new(),
        }
    }

    pub fn at_slot(&mut self, slot: Slot) -> Result<Option<Rc<SignedBeaconBlock>>, ApiError> {
        if let Some(entry) = self.by_slot.get(&slot) {
            return Ok(entry.clone());
        }

        trace!("fetching block at slot {slot}");

        let block = self.node.signed_beacon_block(slot.into())?.map(Rc::new);
        self.by_slot.insert(slot, block.clone());

        Ok(block)
    }

    pub fn with_root(&mut self, root: H256) -> Result<Option<Rc<SignedBeaconBlock>>, ApiError> {
        if let Some(entry) = self.by_root.get(&root) {
            return Ok(entry.clone());
        }

        trace!("fetching block {root:?}");

        let block = self.node.signed_beacon_block(root.into())?.map(Rc::new);
        self.by_root.insert(root, block.clone());

        Ok(block)
    }
}
