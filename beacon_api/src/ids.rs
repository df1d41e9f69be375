//! Identifiers accepted in the `{block_id}` and `{state_id}` path segments.
//!
//! Both render to the exact segment the Beacon Node API expects and parse back from it,
//! which is also how the auditor reads `--block-id`.

use parse_display::{Display, FromStr};
use types::primitives::{Slot, H256};

/// Block selector. Unlike [`StateId`] it has no `justified` form.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Display, FromStr)]
#[display(style = "lowercase")]
pub enum BlockId {
    Head,
    Genesis,
    Finalized,
    #[display("{0}")]
    Slot(Slot),
    #[display("{0:?}")]
    Root(H256),
}

impl From<Slot> for BlockId {
    fn from(slot: Slot) -> Self {
        Self::Slot(slot)
    }
}

impl From<H256> for BlockId {
    fn from(root: H256) -> Self {
        Self::Root(root)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Display, FromStr)]
#[display(style = "lowercase")]
pub enum StateId {
    Head,
    Genesis,
    Finalized,
    Justified,
    #[display("{0}")]
    Slot(Slot),
    #[display("{0:?}")]
    Root(H256),
}

impl From<Slot> for StateId {
    fn from(slot: Slot) -> Self {
        Self::Slot(slot)
    }
}
