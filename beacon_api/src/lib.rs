pub use crate::{
    deadline::Deadline,
    error::ApiError,
    http::HttpBeaconNode,
    ids::{BlockId, StateId},
    node::{require, BeaconNode, Capability},
};

pub mod containers;

mod deadline;
mod error;
mod http;
mod ids;
mod node;
