use reqwest::StatusCode;
use thiserror::Error;

use crate::node::Capability;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("deadline passed before the beacon node responded")]
    Timeout,
    #[error("request to beacon node failed")]
    Network(#[source] reqwest::Error),
    #[error("invalid beacon node URL")]
    InvalidUrl(#[from] url::ParseError),
    #[error("received unexpected status code: {received}, expected: {expected}")]
    UnexpectedStatusCode {
        expected: StatusCode,
        received: StatusCode,
    },
    #[error("beacon node response could not be decoded")]
    Malformed(#[source] serde_json::Error),
    #[error("beacon node lacks required capability: {0}")]
    MissingCapability(Capability),
    #[error("beacon node does not support {0}")]
    Unsupported(Capability),
}

impl From<reqwest::Error> for ApiError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else {
            Self::Network(error)
        }
    }
}
