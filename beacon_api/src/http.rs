use enumset::EnumSet;
use log::{debug, trace};
use mime::APPLICATION_JSON;
use reqwest::{
    blocking::{Client, RequestBuilder},
    header::ACCEPT,
    StatusCode, Url,
};
use serde::{de::DeserializeOwned, Serialize};
use types::{
    combined::SignedBeaconBlock,
    config::SpecMap,
    containers::Fork,
    nonstandard::{BeaconBlockHeader, ValidatorId},
    primitives::{Epoch, ValidatorIndex},
};

use crate::{
    containers::{
        AttesterDuty, BeaconCommittee, BlockHeaderResponse, EthResponse, Genesis, ProposerDuty,
        SyncCommittee, ValidatorInfo,
    },
    deadline::Deadline,
    error::ApiError,
    ids::{BlockId, StateId},
    node::{BeaconNode, Capability},
};

/// A [`BeaconNode`] speaking the standard Eth Beacon Node API over HTTP.
///
/// Every request is bounded by the time left before `deadline`.
pub struct HttpBeaconNode {
    client: Client,
    base_url: Url,
    deadline: Deadline,
}

#[derive(Serialize)]
struct ValidatorsRequest<'ids> {
    ids: &'ids [ValidatorId],
}

impl BeaconNode for HttpBeaconNode {
    fn capabilities(&self) -> EnumSet<Capability> {
        EnumSet::all()
    }

    fn genesis(&self) -> Result<Genesis, ApiError> {
        self.get("/eth/v1/beacon/genesis", &[])
    }

    fn spec(&self) -> Result<SpecMap, ApiError> {
        self.get("/eth/v1/config/spec", &[])
    }

    fn fork_schedule(&self) -> Result<Vec<Fork>, ApiError> {
        self.get("/eth/v1/config/fork_schedule", &[])
    }

    fn validators(
        &self,
        state: StateId,
        ids: &[ValidatorId],
    ) -> Result<Vec<ValidatorInfo>, ApiError> {
        let path = format!("/eth/v1/beacon/states/{state}/validators");
        self.post(&path, &ValidatorsRequest { ids })
    }

    fn proposer_duties(&self, epoch: Epoch) -> Result<Vec<ProposerDuty>, ApiError> {
        self.get(&format!("/eth/v1/validator/duties/proposer/{epoch}"), &[])
    }

    fn attester_duties(
        &self,
        epoch: Epoch,
        indices: &[ValidatorIndex],
    ) -> Result<Vec<AttesterDuty>, ApiError> {
        let indices = indices.iter().map(ToString::to_string).collect::<Vec<_>>();
        self.post(&format!("/eth/v1/validator/duties/attester/{epoch}"), &indices)
    }

    fn beacon_committees(
        &self,
        state: StateId,
        epoch: Option<Epoch>,
    ) -> Result<Vec<BeaconCommittee>, ApiError> {
        let path = format!("/eth/v1/beacon/states/{state}/committees");
        self.get(&path, &epoch_query(epoch))
    }

    fn sync_committee(
        &self,
        state: StateId,
        epoch: Option<Epoch>,
    ) -> Result<SyncCommittee, ApiError> {
        let path = format!("/eth/v1/beacon/states/{state}/sync_committees");
        self.get(&path, &epoch_query(epoch))
    }

    fn signed_beacon_block(&self, block_id: BlockId) -> Result<Option<SignedBeaconBlock>, ApiError> {
        // Blocks carry their own `version` tag next to `data`, so the whole body is decoded.
        let url = self.url(&format!("/eth/v2/beacon/blocks/{block_id}"))?;
        self.send(self.client.get(url))
    }

    fn beacon_block_header(
        &self,
        block_id: BlockId,
    ) -> Result<Option<BeaconBlockHeader>, ApiError> {
        let url = self.url(&format!("/eth/v1/beacon/headers/{block_id}"))?;

        Ok(self
            .send::<EthResponse<BlockHeaderResponse>>(self.client.get(url))?
            .map(|response| response.data.into()))
    }
}

impl HttpBeaconNode {
    #[must_use]
    pub const fn new(client: Client, base_url: Url, deadline: Deadline) -> Self {
        Self {
            client,
            base_url,
            deadline,
        }
    }

    fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T, ApiError> {
        let url = self.url(path)?;
        let request = self.client.get(url).query(query);
        self.send_expecting_content::<EthResponse<T>>(request)
            .map(|response| response.data)
    }

    fn post<T: DeserializeOwned>(&self, path: &str, body: &impl Serialize) -> Result<T, ApiError> {
        let url = self.url(path)?;
        let request = self.client.post(url).json(body);
        self.send_expecting_content::<EthResponse<T>>(request)
            .map(|response| response.data)
    }

    fn send_expecting_content<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, ApiError> {
        self.send(request)?.ok_or(ApiError::UnexpectedStatusCode {
            expected: StatusCode::OK,
            received: StatusCode::NOT_FOUND,
        })
    }

    /// Sends `request` and decodes the response body. HTTP 404 becomes `Ok(None)`.
    fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<Option<T>, ApiError> {
        let request = match self.deadline.remaining()? {
            Some(timeout) => request.timeout(timeout),
            None => request,
        };

        let response = request.header(ACCEPT, APPLICATION_JSON.as_ref()).send()?;
        let status = response.status();

        debug!("{} responded with {status}", response.url());

        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if status != StatusCode::OK {
            return Err(ApiError::UnexpectedStatusCode {
                expected: StatusCode::OK,
                received: status,
            });
        }

        let bytes = response.bytes()?;

        trace!("received {} bytes", bytes.len());

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(ApiError::Malformed)
    }

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url.join(path).map_err(Into::into)
    }
}

fn epoch_query(epoch: Option<Epoch>) -> Vec<(&'static str, String)> {
    epoch
        .map(|epoch| ("epoch", epoch.to_string()))
        .into_iter()
        .collect()
}
