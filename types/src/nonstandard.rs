use core::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

use enum_iterator::Sequence;
use enum_map::Enum;
use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use strum::{AsRefStr, Display, EnumString};
use thiserror::Error;

use crate::primitives::{PublicKeyBytes, Slot, ValidatorIndex, H256};

#[derive(
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Debug,
    Enum,
    Sequence,
    AsRefStr,
    Display,
    EnumString,
    DeserializeFromStr,
    SerializeDisplay,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Phase {
    Phase0,
    Altair,
    Bellatrix,
    Capella,
    Deneb,
    Electra,
    Fulu,
}

impl Phase {
    #[must_use]
    pub const fn fork_epoch_key(self) -> Option<&'static str> {
        match self {
            Self::Phase0 => None,
            Self::Altair => Some("ALTAIR_FORK_EPOCH"),
            Self::Bellatrix => Some("BELLATRIX_FORK_EPOCH"),
            Self::Capella => Some("CAPELLA_FORK_EPOCH"),
            Self::Deneb => Some("DENEB_FORK_EPOCH"),
            Self::Electra => Some("ELECTRA_FORK_EPOCH"),
            Self::Fulu => Some("FULU_FORK_EPOCH"),
        }
    }

    #[must_use]
    pub const fn fork_version_key(self) -> &'static str {
        match self {
            Self::Phase0 => "GENESIS_FORK_VERSION",
            Self::Altair => "ALTAIR_FORK_VERSION",
            Self::Bellatrix => "BELLATRIX_FORK_VERSION",
            Self::Capella => "CAPELLA_FORK_VERSION",
            Self::Deneb => "DENEB_FORK_VERSION",
            Self::Electra => "ELECTRA_FORK_VERSION",
            Self::Fulu => "FULU_FORK_VERSION",
        }
    }
}

/// A block header as seen by the analysis: where it sits and whether it is on the canonical chain.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Deserialize, Serialize)]
pub struct BeaconBlockHeader {
    #[serde(with = "serde_utils::string_or_native")]
    pub slot: Slot,
    pub root: H256,
    pub parent_root: H256,
    pub canonical: bool,
}

/// A validator named on the command line, either by index or by public key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, SerializeDisplay, DeserializeFromStr)]
pub enum ValidatorId {
    Index(ValidatorIndex),
    PublicKey(PublicKeyBytes),
}

#[derive(Debug, Error)]
#[error("{input:?} is neither a validator index nor a 0x-prefixed public key")]
pub struct InvalidValidatorId {
    input: String,
}

impl FromStr for ValidatorId {
    type Err = InvalidValidatorId;

    fn from_str(string: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidValidatorId {
            input: string.to_owned(),
        };

        match string.strip_prefix("0x") {
            Some(digits) => hex::FromHex::from_hex(digits)
                .map(Self::PublicKey)
                .map_err(|_| invalid()),
            None => string.parse().map(Self::Index).map_err(|_| invalid()),
        }
    }
}

impl Display for ValidatorId {
    fn fmt(&self, formatter: &mut Formatter) -> FmtResult {
        match self {
            Self::Index(index) => write!(formatter, "{index}"),
            Self::PublicKey(public_key) => write!(formatter, "{public_key:?}"),
        }
    }
}
