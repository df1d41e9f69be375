//! Bitfields as they appear in Beacon API JSON.
//!
//! Both kinds are hex encoded with bits packed least significant first. A bitlist additionally
//! carries a sentinel bit right after its last element, which is what encodes its length.

use core::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

use bitvec::{order::Lsb0, vec::BitVec};
use derive_more::{Deref, From};
use serde_with::{DeserializeFromStr, SerializeDisplay};

use crate::error::DataError;

pub type Bits = BitVec<u8, Lsb0>;

#[derive(Clone, PartialEq, Eq, Hash, Default, Debug, Deref, From, DeserializeFromStr, SerializeDisplay)]
pub struct BitList(Bits);

#[derive(Clone, PartialEq, Eq, Hash, Default, Debug, Deref, From, DeserializeFromStr, SerializeDisplay)]
pub struct BitVector(Bits);

impl BitList {
    pub fn from_ssz_bytes(bytes: &[u8]) -> Result<Self, DataError> {
        // The sentinel must be in the last byte.
        if bytes.last().is_none_or(|byte| *byte == 0) {
            return Err(DataError::BitlistWithoutSentinel);
        }

        let mut bits = Bits::from_slice(bytes);
        let sentinel_position = bits.last_one().ok_or(DataError::BitlistWithoutSentinel)?;
        bits.truncate(sentinel_position);

        Ok(Self(bits))
    }

    #[must_use]
    pub fn to_ssz_bytes(&self) -> Vec<u8> {
        let mut bits = self.0.clone();
        bits.push(true);
        bits.set_uninitialized(false);
        bits.into_vec()
    }
}

impl BitVector {
    #[must_use]
    pub fn from_ssz_bytes(bytes: &[u8]) -> Self {
        Self(Bits::from_slice(bytes))
    }

    #[must_use]
    pub fn to_ssz_bytes(&self) -> Vec<u8> {
        let mut bits = self.0.clone();
        bits.set_uninitialized(false);
        bits.into_vec()
    }
}

impl FromIterator<bool> for BitList {
    fn from_iter<I: IntoIterator<Item = bool>>(bits: I) -> Self {
        Self(bits.into_iter().collect())
    }
}

impl FromIterator<bool> for BitVector {
    fn from_iter<I: IntoIterator<Item = bool>>(bits: I) -> Self {
        Self(bits.into_iter().collect())
    }
}

impl FromStr for BitList {
    type Err = DataError;

    fn from_str(string: &str) -> Result<Self, Self::Err> {
        Self::from_ssz_bytes(&decode_prefixed_hex(string)?)
    }
}

impl FromStr for BitVector {
    type Err = DataError;

    fn from_str(string: &str) -> Result<Self, Self::Err> {
        decode_prefixed_hex(string).map(|bytes| Self::from_ssz_bytes(&bytes))
    }
}

impl Display for BitList {
    fn fmt(&self, formatter: &mut Formatter) -> FmtResult {
        write!(formatter, "0x{}", hex::encode(self.to_ssz_bytes()))
    }
}

impl Display for BitVector {
    fn fmt(&self, formatter: &mut Formatter) -> FmtResult {
        write!(formatter, "0x{}", hex::encode(self.to_ssz_bytes()))
    }
}

fn decode_prefixed_hex(string: &str) -> Result<Vec<u8>, DataError> {
    let digits = string
        .strip_prefix("0x")
        .ok_or(DataError::MissingHexPrefix)?;

    hex::decode(digits).map_err(Into::into)
}
