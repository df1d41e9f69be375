use derive_more::AsRef;
use fixed_hash::construct_fixed_hash;
use impl_serde::impl_fixed_hash_serde;

pub use ethereum_types::{H160, H256, H32};

pub type CommitteeIndex = u64;
pub type Epoch = u64;
pub type ExecutionBlockNumber = u64;
pub type Gwei = u64;
pub type Slot = u64;
pub type SyncCommitteePeriod = u64;
pub type UnixSeconds = u64;
pub type ValidatorIndex = u64;
pub type Version = H32;

pub type KzgCommitment = H384;
pub type PublicKeyBytes = H384;
pub type SignatureBytes = H768;

construct_fixed_hash! {
    #[derive(AsRef)]
    pub struct H384(48);
}

construct_fixed_hash! {
    #[derive(AsRef)]
    pub struct H768(96);
}

impl_fixed_hash_serde!(H384, 48);
impl_fixed_hash_serde!(H768, 96);

impl hex::FromHex for H384 {
    type Error = <[u8; 48] as hex::FromHex>::Error;

    fn from_hex<T: AsRef<[u8]>>(digits: T) -> Result<Self, Self::Error> {
        hex::FromHex::from_hex(digits).map(Self)
    }
}
