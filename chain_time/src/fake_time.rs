//! A [`SystemTimeLike`] that can be set to any point in time.

use core::time::Duration;

use thiserror::Error;

use crate::{SystemTimeLike, Timespec};

#[derive(Clone, Copy)]
pub struct FakeSystemTime(pub Timespec);

#[derive(Debug, Error)]
#[error("second time provided was later by {0:?}")]
pub struct FakeSystemTimeError(pub Duration);

impl SystemTimeLike for FakeSystemTime {
    type Error = FakeSystemTimeError;

    const UNIX_EPOCH: Self = Self(Duration::ZERO);

    fn duration_since(self, earlier: Self) -> Result<Duration, Self::Error> {
        self.0
            .checked_sub(earlier.0)
            .ok_or_else(|| FakeSystemTimeError(earlier.0 - self.0))
    }
}
