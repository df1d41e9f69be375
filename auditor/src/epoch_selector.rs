use core::{num::ParseIntError, str::FromStr};

use thiserror::Error;
use types::primitives::Epoch;

/// An epoch as named on the command line.
///
/// Accepts `current` (also `head`, `-0` or nothing), `last`, an epoch number, or `-N` for
/// `N` epochs before the current one.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub enum EpochSelector {
    #[default]
    Current,
    Last,
    Absolute(Epoch),
    Back(u64),
}

#[derive(Debug, Error)]
#[error("{input:?} is not an epoch")]
pub struct InvalidEpoch {
    input: String,
    source: ParseIntError,
}

impl FromStr for EpochSelector {
    type Err = InvalidEpoch;

    fn from_str(string: &str) -> Result<Self, Self::Err> {
        let selector = match string {
            "" | "current" | "head" | "-0" => return Ok(Self::Current),
            "last" => return Ok(Self::Last),
            _ => match string.strip_prefix('-') {
                Some(epochs) => epochs.parse().map(Self::Back),
                None => string.parse().map(Self::Absolute),
            },
        };

        selector.map_err(|source| InvalidEpoch {
            input: string.to_owned(),
            source,
        })
    }
}

impl EpochSelector {
    /// Epochs before genesis resolve to the genesis epoch.
    #[must_use]
    pub const fn resolve(self, current_epoch: Epoch) -> Epoch {
        match self {
            Self::Current => current_epoch,
            Self::Last => current_epoch.saturating_sub(1),
            Self::Absolute(epoch) => epoch,
            Self::Back(epochs) => current_epoch.saturating_sub(epochs),
        }
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case("", 100)]
    #[test_case("current", 100)]
    #[test_case("head", 100)]
    #[test_case("-0", 100)]
    #[test_case("last", 99)]
    #[test_case("12", 12)]
    #[test_case("-3", 97)]
    #[test_case("-300", 0)]
    fn selector_resolves_against_current_epoch(
        string: &str,
        expected: Epoch,
    ) -> Result<(), InvalidEpoch> {
        assert_eq!(string.parse::<EpochSelector>()?.resolve(100), expected);
        Ok(())
    }

    #[test]
    fn last_epoch_at_genesis_is_genesis() {
        assert_eq!(EpochSelector::Last.resolve(0), 0);
    }

    #[test_case("previous")]
    #[test_case("1.5")]
    #[test_case("--1")]
    fn garbage_is_rejected(string: &str) {
        assert!(string.parse::<EpochSelector>().is_err());
    }
}
