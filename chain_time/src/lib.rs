//! Slot and epoch arithmetic for a single chain.
//!
//! [`ChainTime`] is built once from the genesis time, the chain constants and the fork schedule
//! reported by a beacon node. It is immutable afterwards, so every method is a pure function of
//! its arguments (apart from [`ChainTime::current_slot`] and [`ChainTime::current_epoch`],
//! which read the system clock).
//!
//! Times are represented as a [`Timespec`], a [`Duration`] since the Unix epoch.
//! Arithmetic saturates instead of overflowing so that `FAR_FUTURE_EPOCH` can be passed anywhere.

use core::{num::NonZeroU64, time::Duration};
use std::time::{SystemTime, SystemTimeError};

use enum_map::EnumMap;
use log::debug;
use types::{
    config::{ConfigError, SpecMap},
    consts::{FAR_FUTURE_EPOCH, GENESIS_EPOCH},
    containers::Fork,
    nonstandard::Phase,
    primitives::{Epoch, Slot, SyncCommitteePeriod, UnixSeconds},
};

#[cfg(test)]
mod fake_time;

/// Time as a [`Duration`] after the Unix epoch.
pub type Timespec = Duration;

pub trait SystemTimeLike: Copy {
    type Error: core::error::Error + Send + Sync + 'static;

    const UNIX_EPOCH: Self;

    fn duration_since(self, earlier: Self) -> Result<Duration, Self::Error>;
}

impl SystemTimeLike for SystemTime {
    type Error = SystemTimeError;

    const UNIX_EPOCH: Self = Self::UNIX_EPOCH;

    fn duration_since(self, earlier: Self) -> Result<Duration, Self::Error> {
        Self::duration_since(&self, earlier)
    }
}

#[derive(Clone, Debug)]
pub struct ChainTime {
    genesis_time: UnixSeconds,
    slot_duration_ms: NonZeroU64,
    slots_per_epoch: NonZeroU64,
    epochs_per_sync_committee_period: Option<NonZeroU64>,
    fork_epochs: EnumMap<Phase, Epoch>,
}

impl ChainTime {
    pub fn new(
        genesis_time: UnixSeconds,
        spec: &SpecMap,
        fork_schedule: &[Fork],
    ) -> Result<Self, ConfigError> {
        let slot_duration = match spec.duration("SECONDS_PER_SLOT")? {
            Some(duration) => duration,
            None => spec
                .duration("SLOT_DURATION_MS")?
                .ok_or(ConfigError::MissingKey {
                    key: "SECONDS_PER_SLOT",
                })?,
        };

        let slot_duration_ms = u64::try_from(slot_duration.as_millis())
            .ok()
            .and_then(NonZeroU64::new)
            .ok_or(ConfigError::ZeroValue {
                key: "SECONDS_PER_SLOT",
            })?;

        let slots_per_epoch = NonZeroU64::new(spec.required_uint("SLOTS_PER_EPOCH")?).ok_or(
            ConfigError::ZeroValue {
                key: "SLOTS_PER_EPOCH",
            },
        )?;

        let epochs_per_sync_committee_period = spec
            .uint("EPOCHS_PER_SYNC_COMMITTEE_PERIOD")?
            .and_then(NonZeroU64::new);

        let mut fork_epochs = EnumMap::default();

        for phase in enum_iterator::all::<Phase>() {
            fork_epochs[phase] = resolve_fork_epoch(phase, spec, fork_schedule)?;
        }

        debug!(
            "chain time: genesis at {genesis_time}, {slot_duration_ms} ms per slot, \
             {slots_per_epoch} slots per epoch, fork epochs {fork_epochs:?}",
        );

        Ok(Self {
            genesis_time,
            slot_duration_ms,
            slots_per_epoch,
            epochs_per_sync_committee_period,
            fork_epochs,
        })
    }

    #[must_use]
    pub const fn genesis_time(&self) -> UnixSeconds {
        self.genesis_time
    }

    #[must_use]
    pub const fn slot_duration(&self) -> Duration {
        Duration::from_millis(self.slot_duration_ms.get())
    }

    #[must_use]
    pub const fn slots_per_epoch(&self) -> u64 {
        self.slots_per_epoch.get()
    }

    #[must_use]
    pub const fn start_of_slot(&self, slot: Slot) -> Timespec {
        let genesis_ms = self.genesis_time.saturating_mul(1000);
        let offset_ms = slot.saturating_mul(self.slot_duration_ms.get());
        Duration::from_millis(genesis_ms.saturating_add(offset_ms))
    }

    #[must_use]
    pub const fn start_of_epoch(&self, epoch: Epoch) -> Timespec {
        self.start_of_slot(self.first_slot_of_epoch(epoch))
    }

    /// The slot in progress at `time`. Times before genesis map to slot 0.
    #[must_use]
    pub fn timestamp_to_slot(&self, time: Timespec) -> Slot {
        let since_genesis = time.saturating_sub(Duration::from_secs(self.genesis_time));
        let since_genesis_ms = u64::try_from(since_genesis.as_millis()).unwrap_or(u64::MAX);
        since_genesis_ms / self.slot_duration_ms
    }

    #[must_use]
    pub fn timestamp_to_epoch(&self, time: Timespec) -> Epoch {
        self.slot_to_epoch(self.timestamp_to_slot(time))
    }

    #[must_use]
    pub fn current_slot(&self) -> Slot {
        self.current_slot_at(SystemTime::now())
    }

    #[must_use]
    pub fn current_epoch(&self) -> Epoch {
        self.slot_to_epoch(self.current_slot())
    }

    #[must_use]
    pub fn current_slot_at<S: SystemTimeLike>(&self, now: S) -> Slot {
        // A clock set before 1970 is treated as being before genesis.
        let time = now.duration_since(S::UNIX_EPOCH).unwrap_or_default();
        self.timestamp_to_slot(time)
    }

    #[must_use]
    pub const fn slot_to_epoch(&self, slot: Slot) -> Epoch {
        slot / self.slots_per_epoch.get()
    }

    #[must_use]
    pub const fn first_slot_of_epoch(&self, epoch: Epoch) -> Slot {
        epoch.saturating_mul(self.slots_per_epoch.get())
    }

    #[must_use]
    pub const fn last_slot_of_epoch(&self, epoch: Epoch) -> Slot {
        self.first_slot_of_epoch(epoch.saturating_add(1))
            .saturating_sub(1)
    }

    /// Returns `None` if the chain does not report `EPOCHS_PER_SYNC_COMMITTEE_PERIOD`.
    #[must_use]
    pub fn sync_committee_period(&self, epoch: Epoch) -> Option<SyncCommitteePeriod> {
        self.epochs_per_sync_committee_period
            .map(|epochs_per_period| epoch / epochs_per_period)
    }

    /// The first epoch of `period` in which a sync committee exists.
    ///
    /// Sync committees start at Altair, so periods that began earlier are clamped to it.
    #[must_use]
    pub fn first_epoch_of_sync_period(&self, period: SyncCommitteePeriod) -> Option<Epoch> {
        self.epochs_per_sync_committee_period
            .map(|epochs_per_period| period.saturating_mul(epochs_per_period.get()))
            .map(|epoch| epoch.max(self.altair_fork_epoch()))
    }

    #[must_use]
    pub fn fork_epoch(&self, phase: Phase) -> Epoch {
        self.fork_epochs[phase]
    }

    #[must_use]
    pub fn altair_fork_epoch(&self) -> Epoch {
        self.fork_epoch(Phase::Altair)
    }

    #[must_use]
    pub fn bellatrix_fork_epoch(&self) -> Epoch {
        self.fork_epoch(Phase::Bellatrix)
    }

    #[must_use]
    pub fn capella_fork_epoch(&self) -> Epoch {
        self.fork_epoch(Phase::Capella)
    }

    #[must_use]
    pub fn deneb_fork_epoch(&self) -> Epoch {
        self.fork_epoch(Phase::Deneb)
    }

    #[must_use]
    pub fn electra_fork_epoch(&self) -> Epoch {
        self.fork_epoch(Phase::Electra)
    }

    #[must_use]
    pub fn fulu_fork_epoch(&self) -> Epoch {
        self.fork_epoch(Phase::Fulu)
    }

    #[must_use]
    pub fn phase_at_epoch(&self, epoch: Epoch) -> Phase {
        self.fork_epochs
            .iter()
            .take_while(|(_, fork_epoch)| **fork_epoch <= epoch)
            .map(|(phase, _)| phase)
            .last()
            .unwrap_or(Phase::Phase0)
    }

    #[must_use]
    pub fn phase_at_slot(&self, slot: Slot) -> Phase {
        self.phase_at_epoch(self.slot_to_epoch(slot))
    }
}

// Nodes that predate a fork omit its `*_FORK_EPOCH` key but may still list it in the fork schedule.
fn resolve_fork_epoch(
    phase: Phase,
    spec: &SpecMap,
    fork_schedule: &[Fork],
) -> Result<Epoch, ConfigError> {
    let Some(epoch_key) = phase.fork_epoch_key() else {
        return Ok(GENESIS_EPOCH);
    };

    if let Some(epoch) = spec.uint(epoch_key)? {
        return Ok(epoch);
    }

    let scheduled_epoch = spec.hex(phase.fork_version_key())?.and_then(|version| {
        fork_schedule
            .iter()
            .find(|fork| fork.current_version.as_bytes() == version)
            .map(|fork| fork.epoch)
    });

    Ok(scheduled_epoch.unwrap_or(FAR_FUTURE_EPOCH))
}
