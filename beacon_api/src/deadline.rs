use core::time::Duration;
use std::time::Instant;

use crate::error::ApiError;

/// An absolute point in time after which no further beacon node calls may be made.
///
/// Copied freely between the client and the walks that poll it.
#[derive(Clone, Copy, Default, Debug)]
pub struct Deadline {
    expires_at: Option<Instant>,
}

impl Deadline {
    #[must_use]
    pub fn after(timeout: Duration) -> Self {
        Self {
            expires_at: Instant::now().checked_add(timeout),
        }
    }

    #[must_use]
    pub const fn none() -> Self {
        Self { expires_at: None }
    }

    /// Time left before the deadline, or `None` if there is no deadline.
    pub fn remaining(self) -> Result<Option<Duration>, ApiError> {
        let Some(expires_at) = self.expires_at else {
            return Ok(None);
        };

        let remaining = expires_at.saturating_duration_since(Instant::now());

        if remaining.is_zero() {
            return Err(ApiError::Timeout);
        }

        Ok(Some(remaining))
    }

    pub fn check(self) -> Result<(), ApiError> {
        self.remaining().map(|_| ())
    }
}
