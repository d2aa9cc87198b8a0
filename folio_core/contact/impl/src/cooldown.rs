use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use thiserror::Error;

/// Client side cooldown between two successful submissions of the same form.
///
/// This is advisory only, anyone can bypass it by reloading the form.
#[derive(Debug, Clone, Copy)]
pub struct ContactCooldown {
    window: Duration,
    last_success: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error(
    "Please wait {} seconds before sending another message.",
    .window.as_millis().div_ceil(1000)
)]
pub struct ContactCooldownError {
    pub window: Duration,
    pub until: DateTime<Utc>,
}

impl ContactCooldown {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_success: None,
        }
    }

    pub fn last_success(&self) -> Option<DateTime<Utc>> {
        self.last_success
    }

    pub fn check(&self, now: DateTime<Utc>) -> Result<(), ContactCooldownError> {
        let Some(last_success) = self.last_success else {
            return Ok(());
        };

        let until = TimeDelta::from_std(self.window)
            .ok()
            .and_then(|window| last_success.checked_add_signed(window))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        if now < until {
            return Err(ContactCooldownError {
                window: self.window,
                until,
            });
        }

        Ok(())
    }

    pub fn record_success(&mut self, now: DateTime<Utc>) {
        self.last_success = Some(now);
    }
}
