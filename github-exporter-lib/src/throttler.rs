//! Fixed-rate request pacing.

use core::num::NonZeroU32;
use core::time::Duration;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::time::Instant;

const LOG_TARGET: &str = "  throttle";

/// Spaces out work so that at most `rate` units start per second.
///
/// Wrap in an `Arc` via [`Throttler::new`], then call [`Throttler::acquire`] before
/// each unit of work. Each caller reserves the next free slot and sleeps until it
/// arrives, so concurrent callers are admitted one interval apart in the order they
/// reserved. The first caller after an idle period is admitted immediately; idle
/// time does not accumulate into a burst allowance.
#[derive(Debug)]
pub struct Throttler {
    interval: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl Throttler {
    /// Create a throttler admitting `rate` callers per second.
    #[must_use]
    pub fn new(rate: NonZeroU32) -> Arc<Self> {
        Arc::new(Self {
            interval: Duration::from_secs(1) / rate.get(),
            next_slot: Mutex::new(None),
        })
    }

    /// The spacing enforced between admissions.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait until this caller's slot arrives.
    pub async fn acquire(&self) {
        let slot = {
            let mut next = self.next_slot.lock().unwrap_or_else(PoisonError::into_inner);
            let now = Instant::now();
            let slot = next.map_or(now, |reserved| reserved.max(now));
            *next = Some(slot + self.interval);
            slot
        };

        let now = Instant::now();
        if slot > now {
            log::trace!(target: LOG_TARGET, "Delaying request by {:?}", slot - now);
        }

        tokio::time::sleep_until(slot).await;
    }
}
