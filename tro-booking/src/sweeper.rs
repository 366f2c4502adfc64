use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tro_core::CoreResult;

use crate::models::REASON_PAYMENT_TIMEOUT;
use crate::store::BookingStore;

/// Default reservation TTL: five minutes from `created_at`.
pub const DEFAULT_TTL_SECONDS: i64 = 300;

/// Releases pending reservations that outlived the TTL.
///
/// Sweeping is advisory and best-effort: it runs synchronously before every
/// inventory read and every new-booking attempt, with a background tick
/// covering idle periods. Running it redundantly is safe; a booking can only
/// be swept once.
pub struct ReservationSweeper {
    store: Arc<dyn BookingStore>,
    ttl: Duration,
}

impl ReservationSweeper {
    pub fn new(store: Arc<dyn BookingStore>, ttl_seconds: i64) -> Self {
        Self {
            store,
            ttl: Duration::seconds(ttl_seconds),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Reject every pending booking with `created_at <= now - ttl` and
    /// return how many were released.
    pub async fn sweep(&self, now: DateTime<Utc>) -> CoreResult<u64> {
        let cutoff = now - self.ttl;
        let released = self
            .store
            .sweep_pending_older_than(cutoff, REASON_PAYMENT_TIMEOUT)
            .await?;
        if released > 0 {
            tracing::info!(released, "released expired pending reservations");
        }
        Ok(released)
    }
}
