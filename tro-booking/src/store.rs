use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tro_core::payment::PaymentRecord;
use tro_core::CoreResult;
use uuid::Uuid;

use crate::models::{Booking, BookingStatus, JourneyKey, PassengerSnapshot, Referral};

/// Durable storage for bookings, passenger snapshots and referrals.
///
/// Every mutating operation is a single atomic unit against the store: a
/// status-guarded update either applies completely or not at all, so a crash
/// can never leave a booking in zero states or two. Guarded operations
/// return `Ok(None)` when the guard no longer matches, which makes retries
/// and webhook re-deliveries naturally idempotent.
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Insert a pending reservation, conditional on no active booking
    /// holding any of the requested seats for the same journey key. Fails
    /// with `SeatConflict` when the condition is violated; the check and the
    /// insert are one transaction.
    async fn insert_pending(&self, booking: &Booking) -> CoreResult<()>;

    async fn find(&self, id: Uuid) -> CoreResult<Option<Booking>>;

    async fn find_by_client_reference(&self, reference: &str) -> CoreResult<Option<Booking>>;

    async fn list_by_status(&self, status: BookingStatus) -> CoreResult<Vec<Booking>>;

    /// All seat-holding bookings for a journey, any active status.
    async fn list_active_for_journey(&self, journey: &JourneyKey) -> CoreResult<Vec<Booking>>;

    /// Move a booking from one of `from` to `to`. `reason` is recorded as
    /// the rejection reason when `to` is `Rejected`. Returns the updated
    /// booking, or `None` when the booking is missing or its current status
    /// is not in `from`.
    async fn update_status(
        &self,
        id: Uuid,
        from: &[BookingStatus],
        to: BookingStatus,
        reason: Option<&str>,
    ) -> CoreResult<Option<Booking>>;

    /// Finalize payment for the pending booking with this client reference:
    /// upsert the passenger snapshot and flip the booking to `Paid` with the
    /// given payment fields, as one transaction. `None` when no pending
    /// booking carries the reference (already processed, swept, or unknown).
    async fn confirm_paid(
        &self,
        client_reference: &str,
        payment: &PaymentRecord,
    ) -> CoreResult<Option<Booking>>;

    /// Reject every pending booking created at or before `cutoff`, recording
    /// `reason`. One atomic statement; returns how many were released.
    async fn sweep_pending_older_than(
        &self,
        cutoff: DateTime<Utc>,
        reason: &str,
    ) -> CoreResult<u64>;

    /// Permanently remove a booking record. Returns false when absent.
    async fn delete(&self, id: Uuid) -> CoreResult<bool>;

    async fn find_passenger(&self, phone: &str) -> CoreResult<Option<PassengerSnapshot>>;

    async fn create_referral(&self, name: &str, phone: &str) -> CoreResult<Referral>;

    /// Referral attribution is by exact phone-string match.
    async fn find_referral_by_phone(&self, phone: &str) -> CoreResult<Option<Referral>>;
}
