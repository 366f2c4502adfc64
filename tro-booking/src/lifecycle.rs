use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tro_catalog::CatalogRepository;
use tro_core::identity::AdminRole;
use tro_core::payment::PaymentRecord;
use tro_core::{CoreError, CoreResult};
use uuid::Uuid;

use crate::inventory::{InventoryReport, SeatInventory};
use crate::models::{
    Booking, BookingStatus, JourneyKey, NewBooking, Referral, REASON_PAYMENT_FAILED,
};
use crate::store::BookingStore;
use crate::sweeper::ReservationSweeper;

/// The booking-lifecycle state machine.
///
/// States: pending → {approved, paid, rejected}; approved → {pending,
/// rejected}; paid → rejected only through an operator seat release. Every
/// transition is a single status-guarded store operation, so concurrent
/// conflicting attempts resolve to exactly one winner and the rest no-op.
pub struct BookingEngine {
    store: Arc<dyn BookingStore>,
    catalog: Arc<dyn CatalogRepository>,
    sweeper: ReservationSweeper,
}

impl BookingEngine {
    pub fn new(
        store: Arc<dyn BookingStore>,
        catalog: Arc<dyn CatalogRepository>,
        ttl_seconds: i64,
    ) -> Self {
        let sweeper = ReservationSweeper::new(store.clone(), ttl_seconds);
        Self {
            store,
            catalog,
            sweeper,
        }
    }

    /// Create a pending reservation. This is the only seat-acquisition
    /// point: the store re-verifies seat freedom inside the insert
    /// transaction and fails with `SeatConflict` when another active booking
    /// already holds one of the requested seats.
    pub async fn create_pending(&self, request: NewBooking) -> CoreResult<Booking> {
        self.sweeper.sweep(Utc::now()).await?;

        if request.seats.is_empty() {
            return Err(CoreError::validation("select at least one seat"));
        }
        let mut seen = HashSet::new();
        for seat in &request.seats {
            if !seen.insert(*seat) {
                return Err(CoreError::Validation(format!("seat {seat} selected twice")));
            }
        }

        let route = self
            .catalog
            .find_route(request.route_id)
            .await?
            .ok_or_else(|| CoreError::validation("unknown route"))?;
        if !route.active {
            return Err(CoreError::validation("route is not open for booking"));
        }
        if route.fare_minor <= 0 {
            return Err(CoreError::validation("route has no fare configured"));
        }

        let bus = self
            .catalog
            .find_bus(request.bus_id)
            .await?
            .ok_or_else(|| CoreError::validation("unknown bus"))?;
        if !bus.active {
            return Err(CoreError::validation("bus is not in service"));
        }
        for seat in &request.seats {
            if seat.get() > bus.capacity {
                return Err(CoreError::Validation(format!(
                    "seat {seat} exceeds bus capacity {}",
                    bus.capacity
                )));
            }
        }

        let referral_id = match request.referral_phone.as_deref().map(str::trim) {
            Some(phone) if !phone.is_empty() => self
                .store
                .find_referral_by_phone(phone)
                .await?
                .map(|r| r.id),
            _ => None,
        };

        let booking = Booking::new_pending(
            JourneyKey {
                route_id: route.id,
                bus_id: bus.id,
                travel_date: request.travel_date,
            },
            route.pickup.clone(),
            route.destination.clone(),
            bus.bus_type.clone(),
            request.seats,
            route.fare_minor,
            request.passenger,
            referral_id,
            Utc::now(),
        );

        self.store.insert_pending(&booking).await?;
        tracing::info!(
            booking_id = %booking.id,
            client_reference = %booking.client_reference,
            total_minor = booking.total_minor,
            "created pending reservation"
        );
        Ok(booking)
    }

    /// Finalize a payment reported by the gateway. A missing pending record
    /// is an idempotent no-op: webhooks get re-delivered and sweeps race
    /// deliveries, neither is an error.
    pub async fn confirm_paid(
        &self,
        client_reference: &str,
        payment: PaymentRecord,
    ) -> CoreResult<Option<Booking>> {
        let confirmed = self.store.confirm_paid(client_reference, &payment).await?;
        match &confirmed {
            Some(booking) => {
                tracing::info!(booking_id = %booking.id, %client_reference, "booking paid")
            }
            None => tracing::info!(
                %client_reference,
                "payment confirmation for unknown or already-finalized reference; ignoring"
            ),
        }
        Ok(confirmed)
    }

    /// Admin override: mark a pending booking paid without the gateway.
    pub async fn confirm_paid_manual(&self, id: Uuid) -> CoreResult<Option<Booking>> {
        let Some(booking) = self.store.find(id).await? else {
            return Ok(None);
        };
        if booking.status != BookingStatus::Pending {
            return Ok(None);
        }
        let mut payment = PaymentRecord::manual();
        payment.amount_paid_minor = Some(booking.total_minor);
        self.confirm_paid(&booking.client_reference, payment).await
    }

    pub async fn approve(&self, id: Uuid) -> CoreResult<Option<Booking>> {
        self.store
            .update_status(id, &[BookingStatus::Pending], BookingStatus::Approved, None)
            .await
    }

    /// Send an approved booking back for re-review.
    pub async fn unapprove(&self, id: Uuid) -> CoreResult<Option<Booking>> {
        self.store
            .update_status(id, &[BookingStatus::Approved], BookingStatus::Pending, None)
            .await
    }

    pub async fn reject(&self, id: Uuid, reason: &str) -> CoreResult<Option<Booking>> {
        self.store
            .update_status(
                id,
                &[BookingStatus::Pending, BookingStatus::Approved],
                BookingStatus::Rejected,
                Some(reason),
            )
            .await
    }

    /// Operator-initiated cancellation of a pending or paid booking to free
    /// its seats. The reason distinguishes this from TTL expiry or a
    /// gateway-reported failure.
    pub async fn release_seat(&self, id: Uuid, reason: &str) -> CoreResult<Option<Booking>> {
        self.store
            .update_status(
                id,
                &[BookingStatus::Pending, BookingStatus::Paid],
                BookingStatus::Rejected,
                Some(reason),
            )
            .await
    }

    /// Gateway reported a failed checkout. The reservation is rejected with
    /// an audit reason rather than deleted, mirroring TTL expiry.
    pub async fn payment_failed(&self, client_reference: &str) -> CoreResult<Option<Booking>> {
        let Some(booking) = self.store.find_by_client_reference(client_reference).await? else {
            return Ok(None);
        };
        self.store
            .update_status(
                booking.id,
                &[BookingStatus::Pending],
                BookingStatus::Rejected,
                Some(REASON_PAYMENT_FAILED),
            )
            .await
    }

    /// Permanently delete a booking record, any status. Super-admin only.
    pub async fn purge(&self, id: Uuid, role: AdminRole) -> CoreResult<bool> {
        if !role.can_purge_bookings() {
            return Err(CoreError::Forbidden(
                "only a super-admin may delete bookings".into(),
            ));
        }
        self.store.delete(id).await
    }

    pub async fn sweep_expired(&self, now: DateTime<Utc>) -> CoreResult<u64> {
        self.sweeper.sweep(now).await
    }

    /// Seat map for a journey: sweep stale holds, then report occupancy.
    pub async fn resolve_inventory(
        &self,
        journey: &JourneyKey,
        now: DateTime<Utc>,
    ) -> CoreResult<InventoryReport> {
        let released = self.sweeper.sweep(now).await?;
        let bookings = self.store.list_active_for_journey(journey).await?;
        Ok(InventoryReport {
            inventory: SeatInventory::from_bookings(&bookings),
            released,
        })
    }

    /// Register a referral partner. Bookings quote the partner's phone
    /// number and attribution happens at creation time.
    pub async fn create_referral(&self, name: &str, phone: &str) -> CoreResult<Referral> {
        let name = name.trim();
        let phone = phone.trim();
        if name.is_empty() || phone.is_empty() {
            return Err(CoreError::validation(
                "referral needs a name and a phone number",
            ));
        }
        self.store.create_referral(name, phone).await
    }

    pub async fn get(&self, id: Uuid) -> CoreResult<Option<Booking>> {
        self.store.find(id).await
    }

    pub async fn list(&self, status: BookingStatus) -> CoreResult<Vec<Booking>> {
        self.store.list_by_status(status).await
    }
}
