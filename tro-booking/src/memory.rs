use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tro_catalog::models::{Bus, NewBus, NewRoute, NewSession, Region, Route, Session};
use tro_catalog::CatalogRepository;
use tro_core::payment::PaymentRecord;
use tro_core::{CoreError, CoreResult};
use uuid::Uuid;

use crate::models::{Booking, BookingStatus, JourneyKey, PassengerSnapshot, Referral};
use crate::store::BookingStore;

#[derive(Default)]
struct Inner {
    bookings: HashMap<Uuid, Booking>,
    passengers: HashMap<String, PassengerSnapshot>,
    referrals: Vec<Referral>,
    regions: Vec<Region>,
    routes: Vec<Route>,
    buses: Vec<Bus>,
    sessions: Vec<Session>,
}

/// In-process store backing the domain tests and offline mode. A single
/// mutex gives every operation the same all-or-nothing semantics the
/// Postgres store gets from transactions.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> CoreResult<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| CoreError::data_access("memory store lock poisoned"))
    }
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn insert_pending(&self, booking: &Booking) -> CoreResult<()> {
        let mut inner = self.lock()?;
        if inner
            .bookings
            .values()
            .any(|b| b.client_reference == booking.client_reference)
        {
            return Err(CoreError::data_access("duplicate client reference"));
        }
        let clash = inner.bookings.values().find(|b| {
            b.is_active()
                && b.journey == booking.journey
                && b.seats.iter().any(|s| booking.seats.contains(s))
        });
        if let Some(holder) = clash {
            let taken: Vec<String> = holder
                .seats
                .iter()
                .filter(|s| booking.seats.contains(s))
                .map(|s| s.to_string())
                .collect();
            return Err(CoreError::SeatConflict(taken.join(", ")));
        }
        inner.bookings.insert(booking.id, booking.clone());
        Ok(())
    }

    async fn find(&self, id: Uuid) -> CoreResult<Option<Booking>> {
        Ok(self.lock()?.bookings.get(&id).cloned())
    }

    async fn find_by_client_reference(&self, reference: &str) -> CoreResult<Option<Booking>> {
        Ok(self
            .lock()?
            .bookings
            .values()
            .find(|b| b.client_reference == reference)
            .cloned())
    }

    async fn list_by_status(&self, status: BookingStatus) -> CoreResult<Vec<Booking>> {
        let mut found: Vec<Booking> = self
            .lock()?
            .bookings
            .values()
            .filter(|b| b.status == status)
            .cloned()
            .collect();
        found.sort_by_key(|b| b.created_at);
        Ok(found)
    }

    async fn list_active_for_journey(&self, journey: &JourneyKey) -> CoreResult<Vec<Booking>> {
        Ok(self
            .lock()?
            .bookings
            .values()
            .filter(|b| b.is_active() && b.journey == *journey)
            .cloned()
            .collect())
    }

    async fn update_status(
        &self,
        id: Uuid,
        from: &[BookingStatus],
        to: BookingStatus,
        reason: Option<&str>,
    ) -> CoreResult<Option<Booking>> {
        let mut inner = self.lock()?;
        let Some(booking) = inner.bookings.get_mut(&id) else {
            return Ok(None);
        };
        if !from.contains(&booking.status) {
            return Ok(None);
        }
        booking.status = to;
        booking.rejection_reason = if to == BookingStatus::Rejected {
            reason.map(str::to_string)
        } else {
            None
        };
        Ok(Some(booking.clone()))
    }

    async fn confirm_paid(
        &self,
        client_reference: &str,
        payment: &PaymentRecord,
    ) -> CoreResult<Option<Booking>> {
        let mut inner = self.lock()?;
        let Some(id) = inner
            .bookings
            .values()
            .find(|b| b.client_reference == client_reference && b.status == BookingStatus::Pending)
            .map(|b| b.id)
        else {
            return Ok(None);
        };
        let snapshot = inner.bookings[&id].passenger.clone();
        inner
            .passengers
            .insert(snapshot.phone.clone(), snapshot);
        let Some(booking) = inner.bookings.get_mut(&id) else {
            return Ok(None);
        };
        booking.status = BookingStatus::Paid;
        booking.payment = Some(payment.clone());
        Ok(Some(booking.clone()))
    }

    async fn sweep_pending_older_than(
        &self,
        cutoff: DateTime<Utc>,
        reason: &str,
    ) -> CoreResult<u64> {
        let mut inner = self.lock()?;
        let mut released = 0;
        for booking in inner.bookings.values_mut() {
            if booking.status == BookingStatus::Pending && booking.created_at <= cutoff {
                booking.status = BookingStatus::Rejected;
                booking.rejection_reason = Some(reason.to_string());
                released += 1;
            }
        }
        Ok(released)
    }

    async fn delete(&self, id: Uuid) -> CoreResult<bool> {
        Ok(self.lock()?.bookings.remove(&id).is_some())
    }

    async fn find_passenger(&self, phone: &str) -> CoreResult<Option<PassengerSnapshot>> {
        Ok(self.lock()?.passengers.get(phone).cloned())
    }

    async fn create_referral(&self, name: &str, phone: &str) -> CoreResult<Referral> {
        let referral = Referral {
            id: Uuid::new_v4(),
            name: name.to_string(),
            phone: phone.to_string(),
        };
        self.lock()?.referrals.push(referral.clone());
        Ok(referral)
    }

    async fn find_referral_by_phone(&self, phone: &str) -> CoreResult<Option<Referral>> {
        Ok(self
            .lock()?
            .referrals
            .iter()
            .find(|r| r.phone == phone)
            .cloned())
    }
}

#[async_trait]
impl CatalogRepository for MemoryStore {
    async fn list_regions(&self) -> CoreResult<Vec<Region>> {
        Ok(self.lock()?.regions.clone())
    }

    async fn create_region(&self, name: &str) -> CoreResult<Region> {
        let region = Region {
            id: Uuid::new_v4(),
            name: name.to_string(),
        };
        self.lock()?.regions.push(region.clone());
        Ok(region)
    }

    async fn list_active_routes(&self, region_id: Option<Uuid>) -> CoreResult<Vec<Route>> {
        Ok(self
            .lock()?
            .routes
            .iter()
            .filter(|r| r.active && region_id.map_or(true, |id| r.region_id == id))
            .cloned()
            .collect())
    }

    async fn find_route(&self, id: Uuid) -> CoreResult<Option<Route>> {
        Ok(self.lock()?.routes.iter().find(|r| r.id == id).cloned())
    }

    async fn create_route(&self, route: &NewRoute) -> CoreResult<Route> {
        let created = Route {
            id: Uuid::new_v4(),
            pickup: route.pickup.clone(),
            destination: route.destination.clone(),
            fare_minor: route.fare_minor,
            active: true,
            region_id: route.region_id,
        };
        self.lock()?.routes.push(created.clone());
        Ok(created)
    }

    async fn set_route_active(&self, id: Uuid, active: bool) -> CoreResult<bool> {
        let mut inner = self.lock()?;
        match inner.routes.iter_mut().find(|r| r.id == id) {
            Some(route) => {
                route.active = active;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_active_buses(&self) -> CoreResult<Vec<Bus>> {
        Ok(self
            .lock()?
            .buses
            .iter()
            .filter(|b| b.active)
            .cloned()
            .collect())
    }

    async fn find_bus(&self, id: Uuid) -> CoreResult<Option<Bus>> {
        Ok(self.lock()?.buses.iter().find(|b| b.id == id).cloned())
    }

    async fn create_bus(&self, bus: &NewBus) -> CoreResult<Bus> {
        let created = Bus {
            id: Uuid::new_v4(),
            number_plate: bus.number_plate.clone(),
            capacity: bus.capacity,
            bus_type: bus.bus_type.clone(),
            active: true,
        };
        self.lock()?.buses.push(created.clone());
        Ok(created)
    }

    async fn set_bus_active(&self, id: Uuid, active: bool) -> CoreResult<bool> {
        let mut inner = self.lock()?;
        match inner.buses.iter_mut().find(|b| b.id == id) {
            Some(bus) => {
                bus.active = active;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_sessions(&self, route_id: Option<Uuid>) -> CoreResult<Vec<Session>> {
        Ok(self
            .lock()?
            .sessions
            .iter()
            .filter(|s| route_id.map_or(true, |id| s.route_id == id))
            .cloned()
            .collect())
    }

    async fn create_session(&self, session: &NewSession) -> CoreResult<Session> {
        let created = Session {
            id: Uuid::new_v4(),
            route_id: session.route_id,
            bus_id: session.bus_id,
            departure_date: session.departure_date,
        };
        self.lock()?.sessions.push(created.clone());
        Ok(created)
    }
}
