use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Administrative grouping for routes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Region {
    pub id: Uuid,
    pub name: String,
}

/// A bookable pickup/destination pair. The fare is frozen into each booking
/// at creation time; editing it later never touches existing bookings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    pub id: Uuid,
    pub pickup: String,
    pub destination: String,
    /// Fare per seat in minor units (pesewas).
    pub fare_minor: i64,
    pub active: bool,
    pub region_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bus {
    pub id: Uuid,
    pub number_plate: String,
    /// Valid seat numbers are `1..=capacity`.
    pub capacity: u32,
    pub bus_type: String,
    pub active: bool,
}

/// One scheduled departure. `(route_id, bus_id, departure_date)` is the
/// natural journey key. The key is date-only: two same-day departures on the
/// same route and bus would share seat inventory. The source system never
/// disambiguated by time and neither do we.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub route_id: Uuid,
    pub bus_id: Uuid,
    pub departure_date: NaiveDate,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewRoute {
    pub pickup: String,
    pub destination: String,
    pub fare_minor: i64,
    pub region_id: Uuid,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewBus {
    pub number_plate: String,
    pub capacity: u32,
    pub bus_type: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewSession {
    pub route_id: Uuid,
    pub bus_id: Uuid,
    pub departure_date: NaiveDate,
}
