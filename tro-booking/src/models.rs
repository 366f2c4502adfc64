use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{de, Deserialize, Serialize};
use tro_core::payment::PaymentRecord;
use tro_core::{CoreError, CoreResult};
use uuid::Uuid;

/// Rejection reason written by the expiry sweeper.
pub const REASON_PAYMENT_TIMEOUT: &str = "Payment timed out";
/// Rejection reason written when the gateway reports a failed checkout.
pub const REASON_PAYMENT_FAILED: &str = "Payment failed";

/// A validated seat number. Seats are 1-based; the upper bound is the
/// capacity of the bus serving the journey and is checked at booking time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SeatNumber(u32);

impl SeatNumber {
    pub fn new(n: u32) -> CoreResult<Self> {
        if n == 0 {
            return Err(CoreError::validation("seat numbers start at 1"));
        }
        Ok(SeatNumber(n))
    }

    /// Parse the external string form ("2", " 14 ").
    pub fn parse(raw: &str) -> CoreResult<Self> {
        let n: u32 = raw
            .trim()
            .parse()
            .map_err(|_| CoreError::Validation(format!("invalid seat number: {raw:?}")))?;
        SeatNumber::new(n)
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for SeatNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Seat numbers travel as strings on the wire.
impl Serialize for SeatNumber {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for SeatNumber {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SeatVisitor;

        impl<'de> de::Visitor<'de> for SeatVisitor {
            type Value = SeatNumber;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a seat number string or integer")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<SeatNumber, E> {
                SeatNumber::parse(v).map_err(E::custom)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<SeatNumber, E> {
                let n = u32::try_from(v).map_err(E::custom)?;
                SeatNumber::new(n).map_err(E::custom)
            }
        }

        deserializer.deserialize_any(SeatVisitor)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Approved,
    Paid,
    Rejected,
}

/// Statuses that hold seats. Rejected bookings never do.
pub const ACTIVE_STATUSES: [BookingStatus; 3] = [
    BookingStatus::Pending,
    BookingStatus::Approved,
    BookingStatus::Paid,
];

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Approved => "approved",
            BookingStatus::Paid => "paid",
            BookingStatus::Rejected => "rejected",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(BookingStatus::Pending),
            "approved" => Some(BookingStatus::Approved),
            "paid" => Some(BookingStatus::Paid),
            "rejected" => Some(BookingStatus::Rejected),
            _ => None,
        }
    }

    pub fn holds_seats(&self) -> bool {
        ACTIVE_STATUSES.contains(self)
    }
}

/// The `(route, bus, calendar date)` triple identifying one journey's seat
/// inventory. Date-only on purpose; see `tro_catalog::models::Session`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JourneyKey {
    pub route_id: Uuid,
    pub bus_id: Uuid,
    pub travel_date: NaiveDate,
}

/// Passenger details denormalized into the booking at creation time; this is
/// a snapshot, not a live reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassengerSnapshot {
    pub name: String,
    pub phone: String,
    pub emergency_contact: String,
}

/// A referrer; the phone number doubles as the referral code entered at
/// booking time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Referral {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    /// Stable external payment reference; equal to the booking's own id in
    /// simple form, assigned once and never reused.
    pub client_reference: String,
    pub passenger: PassengerSnapshot,
    pub journey: JourneyKey,
    pub pickup: String,
    pub destination: String,
    pub bus_type: String,
    pub seats: Vec<SeatNumber>,
    /// `fare_minor * seats.len()`, frozen at creation.
    pub total_minor: i64,
    pub referral_id: Option<Uuid>,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub rejection_reason: Option<String>,
    pub payment: Option<PaymentRecord>,
}

impl Booking {
    /// Build a fresh pending reservation. The client reference is derived
    /// from the new id so it is known before any gateway round-trip.
    #[allow(clippy::too_many_arguments)]
    pub fn new_pending(
        journey: JourneyKey,
        pickup: String,
        destination: String,
        bus_type: String,
        seats: Vec<SeatNumber>,
        fare_minor: i64,
        passenger: PassengerSnapshot,
        referral_id: Option<Uuid>,
        created_at: DateTime<Utc>,
    ) -> Self {
        let id = Uuid::new_v4();
        let total_minor = fare_minor * seats.len() as i64;
        Booking {
            id,
            client_reference: id.simple().to_string(),
            passenger,
            journey,
            pickup,
            destination,
            bus_type,
            seats,
            total_minor,
            referral_id,
            status: BookingStatus::Pending,
            created_at,
            rejection_reason: None,
            payment: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status.holds_seats()
    }
}

/// Incoming booking request, already past wire-level parsing.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub route_id: Uuid,
    pub bus_id: Uuid,
    pub travel_date: NaiveDate,
    pub seats: Vec<SeatNumber>,
    pub passenger: PassengerSnapshot,
    pub referral_phone: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seat_number_rejects_zero_and_garbage() {
        assert!(SeatNumber::new(0).is_err());
        assert!(SeatNumber::parse("0").is_err());
        assert!(SeatNumber::parse("A3").is_err());
        assert_eq!(SeatNumber::parse(" 12 ").unwrap().get(), 12);
    }

    #[test]
    fn seat_number_serializes_as_string() {
        let seat = SeatNumber::new(7).unwrap();
        assert_eq!(serde_json::to_string(&seat).unwrap(), "\"7\"");
        let back: SeatNumber = serde_json::from_str("\"7\"").unwrap();
        assert_eq!(back, seat);
        let from_int: SeatNumber = serde_json::from_str("7").unwrap();
        assert_eq!(from_int, seat);
    }

    #[test]
    fn client_reference_matches_id() {
        let journey = JourneyKey {
            route_id: Uuid::new_v4(),
            bus_id: Uuid::new_v4(),
            travel_date: NaiveDate::from_ymd_opt(2024, 8, 15).unwrap(),
        };
        let booking = Booking::new_pending(
            journey,
            "Accra".into(),
            "Kumasi".into(),
            "VIP".into(),
            vec![SeatNumber::new(1).unwrap()],
            5000,
            PassengerSnapshot {
                name: "Ama".into(),
                phone: "+233200000000".into(),
                emergency_contact: "+233200000001".into(),
            },
            None,
            Utc::now(),
        );
        assert_eq!(booking.client_reference, booking.id.simple().to_string());
        assert_eq!(booking.total_minor, 5000);
        assert_eq!(booking.status, BookingStatus::Pending);
    }
}
