use std::collections::BTreeSet;

use serde::Serialize;

use crate::models::{Booking, BookingStatus, SeatNumber};

/// Seat occupancy for one journey, as shown on the seat map.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SeatInventory {
    /// Seats held by paid or approved bookings.
    pub occupied: BTreeSet<SeatNumber>,
    /// Seats held by pending (unconfirmed) reservations.
    pub pending: BTreeSet<SeatNumber>,
}

impl SeatInventory {
    /// Compute occupancy from the active bookings of a journey. Callers must
    /// run the expiry sweeper first so stale pending rows are excluded.
    ///
    /// A seat appearing in both a confirmed and a pending booking is an
    /// invariant violation; it is reported as occupied (paid wins) and
    /// logged so an operator can investigate.
    pub fn from_bookings(bookings: &[Booking]) -> Self {
        let mut occupied = BTreeSet::new();
        let mut pending = BTreeSet::new();

        for booking in bookings {
            match booking.status {
                BookingStatus::Paid | BookingStatus::Approved => {
                    occupied.extend(booking.seats.iter().copied());
                }
                BookingStatus::Pending => {
                    pending.extend(booking.seats.iter().copied());
                }
                BookingStatus::Rejected => {}
            }
        }

        let clashing: Vec<SeatNumber> = pending.intersection(&occupied).copied().collect();
        for seat in clashing {
            tracing::warn!(%seat, "seat held by both a confirmed and a pending booking");
            pending.remove(&seat);
        }

        SeatInventory { occupied, pending }
    }

    /// A seat is selectable only when neither set contains it.
    pub fn is_free(&self, seat: SeatNumber) -> bool {
        !self.occupied.contains(&seat) && !self.pending.contains(&seat)
    }
}

/// Inventory plus the number of stale reservations released on the way.
#[derive(Debug, Clone, Serialize)]
pub struct InventoryReport {
    #[serde(flatten)]
    pub inventory: SeatInventory,
    pub released: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{JourneyKey, PassengerSnapshot};
    use chrono::{NaiveDate, Utc};
    use uuid::Uuid;

    fn seat(n: u32) -> SeatNumber {
        SeatNumber::new(n).unwrap()
    }

    fn booking_with(status: BookingStatus, seats: &[u32]) -> Booking {
        let mut b = Booking::new_pending(
            JourneyKey {
                route_id: Uuid::new_v4(),
                bus_id: Uuid::new_v4(),
                travel_date: NaiveDate::from_ymd_opt(2024, 8, 15).unwrap(),
            },
            "Accra".into(),
            "Tamale".into(),
            "Standard".into(),
            seats.iter().map(|n| seat(*n)).collect(),
            4000,
            PassengerSnapshot {
                name: "Kofi".into(),
                phone: "+233240000000".into(),
                emergency_contact: "+233240000001".into(),
            },
            None,
            Utc::now(),
        );
        b.status = status;
        b
    }

    #[test]
    fn approved_counts_as_occupied() {
        let inv = SeatInventory::from_bookings(&[
            booking_with(BookingStatus::Paid, &[1]),
            booking_with(BookingStatus::Approved, &[2]),
            booking_with(BookingStatus::Pending, &[3]),
            booking_with(BookingStatus::Rejected, &[4]),
        ]);
        assert!(inv.occupied.contains(&seat(1)));
        assert!(inv.occupied.contains(&seat(2)));
        assert!(inv.pending.contains(&seat(3)));
        assert!(inv.is_free(seat(4)));
    }

    #[test]
    fn paid_wins_over_pending_for_the_same_seat() {
        let inv = SeatInventory::from_bookings(&[
            booking_with(BookingStatus::Paid, &[5]),
            booking_with(BookingStatus::Pending, &[5, 6]),
        ]);
        assert!(inv.occupied.contains(&seat(5)));
        assert!(!inv.pending.contains(&seat(5)));
        assert!(inv.pending.contains(&seat(6)));
        assert!(!inv.is_free(seat(5)));
    }
}
