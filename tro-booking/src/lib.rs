pub mod inventory;
pub mod lifecycle;
pub mod memory;
pub mod models;
pub mod store;
pub mod sweeper;

pub use inventory::{InventoryReport, SeatInventory};
pub use lifecycle::BookingEngine;
pub use memory::MemoryStore;
pub use models::{Booking, BookingStatus, JourneyKey, NewBooking, SeatNumber};
pub use store::BookingStore;
pub use sweeper::{ReservationSweeper, DEFAULT_TTL_SECONDS};
