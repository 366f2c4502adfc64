use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;
use tro_booking::models::{Booking, JourneyKey, NewBooking, PassengerSnapshot, SeatNumber};
use tro_booking::InventoryReport;
use tro_core::payment::CheckoutRequest;
use tro_core::CoreError;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/availability", get(availability))
        .route("/v1/bookings", post(create_booking))
        .route("/v1/bookings/{id}", get(get_booking))
}

#[derive(Debug, Deserialize)]
struct AvailabilityQuery {
    route_id: Uuid,
    bus_id: Uuid,
    travel_date: NaiveDate,
}

/// Seat map for one journey. Sweeps stale holds first, so the answer
/// reflects only live reservations.
async fn availability(
    State(state): State<AppState>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<InventoryReport>, ApiError> {
    let journey = JourneyKey {
        route_id: query.route_id,
        bus_id: query.bus_id,
        travel_date: query.travel_date,
    };
    let report = state.engine.resolve_inventory(&journey, Utc::now()).await?;
    Ok(Json(report))
}

#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub route_id: Uuid,
    pub bus_id: Uuid,
    pub travel_date: NaiveDate,
    pub seats: Vec<SeatNumber>,
    pub passenger: PassengerSnapshot,
    pub referral_phone: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateBookingResponse {
    pub booking_id: Uuid,
    pub client_reference: String,
    pub total_minor: i64,
    pub status: String,
    pub checkout_url: String,
}

/// Reserve seats and open a hosted-checkout session. The reservation is
/// created first so the gateway callback has a record to land on; if the
/// gateway refuses the session the reservation is rejected again rather
/// than left holding seats for the full TTL.
async fn create_booking(
    State(state): State<AppState>,
    Json(req): Json<CreateBookingRequest>,
) -> Result<Json<CreateBookingResponse>, ApiError> {
    let booking = state
        .engine
        .create_pending(NewBooking {
            route_id: req.route_id,
            bus_id: req.bus_id,
            travel_date: req.travel_date,
            seats: req.seats,
            passenger: req.passenger,
            referral_phone: req.referral_phone,
        })
        .await?;

    let checkout = CheckoutRequest {
        amount_minor: booking.total_minor,
        description: format!("{} to {}", booking.pickup, booking.destination),
        client_reference: booking.client_reference.clone(),
        customer_msisdn: booking.passenger.phone.clone(),
    };
    let session = match state.gateway.initiate(&checkout).await {
        Ok(session) => session,
        Err(e) => {
            if let Err(release_err) = state.engine.payment_failed(&booking.client_reference).await {
                tracing::error!(
                    booking_id = %booking.id,
                    error = %release_err,
                    "failed to release reservation after gateway refusal"
                );
            }
            return Err(e.into());
        }
    };

    info!(
        booking_id = %booking.id,
        checkout_url = %session.checkout_url,
        "checkout session opened"
    );
    Ok(Json(CreateBookingResponse {
        booking_id: booking.id,
        client_reference: booking.client_reference,
        total_minor: booking.total_minor,
        status: booking.status.as_str().to_string(),
        checkout_url: session.checkout_url,
    }))
}

async fn get_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>, ApiError> {
    let booking = state
        .engine
        .get(id)
        .await?
        .ok_or_else(|| CoreError::not_found(format!("booking {id}")))?;
    Ok(Json(booking))
}
