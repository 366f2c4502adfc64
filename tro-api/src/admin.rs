use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{delete, get, patch, post},
    Json, Router,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;
use tro_booking::models::{Booking, BookingStatus, Referral};
use tro_catalog::models::{Bus, NewBus, NewRoute, NewSession, Region, Route, Session};
use tro_core::identity::AdminRole;
use tro_core::CoreError;

pub const ROLE_HEADER: &str = "x-admin-role";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/admin/bookings", get(list_bookings))
        .route("/v1/admin/bookings/{id}/approve", post(approve_booking))
        .route("/v1/admin/bookings/{id}/unapprove", post(unapprove_booking))
        .route("/v1/admin/bookings/{id}/reject", post(reject_booking))
        .route(
            "/v1/admin/bookings/{id}/confirm-payment",
            post(confirm_payment),
        )
        .route("/v1/admin/bookings/{id}/release", post(release_seat))
        .route("/v1/admin/bookings/{id}", delete(purge_booking))
        .route("/v1/admin/regions", post(create_region))
        .route("/v1/admin/routes", post(create_route))
        .route("/v1/admin/routes/{id}", patch(set_route_active))
        .route("/v1/admin/buses", post(create_bus))
        .route("/v1/admin/buses/{id}", patch(set_bus_active))
        .route("/v1/admin/sessions", post(create_session))
        .route("/v1/admin/referrals", post(create_referral))
}

/// The external auth layer authenticates back-office users and forwards the
/// resolved role in a header. No role, no access.
fn require_role(headers: &HeaderMap) -> Result<AdminRole, ApiError> {
    headers
        .get(ROLE_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(AdminRole::parse)
        .ok_or_else(|| CoreError::Forbidden("admin role required".into()).into())
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    status: String,
}

async fn list_bookings(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Booking>>, ApiError> {
    require_role(&headers)?;
    let status = BookingStatus::parse(&query.status)
        .ok_or_else(|| CoreError::Validation(format!("unknown status {:?}", query.status)))?;
    Ok(Json(state.engine.list(status).await?))
}

fn found(booking: Option<Booking>, id: Uuid) -> Result<Json<Booking>, ApiError> {
    booking
        .map(Json)
        .ok_or_else(|| CoreError::not_found(format!("no booking {id} in an eligible state")).into())
}

async fn approve_booking(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>, ApiError> {
    require_role(&headers)?;
    found(state.engine.approve(id).await?, id)
}

async fn unapprove_booking(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>, ApiError> {
    require_role(&headers)?;
    found(state.engine.unapprove(id).await?, id)
}

#[derive(Debug, Deserialize, Default)]
struct ReasonBody {
    reason: Option<String>,
}

async fn reject_booking(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    body: Option<Json<ReasonBody>>,
) -> Result<Json<Booking>, ApiError> {
    require_role(&headers)?;
    let body = body.map(|Json(b)| b).unwrap_or_default();
    let reason = body.reason.as_deref().unwrap_or("Rejected by admin");
    found(state.engine.reject(id, reason).await?, id)
}

async fn confirm_payment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>, ApiError> {
    require_role(&headers)?;
    found(state.engine.confirm_paid_manual(id).await?, id)
}

async fn release_seat(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    body: Option<Json<ReasonBody>>,
) -> Result<Json<Booking>, ApiError> {
    require_role(&headers)?;
    let body = body.map(|Json(b)| b).unwrap_or_default();
    let reason = body.reason.as_deref().unwrap_or("Seat released by operator");
    found(state.engine.release_seat(id, reason).await?, id)
}

async fn purge_booking(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let role = require_role(&headers)?;
    if state.engine.purge(id, role).await? {
        info!(booking_id = %id, "booking purged");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(CoreError::not_found(format!("booking {id}")).into())
    }
}

#[derive(Debug, Deserialize)]
struct CreateRegionBody {
    name: String,
}

async fn create_region(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CreateRegionBody>,
) -> Result<Json<Region>, ApiError> {
    require_role(&headers)?;
    Ok(Json(state.catalog.create_region(&body.name).await?))
}

async fn create_route(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<NewRoute>,
) -> Result<Json<Route>, ApiError> {
    require_role(&headers)?;
    if body.fare_minor <= 0 {
        return Err(CoreError::validation("route fare must be positive").into());
    }
    Ok(Json(state.catalog.create_route(&body).await?))
}

#[derive(Debug, Deserialize)]
struct ActiveBody {
    active: bool,
}

async fn set_route_active(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(body): Json<ActiveBody>,
) -> Result<StatusCode, ApiError> {
    require_role(&headers)?;
    if state.catalog.set_route_active(id, body.active).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(CoreError::not_found(format!("route {id}")).into())
    }
}

async fn create_bus(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<NewBus>,
) -> Result<Json<Bus>, ApiError> {
    require_role(&headers)?;
    if body.capacity == 0 {
        return Err(CoreError::validation("bus capacity must be at least 1").into());
    }
    Ok(Json(state.catalog.create_bus(&body).await?))
}

async fn set_bus_active(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(body): Json<ActiveBody>,
) -> Result<StatusCode, ApiError> {
    require_role(&headers)?;
    if state.catalog.set_bus_active(id, body.active).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(CoreError::not_found(format!("bus {id}")).into())
    }
}

async fn create_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<NewSession>,
) -> Result<Json<Session>, ApiError> {
    require_role(&headers)?;
    Ok(Json(state.catalog.create_session(&body).await?))
}

#[derive(Debug, Deserialize)]
struct CreateReferralBody {
    name: String,
    phone: String,
}

async fn create_referral(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CreateReferralBody>,
) -> Result<Json<Referral>, ApiError> {
    require_role(&headers)?;
    Ok(Json(
        state.engine.create_referral(&body.name, &body.phone).await?,
    ))
}
