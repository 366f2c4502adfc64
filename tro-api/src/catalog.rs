use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;
use tro_catalog::models::{Bus, Region, Route, Session};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/regions", get(list_regions))
        .route("/v1/routes", get(list_routes))
        .route("/v1/buses", get(list_buses))
        .route("/v1/sessions", get(list_sessions))
}

async fn list_regions(State(state): State<AppState>) -> Result<Json<Vec<Region>>, ApiError> {
    Ok(Json(state.catalog.list_regions().await?))
}

#[derive(Debug, Deserialize)]
struct RouteQuery {
    region_id: Option<Uuid>,
}

async fn list_routes(
    State(state): State<AppState>,
    Query(query): Query<RouteQuery>,
) -> Result<Json<Vec<Route>>, ApiError> {
    Ok(Json(state.catalog.list_active_routes(query.region_id).await?))
}

async fn list_buses(State(state): State<AppState>) -> Result<Json<Vec<Bus>>, ApiError> {
    Ok(Json(state.catalog.list_active_buses().await?))
}

#[derive(Debug, Deserialize)]
struct SessionQuery {
    route_id: Option<Uuid>,
}

async fn list_sessions(
    State(state): State<AppState>,
    Query(query): Query<SessionQuery>,
) -> Result<Json<Vec<Session>>, ApiError> {
    Ok(Json(state.catalog.list_sessions(query.route_id).await?))
}
