pub mod models;

use async_trait::async_trait;
use tro_core::CoreResult;
use uuid::Uuid;

use crate::models::{Bus, NewBus, NewRoute, NewSession, Region, Route, Session};

/// Read-mostly reference data the booking engine depends on. List operations
/// return empty vectors when nothing matches; an empty catalog is "nothing
/// available", not an error. Mutations are plain admin CRUD.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn list_regions(&self) -> CoreResult<Vec<Region>>;
    async fn create_region(&self, name: &str) -> CoreResult<Region>;

    /// Only active routes are offered for booking.
    async fn list_active_routes(&self, region_id: Option<Uuid>) -> CoreResult<Vec<Route>>;
    async fn find_route(&self, id: Uuid) -> CoreResult<Option<Route>>;
    async fn create_route(&self, route: &NewRoute) -> CoreResult<Route>;
    async fn set_route_active(&self, id: Uuid, active: bool) -> CoreResult<bool>;

    async fn list_active_buses(&self) -> CoreResult<Vec<Bus>>;
    async fn find_bus(&self, id: Uuid) -> CoreResult<Option<Bus>>;
    async fn create_bus(&self, bus: &NewBus) -> CoreResult<Bus>;
    async fn set_bus_active(&self, id: Uuid, active: bool) -> CoreResult<bool>;

    async fn list_sessions(&self, route_id: Option<Uuid>) -> CoreResult<Vec<Session>>;
    async fn create_session(&self, session: &NewSession) -> CoreResult<Session>;
}
