use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tro_catalog::models::{Bus, NewBus, NewRoute, NewSession, Region, Route, Session};
use tro_catalog::CatalogRepository;
use tro_core::{CoreError, CoreResult};
use uuid::Uuid;

pub struct PgCatalogRepository {
    pool: PgPool,
}

impl PgCatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn db_err(context: &'static str) -> impl Fn(sqlx::Error) -> CoreError {
    move |e| {
        tracing::error!(error = %e, context, "database operation failed");
        CoreError::data_access(e)
    }
}

fn route_from_row(row: &PgRow) -> CoreResult<Route> {
    Ok(Route {
        id: row.try_get("id").map_err(CoreError::data_access)?,
        pickup: row.try_get("pickup").map_err(CoreError::data_access)?,
        destination: row.try_get("destination").map_err(CoreError::data_access)?,
        fare_minor: row.try_get("fare_minor").map_err(CoreError::data_access)?,
        active: row.try_get("active").map_err(CoreError::data_access)?,
        region_id: row.try_get("region_id").map_err(CoreError::data_access)?,
    })
}

fn bus_from_row(row: &PgRow) -> CoreResult<Bus> {
    let capacity: i32 = row.try_get("capacity").map_err(CoreError::data_access)?;
    Ok(Bus {
        id: row.try_get("id").map_err(CoreError::data_access)?,
        number_plate: row.try_get("number_plate").map_err(CoreError::data_access)?,
        capacity: capacity.max(0) as u32,
        bus_type: row.try_get("bus_type").map_err(CoreError::data_access)?,
        active: row.try_get("active").map_err(CoreError::data_access)?,
    })
}

fn session_from_row(row: &PgRow) -> CoreResult<Session> {
    Ok(Session {
        id: row.try_get("id").map_err(CoreError::data_access)?,
        route_id: row.try_get("route_id").map_err(CoreError::data_access)?,
        bus_id: row.try_get("bus_id").map_err(CoreError::data_access)?,
        departure_date: row
            .try_get("departure_date")
            .map_err(CoreError::data_access)?,
    })
}

#[async_trait]
impl CatalogRepository for PgCatalogRepository {
    async fn list_regions(&self) -> CoreResult<Vec<Region>> {
        let rows = sqlx::query("SELECT id, name FROM regions ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(db_err("list_regions"))?;
        rows.iter()
            .map(|r| -> CoreResult<Region> {
                Ok(Region {
                    id: r.try_get("id").map_err(CoreError::data_access)?,
                    name: r.try_get("name").map_err(CoreError::data_access)?,
                })
            })
            .collect()
    }

    async fn create_region(&self, name: &str) -> CoreResult<Region> {
        let region = Region {
            id: Uuid::new_v4(),
            name: name.to_string(),
        };
        sqlx::query("INSERT INTO regions (id, name) VALUES ($1, $2)")
            .bind(region.id)
            .bind(&region.name)
            .execute(&self.pool)
            .await
            .map_err(db_err("create_region"))?;
        Ok(region)
    }

    async fn list_active_routes(&self, region_id: Option<Uuid>) -> CoreResult<Vec<Route>> {
        let rows = match region_id {
            Some(region_id) => {
                sqlx::query(
                    "SELECT id, pickup, destination, fare_minor, active, region_id \
                     FROM routes WHERE active AND region_id = $1 ORDER BY pickup, destination",
                )
                .bind(region_id)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(
                    "SELECT id, pickup, destination, fare_minor, active, region_id \
                     FROM routes WHERE active ORDER BY pickup, destination",
                )
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(db_err("list_active_routes"))?;
        rows.iter().map(route_from_row).collect()
    }

    async fn find_route(&self, id: Uuid) -> CoreResult<Option<Route>> {
        let row = sqlx::query(
            "SELECT id, pickup, destination, fare_minor, active, region_id \
             FROM routes WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("find_route"))?;
        row.as_ref().map(route_from_row).transpose()
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
        sqlx::query(
            "INSERT INTO routes (id, pickup, destination, fare_minor, active, region_id) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(created.id)
        .bind(&created.pickup)
        .bind(&created.destination)
        .bind(created.fare_minor)
        .bind(created.active)
        .bind(created.region_id)
        .execute(&self.pool)
        .await
        .map_err(db_err("create_route"))?;
        Ok(created)
    }

    async fn set_route_active(&self, id: Uuid, active: bool) -> CoreResult<bool> {
        let result = sqlx::query("UPDATE routes SET active = $2 WHERE id = $1")
            .bind(id)
            .bind(active)
            .execute(&self.pool)
            .await
            .map_err(db_err("set_route_active"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_active_buses(&self) -> CoreResult<Vec<Bus>> {
        let rows = sqlx::query(
            "SELECT id, number_plate, capacity, bus_type, active \
             FROM buses WHERE active ORDER BY number_plate",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("list_active_buses"))?;
        rows.iter().map(bus_from_row).collect()
    }

    async fn find_bus(&self, id: Uuid) -> CoreResult<Option<Bus>> {
        let row = sqlx::query(
            "SELECT id, number_plate, capacity, bus_type, active FROM buses WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("find_bus"))?;
        row.as_ref().map(bus_from_row).transpose()
    }

    async fn create_bus(&self, bus: &NewBus) -> CoreResult<Bus> {
        let created = Bus {
            id: Uuid::new_v4(),
            number_plate: bus.number_plate.clone(),
            capacity: bus.capacity,
            bus_type: bus.bus_type.clone(),
            active: true,
        };
        sqlx::query(
            "INSERT INTO buses (id, number_plate, capacity, bus_type, active) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(created.id)
        .bind(&created.number_plate)
        .bind(created.capacity as i32)
        .bind(&created.bus_type)
        .bind(created.active)
        .execute(&self.pool)
        .await
        .map_err(db_err("create_bus"))?;
        Ok(created)
    }

    async fn set_bus_active(&self, id: Uuid, active: bool) -> CoreResult<bool> {
        let result = sqlx::query("UPDATE buses SET active = $2 WHERE id = $1")
            .bind(id)
            .bind(active)
            .execute(&self.pool)
            .await
            .map_err(db_err("set_bus_active"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_sessions(&self, route_id: Option<Uuid>) -> CoreResult<Vec<Session>> {
        let rows = match route_id {
            Some(route_id) => {
                sqlx::query(
                    "SELECT id, route_id, bus_id, departure_date \
                     FROM sessions WHERE route_id = $1 ORDER BY departure_date",
                )
                .bind(route_id)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(
                    "SELECT id, route_id, bus_id, departure_date \
                     FROM sessions ORDER BY departure_date",
                )
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(db_err("list_sessions"))?;
        rows.iter().map(session_from_row).collect()
    }

    async fn create_session(&self, session: &NewSession) -> CoreResult<Session> {
        let created = Session {
            id: Uuid::new_v4(),
            route_id: session.route_id,
            bus_id: session.bus_id,
            departure_date: session.departure_date,
        };
        sqlx::query(
            "INSERT INTO sessions (id, route_id, bus_id, departure_date) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(created.id)
        .bind(created.route_id)
        .bind(created.bus_id)
        .bind(created.departure_date)
        .execute(&self.pool)
        .await
        .map_err(db_err("create_session"))?;
        Ok(created)
    }
}
