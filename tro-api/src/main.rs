use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tro_api::{app, state::ReturnPages, worker, AppState};
use tro_booking::BookingEngine;
use tro_catalog::CatalogRepository;
use tro_core::payment::CheckoutGateway;
use tro_payments::HubtelGateway;
use tro_store::{Config, DbClient, PgBookingStore, PgCatalogRepository};

const SWEEP_INTERVAL_SECONDS: u64 = 60;

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tro_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().expect("Failed to load config");
    tracing::info!("Starting Tro API on port {}", config.server.port);

    let db = DbClient::new(&config.database.url)
        .await
        .expect("Failed to connect to Postgres");
    db.migrate().await.expect("Failed to run migrations");

    let store = Arc::new(PgBookingStore::new(db.pool.clone()));
    let catalog: Arc<dyn CatalogRepository> = Arc::new(PgCatalogRepository::new(db.pool.clone()));
    let gateway: Arc<dyn CheckoutGateway> = Arc::new(HubtelGateway::new(
        config.gateway.clone(),
        reqwest::Client::new(),
    ));

    let engine = Arc::new(BookingEngine::new(
        store,
        catalog.clone(),
        config.business_rules.reservation_ttl_seconds,
    ));

    tokio::spawn(worker::start_expiry_worker(
        engine.clone(),
        SWEEP_INTERVAL_SECONDS,
    ));

    let app_state = AppState {
        engine,
        catalog,
        gateway,
        pages: ReturnPages {
            confirmation_url: config.pages.confirmation_url.clone(),
            error_url: config.pages.error_url.clone(),
        },
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listener");
    axum::serve(listener, app).await.expect("Server error");
}
