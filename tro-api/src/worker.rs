use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{error, info};
use tro_booking::BookingEngine;

/// Background expiry worker. Read paths already sweep on demand; this loop
/// keeps seats from staying locked on a journey nobody looks at.
pub async fn start_expiry_worker(engine: Arc<BookingEngine>, interval_seconds: u64) {
    let mut ticker = tokio::time::interval(Duration::from_secs(interval_seconds));
    info!("Expiry worker started, sweeping every {}s", interval_seconds);

    loop {
        ticker.tick().await;
        match engine.sweep_expired(Utc::now()).await {
            Ok(0) => {}
            Ok(released) => info!("Expiry sweep released {} stale reservation(s)", released),
            Err(e) => error!("Expiry sweep failed: {}", e),
        }
    }
}
