use std::sync::Arc;
use tro_booking::BookingEngine;
use tro_catalog::CatalogRepository;
use tro_core::payment::CheckoutGateway;

/// Browser destinations for the gateway's return redirect.
#[derive(Clone)]
pub struct ReturnPages {
    pub confirmation_url: String,
    pub error_url: String,
}

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<BookingEngine>,
    pub catalog: Arc<dyn CatalogRepository>,
    pub gateway: Arc<dyn CheckoutGateway>,
    pub pages: ReturnPages,
}
