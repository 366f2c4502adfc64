pub mod callback;
pub mod hubtel;

pub use callback::{interpret_callback, CallbackOutcome, HubtelCallback};
pub use hubtel::{HubtelCredentials, HubtelGateway, HubtelSettings};
