pub mod identity;
pub mod payment;

/// Error taxonomy shared by every crate in the workspace.
///
/// `Validation` and `SeatConflict` are user-correctable and rejected before
/// any write. `Callback` is never surfaced to an end user; the webhook
/// handler logs it and acknowledges the gateway anyway.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Seat(s) already taken for this journey: {0}")]
    SeatConflict(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Payment gateway misconfigured: {0}")]
    GatewayConfig(String),
    #[error("Payment gateway rejected the request: {0}")]
    Gateway(String),
    #[error("Unprocessable gateway callback: {0}")]
    Callback(String),
    #[error("Operation not permitted: {0}")]
    Forbidden(String),
    #[error("Data access failed: {0}")]
    DataAccess(String),
}

pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    pub fn validation(msg: impl Into<String>) -> Self {
        CoreError::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        CoreError::NotFound(msg.into())
    }

    pub fn data_access(err: impl std::fmt::Display) -> Self {
        CoreError::DataAccess(err.to_string())
    }
}
