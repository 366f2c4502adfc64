use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tro_core::CoreError;

#[derive(Debug)]
pub enum ApiError {
    Core(CoreError),
    Anyhow(anyhow::Error),
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        ApiError::Core(err)
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Anyhow(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::Core(CoreError::Validation(msg)) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Core(err @ CoreError::SeatConflict(_)) => {
                (StatusCode::CONFLICT, err.to_string())
            }
            ApiError::Core(err @ CoreError::NotFound(_)) => {
                (StatusCode::NOT_FOUND, err.to_string())
            }
            ApiError::Core(CoreError::Forbidden(msg)) => (StatusCode::FORBIDDEN, msg),
            ApiError::Core(err @ CoreError::Gateway(_)) => {
                tracing::error!("Gateway error: {}", err);
                (
                    StatusCode::BAD_GATEWAY,
                    "Payment provider is unavailable, try again shortly".to_string(),
                )
            }
            ApiError::Core(err @ CoreError::Callback(_)) => {
                (StatusCode::BAD_REQUEST, err.to_string())
            }
            ApiError::Core(err) => {
                tracing::error!("Internal Server Error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
            ApiError::Anyhow(err) => {
                tracing::error!("Internal Server Error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
