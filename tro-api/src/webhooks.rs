use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Redirect,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::state::AppState;
use tro_core::payment::{PaymentMethod, PaymentRecord};
use tro_payments::{interpret_callback, HubtelCallback};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/payments/hubtel/callback", post(handle_hubtel_callback))
        .route("/v1/payments/hubtel/return", get(handle_hubtel_return))
}

/// POST /v1/payments/hubtel/callback
///
/// Receive the asynchronous payment result from Hubtel. Always answers 200:
/// an error response only makes the gateway re-deliver a payload we already
/// know we cannot use, and duplicate deliveries of a good payload are
/// idempotent no-ops downstream.
async fn handle_hubtel_callback(
    State(state): State<AppState>,
    Json(payload): Json<HubtelCallback>,
) -> StatusCode {
    let outcome = match interpret_callback(&payload) {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::warn!(error = %e, "discarding unusable gateway callback");
            return StatusCode::OK;
        }
    };

    tracing::info!(
        client_reference = %outcome.client_reference,
        success = outcome.success,
        "received payment callback"
    );

    let result = if outcome.success {
        let payment = PaymentRecord {
            transaction_id: outcome.transaction_id,
            payment_status: outcome.payment_status,
            amount_paid_minor: outcome.amount_minor,
            method: PaymentMethod::Gateway,
        };
        state
            .engine
            .confirm_paid(&outcome.client_reference, payment)
            .await
    } else {
        state.engine.payment_failed(&outcome.client_reference).await
    };

    if let Err(e) = result {
        tracing::error!(
            client_reference = %outcome.client_reference,
            error = %e,
            "failed to apply payment callback"
        );
    }
    StatusCode::OK
}

/// Query string Hubtel appends when sending the customer's browser back.
#[derive(Debug, Deserialize)]
struct ReturnQuery {
    clientreference: Option<String>,
    error: Option<String>,
}

/// GET /v1/payments/hubtel/return
///
/// Browser redirect only. The callback is the source of truth for payment
/// state; this just picks which page the customer lands on.
async fn handle_hubtel_return(
    State(state): State<AppState>,
    Query(query): Query<ReturnQuery>,
) -> Redirect {
    let reference = query.clientreference.unwrap_or_default();
    if query.error.is_some() {
        tracing::info!(client_reference = %reference, "customer returned from a failed checkout");
        return Redirect::to(&state.pages.error_url);
    }
    let target = format!("{}?ref={}", state.pages.confirmation_url, reference);
    Redirect::to(&target)
}
