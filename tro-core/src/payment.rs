use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::CoreResult;

/// How a booking was settled. Manual confirmations are admin overrides that
/// bypass the hosted checkout entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Gateway,
    Manual,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Gateway => "gateway",
            PaymentMethod::Manual => "manual",
        }
    }
}

/// Payment fields attached to a booking when it reaches the paid state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub transaction_id: Option<String>,
    pub payment_status: Option<String>,
    pub amount_paid_minor: Option<i64>,
    pub method: PaymentMethod,
}

impl PaymentRecord {
    pub fn manual() -> Self {
        Self {
            transaction_id: None,
            payment_status: Some("Paid".to_string()),
            amount_paid_minor: None,
            method: PaymentMethod::Manual,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    /// Amount in minor units (pesewas).
    pub amount_minor: i64,
    pub description: String,
    /// Correlation key echoed back by the gateway callback.
    pub client_reference: String,
    pub customer_msisdn: String,
}

#[derive(Debug, Clone)]
pub struct CheckoutSession {
    pub checkout_url: String,
}

/// Seam to the hosted-checkout provider. The production implementation talks
/// to Hubtel; tests substitute a stub.
#[async_trait]
pub trait CheckoutGateway: Send + Sync {
    /// Create a hosted-checkout session and return the URL the customer is
    /// redirected to. Fails with `GatewayConfig` when credentials are unset
    /// and `Gateway` when the provider rejects the call.
    async fn initiate(&self, request: &CheckoutRequest) -> CoreResult<CheckoutSession>;
}
