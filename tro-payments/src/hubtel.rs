use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tro_core::payment::{CheckoutGateway, CheckoutRequest, CheckoutSession};
use tro_core::{CoreError, CoreResult};

pub const DEFAULT_CHECKOUT_ENDPOINT: &str = "https://payproxyapi.hubtel.com/items/initiate";

fn default_checkout_endpoint() -> String {
    DEFAULT_CHECKOUT_ENDPOINT.to_string()
}

/// Gateway settings as loaded from configuration. The live/test flag selects
/// between the two credential triples; the selected triple must be complete
/// or `initiate` fails with `GatewayConfig`.
#[derive(Debug, Clone, Deserialize)]
pub struct HubtelSettings {
    #[serde(default)]
    pub live_mode: bool,
    pub client_id: Option<String>,
    pub secret_key: Option<String>,
    pub account_id: Option<String>,
    pub test_client_id: Option<String>,
    pub test_secret_key: Option<String>,
    pub test_account_id: Option<String>,
    /// Where the gateway posts its asynchronous result.
    pub callback_url: String,
    /// Where the customer's browser lands after paying.
    pub return_url: String,
    pub cancellation_url: String,
    #[serde(default = "default_checkout_endpoint")]
    pub checkout_endpoint: String,
}

#[derive(Debug, Clone)]
pub struct HubtelCredentials {
    pub client_id: String,
    pub secret_key: String,
    pub account_id: String,
}

impl HubtelSettings {
    pub fn credentials(&self) -> CoreResult<HubtelCredentials> {
        let (client_id, secret_key, account_id, label) = if self.live_mode {
            (&self.client_id, &self.secret_key, &self.account_id, "live")
        } else {
            (
                &self.test_client_id,
                &self.test_secret_key,
                &self.test_account_id,
                "test",
            )
        };
        fn present(v: &Option<String>) -> Option<&str> {
            v.as_deref().map(str::trim).filter(|s| !s.is_empty())
        }
        match (present(client_id), present(secret_key), present(account_id)) {
            (Some(c), Some(s), Some(a)) => Ok(HubtelCredentials {
                client_id: c.to_string(),
                secret_key: s.to_string(),
                account_id: a.to_string(),
            }),
            _ => Err(CoreError::GatewayConfig(format!(
                "{label} gateway credentials are not fully configured"
            ))),
        }
    }
}

/// Hosted-checkout client for the Hubtel payment gateway.
pub struct HubtelGateway {
    settings: HubtelSettings,
    http: Client,
}

impl HubtelGateway {
    pub fn new(settings: HubtelSettings, http: Client) -> Self {
        Self { settings, http }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InitiateBody<'a> {
    /// Major currency units; the gateway does not speak pesewas.
    total_amount: f64,
    description: &'a str,
    callback_url: &'a str,
    return_url: &'a str,
    cancellation_url: &'a str,
    merchant_account_number: &'a str,
    client_reference: &'a str,
    customer_msisdn: &'a str,
}

#[derive(Debug, Deserialize)]
struct InitiateResponse {
    status: Option<String>,
    data: Option<InitiateData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InitiateData {
    checkout_url: Option<String>,
}

#[async_trait]
impl CheckoutGateway for HubtelGateway {
    async fn initiate(&self, request: &CheckoutRequest) -> CoreResult<CheckoutSession> {
        let credentials = self.settings.credentials()?;
        let body = InitiateBody {
            total_amount: request.amount_minor as f64 / 100.0,
            description: &request.description,
            callback_url: &self.settings.callback_url,
            return_url: &self.settings.return_url,
            cancellation_url: &self.settings.cancellation_url,
            merchant_account_number: &credentials.account_id,
            client_reference: &request.client_reference,
            customer_msisdn: &request.customer_msisdn,
        };

        let response = self
            .http
            .post(&self.settings.checkout_endpoint)
            .basic_auth(&credentials.client_id, Some(&credentials.secret_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "checkout initiation request failed");
                CoreError::Gateway(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CoreError::Gateway(format!(
                "checkout initiation returned HTTP {status}"
            )));
        }

        let parsed: InitiateResponse = response
            .json()
            .await
            .map_err(|e| CoreError::Gateway(format!("unreadable gateway response: {e}")))?;
        if parsed.status.as_deref() != Some("Success") {
            return Err(CoreError::Gateway(format!(
                "gateway rejected initiation: {}",
                parsed.status.unwrap_or_else(|| "no status".into())
            )));
        }
        parsed
            .data
            .and_then(|d| d.checkout_url)
            .map(|checkout_url| CheckoutSession { checkout_url })
            .ok_or_else(|| CoreError::Gateway("gateway response missing checkoutUrl".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> HubtelSettings {
        HubtelSettings {
            live_mode: false,
            client_id: Some("live-id".into()),
            secret_key: Some("live-secret".into()),
            account_id: Some("11111".into()),
            test_client_id: Some("test-id".into()),
            test_secret_key: Some("test-secret".into()),
            test_account_id: Some("22222".into()),
            callback_url: "https://example.com/v1/payments/hubtel/callback".into(),
            return_url: "https://example.com/v1/payments/hubtel/return".into(),
            cancellation_url: "https://example.com/cancelled".into(),
            checkout_endpoint: default_checkout_endpoint(),
        }
    }

    #[test]
    fn test_mode_selects_the_test_triple() {
        let creds = settings().credentials().unwrap();
        assert_eq!(creds.client_id, "test-id");
        assert_eq!(creds.account_id, "22222");
    }

    #[test]
    fn live_mode_selects_the_live_triple() {
        let mut s = settings();
        s.live_mode = true;
        let creds = s.credentials().unwrap();
        assert_eq!(creds.client_id, "live-id");
        assert_eq!(creds.account_id, "11111");
    }

    #[test]
    fn missing_credential_is_a_config_error() {
        let mut s = settings();
        s.test_secret_key = Some("   ".into());
        let err = s.credentials().unwrap_err();
        assert!(matches!(err, CoreError::GatewayConfig(_)));
    }

    #[test]
    fn initiate_body_uses_gateway_field_names() {
        let body = InitiateBody {
            total_amount: 225.0,
            description: "Accra to Kumasi",
            callback_url: "cb",
            return_url: "ret",
            cancellation_url: "cancel",
            merchant_account_number: "22222",
            client_reference: "abc123",
            customer_msisdn: "+233200000000",
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["totalAmount"], 225.0);
        assert_eq!(json["merchantAccountNumber"], "22222");
        assert_eq!(json["clientReference"], "abc123");
        assert_eq!(json["customerMsisdn"], "+233200000000");
    }
}
