use serde::Deserialize;
use tro_core::{CoreError, CoreResult};

/// Asynchronous result notification as posted by the gateway. Field names
/// are the gateway's own (PascalCase).
#[derive(Debug, Clone, Deserialize)]
pub struct HubtelCallback {
    #[serde(rename = "ResponseCode")]
    pub response_code: Option<String>,
    #[serde(rename = "Status")]
    pub status: Option<String>,
    #[serde(rename = "Data")]
    pub data: Option<HubtelCallbackData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HubtelCallbackData {
    #[serde(rename = "ClientReference")]
    pub client_reference: Option<String>,
    #[serde(rename = "Status")]
    pub status: Option<String>,
    #[serde(rename = "CheckoutId")]
    pub checkout_id: Option<String>,
    #[serde(rename = "Amount")]
    pub amount: Option<f64>,
}

/// What the callback means for the booking lifecycle.
#[derive(Debug, Clone, PartialEq)]
pub struct CallbackOutcome {
    pub client_reference: String,
    pub success: bool,
    pub transaction_id: Option<String>,
    pub payment_status: Option<String>,
    pub amount_minor: Option<i64>,
}

/// Extract and validate the correlation key and success flag.
///
/// Success requires all three of: outer `Status == "Success"`,
/// `ResponseCode == "0000"`, and `Data.Status == "Success"`. Any other
/// combination is a failure. A payload without a client reference cannot be
/// attributed to a booking and is a `Callback` error; the HTTP handler still
/// acknowledges it so the gateway stops retrying.
pub fn interpret_callback(payload: &HubtelCallback) -> CoreResult<CallbackOutcome> {
    let data = payload
        .data
        .as_ref()
        .ok_or_else(|| CoreError::Callback("payload has no Data object".into()))?;
    let client_reference = data
        .client_reference
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| CoreError::Callback("payload has no ClientReference".into()))?
        .to_string();

    let success = payload.status.as_deref() == Some("Success")
        && payload.response_code.as_deref() == Some("0000")
        && data.status.as_deref() == Some("Success");

    Ok(CallbackOutcome {
        client_reference,
        success,
        transaction_id: data.checkout_id.clone(),
        payment_status: data.status.clone(),
        amount_minor: data.amount.map(|a| (a * 100.0).round() as i64),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(outer: &str, code: &str, inner: &str) -> HubtelCallback {
        HubtelCallback {
            response_code: Some(code.into()),
            status: Some(outer.into()),
            data: Some(HubtelCallbackData {
                client_reference: Some("ref-1".into()),
                status: Some(inner.into()),
                checkout_id: Some("chk-9".into()),
                amount: Some(100.0),
            }),
        }
    }

    #[test]
    fn success_requires_all_three_flags() {
        assert!(interpret_callback(&payload("Success", "0000", "Success"))
            .unwrap()
            .success);
        assert!(!interpret_callback(&payload("Success", "0001", "Success"))
            .unwrap()
            .success);
        assert!(!interpret_callback(&payload("Failed", "0000", "Success"))
            .unwrap()
            .success);
        assert!(!interpret_callback(&payload("Success", "0000", "Failed"))
            .unwrap()
            .success);
    }

    #[test]
    fn amount_is_converted_to_minor_units() {
        let outcome = interpret_callback(&payload("Success", "0000", "Success")).unwrap();
        assert_eq!(outcome.amount_minor, Some(10_000));
        assert_eq!(outcome.transaction_id.as_deref(), Some("chk-9"));
    }

    #[test]
    fn missing_client_reference_is_a_callback_error() {
        let mut p = payload("Success", "0000", "Success");
        p.data.as_mut().unwrap().client_reference = Some("  ".into());
        assert!(matches!(
            interpret_callback(&p).unwrap_err(),
            CoreError::Callback(_)
        ));
        p.data = None;
        assert!(matches!(
            interpret_callback(&p).unwrap_err(),
            CoreError::Callback(_)
        ));
    }

    #[test]
    fn parses_gateway_field_names() {
        let raw = r#"{
            "ResponseCode": "0000",
            "Status": "Success",
            "Data": {
                "ClientReference": "abc",
                "Status": "Success",
                "CheckoutId": "c-1",
                "Amount": 50.0
            }
        }"#;
        let parsed: HubtelCallback = serde_json::from_str(raw).unwrap();
        let outcome = interpret_callback(&parsed).unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.client_reference, "abc");
        assert_eq!(outcome.amount_minor, Some(5000));
    }
}
