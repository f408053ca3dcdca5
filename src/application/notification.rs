use crate::domain::response::GatewayResponse;
use crate::error::{RedsysError, Result};
use crate::infrastructure::signing::{SigningEngine, decode_base64};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// The form fields the gateway posts to the merchant notification URL.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct MerchantNotification {
    #[serde(rename = "Ds_SignatureVersion", default)]
    pub signature_version: Option<String>,
    #[serde(rename = "Ds_MerchantParameters", default)]
    pub merchant_parameters: Option<String>,
    #[serde(rename = "Ds_Signature", default)]
    pub signature: Option<String>,
}

/// Decoded `Ds_MerchantParameters`, values rendered as strings.
pub type NotificationParams = BTreeMap<String, String>;

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

fn as_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

/// True when a `%` is not followed by two hex digits.
fn has_malformed_escape(text: &str) -> bool {
    let bytes = text.as_bytes();
    bytes.iter().enumerate().any(|(i, &b)| {
        b == b'%'
            && !bytes
                .get(i + 1..i + 3)
                .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit))
    })
}

/// base64 → UTF-8 → percent-decoding → JSON object.
pub fn decode_parameters(payload: Option<&str>) -> Result<NotificationParams> {
    let payload = payload
        .filter(|p| !p.is_empty())
        .ok_or_else(|| RedsysError::parse("Payload is required"))?;

    let invalid = || RedsysError::parse("Invalid parameters");
    let bytes = decode_base64(payload)
        .ok_or_else(|| RedsysError::parse("Payload must be a base-64 encoded string"))?;
    let text = String::from_utf8(bytes).map_err(|_| invalid())?;
    if has_malformed_escape(&text) {
        return Err(invalid());
    }
    let text = urlencoding::decode(&text).map_err(|_| invalid())?;
    let value: Value = serde_json::from_str(&text).map_err(|_| invalid())?;

    if is_falsy(&value) {
        return Err(invalid());
    }
    let Value::Object(map) = value else {
        return Err(invalid());
    };
    Ok(map.into_iter().map(|(k, v)| (k, as_text(v))).collect())
}

fn order_of(params: &NotificationParams) -> &str {
    params
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("Ds_Order"))
        .map(|(_, v)| v.as_str())
        .unwrap_or_default()
}

/// Verifies `signature` over the still-encoded `raw_payload`, keyed by the
/// order id found in the decoded parameters.
pub fn verify_parameters(
    engine: &SigningEngine,
    params: NotificationParams,
    raw_payload: &str,
    signature: Option<&str>,
) -> Result<GatewayResponse> {
    let order = order_of(&params);
    let valid = signature
        .filter(|s| !s.is_empty())
        .is_some_and(|s| engine.verify(order, raw_payload, s));
    if !valid {
        tracing::warn!(order, "rejected merchant notification signature");
        return Err(RedsysError::parse("Invalid signature"));
    }
    Ok(GatewayResponse::from_fields(params))
}

pub fn process_notification(
    engine: &SigningEngine,
    notification: &MerchantNotification,
) -> Result<GatewayResponse> {
    let raw = notification.merchant_parameters.as_deref();
    let params = decode_parameters(raw)?;
    verify_parameters(
        engine,
        params,
        raw.unwrap_or_default(),
        notification.signature.as_deref(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;
    use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};

    const SECRET: &str = "sq7HjrUOBfKmC576ILgskD5srU870gJ7";

    fn engine() -> SigningEngine {
        SigningEngine::from_base64(SECRET).unwrap()
    }

    fn signed(json: &str) -> MerchantNotification {
        let payload = STANDARD.encode(json);
        let signature = engine().sign("1446068581", &payload).unwrap();
        MerchantNotification {
            signature_version: Some("HMAC_SHA256_V1".to_string()),
            merchant_parameters: Some(payload),
            signature: Some(signature),
        }
    }

    const JSON: &str = r#"{"Ds_Date":"19%2F10%2F2026","Ds_Hour":"12%3A30","Ds_Amount":"145","Ds_Currency":"978","Ds_Order":"1446068581","Ds_MerchantCode":"999008881","Ds_Terminal":"1","Ds_Response":"0000","Ds_SecurePayment":"1","Ds_TransactionType":"0"}"#;

    #[test]
    fn test_valid_notification() {
        let response = process_notification(&engine(), &signed(JSON)).unwrap();

        assert_eq!(response.order.as_deref(), Some("1446068581"));
        assert_eq!(response.currency.as_deref(), Some("EUR"));
        assert_eq!(response.response, Some(0));
        assert_eq!(response.date.as_deref(), Some("19/10/2026"));
        assert_eq!(response.hour.as_deref(), Some("12:30"));
    }

    #[test]
    fn test_base64url_signature_is_accepted() {
        let mut notification = signed(JSON);
        let raw = STANDARD
            .decode(notification.signature.as_deref().unwrap())
            .unwrap();
        notification.signature = Some(URL_SAFE_NO_PAD.encode(raw));
        assert!(process_notification(&engine(), &notification).is_ok());
    }

    #[test]
    fn test_tampered_payload_is_rejected() {
        let mut notification = signed(JSON);
        let tampered = STANDARD.encode(JSON.replace("145", "999"));
        notification.merchant_parameters = Some(tampered);
        let err = process_notification(&engine(), &notification).unwrap_err();
        assert!(matches!(err, RedsysError::Parse { .. }));
        assert_eq!(err.to_string(), "Parse error: Invalid signature");
    }

    #[test]
    fn test_missing_signature_is_rejected() {
        let mut notification = signed(JSON);
        notification.signature = None;
        assert!(process_notification(&engine(), &notification).is_err());
        notification.signature = Some(String::new());
        assert!(process_notification(&engine(), &notification).is_err());
    }

    #[test]
    fn test_decode_failures_are_parse_errors() {
        for payload in [None, Some(""), Some("!!!"), Some("bnVsbA=="), Some("e30x")] {
            assert!(matches!(
                decode_parameters(payload),
                Err(RedsysError::Parse { .. })
            ));
        }
        // "false", "0" and a bare string are falsy or not objects.
        for json in ["false", "0", "\"x\"", "[1]"] {
            let payload = STANDARD.encode(json);
            assert!(decode_parameters(Some(&payload)).is_err(), "{json}");
        }
    }

    #[test]
    fn test_malformed_percent_escape_is_rejected() {
        for json in [
            r#"{"Ds_Order":"1","x":"100%ZZ"}"#,
            r#"{"Ds_Order":"1","x":"100%"}"#,
            r#"{"Ds_Order":"1","x":"%%41"}"#,
        ] {
            let payload = STANDARD.encode(json);
            assert!(
                matches!(decode_parameters(Some(&payload)), Err(RedsysError::Parse { .. })),
                "{json}"
            );
        }
        let payload = STANDARD.encode(r#"{"Ds_Order":"1","x":"100%25"}"#);
        assert_eq!(decode_parameters(Some(&payload)).unwrap()["x"], "100%");
    }

    #[test]
    fn test_non_string_values_are_rendered() {
        let payload = STANDARD.encode(r#"{"Ds_Order":"1","Ds_Response":0}"#);
        let params = decode_parameters(Some(&payload)).unwrap();
        assert_eq!(params["Ds_Response"], "0");
    }
}
