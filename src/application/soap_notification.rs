use crate::application::canonical;
use crate::domain::response::GatewayResponse;
use crate::error::{RedsysError, Result};
use crate::infrastructure::signing::SigningEngine;
use crate::infrastructure::xml;

/// Verifies a `<Message><Request>..</Request><Signature>..</Signature></Message>`
/// notification.
///
/// The signature covers the `<Request>` element exactly as received, so the
/// region is sliced out of `raw` before any parsing happens.
pub fn process_soap_notification(engine: &SigningEngine, raw: &str) -> Result<GatewayResponse> {
    let signed = canonical::notification_signed_region(raw)?;

    let root = xml::parse(raw)?;
    let message = root
        .find("Message")
        .ok_or_else(|| RedsysError::parse("Missing Message in SOAP notification"))?;
    let request = message
        .child("Request")
        .ok_or_else(|| RedsysError::parse("Missing Request in SOAP notification"))?;
    let order = request
        .child_text("Ds_Order")
        .or_else(|| request.attribute("Ds_Order"))
        .unwrap_or_default();

    let valid = message
        .child_text("Signature")
        .filter(|s| !s.is_empty())
        .is_some_and(|s| engine.verify(order, signed, s));
    if !valid {
        tracing::warn!(order, "rejected SOAP notification signature");
        return Err(RedsysError::parse("Invalid signature"));
    }
    Ok(GatewayResponse::from_fields(request.fields()))
}

/// Builds the signed acknowledgment the gateway expects back.
pub fn soap_notification_answer(engine: &SigningEngine, order: &str, accepted: bool) -> Result<String> {
    let response = canonical::notification_answer(accepted);
    let signature = engine.sign(order, &response)?;
    Ok(canonical::notification_answer_envelope(&response, &signature))
}
