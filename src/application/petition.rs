use crate::application::{canonical, formatter};
use crate::domain::order::OrderParameters;
use crate::domain::response::GatewayResponse;
use crate::error::{RedsysError, Result};
use crate::infrastructure::catalog;
use crate::infrastructure::signing::SigningEngine;
use crate::infrastructure::xml::{self, XmlNode};

/// Builds the signed `<REQUEST>` document for a web-service petition.
pub fn petition_request(engine: &SigningEngine, params: &OrderParameters) -> Result<String> {
    let payload = formatter::format_params(params)?;
    let order = params
        .order()
        .ok_or_else(|| RedsysError::validation("No order reference provided", "order", None))?;
    let signed = canonical::petition_parameters(&payload);
    let signature = engine.sign(&order, &signed)?;
    Ok(canonical::petition_envelope(&signed, &signature))
}

/// Parses a `RETORNOXML` answer and checks its `CODIGO`.
///
/// A non-zero code becomes a parse error carrying the code and its
/// description. The echoed request (`RECIBIDO`) is never exposed since it may
/// hold card data.
pub fn parse_response(raw: &str) -> Result<XmlNode> {
    let root = xml::parse(raw)?;
    let answer = root
        .find("RETORNOXML")
        .cloned()
        .ok_or_else(|| RedsysError::parse("Missing RETORNOXML in web service response"))?;

    match answer.child_text("CODIGO") {
        Some("0") => Ok(answer),
        code => {
            let code = code.unwrap_or_default().to_string();
            tracing::warn!(%code, "web service petition rejected");
            Err(RedsysError::Parse {
                message: format!("Redsys error {code}"),
                description: catalog::sis_error_message(&code),
                code: Some(code),
            })
        }
    }
}

/// Verifies the `OPERACION` block of a parsed answer.
///
/// The received signature is compared as text against the padded base64
/// the engine produces.
pub fn verify_response(engine: &SigningEngine, answer: &XmlNode) -> Result<GatewayResponse> {
    let operation = answer
        .child("OPERACION")
        .ok_or_else(|| RedsysError::parse("Missing OPERACION in web service response"))?;

    let signed = canonical::response_signed_string(operation);
    let order = operation
        .child_ignore_case("Ds_Order")
        .map(|n| n.text.as_str())
        .unwrap_or_default();
    let provided = operation.child_text("Ds_Signature").unwrap_or_default();

    if provided.is_empty() || engine.sign(order, &signed)? != provided {
        tracing::warn!(order, "rejected web service response signature");
        return Err(RedsysError::parse("Invalid signature"));
    }
    Ok(GatewayResponse::from_fields(operation.fields()))
}

pub fn process_petition_response(engine: &SigningEngine, raw: &str) -> Result<GatewayResponse> {
    let answer = parse_response(raw)?;
    verify_response(engine, &answer)
}

/// Turns a denied business code into a gateway error. Codes in `pending`
/// are reported to the caller as ordinary results.
pub fn check_business_code(
    response: GatewayResponse,
    pending: &[u32],
    raw: &str,
) -> Result<GatewayResponse> {
    match response.response {
        Some(code) if response.is_denied(pending) => Err(RedsysError::Gateway {
            message: "Error in webservice petition".to_string(),
            code,
            raw: raw.to_string(),
        }),
        _ => Ok(response),
    }
}
