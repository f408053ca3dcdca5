//! Exact byte sequences that get signed or verified, one builder per flow.

use crate::application::formatter::FormattedPayload;
use crate::error::{RedsysError, Result};
use crate::infrastructure::signing::SIGNATURE_VERSION;
use crate::infrastructure::xml::{XmlNode, escape};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Response fields concatenated, in this order, to verify a web-service answer.
pub const RESPONSE_SIGNED_FIELDS: [&str; 8] = [
    "Ds_Amount",
    "Ds_Order",
    "Ds_MerchantCode",
    "Ds_Currency",
    "Ds_Response",
    "Ds_CardNumber",
    "Ds_TransactionType",
    "Ds_SecurePayment",
];

pub const NOTIFICATION_START_TOKEN: &str = "<Request";
pub const NOTIFICATION_END_TOKEN: &str = "</Request>";

/// Redirect flow: base64 of the JSON payload. This text is both what gets
/// transmitted and what gets signed.
pub fn redirect_parameters(payload: &FormattedPayload) -> Result<String> {
    let json = serde_json::to_string(payload).map_err(|e| RedsysError::Internal(Box::new(e)))?;
    Ok(STANDARD.encode(json))
}

/// Web-service request: the signed `DATOSENTRADA` element.
pub fn petition_parameters(payload: &FormattedPayload) -> String {
    let mut xml = String::from("<DATOSENTRADA>");
    for (name, value) in payload {
        xml.push_str(&format!("<{name}>{}</{name}>", escape(value)));
    }
    xml.push_str("</DATOSENTRADA>");
    xml
}

/// Web-service request envelope. `signed` is embedded as-is.
pub fn petition_envelope(signed: &str, signature: &str) -> String {
    format!(
        "<REQUEST>{signed}<DS_SIGNATUREVERSION>{SIGNATURE_VERSION}</DS_SIGNATUREVERSION><DS_SIGNATURE>{signature}</DS_SIGNATURE></REQUEST>"
    )
}

/// Web-service response: the signed field values concatenated without
/// delimiter. Absent and empty fields are skipped.
pub fn response_signed_string(operation: &XmlNode) -> String {
    RESPONSE_SIGNED_FIELDS
        .iter()
        .filter_map(|name| operation.child_ignore_case(name))
        .map(|node| node.text.as_str())
        .filter(|value| !value.is_empty())
        .collect()
}

/// Asynchronous notification: the verbatim `<Request ...>...</Request>` slice
/// of the received text.
pub fn notification_signed_region(raw: &str) -> Result<&str> {
    let start = raw.find(NOTIFICATION_START_TOKEN);
    let end = raw.find(NOTIFICATION_END_TOKEN);
    match (start, end) {
        (Some(start), Some(end)) if start <= end => {
            Ok(&raw[start..end + NOTIFICATION_END_TOKEN.len()])
        }
        _ => Err(RedsysError::parse(
            "Cannot find payload of SOAP notification Request",
        )),
    }
}

/// Notification acknowledgment: the signed `<Response>` element.
pub fn notification_answer(accepted: bool) -> String {
    let answer = if accepted { "OK" } else { "KO" };
    format!(
        "<Response Ds_Version=\"0.0\"><Ds_Response_Merchant>{answer}</Ds_Response_Merchant></Response>"
    )
}

pub fn notification_answer_envelope(response: &str, signature: &str) -> String {
    format!("<Message>{response}<Signature>{signature}</Signature></Message>")
}
