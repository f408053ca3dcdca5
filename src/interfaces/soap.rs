//! Shaping for the merchant's SOAP notification endpoint.
//!
//! The gateway may post the `<Message>` document bare, or as the `XML`
//! argument of a `procesaNotificacionSIS` call inside a SOAP 1.1 or 1.2
//! envelope. The acknowledgment must go back in the same shape.

use crate::error::{RedsysError, Result};
use crate::infrastructure::xml::{self, escape};

pub const SOAP11_NAMESPACE: &str = "http://schemas.xmlsoap.org/soap/envelope/";
pub const SOAP12_NAMESPACE: &str = "http://www.w3.org/2003/05/soap-envelope";

const NOTIFICATION_OPERATION: &str = "procesaNotificacionSIS";
const NOTIFICATION_ARGUMENT: &str = "XML";
const NOTIFICATION_SERVICE: &str = "InotificacionSIS";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoapVariant {
    Bare,
    Soap11,
    Soap12,
}

impl SoapVariant {
    pub fn content_type(self) -> &'static str {
        match self {
            SoapVariant::Bare | SoapVariant::Soap11 => "text/xml; charset=utf-8",
            SoapVariant::Soap12 => "application/soap+xml; charset=utf-8",
        }
    }

    fn namespace(self) -> Option<&'static str> {
        match self {
            SoapVariant::Bare => None,
            SoapVariant::Soap11 => Some(SOAP11_NAMESPACE),
            SoapVariant::Soap12 => Some(SOAP12_NAMESPACE),
        }
    }
}

/// Detects the envelope version from its namespace URI.
pub fn classify(raw: &str) -> SoapVariant {
    if raw.contains(SOAP12_NAMESPACE) {
        SoapVariant::Soap12
    } else if raw.contains(SOAP11_NAMESPACE) {
        SoapVariant::Soap11
    } else {
        SoapVariant::Bare
    }
}

/// Returns the `<Message>` document carried by `raw`.
pub fn unwrap_notification(raw: &str) -> Result<(SoapVariant, String)> {
    let variant = classify(raw);
    if variant == SoapVariant::Bare {
        return Ok((variant, raw.to_string()));
    }

    let envelope = xml::parse(raw)?;
    let message = envelope
        .find(NOTIFICATION_OPERATION)
        .and_then(|op| op.child(NOTIFICATION_ARGUMENT))
        .map(|arg| arg.text.clone())
        .ok_or_else(|| {
            RedsysError::parse(format!("Missing {NOTIFICATION_OPERATION} argument in SOAP envelope"))
        })?;
    Ok((variant, message))
}

/// Wraps an acknowledgment for the given variant. Bare answers are returned
/// untouched.
pub fn wrap_answer(variant: SoapVariant, answer: &str) -> String {
    let Some(namespace) = variant.namespace() else {
        return answer.to_string();
    };
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
         <soapenv:Envelope xmlns:soapenv=\"{namespace}\"><soapenv:Body>\
         <ns1:{NOTIFICATION_OPERATION}Response xmlns:ns1=\"{NOTIFICATION_SERVICE}\">\
         <return>{}</return>\
         </ns1:{NOTIFICATION_OPERATION}Response></soapenv:Body></soapenv:Envelope>",
        escape(answer)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const MESSAGE: &str = "<Message><Request Ds_Version=\"0.0\"><Ds_Order>1</Ds_Order></Request><Signature>S</Signature></Message>";

    fn envelope(namespace: &str) -> String {
        format!(
            "<?xml version=\"1.0\"?><soapenv:Envelope xmlns:soapenv=\"{namespace}\"><soapenv:Body>\
             <ns0:procesaNotificacionSIS xmlns:ns0=\"InotificacionSIS\"><XML>{}</XML></ns0:procesaNotificacionSIS>\
             </soapenv:Body></soapenv:Envelope>",
            escape(MESSAGE)
        )
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify(MESSAGE), SoapVariant::Bare);
        assert_eq!(classify(&envelope(SOAP11_NAMESPACE)), SoapVariant::Soap11);
        assert_eq!(classify(&envelope(SOAP12_NAMESPACE)), SoapVariant::Soap12);
    }

    #[test]
    fn test_unwrap_restores_message_text() {
        for namespace in [SOAP11_NAMESPACE, SOAP12_NAMESPACE] {
            let (_, message) = unwrap_notification(&envelope(namespace)).unwrap();
            assert_eq!(message, MESSAGE);
        }
        let (variant, message) = unwrap_notification(MESSAGE).unwrap();
        assert_eq!(variant, SoapVariant::Bare);
        assert_eq!(message, MESSAGE);
    }

    #[test]
    fn test_unwrap_requires_operation() {
        let empty = format!(
            "<soapenv:Envelope xmlns:soapenv=\"{SOAP11_NAMESPACE}\"><soapenv:Body/></soapenv:Envelope>"
        );
        assert!(matches!(
            unwrap_notification(&empty),
            Err(RedsysError::Parse { .. })
        ));
    }

    #[test]
    fn test_wrap_answer_round_trips() {
        let answer = "<Message><Response Ds_Version=\"0.0\"/><Signature>S</Signature></Message>";
        assert_eq!(wrap_answer(SoapVariant::Bare, answer), answer);

        let wrapped = wrap_answer(SoapVariant::Soap12, answer);
        assert_eq!(classify(&wrapped), SoapVariant::Soap12);
        let root = xml::parse(&wrapped).unwrap();
        assert_eq!(root.find("return").unwrap().text, answer);
        assert!(root.find("procesaNotificacionSISResponse").is_some());
    }

    #[test]
    fn test_content_types() {
        assert_eq!(SoapVariant::Soap11.content_type(), "text/xml; charset=utf-8");
        assert!(SoapVariant::Soap12.content_type().starts_with("application/soap+xml"));
    }
}
