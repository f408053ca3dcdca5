//! SOAP 1.1 transport for the `trataPeticion` web-service operation.
//!
//! Requires the `http-transport` feature.

use crate::domain::ports::{TransportConnector, TransportHandle, WebServiceTransport};
use crate::error::{RedsysError, Result};
use crate::infrastructure::xml::{self, escape};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const SERVICE_NAMESPACE: &str = "http://webservice.sis.sermepa.es";

fn transport_error(e: reqwest::Error) -> RedsysError {
    RedsysError::Transport(Box::new(e))
}

/// The service endpoint behind a published WSDL URL: everything up to the
/// `/wsdl/` segment.
pub fn service_endpoint(wsdl: &Url) -> Url {
    let mut endpoint = wsdl.clone();
    if let Some(pos) = wsdl.path().find("/wsdl/") {
        endpoint.set_path(&wsdl.path()[..pos]);
    }
    endpoint.set_query(None);
    endpoint
}

fn soap_request(request: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
         <soapenv:Envelope xmlns:soapenv=\"http://schemas.xmlsoap.org/soap/envelope/\" xmlns:web=\"{SERVICE_NAMESPACE}\">\
         <soapenv:Header/><soapenv:Body><web:trataPeticion><web:datoEntrada>{}</web:datoEntrada></web:trataPeticion></soapenv:Body>\
         </soapenv:Envelope>",
        escape(request)
    )
}

fn soap_result(body: &str) -> Result<String> {
    let envelope = xml::parse(body)?;
    if let Some(fault) = envelope.find("Fault") {
        let reason = fault
            .child_text("faultstring")
            .unwrap_or("unknown SOAP fault")
            .to_string();
        return Err(RedsysError::Transport(reason.into()));
    }
    envelope
        .find("trataPeticionReturn")
        .map(|node| node.text.clone())
        .ok_or_else(|| RedsysError::parse("Missing trataPeticionReturn in SOAP response"))
}

pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpTransport {
    pub fn new(wsdl: &Url, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(transport_error)?;
        Ok(Self {
            client,
            endpoint: service_endpoint(wsdl),
        })
    }
}

#[async_trait]
impl WebServiceTransport for HttpTransport {
    async fn process_petition(&self, request: &str) -> Result<String> {
        tracing::debug!(endpoint = %self.endpoint, "sending web service petition");
        let response = self
            .client
            .post(self.endpoint.clone())
            .header("Content-Type", "text/xml; charset=utf-8")
            .header("SOAPAction", "\"\"")
            .body(soap_request(request))
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;
        match soap_result(&body) {
            Err(RedsysError::Parse { .. }) if !status.is_success() => Err(
                RedsysError::Transport(format!("web service answered HTTP {status}").into()),
            ),
            other => other,
        }
    }
}

/// Builds an [`HttpTransport`] for the configured web-service URL.
#[derive(Debug, Clone)]
pub struct HttpConnector {
    timeout: Duration,
}

impl HttpConnector {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for HttpConnector {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

#[async_trait]
impl TransportConnector for HttpConnector {
    async fn connect(&self, url: &Url) -> Result<TransportHandle> {
        Ok(Arc::new(HttpTransport::new(url, self.timeout)?))
    }
}
