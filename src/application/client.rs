use crate::application::notification::{self, MerchantNotification, NotificationParams};
use crate::application::redirect::{self, RedirectPetition};
use crate::application::{petition, soap_notification};
use crate::config::{ClientConfig, ValidatedUrls};
use crate::domain::order::OrderParameters;
use crate::domain::ports::{TransportConnectorBox, TransportHandle};
use crate::domain::response::GatewayResponse;
use crate::error::{RedsysError, Result};
use crate::infrastructure::signing::SigningEngine;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// The gateway client.
///
/// Holds the merchant secret and endpoints. Everything except
/// [`Redsys::ws_petition`] is pure computation. The web-service transport is
/// created lazily, exactly once, on first use; concurrent first callers
/// share the same initialization.
pub struct Redsys {
    engine: SigningEngine,
    urls: ValidatedUrls,
    pending_response_codes: Vec<u32>,
    connector: Option<TransportConnectorBox>,
    transport: OnceCell<TransportHandle>,
}

impl Redsys {
    /// Validates `config` and builds a client.
    ///
    /// With the `http-transport` feature the default connector speaks SOAP
    /// over HTTPS; without it a connector must be supplied through
    /// [`Redsys::with_connector`] or [`Redsys::with_transport`] before
    /// calling [`Redsys::ws_petition`].
    pub fn new(config: ClientConfig) -> Result<Self> {
        let engine = SigningEngine::from_base64(&config.secret_key)?;
        let urls = config.urls.validate()?;
        Ok(Self {
            engine,
            urls,
            pending_response_codes: config.pending_response_codes,
            connector: default_connector(),
            transport: OnceCell::new(),
        })
    }

    pub fn with_connector(mut self, connector: TransportConnectorBox) -> Self {
        self.connector = Some(connector);
        self
    }

    /// Uses an already-connected transport.
    pub fn with_transport(self, transport: TransportHandle) -> Self {
        Self {
            transport: OnceCell::new_with(Some(transport)),
            ..self
        }
    }

    pub fn urls(&self) -> &ValidatedUrls {
        &self.urls
    }

    pub fn signing_engine(&self) -> &SigningEngine {
        &self.engine
    }

    /// Signs arbitrary text under the key derived from `order`.
    pub fn sign_order_text(&self, order: &str, text: &str) -> Result<String> {
        self.engine.sign(order, text)
    }

    pub fn redirect_parameters(&self, params: &OrderParameters) -> Result<String> {
        redirect::redirect_parameters(params)
    }

    pub fn redirect_petition(&self, params: &OrderParameters) -> Result<RedirectPetition> {
        redirect::redirect_petition(&self.engine, &self.urls.redirect, params)
    }

    pub fn process_notification(&self, body: &MerchantNotification) -> Result<GatewayResponse> {
        notification::process_notification(&self.engine, body)
    }

    /// Decodes `Ds_MerchantParameters` without verifying it.
    pub fn decode_notification_parameters(&self, payload: Option<&str>) -> Result<NotificationParams> {
        notification::decode_parameters(payload)
    }

    pub fn process_notification_parameters(
        &self,
        params: NotificationParams,
        raw_payload: &str,
        signature: Option<&str>,
    ) -> Result<GatewayResponse> {
        notification::verify_parameters(&self.engine, params, raw_payload, signature)
    }

    /// The signed `<REQUEST>` document for a web-service petition.
    pub fn xml_petition_signed_data(&self, params: &OrderParameters) -> Result<String> {
        petition::petition_request(&self.engine, params)
    }

    pub fn process_xml_petition_response(&self, raw: &str) -> Result<GatewayResponse> {
        petition::process_petition_response(&self.engine, raw)
    }

    /// Returns the shared transport, connecting on first use.
    pub async fn ws_client(&self) -> Result<TransportHandle> {
        let handle = self
            .transport
            .get_or_try_init(|| async {
                let connector = self.connector.as_ref().ok_or_else(|| {
                    RedsysError::Configuration("No web service transport configured".to_string())
                })?;
                tracing::debug!(url = %self.urls.web_service, "connecting web service transport");
                connector.connect(&self.urls.web_service).await
            })
            .await?;
        Ok(Arc::clone(handle))
    }

    /// Sends a signed petition, verifies the answer and applies the business
    /// code rule.
    pub async fn ws_petition(&self, params: &OrderParameters) -> Result<GatewayResponse> {
        let request = self.xml_petition_signed_data(params)?;
        let transport = self.ws_client().await?;
        let raw = transport.process_petition(&request).await?;

        let response = self.process_xml_petition_response(&raw)?;
        let checked = petition::check_business_code(response, &self.pending_response_codes, &raw);
        if let Err(RedsysError::Gateway { code, .. }) = &checked {
            tracing::warn!(code, "web service petition denied");
        }
        checked
    }

    pub fn process_soap_notification(&self, raw: &str) -> Result<GatewayResponse> {
        soap_notification::process_soap_notification(&self.engine, raw)
    }

    pub fn soap_notification_answer(&self, order: &str, accepted: bool) -> Result<String> {
        soap_notification::soap_notification_answer(&self.engine, order, accepted)
    }
}

#[cfg(feature = "http-transport")]
fn default_connector() -> Option<TransportConnectorBox> {
    Some(Box::new(crate::infrastructure::http::HttpConnector::default()))
}

#[cfg(not(feature = "http-transport"))]
fn default_connector() -> Option<TransportConnectorBox> {
    None
}
