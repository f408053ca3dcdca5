use crate::error::{RedsysError, Result};
use serde::{Deserialize, Serialize};
use url::Url;

/// A published pair of gateway endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoints {
    pub redirect: &'static str,
    pub web_service: &'static str,
}

pub const PRODUCTION_URLS: Endpoints = Endpoints {
    redirect: "https://sis.redsys.es/sis/realizarPago",
    web_service: "https://sis.redsys.es/sis/services/SerClsWSEntrada/wsdl/SerClsWSEntrada.wsdl",
};

pub const SANDBOX_URLS: Endpoints = Endpoints {
    redirect: "https://sis-t.redsys.es:25443/sis/realizarPago",
    web_service: "https://sis-t.redsys.es:25443/sis/services/SerClsWSEntrada/wsdl/SerClsWSEntrada.wsdl",
};

/// Business codes above 100 that are reported as results rather than errors
/// by the web-service flow.
pub const DEFAULT_PENDING_RESPONSE_CODES: [u32; 2] = [400, 600];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct GatewayUrls {
    pub redirect: String,
    pub web_service: String,
}

impl From<Endpoints> for GatewayUrls {
    fn from(endpoints: Endpoints) -> Self {
        Self {
            redirect: endpoints.redirect.to_string(),
            web_service: endpoints.web_service.to_string(),
        }
    }
}

/// Parsed, validated endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedUrls {
    pub redirect: Url,
    pub web_service: Url,
}

impl GatewayUrls {
    pub fn validate(&self) -> Result<ValidatedUrls> {
        if self.redirect.is_empty() || self.web_service.is_empty() {
            return Err(RedsysError::Configuration(
                "URLs must be provided".to_string(),
            ));
        }
        let parse = |name: &str, value: &str| {
            Url::parse(value).map_err(|e| {
                RedsysError::Configuration(format!("Invalid {name} URL `{value}`: {e}"))
            })
        };
        Ok(ValidatedUrls {
            redirect: parse("redirect", &self.redirect)?,
            web_service: parse("web service", &self.web_service)?,
        })
    }
}

fn default_pending_response_codes() -> Vec<u32> {
    DEFAULT_PENDING_RESPONSE_CODES.to_vec()
}

/// Everything needed to build a gateway client.
#[derive(Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base64-encoded merchant secret.
    pub secret_key: String,
    pub urls: GatewayUrls,
    #[serde(default = "default_pending_response_codes")]
    pub pending_response_codes: Vec<u32>,
}

impl ClientConfig {
    pub fn new(secret_key: impl Into<String>, urls: impl Into<GatewayUrls>) -> Self {
        Self {
            secret_key: secret_key.into(),
            urls: urls.into(),
            pending_response_codes: default_pending_response_codes(),
        }
    }

    pub fn with_pending_response_codes(mut self, codes: Vec<u32>) -> Self {
        self.pending_response_codes = codes;
        self
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("secret_key", &"..")
            .field("urls", &self.urls)
            .field("pending_response_codes", &self.pending_response_codes)
            .finish()
    }
}
