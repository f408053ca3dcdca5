use crate::application::{canonical, formatter};
use crate::domain::order::OrderParameters;
use crate::error::{RedsysError, Result};
use crate::infrastructure::signing::{SIGNATURE_VERSION, SigningEngine};
use serde::Serialize;
use url::Url;

/// Form fields posted by the shopper's browser to the gateway.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RedirectForm {
    #[serde(rename = "Ds_SignatureVersion")]
    pub signature_version: String,
    #[serde(rename = "Ds_MerchantParameters")]
    pub merchant_parameters: String,
    #[serde(rename = "Ds_Signature")]
    pub signature: String,
}

/// A signed redirect: submit `body` as form fields to `url`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RedirectPetition {
    pub url: String,
    pub body: RedirectForm,
}

/// Formats `params` and returns the base64 `Ds_MerchantParameters` blob.
pub fn redirect_parameters(params: &OrderParameters) -> Result<String> {
    let payload = formatter::format_params(params)?;
    canonical::redirect_parameters(&payload)
}

/// Builds the signed redirect instruction. Performs no I/O.
pub fn redirect_petition(
    engine: &SigningEngine,
    redirect_url: &Url,
    params: &OrderParameters,
) -> Result<RedirectPetition> {
    let merchant_parameters = redirect_parameters(params)?;
    let order = params
        .order()
        .ok_or_else(|| RedsysError::validation("No order reference provided", "order", None))?;
    let signature = engine.sign(&order, &merchant_parameters)?;

    Ok(RedirectPetition {
        url: redirect_url.to_string(),
        body: RedirectForm {
            signature_version: SIGNATURE_VERSION.to_string(),
            merchant_parameters,
            signature,
        },
    })
}
