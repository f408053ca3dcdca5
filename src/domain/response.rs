use crate::domain::fields::{FIELDS, Transform};
use crate::infrastructure::catalog;
use serde::Serialize;
use std::collections::BTreeMap;

/// A gateway response or notification, translated to semantic names.
///
/// Protocol names are matched case-insensitively since the web service
/// answers in upper case (`DS_ORDER`) where notifications use `Ds_Order`.
/// The untranslated fields are kept in `raw`.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayResponse {
    pub order: Option<String>,
    pub amount: Option<String>,
    /// ISO 4217 alphabetic code when known, the numeric code otherwise.
    pub currency: Option<String>,
    pub merchant_code: Option<String>,
    pub terminal: Option<String>,
    pub transaction_type: Option<String>,
    /// Business response code (`Ds_Response`).
    pub response: Option<u32>,
    pub response_description: Option<&'static str>,
    pub authorisation_code: Option<String>,
    pub secure_payment: Option<bool>,
    pub date: Option<String>,
    pub hour: Option<String>,
    /// ISO 3166 alpha-2 code when known, the numeric code otherwise.
    pub card_country: Option<String>,
    pub card_type: Option<String>,
    pub card_brand: Option<String>,
    pub card_number: Option<String>,
    pub lang: Option<String>,
    pub merchant_data: Option<String>,
    pub identifier: Option<String>,
    /// Month-year order (`MMYY`), as the caller supplied it.
    pub expiry_date: Option<String>,
    pub error_code: Option<String>,
    pub raw: BTreeMap<String, String>,
}

fn lookup<'a>(raw: &'a BTreeMap<String, String>, names: &[&str]) -> Option<&'a str> {
    names.iter().find_map(|name| {
        raw.iter()
            .find(|(k, v)| k.eq_ignore_ascii_case(name) && !v.is_empty())
            .map(|(_, v)| v.as_str())
    })
}

/// Reverses the outbound transform of an echoed field.
fn reverse(transform: Transform, value: &str) -> String {
    let numeric = value.trim().parse::<u16>().ok();
    match transform {
        Transform::Plain | Transform::Amount => value.to_string(),
        Transform::Currency => numeric
            .and_then(catalog::currency_by_num)
            .map(|c| c.code.clone())
            .unwrap_or_else(|| value.to_string()),
        Transform::Country => numeric
            .and_then(catalog::country_by_num)
            .map(|c| c.alpha2.clone())
            .unwrap_or_else(|| value.to_string()),
        Transform::Language => numeric
            .and_then(catalog::language_by_code)
            .map(|l| l.lang.clone())
            .unwrap_or_else(|| value.to_string()),
        Transform::ExpiryDate if value.len() == 4 && value.is_ascii() => {
            format!("{}{}", &value[2..4], &value[..2])
        }
        Transform::ExpiryDate => value.to_string(),
    }
}

impl GatewayResponse {
    pub fn from_fields(raw: BTreeMap<String, String>) -> Self {
        let echoed = |key: &str| {
            FIELDS
                .iter()
                .find(|f| f.key == key)
                .and_then(|f| Some((f.transform, lookup(&raw, &[f.inbound?])?)))
                .map(|(transform, value)| reverse(transform, value))
        };
        let text = |names: &[&str]| lookup(&raw, names).map(str::to_string);
        let response = lookup(&raw, &["Ds_Response"]).and_then(|r| r.trim().parse::<u32>().ok());

        Self {
            order: echoed("order"),
            amount: echoed("amount"),
            currency: echoed("currency"),
            merchant_code: echoed("merchantCode"),
            terminal: echoed("terminal"),
            transaction_type: echoed("transactionType"),
            response,
            response_description: response.and_then(catalog::response_code_message),
            authorisation_code: text(&["Ds_AuthorisationCode"]),
            secure_payment: lookup(&raw, &["Ds_SecurePayment"]).map(|v| v.trim() == "1"),
            date: text(&["Ds_Date", "Fecha"]),
            hour: text(&["Ds_Hour", "Hora"]),
            card_country: echoed("cardCountry"),
            card_type: text(&["Ds_Card_Type"]),
            card_brand: text(&["Ds_Card_Brand"]),
            card_number: text(&["Ds_Card_Number", "Ds_CardNumber"]),
            lang: echoed("lang"),
            merchant_data: echoed("merchantData"),
            identifier: echoed("identifier"),
            expiry_date: echoed("expiryDate"),
            error_code: text(&["Ds_ErrorCode"]),
            raw,
        }
    }

    /// The translated value of a semantic order key, if the response echoes it.
    pub fn semantic_value(&self, key: &str) -> Option<&str> {
        let value = match key {
            "order" => &self.order,
            "amount" => &self.amount,
            "currency" => &self.currency,
            "merchantCode" => &self.merchant_code,
            "terminal" => &self.terminal,
            "transactionType" => &self.transaction_type,
            "cardCountry" => &self.card_country,
            "lang" => &self.lang,
            "merchantData" => &self.merchant_data,
            "identifier" => &self.identifier,
            "expiryDate" => &self.expiry_date,
            _ => return None,
        };
        value.as_deref()
    }

    /// A business code above 100 is a denial, unless it is one of `exempt`.
    pub fn is_denied(&self, exempt: &[u32]) -> bool {
        matches!(self.response, Some(code) if code > 100 && !exempt.contains(&code))
    }
}
