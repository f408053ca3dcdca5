use crate::domain::fields::{self, EXPIRY_MONTH, EXPIRY_YEAR, FieldSpec, Transform};
use crate::domain::order::{OrderParameters, ParamValue};
use crate::error::{RedsysError, Result};
use crate::infrastructure::catalog;
use std::collections::BTreeMap;

/// Protocol field name to protocol value.
pub type FormattedPayload = BTreeMap<String, String>;

const MAX_AMOUNT_LEN: usize = 12;
const DEFAULT_TERMINAL: &str = "1";
const DEFAULT_CURRENCY: &str = "EUR";

fn required(params: &OrderParameters, key: &str, message: &str) -> Result<()> {
    match params.get(key) {
        Some(_) => Ok(()),
        None => Err(RedsysError::validation(message, key, None)),
    }
}

fn amount(params: &OrderParameters) -> Result<String> {
    match params.get("amount") {
        Some(ParamValue::Text(s)) => Ok(s.clone()),
        Some(ParamValue::Integer(i)) if *i >= 0 => Ok(i.to_string()),
        other => Err(RedsysError::validation(
            "Invalid amount",
            "amount",
            other.map(ParamValue::as_text).as_deref(),
        )),
    }
}

/// Combines separate two-digit month and year into a month-year value.
fn combined_expiry(params: &OrderParameters) -> Result<Option<String>> {
    if params.get("expiryDate").is_some() {
        return Ok(None);
    }
    let (Some(month), Some(year)) = (params.text(EXPIRY_MONTH), params.text(EXPIRY_YEAR)) else {
        return Ok(None);
    };
    if month.chars().count() != 2 {
        return Err(RedsysError::validation(
            "Invalid expiryMonth",
            EXPIRY_MONTH,
            Some(&month),
        ));
    }
    if year.chars().count() != 2 {
        return Err(RedsysError::validation(
            "Invalid expiryYear",
            EXPIRY_YEAR,
            Some(&year),
        ));
    }
    Ok(Some(format!("{month}{year}")))
}

fn apply(spec: &FieldSpec, value: String) -> Result<String> {
    let invalid = |message: &str| RedsysError::validation(message, spec.key, Some(&value));
    match spec.transform {
        Transform::Plain => Ok(value),
        Transform::Amount => {
            if value.len() > MAX_AMOUNT_LEN {
                return Err(invalid("Amount to charge is too large"));
            }
            if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid("Invalid amount"));
            }
            Ok(value)
        }
        Transform::Currency => catalog::currency_by_code(&value)
            .map(|c| format!("{:03}", c.num))
            .ok_or_else(|| invalid("Unsupported currency")),
        Transform::ExpiryDate => {
            if value.len() != 4 || !value.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid("Invalid expiryDate"));
            }
            // Month-year in, year-month out.
            Ok(format!("{}{}", &value[2..4], &value[..2]))
        }
        Transform::Country => catalog::country_by_alpha2(&value)
            .map(|c| c.num.to_string())
            .ok_or_else(|| invalid("Unsupported country")),
        Transform::Language => catalog::language_by_lang(&value)
            .map(|l| format!("{:03}", l.code))
            .ok_or_else(|| invalid("Unsupported language")),
    }
}

/// Validates `params` and maps them onto the protocol vocabulary.
///
/// Defaults (terminal `1`, currency `EUR`) are applied first; override
/// fields are merged last and overwrite anything already set.
pub fn format_params(params: &OrderParameters) -> Result<FormattedPayload> {
    let amount = amount(params)?;
    required(params, "merchantCode", "The merchant code is mandatory")?;
    required(params, "transactionType", "The transaction type is mandatory")?;
    required(params, "order", "No order reference provided")?;
    let expiry = combined_expiry(params)?;

    let mut values: BTreeMap<&str, String> = params
        .fields()
        .filter(|(key, _)| *key != EXPIRY_MONTH && *key != EXPIRY_YEAR)
        .map(|(key, value)| (key, value.as_text()))
        .collect();
    values.insert("amount", amount);
    if let Some(expiry) = expiry {
        values.insert("expiryDate", expiry);
    }
    if params.get("terminal").is_none() {
        values.insert("terminal", DEFAULT_TERMINAL.to_string());
    }
    if params.get("currency").is_none() {
        values.insert("currency", DEFAULT_CURRENCY.to_string());
    }

    let mut payload = FormattedPayload::new();
    for (key, value) in values {
        let spec = fields::by_key(key)
            .ok_or_else(|| RedsysError::validation("Unknown parameter", key, None))?;
        payload.insert(spec.outbound.to_string(), apply(spec, value)?);
    }

    if let Some(overrides) = params.overrides() {
        payload.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
    }

    Ok(payload)
}
