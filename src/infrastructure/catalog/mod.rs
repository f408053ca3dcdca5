//! Static gateway lookup tables.
//!
//! The tables are embedded CSV files parsed once, on first use, into
//! process-wide read-only maps.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::LazyLock;

const CURRENCIES_CSV: &str = include_str!("data/currencies.csv");
const COUNTRIES_CSV: &str = include_str!("data/countries.csv");
const LANGUAGES_CSV: &str = include_str!("data/languages.csv");
const RESPONSE_CODES_CSV: &str = include_str!("data/response_codes.csv");
const SIS_ERROR_CODES_CSV: &str = include_str!("data/sis_error_codes.csv");

const AUTHORISED_MESSAGE: &str = "Authorised transaction for payments and preauthorizations";

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Currency {
    pub code: String,
    pub num: u16,
    pub name: String,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Country {
    pub alpha2: String,
    pub num: u16,
    pub name: String,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Language {
    pub lang: String,
    pub code: u16,
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct CodeMessage<K> {
    code: K,
    message: String,
}

fn load<T: DeserializeOwned>(data: &str) -> Vec<T> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(data.as_bytes())
        .into_deserialize()
        .filter_map(|row| row.ok())
        .collect()
}

static CURRENCIES: LazyLock<Vec<Currency>> = LazyLock::new(|| load(CURRENCIES_CSV));
static COUNTRIES: LazyLock<Vec<Country>> = LazyLock::new(|| load(COUNTRIES_CSV));
static LANGUAGES: LazyLock<Vec<Language>> = LazyLock::new(|| load(LANGUAGES_CSV));

static CURRENCY_BY_CODE: LazyLock<HashMap<&'static str, &'static Currency>> =
    LazyLock::new(|| CURRENCIES.iter().map(|c| (c.code.as_str(), c)).collect());

static RESPONSE_CODES: LazyLock<HashMap<u32, String>> = LazyLock::new(|| {
    load::<CodeMessage<u32>>(RESPONSE_CODES_CSV)
        .into_iter()
        .map(|row| (row.code, row.message))
        .collect()
});

static SIS_ERROR_CODES: LazyLock<HashMap<String, String>> = LazyLock::new(|| {
    load::<CodeMessage<String>>(SIS_ERROR_CODES_CSV)
        .into_iter()
        .map(|row| (row.code, row.message))
        .collect()
});

/// Looks up a currency by its ISO 4217 alphabetic code, ignoring case.
pub fn currency_by_code(code: &str) -> Option<&'static Currency> {
    CURRENCY_BY_CODE
        .get(code.to_ascii_uppercase().as_str())
        .copied()
}

/// Looks up a currency by its ISO 4217 numeric code.
pub fn currency_by_num(num: u16) -> Option<&'static Currency> {
    CURRENCIES.iter().find(|c| c.num == num)
}

/// Looks up a country by its ISO 3166 alpha-2 code, ignoring case.
pub fn country_by_alpha2(alpha2: &str) -> Option<&'static Country> {
    COUNTRIES
        .iter()
        .find(|c| c.alpha2.eq_ignore_ascii_case(alpha2))
}

pub fn country_by_num(num: u16) -> Option<&'static Country> {
    COUNTRIES.iter().find(|c| c.num == num)
}

/// Looks up a consumer language by its ISO 639-1 code, ignoring case.
pub fn language_by_lang(lang: &str) -> Option<&'static Language> {
    LANGUAGES.iter().find(|l| l.lang.eq_ignore_ascii_case(lang))
}

pub fn language_by_code(code: u16) -> Option<&'static Language> {
    LANGUAGES.iter().find(|l| l.code == code)
}

/// Describes a `Ds_Response` business code.
///
/// Every code from 0 to 99 is an authorisation.
pub fn response_code_message(code: u32) -> Option<&'static str> {
    if code <= 99 {
        return Some(AUTHORISED_MESSAGE);
    }
    RESPONSE_CODES.get(&code).map(String::as_str)
}

/// Describes a web-service `CODIGO` error such as `SIS0051`.
pub fn sis_error_message(code: &str) -> Option<&'static str> {
    SIS_ERROR_CODES
        .get(code.to_ascii_uppercase().as_str())
        .map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data_rows(data: &str) -> usize {
        data.lines().skip(1).filter(|l| !l.trim().is_empty()).count()
    }

    #[test]
    fn test_every_embedded_row_parses() {
        assert_eq!(CURRENCIES.len(), data_rows(CURRENCIES_CSV));
        assert_eq!(COUNTRIES.len(), data_rows(COUNTRIES_CSV));
        assert_eq!(LANGUAGES.len(), data_rows(LANGUAGES_CSV));
        assert_eq!(RESPONSE_CODES.len(), data_rows(RESPONSE_CODES_CSV));
        assert_eq!(SIS_ERROR_CODES.len(), data_rows(SIS_ERROR_CODES_CSV));
    }

    #[test]
    fn test_currency_lookup_ignores_case() {
        let eur = currency_by_code("eur").unwrap();
        assert_eq!(eur.num, 978);
        assert_eq!(currency_by_num(978).unwrap().code, "EUR");
        assert!(currency_by_code("XXX").is_none());
    }

    #[test]
    fn test_country_and_language_lookup() {
        assert_eq!(country_by_alpha2("ES").unwrap().num, 724);
        assert_eq!(country_by_num(724).unwrap().alpha2, "es");
        assert_eq!(language_by_lang("EN").unwrap().code, 2);
        assert_eq!(language_by_code(3).unwrap().lang, "ca");
    }

    #[test]
    fn test_every_iso_country_is_known() {
        assert_eq!(COUNTRIES.len(), 249);
        assert_eq!(country_by_alpha2("ID").unwrap().num, 360);
        assert_eq!(country_by_alpha2("vn").unwrap().num, 704);
        assert_eq!(country_by_alpha2("KW").unwrap().num, 414);
        assert_eq!(country_by_num(4).unwrap().alpha2, "af");
        assert!(country_by_alpha2("XX").is_none());
    }

    #[test]
    fn test_response_code_messages() {
        assert_eq!(response_code_message(0), Some(AUTHORISED_MESSAGE));
        assert_eq!(response_code_message(99), Some(AUTHORISED_MESSAGE));
        assert_eq!(response_code_message(116), Some("Insufficient funds"));
        assert!(response_code_message(12345).is_none());
    }

    #[test]
    fn test_sis_error_messages() {
        assert_eq!(
            sis_error_message("SIS0051"),
            Some("Duplicate order number")
        );
        assert_eq!(
            sis_error_message("sis0042"),
            Some("Signature sent is not correct")
        );
        assert!(sis_error_message("SIS9999").is_none());
    }
}
