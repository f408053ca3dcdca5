#![allow(dead_code)]

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use redsys::infrastructure::signing::SigningEngine;
use redsys::{ClientConfig, OrderParameters, Redsys, SANDBOX_URLS};
use std::io::{Error, Write};
use tempfile::NamedTempFile;

pub const SECRET: &str = "sq7HjrUOBfKmC576ILgskD5srU870gJ7";

pub fn client() -> Redsys {
    Redsys::new(ClientConfig::new(SECRET, SANDBOX_URLS)).unwrap()
}

pub fn engine() -> SigningEngine {
    SigningEngine::from_base64(SECRET).unwrap()
}

pub fn order() -> OrderParameters {
    OrderParameters::new()
        .with("amount", "145")
        .with("order", "1446068581")
        .with("merchantCode", "999008881")
        .with("currency", "EUR")
        .with("transactionType", "0")
        .with("terminal", "1")
}

/// A merchant notification payload signed for `order`: (Ds_MerchantParameters, Ds_Signature).
pub fn signed_notification(order: &str, json: &str) -> (String, String) {
    let payload = STANDARD.encode(json);
    let signature = engine().sign(order, &payload).unwrap();
    (payload, signature)
}

pub fn temp_file(contents: &str) -> Result<NamedTempFile, Error> {
    let mut file = NamedTempFile::new()?;
    file.write_all(contents.as_bytes())?;
    file.flush()?;
    Ok(file)
}
