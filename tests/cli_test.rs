mod common;

use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use common::{SECRET, signed_notification, temp_file};
use predicates::prelude::*;
use std::process::Command;

fn redsys() -> Command {
    let mut cmd = Command::new(cargo_bin!("redsys"));
    cmd.env("REDSYS_SECRET_KEY", SECRET).env_remove("RUST_LOG");
    cmd
}

const ORDER_JSON: &str = r#"{
    "amount": "145",
    "order": "1446068581",
    "merchantCode": "999008881",
    "currency": "EUR",
    "transactionType": "0",
    "terminal": "1"
}"#;

#[test]
fn test_sign_known_vector() {
    redsys()
        .args(["sign", "--order", "123456789012", "hello"])
        .assert()
        .success()
        .stdout("yL8fQEQCy8BUrTX3w0pjKdDAD1/hqwti+q4oajkW9iU=\n");
}

#[test]
fn test_missing_secret_fails() {
    let mut cmd = Command::new(cargo_bin!("redsys"));
    cmd.env_remove("REDSYS_SECRET_KEY")
        .args(["sign", "--order", "1", "x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("secret key"));
}

#[test]
fn test_redirect_from_order_file() -> Result<(), Box<dyn std::error::Error>> {
    let file = temp_file(ORDER_JSON)?;

    redsys()
        .arg("redirect")
        .arg("--order-file")
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("https://sis-t.redsys.es:25443/sis/realizarPago"))
        .stdout(predicate::str::contains(
            "uQxo3sW38OfnF07uUCUQtqfpsCFwaA2ubQxEpqDNSbo=",
        ))
        .stdout(predicate::str::contains("\"Ds_SignatureVersion\": \"HMAC_SHA256_V1\""));

    redsys()
        .args(["--environment", "production", "redirect", "--order-file"])
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("https://sis.redsys.es/sis/realizarPago"));

    Ok(())
}

#[test]
fn test_redirect_rejects_unknown_parameter() -> Result<(), Box<dyn std::error::Error>> {
    let file = temp_file(r#"{"amount":"1","order":"1","merchantCode":"1","transactionType":"0","foo":"x"}"#)?;

    redsys()
        .arg("redirect")
        .arg("--order-file")
        .arg(file.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("foo"));

    Ok(())
}

#[test]
fn test_petition_request() -> Result<(), Box<dyn std::error::Error>> {
    let file = temp_file(ORDER_JSON)?;

    redsys()
        .arg("petition-request")
        .arg("--order-file")
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::starts_with("<REQUEST><DATOSENTRADA>"))
        .stdout(predicate::str::contains("<DS_MERCHANT_CURRENCY>978</DS_MERCHANT_CURRENCY>"));

    Ok(())
}

#[test]
fn test_verify_notification_json_and_form() -> Result<(), Box<dyn std::error::Error>> {
    let (payload, signature) = signed_notification(
        "1446068581",
        r#"{"Ds_Order":"1446068581","Ds_Amount":"145","Ds_Currency":"978","Ds_Response":"0000"}"#,
    );

    let json = temp_file(&format!(
        r#"{{"Ds_SignatureVersion":"HMAC_SHA256_V1","Ds_MerchantParameters":"{payload}","Ds_Signature":"{signature}"}}"#
    ))?;
    redsys()
        .arg("verify-notification")
        .arg(json.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"order\": \"1446068581\""))
        .stdout(predicate::str::contains("\"currency\": \"EUR\""));

    let form = temp_file(&format!(
        "Ds_SignatureVersion=HMAC_SHA256_V1&Ds_MerchantParameters={}&Ds_Signature={}",
        urlencoding::encode(&payload),
        urlencoding::encode(&signature)
    ))?;
    redsys()
        .arg("verify-notification")
        .arg(form.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"amount\": \"145\""));

    let forged = temp_file(&format!(
        r#"{{"Ds_MerchantParameters":"{payload}","Ds_Signature":"AAAA"}}"#
    ))?;
    redsys()
        .arg("verify-notification")
        .arg(forged.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid signature"));

    Ok(())
}

#[test]
fn test_soap_notification_and_answer() -> Result<(), Box<dyn std::error::Error>> {
    let request = "<Request Ds_Version=\"0.0\"><Ds_Order>123456789012</Ds_Order><Ds_Response>0000</Ds_Response></Request>";
    let signature = common::engine().sign("123456789012", request)?;
    let message = format!("<Message>{request}<Signature>{signature}</Signature></Message>");
    let envelope = format!(
        "<soapenv:Envelope xmlns:soapenv=\"http://schemas.xmlsoap.org/soap/envelope/\"><soapenv:Body>\
         <ns0:procesaNotificacionSIS xmlns:ns0=\"InotificacionSIS\"><XML>{}</XML></ns0:procesaNotificacionSIS>\
         </soapenv:Body></soapenv:Envelope>",
        message.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
    );

    for contents in [message, envelope] {
        let file = temp_file(&contents)?;
        redsys()
            .arg("verify-soap-notification")
            .arg(file.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("\"order\": \"123456789012\""));
    }

    redsys()
        .args(["soap-answer", "--order", "123456789012"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "<Signature>1mVDBJfzvGCpzSUIgHeHbk1W83pPe8CY0E12FUc6dRU=</Signature>",
        ));

    redsys()
        .args(["soap-answer", "--order", "1", "--reject", "--envelope", "soap12"])
        .assert()
        .success()
        .stdout(predicate::str::contains("http://www.w3.org/2003/05/soap-envelope"))
        .stdout(predicate::str::contains("KO"));

    Ok(())
}

#[test]
fn test_transaction_id() {
    Command::new(cargo_bin!("redsys"))
        .arg("transaction-id")
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"^[0-9]{4}[0-9A-Za-z]{8}\n$").unwrap());
}
