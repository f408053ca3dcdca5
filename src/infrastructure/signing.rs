use crate::error::{RedsysError, Result};
use base64::Engine;
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD};
use base64::engine::DecodePaddingMode;
use cbc::cipher::block_padding::NoPadding;
use cbc::cipher::generic_array::GenericArray;
use cbc::cipher::{BlockEncryptMut, KeyIvInit};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

type HmacSha256 = Hmac<Sha256>;
type TdesCbcEnc = cbc::Encryptor<des::TdesEde3>;

/// Identifier transmitted alongside every signed payload.
pub const SIGNATURE_VERSION: &str = "HMAC_SHA256_V1";

const BLOCK_SIZE: usize = 8;
const SECRET_LEN: usize = 24;

/// Accepts standard base64 with or without padding.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// The merchant's shared secret: a 3DES key, delivered base64-encoded.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretKey([u8; SECRET_LEN]);

impl SecretKey {
    pub fn from_base64(encoded: &str) -> Result<Self> {
        if encoded.is_empty() {
            return Err(RedsysError::Configuration(
                "A secret key must be provided".to_string(),
            ));
        }
        let mut raw = STANDARD.decode(encoded).map_err(|_| {
            RedsysError::Configuration("Secret key is not valid base64".to_string())
        })?;
        let key = <[u8; SECRET_LEN]>::try_from(raw.as_slice()).map_err(|_| {
            RedsysError::Configuration(format!(
                "Secret key must decode to {SECRET_LEN} bytes, got {}",
                raw.len()
            ))
        });
        raw.zeroize();
        Ok(Self(key?))
    }

    pub fn from_bytes(bytes: [u8; SECRET_LEN]) -> Self {
        Self(bytes)
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(..)")
    }
}

/// Per-order HMAC key. Lives only for the duration of one sign or verify call.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SigningKey(Vec<u8>);

impl SigningKey {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningKey(..)")
    }
}

/// Derives per-order keys and computes or checks `HMAC_SHA256_V1` signatures.
///
/// Stateless apart from the secret, so a single engine can be shared freely
/// across threads.
#[derive(Clone, Debug)]
pub struct SigningEngine {
    secret: SecretKey,
}

impl SigningEngine {
    pub fn new(secret: SecretKey) -> Self {
        Self { secret }
    }

    pub fn from_base64(secret: &str) -> Result<Self> {
        SecretKey::from_base64(secret).map(Self::new)
    }

    /// Encrypts the zero-padded order id with 3DES-CBC under a zero IV.
    pub fn derive_key(&self, order: &str) -> SigningKey {
        let mut padded = order.as_bytes().to_vec();
        let rem = padded.len() % BLOCK_SIZE;
        if rem != 0 {
            padded.resize(padded.len() + BLOCK_SIZE - rem, 0);
        }

        let iv = [0u8; BLOCK_SIZE];
        let cipher = TdesCbcEnc::new(
            GenericArray::from_slice(&self.secret.0[..]),
            GenericArray::from_slice(&iv[..]),
        );
        let key = cipher.encrypt_padded_vec_mut::<NoPadding>(&padded);
        padded.zeroize();
        SigningKey(key)
    }

    fn mac(&self, order: &str, message: &str) -> Result<HmacSha256> {
        let key = self.derive_key(order);
        let mut mac = HmacSha256::new_from_slice(key.as_bytes())
            .map_err(|e| RedsysError::Configuration(format!("Invalid derived key: {e}")))?;
        mac.update(message.as_bytes());
        Ok(mac)
    }

    /// Signs the exact UTF-8 bytes of `message`; returns padded base64.
    pub fn sign(&self, order: &str, message: &str) -> Result<String> {
        let digest = self.mac(order, message)?.finalize().into_bytes();
        tracing::debug!(order, len = message.len(), "signed message");
        Ok(STANDARD.encode(digest))
    }

    /// Checks `provided` against the expected signature over decoded bytes.
    ///
    /// `provided` may be padded base64 or unpadded base64url. Any failure,
    /// including an undecodable signature, yields `false`.
    pub fn verify(&self, order: &str, message: &str, provided: &str) -> bool {
        let Some(provided) = Signature::decode(provided) else {
            tracing::debug!(order, "signature is not decodable");
            return false;
        };
        match self.mac(order, message) {
            Ok(mac) => mac.verify_slice(provided.as_bytes()).is_ok(),
            Err(_) => false,
        }
    }
}

/// Raw signature bytes.
///
/// The gateway mixes padded base64 and unpadded base64url, so equality is
/// defined over the decoded bytes only.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signature(Vec<u8>);

impl Signature {
    /// Decodes either base64 alphabet, padding optional.
    pub fn decode(encoded: &str) -> Option<Self> {
        decode_base64(encoded).map(Self)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.0)
    }
}

/// Decodes standard or URL-safe base64, with or without padding.
pub fn decode_base64(encoded: &str) -> Option<Vec<u8>> {
    let normalized: String = encoded
        .trim()
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();
    LENIENT.decode(normalized).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;

    const TEST_SECRET: &str = "sq7HjrUOBfKmC576ILgskD5srU870gJ7";

    fn engine() -> SigningEngine {
        SigningEngine::from_base64(TEST_SECRET).unwrap()
    }

    #[test]
    fn test_derive_key_known_vectors() {
        let engine = engine();
        assert_eq!(
            engine.derive_key("123456789012").as_bytes(),
            [
                0x9e, 0xd5, 0x6b, 0x24, 0xfc, 0x69, 0xdb, 0x19, 0x27, 0x3a, 0x6b, 0xa2, 0x22, 0x2c,
                0x90, 0xa6
            ]
        );
        // Exactly one block: no padding appended.
        assert_eq!(
            engine.derive_key("12345678").as_bytes(),
            [0x9e, 0xd5, 0x6b, 0x24, 0xfc, 0x69, 0xdb, 0x19]
        );
    }

    #[test]
    fn test_sign_known_vector() {
        let signature = engine().sign("123456789012", "hello").unwrap();
        assert_eq!(signature, "yL8fQEQCy8BUrTX3w0pjKdDAD1/hqwti+q4oajkW9iU=");
    }

    #[test]
    fn test_sign_is_deterministic_and_verifies() {
        let engine = engine();
        let a = engine.sign("0001abc", "payload").unwrap();
        let b = engine.sign("0001abc", "payload").unwrap();
        assert_eq!(a, b);
        assert!(engine.verify("0001abc", "payload", &a));
    }

    #[test]
    fn test_verify_accepts_base64url_without_padding() {
        let engine = engine();
        let signature = engine.sign("123456789012", "hello").unwrap();
        let raw = STANDARD.decode(&signature).unwrap();
        let url = URL_SAFE_NO_PAD.encode(raw);
        assert_ne!(url, signature);
        assert!(engine.verify("123456789012", "hello", &url));
        assert!(engine.verify(
            "123456789012",
            "hello",
            signature.trim_end_matches('=')
        ));
    }

    #[test]
    fn test_signature_equality_is_over_bytes() {
        let padded = Signature::decode("yL8fQEQCy8BUrTX3w0pjKdDAD1/hqwti+q4oajkW9iU=").unwrap();
        let url = Signature::decode("yL8fQEQCy8BUrTX3w0pjKdDAD1_hqwti-q4oajkW9iU").unwrap();
        assert_eq!(padded, url);
        assert_eq!(url.to_base64(), "yL8fQEQCy8BUrTX3w0pjKdDAD1/hqwti+q4oajkW9iU=");
        assert_eq!(padded.as_bytes().len(), 32);
    }

    #[test]
    fn test_message_is_not_normalized() {
        let engine = engine();
        let signature = engine.sign("1234", "hello").unwrap();
        assert!(!engine.verify("1234", "hello ", &signature));
        assert!(!engine.verify("1234", "Hello", &signature));
    }

    #[test]
    fn test_verify_rejects_garbage() {
        let engine = engine();
        assert!(!engine.verify("1234", "hello", ""));
        assert!(!engine.verify("1234", "hello", "not base64!!"));
    }

    #[test]
    fn test_secret_key_validation() {
        assert!(matches!(
            SecretKey::from_base64(""),
            Err(RedsysError::Configuration(_))
        ));
        assert!(matches!(
            SecretKey::from_base64("%%%"),
            Err(RedsysError::Configuration(_))
        ));
        assert!(matches!(
            SecretKey::from_base64("c2hvcnQ="),
            Err(RedsysError::Configuration(_))
        ));
    }

    #[test]
    fn test_debug_does_not_leak_keys() {
        let engine = engine();
        let rendered = format!("{:?} {:?}", engine, engine.derive_key("1234"));
        assert!(!rendered.contains(TEST_SECRET));
        assert!(rendered.contains("SecretKey(..)"));
        assert!(rendered.contains("SigningKey(..)"));
    }
}
