//! Reference adapter for the provider's notification format.
//!
//! - HMAC-SHA256 request signature over `"{timestamp}\n{nonce}\n{body}\n"`
//! - AEAD_AES_256_GCM resource encryption with the account's API v3 key
//!
//! The encoding helpers at the bottom produce the provider side of the
//! exchange and are used to build fixtures.

use crate::config::{AccountConfig, CipherSuite};
use crate::domain::notification::{InboundNotification, NotifyHeaders};
use crate::domain::order::PayOrder;
use crate::domain::ports::{PaymentSdk, VerificationError, VerifiedNotification};
use crate::error::{NotifyError, Result};
use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Nonce};
use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::Sha256;
use std::collections::HashMap;

/// Nonce size for AES-GCM (96 bits / 12 bytes).
const NONCE_SIZE: usize = 12;

pub const EVENT_TRANSACTION_SUCCESS: &str = "TRANSACTION.SUCCESS";

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct EncryptedResource {
    pub algorithm: String,
    pub ciphertext: String,
    #[serde(default)]
    pub associated_data: Option<String>,
    pub nonce: String,
    #[serde(default)]
    pub original_type: Option<String>,
}

/// Outer JSON document of a notification.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct NotifyEnvelope {
    pub id: String,
    #[serde(default)]
    pub create_time: Option<String>,
    pub event_type: String,
    #[serde(default)]
    pub resource_type: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    pub resource: EncryptedResource,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ProviderSdk;

impl ProviderSdk {
    pub fn new() -> Self {
        Self
    }

    fn verify_signature(headers: &NotifyHeaders, body: &[u8], secret: &str) -> Result<()> {
        let expected = hex::decode(headers.signature.trim())
            .map_err(|e| NotifyError::Decoding(format!("signature is not hex: {e}")))?;
        signing_mac(secret, &headers.timestamp, &headers.nonce, body)?
            .verify_slice(&expected)
            .map_err(|_| NotifyError::Decoding("signature mismatch".to_string()))
    }

    fn decrypt_resource(resource: &EncryptedResource, account: &AccountConfig) -> Result<Vec<u8>> {
        match CipherSuite::from_algorithm(&resource.algorithm) {
            Some(CipherSuite::AeadAes256Gcm) => {}
            Some(other) => {
                return Err(NotifyError::NotImplemented(format!(
                    "{} decryption is not supported by this build",
                    other.algorithm()
                )));
            }
            None => {
                return Err(NotifyError::Decoding(format!(
                    "unknown resource algorithm '{}'",
                    resource.algorithm
                )));
            }
        }
        if resource.algorithm != account.cipher.algorithm() {
            return Err(NotifyError::Configuration(format!(
                "account '{}' expects {}, notification uses {}",
                account.id,
                account.cipher.algorithm(),
                resource.algorithm
            )));
        }

        let nonce = resource.nonce.as_bytes();
        if nonce.len() != NONCE_SIZE {
            return Err(NotifyError::Decoding(format!(
                "resource nonce must be {NONCE_SIZE} bytes, got {}",
                nonce.len()
            )));
        }

        let ciphertext = BASE64
            .decode(resource.ciphertext.trim())
            .map_err(|e| NotifyError::Decoding(format!("ciphertext is not base64: {e}")))?;
        let cipher = Aes256Gcm::new_from_slice(account.api_v3_key.as_bytes())
            .map_err(|e| NotifyError::Configuration(format!("invalid api_v3_key: {e}")))?;

        cipher
            .decrypt(
                Nonce::from_slice(nonce),
                Payload {
                    msg: &ciphertext,
                    aad: resource.associated_data.as_deref().unwrap_or("").as_bytes(),
                },
            )
            .map_err(|_| NotifyError::Decoding("resource decryption failed".to_string()))
    }
}

#[async_trait]
impl PaymentSdk for ProviderSdk {
    async fn verify_and_decrypt(
        &self,
        notification: &InboundNotification,
        account: &AccountConfig,
    ) -> std::result::Result<VerifiedNotification, VerificationError> {
        if !account.cipher.is_supported() {
            return Err(NotifyError::NotImplemented(format!(
                "account '{}' uses unsupported cipher {}",
                account.id,
                account.cipher.algorithm()
            ))
            .into());
        }

        Self::verify_signature(&notification.headers, &notification.body, &account.notify_secret)?;

        let envelope: NotifyEnvelope = serde_json::from_slice(&notification.body)
            .map_err(|e| NotifyError::Decoding(format!("malformed envelope: {e}")))?;
        let plaintext = Self::decrypt_resource(&envelope.resource, account)?;

        let fields: HashMap<String, Value> = serde_json::from_slice(&plaintext)
            .map_err(|e| NotifyError::Decoding(format!("resource is not a JSON object: {e}")))?;
        let pay_order = PayOrder::from_fields(&fields).ok_or_else(|| {
            NotifyError::Decoding("unknown order reference: resource has no out_trade_no".to_string())
        })?;

        if envelope.event_type != EVENT_TRANSACTION_SUCCESS || !pay_order.is_paid() {
            let error = NotifyError::ProviderReported(format!(
                "event {} with trade state '{}'",
                envelope.event_type, pay_order.trade_state
            ));
            return Err(VerificationError::with_order(error, pay_order));
        }

        Ok(VerifiedNotification { pay_order, fields })
    }
}

fn signing_mac(secret: &str, timestamp: &str, nonce: &str, body: &[u8]) -> Result<HmacSha256> {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(secret.as_bytes())
        .map_err(|e| NotifyError::Configuration(format!("invalid notify_secret: {e}")))?;
    mac.update(timestamp.as_bytes());
    mac.update(b"\n");
    mac.update(nonce.as_bytes());
    mac.update(b"\n");
    mac.update(body);
    mac.update(b"\n");
    Ok(mac)
}

/// Computes the hex signature the provider sends for `body`.
pub fn sign(secret: &str, timestamp: &str, nonce: &str, body: &[u8]) -> Result<String> {
    let mac = signing_mac(secret, timestamp, nonce, body)?;
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Encrypts `plaintext` the way the provider encrypts notification resources.
///
/// Returns base64(ciphertext || tag).
pub fn encrypt_resource(key: &str, nonce: &str, aad: &str, plaintext: &[u8]) -> Result<String> {
    if nonce.len() != NONCE_SIZE {
        return Err(NotifyError::Configuration(format!(
            "nonce must be {NONCE_SIZE} bytes"
        )));
    }
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| NotifyError::Configuration(format!("invalid key: {e}")))?;
    let sealed = cipher
        .encrypt(
            Nonce::from_slice(nonce.as_bytes()),
            Payload {
                msg: plaintext,
                aad: aad.as_bytes(),
            },
        )
        .map_err(|_| NotifyError::Configuration("encryption failed".to_string()))?;
    Ok(BASE64.encode(sealed))
}
