//! Application configuration, loaded from a JSON file at startup.

use crate::domain::account::Account;
use crate::error::{NotifyError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// Length of an AES-256 key, in bytes.
pub const API_V3_KEY_LEN: usize = 32;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
pub enum CipherSuite {
    #[default]
    #[serde(rename = "AEAD_AES_256_GCM")]
    AeadAes256Gcm,
    #[serde(rename = "AEAD_SM4_GCM")]
    AeadSm4Gcm,
}

impl CipherSuite {
    pub fn algorithm(&self) -> &'static str {
        match self {
            CipherSuite::AeadAes256Gcm => "AEAD_AES_256_GCM",
            CipherSuite::AeadSm4Gcm => "AEAD_SM4_GCM",
        }
    }

    pub fn from_algorithm(name: &str) -> Option<Self> {
        match name {
            "AEAD_AES_256_GCM" => Some(CipherSuite::AeadAes256Gcm),
            "AEAD_SM4_GCM" => Some(CipherSuite::AeadSm4Gcm),
            _ => None,
        }
    }

    pub fn is_supported(&self) -> bool {
        matches!(self, CipherSuite::AeadAes256Gcm)
    }
}

/// Endpoint used to resolve union ids for one account.
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct IdentityApiConfig {
    pub base_url: String,
    pub access_token: String,
}

impl fmt::Debug for IdentityApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityApiConfig")
            .field("base_url", &self.base_url)
            .field("access_token", &"<redacted>")
            .finish()
    }
}

/// Everything needed to verify and decrypt notifications for one account.
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct AccountConfig {
    pub id: String,
    pub app_id: String,
    pub merchant_id: String,
    /// Symmetric key for resource decryption.
    pub api_v3_key: String,
    /// Shared secret for the request signature.
    pub notify_secret: String,
    #[serde(default)]
    pub cipher: CipherSuite,
    #[serde(default)]
    pub identity: Option<IdentityApiConfig>,
}

impl fmt::Debug for AccountConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountConfig")
            .field("id", &self.id)
            .field("app_id", &self.app_id)
            .field("merchant_id", &self.merchant_id)
            .field("cipher", &self.cipher)
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}

impl AccountConfig {
    pub fn account(&self) -> Account {
        Account {
            id: self.id.clone(),
            app_id: self.app_id.clone(),
            merchant_id: self.merchant_id.clone(),
        }
    }

    /// Checks key material and cipher support.
    pub fn validate(&self) -> Result<()> {
        if self.id.is_empty() {
            return Err(NotifyError::Configuration(
                "account id must not be empty".to_string(),
            ));
        }
        if self.api_v3_key.len() != API_V3_KEY_LEN {
            return Err(NotifyError::Configuration(format!(
                "account '{}': api_v3_key must be {} bytes, got {}",
                self.id,
                API_V3_KEY_LEN,
                self.api_v3_key.len()
            )));
        }
        if self.notify_secret.is_empty() {
            return Err(NotifyError::Configuration(format!(
                "account '{}': notify_secret must not be empty",
                self.id
            )));
        }
        if !self.cipher.is_supported() {
            return Err(NotifyError::NotImplemented(format!(
                "account '{}': cipher {} is not supported by this build",
                self.id,
                self.cipher.algorithm()
            )));
        }
        Ok(())
    }
}

/// What to do with payloads above the audit record limit.
///
/// The audit record is truncated in both cases.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "lowercase")]
pub enum OversizePolicy {
    /// Verify the full payload as received.
    #[default]
    Truncate,
    /// Fail the notification without calling the provider SDK.
    Reject,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
#[serde(default)]
pub struct PipelineConfig {
    pub sdk_timeout_ms: u64,
    pub storage_timeout_ms: u64,
    pub oversize_policy: OversizePolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sdk_timeout_ms: 5_000,
            storage_timeout_ms: 2_000,
            oversize_policy: OversizePolicy::Truncate,
        }
    }
}

impl PipelineConfig {
    pub fn sdk_timeout(&self) -> Duration {
        Duration::from_millis(self.sdk_timeout_ms)
    }

    pub fn storage_timeout(&self) -> Duration {
        Duration::from_millis(self.storage_timeout_ms)
    }
}

fn default_identity_timeout_ms() -> u64 {
    3_000
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct AppConfig {
    pub accounts: Vec<AccountConfig>,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default = "default_identity_timeout_ms")]
    pub identity_timeout_ms: u64,
}

impl AppConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads, parses and validates a configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_json(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for account in &self.accounts {
            account.validate()?;
            if !seen.insert(account.id.as_str()) {
                return Err(NotifyError::Configuration(format!(
                    "duplicate account id '{}'",
                    account.id
                )));
            }
        }
        Ok(())
    }

    pub fn identity_timeout(&self) -> Duration {
        Duration::from_millis(self.identity_timeout_ms)
    }
}
