#![allow(dead_code)]

use async_trait::async_trait;
use paynotify::config::{AccountConfig, CipherSuite};
use paynotify::domain::account::Account;
use paynotify::domain::event::CallbackOutcome;
use paynotify::domain::notification::{InboundNotification, NotifyHeaders};
use paynotify::domain::ports::{IdentityResolver, Reactor};
use paynotify::error::{NotifyError, Result};
use paynotify::infrastructure::provider_sdk::{encrypt_resource, sign};
use serde_json::{Value, json};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const KEY: &str = "0123456789abcdef0123456789abcdef";
pub const SECRET: &str = "notify-secret";
pub const TIMESTAMP: &str = "1700000000";
pub const NONCE: &str = "n-1";

pub fn account_config(id: &str) -> AccountConfig {
    AccountConfig {
        id: id.to_string(),
        app_id: format!("app-{id}"),
        merchant_id: format!("m-{id}"),
        api_v3_key: KEY.to_string(),
        notify_secret: SECRET.to_string(),
        cipher: CipherSuite::AeadAes256Gcm,
        identity: None,
    }
}

pub fn paid_resource(order_no: &str, open_id: &str) -> Value {
    json!({
        "out_trade_no": order_no,
        "transaction_id": "T1",
        "trade_state": "SUCCESS",
        "payer": {"openid": open_id},
        "amount": {"total": 100, "currency": "CNY"}
    })
}

/// Builds an encrypted notification envelope around `resource`.
pub fn envelope(event_type: &str, resource: &Value) -> Vec<u8> {
    let ciphertext =
        encrypt_resource(KEY, "abcdefghijkl", "transaction", resource.to_string().as_bytes())
            .unwrap();
    serde_json::to_vec(&json!({
        "id": "evt-1",
        "create_time": "2024-01-01T10:00:00+08:00",
        "event_type": event_type,
        "resource_type": "encrypt-resource",
        "summary": "payment succeeded",
        "resource": {
            "algorithm": "AEAD_AES_256_GCM",
            "ciphertext": ciphertext,
            "associated_data": "transaction",
            "nonce": "abcdefghijkl",
            "original_type": "transaction"
        }
    }))
    .unwrap()
}

pub fn headers_for(body: &[u8]) -> NotifyHeaders {
    NotifyHeaders {
        timestamp: TIMESTAMP.to_string(),
        nonce: NONCE.to_string(),
        signature: sign(SECRET, TIMESTAMP, NONCE, body).unwrap(),
        serial: None,
    }
}

pub fn signed(account_id: &str, body: Vec<u8>) -> InboundNotification {
    let headers = headers_for(&body);
    InboundNotification::new(account_id, headers, body)
}

/// Reactor that records every event it sees and optionally sets a reply.
#[derive(Default)]
pub struct RecordingReactor {
    pub name: &'static str,
    pub seen: Mutex<Vec<CallbackOutcome>>,
    pub reply: Option<paynotify::domain::event::NotifyResponse>,
}

impl RecordingReactor {
    pub fn named(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            ..Default::default()
        })
    }

    pub fn seen(&self) -> Vec<CallbackOutcome> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Reactor for RecordingReactor {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn react(&self, event: &mut CallbackOutcome) -> Result<()> {
        self.seen.lock().unwrap().push(event.clone());
        if let Some(reply) = &self.reply {
            event.set_response(reply.clone());
        }
        Ok(())
    }
}

pub struct FailingReactor;

#[async_trait]
impl Reactor for FailingReactor {
    fn name(&self) -> &'static str {
        "failing"
    }

    async fn react(&self, _event: &mut CallbackOutcome) -> Result<()> {
        Err(NotifyError::Reactor {
            reactor: "failing",
            message: "downstream unavailable".to_string(),
        })
    }
}

/// Identity resolver answering with a fixed union id and counting calls.
pub struct StubResolver {
    pub calls: AtomicUsize,
    pub union_id: Option<String>,
}

impl StubResolver {
    pub fn answering(union_id: Option<&str>) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            union_id: union_id.map(str::to_string),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityResolver for StubResolver {
    async fn resolve_union_id(&self, _account: &Account, _open_id: &str) -> Result<Option<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.union_id.clone())
    }
}

/// Config file contents for CLI tests.
pub fn config_json(account_id: &str) -> String {
    json!({
        "accounts": [{
            "id": account_id,
            "app_id": "app-1",
            "merchant_id": "m-1",
            "api_v3_key": KEY,
            "notify_secret": SECRET,
            "cipher": "AEAD_AES_256_GCM"
        }],
        "pipeline": {"sdk_timeout_ms": 2000, "storage_timeout_ms": 2000}
    })
    .to_string()
}
