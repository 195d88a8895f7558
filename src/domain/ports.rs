use super::account::{Account, User};
use super::event::CallbackOutcome;
use super::notification::{InboundNotification, NotificationRecord};
use super::order::PayOrder;
use crate::config::AccountConfig;
use crate::error::{NotifyError, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Insert-only sink for audit records.
#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn insert(&self, record: NotificationRecord) -> Result<()>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_open_id(&self, open_id: &str) -> Result<Option<User>>;
    async fn save(&self, user: User) -> Result<()>;
}

/// Result of a successful verify-and-decrypt.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedNotification {
    pub pay_order: PayOrder,
    pub fields: HashMap<String, Value>,
}

/// Verification failure plus whatever order context was resolved before it.
#[derive(Debug)]
pub struct VerificationError {
    pub error: NotifyError,
    pub pay_order: Option<PayOrder>,
}

impl VerificationError {
    pub fn new(error: NotifyError) -> Self {
        Self {
            error,
            pay_order: None,
        }
    }

    pub fn with_order(error: NotifyError, pay_order: PayOrder) -> Self {
        Self {
            error,
            pay_order: Some(pay_order),
        }
    }
}

impl From<NotifyError> for VerificationError {
    fn from(error: NotifyError) -> Self {
        Self::new(error)
    }
}

/// The payment provider's verification and decryption routines.
#[async_trait]
pub trait PaymentSdk: Send + Sync {
    async fn verify_and_decrypt(
        &self,
        notification: &InboundNotification,
        account: &AccountConfig,
    ) -> std::result::Result<VerifiedNotification, VerificationError>;
}

/// Account-scoped lookup of a user's cross-application union id.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve_union_id(&self, account: &Account, open_id: &str) -> Result<Option<String>>;
}

/// A listener for outcome events.
#[async_trait]
pub trait Reactor: Send + Sync {
    fn name(&self) -> &'static str;

    async fn react(&self, event: &mut CallbackOutcome) -> Result<()>;
}

pub type NotificationStoreBox = Box<dyn NotificationStore>;
pub type UserStoreArc = Arc<dyn UserStore>;
pub type PaymentSdkBox = Box<dyn PaymentSdk>;
pub type IdentityResolverArc = Arc<dyn IdentityResolver>;
pub type ReactorArc = Arc<dyn Reactor>;
