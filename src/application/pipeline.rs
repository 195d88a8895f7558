use super::event_bus::EventBus;
use crate::config::{AccountConfig, OversizePolicy, PipelineConfig};
use crate::domain::event::{CallbackOutcome, FailureReason, NotifyResponse};
use crate::domain::notification::{InboundNotification, MAX_RAW_DATA_LEN, NotificationRecord};
use crate::domain::ports::{NotificationStoreBox, PaymentSdkBox, VerificationError};
use crate::error::{NotifyError, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// Entry point for inbound payment notifications.
///
/// For every notification the pipeline:
/// 1. writes an audit [`NotificationRecord`] (always, before anything else),
/// 2. resolves the addressed account and verifies/decrypts the payload,
/// 3. publishes a [`CallbackOutcome`] to the [`EventBus`],
/// 4. returns the reply prepared by reactors, or a default one.
///
/// The pipeline holds no per-request state, so one instance can serve
/// concurrent notifications.
pub struct NotificationPipeline {
    records: NotificationStoreBox,
    sdk: PaymentSdkBox,
    accounts: HashMap<String, Arc<AccountConfig>>,
    bus: EventBus,
    config: PipelineConfig,
}

impl NotificationPipeline {
    /// Creates a new `NotificationPipeline`.
    ///
    /// # Arguments
    ///
    /// * `records` - Sink for audit records.
    /// * `sdk` - The provider's verify/decrypt implementation.
    /// * `accounts` - Accounts notifications may be addressed to.
    /// * `bus` - Reactors to notify, already registered.
    /// * `config` - Timeouts and oversize policy.
    pub fn new(
        records: NotificationStoreBox,
        sdk: PaymentSdkBox,
        accounts: Vec<AccountConfig>,
        bus: EventBus,
        config: PipelineConfig,
    ) -> Self {
        let accounts = accounts
            .into_iter()
            .map(|a| (a.id.clone(), Arc::new(a)))
            .collect();
        Self {
            records,
            sdk,
            accounts,
            bus,
            config,
        }
    }

    /// Processes one notification and returns the reply for the provider.
    ///
    /// Only a failed audit write is returned as `Err`; in that case nothing is
    /// published. Every other failure becomes a published failure event.
    pub async fn handle_notification(
        &self,
        notification: InboundNotification,
    ) -> Result<NotifyResponse> {
        tracing::info!(
            account = %notification.account_id,
            bytes = notification.body.len(),
            "notification received"
        );

        self.persist(&notification).await?;

        let mut event = self.resolve(&notification).await;
        match &event {
            CallbackOutcome::Success(s) => tracing::info!(
                account = %s.account.id,
                order = %s.pay_order.order_no,
                "notification verified"
            ),
            CallbackOutcome::Failure(f) => tracing::warn!(
                account = %notification.account_id,
                order = ?event.pay_order().map(|o| o.order_no.as_str()),
                kind = ?f.reason.kind,
                reason = %f.reason.message,
                "notification rejected"
            ),
        }

        self.bus.publish(&mut event).await;
        Ok(event.into_response())
    }

    /// Like [`handle_notification`](Self::handle_notification), but turns a
    /// failed audit write into a rejection so the caller always has a reply.
    pub async fn reply(&self, notification: InboundNotification) -> NotifyResponse {
        match self.handle_notification(notification).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(error = %e, "notification could not be recorded");
                NotifyResponse::rejected(500, e.to_string())
            }
        }
    }

    async fn persist(&self, notification: &InboundNotification) -> Result<()> {
        let record = NotificationRecord::received(&notification.body);
        if record.is_truncated(notification.body.len()) {
            tracing::warn!(
                id = %record.id(),
                bytes = notification.body.len(),
                limit = MAX_RAW_DATA_LEN,
                "payload truncated for audit record"
            );
        }

        let id = record.id();
        tokio::time::timeout(self.config.storage_timeout(), self.records.insert(record))
            .await
            .map_err(|_| NotifyError::Timeout {
                operation: "audit record insert",
            })??;
        tracing::debug!(%id, "audit record stored");
        Ok(())
    }

    async fn resolve(&self, notification: &InboundNotification) -> CallbackOutcome {
        let Some(account) = self.accounts.get(&notification.account_id) else {
            let err = NotifyError::Configuration(format!(
                "unknown account '{}'",
                notification.account_id
            ));
            return CallbackOutcome::failure(None, None, FailureReason::from(&err));
        };

        if notification.body.len() > MAX_RAW_DATA_LEN
            && self.config.oversize_policy == OversizePolicy::Reject
        {
            let err = NotifyError::Decoding(format!(
                "payload of {} bytes exceeds {} byte limit",
                notification.body.len(),
                MAX_RAW_DATA_LEN
            ));
            return CallbackOutcome::failure(
                None,
                Some(account.account()),
                FailureReason::from(&err),
            );
        }

        let verified = tokio::time::timeout(
            self.config.sdk_timeout(),
            self.sdk.verify_and_decrypt(notification, account),
        )
        .await
        .unwrap_or_else(|_| {
            Err(VerificationError::new(NotifyError::Timeout {
                operation: "verify and decrypt",
            }))
        });

        match verified {
            Ok(v) => CallbackOutcome::success(v.pay_order, account.account(), v.fields),
            Err(VerificationError { error, pay_order }) => CallbackOutcome::failure(
                pay_order,
                Some(account.account()),
                FailureReason::from(&error),
            ),
        }
    }
}
