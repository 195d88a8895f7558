use super::account::Account;
use super::order::PayOrder;
use crate::error::NotifyError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

pub const REPLY_SUCCESS: &str = "SUCCESS";
pub const REPLY_FAIL: &str = "FAIL";

/// Reply sent back to the payment provider.
///
/// Any non-2xx status makes the provider resend the notification on its own
/// schedule.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct NotifyResponse {
    #[serde(skip)]
    pub status: u16,
    pub code: String,
    pub message: String,
}

impl NotifyResponse {
    pub fn acknowledged() -> Self {
        Self {
            status: 200,
            code: REPLY_SUCCESS.to_string(),
            message: "OK".to_string(),
        }
    }

    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            code: REPLY_FAIL.to_string(),
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// JSON body in the shape the provider expects.
    pub fn body(&self) -> String {
        serde_json::json!({ "code": self.code, "message": self.message }).to_string()
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeKind {
    Success,
    Failure,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Decoding,
    Configuration,
    NotImplemented,
    Timeout,
    ProviderReported,
}

/// Why a notification ended on the failure path.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct FailureReason {
    pub kind: FailureKind,
    pub message: String,
}

impl FailureReason {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Reply used when no reactor prepared one.
    pub fn default_response(&self) -> NotifyResponse {
        let status = match self.kind {
            FailureKind::Decoding | FailureKind::ProviderReported => 400,
            FailureKind::Configuration | FailureKind::NotImplemented | FailureKind::Timeout => {
                500
            }
        };
        NotifyResponse::rejected(status, self.message.clone())
    }
}

impl From<&NotifyError> for FailureReason {
    fn from(err: &NotifyError) -> Self {
        let kind = match err {
            NotifyError::Configuration(_) => FailureKind::Configuration,
            NotifyError::NotImplemented(_) => FailureKind::NotImplemented,
            NotifyError::Timeout { .. } => FailureKind::Timeout,
            NotifyError::ProviderReported(_) => FailureKind::ProviderReported,
            _ => FailureKind::Decoding,
        };
        Self::new(kind, err.to_string())
    }
}

/// A verified and decrypted payment notification.
#[derive(Debug, Clone, PartialEq)]
pub struct PaySuccess {
    pub pay_order: PayOrder,
    pub account: Account,
    pub decrypt_data: HashMap<String, Value>,
    pub response: Option<NotifyResponse>,
}

/// A notification that could not be verified, decrypted or accepted.
///
/// Order and account are whatever could be resolved before the failure.
#[derive(Debug, Clone, PartialEq)]
pub struct PayFailure {
    pub pay_order: Option<PayOrder>,
    pub account: Option<Account>,
    pub reason: FailureReason,
    pub response: Option<NotifyResponse>,
}

/// Outcome event published once per inbound notification.
///
/// Reactors receive it by `&mut` in registration order and may replace
/// `response`; the last value set is the one returned to the provider.
#[derive(Debug, Clone, PartialEq)]
pub enum CallbackOutcome {
    Success(PaySuccess),
    Failure(PayFailure),
}

impl CallbackOutcome {
    pub fn success(
        pay_order: PayOrder,
        account: Account,
        decrypt_data: HashMap<String, Value>,
    ) -> Self {
        CallbackOutcome::Success(PaySuccess {
            pay_order,
            account,
            decrypt_data,
            response: None,
        })
    }

    pub fn failure(
        pay_order: Option<PayOrder>,
        account: Option<Account>,
        reason: FailureReason,
    ) -> Self {
        CallbackOutcome::Failure(PayFailure {
            pay_order,
            account,
            reason,
            response: None,
        })
    }

    pub fn kind(&self) -> OutcomeKind {
        match self {
            CallbackOutcome::Success(_) => OutcomeKind::Success,
            CallbackOutcome::Failure(_) => OutcomeKind::Failure,
        }
    }

    pub fn pay_order(&self) -> Option<&PayOrder> {
        match self {
            CallbackOutcome::Success(s) => Some(&s.pay_order),
            CallbackOutcome::Failure(f) => f.pay_order.as_ref(),
        }
    }

    pub fn response(&self) -> Option<&NotifyResponse> {
        match self {
            CallbackOutcome::Success(s) => s.response.as_ref(),
            CallbackOutcome::Failure(f) => f.response.as_ref(),
        }
    }

    pub fn set_response(&mut self, response: NotifyResponse) {
        match self {
            CallbackOutcome::Success(s) => s.response = Some(response),
            CallbackOutcome::Failure(f) => f.response = Some(response),
        }
    }

    /// Consumes the event and returns the reply for the provider.
    pub fn into_response(self) -> NotifyResponse {
        match self {
            CallbackOutcome::Success(s) => s.response.unwrap_or_else(NotifyResponse::acknowledged),
            CallbackOutcome::Failure(f) => f
                .response
                .unwrap_or_else(|| f.reason.default_response()),
        }
    }
}
