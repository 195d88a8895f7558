use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Largest payload kept in an audit record, in bytes.
pub const MAX_RAW_DATA_LEN: usize = 65_535;

/// Append-only audit entry for one inbound notification.
///
/// Records are written before the payload is verified and are never updated
/// afterwards. They carry no reference to orders or accounts.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct NotificationRecord {
    id: Uuid,
    raw_data: Option<Vec<u8>>,
    create_time: Option<DateTime<Utc>>,
}

impl NotificationRecord {
    /// Creates a record stamped with the current time.
    ///
    /// Payloads above [`MAX_RAW_DATA_LEN`] are truncated to that length.
    pub fn received(raw: &[u8]) -> Self {
        Self::received_at(raw, Utc::now())
    }

    pub fn received_at(raw: &[u8], at: DateTime<Utc>) -> Self {
        let kept = &raw[..raw.len().min(MAX_RAW_DATA_LEN)];
        Self {
            id: Uuid::new_v4(),
            raw_data: Some(kept.to_vec()),
            create_time: Some(at),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn raw_data(&self) -> Option<&[u8]> {
        self.raw_data.as_deref()
    }

    pub fn create_time(&self) -> Option<DateTime<Utc>> {
        self.create_time
    }

    /// True when the stored payload is shorter than what was received.
    pub fn is_truncated(&self, received_len: usize) -> bool {
        self.raw_data.as_ref().map_or(0, Vec::len) < received_len
    }
}

/// Signature headers sent alongside a notification body.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Default)]
pub struct NotifyHeaders {
    pub timestamp: String,
    pub nonce: String,
    pub signature: String,
    /// Serial of the certificate or key the provider signed with.
    pub serial: Option<String>,
}

/// An inbound notification as handed over by the transport layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundNotification {
    /// Account the callback is addressed to, taken from the request route.
    pub account_id: String,
    pub headers: NotifyHeaders,
    pub body: Vec<u8>,
}

impl InboundNotification {
    pub fn new(account_id: impl Into<String>, headers: NotifyHeaders, body: Vec<u8>) -> Self {
        Self {
            account_id: account_id.into(),
            headers,
            body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_received_keeps_payload_and_time() {
        let record = NotificationRecord::received(b"{\"id\":\"evt-1\"}");
        assert_eq!(record.raw_data(), Some(&b"{\"id\":\"evt-1\"}"[..]));
        assert!(record.create_time().is_some());
        assert!(!record.is_truncated(14));
    }

    #[test]
    fn test_received_truncates_oversized_payload() {
        let raw = vec![b'x'; MAX_RAW_DATA_LEN + 10];
        let record = NotificationRecord::received(&raw);
        assert_eq!(record.raw_data().unwrap().len(), MAX_RAW_DATA_LEN);
        assert!(record.is_truncated(raw.len()));
    }

    #[test]
    fn test_ids_are_unique() {
        let a = NotificationRecord::received(b"a");
        let b = NotificationRecord::received(b"a");
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_record_json_roundtrip_preserves_bytes() {
        let record = NotificationRecord::received(&[0, 159, 146, 150]);
        let json = serde_json::to_vec(&record).unwrap();
        let back: NotificationRecord = serde_json::from_slice(&json).unwrap();
        assert_eq!(back, record);
    }
}
