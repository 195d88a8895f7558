use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Trade state reported for a completed payment.
pub const TRADE_STATE_SUCCESS: &str = "SUCCESS";

/// The payment order a notification concerns, as resolved from the decrypted
/// notification fields.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct PayOrder {
    /// Merchant-side order number.
    pub order_no: String,
    /// Provider-side transaction id.
    pub transaction_id: Option<String>,
    pub trade_state: String,
    /// Open id of the payer, scoped to the paying application.
    pub open_id: Option<String>,
    /// Amount in minor units.
    pub amount_total: Option<i64>,
    pub success_time: Option<String>,
}

impl PayOrder {
    /// Builds an order from decrypted notification fields.
    ///
    /// Returns `None` when `out_trade_no` is missing, since the order cannot be
    /// identified without it.
    pub fn from_fields(fields: &HashMap<String, Value>) -> Option<Self> {
        let text = |key: &str| fields.get(key).and_then(Value::as_str).map(str::to_string);

        let order_no = text("out_trade_no").filter(|s| !s.is_empty())?;
        Some(Self {
            order_no,
            transaction_id: text("transaction_id"),
            trade_state: text("trade_state").unwrap_or_default(),
            open_id: fields
                .get("payer")
                .and_then(|p| p.get("openid"))
                .and_then(Value::as_str)
                .map(str::to_string),
            amount_total: fields
                .get("amount")
                .and_then(|a| a.get("total"))
                .and_then(Value::as_i64),
            success_time: text("success_time"),
        })
    }

    pub fn open_id(&self) -> Option<&str> {
        self.open_id.as_deref().filter(|s| !s.is_empty())
    }

    pub fn is_paid(&self) -> bool {
        self.trade_state == TRADE_STATE_SUCCESS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> HashMap<String, Value> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_from_fields_full() {
        let order = PayOrder::from_fields(&fields(json!({
            "out_trade_no": "O1",
            "transaction_id": "T1",
            "trade_state": "SUCCESS",
            "payer": {"openid": "o-1"},
            "amount": {"total": 100, "currency": "CNY"},
            "success_time": "2024-01-01T10:00:00+08:00"
        })))
        .unwrap();

        assert_eq!(order.order_no, "O1");
        assert_eq!(order.transaction_id.as_deref(), Some("T1"));
        assert_eq!(order.open_id(), Some("o-1"));
        assert_eq!(order.amount_total, Some(100));
        assert!(order.is_paid());
    }

    #[test]
    fn test_from_fields_requires_order_no() {
        assert!(PayOrder::from_fields(&fields(json!({"transaction_id": "T1"}))).is_none());
        assert!(PayOrder::from_fields(&fields(json!({"out_trade_no": ""}))).is_none());
    }

    #[test]
    fn test_missing_payer_has_no_open_id() {
        let order = PayOrder::from_fields(&fields(json!({"out_trade_no": "O1"}))).unwrap();
        assert_eq!(order.open_id(), None);
        assert!(!order.is_paid());
    }
}
