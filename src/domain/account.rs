use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The tenant/application a notification is addressed to.
///
/// Carries identifiers only. Keys and secrets stay in
/// [`AccountConfig`](crate::config::AccountConfig).
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct Account {
    /// Local identifier, as used in the inbound route or CLI flag.
    pub id: String,
    /// Application id the provider issues open ids under.
    pub app_id: String,
    /// Merchant number registered with the provider.
    pub merchant_id: String,
}

/// A local user known by their per-application open id.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct User {
    pub id: Uuid,
    pub open_id: String,
    pub union_id: Option<String>,
}

impl User {
    pub fn new(open_id: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            open_id: open_id.into(),
            union_id: None,
        }
    }

    pub fn has_union_id(&self) -> bool {
        self.union_id.as_deref().is_some_and(|u| !u.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user_has_no_union_id() {
        let user = User::new("o-1");
        assert_eq!(user.open_id, "o-1");
        assert!(!user.has_union_id());
    }

    #[test]
    fn test_empty_union_id_counts_as_missing() {
        let mut user = User::new("o-1");
        user.union_id = Some(String::new());
        assert!(!user.has_union_id());
        user.union_id = Some("u-1".to_string());
        assert!(user.has_union_id());
    }
}
