use crate::domain::account::User;
use crate::domain::notification::NotificationRecord;
use crate::domain::ports::{NotificationStore, UserStore};
use crate::error::{NotifyError, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct AuditLog {
    records: Vec<NotificationRecord>,
    ids: HashSet<Uuid>,
}

/// A thread-safe in-memory audit log.
///
/// Clones share the same log through an `Arc<RwLock<..>>`. Suitable for tests
/// and for runs where persistence is not required.
#[derive(Default, Clone)]
pub struct InMemoryNotificationStore {
    log: Arc<RwLock<AuditLog>>,
}

impl InMemoryNotificationStore {
    /// Creates a new, empty in-memory notification store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all records in insertion order.
    pub async fn records(&self) -> Vec<NotificationRecord> {
        self.log.read().await.records.clone()
    }

    pub async fn len(&self) -> usize {
        self.log.read().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.log.read().await.records.is_empty()
    }
}

#[async_trait]
impl NotificationStore for InMemoryNotificationStore {
    async fn insert(&self, record: NotificationRecord) -> Result<()> {
        let mut log = self.log.write().await;
        if !log.ids.insert(record.id()) {
            return Err(NotifyError::storage(format!(
                "notification record {} already exists",
                record.id()
            )));
        }
        log.records.push(record);
        Ok(())
    }
}

/// A thread-safe in-memory user directory keyed by open id.
#[derive(Default, Clone)]
pub struct InMemoryUserStore {
    users: Arc<RwLock<HashMap<String, User>>>,
    saves: Arc<AtomicUsize>,
}

impl InMemoryUserStore {
    /// Creates a new, empty in-memory user store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `save` calls served so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_open_id(&self, open_id: &str) -> Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users.get(open_id).cloned())
    }

    async fn save(&self, user: User) -> Result<()> {
        let mut users = self.users.write().await;
        users.insert(user.open_id.clone(), user);
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
