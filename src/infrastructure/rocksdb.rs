use crate::domain::account::User;
use crate::domain::notification::NotificationRecord;
use crate::domain::ports::{NotificationStore, UserStore};
use crate::error::{NotifyError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, Options};
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

/// Column Family for the notification audit log.
pub const CF_NOTIFICATIONS: &str = "notifications";
/// Column Family for users, keyed by open id.
pub const CF_USERS: &str = "users";

/// A persistent store implementation using RocksDB.
///
/// Keeps notification records and users in separate Column Families. Records
/// are keyed by their UUID. `insert` refuses ids already on disk, but the
/// check and the write are separate calls, so two racing inserts of the same
/// id are not detected. Fresh v4 ids never collide in practice.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
}

fn storage_err(e: rocksdb::Error) -> NotifyError {
    NotifyError::Storage(Box::new(e))
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that the required column families exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_notifications = ColumnFamilyDescriptor::new(CF_NOTIFICATIONS, Options::default());
        let cf_users = ColumnFamilyDescriptor::new(CF_USERS, Options::default());

        let db = DB::open_cf_descriptors(&opts, path, vec![cf_notifications, cf_users])
            .map_err(storage_err)?;

        Ok(Self { db: Arc::new(db) })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| NotifyError::storage(format!("{name} column family not found")))
    }

    /// Reads back a stored record. Used for operational replay and tests.
    pub fn record(&self, id: Uuid) -> Result<Option<NotificationRecord>> {
        let cf = self.cf(CF_NOTIFICATIONS)?;
        match self.db.get_cf(cf, id.as_bytes()).map_err(storage_err)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Number of stored notification records.
    pub fn record_count(&self) -> Result<usize> {
        let cf = self.cf(CF_NOTIFICATIONS)?;
        let mut count = 0;
        for item in self.db.iterator_cf(cf, rocksdb::IteratorMode::Start) {
            item.map_err(storage_err)?;
            count += 1;
        }
        Ok(count)
    }
}

#[async_trait]
impl NotificationStore for RocksDBStore {
    async fn insert(&self, record: NotificationRecord) -> Result<()> {
        let cf = self.cf(CF_NOTIFICATIONS)?;
        let key = record.id();

        if self
            .db
            .get_pinned_cf(cf, key.as_bytes())
            .map_err(storage_err)?
            .is_some()
        {
            return Err(NotifyError::storage(format!(
                "notification record {key} already exists"
            )));
        }

        let value = serde_json::to_vec(&record)?;
        self.db
            .put_cf(cf, key.as_bytes(), value)
            .map_err(storage_err)?;
        Ok(())
    }
}

#[async_trait]
impl UserStore for RocksDBStore {
    async fn find_by_open_id(&self, open_id: &str) -> Result<Option<User>> {
        let cf = self.cf(CF_USERS)?;
        match self
            .db
            .get_cf(cf, open_id.as_bytes())
            .map_err(storage_err)?
        {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, user: User) -> Result<()> {
        let cf = self.cf(CF_USERS)?;
        let value = serde_json::to_vec(&user)?;
        self.db
            .put_cf(cf, user.open_id.as_bytes(), value)
            .map_err(storage_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_rocksdb_open_cf() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).expect("Failed to open RocksDB");

        assert!(store.db.cf_handle(CF_NOTIFICATIONS).is_some());
        assert!(store.db.cf_handle(CF_USERS).is_some());
    }

    #[tokio::test]
    async fn test_rocksdb_notification_store() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();

        let record = NotificationRecord::received(b"{\"id\":\"evt\"}");
        store.insert(record.clone()).await.unwrap();

        assert_eq!(store.record(record.id()).unwrap(), Some(record.clone()));
        assert_eq!(store.record_count().unwrap(), 1);

        assert!(matches!(
            store.insert(record).await,
            Err(NotifyError::Storage(_))
        ));
        assert_eq!(store.record_count().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_rocksdb_user_store() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();

        let mut user = User::new("o-1");
        user.union_id = Some("u-1".to_string());
        store.save(user.clone()).await.unwrap();

        let retrieved = store.find_by_open_id("o-1").await.unwrap().unwrap();
        assert_eq!(retrieved, user);
        assert!(store.find_by_open_id("o-2").await.unwrap().is_none());
    }
}
