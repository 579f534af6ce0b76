use crate::domain::leave::LeaveRequest;
use crate::domain::ports::{LeaveStore, UserDirectory};
use crate::domain::user::User;
use crate::error::{LeaveError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, IteratorMode, Options, WriteBatch};
use std::path::Path;
use std::sync::Arc;

/// Column Family for the user directory, keyed by username.
pub const CF_USERS: &str = "users";
/// Column Family for leave requests, keyed by big-endian id.
pub const CF_LEAVES: &str = "leaves";
/// Column Family mapping big-endian registration sequence to username.
pub const CF_USER_ORDER: &str = "user_order";

/// A persistent store implementation using RocksDB.
///
/// Serves both the user directory and the leave store from separate Column
/// Families. Values are JSON. Big-endian id keys make iteration follow id
/// order.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that the required column families exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cfs = [CF_USERS, CF_LEAVES, CF_USER_ORDER]
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect::<Vec<_>>();

        let db = DB::open_cf_descriptors(&opts, path, cfs)?;
        Ok(Self { db: Arc::new(db) })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db.cf_handle(name).ok_or_else(|| {
            LeaveError::InternalError(Box::new(std::io::Error::other(format!(
                "{name} column family not found"
            ))))
        })
    }

    /// Sequence number for the next newly registered user. Callers must
    /// serialize registrations; `LeaveEngine` does so with its write lock.
    fn next_user_seq(&self) -> Result<u64> {
        let order = self.cf(CF_USER_ORDER)?;
        match self.db.iterator_cf(order, IteratorMode::End).next() {
            Some(item) => {
                let (k, _) = item?;
                let bytes: [u8; 8] = k.as_ref().try_into().map_err(|_| {
                    LeaveError::InternalError(Box::new(std::io::Error::other(
                        "Corrupt user order key",
                    )))
                })?;
                Ok(u64::from_be_bytes(bytes) + 1)
            }
            None => Ok(0),
        }
    }

    fn values<T: serde::de::DeserializeOwned>(&self, cf_name: &str) -> Result<Vec<T>> {
        let cf = self.cf(cf_name)?;
        let mut items = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_key, value) = item?;
            items.push(serde_json::from_slice(&value)?);
        }
        Ok(items)
    }
}

#[async_trait]
impl UserDirectory for RocksDBStore {
    async fn store(&self, user: User) -> Result<()> {
        let users = self.cf(CF_USERS)?;
        let key = user.username.as_bytes();
        let mut batch = WriteBatch::default();
        batch.put_cf(users, key, serde_json::to_vec(&user)?);

        // The record and its order entry land together or not at all.
        if self.db.get_pinned_cf(users, key)?.is_none() {
            let order = self.cf(CF_USER_ORDER)?;
            batch.put_cf(order, self.next_user_seq()?.to_be_bytes(), key);
        }
        self.db.write(batch)?;
        Ok(())
    }

    async fn get(&self, username: &str) -> Result<Option<User>> {
        let users = self.cf(CF_USERS)?;
        match self.db.get_pinned_cf(users, username.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn all(&self) -> Result<Vec<User>> {
        let users = self.cf(CF_USERS)?;
        let order = self.cf(CF_USER_ORDER)?;
        let mut result = Vec::new();
        for item in self.db.iterator_cf(order, IteratorMode::Start) {
            let (_seq, username) = item?;
            if let Some(bytes) = self.db.get_pinned_cf(users, &username)? {
                result.push(serde_json::from_slice(&bytes)?);
            }
        }
        Ok(result)
    }
}

#[async_trait]
impl LeaveStore for RocksDBStore {
    async fn append(&self, request: LeaveRequest) -> Result<()> {
        let cf = self.cf(CF_LEAVES)?;
        let key = request.id.to_be_bytes();
        if self.db.get_pinned_cf(cf, key)?.is_some() {
            return Err(LeaveError::ValidationError(format!(
                "Leave request {} already exists",
                request.id
            )));
        }
        self.db.put_cf(cf, key, serde_json::to_vec(&request)?)?;
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<LeaveRequest>> {
        self.values(CF_LEAVES)
    }

    async fn find_by_id(&self, id: u64) -> Result<Option<LeaveRequest>> {
        let cf = self.cf(CF_LEAVES)?;
        match self.db.get_pinned_cf(cf, id.to_be_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn update(&self, request: LeaveRequest) -> Result<()> {
        let cf = self.cf(CF_LEAVES)?;
        let key = request.id.to_be_bytes();
        if self.db.get_pinned_cf(cf, key)?.is_none() {
            return Err(LeaveError::RequestNotFound(request.id));
        }
        self.db.put_cf(cf, key, serde_json::to_vec(&request)?)?;
        Ok(())
    }

    async fn last_id(&self) -> Result<u64> {
        let cf = self.cf(CF_LEAVES)?;
        match self.db.iterator_cf(cf, IteratorMode::End).next() {
            Some(item) => {
                let (_key, value) = item?;
                let request: LeaveRequest = serde_json::from_slice(&value)?;
                Ok(request.id)
            }
            None => Ok(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::approval::{ApprovalStep, RoleKey, StepStatus};
    use crate::domain::leave::{LeaveCategory, LeaveDraft};
    use crate::domain::user::{Position, Role, RoleSet};
    use chrono::{NaiveDate, Utc};
    use tempfile::tempdir;

    fn user(name: &str, roles: &[Role]) -> User {
        User::new(
            name,
            "pass",
            roles.iter().copied().collect::<RoleSet>(),
            Position::CivilServant,
            "Academic",
        )
    }

    fn request(id: u64) -> LeaveRequest {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let draft = LeaveDraft {
            category: LeaveCategory::Sick,
            department: "Academic".to_string(),
            start: date,
            end: date,
            reason: String::new(),
            attachment: None,
        };
        let steps = vec![
            ApprovalStep::new(RoleKey::Supervisor, Some("sup".into()), StepStatus::Pending),
            ApprovalStep::new(RoleKey::Hr, Some("hr".into()), StepStatus::Pending),
        ];
        LeaveRequest::new(id, &user("alice", &[Role::Employee]), draft, steps, Utc::now())
    }

    #[tokio::test]
    async fn test_rocksdb_open_cf() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).expect("Failed to open RocksDB");

        assert!(store.db.cf_handle(CF_USERS).is_some());
        assert!(store.db.cf_handle(CF_LEAVES).is_some());
        assert!(store.db.cf_handle(CF_USER_ORDER).is_some());
    }

    #[tokio::test]
    async fn test_rocksdb_user_directory_keeps_registration_order() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();

        UserDirectory::store(&store, user("zoe", &[Role::Mentor])).await.unwrap();
        UserDirectory::store(&store, user("adam", &[Role::Mentor])).await.unwrap();
        UserDirectory::store(&store, user("zoe", &[Role::Supervisor])).await.unwrap();

        let all = store.all().await.unwrap();
        let names: Vec<&str> = all.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, vec!["zoe", "adam"]);
        assert!(all[0].has(Role::Supervisor));

        let mentor = store.find_first_by_role(Role::Mentor).await.unwrap().unwrap();
        assert_eq!(mentor.username, "adam");
    }

    #[tokio::test]
    async fn test_rocksdb_user_survives_reopen_with_order_entry() {
        let dir = tempdir().unwrap();
        {
            let store = RocksDBStore::open(dir.path()).unwrap();
            UserDirectory::store(&store, user("sup_acad", &[Role::Supervisor])).await.unwrap();
        }

        let store = RocksDBStore::open(dir.path()).unwrap();
        let order = store.cf(CF_USER_ORDER).unwrap();
        let entries: Vec<_> = store
            .db
            .iterator_cf(order, IteratorMode::Start)
            .map(|item| item.unwrap())
            .collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0.as_ref(), 0u64.to_be_bytes());
        assert_eq!(entries[0].1.as_ref(), b"sup_acad");

        assert!(store.get("sup_acad").await.unwrap().is_some());
        let names: Vec<String> = store
            .all()
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.username)
            .collect();
        assert_eq!(names, vec!["sup_acad"]);
    }

    #[tokio::test]
    async fn test_concurrent_seeding_keeps_every_user_listed() {
        use crate::application::engine::LeaveEngine;
        use crate::config::WorkflowConfig;
        use std::sync::Arc;

        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();
        let engine = Arc::new(LeaveEngine::new(
            Box::new(store.clone()),
            Box::new(store.clone()),
            WorkflowConfig::default(),
        ));

        let mut handles = Vec::new();
        for i in 0..8 {
            let engine = engine.clone();
            handles.push(tokio::spawn(async move {
                let name = format!("user{i}");
                engine.seed_users(vec![user(&name, &[Role::Employee])]).await.unwrap()
            }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap(), 1);
        }

        assert_eq!(store.all().await.unwrap().len(), 8);
    }

    #[tokio::test]
    async fn test_rocksdb_leave_store() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();

        assert_eq!(store.last_id().await.unwrap(), 0);
        store.append(request(1)).await.unwrap();
        store.append(request(300)).await.unwrap();
        assert!(store.append(request(1)).await.is_err());

        let ids: Vec<u64> = store.list_all().await.unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 300]);
        assert_eq!(store.last_id().await.unwrap(), 300);

        let mut req = store.find_by_id(1).await.unwrap().unwrap();
        req.steps[0].status = StepStatus::Rejected;
        store.update(req.clone()).await.unwrap();
        assert_eq!(store.find_by_id(1).await.unwrap().unwrap(), req);

        assert!(matches!(
            store.update(request(2)).await,
            Err(LeaveError::RequestNotFound(2))
        ));
    }
}
