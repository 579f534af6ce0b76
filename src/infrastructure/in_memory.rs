use crate::domain::leave::LeaveRequest;
use crate::domain::ports::{LeaveStore, UserDirectory};
use crate::domain::user::User;
use crate::error::{LeaveError, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory user directory.
///
/// Users are kept in a `Vec` so lookups that return "the first match" follow
/// registration order.
#[derive(Default, Clone)]
pub struct InMemoryUserDirectory {
    users: Arc<RwLock<Vec<User>>>,
}

impl InMemoryUserDirectory {
    /// Creates a new, empty directory.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn store(&self, user: User) -> Result<()> {
        let mut users = self.users.write().await;
        match users.iter_mut().find(|u| u.username == user.username) {
            Some(existing) => *existing = user,
            None => users.push(user),
        }
        Ok(())
    }

    async fn get(&self, username: &str) -> Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.username == username).cloned())
    }

    async fn all(&self) -> Result<Vec<User>> {
        let users = self.users.read().await;
        Ok(users.clone())
    }
}

/// A thread-safe in-memory store for leave requests, keyed and ordered by id.
#[derive(Default, Clone)]
pub struct InMemoryLeaveStore {
    requests: Arc<RwLock<BTreeMap<u64, LeaveRequest>>>,
}

impl InMemoryLeaveStore {
    /// Creates a new, empty leave store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LeaveStore for InMemoryLeaveStore {
    async fn append(&self, request: LeaveRequest) -> Result<()> {
        let mut requests = self.requests.write().await;
        if requests.contains_key(&request.id) {
            return Err(LeaveError::ValidationError(format!(
                "Leave request {} already exists",
                request.id
            )));
        }
        requests.insert(request.id, request);
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<LeaveRequest>> {
        let requests = self.requests.read().await;
        Ok(requests.values().cloned().collect())
    }

    async fn find_by_id(&self, id: u64) -> Result<Option<LeaveRequest>> {
        let requests = self.requests.read().await;
        Ok(requests.get(&id).cloned())
    }

    async fn update(&self, request: LeaveRequest) -> Result<()> {
        let mut requests = self.requests.write().await;
        match requests.get_mut(&request.id) {
            Some(existing) => {
                *existing = request;
                Ok(())
            }
            None => Err(LeaveError::RequestNotFound(request.id)),
        }
    }

    async fn last_id(&self) -> Result<u64> {
        let requests = self.requests.read().await;
        Ok(requests.keys().next_back().copied().unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::approval::{ApprovalStep, RoleKey, StepStatus};
    use crate::domain::leave::{LeaveCategory, LeaveDraft};
    use crate::domain::user::{Position, Role, RoleSet};
    use chrono::{NaiveDate, Utc};

    fn user(name: &str, roles: &[Role], dept: &str) -> User {
        User::new(
            name,
            "pass",
            roles.iter().copied().collect::<RoleSet>(),
            Position::CivilServant,
            dept,
        )
    }

    fn request(id: u64) -> LeaveRequest {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let draft = LeaveDraft {
            category: LeaveCategory::Vacation,
            department: "Academic".to_string(),
            start: date,
            end: date,
            reason: "trip".to_string(),
            attachment: None,
        };
        let steps = vec![
            ApprovalStep::new(RoleKey::Supervisor, None, StepStatus::NoSupervisor),
            ApprovalStep::new(RoleKey::Hr, Some("hr_officer".into()), StepStatus::Pending),
        ];
        LeaveRequest::new(
            id,
            &user("alice", &[Role::Employee], "Academic"),
            draft,
            steps,
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn test_in_memory_user_directory() {
        let directory = InMemoryUserDirectory::new();
        directory
            .store(user("sup_a", &[Role::Supervisor], "Academic"))
            .await
            .unwrap();
        directory
            .store(user("sup_b", &[Role::Supervisor], "Academic"))
            .await
            .unwrap();
        directory.store(user("hr", &[Role::Hr], "Administration")).await.unwrap();

        assert!(directory.get("sup_b").await.unwrap().is_some());
        assert!(directory.get("nobody").await.unwrap().is_none());

        let first = directory
            .find_by_role_and_dept(Role::Supervisor, "Academic")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first.username, "sup_a");

        let hr = directory.find_first_by_role(Role::Hr).await.unwrap().unwrap();
        assert_eq!(hr.username, "hr");

        assert!(
            directory
                .find_by_role_and_dept(Role::Mentor, "Academic")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_in_memory_user_directory_replaces_same_username() {
        let directory = InMemoryUserDirectory::new();
        directory.store(user("carol", &[Role::Employee], "Academic")).await.unwrap();
        directory.store(user("carol", &[Role::Mentor], "Academic")).await.unwrap();

        let all = directory.all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert!(all[0].has(Role::Mentor));
    }

    #[tokio::test]
    async fn test_in_memory_leave_store() {
        let store = InMemoryLeaveStore::new();
        assert_eq!(store.last_id().await.unwrap(), 0);

        store.append(request(2)).await.unwrap();
        store.append(request(1)).await.unwrap();
        assert!(store.append(request(1)).await.is_err());

        let ids: Vec<u64> = store.list_all().await.unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(store.last_id().await.unwrap(), 2);

        let mut updated = store.find_by_id(1).await.unwrap().unwrap();
        updated.steps[1].status = StepStatus::Approved;
        store.update(updated.clone()).await.unwrap();
        assert_eq!(store.find_by_id(1).await.unwrap().unwrap(), updated);

        assert!(matches!(
            store.update(request(9)).await,
            Err(LeaveError::RequestNotFound(9))
        ));
        assert!(store.find_by_id(9).await.unwrap().is_none());
    }
}
