use super::leave::LeaveRequest;
use super::user::{Role, User};
use super::workflow::Roster;
use crate::error::Result;
use async_trait::async_trait;

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn store(&self, user: User) -> Result<()>;
    async fn get(&self, username: &str) -> Result<Option<User>>;
    /// Every user, in registration order.
    async fn all(&self) -> Result<Vec<User>>;

    /// First user holding `role` in `department`, in registration order.
    async fn find_by_role_and_dept(&self, role: Role, department: &str) -> Result<Option<User>> {
        Ok(Roster::new(self.all().await?)
            .by_role_and_dept(role, department)
            .cloned())
    }

    async fn find_first_by_role(&self, role: Role) -> Result<Option<User>> {
        Ok(Roster::new(self.all().await?).first_by_role(role).cloned())
    }
}

#[async_trait]
pub trait LeaveStore: Send + Sync {
    async fn append(&self, request: LeaveRequest) -> Result<()>;
    /// Every request, ordered by id.
    async fn list_all(&self) -> Result<Vec<LeaveRequest>>;
    async fn find_by_id(&self, id: u64) -> Result<Option<LeaveRequest>>;
    async fn update(&self, request: LeaveRequest) -> Result<()>;

    async fn last_id(&self) -> Result<u64> {
        Ok(self
            .list_all()
            .await?
            .iter()
            .map(|r| r.id)
            .max()
            .unwrap_or(0))
    }
}

pub type UserDirectoryBox = Box<dyn UserDirectory>;
pub type LeaveStoreBox = Box<dyn LeaveStore>;
