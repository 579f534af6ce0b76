use crate::application::stats::{LeaveStats, LeaveSummary};
use crate::config::WorkflowConfig;
use crate::domain::approval::{RoleKey, StepStatus};
use crate::domain::leave::{Attachment, LeaveRequest, NewLeaveRequest};
use crate::domain::ports::{LeaveStoreBox, UserDirectoryBox};
use crate::domain::session::Session;
use crate::domain::user::{NewUser, Role, User};
use crate::domain::workflow::{self, Roster};
use crate::error::{LeaveError, Result};
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// The entry point for every leave workflow operation.
///
/// `LeaveEngine` owns the user directory and the leave store. Each mutating
/// call is a read-modify-write against the store, serialized by an internal
/// lock so two approvals of the same request cannot overwrite each other.
pub struct LeaveEngine {
    directory: UserDirectoryBox,
    store: LeaveStoreBox,
    workflow: WorkflowConfig,
    write_lock: Mutex<()>,
}

impl LeaveEngine {
    /// Creates a new `LeaveEngine` instance.
    ///
    /// # Arguments
    ///
    /// * `directory` - The user directory.
    /// * `store` - The store for leave requests.
    /// * `workflow` - Submission and plan-building settings.
    pub fn new(
        directory: UserDirectoryBox,
        store: LeaveStoreBox,
        workflow: WorkflowConfig,
    ) -> Self {
        Self {
            directory,
            store,
            workflow,
            write_lock: Mutex::new(()),
        }
    }

    /// Adds every user whose username is not in the directory yet.
    /// Returns how many were added.
    pub async fn seed_users(&self, users: Vec<User>) -> Result<usize> {
        let _guard = self.write_lock.lock().await;
        let mut added = 0;
        for user in users {
            if self.directory.get(&user.username).await?.is_none() {
                debug!(username = %user.username, "seeding user");
                self.directory.store(user).await?;
                added += 1;
            }
        }
        Ok(added)
    }

    /// Departments with no supervisor on file. Warns when submissions
    /// require an HR officer and none is registered.
    pub async fn check_approvers(&self) -> Result<Vec<String>> {
        if self.workflow.require_hr_approver
            && self.directory.find_first_by_role(Role::Hr).await?.is_none()
        {
            warn!("no HR officer registered, submissions will be refused");
        }

        let mut unsupervised = Vec::new();
        for department in &self.workflow.departments {
            let supervisor = self
                .directory
                .find_by_role_and_dept(Role::Supervisor, department)
                .await?;
            if supervisor.is_none() {
                info!(department = %department, "no supervisor on file");
                unsupervised.push(department.clone());
            }
        }
        Ok(unsupervised)
    }

    pub async fn register(&self, new_user: NewUser) -> Result<User> {
        let user = new_user.validate()?;
        let _guard = self.write_lock.lock().await;
        if self.directory.get(&user.username).await?.is_some() {
            return Err(LeaveError::UserExists(user.username));
        }
        self.directory.store(user.clone()).await?;
        info!(username = %user.username, roles = %user.roles, "user registered");
        Ok(user)
    }

    /// Checks plaintext credentials and opens a session.
    pub async fn login(&self, username: &str, password: &str) -> Result<Session> {
        match self.directory.get(username.trim()).await? {
            Some(user) if user.password == password.trim() => {
                info!(username = %user.username, "login");
                Ok(Session::new(user))
            }
            _ => {
                warn!(username, "failed login");
                Err(LeaveError::InvalidCredentials)
            }
        }
    }

    /// Opens a session for `username` without a password check.
    ///
    /// Used by trusted batch interfaces that name the acting user directly.
    pub async fn session_for(&self, username: &str) -> Result<Session> {
        self.directory
            .get(username)
            .await?
            .map(Session::new)
            .ok_or_else(|| LeaveError::UserNotFound(username.to_string()))
    }

    /// Validates a submission, builds its approval chain and stores it.
    pub async fn submit(
        &self,
        session: &Session,
        request: NewLeaveRequest,
    ) -> Result<LeaveRequest> {
        let draft = request.validate(&self.workflow.departments)?;
        if let Some(attachment) = &draft.attachment {
            let size = attachment.decode()?.len();
            if size > self.workflow.max_attachment_bytes {
                return Err(LeaveError::AttachmentTooLarge {
                    name: attachment.name.clone(),
                    size,
                    limit: self.workflow.max_attachment_bytes,
                });
            }
        }

        let roster = Roster::new(self.directory.all().await?);
        let steps = workflow::build_step_plan(
            session.user(),
            &draft.department,
            &roster,
            self.workflow.require_hr_approver,
        )?;
        if steps.iter().any(|s| s.assigned_username.is_none()) {
            warn!(
                requester = session.username(),
                department = %draft.department,
                "approval chain has unassigned steps"
            );
        }

        let _guard = self.write_lock.lock().await;
        let id = self.store.last_id().await? + 1;
        let request = LeaveRequest::new(id, session.user(), draft, steps, Utc::now());
        self.store.append(request.clone()).await?;

        info!(
            id,
            requester = %request.requester,
            days = request.days,
            steps = %request.step_summary(),
            "leave request submitted"
        );
        Ok(request)
    }

    pub async fn get(&self, id: u64) -> Result<LeaveRequest> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or(LeaveError::RequestNotFound(id))
    }

    /// Every stored request in id order. Operator view for batch output,
    /// no session involved.
    pub async fn all_requests(&self) -> Result<Vec<LeaveRequest>> {
        let mut all = self.store.list_all().await?;
        all.sort_by_key(|r| r.id);
        Ok(all)
    }

    /// The session user's own requests, newest first.
    pub async fn list_mine(&self, session: &Session) -> Result<Vec<LeaveRequest>> {
        let mut mine: Vec<LeaveRequest> = self
            .store
            .list_all()
            .await?
            .into_iter()
            .filter(|r| r.requester == session.username())
            .collect();
        newest_first(&mut mine);
        Ok(mine)
    }

    pub async fn my_summary(&self, session: &Session) -> Result<LeaveSummary> {
        Ok(LeaveSummary::collect(&self.list_mine(session).await?))
    }

    /// Requests visible to the session user acting as `key`, newest first.
    ///
    /// * mentor: requests from interns assigned to the mentor or sharing
    ///   their department;
    /// * supervisor: requests filed under the supervisor's department;
    /// * hr: every request.
    pub async fn list_for_approver(
        &self,
        session: &Session,
        key: RoleKey,
    ) -> Result<Vec<LeaveRequest>> {
        session.require(key.required_role())?;
        let me = session.user();
        let all = self.store.list_all().await?;

        let mut queue: Vec<LeaveRequest> = match key {
            RoleKey::Mentor => {
                let interns: Vec<String> = self
                    .directory
                    .all()
                    .await?
                    .into_iter()
                    .filter(|u| {
                        u.is_intern()
                            && (u.mentor.as_deref() == Some(me.username.as_str())
                                || u.department == me.department)
                    })
                    .map(|u| u.username)
                    .collect();
                all.into_iter()
                    .filter(|r| interns.contains(&r.requester))
                    .collect()
            }
            RoleKey::Supervisor => all
                .into_iter()
                .filter(|r| r.department == me.department)
                .collect(),
            RoleKey::Hr => all,
        };
        newest_first(&mut queue);
        Ok(queue)
    }

    /// Number of queued requests still waiting on `key`.
    pub async fn pending_count(&self, session: &Session, key: RoleKey) -> Result<usize> {
        Ok(self
            .list_for_approver(session, key)
            .await?
            .iter()
            .filter(|r| r.has_pending(key))
            .count())
    }

    /// Requests with a pending step assigned to the session user, oldest
    /// first.
    pub async fn inbox(&self, session: &Session) -> Result<Vec<LeaveRequest>> {
        Ok(self
            .all_requests()
            .await?
            .into_iter()
            .filter(|r| !r.actionable_by(session.username()).is_empty())
            .collect())
    }

    /// The attachment of request `id`, visible to its requester and to HR.
    pub async fn attachment(&self, session: &Session, id: u64) -> Result<Attachment> {
        let request = self.get(id).await?;
        if request.requester != session.username() {
            session.require(Role::Hr)?;
        }
        request.attachment.ok_or_else(|| {
            LeaveError::ValidationError(format!("Leave request {id} has no attachment"))
        })
    }

    pub async fn approve(&self, session: &Session, id: u64, key: RoleKey) -> Result<LeaveRequest> {
        session.require(key.required_role())?;
        let actor = session.username();
        self.mutate(id, |request| {
            let touched = workflow::approve(request, key);
            info!(id, actor, role_key = %key, touched, status = %request.status(), "approve");
            Ok(touched > 0)
        })
        .await
    }

    pub async fn reject(&self, session: &Session, id: u64, key: RoleKey) -> Result<LeaveRequest> {
        session.require(key.required_role())?;
        let actor = session.username();
        self.mutate(id, |request| {
            let touched = workflow::reject(request, key);
            info!(id, actor, role_key = %key, touched, status = %request.status(), "reject");
            Ok(touched > 0)
        })
        .await
    }

    /// HR override of a single step to any status.
    pub async fn override_step(
        &self,
        session: &Session,
        id: u64,
        index: usize,
        status: StepStatus,
    ) -> Result<LeaveRequest> {
        session.require(Role::Hr)?;
        let actor = session.username();
        self.mutate(id, |request| {
            workflow::manual_set_step(request, index, status)?;
            info!(id, actor, index, %status, "step overridden");
            Ok(true)
        })
        .await
    }

    /// HR rotation of a single step to its next status.
    pub async fn rotate_step(
        &self,
        session: &Session,
        id: u64,
        index: usize,
    ) -> Result<LeaveRequest> {
        session.require(Role::Hr)?;
        let actor = session.username();
        self.mutate(id, |request| {
            let status = workflow::rotate_step(request, index)?;
            info!(id, actor, index, %status, "step rotated");
            Ok(true)
        })
        .await
    }

    /// HR flip of every step between approved and pending.
    pub async fn cycle_all(&self, session: &Session, id: u64) -> Result<LeaveRequest> {
        session.require(Role::Hr)?;
        let actor = session.username();
        self.mutate(id, |request| {
            workflow::manual_cycle_all(request);
            info!(id, actor, steps = %request.step_summary(), "all steps cycled");
            Ok(true)
        })
        .await
    }

    /// Case-insensitive substring search over requester and department.
    pub async fn search(&self, session: &Session, keyword: &str) -> Result<Vec<LeaveRequest>> {
        session.require(Role::Hr)?;
        let needle = keyword.trim().to_lowercase();
        let mut found: Vec<LeaveRequest> = self
            .store
            .list_all()
            .await?
            .into_iter()
            .filter(|r| r.matches_keyword(&needle))
            .collect();
        newest_first(&mut found);
        Ok(found)
    }

    pub async fn stats(&self, session: &Session) -> Result<LeaveStats> {
        session.require(Role::Hr)?;
        Ok(LeaveStats::collect(&self.store.list_all().await?))
    }

    async fn mutate<F>(&self, id: u64, apply: F) -> Result<LeaveRequest>
    where
        F: FnOnce(&mut LeaveRequest) -> Result<bool> + Send,
    {
        let _guard = self.write_lock.lock().await;
        let mut request = self
            .store
            .find_by_id(id)
            .await?
            .ok_or(LeaveError::RequestNotFound(id))?;
        if apply(&mut request)? {
            self.store.update(request.clone()).await?;
        } else {
            debug!(id, "no matching step, request unchanged");
        }
        Ok(request)
    }
}

fn newest_first(requests: &mut [LeaveRequest]) {
    requests.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
}
