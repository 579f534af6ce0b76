use crate::domain::approval::{AggregateStatus, ApprovalStep, RoleKey, StepStatus};
use crate::domain::user::{Position, User};
use crate::domain::workflow;
use crate::error::LeaveError;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeaveCategory {
    Sick,
    Personal,
    Vacation,
    Other,
}

impl LeaveCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeaveCategory::Sick => "sick",
            LeaveCategory::Personal => "personal",
            LeaveCategory::Vacation => "vacation",
            LeaveCategory::Other => "other",
        }
    }
}

impl fmt::Display for LeaveCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LeaveCategory {
    type Err = LeaveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sick" => Ok(LeaveCategory::Sick),
            "personal" => Ok(LeaveCategory::Personal),
            "vacation" => Ok(LeaveCategory::Vacation),
            "other" => Ok(LeaveCategory::Other),
            other => Err(LeaveError::ValidationError(format!(
                "Unknown leave category: {other}"
            ))),
        }
    }
}

/// A file attached to a request, carried as standard base64 text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    pub data: String,
}

impl Attachment {
    /// Encodes raw bytes, refusing payloads above `limit` bytes.
    pub fn encode(name: impl Into<String>, bytes: &[u8], limit: usize) -> Result<Self, LeaveError> {
        let name = name.into();
        if bytes.len() > limit {
            return Err(LeaveError::AttachmentTooLarge {
                name,
                size: bytes.len(),
                limit,
            });
        }
        Ok(Self {
            name,
            data: STANDARD.encode(bytes),
        })
    }

    pub fn decode(&self) -> Result<Vec<u8>, LeaveError> {
        Ok(STANDARD.decode(&self.data)?)
    }

    /// Renders the attachment as a `data:` URL for download links.
    pub fn data_url(&self, mime: &str) -> String {
        format!("data:{mime};base64,{}", self.data)
    }
}

/// Inclusive day count between two dates, never less than one.
pub fn day_count(start: NaiveDate, end: NaiveDate) -> u32 {
    let days = (end - start).num_days() + 1;
    days.max(1) as u32
}

/// Raw submission fields as they arrive from an interface.
#[derive(Debug, Clone, Default)]
pub struct NewLeaveRequest {
    pub category: Option<LeaveCategory>,
    pub department: String,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub reason: String,
    pub attachment: Option<Attachment>,
}

/// A submission that passed boundary checks.
#[derive(Debug, Clone)]
pub struct LeaveDraft {
    pub category: LeaveCategory,
    pub department: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub reason: String,
    pub attachment: Option<Attachment>,
}

impl NewLeaveRequest {
    /// Checks required fields. An empty `departments` list accepts any
    /// non-blank department.
    pub fn validate(self, departments: &[String]) -> Result<LeaveDraft, LeaveError> {
        let (Some(start), Some(end)) = (self.start, self.end) else {
            return Err(LeaveError::ValidationError(
                "start and end dates are required".to_string(),
            ));
        };
        if end < start {
            return Err(LeaveError::ValidationError(format!(
                "end date {end} is before start date {start}"
            )));
        }
        let category = self
            .category
            .ok_or_else(|| LeaveError::ValidationError("category is required".to_string()))?;

        let department = self.department.trim().to_string();
        if department.is_empty() {
            return Err(LeaveError::ValidationError(
                "department is required".to_string(),
            ));
        }
        if !departments.is_empty() && !departments.iter().any(|d| d == &department) {
            return Err(LeaveError::ValidationError(format!(
                "Unknown department: {department}"
            )));
        }

        Ok(LeaveDraft {
            category,
            department,
            start,
            end,
            reason: self.reason.trim().to_string(),
            attachment: self.attachment,
        })
    }
}

/// A submitted leave request and its approval chain.
///
/// The aggregate status is not a field: call [`LeaveRequest::status`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaveRequest {
    pub id: u64,
    pub requester: String,
    pub position: Position,
    pub department: String,
    pub category: LeaveCategory,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub days: u32,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<Attachment>,
    pub steps: Vec<ApprovalStep>,
    pub created_at: DateTime<Utc>,
}

impl LeaveRequest {
    pub fn new(
        id: u64,
        requester: &User,
        draft: LeaveDraft,
        steps: Vec<ApprovalStep>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            requester: requester.username.clone(),
            position: requester.position,
            department: draft.department,
            category: draft.category,
            start: draft.start,
            end: draft.end,
            days: day_count(draft.start, draft.end),
            reason: draft.reason,
            attachment: draft.attachment,
            steps,
            created_at,
        }
    }

    pub fn status(&self) -> AggregateStatus {
        workflow::aggregate_status(&self.steps)
    }

    /// True if some step owned by `key` still waits for a decision.
    pub fn has_pending(&self, key: RoleKey) -> bool {
        self.steps
            .iter()
            .any(|s| s.role_key == key && s.status == StepStatus::Pending)
    }

    /// Indices of pending steps assigned to `username`.
    pub fn actionable_by(&self, username: &str) -> Vec<usize> {
        self.steps
            .iter()
            .enumerate()
            .filter(|(_, s)| {
                s.status == StepStatus::Pending && s.assigned_username.as_deref() == Some(username)
            })
            .map(|(i, _)| i)
            .collect()
    }

    /// Case-insensitive substring match on requester or department.
    /// `needle` must already be lowercase.
    pub fn matches_keyword(&self, needle: &str) -> bool {
        self.requester.to_lowercase().contains(needle)
            || self.department.to_lowercase().contains(needle)
    }

    /// `mentor:approved;supervisor:pending;hr:pending`
    pub fn step_summary(&self) -> String {
        self.steps
            .iter()
            .map(|s| format!("{}:{}", s.role_key, s.status))
            .collect::<Vec<_>>()
            .join(";")
    }
}
