use crate::application::engine::LeaveEngine;
use crate::domain::approval::{RoleKey, StepStatus};
use crate::domain::leave::{Attachment, LeaveCategory, LeaveRequest, NewLeaveRequest};
use crate::error::{LeaveError, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use std::io::Read;
use std::path::PathBuf;

#[derive(Debug, Deserialize, PartialEq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    Submit,
    Approve,
    Reject,
    Override,
    Cycle,
    Rotate,
}

/// One row of an action script. Which columns are required depends on
/// `action`; unused columns may be left empty or omitted.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct Action {
    pub action: ActionType,
    pub actor: String,
    pub request: Option<u64>,
    pub role: Option<RoleKey>,
    pub step: Option<usize>,
    pub status: Option<StepStatus>,
    pub category: Option<LeaveCategory>,
    pub department: Option<String>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub reason: Option<String>,
    pub attachment: Option<PathBuf>,
}

fn missing(column: &str, action: ActionType) -> LeaveError {
    LeaveError::ValidationError(format!("{action:?} requires the '{column}' column"))
}

impl Action {
    /// Runs the action against `engine` as `actor`.
    pub async fn execute(
        &self,
        engine: &LeaveEngine,
        attachment_limit: usize,
    ) -> Result<LeaveRequest> {
        let session = engine.session_for(&self.actor).await?;
        let request = || self.request.ok_or_else(|| missing("request", self.action));
        let role = || self.role.ok_or_else(|| missing("role", self.action));
        let step = || self.step.ok_or_else(|| missing("step", self.action));

        match self.action {
            ActionType::Submit => {
                let leave = self.to_new_leave(attachment_limit)?;
                engine.submit(&session, leave).await
            }
            ActionType::Approve => engine.approve(&session, request()?, role()?).await,
            ActionType::Reject => engine.reject(&session, request()?, role()?).await,
            ActionType::Override => {
                let status = self.status.ok_or_else(|| missing("status", self.action))?;
                engine
                    .override_step(&session, request()?, step()?, status)
                    .await
            }
            ActionType::Cycle => engine.cycle_all(&session, request()?).await,
            ActionType::Rotate => engine.rotate_step(&session, request()?, step()?).await,
        }
    }

    fn to_new_leave(&self, attachment_limit: usize) -> Result<NewLeaveRequest> {
        let attachment = match &self.attachment {
            Some(path) => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                let size = usize::try_from(std::fs::metadata(path)?.len()).unwrap_or(usize::MAX);
                if size > attachment_limit {
                    return Err(LeaveError::AttachmentTooLarge {
                        name,
                        size,
                        limit: attachment_limit,
                    });
                }
                let bytes = std::fs::read(path)?;
                Some(Attachment::encode(name, &bytes, attachment_limit)?)
            }
            None => None,
        };
        Ok(NewLeaveRequest {
            category: self.category,
            department: self.department.clone().unwrap_or_default(),
            start: self.start,
            end: self.end,
            reason: self.reason.clone().unwrap_or_default(),
            attachment,
        })
    }
}

/// Reads workflow actions from a CSV source.
///
/// Wraps `csv::Reader` and yields `Result<Action>` lazily, trimming
/// whitespace and accepting short records.
pub struct ActionReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> ActionReader<R> {
    /// Creates a new `ActionReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    pub fn actions(self) -> impl Iterator<Item = Result<Action>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(LeaveError::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{WorkflowConfig, sample_users};
    use crate::domain::approval::AggregateStatus;
    use crate::infrastructure::in_memory::{InMemoryLeaveStore, InMemoryUserDirectory};
    use std::io::Write;

    const HEADER: &str =
        "action,actor,request,role,step,status,category,department,start,end,reason,attachment";

    #[test]
    fn test_reader_valid_stream() {
        let data = format!(
            "{HEADER}\n\
             submit, bob, , , , , sick, Academic, 2024-01-10, 2024-01-12, flu,\n\
             approve, mentor_lee, 1, mentor\n\
             override, admin, 1, , 2, not-required"
        );
        let reader = ActionReader::new(data.as_bytes());
        let results: Vec<Result<Action>> = reader.actions().collect();

        assert_eq!(results.len(), 3);
        let submit = results[0].as_ref().unwrap();
        assert_eq!(submit.action, ActionType::Submit);
        assert_eq!(submit.category, Some(LeaveCategory::Sick));
        assert_eq!(submit.start, NaiveDate::from_ymd_opt(2024, 1, 10));
        assert_eq!(submit.request, None);
        assert_eq!(submit.attachment, None);

        let approve = results[1].as_ref().unwrap();
        assert_eq!(approve.request, Some(1));
        assert_eq!(approve.role, Some(RoleKey::Mentor));

        let over = results[2].as_ref().unwrap();
        assert_eq!(over.step, Some(2));
        assert_eq!(over.status, Some(StepStatus::NotRequired));
    }

    #[test]
    fn test_reader_malformed_line() {
        let data = format!("{HEADER}\nexplode, bob\napprove, sup, one, supervisor");
        let reader = ActionReader::new(data.as_bytes());
        let results: Vec<Result<Action>> = reader.actions().collect();

        assert!(results[0].is_err());
        assert!(results[1].is_err());
    }

    #[tokio::test]
    async fn test_execute_script() {
        let engine = LeaveEngine::new(
            Box::new(InMemoryUserDirectory::new()),
            Box::new(InMemoryLeaveStore::new()),
            WorkflowConfig::default(),
        );
        engine.seed_users(sample_users()).await.unwrap();

        let mut note = tempfile::NamedTempFile::new().unwrap();
        note.write_all(b"medical certificate").unwrap();

        let data = format!(
            "{HEADER}\n\
             submit, alice, , , , , sick, Planetarium, 2024-01-10, 2024-01-10, cold, {}\n\
             approve, sup_tk, 1, supervisor\n\
             approve, hr_officer, 1, hr",
            note.path().display()
        );
        let mut last = None;
        for action in ActionReader::new(data.as_bytes()).actions() {
            last = Some(action.unwrap().execute(&engine, 1024).await.unwrap());
        }

        let request = last.unwrap();
        assert_eq!(request.status(), AggregateStatus::Approved);
        let attachment = request.attachment.unwrap();
        assert_eq!(attachment.decode().unwrap(), b"medical certificate");
    }

    #[tokio::test]
    async fn test_oversized_attachment_is_refused_before_reading() {
        let engine = LeaveEngine::new(
            Box::new(InMemoryUserDirectory::new()),
            Box::new(InMemoryLeaveStore::new()),
            WorkflowConfig::default(),
        );
        engine.seed_users(sample_users()).await.unwrap();

        let mut scan = tempfile::NamedTempFile::new().unwrap();
        scan.write_all(b"0123456789").unwrap();

        let data = format!(
            "{HEADER}\n\
             submit, alice, , , , , sick, Planetarium, 2024-01-10, 2024-01-10, cold, {}",
            scan.path().display()
        );
        let action = ActionReader::new(data.as_bytes()).actions().next().unwrap().unwrap();
        assert!(matches!(
            action.execute(&engine, 4).await,
            Err(LeaveError::AttachmentTooLarge { size: 10, limit: 4, .. })
        ));
        assert!(engine.all_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_execute_reports_missing_columns() {
        let engine = LeaveEngine::new(
            Box::new(InMemoryUserDirectory::new()),
            Box::new(InMemoryLeaveStore::new()),
            WorkflowConfig::default(),
        );
        engine.seed_users(sample_users()).await.unwrap();

        let data = format!("{HEADER}\napprove, sup_tk, , supervisor");
        let action = ActionReader::new(data.as_bytes()).actions().next().unwrap().unwrap();
        let result = action.execute(&engine, 1024).await;
        assert!(matches!(result, Err(LeaveError::ValidationError(_))));

        let data = format!("{HEADER}\ncycle, ghost, 1");
        let action = ActionReader::new(data.as_bytes()).actions().next().unwrap().unwrap();
        assert!(matches!(
            action.execute(&engine, 1024).await,
            Err(LeaveError::UserNotFound(_))
        ));
    }
}
