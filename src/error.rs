use crate::domain::user::Role;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LeaveError {
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Config error: {0}")]
    ConfigError(#[from] toml::de::Error),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Leave request {0} not found")]
    RequestNotFound(u64),
    #[error("User '{0}' not found")]
    UserNotFound(String),
    #[error("User '{0}' already exists")]
    UserExists(String),
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error("'{username}' lacks the {required} role")]
    Forbidden { username: String, required: Role },
    #[error("No HR approver is registered")]
    NoHrApprover,
    #[error("Request {id} has no step at index {index}")]
    StepOutOfRange { id: u64, index: usize },
    #[error("Attachment '{name}' is {size} bytes, limit is {limit}")]
    AttachmentTooLarge {
        name: String,
        size: usize,
        limit: usize,
    },
    #[error("Attachment decode error: {0}")]
    AttachmentDecode(#[from] base64::DecodeError),
    #[error("Internal error: {0}")]
    InternalError(Box<dyn std::error::Error + Send + Sync>),
}

#[cfg(feature = "storage-rocksdb")]
impl From<rocksdb::Error> for LeaveError {
    fn from(e: rocksdb::Error) -> Self {
        LeaveError::InternalError(Box::new(e))
    }
}

impl From<serde_json::Error> for LeaveError {
    fn from(e: serde_json::Error) -> Self {
        LeaveError::InternalError(Box::new(e))
    }
}

pub type Result<T> = std::result::Result<T, LeaveError>;
