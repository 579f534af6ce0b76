//! Runtime configuration.
//!
//! Loaded from an optional TOML file. Every section has defaults, so an empty
//! file (or no file at all) yields the stock organization: five departments
//! and the sample users below.
//!
//! ```toml
//! [workflow]
//! require_hr_approver = true
//! max_attachment_bytes = 5242880
//! departments = ["Academic", "Administration"]
//!
//! [[users]]
//! username = "alice"
//! password = "pass"
//! roles = ["employee"]
//! position = "government-employee"
//! department = "Planetarium"
//! ```

use crate::domain::user::{Position, Role, RoleSet, User};
use crate::error::{LeaveError, Result};
use serde::Deserialize;
use std::path::Path;

pub const DEFAULT_DEPARTMENTS: [&str; 5] = [
    "Academic",
    "Administration",
    "Planetarium",
    "Promotion and Services",
    "Buildings and Grounds",
];

pub const DEFAULT_MAX_ATTACHMENT_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Fail submissions when no HR officer exists instead of leaving the HR
    /// step unassigned.
    pub require_hr_approver: bool,
    pub max_attachment_bytes: usize,
    /// Departments a request may be filed under. Empty accepts any.
    pub departments: Vec<String>,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            require_hr_approver: true,
            max_attachment_bytes: DEFAULT_MAX_ATTACHMENT_BYTES,
            departments: DEFAULT_DEPARTMENTS.iter().map(|d| d.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub workflow: WorkflowConfig,
    /// Users seeded into the directory when missing.
    pub users: Vec<User>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workflow: WorkflowConfig::default(),
            users: sample_users(),
        }
    }
}

impl AppConfig {
    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }
}

/// Reads the configuration file, or returns defaults when `path` is `None`.
pub fn load_config<P: AsRef<Path>>(path: Option<P>) -> Result<AppConfig> {
    let Some(path) = path else {
        return Ok(AppConfig::default());
    };
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| {
        LeaveError::IoError(std::io::Error::new(
            e.kind(),
            format!("Failed to read {}: {e}", path.as_ref().display()),
        ))
    })?;
    AppConfig::from_toml(&contents)
}

/// The stock organization.
pub fn sample_users() -> Vec<User> {
    vec![
        User::new(
            "alice",
            "pass",
            RoleSet::from([Role::Employee]),
            Position::GovernmentEmployee,
            "Planetarium",
        ),
        User::new(
            "bob",
            "pass",
            RoleSet::from([Role::Employee, Role::Intern]),
            Position::Intern,
            "Academic",
        )
        .with_mentor("mentor_lee")
        .with_supervisor("sup_acad"),
        User::new(
            "mentor_lee",
            "pass",
            RoleSet::from([Role::Mentor, Role::Employee]),
            Position::GovernmentEmployee,
            "Academic",
        ),
        User::new(
            "sup_acad",
            "pass",
            RoleSet::from([Role::Supervisor, Role::Employee]),
            Position::CivilServant,
            "Academic",
        ),
        User::new(
            "sup_tk",
            "pass",
            RoleSet::from([Role::Supervisor, Role::Employee]),
            Position::CivilServant,
            "Planetarium",
        ),
        User::new(
            "hr_officer",
            "pass",
            RoleSet::from([Role::Hr]),
            Position::CivilServant,
            "Administration",
        ),
        User::new(
            "admin",
            "pass",
            RoleSet::from([Role::Hr, Role::Admin]),
            Position::CivilServant,
            "Administration",
        ),
    ]
}
