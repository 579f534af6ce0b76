use crate::domain::user::{Role, User};
use crate::error::{LeaveError, Result};
use std::fmt;

/// The view a user lands on after logging in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dashboard {
    Hr,
    Supervisor,
    Mentor,
    Employee,
}

impl Dashboard {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dashboard::Hr => "hr",
            Dashboard::Supervisor => "supervisor",
            Dashboard::Mentor => "mentor",
            Dashboard::Employee => "employee",
        }
    }
}

impl fmt::Display for Dashboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The acting user, passed explicitly into every service call.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    user: User,
}

impl Session {
    pub fn new(user: User) -> Self {
        Self { user }
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn username(&self) -> &str {
        &self.user.username
    }

    pub fn has(&self, role: Role) -> bool {
        self.user.has(role)
    }

    pub fn require(&self, role: Role) -> Result<()> {
        if self.has(role) {
            Ok(())
        } else {
            Err(LeaveError::Forbidden {
                username: self.user.username.clone(),
                required: role,
            })
        }
    }

    /// Priority: hr > supervisor > mentor > employee.
    pub fn landing(&self) -> Dashboard {
        if self.has(Role::Hr) {
            Dashboard::Hr
        } else if self.has(Role::Supervisor) {
            Dashboard::Supervisor
        } else if self.has(Role::Mentor) {
            Dashboard::Mentor
        } else {
            Dashboard::Employee
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::user::{Position, RoleSet};

    fn session(roles: &[Role]) -> Session {
        Session::new(User::new(
            "someone",
            "pass",
            roles.iter().copied().collect::<RoleSet>(),
            Position::CivilServant,
            "Administration",
        ))
    }

    #[test]
    fn test_landing_priority() {
        assert_eq!(session(&[Role::Hr, Role::Admin]).landing(), Dashboard::Hr);
        assert_eq!(
            session(&[Role::Mentor, Role::Supervisor]).landing(),
            Dashboard::Supervisor
        );
        assert_eq!(
            session(&[Role::Employee, Role::Mentor]).landing(),
            Dashboard::Mentor
        );
        assert_eq!(session(&[Role::Intern]).landing(), Dashboard::Employee);
    }

    #[test]
    fn test_require_role() {
        let s = session(&[Role::Supervisor]);
        assert!(s.require(Role::Supervisor).is_ok());
        assert!(matches!(
            s.require(Role::Hr),
            Err(LeaveError::Forbidden { required: Role::Hr, .. })
        ));
    }
}
