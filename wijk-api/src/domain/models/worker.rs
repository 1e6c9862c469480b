use std::fmt;

use serde::{Deserialize, Serialize};

use super::WorkerId;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Role {
    Admin,
    Worker,
}

impl From<String> for Role {
    fn from(role: String) -> Self {
        match role.as_str() {
            "Admin" => Role::Admin,
            "Worker" => Role::Worker,
            _ => Role::Worker,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let role_str = match self {
            Role::Admin => "Admin",
            Role::Worker => "Worker",
        };
        write!(f, "{role_str}")
    }
}

/// What the tracking engine needs to know about a worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerProfile {
    pub id: WorkerId,
    pub display_name: String,
    pub role: Role,
}

impl WorkerProfile {
    pub fn new(id: impl Into<WorkerId>, display_name: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            role,
        }
    }

    /// Admins may act on any worker's entries regardless of age.
    pub fn is_privileged(&self) -> bool {
        self.role == Role::Admin
    }

    /// Whether this worker may act on entries owned by `owner`.
    pub fn may_act_for(&self, owner: WorkerId) -> bool {
        self.id == owner || self.is_privileged()
    }
}
