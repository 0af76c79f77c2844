use serde::{Deserialize, Serialize};

use crate::types::identifiers::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Student,
    Teacher,
    Admin,
}

/// The user on whose behalf a core call runs.
///
/// Always passed explicitly; the core never looks up a "current user".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Actor {
    Anonymous,
    Authenticated { id: UserId, role: Role },
}

impl Actor {
    pub fn student(id: u64) -> Self {
        Actor::Authenticated { id: UserId(id), role: Role::Student }
    }

    pub fn teacher(id: u64) -> Self {
        Actor::Authenticated { id: UserId(id), role: Role::Teacher }
    }

    pub fn admin(id: u64) -> Self {
        Actor::Authenticated { id: UserId(id), role: Role::Admin }
    }

    pub fn user_id(&self) -> Option<UserId> {
        match self {
            Actor::Anonymous => None,
            Actor::Authenticated { id, .. } => Some(*id),
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Actor::Authenticated { role: Role::Admin, .. })
    }

    pub fn is_teacher(&self) -> bool {
        matches!(self, Actor::Authenticated { role: Role::Teacher, .. })
    }

    /// Teachers and admins may act on behalf of other users.
    pub fn is_privileged(&self) -> bool {
        self.is_teacher() || self.is_admin()
    }
}
