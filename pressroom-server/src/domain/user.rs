use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Permission tier of a user. READER is the unprivileged default for new
/// registrations; WRITER and ADMIN are assigned out of band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Reader,
    Writer,
    Admin,
}

impl Role {
    pub fn can_approve(self) -> bool {
        matches!(self, Role::Writer | Role::Admin)
    }

    pub fn can_publish(self) -> bool {
        matches!(self, Role::Admin)
    }

    pub fn can_delete(self) -> bool {
        matches!(self, Role::Writer | Role::Admin)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(name: String, email: String, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            email,
            password_hash,
            role: Role::Reader,
            created_at: Utc::now(),
        }
    }
}

/// Authenticated identity handed explicitly to every lifecycle operation.
/// Services never read role or session state from anywhere else.
#[derive(Debug, Clone, Copy)]
pub struct Caller {
    pub id: Uuid,
    pub role: Role,
}
