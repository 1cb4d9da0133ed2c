use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
pub enum Role {
    Student,
    Teacher,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Teacher => "teacher",
            Role::Admin => "admin",
        }
    }

    pub fn is_staff(&self) -> bool {
        matches!(self, Role::Teacher | Role::Admin)
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub bio: Option<String>,
    pub specialization: Option<String>,
    pub created_at: String,
}

/// The identity attached to an authenticated request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct CurrentUser {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl From<User> for CurrentUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Body for admin-created accounts (teachers and admins).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewStaffRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub bio: Option<String>,
    pub specialization: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TeacherSummary {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub created_at: String,
    pub course_count: i64,
    pub student_count: i64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct RecentUser {
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: Option<CurrentUser>,
}
