use sqlx::SqlitePool;
use tracing::info;

use crate::auth::password::{hash_password, verify_password};
use crate::config::Config;
use crate::db::users::{self, NewUser};
use crate::error::AppError;
use crate::models::{CurrentUser, LoginRequest, NewStaffRequest, RegisterRequest, Role};

pub struct AccountService {
    db: SqlitePool,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn duplicate_email(err: sqlx::Error) -> AppError {
    match err {
        sqlx::Error::Database(ref db) if db.is_unique_violation() => {
            AppError::Conflict("Email already registered".to_string())
        }
        other => AppError::Database(other),
    }
}

impl AccountService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    async fn create(
        &self,
        name: &str,
        email: &str,
        password: String,
        role: Role,
        bio: Option<&str>,
        specialization: Option<&str>,
    ) -> Result<CurrentUser, AppError> {
        let email = normalize_email(email);
        if users::find_by_email(&self.db, &email).await?.is_some() {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        let password_hash = hash_password(password).await?;
        let id = users::insert_user(
            &self.db,
            NewUser {
                name,
                email: &email,
                password_hash: &password_hash,
                role,
                bio,
                specialization,
            },
        )
        .await
        .map_err(duplicate_email)?;

        info!("created {} account {}", role.as_str(), id);
        Ok(CurrentUser {
            id,
            name: name.to_string(),
            email,
            role,
        })
    }

    /// Self-registration always yields a student.
    pub async fn register(&self, req: RegisterRequest) -> Result<CurrentUser, AppError> {
        if req.name.trim().is_empty() || req.email.trim().is_empty() || req.password.is_empty() {
            return Err(AppError::BadRequest("Missing fields".to_string()));
        }
        self.create(req.name.trim(), &req.email, req.password, Role::Student, None, None)
            .await
    }

    pub async fn login(&self, req: LoginRequest) -> Result<CurrentUser, AppError> {
        if req.email.trim().is_empty() || req.password.is_empty() {
            return Err(AppError::BadRequest("Missing fields".to_string()));
        }

        let user = users::find_by_email(&self.db, &normalize_email(&req.email))
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        if !verify_password(req.password, user.password_hash.clone()).await? {
            return Err(AppError::InvalidCredentials);
        }

        Ok(user.into())
    }

    /// Accounts created by an admin: teachers and further admins.
    pub async fn create_staff(&self, req: NewStaffRequest, role: Role) -> Result<CurrentUser, AppError> {
        if req.name.trim().is_empty() || req.email.trim().is_empty() || req.password.is_empty() {
            return Err(AppError::BadRequest(
                "Name, email, and password are required".to_string(),
            ));
        }
        self.create(
            req.name.trim(),
            &req.email,
            req.password,
            role,
            req.bio.as_deref(),
            req.specialization.as_deref(),
        )
        .await
    }

    /// Creates the configured admin unless that email is already taken.
    pub async fn seed_admin(&self, config: &Config) -> Result<bool, AppError> {
        if users::find_by_email(&self.db, &config.admin_email).await?.is_some() {
            return Ok(false);
        }
        self.create(
            "Administrator",
            &config.admin_email,
            config.admin_password.clone(),
            Role::Admin,
            None,
            None,
        )
        .await?;
        Ok(true)
    }
}
