use axum::extract::{Path, State};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Serialize;
use tracing::info;

use crate::db::stats::{self, AdminStats, TeacherStats};
use crate::db::users;
use crate::error::AppError;
use crate::models::{Ack, Created, CurrentUser, NewStaffRequest, RecentUser, Role, TeacherSummary};
use crate::policy::Policy;
use crate::services::AccountService;
use crate::state::AppState;

const RECENT_USERS: i64 = 10;

#[derive(Serialize)]
struct TeacherList {
    teachers: Vec<TeacherSummary>,
}

#[derive(Serialize)]
struct RecentUserList {
    users: Vec<RecentUser>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/teachers", get(list_teachers).post(create_teacher))
        .route("/api/teachers/{id}", delete(delete_teacher))
        .route("/api/admins", post(create_admin))
        .route("/api/admin/stats", get(admin_stats))
        .route("/api/admin/recent-users", get(recent_users))
        .route("/api/teacher/stats", get(teacher_stats))
}

async fn create_staff(
    state: &AppState,
    viewer: &CurrentUser,
    req: NewStaffRequest,
    role: Role,
) -> Result<Json<Created>, AppError> {
    Policy::ADMIN.check_role(viewer)?;
    let user = AccountService::new(state.db.clone()).create_staff(req, role).await?;
    info!("admin {} created {} {}", viewer.id, role.as_str(), user.id);
    Ok(Json(Created::new(user.id)))
}

async fn create_teacher(
    State(state): State<AppState>,
    viewer: CurrentUser,
    Json(req): Json<NewStaffRequest>,
) -> Result<Json<Created>, AppError> {
    create_staff(&state, &viewer, req, Role::Teacher).await
}

async fn create_admin(
    State(state): State<AppState>,
    viewer: CurrentUser,
    Json(req): Json<NewStaffRequest>,
) -> Result<Json<Created>, AppError> {
    create_staff(&state, &viewer, req, Role::Admin).await
}

async fn list_teachers(
    State(state): State<AppState>,
    viewer: CurrentUser,
) -> Result<Json<TeacherList>, AppError> {
    Policy::ADMIN.check_role(&viewer)?;
    let teachers = users::fetch_teachers(&state.db).await?;
    Ok(Json(TeacherList { teachers }))
}

/// The teacher's courses go with them.
async fn delete_teacher(
    State(state): State<AppState>,
    viewer: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Ack>, AppError> {
    Policy::ADMIN.check_role(&viewer)?;
    if !users::delete_with_role(&state.db, id, Role::Teacher).await? {
        return Err(AppError::not_found("Teacher"));
    }
    info!("admin {} deleted teacher {}", viewer.id, id);
    Ok(Json(Ack::ok()))
}

async fn admin_stats(
    State(state): State<AppState>,
    viewer: CurrentUser,
) -> Result<Json<AdminStats>, AppError> {
    Policy::ADMIN.check_role(&viewer)?;
    Ok(Json(stats::admin_stats(&state.db).await?))
}

async fn recent_users(
    State(state): State<AppState>,
    viewer: CurrentUser,
) -> Result<Json<RecentUserList>, AppError> {
    Policy::ADMIN.check_role(&viewer)?;
    let users = users::fetch_recent(&state.db, RECENT_USERS).await?;
    Ok(Json(RecentUserList { users }))
}

async fn teacher_stats(
    State(state): State<AppState>,
    viewer: CurrentUser,
) -> Result<Json<TeacherStats>, AppError> {
    Policy::TEACHER.check_role(&viewer)?;
    Ok(Json(stats::teacher_stats(&state.db, viewer.id).await?))
}
