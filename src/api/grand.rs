use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tracing::{debug, info};

use crate::db::{courses, grand};
use crate::error::AppError;
use crate::models::{
    Ack, ContentKey, ContentKind, Created, CurrentUser, GrandAssignment, GrandQuiz,
    GrandQuizSubmitRequest, NewGrandAssignmentRequest, NewGrandQuizRequest, Role,
    UpdateGrandAssignmentRequest, UpdateGrandQuizRequest, Uploaded,
};
use crate::policy::Policy;
use crate::services::ContentService;
use crate::state::AppState;
use crate::upload::{FileRule, StoredFile, UploadForm, UploadKind};

use super::discard_upload;

const ATTACHMENT: &[FileRule] = &[FileRule::new("file", UploadKind::Resource)];

#[derive(Serialize)]
struct QuizBody {
    quiz: GrandQuiz,
}

#[derive(Serialize)]
struct AssignmentBody {
    assignment: GrandAssignment,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/courses/{id}/grand-quiz", post(create_quiz))
        .route("/api/courses/{id}/grand-assignment", post(create_assignment))
        .route(
            "/api/courses/{id}/grand-assignment/upload",
            post(upload_assignment_file).layer(DefaultBodyLimit::max(UploadKind::Resource.body_limit())),
        )
        .route(
            "/api/grand-quizzes/{id}",
            get(quiz_detail).put(update_quiz).delete(delete_quiz),
        )
        .route("/api/grand-quizzes/{id}/submit", post(submit_quiz))
        .route(
            "/api/grand-assignments/{id}",
            get(assignment_detail)
                .put(update_assignment)
                .delete(delete_assignment),
        )
        .route(
            "/api/grand-assignments/{id}/submit",
            post(submit_assignment).layer(DefaultBodyLimit::max(UploadKind::Resource.body_limit())),
        )
}

fn questions_json(questions: &[serde_json::Value]) -> Result<String, AppError> {
    serde_json::to_string(questions)
        .map_err(|e| AppError::Internal(format!("failed to encode questions: {e}")))
}

/// Checks `policy` against the course a grand item belongs to and, for
/// students, that the item is unlocked.
async fn authorize_item(
    state: &AppState,
    viewer: &CurrentUser,
    course_id: i64,
    key: ContentKey,
    policy: Policy,
) -> Result<(), AppError> {
    policy.check_role(viewer)?;
    let owner_id = courses::find_owner(&state.db, course_id)
        .await?
        .ok_or_else(|| AppError::not_found("Course"))?;
    policy.check_course(&state.db, viewer, course_id, owner_id).await?;

    if viewer.role == Role::Student {
        ContentService::new(state.db.clone())
            .ensure_unlocked(viewer, course_id, key)
            .await?;
    }
    Ok(())
}

async fn load_quiz(state: &AppState, id: i64) -> Result<GrandQuiz, AppError> {
    grand::find_quiz(&state.db, id)
        .await?
        .ok_or_else(|| AppError::not_found("Grand quiz"))
}

async fn load_assignment(state: &AppState, id: i64) -> Result<GrandAssignment, AppError> {
    grand::find_assignment(&state.db, id)
        .await?
        .ok_or_else(|| AppError::not_found("Grand assignment"))
}

async fn create_quiz(
    State(state): State<AppState>,
    viewer: CurrentUser,
    Path(course_id): Path<i64>,
    Json(req): Json<NewGrandQuizRequest>,
) -> Result<Json<Created>, AppError> {
    Policy::AUTHOR.authorize(&state.db, &viewer, course_id).await?;
    if req.title.trim().is_empty() || req.questions.is_empty() {
        return Err(AppError::BadRequest("title and questions array required".to_string()));
    }

    let id = grand::insert_quiz(
        &state.db,
        course_id,
        req.title.trim(),
        req.description.as_deref().unwrap_or(""),
        &questions_json(&req.questions)?,
        req.order_index.unwrap_or(0),
    )
    .await?;

    info!("grand quiz {} added to course {}", id, course_id);
    Ok(Json(Created::new(id)))
}

async fn create_assignment(
    State(state): State<AppState>,
    viewer: CurrentUser,
    Path(course_id): Path<i64>,
    Json(req): Json<NewGrandAssignmentRequest>,
) -> Result<Json<Created>, AppError> {
    Policy::AUTHOR.authorize(&state.db, &viewer, course_id).await?;
    if req.title.trim().is_empty() {
        return Err(AppError::BadRequest("title required".to_string()));
    }

    let id = grand::insert_assignment(
        &state.db,
        course_id,
        req.title.trim(),
        req.description.as_deref().unwrap_or(""),
        req.file_url.as_deref().filter(|url| !url.is_empty()),
        req.order_index.unwrap_or(0),
    )
    .await?;

    info!("grand assignment {} added to course {}", id, course_id);
    Ok(Json(Created::new(id)))
}

/// Stores an attachment for a grand assignment that is created afterwards.
async fn upload_assignment_file(
    State(state): State<AppState>,
    viewer: CurrentUser,
    Path(course_id): Path<i64>,
    multipart: Multipart,
) -> Result<Json<Uploaded>, AppError> {
    Policy::AUTHOR.authorize(&state.db, &viewer, course_id).await?;

    let form = UploadForm::parse(multipart, ATTACHMENT, state.media.as_ref()).await?;
    let stored = form
        .file("file")
        .map(StoredFile::url)
        .ok_or_else(|| AppError::BadRequest("File required".to_string()));
    let file_url = form.finish(state.media.as_ref(), stored).await?;

    Ok(Json(Uploaded {
        ok: true,
        id: None,
        video_url: None,
        file_url: Some(file_url),
    }))
}

async fn quiz_detail(
    State(state): State<AppState>,
    viewer: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<QuizBody>, AppError> {
    let quiz = load_quiz(&state, id).await?;
    let key = ContentKey::new(ContentKind::GrandQuiz, id);
    authorize_item(&state, &viewer, quiz.course_id, key, Policy::VIEW_CONTENT).await?;
    Ok(Json(QuizBody { quiz }))
}

async fn update_quiz(
    State(state): State<AppState>,
    viewer: CurrentUser,
    Path(id): Path<i64>,
    Json(req): Json<UpdateGrandQuizRequest>,
) -> Result<Json<Ack>, AppError> {
    let mut quiz = load_quiz(&state, id).await?;
    Policy::AUTHOR.authorize(&state.db, &viewer, quiz.course_id).await?;
    if req.is_empty() {
        return Err(AppError::BadRequest("Nothing to update".to_string()));
    }

    if let Some(title) = req.title {
        if title.trim().is_empty() {
            return Err(AppError::BadRequest("title required".to_string()));
        }
        quiz.title = title.trim().to_string();
    }
    if let Some(description) = req.description {
        quiz.description = description;
    }
    if let Some(questions) = req.questions {
        if questions.is_empty() {
            return Err(AppError::BadRequest("questions array required".to_string()));
        }
        quiz.content_json = questions_json(&questions)?;
    }
    grand::update_quiz(&state.db, &quiz).await?;

    Ok(Json(Ack::ok()))
}

async fn delete_quiz(
    State(state): State<AppState>,
    viewer: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Ack>, AppError> {
    let quiz = load_quiz(&state, id).await?;
    Policy::AUTHOR.authorize(&state.db, &viewer, quiz.course_id).await?;
    grand::delete_quiz(&state.db, id).await?;
    Ok(Json(Ack::ok()))
}

async fn submit_quiz(
    State(state): State<AppState>,
    viewer: CurrentUser,
    Path(id): Path<i64>,
    Json(req): Json<GrandQuizSubmitRequest>,
) -> Result<Json<Ack>, AppError> {
    Policy::LEARN.check_role(&viewer)?;
    let quiz = load_quiz(&state, id).await?;
    let key = ContentKey::new(ContentKind::GrandQuiz, id);
    authorize_item(&state, &viewer, quiz.course_id, key, Policy::LEARN).await?;

    let answers = match req.answers {
        Some(answers) if !answers.is_null() => answers,
        _ => return Err(AppError::BadRequest("answers required".to_string())),
    };
    let answers_json = serde_json::to_string(&answers)
        .map_err(|e| AppError::Internal(format!("failed to encode answers: {e}")))?;

    grand::upsert_quiz_submission(&state.db, id, viewer.id, &answers_json).await?;
    debug!("student {} submitted grand quiz {}", viewer.id, id);

    Ok(Json(Ack::ok()))
}

async fn assignment_detail(
    State(state): State<AppState>,
    viewer: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<AssignmentBody>, AppError> {
    let assignment = load_assignment(&state, id).await?;
    let key = ContentKey::new(ContentKind::GrandAssignment, id);
    authorize_item(&state, &viewer, assignment.course_id, key, Policy::VIEW_CONTENT).await?;
    Ok(Json(AssignmentBody { assignment }))
}

async fn update_assignment(
    State(state): State<AppState>,
    viewer: CurrentUser,
    Path(id): Path<i64>,
    Json(req): Json<UpdateGrandAssignmentRequest>,
) -> Result<Json<Ack>, AppError> {
    let mut assignment = load_assignment(&state, id).await?;
    Policy::AUTHOR.authorize(&state.db, &viewer, assignment.course_id).await?;
    if req.is_empty() {
        return Err(AppError::BadRequest("Nothing to update".to_string()));
    }

    if let Some(title) = req.title {
        if title.trim().is_empty() {
            return Err(AppError::BadRequest("title required".to_string()));
        }
        assignment.title = title.trim().to_string();
    }
    if let Some(description) = req.description {
        assignment.description = description;
    }
    if let Some(file_url) = req.file_url {
        assignment.file_url = Some(file_url).filter(|url| !url.is_empty());
    }
    grand::update_assignment(&state.db, &assignment).await?;

    Ok(Json(Ack::ok()))
}

async fn delete_assignment(
    State(state): State<AppState>,
    viewer: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Ack>, AppError> {
    let assignment = load_assignment(&state, id).await?;
    Policy::AUTHOR.authorize(&state.db, &viewer, assignment.course_id).await?;
    grand::delete_assignment(&state.db, id).await?;
    Ok(Json(Ack::ok()))
}

async fn submit_assignment(
    State(state): State<AppState>,
    viewer: CurrentUser,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<Json<Uploaded>, AppError> {
    Policy::LEARN.check_role(&viewer)?;
    let assignment = load_assignment(&state, id).await?;
    let key = ContentKey::new(ContentKind::GrandAssignment, id);
    authorize_item(&state, &viewer, assignment.course_id, key, Policy::LEARN).await?;

    let form = UploadForm::parse(multipart, ATTACHMENT, state.media.as_ref()).await?;
    let submitted = async {
        let file_url = form
            .file("file")
            .ok_or_else(|| AppError::BadRequest("File required".to_string()))?
            .url();
        let replaced = grand::upsert_assignment_submission(&state.db, id, viewer.id, &file_url).await?;
        if let Some(old) = replaced {
            discard_upload(&state, &old).await;
        }
        Ok::<_, AppError>(file_url)
    }
    .await;
    let file_url = form.finish(state.media.as_ref(), submitted).await?;
    debug!("student {} submitted grand assignment {}", viewer.id, id);

    Ok(Json(Uploaded {
        ok: true,
        id: None,
        video_url: None,
        file_url: Some(file_url),
    }))
}
