use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Serialize;
use tracing::info;

use crate::db::{courses, enrollments, lectures, users};
use crate::error::AppError;
use crate::models::{
    Ack, Course, CourseOutline, CourseSummary, CourseTitle, Created, CurrentUser, EnrollRequest,
    NewCourseRequest, NewLecture, ProgressEntry, ReorderRequest, Role, UpdateCourseRequest,
    Uploaded,
};
use crate::policy::Policy;
use crate::services::ContentService;
use crate::state::AppState;
use crate::upload::{FileRule, UploadForm, UploadKind};

const VIDEO: &[FileRule] = &[FileRule::new("video", UploadKind::Video)];
const IMAGE: &[FileRule] = &[FileRule::new("image", UploadKind::Image)];

#[derive(Serialize)]
struct CourseList<T> {
    courses: Vec<T>,
}

#[derive(Serialize)]
struct ProgressList {
    items: Vec<ProgressEntry>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/public-courses", get(public_courses))
        .route("/api/courses", get(list_courses).post(create_course))
        .route("/api/courses/basic", post(create_basic_course))
        .route(
            "/api/courses/upload",
            post(upload_course).layer(DefaultBodyLimit::max(UploadKind::Video.body_limit())),
        )
        .route(
            "/api/courses/{id}",
            get(course_outline).put(update_course).delete(delete_course),
        )
        .route(
            "/api/courses/{id}/thumbnail",
            post(upload_thumbnail).layer(DefaultBodyLimit::max(UploadKind::Image.body_limit())),
        )
        .route("/api/courses/{id}/reorder-content", put(reorder_content))
        .route("/api/courses/{id}/progress", get(course_progress))
        .route("/api/enroll", post(enroll))
        .route("/api/my-courses", get(my_courses))
}

async fn public_courses(
    State(state): State<AppState>,
) -> Result<Json<CourseList<CourseSummary>>, AppError> {
    let courses = courses::fetch_catalogue(&state.db).await?;
    Ok(Json(CourseList { courses }))
}

async fn list_courses(
    State(state): State<AppState>,
    viewer: CurrentUser,
) -> Result<Json<CourseList<CourseTitle>>, AppError> {
    Policy::STAFF.check_role(&viewer)?;
    let courses = courses::fetch_titles(&state.db).await?;
    Ok(Json(CourseList { courses }))
}

/// Teachers own what they create; admins may hand the course to a teacher.
async fn resolve_owner(
    state: &AppState,
    viewer: &CurrentUser,
    requested: Option<i64>,
) -> Result<i64, AppError> {
    match (viewer.role, requested) {
        (Role::Admin, Some(teacher_id)) if teacher_id != viewer.id => {
            match users::find_by_id(&state.db, teacher_id).await? {
                Some(user) if user.role == Role::Teacher => Ok(user.id),
                _ => Err(AppError::BadRequest("teacher_id must name a teacher".to_string())),
            }
        }
        _ => Ok(viewer.id),
    }
}

async fn insert_course(
    state: &AppState,
    viewer: &CurrentUser,
    req: NewCourseRequest,
) -> Result<Json<Created>, AppError> {
    Policy::STAFF.check_role(viewer)?;
    if req.title.trim().is_empty() {
        return Err(AppError::BadRequest("Title required".to_string()));
    }

    let owner = resolve_owner(state, viewer, req.teacher_id).await?;
    let id = courses::insert_course(&state.db, owner, &req).await?;
    info!("course {} created by user {}", id, viewer.id);
    Ok(Json(Created::new(id)))
}

async fn create_course(
    State(state): State<AppState>,
    viewer: CurrentUser,
    Json(req): Json<NewCourseRequest>,
) -> Result<Json<Created>, AppError> {
    insert_course(&state, &viewer, req).await
}

async fn create_basic_course(
    State(state): State<AppState>,
    viewer: CurrentUser,
    Json(req): Json<NewCourseRequest>,
) -> Result<Json<Created>, AppError> {
    let req = NewCourseRequest {
        video_url: None,
        ..req
    };
    insert_course(&state, &viewer, req).await
}

/// Creates the course and its first lecture from one uploaded video.
async fn upload_course(
    State(state): State<AppState>,
    viewer: CurrentUser,
    multipart: Multipart,
) -> Result<Json<Uploaded>, AppError> {
    Policy::STAFF.check_role(&viewer)?;
    let form = UploadForm::parse(multipart, VIDEO, state.media.as_ref()).await?;
    let created = create_course_with_video(&state, &viewer, &form).await;
    form.finish(state.media.as_ref(), created).await.map(Json)
}

async fn create_course_with_video(
    state: &AppState,
    viewer: &CurrentUser,
    form: &UploadForm,
) -> Result<Uploaded, AppError> {
    let title = form
        .non_empty("title")
        .ok_or_else(|| AppError::BadRequest("Title required".to_string()))?
        .to_string();
    let description = form.text("description").unwrap_or_default().to_string();
    let projected_hours = form.float("projected_hours")?;
    let owner = resolve_owner(state, viewer, form.int("teacher_id")?).await?;
    let video_url = form
        .file("video")
        .ok_or_else(|| AppError::BadRequest("Video file required".to_string()))?
        .url();

    let req = NewCourseRequest {
        title: title.clone(),
        description: Some(description.clone()),
        video_url: Some(video_url.clone()),
        projected_hours,
        ..NewCourseRequest::default()
    };

    let mut tx = state.db.begin().await?;
    let course_id = courses::insert_course(&mut *tx, owner, &req).await?;
    lectures::insert_lecture(
        &mut *tx,
        &NewLecture {
            course_id,
            title,
            description,
            video_url: video_url.clone(),
            order_index: 0,
            lecture_date: None,
        },
    )
    .await?;
    tx.commit().await?;

    info!("course {} uploaded by user {}", course_id, viewer.id);
    Ok(Uploaded {
        ok: true,
        id: Some(course_id),
        video_url: Some(video_url),
        file_url: None,
    })
}

async fn upload_thumbnail(
    State(state): State<AppState>,
    viewer: CurrentUser,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<Json<Uploaded>, AppError> {
    Policy::AUTHOR.authorize(&state.db, &viewer, id).await?;

    let form = UploadForm::parse(multipart, IMAGE, state.media.as_ref()).await?;
    let updated = async {
        let url = form
            .file("image")
            .ok_or_else(|| AppError::BadRequest("Image file required".to_string()))?
            .url();
        courses::set_thumbnail(&state.db, id, &url).await?;
        Ok::<_, AppError>(Uploaded {
            ok: true,
            id: Some(id),
            video_url: None,
            file_url: Some(url),
        })
    }
    .await;
    form.finish(state.media.as_ref(), updated).await.map(Json)
}

async fn course_outline(
    State(state): State<AppState>,
    viewer: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<CourseOutline>, AppError> {
    let outline = ContentService::new(state.db.clone()).outline(&viewer, id).await?;
    Ok(Json(outline))
}

async fn update_course(
    State(state): State<AppState>,
    viewer: CurrentUser,
    Path(id): Path<i64>,
    Json(req): Json<UpdateCourseRequest>,
) -> Result<Json<Ack>, AppError> {
    Policy::AUTHOR.authorize(&state.db, &viewer, id).await?;
    if req.is_empty() {
        return Err(AppError::BadRequest("Nothing to update".to_string()));
    }

    let mut course: Course = courses::find_course(&state.db, id)
        .await?
        .ok_or_else(|| AppError::not_found("Course"))?;
    req.apply(&mut course);
    courses::update_course(&state.db, &course).await?;

    Ok(Json(Ack::ok()))
}

async fn delete_course(
    State(state): State<AppState>,
    viewer: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Ack>, AppError> {
    Policy::AUTHOR.authorize(&state.db, &viewer, id).await?;
    if !courses::delete_course(&state.db, id).await? {
        return Err(AppError::not_found("Course"));
    }
    info!("course {} deleted by user {}", id, viewer.id);
    Ok(Json(Ack::ok()))
}

/// Applies every position change or none of them.
async fn reorder_content(
    State(state): State<AppState>,
    viewer: CurrentUser,
    Path(id): Path<i64>,
    Json(req): Json<ReorderRequest>,
) -> Result<Json<Ack>, AppError> {
    Policy::REORDER.authorize(&state.db, &viewer, id).await?;
    if req.items.is_empty() {
        return Err(AppError::BadRequest("items array required".to_string()));
    }

    let mut tx = state.db.begin().await?;
    for item in &req.items {
        let touched = courses::set_content_order(&mut *tx, id, item.kind, item.id, item.order).await?;
        if touched == 0 {
            // Dropping the transaction rolls back the earlier updates.
            return Err(AppError::NotFound(format!(
                "{} {} not found in course {}",
                item.kind.label(),
                item.id,
                id
            )));
        }
    }
    tx.commit().await?;

    info!("reordered {} items in course {}", req.items.len(), id);
    Ok(Json(Ack::ok()))
}

async fn course_progress(
    State(state): State<AppState>,
    viewer: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<ProgressList>, AppError> {
    let items = ContentService::new(state.db.clone()).progress(&viewer, id).await?;
    Ok(Json(ProgressList { items }))
}

async fn enroll(
    State(state): State<AppState>,
    viewer: CurrentUser,
    Json(req): Json<EnrollRequest>,
) -> Result<Json<Ack>, AppError> {
    Policy::STUDENT.check_role(&viewer)?;
    let course_id = req
        .course_id
        .ok_or_else(|| AppError::BadRequest("course_id required".to_string()))?;

    if courses::find_owner(&state.db, course_id).await?.is_none() {
        return Err(AppError::not_found("Course"));
    }
    enrollments::enroll(&state.db, viewer.id, course_id).await?;

    Ok(Json(Ack::ok()))
}

async fn my_courses(
    State(state): State<AppState>,
    viewer: CurrentUser,
) -> Result<Json<CourseList<Course>>, AppError> {
    let courses = match viewer.role {
        Role::Student => courses::fetch_enrolled(&state.db, viewer.id).await?,
        Role::Teacher => courses::fetch_owned(&state.db, viewer.id).await?,
        Role::Admin => courses::fetch_all(&state.db).await?,
    };
    Ok(Json(CourseList { courses }))
}
