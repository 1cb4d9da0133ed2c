use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tracing::{debug, info};

use crate::db::{enrollments, lectures};
use crate::error::AppError;
use crate::models::{
    Ack, CompleteLectureRequest, ContentKey, ContentKind, Created, CurrentUser, LectureAssignment,
    LectureAssignmentRequest, LectureDetail, LectureQuiz, LectureQuizRequest, LectureResource,
    NewLecture, NewResource, Role, UpdateLectureRequest, Uploaded,
};
use crate::policy::Policy;
use crate::services::ContentService;
use crate::state::AppState;
use crate::upload::{FileRule, StoredFile, UploadForm, UploadKind};

use super::discard_upload;

const VIDEO: &[FileRule] = &[FileRule::new("video", UploadKind::Video)];
const VIDEO_WITH_RESOURCE: &[FileRule] = &[
    FileRule::new("video", UploadKind::Video),
    FileRule::new("resource", UploadKind::Resource),
];
const RESOURCE: &[FileRule] = &[
    FileRule::new("file", UploadKind::Resource),
    FileRule::new("resource", UploadKind::Resource),
];
const SUBMISSION: &[FileRule] = &[FileRule::new("file", UploadKind::Resource)];

#[derive(Serialize)]
struct LectureBody {
    lecture: LectureDetail,
}

#[derive(Serialize)]
struct ResourceList {
    resources: Vec<LectureResource>,
}

#[derive(Serialize)]
struct QuizBody {
    quiz: Option<LectureQuiz>,
}

#[derive(Serialize)]
struct AssignmentBody {
    assignment: Option<LectureAssignment>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/lectures/upload",
            post(upload_lecture).layer(DefaultBodyLimit::max(UploadKind::Video.body_limit())),
        )
        .route(
            "/api/lectures/upload-with-resource",
            post(upload_lecture_with_resource)
                .layer(DefaultBodyLimit::max(UploadKind::Video.body_limit())),
        )
        .route(
            "/api/lectures/{id}",
            get(lecture_detail).put(update_lecture).delete(delete_lecture),
        )
        .route(
            "/api/lectures/{id}/resources",
            get(list_resources)
                .post(add_resource)
                .layer(DefaultBodyLimit::max(UploadKind::Resource.body_limit())),
        )
        .route("/api/lectures/{id}/quiz", get(get_quiz).post(save_quiz))
        .route(
            "/api/lectures/{id}/assignment",
            get(get_assignment).post(save_assignment),
        )
        .route("/api/lectures/{id}/complete", post(complete_lecture))
        .route(
            "/api/assignments/{id}/submit",
            post(submit_assignment).layer(DefaultBodyLimit::max(UploadKind::Resource.body_limit())),
        )
}

/// Loads a lecture and checks `policy` against its course.
async fn authorize_lecture(
    state: &AppState,
    viewer: &CurrentUser,
    id: i64,
    policy: Policy,
) -> Result<LectureDetail, AppError> {
    policy.check_role(viewer)?;
    let lecture = lectures::find_detail(&state.db, id)
        .await?
        .ok_or_else(|| AppError::not_found("Lecture"))?;
    policy
        .check_course(&state.db, viewer, lecture.lecture.course_id, lecture.teacher_id)
        .await?;
    Ok(lecture)
}

async fn ensure_lecture_unlocked(
    state: &AppState,
    viewer: &CurrentUser,
    lecture: &LectureDetail,
) -> Result<(), AppError> {
    if viewer.role != Role::Student {
        return Ok(());
    }
    ContentService::new(state.db.clone())
        .ensure_unlocked(
            viewer,
            lecture.lecture.course_id,
            ContentKey::new(ContentKind::Lecture, lecture.lecture.id),
        )
        .await
}

struct LectureForm {
    course_id: i64,
    title: String,
    description: String,
    order_index: i64,
    lecture_date: Option<String>,
}

/// Common fields of the lecture upload forms; authorizes against the course.
async fn lecture_form(
    state: &AppState,
    viewer: &CurrentUser,
    form: &UploadForm,
) -> Result<LectureForm, AppError> {
    let course_id = form.int("course_id")?;
    let title = form.non_empty("title");
    let (Some(course_id), Some(title)) = (course_id, title) else {
        return Err(AppError::BadRequest("course_id and title required".to_string()));
    };

    Policy::AUTHOR.authorize(&state.db, viewer, course_id).await?;

    Ok(LectureForm {
        course_id,
        title: title.to_string(),
        description: form.text("description").unwrap_or_default().to_string(),
        order_index: form.int("order_index")?.unwrap_or(0),
        lecture_date: form.non_empty("lecture_date").map(str::to_string),
    })
}

impl LectureForm {
    fn into_new_lecture(self, video_url: String) -> NewLecture {
        NewLecture {
            course_id: self.course_id,
            title: self.title,
            description: self.description,
            video_url,
            order_index: self.order_index,
            lecture_date: self.lecture_date,
        }
    }
}

async fn upload_lecture(
    State(state): State<AppState>,
    viewer: CurrentUser,
    multipart: Multipart,
) -> Result<Json<Uploaded>, AppError> {
    Policy::AUTHOR.check_role(&viewer)?;
    let form = UploadForm::parse(multipart, VIDEO, state.media.as_ref()).await?;
    let created = create_lecture(&state, &viewer, &form).await;
    form.finish(state.media.as_ref(), created).await.map(Json)
}

async fn create_lecture(
    state: &AppState,
    viewer: &CurrentUser,
    form: &UploadForm,
) -> Result<Uploaded, AppError> {
    let fields = lecture_form(state, viewer, form).await?;
    let video_url = form
        .file("video")
        .ok_or_else(|| AppError::BadRequest("Video file required".to_string()))?
        .url();

    let id = lectures::insert_lecture(&state.db, &fields.into_new_lecture(video_url.clone())).await?;

    info!("lecture {} uploaded by user {}", id, viewer.id);
    Ok(Uploaded {
        ok: true,
        id: Some(id),
        video_url: Some(video_url),
        file_url: None,
    })
}

/// Lecture plus an optional attached resource, written in one transaction.
async fn upload_lecture_with_resource(
    State(state): State<AppState>,
    viewer: CurrentUser,
    multipart: Multipart,
) -> Result<Json<Uploaded>, AppError> {
    Policy::AUTHOR.check_role(&viewer)?;
    let form = UploadForm::parse(multipart, VIDEO_WITH_RESOURCE, state.media.as_ref()).await?;
    let created = create_lecture_with_resource(&state, &viewer, &form).await;
    form.finish(state.media.as_ref(), created).await.map(Json)
}

async fn create_lecture_with_resource(
    state: &AppState,
    viewer: &CurrentUser,
    form: &UploadForm,
) -> Result<Uploaded, AppError> {
    let fields = lecture_form(state, viewer, form).await?;
    let video_url = form
        .file("video")
        .ok_or_else(|| AppError::BadRequest("Video file required".to_string()))?
        .url();
    let resource = form.file("resource").map(|file| {
        let name = form
            .non_empty("resource_name")
            .map(str::to_string)
            .unwrap_or_else(|| file.original_name.clone());
        (file.url(), name)
    });

    let mut tx = state.db.begin().await?;
    let lecture_id = lectures::insert_lecture(&mut *tx, &fields.into_new_lecture(video_url.clone())).await?;
    if let Some((file_url, name)) = &resource {
        lectures::insert_resource(
            &mut *tx,
            &NewResource {
                lecture_id,
                name: name.clone(),
                file_url: Some(file_url.clone()),
                text_content: None,
            },
        )
        .await?;
    }
    tx.commit().await?;

    info!("lecture {} uploaded with resource by user {}", lecture_id, viewer.id);
    Ok(Uploaded {
        ok: true,
        id: Some(lecture_id),
        video_url: Some(video_url),
        file_url: resource.map(|(url, _)| url),
    })
}

async fn lecture_detail(
    State(state): State<AppState>,
    viewer: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<LectureBody>, AppError> {
    let lecture = authorize_lecture(&state, &viewer, id, Policy::VIEW_CONTENT).await?;
    ensure_lecture_unlocked(&state, &viewer, &lecture).await?;
    Ok(Json(LectureBody { lecture }))
}

async fn update_lecture(
    State(state): State<AppState>,
    viewer: CurrentUser,
    Path(id): Path<i64>,
    Json(req): Json<UpdateLectureRequest>,
) -> Result<Json<Ack>, AppError> {
    let detail = authorize_lecture(&state, &viewer, id, Policy::AUTHOR).await?;
    if req.is_empty() {
        return Err(AppError::BadRequest("Nothing to update".to_string()));
    }

    let mut lecture = detail.lecture;
    if let Some(title) = req.title {
        lecture.title = title;
    }
    if let Some(description) = req.description {
        lecture.description = description;
    }
    if let Some(date) = req.lecture_date {
        lecture.lecture_date = Some(date);
    }
    lectures::update_lecture(&state.db, &lecture).await?;

    Ok(Json(Ack::ok()))
}

async fn delete_lecture(
    State(state): State<AppState>,
    viewer: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Ack>, AppError> {
    let detail = authorize_lecture(&state, &viewer, id, Policy::AUTHOR).await?;
    if !lectures::delete_lecture(&state.db, id).await? {
        return Err(AppError::not_found("Lecture"));
    }

    // The course-level video of an uploaded course doubles as its first lecture.
    let video_url = detail.lecture.video_url;
    if !video_url.is_empty() && !lectures::video_in_use(&state.db, &video_url).await? {
        discard_upload(&state, &video_url).await;
    }

    info!("lecture {} deleted by user {}", id, viewer.id);
    Ok(Json(Ack::ok()))
}

async fn list_resources(
    State(state): State<AppState>,
    viewer: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<ResourceList>, AppError> {
    authorize_lecture(&state, &viewer, id, Policy::VIEW_CONTENT).await?;
    let resources = lectures::fetch_resources(&state.db, id).await?;
    Ok(Json(ResourceList { resources }))
}

/// A resource is either an uploaded file or a block of text.
async fn add_resource(
    State(state): State<AppState>,
    viewer: CurrentUser,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<Json<Uploaded>, AppError> {
    authorize_lecture(&state, &viewer, id, Policy::AUTHOR).await?;

    let form = UploadForm::parse(multipart, RESOURCE, state.media.as_ref()).await?;
    let added = insert_resource(&state, id, &form).await;
    form.finish(state.media.as_ref(), added).await.map(Json)
}

async fn insert_resource(state: &AppState, lecture_id: i64, form: &UploadForm) -> Result<Uploaded, AppError> {
    let file = form.file("file").or_else(|| form.file("resource"));
    let text_content = form.non_empty("text_content").map(str::to_string);
    let name = form
        .non_empty("name")
        .map(str::to_string)
        .or_else(|| file.map(|f| f.original_name.clone()));

    let Some(name) = name else {
        return Err(AppError::BadRequest("name required".to_string()));
    };
    if file.is_none() && text_content.is_none() {
        return Err(AppError::BadRequest("File or text content required".to_string()));
    }

    let file_url = file.map(StoredFile::url);
    let resource = NewResource {
        lecture_id,
        name,
        file_url: file_url.clone(),
        text_content,
    };
    let resource_id = lectures::insert_resource(&state.db, &resource).await?;

    Ok(Uploaded {
        ok: true,
        id: Some(resource_id),
        video_url: None,
        file_url,
    })
}

async fn get_quiz(
    State(state): State<AppState>,
    viewer: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<QuizBody>, AppError> {
    authorize_lecture(&state, &viewer, id, Policy::VIEW_CONTENT).await?;
    let quiz = lectures::find_quiz(&state.db, id).await?;
    Ok(Json(QuizBody { quiz }))
}

async fn save_quiz(
    State(state): State<AppState>,
    viewer: CurrentUser,
    Path(id): Path<i64>,
    Json(req): Json<LectureQuizRequest>,
) -> Result<Json<Created>, AppError> {
    authorize_lecture(&state, &viewer, id, Policy::AUTHOR).await?;
    if req.title.trim().is_empty() || req.content_json.trim().is_empty() {
        return Err(AppError::BadRequest("title and content_json required".to_string()));
    }

    let quiz_id = lectures::upsert_quiz(&state.db, id, req.title.trim(), &req.content_json).await?;
    Ok(Json(Created::new(quiz_id)))
}

async fn get_assignment(
    State(state): State<AppState>,
    viewer: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<AssignmentBody>, AppError> {
    authorize_lecture(&state, &viewer, id, Policy::VIEW_CONTENT).await?;
    let assignment = lectures::find_assignment(&state.db, id).await?;
    Ok(Json(AssignmentBody { assignment }))
}

async fn save_assignment(
    State(state): State<AppState>,
    viewer: CurrentUser,
    Path(id): Path<i64>,
    Json(req): Json<LectureAssignmentRequest>,
) -> Result<Json<Created>, AppError> {
    authorize_lecture(&state, &viewer, id, Policy::AUTHOR).await?;
    if req.title.trim().is_empty() {
        return Err(AppError::BadRequest("title required".to_string()));
    }

    let assignment_id = lectures::upsert_assignment(
        &state.db,
        id,
        req.title.trim(),
        req.description.as_deref().unwrap_or(""),
        req.file_url.as_deref().filter(|url| !url.is_empty()),
    )
    .await?;
    Ok(Json(Created::new(assignment_id)))
}

/// Records progress; a lecture counts as completed at 100%.
async fn complete_lecture(
    State(state): State<AppState>,
    viewer: CurrentUser,
    Path(id): Path<i64>,
    Json(req): Json<CompleteLectureRequest>,
) -> Result<Json<Ack>, AppError> {
    let lecture = authorize_lecture(&state, &viewer, id, Policy::LEARN).await?;
    ensure_lecture_unlocked(&state, &viewer, &lecture).await?;

    let percentage = req.completion_percentage.unwrap_or(100.0);
    if !percentage.is_finite() {
        return Err(AppError::BadRequest("completion_percentage must be a number".to_string()));
    }
    let percentage = percentage.clamp(0.0, 100.0);

    enrollments::upsert_progress(&state.db, viewer.id, id, percentage >= 100.0, percentage).await?;
    debug!("student {} at {}% on lecture {}", viewer.id, percentage, id);

    Ok(Json(Ack::ok()))
}

async fn submit_assignment(
    State(state): State<AppState>,
    viewer: CurrentUser,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<Json<Uploaded>, AppError> {
    Policy::LEARN.check_role(&viewer)?;
    let assignment = lectures::find_assignment_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::not_found("Assignment"))?;
    let lecture = authorize_lecture(&state, &viewer, assignment.lecture_id, Policy::LEARN).await?;
    ensure_lecture_unlocked(&state, &viewer, &lecture).await?;

    let form = UploadForm::parse(multipart, SUBMISSION, state.media.as_ref()).await?;
    let submitted = async {
        let file_url = form
            .file("file")
            .ok_or_else(|| AppError::BadRequest("File required".to_string()))?
            .url();
        let replaced = lectures::upsert_assignment_submission(&state.db, id, viewer.id, &file_url).await?;
        if let Some(old) = replaced {
            discard_upload(&state, &old).await;
        }
        Ok::<_, AppError>(file_url)
    }
    .await;
    let file_url = form.finish(state.media.as_ref(), submitted).await?;
    debug!("student {} submitted assignment {}", viewer.id, id);

    Ok(Json(Uploaded {
        ok: true,
        id: None,
        video_url: None,
        file_url: Some(file_url),
    }))
}
