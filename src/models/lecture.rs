use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Lecture {
    pub id: i64,
    pub course_id: i64,
    pub title: String,
    pub description: String,
    pub video_url: String,
    pub order_index: i64,
    pub lecture_date: Option<String>,
    pub created_at: String,
}

/// Lecture row plus the authoring counts shown in the course outline.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct LectureWithCounts {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub lecture: Lecture,
    pub resource_count: i64,
    pub quiz_count: i64,
    pub assignment_count: i64,
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<Vec<LectureResource>>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct LectureDetail {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub lecture: Lecture,
    pub course_title: String,
    pub teacher_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LectureResource {
    pub id: i64,
    pub lecture_id: i64,
    pub name: String,
    pub file_url: Option<String>,
    pub text_content: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LectureQuiz {
    pub id: i64,
    pub lecture_id: i64,
    pub title: String,
    pub content_json: String,
    pub is_live: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LectureAssignment {
    pub id: i64,
    pub lecture_id: i64,
    pub title: String,
    pub description: String,
    pub file_url: Option<String>,
    pub created_at: String,
}

/// Insert payload assembled by the upload handlers.
#[derive(Debug, Clone)]
pub struct NewLecture {
    pub course_id: i64,
    pub title: String,
    pub description: String,
    pub video_url: String,
    pub order_index: i64,
    pub lecture_date: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewResource {
    pub lecture_id: i64,
    pub name: String,
    pub file_url: Option<String>,
    pub text_content: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateLectureRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub lecture_date: Option<String>,
}

impl UpdateLectureRequest {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.lecture_date.is_none()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LectureQuizRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content_json: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LectureAssignmentRequest {
    #[serde(default)]
    pub title: String,
    pub description: Option<String>,
    pub file_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompleteLectureRequest {
    pub completion_percentage: Option<f64>,
}
