use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GrandQuiz {
    pub id: i64,
    pub course_id: i64,
    pub title: String,
    pub description: String,
    pub content_json: String,
    pub is_live: bool,
    pub order_index: i64,
    pub is_required: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GrandAssignment {
    pub id: i64,
    pub course_id: i64,
    pub title: String,
    pub description: String,
    pub file_url: Option<String>,
    pub order_index: i64,
    pub is_required: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct GrandQuizSubmission {
    pub id: i64,
    pub quiz_id: i64,
    pub student_id: i64,
    pub answers_json: String,
    pub score: f64,
    pub submitted_at: String,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct GrandAssignmentSubmission {
    pub id: i64,
    pub assignment_id: i64,
    pub student_id: i64,
    pub file_url: String,
    pub submitted_at: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewGrandQuizRequest {
    #[serde(default)]
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub questions: Vec<serde_json::Value>,
    pub order_index: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewGrandAssignmentRequest {
    #[serde(default)]
    pub title: String,
    pub description: Option<String>,
    pub file_url: Option<String>,
    pub order_index: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateGrandQuizRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub questions: Option<Vec<serde_json::Value>>,
}

impl UpdateGrandQuizRequest {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.questions.is_none()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateGrandAssignmentRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub file_url: Option<String>,
}

impl UpdateGrandAssignmentRequest {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.file_url.is_none()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GrandQuizSubmitRequest {
    pub answers: Option<serde_json::Value>,
}
