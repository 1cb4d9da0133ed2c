pub mod content;
pub mod course;
pub mod grand;
pub mod lecture;
pub mod user;

use serde::Serialize;

pub use content::{
    ContentEntry, ContentKey, ContentKind, CourseOutline, CourseOverview, OutlineContent, Progress,
    ProgressEntry, ReorderItem, ReorderRequest, SequencedItem,
};
pub use course::{
    Course, CourseSummary, CourseTitle, EnrollRequest, NewCourseRequest, UpdateCourseRequest,
};
pub use grand::{
    GrandAssignment, GrandAssignmentSubmission, GrandQuiz, GrandQuizSubmission,
    GrandQuizSubmitRequest, NewGrandAssignmentRequest, NewGrandQuizRequest,
    UpdateGrandAssignmentRequest, UpdateGrandQuizRequest,
};
pub use lecture::{
    CompleteLectureRequest, Lecture, LectureAssignment, LectureAssignmentRequest, LectureDetail,
    LectureQuiz, LectureQuizRequest, LectureResource, LectureWithCounts, NewLecture, NewResource,
    UpdateLectureRequest,
};
pub use user::{
    CurrentUser, LoginRequest, MeResponse, NewStaffRequest, RecentUser, RegisterRequest, Role,
    TeacherSummary, User,
};

/// Acknowledgement body for writes that return nothing else.
#[derive(Debug, Serialize)]
pub struct Ack {
    pub ok: bool,
}

impl Ack {
    pub fn ok() -> Self {
        Self { ok: true }
    }
}

#[derive(Debug, Serialize)]
pub struct Created {
    pub ok: bool,
    pub id: i64,
}

impl Created {
    pub fn new(id: i64) -> Self {
        Self { ok: true, id }
    }
}

/// Response for writes that stored an uploaded file.
#[derive(Debug, Serialize)]
pub struct Uploaded {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
}
