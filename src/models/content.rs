use serde::{Deserialize, Serialize};

use crate::models::{Course, GrandAssignment, GrandQuiz, LectureWithCounts};

/// The three collections merged into a course sequence. Declaration order is
/// the tie-break used when order index and creation time are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Lecture,
    GrandQuiz,
    GrandAssignment,
}

impl ContentKind {
    pub fn label(&self) -> &'static str {
        match self {
            ContentKind::Lecture => "lecture",
            ContentKind::GrandQuiz => "grand quiz",
            ContentKind::GrandAssignment => "grand assignment",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentKey {
    pub kind: ContentKind,
    pub id: i64,
}

impl ContentKey {
    pub fn new(kind: ContentKind, id: i64) -> Self {
        Self { kind, id }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentEntry {
    Lecture(LectureWithCounts),
    GrandQuiz(GrandQuiz),
    GrandAssignment(GrandAssignment),
}

impl ContentEntry {
    pub fn kind(&self) -> ContentKind {
        match self {
            ContentEntry::Lecture(_) => ContentKind::Lecture,
            ContentEntry::GrandQuiz(_) => ContentKind::GrandQuiz,
            ContentEntry::GrandAssignment(_) => ContentKind::GrandAssignment,
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            ContentEntry::Lecture(l) => l.lecture.id,
            ContentEntry::GrandQuiz(q) => q.id,
            ContentEntry::GrandAssignment(a) => a.id,
        }
    }

    pub fn key(&self) -> ContentKey {
        ContentKey::new(self.kind(), self.id())
    }

    pub fn title(&self) -> &str {
        match self {
            ContentEntry::Lecture(l) => &l.lecture.title,
            ContentEntry::GrandQuiz(q) => &q.title,
            ContentEntry::GrandAssignment(a) => &a.title,
        }
    }

    pub fn order_index(&self) -> i64 {
        match self {
            ContentEntry::Lecture(l) => l.lecture.order_index,
            ContentEntry::GrandQuiz(q) => q.order_index,
            ContentEntry::GrandAssignment(a) => a.order_index,
        }
    }

    pub fn created_at(&self) -> &str {
        match self {
            ContentEntry::Lecture(l) => &l.lecture.created_at,
            ContentEntry::GrandQuiz(q) => &q.created_at,
            ContentEntry::GrandAssignment(a) => &a.created_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Progress {
    pub completed: bool,
    pub percentage: f64,
}

impl Progress {
    pub fn done() -> Self {
        Self {
            completed: true,
            percentage: 100.0,
        }
    }
}

/// A content entry as a student sees it.
#[derive(Debug, Clone, Serialize)]
pub struct SequencedItem {
    #[serde(flatten)]
    pub entry: ContentEntry,
    pub progress: Progress,
    pub is_locked: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum OutlineContent {
    Staff(Vec<ContentEntry>),
    Student(Vec<SequencedItem>),
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseOverview {
    #[serde(flatten)]
    pub course: Course,
    pub lecture_count: usize,
    pub grand_quiz_count: usize,
    pub grand_assignment_count: usize,
    pub total_content_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseOutline {
    pub course: CourseOverview,
    pub lectures: Vec<LectureWithCounts>,
    #[serde(rename = "grandQuizzes")]
    pub grand_quizzes: Vec<GrandQuiz>,
    #[serde(rename = "grandAssignments")]
    pub grand_assignments: Vec<GrandAssignment>,
    #[serde(rename = "allContent")]
    pub all_content: OutlineContent,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgressEntry {
    #[serde(rename = "type")]
    pub kind: ContentKind,
    pub id: i64,
    pub title: String,
    pub completed: bool,
    pub percentage: f64,
    pub is_locked: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReorderItem {
    #[serde(rename = "type")]
    pub kind: ContentKind,
    pub id: i64,
    pub order: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReorderRequest {
    #[serde(default)]
    pub items: Vec<ReorderItem>,
}
