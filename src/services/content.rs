use std::collections::HashMap;

use sqlx::SqlitePool;
use tracing::debug;

use crate::db::{courses, enrollments, grand, lectures};
use crate::error::AppError;
use crate::models::{
    ContentEntry, ContentKey, ContentKind, CourseOutline, CourseOverview, CurrentUser,
    GrandAssignment, GrandQuiz, LectureResource, LectureWithCounts, OutlineContent, Progress,
    ProgressEntry, Role,
};
use crate::policy::Policy;
use crate::sequencing::{self, CompletionMap};

/// Reads a course's content in sequence order and applies per-student locking.
pub struct ContentService {
    db: SqlitePool,
}

struct CourseContent {
    lectures: Vec<LectureWithCounts>,
    quizzes: Vec<GrandQuiz>,
    assignments: Vec<GrandAssignment>,
}

impl CourseContent {
    fn sequence(&self) -> Vec<ContentEntry> {
        sequencing::sequence(
            self.lectures.clone(),
            self.quizzes.clone(),
            self.assignments.clone(),
        )
    }
}

impl ContentService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    async fn load(&self, course_id: i64) -> Result<CourseContent, AppError> {
        Ok(CourseContent {
            lectures: lectures::fetch_for_course(&self.db, course_id).await?,
            quizzes: grand::fetch_quizzes(&self.db, course_id).await?,
            assignments: grand::fetch_assignments(&self.db, course_id).await?,
        })
    }

    /// The course page: course row with counts, the three collections and the
    /// merged sequence. Students get lock and progress state per item.
    pub async fn outline(&self, viewer: &CurrentUser, course_id: i64) -> Result<CourseOutline, AppError> {
        let course = courses::find_course(&self.db, course_id)
            .await?
            .ok_or_else(|| AppError::not_found("Course"))?;
        Policy::VIEW_COURSE
            .check_course(&self.db, viewer, course_id, course.teacher_id)
            .await?;

        let mut content = self.load(course_id).await?;

        let all_content = if viewer.role == Role::Student {
            let completion = self.completion_map(viewer.id, course_id).await?;
            OutlineContent::Student(sequencing::annotate(content.sequence(), &completion))
        } else {
            let resources = lectures::fetch_course_resources(&self.db, course_id).await?;
            attach_resources(&mut content.lectures, resources);
            OutlineContent::Staff(content.sequence())
        };

        let lecture_count = content.lectures.len();
        let grand_quiz_count = content.quizzes.len();
        let grand_assignment_count = content.assignments.len();

        Ok(CourseOutline {
            course: CourseOverview {
                course,
                lecture_count,
                grand_quiz_count,
                grand_assignment_count,
                total_content_count: lecture_count + grand_quiz_count + grand_assignment_count,
            },
            lectures: content.lectures,
            grand_quizzes: content.quizzes,
            grand_assignments: content.assignments,
            all_content,
        })
    }

    /// Lecture progress rows plus grand submissions, each submission counting
    /// as complete.
    pub async fn completion_map(&self, student_id: i64, course_id: i64) -> Result<CompletionMap, AppError> {
        let mut completion = CompletionMap::new();

        for row in enrollments::lecture_progress(&self.db, student_id, course_id).await? {
            completion.insert(
                ContentKey::new(ContentKind::Lecture, row.lecture_id),
                Progress {
                    completed: row.completed,
                    percentage: row.completion_percentage,
                },
            );
        }
        for id in grand::submitted_quiz_ids(&self.db, student_id, course_id).await? {
            completion.insert(ContentKey::new(ContentKind::GrandQuiz, id), Progress::done());
        }
        for id in grand::submitted_assignment_ids(&self.db, student_id, course_id).await? {
            completion.insert(ContentKey::new(ContentKind::GrandAssignment, id), Progress::done());
        }

        Ok(completion)
    }

    pub async fn ordered_keys(&self, course_id: i64) -> Result<Vec<ContentKey>, AppError> {
        let content = self.load(course_id).await?;
        Ok(content.sequence().iter().map(ContentEntry::key).collect())
    }

    /// Refuses a student's access to an item whose predecessor is incomplete.
    pub async fn ensure_unlocked(
        &self,
        student: &CurrentUser,
        course_id: i64,
        target: ContentKey,
    ) -> Result<(), AppError> {
        let keys = self.ordered_keys(course_id).await?;
        let completion = self.completion_map(student.id, course_id).await?;

        match sequencing::is_unlocked(&keys, &completion, target) {
            Some(true) => Ok(()),
            Some(false) => {
                debug!(
                    "student {} blocked from {} {} in course {}",
                    student.id,
                    target.kind.label(),
                    target.id,
                    course_id
                );
                Err(AppError::Forbidden(
                    "Previous item must be completed first".to_string(),
                ))
            }
            None => Err(AppError::NotFound(format!(
                "{} not found",
                capitalize(target.kind.label())
            ))),
        }
    }

    /// One entry per sequenced item for an enrolled student.
    pub async fn progress(&self, student: &CurrentUser, course_id: i64) -> Result<Vec<ProgressEntry>, AppError> {
        Policy::LEARN.authorize(&self.db, student, course_id).await?;

        let content = self.load(course_id).await?;
        let completion = self.completion_map(student.id, course_id).await?;

        Ok(sequencing::annotate(content.sequence(), &completion)
            .into_iter()
            .map(|item| ProgressEntry {
                kind: item.entry.kind(),
                id: item.entry.id(),
                title: item.entry.title().to_string(),
                completed: item.progress.completed,
                percentage: item.progress.percentage,
                is_locked: item.is_locked,
            })
            .collect())
    }
}

fn attach_resources(lectures: &mut [LectureWithCounts], resources: Vec<LectureResource>) {
    let mut by_lecture: HashMap<i64, Vec<LectureResource>> = HashMap::new();
    for resource in resources {
        by_lecture.entry(resource.lecture_id).or_default().push(resource);
    }
    for lecture in lectures.iter_mut() {
        lecture.resources = Some(by_lecture.remove(&lecture.lecture.id).unwrap_or_default());
    }
}

fn capitalize(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capitalize_first_letter_only() {
        assert_eq!(capitalize("grand quiz"), "Grand quiz");
        assert_eq!(capitalize(""), "");
    }
}
