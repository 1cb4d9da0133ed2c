use sqlx::{FromRow, SqlitePool};

/// Enrolling twice is a no-op.
pub async fn enroll(db: &SqlitePool, user_id: i64, course_id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT OR IGNORE INTO enrollments (user_id, course_id, created_at) VALUES (?1, ?2, ?3)")
        .bind(user_id)
        .bind(course_id)
        .bind(super::now())
        .execute(db)
        .await?;
    Ok(())
}

pub async fn is_enrolled(db: &SqlitePool, user_id: i64, course_id: i64) -> Result<bool, sqlx::Error> {
    let row = sqlx::query_scalar::<_, i64>("SELECT 1 FROM enrollments WHERE user_id = ? AND course_id = ?")
        .bind(user_id)
        .bind(course_id)
        .fetch_optional(db)
        .await?;
    Ok(row.is_some())
}

#[derive(Debug, Clone, FromRow)]
pub struct LectureProgressRow {
    pub lecture_id: i64,
    pub completed: bool,
    pub completion_percentage: f64,
}

/// The student's progress rows for lectures of one course.
pub async fn lecture_progress(
    db: &SqlitePool,
    user_id: i64,
    course_id: i64,
) -> Result<Vec<LectureProgressRow>, sqlx::Error> {
    sqlx::query_as::<_, LectureProgressRow>(
        r#"
        SELECT p.lecture_id, p.completed, p.completion_percentage
        FROM student_progress p
        JOIN lectures l ON l.id = p.lecture_id
        WHERE p.user_id = ? AND l.course_id = ?
        "#,
    )
    .bind(user_id)
    .bind(course_id)
    .fetch_all(db)
    .await
}

/// Records progress for a lecture. Progress never goes backwards, so a
/// completed lecture stays completed.
pub async fn upsert_progress(
    db: &SqlitePool,
    user_id: i64,
    lecture_id: i64,
    completed: bool,
    percentage: f64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO student_progress (user_id, lecture_id, completed, completion_percentage, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5)
        ON CONFLICT(user_id, lecture_id) DO UPDATE SET
            completed = MAX(student_progress.completed, excluded.completed),
            completion_percentage = MAX(student_progress.completion_percentage, excluded.completion_percentage),
            updated_at = excluded.updated_at
        "#,
    )
    .bind(user_id)
    .bind(lecture_id)
    .bind(completed)
    .bind(percentage)
    .bind(super::now())
    .execute(db)
    .await?;

    Ok(())
}
