use sqlx::{SqliteExecutor, SqlitePool};

use crate::models::{
    Lecture, LectureAssignment, LectureDetail, LectureQuiz, LectureResource, LectureWithCounts,
    NewLecture, NewResource,
};

pub async fn fetch_for_course(
    db: &SqlitePool,
    course_id: i64,
) -> Result<Vec<LectureWithCounts>, sqlx::Error> {
    sqlx::query_as::<_, LectureWithCounts>(
        r#"
        SELECT
            l.id, l.course_id, l.title, l.description, l.video_url,
            l.order_index, l.lecture_date, l.created_at,
            (SELECT COUNT(*) FROM lecture_resources WHERE lecture_id = l.id) AS resource_count,
            (SELECT COUNT(*) FROM lecture_quizzes WHERE lecture_id = l.id) AS quiz_count,
            (SELECT COUNT(*) FROM lecture_assignments WHERE lecture_id = l.id) AS assignment_count
        FROM lectures l
        WHERE l.course_id = ?
        ORDER BY l.order_index ASC, l.created_at ASC
        "#,
    )
    .bind(course_id)
    .fetch_all(db)
    .await
}

pub async fn find_detail(db: &SqlitePool, id: i64) -> Result<Option<LectureDetail>, sqlx::Error> {
    sqlx::query_as::<_, LectureDetail>(
        r#"
        SELECT
            l.id, l.course_id, l.title, l.description, l.video_url,
            l.order_index, l.lecture_date, l.created_at,
            c.title AS course_title, c.teacher_id
        FROM lectures l
        JOIN courses c ON c.id = l.course_id
        WHERE l.id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await
}

pub async fn insert_lecture<'e>(
    db: impl SqliteExecutor<'e>,
    lecture: &NewLecture,
) -> Result<i64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO lectures
            (course_id, title, description, video_url, order_index, lecture_date, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(lecture.course_id)
    .bind(&lecture.title)
    .bind(&lecture.description)
    .bind(&lecture.video_url)
    .bind(lecture.order_index)
    .bind(&lecture.lecture_date)
    .bind(super::now())
    .execute(db)
    .await?;

    Ok(result.last_insert_rowid())
}

pub async fn update_lecture(db: &SqlitePool, lecture: &Lecture) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE lectures SET title = ?1, description = ?2, lecture_date = ?3 WHERE id = ?4")
        .bind(&lecture.title)
        .bind(&lecture.description)
        .bind(&lecture.lecture_date)
        .bind(lecture.id)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn delete_lecture(db: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM lectures WHERE id = ?")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn fetch_resources(
    db: &SqlitePool,
    lecture_id: i64,
) -> Result<Vec<LectureResource>, sqlx::Error> {
    sqlx::query_as::<_, LectureResource>(
        r#"
        SELECT id, lecture_id, name, file_url, text_content, created_at
        FROM lecture_resources
        WHERE lecture_id = ?
        ORDER BY created_at ASC
        "#,
    )
    .bind(lecture_id)
    .fetch_all(db)
    .await
}

/// Every resource of every lecture in a course, oldest first.
pub async fn fetch_course_resources(
    db: &SqlitePool,
    course_id: i64,
) -> Result<Vec<LectureResource>, sqlx::Error> {
    sqlx::query_as::<_, LectureResource>(
        r#"
        SELECT r.id, r.lecture_id, r.name, r.file_url, r.text_content, r.created_at
        FROM lecture_resources r
        JOIN lectures l ON l.id = r.lecture_id
        WHERE l.course_id = ?
        ORDER BY r.created_at ASC
        "#,
    )
    .bind(course_id)
    .fetch_all(db)
    .await
}

pub async fn insert_resource<'e>(
    db: impl SqliteExecutor<'e>,
    resource: &NewResource,
) -> Result<i64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO lecture_resources (lecture_id, name, file_url, text_content, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
    )
    .bind(resource.lecture_id)
    .bind(&resource.name)
    .bind(&resource.file_url)
    .bind(&resource.text_content)
    .bind(super::now())
    .execute(db)
    .await?;

    Ok(result.last_insert_rowid())
}

pub async fn find_quiz(db: &SqlitePool, lecture_id: i64) -> Result<Option<LectureQuiz>, sqlx::Error> {
    sqlx::query_as::<_, LectureQuiz>(
        "SELECT id, lecture_id, title, content_json, is_live, created_at FROM lecture_quizzes WHERE lecture_id = ?",
    )
    .bind(lecture_id)
    .fetch_optional(db)
    .await
}

pub async fn upsert_quiz(
    db: &SqlitePool,
    lecture_id: i64,
    title: &str,
    content_json: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO lecture_quizzes (lecture_id, title, content_json, created_at)
        VALUES (?1, ?2, ?3, ?4)
        ON CONFLICT(lecture_id) DO UPDATE SET
            title = excluded.title,
            content_json = excluded.content_json
        RETURNING id
        "#,
    )
    .bind(lecture_id)
    .bind(title)
    .bind(content_json)
    .bind(super::now())
    .fetch_one(db)
    .await
}

pub async fn find_assignment(
    db: &SqlitePool,
    lecture_id: i64,
) -> Result<Option<LectureAssignment>, sqlx::Error> {
    sqlx::query_as::<_, LectureAssignment>(
        "SELECT id, lecture_id, title, description, file_url, created_at FROM lecture_assignments WHERE lecture_id = ?",
    )
    .bind(lecture_id)
    .fetch_optional(db)
    .await
}

pub async fn find_assignment_by_id(
    db: &SqlitePool,
    id: i64,
) -> Result<Option<LectureAssignment>, sqlx::Error> {
    sqlx::query_as::<_, LectureAssignment>(
        "SELECT id, lecture_id, title, description, file_url, created_at FROM lecture_assignments WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(db)
    .await
}

pub async fn upsert_assignment(
    db: &SqlitePool,
    lecture_id: i64,
    title: &str,
    description: &str,
    file_url: Option<&str>,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO lecture_assignments (lecture_id, title, description, file_url, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5)
        ON CONFLICT(lecture_id) DO UPDATE SET
            title = excluded.title,
            description = excluded.description,
            file_url = excluded.file_url
        RETURNING id
        "#,
    )
    .bind(lecture_id)
    .bind(title)
    .bind(description)
    .bind(file_url)
    .bind(super::now())
    .fetch_one(db)
    .await
}

/// Insert or replace: one live submission per (assignment, student). Returns
/// the file of the submission it replaced.
pub async fn upsert_assignment_submission(
    db: &SqlitePool,
    assignment_id: i64,
    student_id: i64,
    file_url: &str,
) -> Result<Option<String>, sqlx::Error> {
    let mut tx = db.begin().await?;

    let previous = sqlx::query_scalar::<_, String>(
        "SELECT file_url FROM lecture_assignment_submissions WHERE assignment_id = ? AND student_id = ?",
    )
    .bind(assignment_id)
    .bind(student_id)
    .fetch_optional(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO lecture_assignment_submissions (assignment_id, student_id, file_url, submitted_at)
        VALUES (?1, ?2, ?3, ?4)
        ON CONFLICT(assignment_id, student_id) DO UPDATE SET
            file_url = excluded.file_url,
            submitted_at = excluded.submitted_at
        "#,
    )
    .bind(assignment_id)
    .bind(student_id)
    .bind(file_url)
    .bind(super::now())
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(previous.filter(|url| url != file_url))
}

/// Whether any course or lecture still points at a stored video.
pub async fn video_in_use(db: &SqlitePool, url: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS(SELECT 1 FROM lectures WHERE video_url = ?1)
            OR EXISTS(SELECT 1 FROM courses WHERE video_url = ?1)
        "#,
    )
    .bind(url)
    .fetch_one(db)
    .await
}
