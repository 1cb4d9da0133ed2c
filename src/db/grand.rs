use sqlx::SqlitePool;

use crate::models::{GrandAssignment, GrandQuiz};

const QUIZ_COLUMNS: &str =
    "id, course_id, title, description, content_json, is_live, order_index, is_required, created_at";
const ASSIGNMENT_COLUMNS: &str =
    "id, course_id, title, description, file_url, order_index, is_required, created_at";

pub async fn fetch_quizzes(db: &SqlitePool, course_id: i64) -> Result<Vec<GrandQuiz>, sqlx::Error> {
    let sql = format!(
        "SELECT {QUIZ_COLUMNS} FROM grand_quizzes WHERE course_id = ? ORDER BY order_index ASC, created_at ASC"
    );
    sqlx::query_as::<_, GrandQuiz>(&sql)
        .bind(course_id)
        .fetch_all(db)
        .await
}

pub async fn fetch_assignments(
    db: &SqlitePool,
    course_id: i64,
) -> Result<Vec<GrandAssignment>, sqlx::Error> {
    let sql = format!(
        "SELECT {ASSIGNMENT_COLUMNS} FROM grand_assignments WHERE course_id = ? ORDER BY order_index ASC, created_at ASC"
    );
    sqlx::query_as::<_, GrandAssignment>(&sql)
        .bind(course_id)
        .fetch_all(db)
        .await
}

pub async fn find_quiz(db: &SqlitePool, id: i64) -> Result<Option<GrandQuiz>, sqlx::Error> {
    let sql = format!("SELECT {QUIZ_COLUMNS} FROM grand_quizzes WHERE id = ?");
    sqlx::query_as::<_, GrandQuiz>(&sql)
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn find_assignment(db: &SqlitePool, id: i64) -> Result<Option<GrandAssignment>, sqlx::Error> {
    let sql = format!("SELECT {ASSIGNMENT_COLUMNS} FROM grand_assignments WHERE id = ?");
    sqlx::query_as::<_, GrandAssignment>(&sql)
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn insert_quiz(
    db: &SqlitePool,
    course_id: i64,
    title: &str,
    description: &str,
    content_json: &str,
    order_index: i64,
) -> Result<i64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO grand_quizzes (course_id, title, description, content_json, order_index, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(course_id)
    .bind(title)
    .bind(description)
    .bind(content_json)
    .bind(order_index)
    .bind(super::now())
    .execute(db)
    .await?;

    Ok(result.last_insert_rowid())
}

pub async fn insert_assignment(
    db: &SqlitePool,
    course_id: i64,
    title: &str,
    description: &str,
    file_url: Option<&str>,
    order_index: i64,
) -> Result<i64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO grand_assignments (course_id, title, description, file_url, order_index, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(course_id)
    .bind(title)
    .bind(description)
    .bind(file_url)
    .bind(order_index)
    .bind(super::now())
    .execute(db)
    .await?;

    Ok(result.last_insert_rowid())
}

pub async fn update_quiz(db: &SqlitePool, quiz: &GrandQuiz) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE grand_quizzes SET title = ?1, description = ?2, content_json = ?3 WHERE id = ?4")
        .bind(&quiz.title)
        .bind(&quiz.description)
        .bind(&quiz.content_json)
        .bind(quiz.id)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn update_assignment(db: &SqlitePool, assignment: &GrandAssignment) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE grand_assignments SET title = ?1, description = ?2, file_url = ?3 WHERE id = ?4")
        .bind(&assignment.title)
        .bind(&assignment.description)
        .bind(&assignment.file_url)
        .bind(assignment.id)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn delete_quiz(db: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM grand_quizzes WHERE id = ?")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete_assignment(db: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM grand_assignments WHERE id = ?")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Insert or replace: one live submission per (quiz, student).
pub async fn upsert_quiz_submission(
    db: &SqlitePool,
    quiz_id: i64,
    student_id: i64,
    answers_json: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO grand_quiz_submissions (quiz_id, student_id, answers_json, submitted_at)
        VALUES (?1, ?2, ?3, ?4)
        ON CONFLICT(quiz_id, student_id) DO UPDATE SET
            answers_json = excluded.answers_json,
            score = 0,
            submitted_at = excluded.submitted_at
        "#,
    )
    .bind(quiz_id)
    .bind(student_id)
    .bind(answers_json)
    .bind(super::now())
    .execute(db)
    .await?;

    Ok(())
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
        "SELECT file_url FROM grand_assignment_submissions WHERE assignment_id = ? AND student_id = ?",
    )
    .bind(assignment_id)
    .bind(student_id)
    .fetch_optional(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO grand_assignment_submissions (assignment_id, student_id, file_url, submitted_at)
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

/// Ids of the course's grand quizzes the student has submitted.
pub async fn submitted_quiz_ids(
    db: &SqlitePool,
    student_id: i64,
    course_id: i64,
) -> Result<Vec<i64>, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        SELECT s.quiz_id
        FROM grand_quiz_submissions s
        JOIN grand_quizzes q ON q.id = s.quiz_id
        WHERE s.student_id = ? AND q.course_id = ?
        "#,
    )
    .bind(student_id)
    .bind(course_id)
    .fetch_all(db)
    .await
}

pub async fn submitted_assignment_ids(
    db: &SqlitePool,
    student_id: i64,
    course_id: i64,
) -> Result<Vec<i64>, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        SELECT s.assignment_id
        FROM grand_assignment_submissions s
        JOIN grand_assignments a ON a.id = s.assignment_id
        WHERE s.student_id = ? AND a.course_id = ?
        "#,
    )
    .bind(student_id)
    .bind(course_id)
    .fetch_all(db)
    .await
}
