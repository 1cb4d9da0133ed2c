use sqlx::SqlitePool;

use crate::models::{RecentUser, Role, TeacherSummary, User};

pub struct NewUser<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub role: Role,
    pub bio: Option<&'a str>,
    pub specialization: Option<&'a str>,
}

pub async fn find_by_email(db: &SqlitePool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "SELECT id, name, email, password_hash, role, bio, specialization, created_at FROM users WHERE email = ?",
    )
    .bind(email)
    .fetch_optional(db)
    .await
}

pub async fn find_by_id(db: &SqlitePool, id: i64) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "SELECT id, name, email, password_hash, role, bio, specialization, created_at FROM users WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(db)
    .await
}

pub async fn insert_user(db: &SqlitePool, user: NewUser<'_>) -> Result<i64, sqlx::Error> {
    let now = super::now();
    let result = sqlx::query(
        r#"
        INSERT INTO users (name, email, password_hash, role, bio, specialization, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(user.name)
    .bind(user.email)
    .bind(user.password_hash)
    .bind(user.role)
    .bind(user.bio)
    .bind(user.specialization)
    .bind(now)
    .execute(db)
    .await?;

    Ok(result.last_insert_rowid())
}

pub async fn fetch_teachers(db: &SqlitePool) -> Result<Vec<TeacherSummary>, sqlx::Error> {
    sqlx::query_as::<_, TeacherSummary>(
        r#"
        SELECT
            u.id, u.name, u.email, u.created_at,
            COUNT(DISTINCT c.id) AS course_count,
            COUNT(DISTINCT e.user_id) AS student_count
        FROM users u
        LEFT JOIN courses c ON c.teacher_id = u.id
        LEFT JOIN enrollments e ON e.course_id = c.id
        WHERE u.role = 'teacher'
        GROUP BY u.id, u.name, u.email, u.created_at
        ORDER BY u.created_at DESC
        "#,
    )
    .fetch_all(db)
    .await
}

/// Deletes a user only when it holds `role`. Courses cascade with their owner.
pub async fn delete_with_role(db: &SqlitePool, id: i64, role: Role) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM users WHERE id = ? AND role = ?")
        .bind(id)
        .bind(role)
        .execute(db)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn fetch_recent(db: &SqlitePool, limit: i64) -> Result<Vec<RecentUser>, sqlx::Error> {
    sqlx::query_as::<_, RecentUser>(
        r#"
        SELECT name, email, role, created_at
        FROM users
        WHERE role IN ('student', 'teacher')
        ORDER BY created_at DESC
        LIMIT ?
        "#,
    )
    .bind(limit)
    .fetch_all(db)
    .await
}
