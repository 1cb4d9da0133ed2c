use serde::Serialize;
use sqlx::SqlitePool;

#[derive(Debug, Clone, Serialize)]
pub struct AdminStats {
    pub students: i64,
    pub teachers: i64,
    pub courses: i64,
    pub lectures: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TeacherStats {
    pub courses: i64,
    pub lectures: i64,
    pub students: i64,
}

async fn count(db: &SqlitePool, sql: &str, arg: Option<&str>) -> Result<i64, sqlx::Error> {
    let mut query = sqlx::query_scalar::<_, i64>(sql);
    if let Some(arg) = arg {
        query = query.bind(arg);
    }
    query.fetch_one(db).await
}

pub async fn admin_stats(db: &SqlitePool) -> Result<AdminStats, sqlx::Error> {
    let by_role = "SELECT COUNT(*) FROM users WHERE role = ?";
    Ok(AdminStats {
        students: count(db, by_role, Some("student")).await?,
        teachers: count(db, by_role, Some("teacher")).await?,
        courses: count(db, "SELECT COUNT(*) FROM courses", None).await?,
        lectures: count(db, "SELECT COUNT(*) FROM lectures", None).await?,
    })
}

pub async fn teacher_stats(db: &SqlitePool, teacher_id: i64) -> Result<TeacherStats, sqlx::Error> {
    let row: (i64, i64, i64) = sqlx::query_as(
        r#"
        SELECT
            (SELECT COUNT(*) FROM courses WHERE teacher_id = ?1),
            (SELECT COUNT(*) FROM lectures l JOIN courses c ON c.id = l.course_id
                WHERE c.teacher_id = ?1),
            (SELECT COUNT(DISTINCT e.user_id) FROM enrollments e JOIN courses c ON c.id = e.course_id
                WHERE c.teacher_id = ?1)
        "#,
    )
    .bind(teacher_id)
    .fetch_one(db)
    .await?;

    Ok(TeacherStats {
        courses: row.0,
        lectures: row.1,
        students: row.2,
    })
}
