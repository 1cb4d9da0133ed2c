use sqlx::{SqliteExecutor, SqlitePool};

use crate::models::{ContentKind, Course, CourseSummary, CourseTitle, NewCourseRequest};

const COURSE_COLUMNS: &str = r#"
    c.id, c.title, c.description, c.teacher_id, u.name AS teacher_name,
    c.video_url, c.thumbnail_url, c.projected_hours, c.total_lectures,
    c.price, c.payment_type, c.monthly_payment_month, c.is_free,
    c.launch_date, c.is_published, c.created_at
"#;

pub async fn fetch_catalogue(db: &SqlitePool) -> Result<Vec<CourseSummary>, sqlx::Error> {
    sqlx::query_as::<_, CourseSummary>(
        r#"
        SELECT
            c.id, c.title, c.description, c.thumbnail_url, c.projected_hours,
            c.price, c.payment_type, c.is_free,
            u.name AS teacher_name,
            (SELECT COUNT(*) FROM lectures l WHERE l.course_id = c.id) AS lecture_count,
            (SELECT COUNT(*) FROM lecture_assignments la
                JOIN lectures l ON l.id = la.lecture_id
                WHERE l.course_id = c.id) AS assignment_count,
            (SELECT COUNT(*) FROM lecture_quizzes lq
                JOIN lectures l ON l.id = lq.lecture_id
                WHERE l.course_id = c.id) AS quiz_count
        FROM courses c
        JOIN users u ON u.id = c.teacher_id
        ORDER BY c.created_at DESC
        "#,
    )
    .fetch_all(db)
    .await
}

pub async fn fetch_titles(db: &SqlitePool) -> Result<Vec<CourseTitle>, sqlx::Error> {
    sqlx::query_as::<_, CourseTitle>("SELECT id, title FROM courses ORDER BY created_at DESC")
        .fetch_all(db)
        .await
}

pub async fn fetch_all(db: &SqlitePool) -> Result<Vec<Course>, sqlx::Error> {
    let sql = format!(
        "SELECT {COURSE_COLUMNS} FROM courses c JOIN users u ON u.id = c.teacher_id ORDER BY c.created_at DESC"
    );
    sqlx::query_as::<_, Course>(&sql).fetch_all(db).await
}

pub async fn fetch_owned(db: &SqlitePool, teacher_id: i64) -> Result<Vec<Course>, sqlx::Error> {
    let sql = format!(
        "SELECT {COURSE_COLUMNS} FROM courses c JOIN users u ON u.id = c.teacher_id
         WHERE c.teacher_id = ? ORDER BY c.created_at DESC"
    );
    sqlx::query_as::<_, Course>(&sql)
        .bind(teacher_id)
        .fetch_all(db)
        .await
}

pub async fn fetch_enrolled(db: &SqlitePool, student_id: i64) -> Result<Vec<Course>, sqlx::Error> {
    let sql = format!(
        "SELECT {COURSE_COLUMNS} FROM enrollments e
         JOIN courses c ON c.id = e.course_id
         JOIN users u ON u.id = c.teacher_id
         WHERE e.user_id = ? ORDER BY e.created_at DESC"
    );
    sqlx::query_as::<_, Course>(&sql)
        .bind(student_id)
        .fetch_all(db)
        .await
}

pub async fn find_course(db: &SqlitePool, id: i64) -> Result<Option<Course>, sqlx::Error> {
    let sql = format!(
        "SELECT {COURSE_COLUMNS} FROM courses c JOIN users u ON u.id = c.teacher_id WHERE c.id = ?"
    );
    sqlx::query_as::<_, Course>(&sql)
        .bind(id)
        .fetch_optional(db)
        .await
}

/// Owner of a course, if the course exists.
pub async fn find_owner(db: &SqlitePool, id: i64) -> Result<Option<i64>, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT teacher_id FROM courses WHERE id = ?")
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn insert_course<'e>(
    db: impl SqliteExecutor<'e>,
    teacher_id: i64,
    req: &NewCourseRequest,
) -> Result<i64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO courses
            (title, description, video_url, teacher_id, projected_hours, launch_date,
            is_published, price, payment_type, monthly_payment_month, is_free, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
        "#,
    )
    .bind(&req.title)
    .bind(req.description.as_deref().unwrap_or(""))
    .bind(req.video_url.as_deref().unwrap_or(""))
    .bind(teacher_id)
    .bind(req.projected_hours)
    .bind(&req.launch_date)
    .bind(req.is_published.unwrap_or(false))
    .bind(req.price.unwrap_or(0.0))
    .bind(req.payment_type.as_deref().unwrap_or("one_time"))
    .bind(&req.monthly_payment_month)
    .bind(req.is_free.unwrap_or(true))
    .bind(super::now())
    .execute(db)
    .await?;

    Ok(result.last_insert_rowid())
}

pub async fn update_course(db: &SqlitePool, course: &Course) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE courses
        SET title = ?1,
            description = ?2,
            projected_hours = ?3,
            total_lectures = ?4,
            price = ?5,
            payment_type = ?6,
            monthly_payment_month = ?7,
            is_free = ?8
        WHERE id = ?9
        "#,
    )
    .bind(&course.title)
    .bind(&course.description)
    .bind(course.projected_hours)
    .bind(course.total_lectures)
    .bind(course.price)
    .bind(&course.payment_type)
    .bind(&course.monthly_payment_month)
    .bind(course.is_free)
    .bind(course.id)
    .execute(db)
    .await?;

    Ok(())
}

pub async fn set_thumbnail(db: &SqlitePool, id: i64, url: &str) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE courses SET thumbnail_url = ? WHERE id = ?")
        .bind(url)
        .bind(id)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn delete_course(db: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM courses WHERE id = ?")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Moves one content item within its course. Returns the number of rows
/// touched, zero when the item is not part of the course.
pub async fn set_content_order<'e>(
    db: impl SqliteExecutor<'e>,
    course_id: i64,
    kind: ContentKind,
    id: i64,
    order: i64,
) -> Result<u64, sqlx::Error> {
    let sql = match kind {
        ContentKind::Lecture => "UPDATE lectures SET order_index = ?1 WHERE id = ?2 AND course_id = ?3",
        ContentKind::GrandQuiz => {
            "UPDATE grand_quizzes SET order_index = ?1 WHERE id = ?2 AND course_id = ?3"
        }
        ContentKind::GrandAssignment => {
            "UPDATE grand_assignments SET order_index = ?1 WHERE id = ?2 AND course_id = ?3"
        }
    };

    let result = sqlx::query(sql)
        .bind(order)
        .bind(id)
        .bind(course_id)
        .execute(db)
        .await?;

    Ok(result.rows_affected())
}
