use sqlx::SqlitePool;

use crate::models::CurrentUser;

pub async fn insert_session(
    db: &SqlitePool,
    token_hash: &str,
    user_id: i64,
    expires_at: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO sessions (token_hash, user_id, expires_at, created_at) VALUES (?1, ?2, ?3, ?4)",
    )
    .bind(token_hash)
    .bind(user_id)
    .bind(expires_at)
    .bind(super::now())
    .execute(db)
    .await?;

    Ok(())
}

/// Resolves a live session to its user.
pub async fn find_user(db: &SqlitePool, token_hash: &str) -> Result<Option<CurrentUser>, sqlx::Error> {
    sqlx::query_as::<_, CurrentUser>(
        r#"
        SELECT u.id, u.name, u.email, u.role
        FROM sessions s
        JOIN users u ON u.id = s.user_id
        WHERE s.token_hash = ?1 AND s.expires_at > ?2
        "#,
    )
    .bind(token_hash)
    .bind(super::now())
    .fetch_optional(db)
    .await
}

pub async fn delete_session(db: &SqlitePool, token_hash: &str) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM sessions WHERE token_hash = ?")
        .bind(token_hash)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn purge_expired(db: &SqlitePool) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
        .bind(super::now())
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}
