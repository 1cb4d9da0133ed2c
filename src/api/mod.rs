mod admin;
mod auth;
mod courses;
mod grand;
mod lectures;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::error::AppError;
use crate::media;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    let media_dir = ServeDir::new(&state.config.media_dir);

    Router::new()
        .route("/health", get(health))
        .merge(auth::routes())
        .merge(courses::routes())
        .merge(lectures::routes())
        .merge(grand::routes())
        .merge(admin::routes())
        .nest_service("/media", media_dir)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    sqlx::query("select 1").execute(&state.db).await?;
    Ok(StatusCode::OK)
}

/// Best-effort removal of a stored file that no row references.
async fn discard_upload(state: &AppState, url: &str) {
    if let Some(name) = media::file_name_from_url(url) {
        media::discard(state.media.as_ref(), name).await;
    }
}
