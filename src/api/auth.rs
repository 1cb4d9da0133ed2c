use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_extra::extract::cookie::CookieJar;

use crate::auth::session;
use crate::error::AppError;
use crate::models::{Ack, CurrentUser, LoginRequest, MeResponse, RegisterRequest};
use crate::services::AccountService;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/register", post(register))
        .route("/api/login", post(login))
        .route("/api/logout", post(logout))
        .route("/api/me", get(me))
}

async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<RegisterRequest>,
) -> Result<(CookieJar, Json<Ack>), AppError> {
    let user = AccountService::new(state.db.clone()).register(req).await?;
    let jar = session::start(&state, user.id, jar).await?;
    Ok((jar, Json(Ack::ok())))
}

async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<Ack>), AppError> {
    let user = AccountService::new(state.db.clone()).login(req).await?;
    let jar = session::start(&state, user.id, jar).await?;
    Ok((jar, Json(Ack::ok())))
}

async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<Ack>), AppError> {
    let jar = session::end(&state, jar).await?;
    Ok((jar, Json(Ack::ok())))
}

async fn me(user: Option<CurrentUser>) -> Json<MeResponse> {
    Json(MeResponse { user })
}
