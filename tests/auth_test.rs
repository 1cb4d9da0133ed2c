mod common;

use axum::http::{Method, StatusCode, header};
use serde_json::json;

use common::{json_request, session_cookie, spawn_app};
use lms_backend::services::AccountService;

#[tokio::test]
async fn register_logs_in_as_student() {
    let app = spawn_app().await;

    let res = app
        .post(
            "/api/register",
            None,
            json!({ "name": "Ada", "email": "Ada@Example.com", "password": "pw-123456" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    let cookie = session_cookie(&res).expect("session cookie");

    let me = app
        .send(
            axum::http::Request::builder()
                .uri("/api/me")
                .header(header::COOKIE, &cookie)
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(me.body["user"]["email"], "ada@example.com");
    assert_eq!(me.body["user"]["role"], "student");
}

#[tokio::test]
async fn duplicate_email_conflicts() {
    let app = spawn_app().await;
    let body = json!({ "name": "Bo", "email": "bo@example.com", "password": "pw" });

    assert_eq!(app.post("/api/register", None, body.clone()).await.status, StatusCode::OK);

    let again = app
        .post(
            "/api/register",
            None,
            json!({ "name": "Bo", "email": "BO@example.com", "password": "pw" }),
        )
        .await;
    assert_eq!(again.status, StatusCode::CONFLICT);
    assert_eq!(again.body["message"], "Email already registered");
}

#[tokio::test]
async fn missing_fields_are_rejected() {
    let app = spawn_app().await;
    let res = app
        .post("/api/register", None, json!({ "email": "x@example.com" }))
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_checks_password() {
    let app = spawn_app().await;
    AccountService::new(app.db.clone())
        .seed_admin(&app.config)
        .await
        .unwrap();

    let bad = app
        .post(
            "/api/login",
            None,
            json!({ "email": app.config.admin_email, "password": "wrong" }),
        )
        .await;
    assert_eq!(bad.status, StatusCode::UNAUTHORIZED);
    assert_eq!(bad.body["message"], "Invalid credentials");
    assert!(session_cookie(&bad).is_none());

    let unknown = app
        .post(
            "/api/login",
            None,
            json!({ "email": "nobody@example.com", "password": "wrong" }),
        )
        .await;
    assert_eq!(unknown.status, StatusCode::UNAUTHORIZED);

    let ok = app
        .post(
            "/api/login",
            None,
            json!({ "email": "ADMIN@example.com", "password": app.config.admin_password }),
        )
        .await;
    assert_eq!(ok.status, StatusCode::OK);
    assert!(session_cookie(&ok).is_some());
}

#[tokio::test]
async fn seeding_the_admin_is_idempotent() {
    let app = spawn_app().await;
    let accounts = AccountService::new(app.db.clone());
    assert!(accounts.seed_admin(&app.config).await.unwrap());
    assert!(!accounts.seed_admin(&app.config).await.unwrap());
}

#[tokio::test]
async fn me_without_session_is_null() {
    let app = spawn_app().await;
    let res = app.get("/api/me", None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert!(res.body["user"].is_null());
}

#[tokio::test]
async fn logout_ends_the_session() {
    let app = spawn_app().await;
    let student = app.user("Cy", lms_backend::models::Role::Student).await;

    assert_eq!(app.get("/api/my-courses", Some(&student)).await.status, StatusCode::OK);

    let res = app
        .send(json_request(Method::POST, "/api/logout", Some(&student), None))
        .await;
    assert_eq!(res.status, StatusCode::OK);

    let after = app.get("/api/my-courses", Some(&student)).await;
    assert_eq!(after.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn forged_cookie_is_unauthorized() {
    let app = spawn_app().await;
    let res = app
        .send(
            axum::http::Request::builder()
                .uri("/api/my-courses")
                .header(header::COOKIE, "sid=not-a-session")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.body["message"], "Unauthorized");
}
