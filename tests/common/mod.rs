#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use chrono::{Duration, Utc};
use serde_json::Value;
use sqlx::SqlitePool;
use tower::ServiceExt;

use lms_backend::auth::session::{COOKIE_NAME, token_digest};
use lms_backend::config::Config;
use lms_backend::db::{self, enrollments, lectures, sessions, users};
use lms_backend::media::MemoryMediaStore;
use lms_backend::models::{NewLecture, Role};
use lms_backend::router;
use lms_backend::state::AppState;

pub struct TestApp {
    pub app: Router,
    pub db: SqlitePool,
    pub media: Arc<MemoryMediaStore>,
    pub config: Config,
}

pub struct TestUser {
    pub id: i64,
    pub cookie: String,
}

pub struct Response {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Value,
}

pub async fn spawn_app() -> TestApp {
    let db = db::connect_in_memory().await.expect("in-memory database");
    db::migrate(&db).await.expect("migrations");

    let media = Arc::new(MemoryMediaStore::new());
    let config = Config::default();
    let state = AppState {
        db: db.clone(),
        media: media.clone(),
        config: Arc::new(config.clone()),
    };

    TestApp {
        app: router(state),
        db,
        media,
        config,
    }
}

impl TestApp {
    /// Creates a user and a live session without going through password hashing.
    pub async fn user(&self, name: &str, role: Role) -> TestUser {
        let email = format!("{}@example.com", name.to_lowercase());
        let id = users::insert_user(
            &self.db,
            users::NewUser {
                name,
                email: &email,
                password_hash: "unused",
                role,
                bio: None,
                specialization: None,
            },
        )
        .await
        .expect("insert user");

        let token = format!("token-{name}-{id}");
        let digest = token_digest(&self.config.session_secret, &token);
        let expires_at = db::timestamp(Utc::now() + Duration::hours(1));
        sessions::insert_session(&self.db, &digest, id, &expires_at)
            .await
            .expect("insert session");

        TestUser {
            id,
            cookie: format!("{COOKIE_NAME}={token}"),
        }
    }

    pub async fn enroll(&self, student: &TestUser, course_id: i64) {
        enrollments::enroll(&self.db, student.id, course_id)
            .await
            .expect("enroll");
    }

    pub async fn lecture(&self, course_id: i64, title: &str, order_index: i64) -> i64 {
        lectures::insert_lecture(
            &self.db,
            &NewLecture {
                course_id,
                title: title.to_string(),
                description: String::new(),
                video_url: format!("/media/{}.mp4", title.to_lowercase()),
                order_index,
                lecture_date: None,
            },
        )
        .await
        .expect("insert lecture")
    }

    pub async fn send(&self, req: Request<Body>) -> Response {
        let response = self.app.clone().oneshot(req).await.expect("router response");
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("response body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        Response {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, user: Option<&TestUser>) -> Response {
        self.send(json_request(Method::GET, uri, user, None)).await
    }

    pub async fn post(&self, uri: &str, user: Option<&TestUser>, body: Value) -> Response {
        self.send(json_request(Method::POST, uri, user, Some(body))).await
    }

    pub async fn put(&self, uri: &str, user: Option<&TestUser>, body: Value) -> Response {
        self.send(json_request(Method::PUT, uri, user, Some(body))).await
    }

    pub async fn delete(&self, uri: &str, user: Option<&TestUser>) -> Response {
        self.send(json_request(Method::DELETE, uri, user, None)).await
    }

    /// Creates a course through the API and returns its id.
    pub async fn course(&self, owner: &TestUser, title: &str) -> i64 {
        let res = self
            .post("/api/courses", Some(owner), serde_json::json!({ "title": title }))
            .await;
        assert_eq!(res.status, StatusCode::OK, "{:?}", res.body);
        res.body["id"].as_i64().expect("course id")
    }
}

pub fn json_request(method: Method, uri: &str, user: Option<&TestUser>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header(header::COOKIE, &user.cookie);
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    }
}

pub struct FilePart<'a> {
    pub field: &'a str,
    pub file_name: &'a str,
    pub content_type: &'a str,
    pub bytes: &'a [u8],
}

const BOUNDARY: &str = "lms-test-boundary";

pub fn multipart_request(
    uri: &str,
    user: &TestUser,
    fields: &[(&str, &str)],
    files: &[FilePart<'_>],
) -> Request<Body> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    for file in files {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                file.field, file.file_name, file.content_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(file.bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::COOKIE, &user.cookie)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .expect("request")
}

pub fn session_cookie(res: &Response) -> Option<String> {
    res.headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with(&format!("{COOKIE_NAME}=")))
        .map(|v| v.split(';').next().unwrap_or_default().to_string())
}
