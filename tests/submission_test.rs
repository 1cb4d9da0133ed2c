mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{FilePart, multipart_request, spawn_app};
use lms_backend::media::file_name_from_url;
use lms_backend::models::Role;

async fn count(db: &sqlx::SqlitePool, sql: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(sql).fetch_one(db).await.unwrap()
}

#[tokio::test]
async fn resubmitting_a_grand_quiz_keeps_one_row() {
    let app = spawn_app().await;
    let teacher = app.user("Gus", Role::Teacher).await;
    let student = app.user("Sia", Role::Student).await;
    let course = app.course(&teacher, "Quizzes").await;
    let quiz = app
        .post(
            &format!("/api/courses/{course}/grand-quiz"),
            Some(&teacher),
            json!({ "title": "Final", "questions": [{ "q": "?" }] }),
        )
        .await
        .body["id"]
        .as_i64()
        .unwrap();
    app.enroll(&student, course).await;

    for answers in [json!(["a"]), json!(["b"])] {
        let res = app
            .post(
                &format!("/api/grand-quizzes/{quiz}/submit"),
                Some(&student),
                json!({ "answers": answers }),
            )
            .await;
        assert_eq!(res.status, StatusCode::OK, "{:?}", res.body);
    }

    assert_eq!(count(&app.db, "SELECT COUNT(*) FROM grand_quiz_submissions").await, 1);
    let stored: String = sqlx::query_scalar("SELECT answers_json FROM grand_quiz_submissions")
        .fetch_one(&app.db)
        .await
        .unwrap();
    assert_eq!(stored, r#"["b"]"#);
}

#[tokio::test]
async fn quiz_answers_are_required() {
    let app = spawn_app().await;
    let teacher = app.user("Gia", Role::Teacher).await;
    let student = app.user("Sol", Role::Student).await;
    let course = app.course(&teacher, "Answers").await;
    let quiz = app
        .post(
            &format!("/api/courses/{course}/grand-quiz"),
            Some(&teacher),
            json!({ "title": "Q", "questions": [1] }),
        )
        .await
        .body["id"]
        .as_i64()
        .unwrap();
    app.enroll(&student, course).await;

    let res = app
        .post(&format!("/api/grand-quizzes/{quiz}/submit"), Some(&student), json!({}))
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn grand_quiz_needs_questions() {
    let app = spawn_app().await;
    let teacher = app.user("Gil", Role::Teacher).await;
    let course = app.course(&teacher, "No questions").await;

    let res = app
        .post(
            &format!("/api/courses/{course}/grand-quiz"),
            Some(&teacher),
            json!({ "title": "Empty", "questions": [] }),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn resubmitting_a_grand_assignment_keeps_one_row() {
    let app = spawn_app().await;
    let teacher = app.user("Hal", Role::Teacher).await;
    let student = app.user("Sue", Role::Student).await;
    let course = app.course(&teacher, "Essays").await;
    let assignment = app
        .post(
            &format!("/api/courses/{course}/grand-assignment"),
            Some(&teacher),
            json!({ "title": "Essay" }),
        )
        .await
        .body["id"]
        .as_i64()
        .unwrap();
    app.enroll(&student, course).await;

    for name in ["draft.pdf", "final.pdf"] {
        let req = multipart_request(
            &format!("/api/grand-assignments/{assignment}/submit"),
            &student,
            &[],
            &[FilePart {
                field: "file",
                file_name: name,
                content_type: "application/pdf",
                bytes: b"%PDF-1.4",
            }],
        );
        let res = app.send(req).await;
        assert_eq!(res.status, StatusCode::OK, "{:?}", res.body);
        assert!(res.body["file_url"].as_str().unwrap().ends_with(name));
    }

    assert_eq!(
        count(&app.db, "SELECT COUNT(*) FROM grand_assignment_submissions").await,
        1
    );
    let stored: String = sqlx::query_scalar("SELECT file_url FROM grand_assignment_submissions")
        .fetch_one(&app.db)
        .await
        .unwrap();
    assert!(stored.ends_with("final.pdf"));
    assert_eq!(app.media.len(), 1);
    assert!(app.media.contains(file_name_from_url(&stored).unwrap()));
}

#[tokio::test]
async fn failed_submission_discards_the_new_file() {
    let app = spawn_app().await;
    let teacher = app.user("Hank", Role::Teacher).await;
    let student = app.user("Sven", Role::Student).await;
    let course = app.course(&teacher, "Fragile").await;
    let assignment = app
        .post(
            &format!("/api/courses/{course}/grand-assignment"),
            Some(&teacher),
            json!({ "title": "Essay" }),
        )
        .await
        .body["id"]
        .as_i64()
        .unwrap();
    app.enroll(&student, course).await;

    sqlx::query(
        "CREATE TRIGGER refuse_submissions BEFORE INSERT ON grand_assignment_submissions \
         BEGIN SELECT RAISE(ABORT, 'refused'); END",
    )
    .execute(&app.db)
    .await
    .unwrap();

    let req = multipart_request(
        &format!("/api/grand-assignments/{assignment}/submit"),
        &student,
        &[],
        &[FilePart {
            field: "file",
            file_name: "essay.pdf",
            content_type: "application/pdf",
            bytes: b"%PDF-1.4",
        }],
    );
    assert_eq!(app.send(req).await.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(app.media.is_empty());
}

#[tokio::test]
async fn lecture_assignment_submission_is_an_upsert() {
    let app = spawn_app().await;
    let teacher = app.user("Ivy", Role::Teacher).await;
    let student = app.user("Stu", Role::Student).await;
    let course = app.course(&teacher, "Homework").await;
    let lecture = app.lecture(course, "Intro", 0).await;
    app.enroll(&student, course).await;

    let first = app
        .post(
            &format!("/api/lectures/{lecture}/assignment"),
            Some(&teacher),
            json!({ "title": "Homework 1" }),
        )
        .await;
    let second = app
        .post(
            &format!("/api/lectures/{lecture}/assignment"),
            Some(&teacher),
            json!({ "title": "Homework 1b", "description": "revised" }),
        )
        .await;
    assert_eq!(first.body["id"], second.body["id"]);
    let assignment = second.body["id"].as_i64().unwrap();

    let fetched = app
        .get(&format!("/api/lectures/{lecture}/assignment"), Some(&student))
        .await;
    assert_eq!(fetched.body["assignment"]["title"], "Homework 1b");

    for _ in 0..2 {
        let req = multipart_request(
            &format!("/api/assignments/{assignment}/submit"),
            &student,
            &[],
            &[FilePart {
                field: "file",
                file_name: "hw.txt",
                content_type: "text/plain",
                bytes: b"answer",
            }],
        );
        assert_eq!(app.send(req).await.status, StatusCode::OK);
    }
    assert_eq!(
        count(&app.db, "SELECT COUNT(*) FROM lecture_assignment_submissions").await,
        1
    );
    assert_eq!(app.media.len(), 1);
}

#[tokio::test]
async fn lecture_quiz_is_one_per_lecture() {
    let app = spawn_app().await;
    let teacher = app.user("Jan", Role::Teacher).await;
    let course = app.course(&teacher, "Quizzy").await;
    let lecture = app.lecture(course, "Intro", 0).await;
    let uri = format!("/api/lectures/{lecture}/quiz");

    let empty = app.get(&uri, Some(&teacher)).await;
    assert!(empty.body["quiz"].is_null());

    let a = app
        .post(&uri, Some(&teacher), json!({ "title": "Q", "content_json": "[1]" }))
        .await;
    let b = app
        .post(&uri, Some(&teacher), json!({ "title": "Q2", "content_json": "[2]" }))
        .await;
    assert_eq!(a.body["id"], b.body["id"]);

    let quiz = app.get(&uri, Some(&teacher)).await;
    assert_eq!(quiz.body["quiz"]["content_json"], "[2]");

    let missing = app.post(&uri, Some(&teacher), json!({ "title": "Q3" })).await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
}
