mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::spawn_app;
use lms_backend::models::Role;

#[tokio::test]
async fn admin_creates_and_deletes_teachers() {
    let app = spawn_app().await;
    let admin = app.user("Ada", Role::Admin).await;

    let created = app
        .post(
            "/api/teachers",
            Some(&admin),
            json!({
                "name": "Grace",
                "email": "Grace@Example.com",
                "password": "hopper-1906",
                "specialization": "compilers"
            }),
        )
        .await;
    assert_eq!(created.status, StatusCode::OK, "{:?}", created.body);
    let teacher_id = created.body["id"].as_i64().unwrap();

    let duplicate = app
        .post(
            "/api/teachers",
            Some(&admin),
            json!({ "name": "Grace", "email": "grace@example.com", "password": "x" }),
        )
        .await;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);

    let list = app.get("/api/teachers", Some(&admin)).await;
    let teachers = list.body["teachers"].as_array().unwrap();
    assert_eq!(teachers.len(), 1);
    assert_eq!(teachers[0]["email"], "grace@example.com");

    let uri = format!("/api/teachers/{teacher_id}");
    assert_eq!(app.delete(&uri, Some(&admin)).await.status, StatusCode::OK);
    assert_eq!(app.delete(&uri, Some(&admin)).await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn staff_creation_needs_every_field() {
    let app = spawn_app().await;
    let admin = app.user("Alan", Role::Admin).await;

    let res = app
        .post("/api/teachers", Some(&admin), json!({ "name": "NoMail", "password": "pw" }))
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["message"], "Name, email, and password are required");
}

#[tokio::test]
async fn deleting_a_student_through_the_teacher_route_is_not_found() {
    let app = spawn_app().await;
    let admin = app.user("Ari", Role::Admin).await;
    let student = app.user("Sid", Role::Student).await;

    let res = app
        .delete(&format!("/api/teachers/{}", student.id), Some(&admin))
        .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn teacher_list_counts_courses_and_students() {
    let app = spawn_app().await;
    let admin = app.user("Abe", Role::Admin).await;
    let teacher = app.user("Tia", Role::Teacher).await;
    let s1 = app.user("Sal", Role::Student).await;
    let s2 = app.user("Sky", Role::Student).await;

    let c1 = app.course(&teacher, "One").await;
    let c2 = app.course(&teacher, "Two").await;
    app.enroll(&s1, c1).await;
    app.enroll(&s1, c2).await;
    app.enroll(&s2, c2).await;

    let list = app.get("/api/teachers", Some(&admin)).await;
    let row = &list.body["teachers"][0];
    assert_eq!(row["course_count"], 2);
    assert_eq!(row["student_count"], 2);
}

#[tokio::test]
async fn deleting_a_teacher_removes_their_courses() {
    let app = spawn_app().await;
    let admin = app.user("Amy", Role::Admin).await;
    let teacher = app.user("Ted", Role::Teacher).await;
    let course = app.course(&teacher, "Doomed").await;
    app.lecture(course, "Only", 0).await;

    let res = app
        .delete(&format!("/api/teachers/{}", teacher.id), Some(&admin))
        .await;
    assert_eq!(res.status, StatusCode::OK);

    let stats = app.get("/api/admin/stats", Some(&admin)).await;
    assert_eq!(stats.body["courses"], 0);
    assert_eq!(stats.body["lectures"], 0);
}

#[tokio::test]
async fn admin_dashboard_numbers() {
    let app = spawn_app().await;
    let admin = app.user("Ana", Role::Admin).await;
    let teacher = app.user("Tod", Role::Teacher).await;
    app.user("Stan", Role::Student).await;
    app.user("Sara", Role::Student).await;
    let course = app.course(&teacher, "Stats").await;
    app.lecture(course, "A", 0).await;
    app.lecture(course, "B", 1).await;

    let stats = app.get("/api/admin/stats", Some(&admin)).await;
    assert_eq!(stats.status, StatusCode::OK);
    assert_eq!(stats.body["students"], 2);
    assert_eq!(stats.body["teachers"], 1);
    assert_eq!(stats.body["courses"], 1);
    assert_eq!(stats.body["lectures"], 2);

    let recent = app.get("/api/admin/recent-users", Some(&admin)).await;
    let users = recent.body["users"].as_array().unwrap();
    assert_eq!(users.len(), 3);
    assert!(users.iter().all(|u| u["role"] != "admin"));
}

#[tokio::test]
async fn teacher_stats_cover_only_their_courses() {
    let app = spawn_app().await;
    let teacher = app.user("Tam", Role::Teacher).await;
    let other = app.user("Tal", Role::Teacher).await;
    let student = app.user("Sue", Role::Student).await;

    let mine = app.course(&teacher, "Mine").await;
    let theirs = app.course(&other, "Theirs").await;
    app.lecture(mine, "A", 0).await;
    app.lecture(theirs, "B", 0).await;
    app.enroll(&student, mine).await;
    app.enroll(&student, theirs).await;

    let stats = app.get("/api/teacher/stats", Some(&teacher)).await;
    assert_eq!(stats.status, StatusCode::OK);
    assert_eq!(stats.body["courses"], 1);
    assert_eq!(stats.body["lectures"], 1);
    assert_eq!(stats.body["students"], 1);
}

#[tokio::test]
async fn non_admins_are_kept_out() {
    let app = spawn_app().await;
    let teacher = app.user("Tess", Role::Teacher).await;
    let student = app.user("Stu", Role::Student).await;

    for user in [&teacher, &student] {
        assert_eq!(app.get("/api/teachers", Some(user)).await.status, StatusCode::FORBIDDEN);
        assert_eq!(app.get("/api/admin/stats", Some(user)).await.status, StatusCode::FORBIDDEN);
        assert_eq!(
            app.get("/api/admin/recent-users", Some(user)).await.status,
            StatusCode::FORBIDDEN
        );
    }
    assert_eq!(app.get("/api/teacher/stats", Some(&student)).await.status, StatusCode::FORBIDDEN);
    assert_eq!(app.get("/api/admin/stats", None).await.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admins_can_create_admins() {
    let app = spawn_app().await;
    let admin = app.user("Ava", Role::Admin).await;

    let res = app
        .post(
            "/api/admins",
            Some(&admin),
            json!({ "name": "Second", "email": "second@example.com", "password": "pw-2" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);

    let role: String = sqlx::query_scalar("SELECT role FROM users WHERE email = 'second@example.com'")
        .fetch_one(&app.db)
        .await
        .unwrap();
    assert_eq!(role, "admin");

    let login = app
        .post(
            "/api/login",
            None,
            json!({ "email": "second@example.com", "password": "pw-2" }),
        )
        .await;
    assert_eq!(login.status, StatusCode::OK);
}
