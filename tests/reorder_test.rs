mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::spawn_app;
use lms_backend::models::Role;

async fn order_of(db: &sqlx::SqlitePool, table: &str, id: i64) -> i64 {
    sqlx::query_scalar::<_, i64>(&format!("SELECT order_index FROM {table} WHERE id = ?"))
        .bind(id)
        .fetch_one(db)
        .await
        .unwrap()
}

#[tokio::test]
async fn reorder_updates_every_listed_item() {
    let app = spawn_app().await;
    let teacher = app.user("Rita", Role::Teacher).await;
    let course = app.course(&teacher, "Ordering").await;
    let l1 = app.lecture(course, "A", 0).await;
    let l2 = app.lecture(course, "B", 1).await;
    let quiz = app
        .post(
            &format!("/api/courses/{course}/grand-quiz"),
            Some(&teacher),
            json!({ "title": "Quiz", "questions": [1], "order_index": 2 }),
        )
        .await
        .body["id"]
        .as_i64()
        .unwrap();

    let res = app
        .put(
            &format!("/api/courses/{course}/reorder-content"),
            Some(&teacher),
            json!({ "items": [
                { "type": "grand_quiz", "id": quiz, "order": 0 },
                { "type": "lecture", "id": l1, "order": 1 },
                { "type": "lecture", "id": l2, "order": 2 }
            ] }),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK, "{:?}", res.body);

    assert_eq!(order_of(&app.db, "grand_quizzes", quiz).await, 0);
    assert_eq!(order_of(&app.db, "lectures", l1).await, 1);
    assert_eq!(order_of(&app.db, "lectures", l2).await, 2);

    let outline = app.get(&format!("/api/courses/{course}"), Some(&teacher)).await;
    assert_eq!(outline.body["allContent"][0]["type"], "grand_quiz");
}

#[tokio::test]
async fn foreign_item_rolls_back_the_whole_reorder() {
    let app = spawn_app().await;
    let teacher = app.user("Rui", Role::Teacher).await;
    let course = app.course(&teacher, "Mine").await;
    let other_course = app.course(&teacher, "Other").await;
    let l1 = app.lecture(course, "A", 0).await;
    let foreign = app.lecture(other_course, "X", 0).await;

    let res = app
        .put(
            &format!("/api/courses/{course}/reorder-content"),
            Some(&teacher),
            json!({ "items": [
                { "type": "lecture", "id": l1, "order": 5 },
                { "type": "lecture", "id": foreign, "order": 6 }
            ] }),
        )
        .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    assert_eq!(order_of(&app.db, "lectures", l1).await, 0);
    assert_eq!(order_of(&app.db, "lectures", foreign).await, 0);
}

#[tokio::test]
async fn only_the_owning_teacher_may_reorder() {
    let app = spawn_app().await;
    let owner = app.user("Olga", Role::Teacher).await;
    let other = app.user("Omar", Role::Teacher).await;
    let admin = app.user("Ann", Role::Admin).await;
    let course = app.course(&owner, "Locked order").await;
    let l1 = app.lecture(course, "A", 0).await;
    let body = json!({ "items": [{ "type": "lecture", "id": l1, "order": 3 }] });
    let uri = format!("/api/courses/{course}/reorder-content");

    assert_eq!(app.put(&uri, Some(&other), body.clone()).await.status, StatusCode::FORBIDDEN);
    assert_eq!(app.put(&uri, Some(&admin), body.clone()).await.status, StatusCode::FORBIDDEN);
    assert_eq!(order_of(&app.db, "lectures", l1).await, 0);

    assert_eq!(app.put(&uri, Some(&owner), body).await.status, StatusCode::OK);
    assert_eq!(order_of(&app.db, "lectures", l1).await, 3);
}

#[tokio::test]
async fn empty_reorder_is_a_bad_request() {
    let app = spawn_app().await;
    let teacher = app.user("Eve", Role::Teacher).await;
    let course = app.course(&teacher, "Empty").await;

    let res = app
        .put(
            &format!("/api/courses/{course}/reorder-content"),
            Some(&teacher),
            json!({ "items": [] }),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}
