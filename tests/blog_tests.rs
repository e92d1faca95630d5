mod common;

use axum::http::StatusCode;
use common::{TestApp, authed, get, json_request, spawn_app};
use serde_json::{Value, json};
use shieldline::db::models::Role;

async fn create_post(t: &TestApp, token: &str, body: Value) -> Value {
    let (status, post) = t
        .send(authed(
            json_request("POST", "/api/admin/posts", &body),
            token,
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{post}");
    post
}

#[tokio::test]
async fn drafts_stay_hidden_until_published() {
    let t = spawn_app().await;
    let token = t.staff_token("editor@example.com", Role::Editor).await;

    let draft = create_post(
        &t,
        &token,
        json!({
            "title": "Zero Trust in Practice",
            "slug": "zero-trust-in-practice",
            "content": "Segment everything and verify every request."
        }),
    )
    .await;
    assert_eq!(draft["status"], "draft");
    let id = draft["id"].as_i64().unwrap();

    let (_, list) = t.send(get("/api/public/posts")).await;
    assert_eq!(list["total"], 0);
    let (status, _) = t
        .send(get("/api/public/posts/zero-trust-in-practice"))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = t
        .send(authed(
            json_request(
                "PUT",
                &format!("/api/admin/posts/{id}"),
                &json!({
                    "title": "Zero Trust in Practice",
                    "slug": "zero-trust-in-practice",
                    "content": "Segment everything and verify every request.",
                    "status": "published"
                }),
            ),
            &token,
        ))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, list) = t.send(get("/api/public/posts")).await;
    assert_eq!(list["total"], 1);
    assert_eq!(list["items"][0]["slug"], "zero-trust-in-practice");

    let (status, detail) = t
        .send(get("/api/public/posts/zero-trust-in-practice"))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["view_count"], 1);
    assert_eq!(detail["author_name"], "Staff Member");
    let (_, detail) = t
        .send(get("/api/public/posts/zero-trust-in-practice"))
        .await;
    assert_eq!(detail["view_count"], 2);
}

#[tokio::test]
async fn duplicate_slug_is_a_conflict() {
    let t = spawn_app().await;
    let token = t.staff_token("admin@example.com", Role::Admin).await;
    let body = json!({
        "title": "Incident Response 101",
        "slug": "incident-response",
        "content": "Prepare, detect, contain."
    });
    create_post(&t, &token, body.clone()).await;

    let (status, err) = t
        .send(authed(
            json_request("POST", "/api/admin/posts", &body),
            &token,
        ))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(err["error"]["code"], "CONFLICT");
}

#[tokio::test]
async fn category_filter_and_counts() {
    let t = spawn_app().await;
    let token = t.staff_token("admin@example.com", Role::Admin).await;

    let (status, category) = t
        .send(authed(
            json_request(
                "POST",
                "/api/admin/categories",
                &json!({"name": "Cloud Security", "slug": "cloud-security"}),
            ),
            &token,
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let category_id = category["id"].as_i64().unwrap();

    create_post(
        &t,
        &token,
        json!({
            "title": "Hardening S3",
            "slug": "hardening-s3",
            "content": "Block public access by default.",
            "status": "published",
            "category_id": category_id
        }),
    )
    .await;
    create_post(
        &t,
        &token,
        json!({
            "title": "Phishing Drills",
            "slug": "phishing-drills",
            "content": "Run them quarterly.",
            "status": "published"
        }),
    )
    .await;

    let (_, list) = t
        .send(get("/api/public/posts?category=cloud-security"))
        .await;
    assert_eq!(list["total"], 1);
    assert_eq!(list["items"][0]["slug"], "hardening-s3");
    assert_eq!(list["items"][0]["category"]["name"], "Cloud Security");

    let (_, all) = t.send(get("/api/public/posts?limit=1")).await;
    assert_eq!(all["total"], 2);
    assert_eq!(all["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn comments_need_approval_before_they_show_or_take_likes() {
    let t = spawn_app().await;
    let token = t.staff_token("admin@example.com", Role::Admin).await;
    create_post(
        &t,
        &token,
        json!({
            "title": "Ransomware Readiness",
            "slug": "ransomware-readiness",
            "content": "Offline backups, tested restores.",
            "status": "published"
        }),
    )
    .await;

    let (status, comment) = t
        .send(json_request(
            "POST",
            "/api/public/posts/ransomware-readiness/comments",
            &json!({
                "name": "Reader",
                "email": "reader@example.com",
                "content": "Great checklist, thanks!"
            }),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(comment["status"], "pending");
    assert!(comment.get("author_email").is_none());
    let comment_id = comment["id"].as_i64().unwrap();

    let (_, detail) = t.send(get("/api/public/posts/ransomware-readiness")).await;
    assert!(detail["comments"].as_array().unwrap().is_empty());

    let like_uri = format!("/api/comments/{comment_id}/like");
    let (status, _) = t.send(json_request("POST", &like_uri, &json!({}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, queue) = t
        .send(authed(get("/api/admin/comments?status=pending"), &token))
        .await;
    assert_eq!(queue["total"], 1);
    assert_eq!(queue["items"][0]["author_email"], "reader@example.com");

    let (status, moderated) = t
        .send(authed(
            json_request(
                "PATCH",
                &format!("/api/admin/comments/{comment_id}"),
                &json!({"status": "approved"}),
            ),
            &token,
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(moderated["status"], "approved");

    let (status, liked) = t.send(json_request("POST", &like_uri, &json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(liked["likes"], 1);

    let (_, detail) = t.send(get("/api/public/posts/ransomware-readiness")).await;
    assert_eq!(detail["comments"][0]["content"], "Great checklist, thanks!");
    assert_eq!(detail["comments"][0]["likes"], 1);
}

#[tokio::test]
async fn reply_must_target_the_same_post() {
    let t = spawn_app().await;
    let token = t.staff_token("admin@example.com", Role::Admin).await;
    for slug in ["first-post", "second-post"] {
        create_post(
            &t,
            &token,
            json!({
                "title": slug,
                "slug": slug,
                "content": "Body text.",
                "status": "published"
            }),
        )
        .await;
    }

    let (_, parent) = t
        .send(json_request(
            "POST",
            "/api/public/posts/first-post/comments",
            &json!({"name": "A", "email": "a@example.com", "content": "First!"}),
        ))
        .await;
    let parent_id = parent["id"].as_i64().unwrap();

    let (status, _) = t
        .send(json_request(
            "POST",
            "/api/public/posts/second-post/comments",
            &json!({
                "name": "B",
                "email": "b@example.com",
                "content": "Wrong thread",
                "parent_id": parent_id
            }),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, reply) = t
        .send(json_request(
            "POST",
            "/api/public/posts/first-post/comments",
            &json!({
                "name": "B",
                "email": "b@example.com",
                "content": "Right thread",
                "parent_id": parent_id
            }),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(reply["parent_id"], parent_id);
}

#[tokio::test]
async fn comments_on_unpublished_posts_are_not_found() {
    let t = spawn_app().await;
    let (status, _) = t
        .send(json_request(
            "POST",
            "/api/public/posts/does-not-exist/comments",
            &json!({"name": "A", "email": "a@example.com", "content": "Hello"}),
        ))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
