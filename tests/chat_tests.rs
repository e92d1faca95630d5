mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{TestApp, authed, get, json_request, spawn_app};
use serde_json::{Value, json};
use shieldline::db::models::{LeadSource, Role};

async fn start(t: &TestApp, body: Value) -> (i64, String, Value) {
    let (status, started) = t
        .send(json_request("POST", "/api/chat/conversations", &body))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{started}");
    let id = started["conversation_id"].as_i64().unwrap();
    let token = started["visitor_token"].as_str().unwrap().to_string();
    (id, token, started)
}

fn with_chat_token(mut req: Request<Body>, token: &str) -> Request<Body> {
    req.headers_mut()
        .insert("x-chat-token", token.parse().unwrap());
    req
}

#[tokio::test]
async fn anonymous_chat_opens_with_greeting() {
    let t = spawn_app().await;
    let (id, token, started) = start(&t, json!({})).await;

    let messages = started["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["sender"], "system");
    assert!(t.state.leads().all().await.unwrap().is_empty());

    let uri = format!("/api/chat/conversations/{id}/messages");
    let (status, posted) = t
        .send(with_chat_token(
            json_request("POST", &uri, &json!({"body": "Is my VPN config safe?"})),
            &token,
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(posted["sender"], "visitor");

    let (status, history) = t.send(with_chat_token(get(&uri), &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn configured_greeting_is_used() {
    let t = spawn_app().await;
    let admin = t.staff_token("admin@example.com", Role::Admin).await;
    t.send(authed(
        json_request(
            "PUT",
            "/api/admin/settings",
            &json!({"settings": [{"key": "chat_greeting", "value": "Welcome to the SOC desk."}]}),
        ),
        &admin,
    ))
    .await;

    let (_, _, started) = start(&t, json!({"message": "hello"})).await;
    assert_eq!(started["messages"][0]["body"], "Welcome to the SOC desk.");
    assert_eq!(started["messages"][1]["body"], "hello");
}

#[tokio::test]
async fn visitor_token_guards_the_conversation() {
    let t = spawn_app().await;
    let (id, _token, _) = start(&t, json!({})).await;
    let uri = format!("/api/chat/conversations/{id}/messages");

    let (status, _) = t.send(get(&uri)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = t.send(with_chat_token(get(&uri), "guessed")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = t
        .send(with_chat_token(
            get("/api/chat/conversations/9999/messages"),
            "guessed",
        ))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn chat_with_email_becomes_a_lead() {
    let t = spawn_app().await;
    start(
        &t,
        json!({"name": "Mulder", "email": "Mulder@FBI.example", "message": "We were breached."}),
    )
    .await;

    let leads = t.state.leads().all().await.unwrap();
    assert_eq!(leads.len(), 1);
    assert_eq!(leads[0].source, LeadSource::Chat);
    assert_eq!(leads[0].email, "mulder@fbi.example");
    assert_eq!(t.mails.sent().len(), 1);
}

#[tokio::test]
async fn agent_reply_and_close() {
    let t = spawn_app().await;
    let agent = t.staff_token("agent@example.com", Role::Editor).await;
    let (id, token, _) = start(&t, json!({"message": "Need help"})).await;

    let (status, reply) = t
        .send(authed(
            json_request(
                "POST",
                &format!("/api/admin/chat/{id}/reply"),
                &json!({"body": "On it."}),
            ),
            &agent,
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(reply["sender"], "agent");

    let (_, open) = t
        .send(authed(get("/api/admin/chat?status=open"), &agent))
        .await;
    assert_eq!(open["total"], 1);
    assert!(open["items"][0].get("visitor_token").is_none());

    let (status, closed) = t
        .send(authed(
            json_request("POST", &format!("/api/admin/chat/{id}/close"), &json!({})),
            &agent,
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(closed["status"], "closed");

    let uri = format!("/api/chat/conversations/{id}/messages");
    let (status, _) = t
        .send(with_chat_token(
            json_request("POST", &uri, &json!({"body": "Hello?"})),
            &token,
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, history) = t.send(with_chat_token(get(&uri), &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history.as_array().unwrap().len(), 3);

    let (_, view) = t
        .send(authed(get(&format!("/api/admin/chat/{id}")), &agent))
        .await;
    assert_eq!(view["status"], "closed");
    assert_eq!(view["messages"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn blank_message_is_rejected() {
    let t = spawn_app().await;
    let (id, token, _) = start(&t, json!({"message": "   "})).await;
    let uri = format!("/api/chat/conversations/{id}/messages");

    let (status, body) = t
        .send(with_chat_token(
            json_request("POST", &uri, &json!({"body": " \n\t "})),
            &token,
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (_, history) = t.send(with_chat_token(get(&uri), &token)).await;
    assert_eq!(history.as_array().unwrap().len(), 1);
}
