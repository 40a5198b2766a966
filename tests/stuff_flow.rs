mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use common::{hammer, TestApp};
use serde_json::json;
use tower::ServiceExt;

#[tokio::test]
async fn register_create_list_delete() {
    let app = TestApp::new();
    let (_, token) = app.register("alice", "password123").await;

    let (status, body) = app.send("POST", "/api/stuff", Some(&token), Some(hammer())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["item"]["itemName"], "Hammer");
    assert_eq!(body["item"]["quantity"], 2);
    assert_eq!(body["item"]["itemValue"], 9.99);
    let id = body["item"]["itemId"].as_i64().unwrap();

    let (status, body) = app.send("GET", "/api/stuff", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["itemName"], "Hammer");

    let (status, body) = app
        .send("GET", &format!("/api/stuff/{}", id), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["item"]["location"], "garage");

    let (status, _) = app
        .send("DELETE", &format!("/api/stuff/{}", id), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = app.send("GET", "/api/stuff", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["errorMessage"], "Data not found");
    assert_eq!(app.item_count().await, 0);
}

#[tokio::test]
async fn item_value_must_be_whole_cents() {
    let app = TestApp::new();
    let (_, token) = app.register("alice", "password123").await;

    let (status, body) = app
        .send(
            "POST",
            "/api/stuff",
            Some(&token),
            Some(json!({"itemName": "Widget", "itemValue": 10.005})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(app.item_count().await, 0);

    let (status, body) = app
        .send(
            "POST",
            "/api/stuff",
            Some(&token),
            Some(json!({"itemName": "Widget", "itemValue": 10.00})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["item"]["itemValue"], 10.0);
}

#[tokio::test]
async fn item_names_are_unique_per_owner() {
    let app = TestApp::new();
    let (_, alice) = app.register("alice", "password123").await;
    let (_, bob) = app.register("bob_the_builder", "password123").await;

    app.create_item(&alice, hammer()).await;
    let (status, body) = app.send("POST", "/api/stuff", Some(&alice), Some(hammer())).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["errorMessage"], "Item Name Hammer already exists");

    app.create_item(&bob, hammer()).await;
    assert_eq!(app.item_count().await, 2);
}

#[tokio::test]
async fn deleting_missing_item_changes_nothing() {
    let app = TestApp::new();
    let (_, token) = app.register("alice", "password123").await;
    app.create_item(&token, hammer()).await;

    let (status, body) = app.send("DELETE", "/api/stuff/999", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["errorMessage"], "Cannot find item id 999 to delete");
    assert_eq!(app.item_count().await, 1);
}

#[tokio::test]
async fn other_users_items_are_invisible() {
    let app = TestApp::new();
    let (_, alice) = app.register("alice", "password123").await;
    let (_, mallory) = app.register("mallory", "password123").await;
    let id = app.create_item(&alice, hammer()).await;
    let path = format!("/api/stuff/{}", id);

    let (status, _) = app.send("GET", &path, Some(&mallory), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app
        .send("PUT", &path, Some(&mallory), Some(json!({"itemName": "Mine now"})))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.send("DELETE", &path, Some(&mallory), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app.send("GET", &path, Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["item"]["itemName"], "Hammer");
    assert_eq!(app.item_count().await, 1);
}

#[tokio::test]
async fn username_query_must_match_session() {
    let app = TestApp::new();
    let (_, alice) = app.register("alice", "password123").await;
    app.create_item(&alice, hammer()).await;

    let (status, body) = app
        .send("GET", "/api/stuff?username=bob", Some(&alice), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], false);

    let (status, body) = app
        .send("GET", "/api/stuff?username=alice", Some(&alice), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn missing_or_garbage_token_is_unauthorized() {
    let app = TestApp::new();
    let (status, body) = app.send("GET", "/api/stuff", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["errorMessage"], "Missing bearer token");

    let (status, body) = app.send("GET", "/api/stuff", Some("not-a-uuid"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    let (status, _) = app
        .send(
            "GET",
            "/api/stuff",
            Some("00000000-0000-4000-8000-000000000000"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn put_replaces_every_field() {
    let app = TestApp::new();
    let (_, token) = app.register("alice", "password123").await;
    let id = app.create_item(&token, hammer()).await;
    let path = format!("/api/stuff/{}", id);

    let (status, body) = app
        .send("PUT", &path, Some(&token), Some(json!({"itemName": "Mallet"})))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["item"]["itemId"], id);
    assert_eq!(body["item"]["itemName"], "Mallet");
    assert!(body["item"]["quantity"].is_null());
    assert!(body["item"]["itemType"].is_null());
    assert!(body["item"]["itemValue"].is_null());
    assert!(body["item"]["location"].is_null());

    let (_, body) = app.send("GET", &path, Some(&token), None).await;
    assert_eq!(body["item"]["itemName"], "Mallet");
    assert!(body["item"]["location"].is_null());
}

#[tokio::test]
async fn renaming_onto_sibling_conflicts() {
    let app = TestApp::new();
    let (_, token) = app.register("alice", "password123").await;
    app.create_item(&token, hammer()).await;
    let saw = app.create_item(&token, json!({"itemName": "Saw"})).await;

    let (status, _) = app
        .send(
            "PUT",
            &format!("/api/stuff/{}", saw),
            Some(&token),
            Some(json!({"itemName": "Hammer"})),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Keeping its own name is fine.
    let (status, _) = app
        .send(
            "PUT",
            &format!("/api/stuff/{}", saw),
            Some(&token),
            Some(json!({"itemName": "Saw", "quantity": 1})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn updating_missing_item_is_not_found() {
    let app = TestApp::new();
    let (_, token) = app.register("alice", "password123").await;
    let (status, body) = app
        .send("PUT", "/api/stuff/42", Some(&token), Some(hammer()))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["errorMessage"], "Data not found");
    assert_eq!(app.item_count().await, 0);
}

#[tokio::test]
async fn bad_item_payloads_are_rejected() {
    let app = TestApp::new();
    let (_, token) = app.register("alice", "password123").await;

    let (status, _) = app.send("GET", "/api/stuff/abc", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = app.send("DELETE", "/api/stuff/0", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    for body in [
        json!({"itemName": "Nails", "quantity": -1}),
        json!({"itemName": ""}),
        json!({"quantity": 3}),
        json!({"itemName": "Nails", "quantity": 1.5}),
        json!({"itemName": 7}),
    ] {
        let (status, resp) = app.send("POST", "/api/stuff", Some(&token), Some(body.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "accepted {}", body);
        assert_eq!(resp["success"], false);
    }
    assert_eq!(app.item_count().await, 0);
}

#[tokio::test]
async fn nul_characters_are_rejected_before_storage() {
    let app = TestApp::new();
    let (_, token) = app.register("alice", "password123").await;

    for body in [
        json!({"itemName": "a\u{0000}b"}),
        json!({"itemName": "Hammer", "itemType": "to\u{0000}ol"}),
        json!({"itemName": "Hammer", "location": "\u{0000}"}),
    ] {
        let (status, resp) = app.send("POST", "/api/stuff", Some(&token), Some(body.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "accepted {}", body);
        assert!(resp["errorMessage"].as_str().unwrap().contains("NUL"));
    }
    assert_eq!(app.item_count().await, 0);

    let (status, _) = app
        .send(
            "POST",
            "/api/account/register",
            None,
            Some(json!({"username": "ab\u{0000}c", "password": "password123"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unsupported_method_uses_envelope() {
    let app = TestApp::new();
    let (_, token) = app.register("alice", "password123").await;
    let (status, body) = app.send("PATCH", "/api/stuff/1", Some(&token), None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["success"], false);
    assert_eq!(body["errorMessage"], "Method not allowed");
}

#[tokio::test]
async fn oversized_body_is_413_with_envelope() {
    let app = TestApp::new();
    let (_, token) = app.register("alice", "password123").await;
    let big = json!({"itemName": "x".repeat(70 * 1024)});

    let (status, body) = app.send("POST", "/api/stuff", Some(&token), Some(big.clone())).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["success"], false);
    assert_eq!(body["errorMessage"], "Request body is too large");

    // With a declared length the limit layer answers before the handler runs.
    let raw = big.to_string();
    let req = Request::builder()
        .method("POST")
        .uri("/api/stuff")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::CONTENT_LENGTH, raw.len())
        .body(Body::from(raw))
        .unwrap();
    let resp = app.router.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["errorMessage"], "Request body is too large");
    assert_eq!(app.item_count().await, 0);
}
