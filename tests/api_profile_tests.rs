// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Profile picture and current-user tests.

use axum::http::{Method, StatusCode};
use serde_json::json;

mod common;
use common::{create_test_app, empty_request, multipart_request, send, signup, Part};

const PNG: &[u8] = &[0x89, b'P', b'N', b'G'];

#[tokio::test]
async fn test_update_profile() {
    let app = create_test_app();
    let (user_id, token) = signup(&app.router, "a@example.com").await;

    let (status, body) = send(
        &app.router,
        multipart_request(
            Method::PUT,
            "/profile",
            &token,
            &[
                Part::File {
                    name: "image",
                    mime_type: "image/png",
                    bytes: PNG,
                },
                Part::Text("displayName", "  Ann  "),
            ],
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["userId"], user_id.as_str());
    assert_eq!(body["displayName"], "Ann");
    let public_id = body["publicId"].as_str().unwrap().to_string();
    assert!(app.media.contains(&public_id));

    let (_, me) = send(&app.router, empty_request(Method::GET, "/users/me", Some(&token))).await;
    assert_eq!(me["displayName"], "Ann");
    assert_eq!(
        me["profileImage"],
        json!({ "publicId": public_id, "url": body["url"] })
    );
}

#[tokio::test]
async fn test_replacing_profile_image_destroys_previous() {
    let app = create_test_app();
    let (_, token) = signup(&app.router, "a@example.com").await;
    let form = [Part::File {
        name: "image",
        mime_type: "image/png",
        bytes: PNG,
    }];

    let (_, first) = send(
        &app.router,
        multipart_request(Method::PUT, "/profile", &token, &form),
    )
    .await;
    let (status, second) = send(
        &app.router,
        multipart_request(Method::PUT, "/profile", &token, &form),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(!app.media.contains(first["publicId"].as_str().unwrap()));
    assert!(app.media.contains(second["publicId"].as_str().unwrap()));
}

#[tokio::test]
async fn test_update_profile_without_image() {
    let app = create_test_app();
    let (_, token) = signup(&app.router, "a@example.com").await;

    let (status, body) = send(
        &app.router,
        multipart_request(
            Method::PUT,
            "/profile",
            &token,
            &[Part::Text("displayName", "Ann")],
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["missingFields"], json!(["image"]));
    assert!(app.media.is_empty());
}

#[tokio::test]
async fn test_update_profile_for_unknown_user_discards_upload() {
    let app = create_test_app();
    let token = common::create_test_jwt(
        &fitboard::db::DocumentId::generate().unwrap(),
        "ghost@example.com",
    );

    let (status, _) = send(
        &app.router,
        multipart_request(
            Method::PUT,
            "/profile",
            &token,
            &[Part::File {
                name: "image",
                mime_type: "image/png",
                bytes: PNG,
            }],
        ),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(app.media.is_empty());
}
