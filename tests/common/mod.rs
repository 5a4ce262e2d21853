// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use fitboard::config::Config;
use fitboard::db::{DocumentId, FirestoreDb, MemoryStore};
use fitboard::middleware::auth::create_jwt;
use fitboard::routes::create_router;
use fitboard::services::MemoryMedia;
use fitboard::AppState;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// A router over in-memory backends, with handles to inspect them.
#[allow(dead_code)]
pub struct TestApp {
    pub router: axum::Router,
    pub state: Arc<AppState>,
    pub store: MemoryStore,
    pub media: MemoryMedia,
}

/// Create a test app over the in-memory store and media service.
#[allow(dead_code)]
pub fn create_test_app() -> TestApp {
    let store = MemoryStore::new();
    let media = MemoryMedia::new();
    let state = Arc::new(AppState::new(
        Config::test_default(),
        Arc::new(store.clone()),
        Arc::new(media.clone()),
    ));

    TestApp {
        router: create_router(state.clone()),
        state,
        store,
        media,
    }
}

/// Create a token the test app accepts.
#[allow(dead_code)]
pub fn create_test_jwt(user_id: &DocumentId, email: &str) -> String {
    let config = Config::test_default();
    create_jwt(user_id, email, &config.jwt_signing_key, config.token_ttl)
        .expect("Failed to create JWT")
}

/// Send `request` and return the status and the body parsed as JSON
/// (`Value::Null` for an empty or non-JSON body).
#[allow(dead_code)]
pub async fn send(app: &axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

/// Build a JSON request, with a bearer token when one is given.
#[allow(dead_code)]
pub fn json_request(method: Method, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// Build a bodiless request, with a bearer token when one is given.
#[allow(dead_code)]
pub fn empty_request(method: Method, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

const BOUNDARY: &str = "fitboard-test-boundary";

/// One part of a multipart form.
#[allow(dead_code)]
pub enum Part<'a> {
    Text(&'a str, &'a str),
    File {
        name: &'a str,
        mime_type: &'a str,
        bytes: &'a [u8],
    },
}

/// Build an authenticated multipart request.
#[allow(dead_code)]
pub fn multipart_request(method: Method, uri: &str, token: &str, parts: &[Part]) -> Request<Body> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File {
                name,
                mime_type,
                bytes,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"upload\"\r\n\
                         Content-Type: {}\r\n\r\n",
                        name, mime_type
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method(method)
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::from(body))
        .unwrap()
}

/// Register `email` through the API and return its id and token.
#[allow(dead_code)]
pub async fn signup(app: &axum::Router, email: &str) -> (DocumentId, String) {
    let (status, body) = send(
        app,
        json_request(
            Method::POST,
            "/signup",
            None,
            serde_json::json!({ "email": email, "password": "correct horse" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "signup failed: {body}");

    let user_id = DocumentId::parse(body["userId"].as_str().unwrap()).unwrap();
    (user_id, body["token"].as_str().unwrap().to_string())
}
