// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account signup and signin.

use crate::db::DocumentId;
use crate::error::{AppError, Result};
use crate::middleware::auth::create_jwt;
use crate::models::User;
use crate::validation::require_fields;
use crate::AppState;
use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

const CREDENTIAL_FIELDS: [&str; 2] = ["email", "password"];

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/signup", post(signup))
        .route("/signin", post(signin))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    #[validate(length(min = 1, max = 50))]
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SigninRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SignupResponse {
    pub token: String,
    pub user_id: DocumentId,
    pub email: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SigninResponse {
    pub token: String,
    pub message: String,
}

fn issue_token(state: &AppState, user: &User) -> Result<String> {
    Ok(create_jwt(
        &user.id,
        &user.email,
        &state.config.jwt_signing_key,
        state.config.token_ttl,
    )?)
}

/// Register a new account and sign it in.
async fn signup(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<SignupResponse>)> {
    let request: SignupRequest = require_fields(&CREDENTIAL_FIELDS, body)?;
    request
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let user = state
        .users
        .signup(&request.email, request.password, request.display_name)
        .await?;
    let token = issue_token(&state, &user)?;

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            token,
            user_id: user.id,
            email: user.email,
        }),
    ))
}

async fn signin(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Result<Json<SigninResponse>> {
    let request: SigninRequest = require_fields(&CREDENTIAL_FIELDS, body)?;

    let user = state
        .users
        .authenticate(&request.email, request.password)
        .await?;
    let token = issue_token(&state, &user)?;

    tracing::info!(user_id = %user.id, "User signed in");

    Ok(Json(SigninResponse {
        token,
        message: format!("Welcome {}", user.email),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(email: &str, password: &str) -> SignupRequest {
        SignupRequest {
            email: email.to_string(),
            password: password.to_string(),
            display_name: None,
        }
    }

    #[test]
    fn test_signup_request_validation() {
        assert!(request("a@example.com", "long enough").validate().is_ok());
        assert!(request("not-an-email", "long enough").validate().is_err());
        assert!(request("a@example.com", "short").validate().is_err());

        let mut blank_name = request("a@example.com", "long enough");
        blank_name.display_name = Some(String::new());
        assert!(blank_name.validate().is_err());
    }
}
