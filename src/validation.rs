// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Required-field checks for JSON request bodies.
//!
//! A field counts as present when its key exists with a non-null value.
//! Value truthiness is not checked: `""`, `0` and `false` are all present.

use crate::error::AppError;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Returns whether every name in `required` is present in `input`, plus the
/// missing names in `required` order.
pub fn check_missing_fields<'a>(
    required: &[&'a str],
    input: &Map<String, Value>,
) -> (bool, Vec<&'a str>) {
    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|key| matches!(input.get(*key), None | Some(Value::Null)))
        .collect();

    (missing.is_empty(), missing)
}

/// Check `required` fields on a JSON body, then deserialize it into `T`.
///
/// Missing fields become [`AppError::Validation`]; present fields of the wrong
/// type become [`AppError::BadRequest`].
pub fn require_fields<T: DeserializeOwned>(
    required: &[&str],
    body: Value,
) -> Result<T, AppError> {
    let Value::Object(input) = body else {
        return Err(AppError::BadRequest(
            "Request body must be a JSON object".to_string(),
        ));
    };

    let (ok, missing) = check_missing_fields(required, &input);
    if !ok {
        return Err(AppError::missing_fields(&missing));
    }

    serde_json::from_value(Value::Object(input)).map_err(|e| AppError::BadRequest(e.to_string()))
}
