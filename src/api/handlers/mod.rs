//! HTTP handlers and the helpers they share.
//!
//! Each resource module (`users`, `categories`, `products`) splits into route
//! handlers (`mod.rs`), request and response types (`types.rs`) and SQL
//! (`storage.rs`). Handlers check the API key first, then validate the body,
//! then resolve references, then write.

pub(crate) mod categories;
mod error;
pub(crate) mod health;
mod operator;
pub(crate) mod products;
pub(crate) mod users;

pub use error::ApiError;

use axum::{extract::rejection::JsonRejection, Json};
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;
use utoipa::ToSchema;
use uuid::Uuid;

/// Envelope used by the single-entity `GET` routes.
#[derive(Debug, Serialize, ToSchema)]
pub struct DataResponse<T> {
    pub data: T,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Unwrap a JSON body, turning extractor rejections into `400`.
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload.map(|Json(body)| body).map_err(ApiError::from)
}

pub(crate) fn parse_id(raw: &str, field: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::bad_request(format!("Invalid {field}.")))
}

/// Trim, mapping blank strings to `None`.
pub(crate) fn normalize_optional(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// Fail with one message naming every absent field, in the given order.
pub(crate) fn require_fields(fields: &[(&str, bool)]) -> Result<(), ApiError> {
    let missing: Vec<&str> = fields
        .iter()
        .filter(|(_, present)| !present)
        .map(|(name, _)| *name)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ApiError::bad_request(format!(
            "Missing required fields: {}.",
            missing.join(", ")
        )))
    }
}

pub(crate) fn valid_email(email: &str) -> bool {
    static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
    EMAIL
        .get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").ok())
        .as_ref()
        .is_some_and(|re| re.is_match(email))
}


#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn normalize_optional_trims() {
        assert_eq!(
            normalize_optional(Some("  Tools ".to_string())),
            Some("Tools".to_string())
        );
        assert_eq!(normalize_optional(Some("   ".to_string())), None);
        assert_eq!(normalize_optional(None), None);
    }

    #[test]
    fn require_fields_lists_missing_in_order() {
        assert!(require_fields(&[("name", true), ("last_op_id", true)]).is_ok());

        let result = require_fields(&[("email", false), ("name", true), ("role", false)]);
        assert!(matches!(
            result,
            Err(ApiError::BadRequest(ref message)) if message == "Missing required fields: email, role."
        ));
    }

    #[test]
    fn parse_id_rejects_garbage() {
        assert!(parse_id("0192f7a4-6d0e-7c1a-9f5b-3b2f1c0d9e8a", "id").is_ok());
        let result = parse_id("42", "last_op_id");
        assert!(matches!(
            result,
            Err(ApiError::BadRequest(ref message)) if message == "Invalid last_op_id."
        ));
    }

    #[test]
    fn email_shape() {
        assert!(valid_email("ana@example.com"));
        assert!(valid_email("a.b+tag@shop.example.org"));
        assert!(!valid_email("ana@example"));
        assert!(!valid_email("ana example@x.com"));
        assert!(!valid_email("@example.com"));
        assert!(!valid_email(""));
    }
}
