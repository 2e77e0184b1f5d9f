use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::{debug, error};

/// Every failure a handler can answer with. Client errors carry the plain-text
/// message returned to the caller; server errors are logged and hidden.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Missing API key.")]
    MissingApiKey,
    #[error("Invalid API key.")]
    InvalidApiKey,
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Forbidden(&'static str),
    #[error("{0}")]
    NotFound(&'static str),
    #[error("{0}")]
    Conflict(&'static str),
    #[error("database error: {0}")]
    Database(sqlx::Error),
    #[error("password hashing failed: {0}")]
    PasswordHash(argon2::password_hash::Error),
}

impl ApiError {
    pub(crate) fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingApiKey => StatusCode::UNAUTHORIZED,
            Self::InvalidApiKey | Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Database(_) | Self::PasswordHash(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Failed to handle request: {self}");
            return (status, "Internal server error.").into_response();
        }

        debug!(status = status.as_u16(), "request rejected: {self}");
        (status, self.to_string()).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        let Some(db_err) = err.as_database_error() else {
            return Self::Database(err);
        };

        // Races past the application checks land here.
        if db_err.is_unique_violation() {
            return match db_err.constraint() {
                Some("users_email_key") => Self::Conflict("Email already exists."),
                Some("users_name_key") => Self::Conflict("Name already exists."),
                Some("categories_name_key") => Self::Conflict("Category name already exists."),
                _ => Self::Conflict("Record already exists."),
            };
        }

        if db_err.is_foreign_key_violation() {
            return match db_err.constraint() {
                Some("products_category_id_fkey") => {
                    Self::Conflict("Category is missing or still referenced by products.")
                }
                _ => Self::Conflict("Referenced record is missing or still in use."),
            };
        }

        if db_err.is_check_violation() {
            return Self::bad_request("Value out of range.");
        }

        Self::Database(err)
    }
}

impl From<argon2::password_hash::Error> for ApiError {
    fn from(err: argon2::password_hash::Error) -> Self {
        Self::PasswordHash(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use sqlx::error::{DatabaseError, ErrorKind};
    use std::{borrow::Cow, error::Error as StdError, fmt};

    #[derive(Debug)]
    struct TestDbError {
        kind: ErrorKind,
        constraint: Option<&'static str>,
    }

    impl fmt::Display for TestDbError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "test database error")
        }
    }

    impl StdError for TestDbError {}

    impl DatabaseError for TestDbError {
        fn message(&self) -> &'static str {
            "test database error"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            None
        }

        fn constraint(&self) -> Option<&str> {
            self.constraint
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            match self.kind {
                ErrorKind::UniqueViolation => ErrorKind::UniqueViolation,
                ErrorKind::ForeignKeyViolation => ErrorKind::ForeignKeyViolation,
                ErrorKind::CheckViolation => ErrorKind::CheckViolation,
                _ => ErrorKind::Other,
            }
        }
    }

    fn db_error(kind: ErrorKind, constraint: Option<&'static str>) -> sqlx::Error {
        sqlx::Error::Database(Box::new(TestDbError { kind, constraint }))
    }

    #[test]
    fn unique_violations_map_to_conflict_messages() {
        let err = ApiError::from(db_error(
            ErrorKind::UniqueViolation,
            Some("users_email_key"),
        ));
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(err.to_string(), "Email already exists.");

        let err = ApiError::from(db_error(
            ErrorKind::UniqueViolation,
            Some("categories_name_key"),
        ));
        assert_eq!(err.to_string(), "Category name already exists.");
    }

    #[test]
    fn foreign_key_violation_is_conflict() {
        let err = ApiError::from(db_error(
            ErrorKind::ForeignKeyViolation,
            Some("products_category_id_fkey"),
        ));
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn check_violation_is_bad_request() {
        let err = ApiError::from(db_error(ErrorKind::CheckViolation, None));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn other_errors_are_internal() {
        let err = ApiError::from(sqlx::Error::PoolTimedOut);
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn internal_errors_hide_details() -> anyhow::Result<()> {
        let response = ApiError::from(sqlx::Error::PoolTimedOut).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = to_bytes(response.into_body(), usize::MAX).await?;
        assert_eq!(body.as_ref(), b"Internal server error.");
        Ok(())
    }

    #[tokio::test]
    async fn client_errors_return_plain_text() -> anyhow::Result<()> {
        let response = ApiError::MissingApiKey.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = to_bytes(response.into_body(), usize::MAX).await?;
        assert_eq!(body.as_ref(), b"Missing API key.");
        Ok(())
    }
}
