use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgRow, FromRow, Row};
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

/// Closed role whitelist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::User => "user",
        }
    }

    /// Case-insensitive, surrounding whitespace ignored.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "admin" => Some(Self::Admin),
            "user" => Some(Self::User),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user as returned by the API. The password hash never leaves storage.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub last_op_id: Option<Uuid>,
    pub created_timestamp: DateTime<Utc>,
    pub lastupdate_timestamp: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for User {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let raw_role: String = row.try_get("role")?;
        let role = Role::parse(&raw_role).ok_or_else(|| sqlx::Error::ColumnDecode {
            index: "role".to_string(),
            source: format!("unknown role: {raw_role}").into(),
        })?;

        Ok(Self {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
            name: row.try_get("name")?,
            role,
            last_op_id: row.try_get("last_op_id")?,
            created_timestamp: row.try_get("created_timestamp")?,
            lastupdate_timestamp: row.try_get("lastupdate_timestamp")?,
        })
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub role: Option<String>,
    pub last_op_id: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub role: Option<String>,
    pub last_op_id: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub old_password: Option<String>,
    pub new_password1: Option<String>,
    pub new_password2: Option<String>,
    #[serde(rename = "last_op_id")]
    pub last_op_id: Option<String>,
}

/// Validated input for an insert.
#[derive(Debug)]
pub(crate) struct NewUser {
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub role: Role,
    pub last_op_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn role_parse_is_lenient_on_case_and_space() {
        assert_eq!(Role::parse(" Admin "), Some(Role::Admin));
        assert_eq!(Role::parse("USER"), Some(Role::User));
        assert_eq!(Role::parse("root"), None);
        assert_eq!(Role::parse(""), None);
    }

    #[test]
    fn role_serializes_lowercase() -> serde_json::Result<()> {
        assert_eq!(serde_json::to_value(Role::Admin)?, json!("admin"));
        Ok(())
    }

    #[test]
    fn change_password_request_uses_camel_case() -> serde_json::Result<()> {
        let request: ChangePasswordRequest = serde_json::from_value(json!({
            "oldPassword": "a",
            "newPassword1": "b",
            "newPassword2": "c",
            "last_op_id": "d"
        }))?;
        assert_eq!(request.old_password.as_deref(), Some("a"));
        assert_eq!(request.new_password1.as_deref(), Some("b"));
        assert_eq!(request.new_password2.as_deref(), Some("c"));
        assert_eq!(request.last_op_id.as_deref(), Some("d"));
        Ok(())
    }

    #[test]
    fn user_never_serializes_password() -> serde_json::Result<()> {
        let now = Utc::now();
        let user = User {
            id: Uuid::now_v7(),
            email: "ana@example.com".to_string(),
            name: "ana".to_string(),
            role: Role::User,
            last_op_id: None,
            created_timestamp: now,
            lastupdate_timestamp: now,
        };
        let value = serde_json::to_value(&user)?;
        assert!(value.get("password").is_none());
        assert_eq!(value["role"], json!("user"));
        Ok(())
    }
}
