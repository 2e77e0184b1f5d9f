//! Acting-user (`last_op_id`) checks shared by every write.

use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use super::{users::Role, ApiError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Clearance {
    AnyUser,
    AdminOnly,
}

/// Resolve the operator and check their role.
///
/// # Errors
/// `404` if the operator does not exist, `403` if they lack the clearance.
pub(crate) async fn require_operator(
    pool: &PgPool,
    operator_id: Uuid,
    clearance: Clearance,
) -> Result<Role, ApiError> {
    let role: Option<String> = sqlx::query_scalar("SELECT role FROM users WHERE id = $1")
        .bind(operator_id)
        .fetch_optional(pool)
        .await?;

    let Some(role) = role else {
        return Err(ApiError::NotFound("Operator not found."));
    };
    let role = Role::parse(&role).unwrap_or(Role::User);

    if clearance == Clearance::AdminOnly && role != Role::Admin {
        debug!(%operator_id, %role, "operator lacks admin role");
        return Err(ApiError::Forbidden(
            "Operator is not allowed to perform this action.",
        ));
    }

    Ok(role)
}
