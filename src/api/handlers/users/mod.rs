//! User administration endpoints.
//!
//! Users double as the operators recorded in `last_op_id` on every row.
//! Creating users and changing passwords require an `admin` operator; renames
//! and role changes accept any existing operator.
//!
//! Flow Overview:
//! 1) Check the route API key.
//! 2) Validate and trim the body.
//! 3) Check uniqueness and the operator.
//! 4) Write through `storage`.

mod password;
mod storage;
mod types;

pub use types::{
    ChangePasswordRequest, CreateUserRequest, Role, UpdateUserRequest, User,
};

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{info, instrument};

use super::{
    json_body, normalize_optional,
    operator::{require_operator, Clearance},
    parse_id, require_fields, valid_email, ApiError, DataResponse, MessageResponse,
};
use crate::api::{ApiKeyRoute, ApiKeys};
use types::NewUser;

#[utoipa::path(
    get,
    path = "/v1/users",
    params(("get-user-header" = String, Header, description = "API key")),
    responses(
        (status = 200, description = "All users, oldest first.", body = [User]),
        (status = 401, description = "Missing API key.", body = String),
        (status = 403, description = "Invalid API key.", body = String),
        (status = 404, description = "No users found.", body = String),
    ),
    tag = "users"
)]
#[instrument(skip_all)]
pub async fn list_users(
    headers: HeaderMap,
    Extension(keys): Extension<Arc<ApiKeys>>,
    Extension(pool): Extension<PgPool>,
) -> Result<impl IntoResponse, ApiError> {
    keys.verify(ApiKeyRoute::UsersList, &headers)?;

    let users = storage::list_users(&pool).await?;
    if users.is_empty() {
        return Err(ApiError::NotFound("No users found."));
    }
    Ok(Json(users))
}

#[utoipa::path(
    get,
    path = "/v1/users/{id}",
    params(
        ("id" = String, Path, description = "User id"),
        ("get-user-header" = String, Header, description = "API key")
    ),
    responses(
        (status = 200, description = "User detail.", body = DataResponse<User>),
        (status = 400, description = "Invalid id.", body = String),
        (status = 401, description = "Missing API key.", body = String),
        (status = 403, description = "Invalid API key.", body = String),
        (status = 404, description = "User not found.", body = String),
    ),
    tag = "users"
)]
#[instrument(skip(headers, keys, pool))]
pub async fn get_user(
    Path(id): Path<String>,
    headers: HeaderMap,
    Extension(keys): Extension<Arc<ApiKeys>>,
    Extension(pool): Extension<PgPool>,
) -> Result<impl IntoResponse, ApiError> {
    keys.verify(ApiKeyRoute::UsersGet, &headers)?;
    let id = parse_id(&id, "id")?;

    let user = storage::fetch_user(&pool, id)
        .await?
        .ok_or(ApiError::NotFound("User not found."))?;
    Ok(Json(DataResponse { data: user }))
}

#[utoipa::path(
    post,
    path = "/v1/users",
    request_body = CreateUserRequest,
    params(("add-user-header" = String, Header, description = "API key")),
    responses(
        (status = 201, description = "User created.", body = User),
        (status = 400, description = "Missing or invalid field.", body = String),
        (status = 401, description = "Missing API key.", body = String),
        (status = 403, description = "Invalid API key or operator is not an admin.", body = String),
        (status = 404, description = "Operator not found.", body = String),
        (status = 409, description = "Email or name already exists.", body = String),
    ),
    tag = "users"
)]
#[instrument(skip_all)]
pub async fn create_user(
    headers: HeaderMap,
    Extension(keys): Extension<Arc<ApiKeys>>,
    Extension(pool): Extension<PgPool>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    keys.verify(ApiKeyRoute::UsersCreate, &headers)?;
    let request = json_body(payload)?;

    let email = normalize_optional(request.email);
    let password = normalize_optional(request.password);
    let name = normalize_optional(request.name);
    let role = normalize_optional(request.role);
    let last_op_id = normalize_optional(request.last_op_id);

    require_fields(&[
        ("email", email.is_some()),
        ("password", password.is_some()),
        ("name", name.is_some()),
        ("role", role.is_some()),
        ("last_op_id", last_op_id.is_some()),
    ])?;
    let (Some(email), Some(password), Some(name), Some(role), Some(last_op_id)) =
        (email, password, name, role, last_op_id)
    else {
        return Err(ApiError::bad_request("Missing required fields."));
    };

    if !valid_email(&email) {
        return Err(ApiError::bad_request("Invalid email."));
    }
    let operator_id = parse_id(&last_op_id, "last_op_id")?;

    if storage::email_taken(&pool, &email).await? {
        return Err(ApiError::Conflict("Email already exists."));
    }
    if storage::name_taken(&pool, &name, None).await? {
        return Err(ApiError::Conflict("Name already exists."));
    }

    require_operator(&pool, operator_id, Clearance::AdminOnly).await?;

    let role = Role::parse(&role).ok_or_else(|| ApiError::bad_request("Invalid role."))?;

    let user = storage::insert_user(
        &pool,
        &NewUser {
            email,
            name,
            password_hash: password::hash_password(&password)?,
            role,
            last_op_id: Some(operator_id),
        },
    )
    .await?;

    info!(user_id = %user.id, %operator_id, "user created");
    Ok((StatusCode::CREATED, Json(user)))
}

#[utoipa::path(
    put,
    path = "/v1/users/{id}",
    request_body = UpdateUserRequest,
    params(
        ("id" = String, Path, description = "User id"),
        ("update-user-header" = String, Header, description = "API key")
    ),
    responses(
        (status = 200, description = "User updated.", body = User),
        (status = 400, description = "Missing or invalid field.", body = String),
        (status = 401, description = "Missing API key.", body = String),
        (status = 403, description = "Invalid API key.", body = String),
        (status = 404, description = "User or operator not found.", body = String),
        (status = 409, description = "Name already exists.", body = String),
    ),
    tag = "users"
)]
#[instrument(skip(headers, keys, pool, payload))]
pub async fn update_user(
    Path(id): Path<String>,
    headers: HeaderMap,
    Extension(keys): Extension<Arc<ApiKeys>>,
    Extension(pool): Extension<PgPool>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    keys.verify(ApiKeyRoute::UsersUpdate, &headers)?;
    let id = parse_id(&id, "id")?;
    let request = json_body(payload)?;

    let last_op_id = normalize_optional(request.last_op_id);
    require_fields(&[("last_op_id", last_op_id.is_some())])?;
    let operator_id = parse_id(last_op_id.as_deref().unwrap_or_default(), "last_op_id")?;

    // A provided-but-blank name is an error, an absent one keeps the stored name.
    let name = match request.name {
        Some(name) => Some(
            normalize_optional(Some(name))
                .ok_or_else(|| ApiError::bad_request("Name must not be empty."))?,
        ),
        None => None,
    };
    let role = match request.role {
        Some(role) => {
            Some(Role::parse(&role).ok_or_else(|| ApiError::bad_request("Invalid role."))?)
        }
        None => None,
    };

    let current = storage::fetch_user(&pool, id)
        .await?
        .ok_or(ApiError::NotFound("User not found."))?;

    if let Some(name) = name.as_deref() {
        if storage::name_taken(&pool, name, Some(id)).await? {
            return Err(ApiError::Conflict("Name already exists."));
        }
    }

    require_operator(&pool, operator_id, Clearance::AnyUser).await?;

    let user = storage::update_user(
        &pool,
        id,
        name.as_deref().unwrap_or(&current.name),
        role.unwrap_or(current.role),
        operator_id,
    )
    .await?
    .ok_or(ApiError::NotFound("User not found."))?;

    info!(user_id = %user.id, %operator_id, "user updated");
    Ok(Json(user))
}

#[utoipa::path(
    put,
    path = "/v1/users/{id}/password",
    request_body = ChangePasswordRequest,
    params(
        ("id" = String, Path, description = "User id"),
        ("edit-password-header" = String, Header, description = "API key")
    ),
    responses(
        (status = 200, description = "Password updated.", body = MessageResponse),
        (status = 400, description = "Missing field or password rule violated.", body = String),
        (status = 401, description = "Missing API key.", body = String),
        (status = 403, description = "Invalid API key or operator is not an admin.", body = String),
        (status = 404, description = "User or operator not found.", body = String),
    ),
    tag = "users"
)]
#[instrument(skip(headers, keys, pool, payload))]
pub async fn change_password(
    Path(id): Path<String>,
    headers: HeaderMap,
    Extension(keys): Extension<Arc<ApiKeys>>,
    Extension(pool): Extension<PgPool>,
    payload: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    keys.verify(ApiKeyRoute::UsersPassword, &headers)?;
    let id = parse_id(&id, "id")?;
    let request = json_body(payload)?;

    let old_password = normalize_optional(request.old_password);
    let new_password1 = normalize_optional(request.new_password1);
    let new_password2 = normalize_optional(request.new_password2);
    let last_op_id = normalize_optional(request.last_op_id);

    require_fields(&[
        ("oldPassword", old_password.is_some()),
        ("newPassword1", new_password1.is_some()),
        ("newPassword2", new_password2.is_some()),
        ("last_op_id", last_op_id.is_some()),
    ])?;
    let (Some(old_password), Some(new_password1), Some(new_password2), Some(last_op_id)) =
        (old_password, new_password1, new_password2, last_op_id)
    else {
        return Err(ApiError::bad_request("Missing required fields."));
    };
    let operator_id = parse_id(&last_op_id, "last_op_id")?;

    let stored_hash = storage::fetch_password_hash(&pool, id)
        .await?
        .ok_or(ApiError::NotFound("User not found."))?;

    if !password::verify_password(&old_password, &stored_hash)? {
        return Err(ApiError::bad_request("Old password is incorrect."));
    }
    password::check_new_password(&old_password, &new_password1, &new_password2)?;

    require_operator(&pool, operator_id, Clearance::AdminOnly).await?;

    let new_hash = password::hash_password(&new_password1)?;
    if !storage::update_password(&pool, id, &new_hash, operator_id).await? {
        return Err(ApiError::NotFound("User not found."));
    }

    info!(user_id = %id, %operator_id, "password updated");
    Ok(Json(MessageResponse::new("Password updated successfully")))
}

#[utoipa::path(
    delete,
    path = "/v1/users/{id}",
    params(
        ("id" = String, Path, description = "User id"),
        ("delete-user-header" = String, Header, description = "API key")
    ),
    responses(
        (status = 200, description = "User deleted.", body = MessageResponse),
        (status = 400, description = "Invalid id.", body = String),
        (status = 401, description = "Missing API key.", body = String),
        (status = 403, description = "Invalid API key.", body = String),
        (status = 404, description = "User not found.", body = String),
    ),
    tag = "users"
)]
#[instrument(skip(headers, keys, pool))]
pub async fn delete_user(
    Path(id): Path<String>,
    headers: HeaderMap,
    Extension(keys): Extension<Arc<ApiKeys>>,
    Extension(pool): Extension<PgPool>,
) -> Result<impl IntoResponse, ApiError> {
    keys.verify(ApiKeyRoute::UsersDelete, &headers)?;
    let id = parse_id(&id, "id")?;

    if !storage::delete_user(&pool, id).await? {
        return Err(ApiError::NotFound("User not found."));
    }

    info!(user_id = %id, "user deleted");
    Ok(Json(MessageResponse::new("User deleted successfully")))
}

/// Insert an `admin` with no operator, so the first real requests have
/// someone to name in `last_op_id`. Applies the same rules as `create_user`.
///
/// # Errors
/// Returns an error on invalid input, duplicates or database failures.
pub async fn bootstrap_admin(
    pool: &PgPool,
    email: &str,
    name: &str,
    password: &SecretString,
) -> Result<User, ApiError> {
    let email = normalize_optional(Some(email.to_string()));
    let name = normalize_optional(Some(name.to_string()));
    let password = normalize_optional(Some(password.expose_secret().to_string()));

    require_fields(&[
        ("email", email.is_some()),
        ("password", password.is_some()),
        ("name", name.is_some()),
    ])?;
    let (Some(email), Some(name), Some(password)) = (email, name, password) else {
        return Err(ApiError::bad_request("Missing required fields."));
    };

    if !valid_email(&email) {
        return Err(ApiError::bad_request("Invalid email."));
    }
    if storage::email_taken(pool, &email).await? {
        return Err(ApiError::Conflict("Email already exists."));
    }
    if storage::name_taken(pool, &name, None).await? {
        return Err(ApiError::Conflict("Name already exists."));
    }

    let user = storage::insert_user(
        pool,
        &NewUser {
            email,
            name,
            password_hash: password::hash_password(&password)?,
            role: Role::Admin,
            last_op_id: None,
        },
    )
    .await?;

    info!(user_id = %user.id, "bootstrap admin created");
    Ok(user)
}
