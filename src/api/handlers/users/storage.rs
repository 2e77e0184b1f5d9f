//! SQL for the `users` table.

use sqlx::PgPool;
use uuid::Uuid;

use super::types::{NewUser, Role, User};

const USER_COLUMNS: &str =
    "id, email, name, role, last_op_id, created_timestamp, lastupdate_timestamp";

pub(super) async fn list_users(pool: &PgPool) -> Result<Vec<User>, sqlx::Error> {
    let query = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_timestamp, id");
    sqlx::query_as::<_, User>(&query).fetch_all(pool).await
}

pub(super) async fn fetch_user(pool: &PgPool, id: Uuid) -> Result<Option<User>, sqlx::Error> {
    let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
    sqlx::query_as::<_, User>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(super) async fn fetch_password_hash(
    pool: &PgPool,
    id: Uuid,
) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar("SELECT password FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(super) async fn email_taken(pool: &PgPool, email: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE email = $1)")
        .bind(email)
        .fetch_one(pool)
        .await
}

/// `except` excludes the user being renamed.
pub(super) async fn name_taken(
    pool: &PgPool,
    name: &str,
    except: Option<Uuid>,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM users WHERE name = $1 AND ($2::uuid IS NULL OR id <> $2))",
    )
    .bind(name)
    .bind(except)
    .fetch_one(pool)
    .await
}

pub(super) async fn insert_user(pool: &PgPool, user: &NewUser) -> Result<User, sqlx::Error> {
    let query = format!(
        r"
        INSERT INTO users (id, email, password, name, role, last_op_id, created_timestamp, lastupdate_timestamp)
        VALUES ($1, $2, $3, $4, $5, $6, NOW(), NOW())
        RETURNING {USER_COLUMNS}
        "
    );
    sqlx::query_as::<_, User>(&query)
        .bind(Uuid::now_v7())
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.name)
        .bind(user.role.as_str())
        .bind(user.last_op_id)
        .fetch_one(pool)
        .await
}

pub(super) async fn update_user(
    pool: &PgPool,
    id: Uuid,
    name: &str,
    role: Role,
    last_op_id: Uuid,
) -> Result<Option<User>, sqlx::Error> {
    let query = format!(
        r"
        UPDATE users
        SET name = $2, role = $3, last_op_id = $4, lastupdate_timestamp = NOW()
        WHERE id = $1
        RETURNING {USER_COLUMNS}
        "
    );
    sqlx::query_as::<_, User>(&query)
        .bind(id)
        .bind(name)
        .bind(role.as_str())
        .bind(last_op_id)
        .fetch_optional(pool)
        .await
}

pub(super) async fn update_password(
    pool: &PgPool,
    id: Uuid,
    password_hash: &str,
    last_op_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r"
        UPDATE users
        SET password = $2, last_op_id = $3, lastupdate_timestamp = NOW()
        WHERE id = $1
        ",
    )
    .bind(id)
    .bind(password_hash)
    .bind(last_op_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub(super) async fn delete_user(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
