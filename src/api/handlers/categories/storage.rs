//! SQL for the `categories` table.

use sqlx::PgPool;
use uuid::Uuid;

use super::types::Category;

pub(super) async fn list_categories(pool: &PgPool) -> Result<Vec<Category>, sqlx::Error> {
    sqlx::query_as::<_, Category>(
        r"
        SELECT id, name, last_op_id, created_timestamp, lastupdate_timestamp
        FROM categories
        ORDER BY created_timestamp, id
        ",
    )
    .fetch_all(pool)
    .await
}

pub(crate) async fn fetch_category(
    pool: &PgPool,
    id: Uuid,
) -> Result<Option<Category>, sqlx::Error> {
    sqlx::query_as::<_, Category>(
        r"
        SELECT id, name, last_op_id, created_timestamp, lastupdate_timestamp
        FROM categories
        WHERE id = $1
        ",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn category_exists(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM categories WHERE id = $1)")
        .bind(id)
        .fetch_one(pool)
        .await
}

/// `except` excludes the category being renamed.
pub(super) async fn name_taken(
    pool: &PgPool,
    name: &str,
    except: Option<Uuid>,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM categories WHERE name = $1 AND ($2::uuid IS NULL OR id <> $2))",
    )
    .bind(name)
    .bind(except)
    .fetch_one(pool)
    .await
}

pub(super) async fn insert_category(
    pool: &PgPool,
    name: &str,
    last_op_id: Uuid,
) -> Result<Category, sqlx::Error> {
    sqlx::query_as::<_, Category>(
        r"
        INSERT INTO categories (id, name, last_op_id, created_timestamp, lastupdate_timestamp)
        VALUES ($1, $2, $3, NOW(), NOW())
        RETURNING id, name, last_op_id, created_timestamp, lastupdate_timestamp
        ",
    )
    .bind(Uuid::now_v7())
    .bind(name)
    .bind(last_op_id)
    .fetch_one(pool)
    .await
}

pub(super) async fn update_category(
    pool: &PgPool,
    id: Uuid,
    name: &str,
    last_op_id: Uuid,
) -> Result<Option<Category>, sqlx::Error> {
    sqlx::query_as::<_, Category>(
        r"
        UPDATE categories
        SET name = $2, last_op_id = $3, lastupdate_timestamp = NOW()
        WHERE id = $1
        RETURNING id, name, last_op_id, created_timestamp, lastupdate_timestamp
        ",
    )
    .bind(id)
    .bind(name)
    .bind(last_op_id)
    .fetch_optional(pool)
    .await
}

pub(super) async fn product_count(pool: &PgPool, id: Uuid) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE category_id = $1")
        .bind(id)
        .fetch_one(pool)
        .await
}

pub(super) async fn delete_category(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM categories WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
