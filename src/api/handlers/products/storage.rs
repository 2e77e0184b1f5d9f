//! SQL for the `products` table.

use sqlx::PgPool;
use uuid::Uuid;

use super::types::{Product, ProductFields};

const PRODUCT_COLUMNS: &str =
    "id, name, category_id, price, quantity, last_op_id, created_timestamp, lastupdate_timestamp";

pub(super) async fn list_products(pool: &PgPool) -> Result<Vec<Product>, sqlx::Error> {
    let query = format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_timestamp, id");
    sqlx::query_as::<_, Product>(&query).fetch_all(pool).await
}

pub(super) async fn fetch_product(pool: &PgPool, id: Uuid) -> Result<Option<Product>, sqlx::Error> {
    let query = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1");
    sqlx::query_as::<_, Product>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(super) async fn insert_product(
    pool: &PgPool,
    fields: &ProductFields,
    last_op_id: Uuid,
) -> Result<Product, sqlx::Error> {
    let query = format!(
        r"
        INSERT INTO products (id, name, category_id, price, quantity, last_op_id, created_timestamp, lastupdate_timestamp)
        VALUES ($1, $2, $3, $4, $5, $6, NOW(), NOW())
        RETURNING {PRODUCT_COLUMNS}
        "
    );
    sqlx::query_as::<_, Product>(&query)
        .bind(Uuid::now_v7())
        .bind(&fields.name)
        .bind(fields.category_id)
        .bind(fields.price)
        .bind(fields.quantity)
        .bind(last_op_id)
        .fetch_one(pool)
        .await
}

pub(super) async fn update_product(
    pool: &PgPool,
    id: Uuid,
    fields: &ProductFields,
    last_op_id: Uuid,
) -> Result<Option<Product>, sqlx::Error> {
    let query = format!(
        r"
        UPDATE products
        SET name = $2, category_id = $3, price = $4, quantity = $5, last_op_id = $6,
            lastupdate_timestamp = NOW()
        WHERE id = $1
        RETURNING {PRODUCT_COLUMNS}
        "
    );
    sqlx::query_as::<_, Product>(&query)
        .bind(id)
        .bind(&fields.name)
        .bind(fields.category_id)
        .bind(fields.price)
        .bind(fields.quantity)
        .bind(last_op_id)
        .fetch_optional(pool)
        .await
}

pub(super) async fn delete_product(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
