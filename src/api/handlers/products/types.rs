use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Price is serialized as a decimal string (`"19.99"`) to keep cents exact.
#[derive(Debug, Clone, Serialize, ToSchema, sqlx::FromRow)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub category_id: Uuid,
    pub price: Decimal,
    pub quantity: i32,
    pub last_op_id: Option<Uuid>,
    pub created_timestamp: DateTime<Utc>,
    pub lastupdate_timestamp: DateTime<Utc>,
}

/// Create body. `price` accepts a JSON number or a decimal string.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    pub name: Option<String>,
    pub category_id: Option<String>,
    pub price: Option<Decimal>,
    pub quantity: Option<i64>,
    pub last_op_id: Option<String>,
}

/// Update body. Omitted fields keep their stored value.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub category_id: Option<String>,
    pub price: Option<Decimal>,
    pub quantity: Option<i64>,
    pub last_op_id: Option<String>,
}

#[derive(Debug)]
pub(crate) struct ProductFields {
    pub name: String,
    pub category_id: Uuid,
    pub price: Decimal,
    pub quantity: i32,
}
