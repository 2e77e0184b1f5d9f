use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, ToSchema, sqlx::FromRow)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub last_op_id: Option<Uuid>,
    pub created_timestamp: DateTime<Utc>,
    pub lastupdate_timestamp: DateTime<Utc>,
}

/// Body of both create and update; every field is required.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CategoryRequest {
    pub name: Option<String>,
    pub last_op_id: Option<String>,
}
