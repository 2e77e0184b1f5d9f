//! Product category endpoints.
//!
//! Category names are unique. A category cannot be deleted while products
//! still point at it.

pub(crate) mod storage;
mod types;

pub use types::{Category, CategoryRequest};

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::{
    json_body, normalize_optional,
    operator::{require_operator, Clearance},
    parse_id, require_fields, ApiError, DataResponse, MessageResponse,
};
use crate::api::{ApiKeyRoute, ApiKeys};

/// Trimmed name and parsed operator id from a create/update body.
fn validate(request: CategoryRequest) -> Result<(String, Uuid), ApiError> {
    let name = normalize_optional(request.name);
    let last_op_id = normalize_optional(request.last_op_id);

    require_fields(&[
        ("name", name.is_some()),
        ("last_op_id", last_op_id.is_some()),
    ])?;
    let (Some(name), Some(last_op_id)) = (name, last_op_id) else {
        return Err(ApiError::bad_request("Missing required fields."));
    };

    Ok((name, parse_id(&last_op_id, "last_op_id")?))
}

#[utoipa::path(
    get,
    path = "/v1/categories",
    params(("header-get-category" = String, Header, description = "API key")),
    responses(
        (status = 200, description = "All categories, oldest first.", body = [Category]),
        (status = 401, description = "Missing API key.", body = String),
        (status = 403, description = "Invalid API key.", body = String),
        (status = 404, description = "No categories found.", body = String),
    ),
    tag = "categories"
)]
#[instrument(skip_all)]
pub async fn list_categories(
    headers: HeaderMap,
    Extension(keys): Extension<Arc<ApiKeys>>,
    Extension(pool): Extension<PgPool>,
) -> Result<impl IntoResponse, ApiError> {
    keys.verify(ApiKeyRoute::CategoriesList, &headers)?;

    let categories = storage::list_categories(&pool).await?;
    if categories.is_empty() {
        return Err(ApiError::NotFound("No categories found."));
    }
    Ok(Json(categories))
}

#[utoipa::path(
    get,
    path = "/v1/categories/{id}",
    params(
        ("id" = String, Path, description = "Category id"),
        ("header-get-category" = String, Header, description = "API key")
    ),
    responses(
        (status = 200, description = "Category detail.", body = DataResponse<Category>),
        (status = 400, description = "Invalid id.", body = String),
        (status = 401, description = "Missing API key.", body = String),
        (status = 403, description = "Invalid API key.", body = String),
        (status = 404, description = "Category not found.", body = String),
    ),
    tag = "categories"
)]
#[instrument(skip(headers, keys, pool))]
pub async fn get_category(
    Path(id): Path<String>,
    headers: HeaderMap,
    Extension(keys): Extension<Arc<ApiKeys>>,
    Extension(pool): Extension<PgPool>,
) -> Result<impl IntoResponse, ApiError> {
    keys.verify(ApiKeyRoute::CategoriesGet, &headers)?;
    let id = parse_id(&id, "id")?;

    let category = storage::fetch_category(&pool, id)
        .await?
        .ok_or(ApiError::NotFound("Category not found."))?;
    Ok(Json(DataResponse { data: category }))
}

#[utoipa::path(
    post,
    path = "/v1/categories",
    request_body = CategoryRequest,
    params(("header-add-category" = String, Header, description = "API key")),
    responses(
        (status = 201, description = "Category created.", body = Category),
        (status = 400, description = "Missing or invalid field.", body = String),
        (status = 401, description = "Missing API key.", body = String),
        (status = 403, description = "Invalid API key.", body = String),
        (status = 404, description = "Operator not found.", body = String),
        (status = 409, description = "Category name already exists.", body = String),
    ),
    tag = "categories"
)]
#[instrument(skip_all)]
pub async fn create_category(
    headers: HeaderMap,
    Extension(keys): Extension<Arc<ApiKeys>>,
    Extension(pool): Extension<PgPool>,
    payload: Result<Json<CategoryRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    keys.verify(ApiKeyRoute::CategoriesCreate, &headers)?;
    let (name, operator_id) = validate(json_body(payload)?)?;

    if storage::name_taken(&pool, &name, None).await? {
        return Err(ApiError::Conflict("Category name already exists."));
    }
    require_operator(&pool, operator_id, Clearance::AnyUser).await?;

    let category = storage::insert_category(&pool, &name, operator_id).await?;

    info!(category_id = %category.id, %operator_id, "category created");
    Ok((StatusCode::CREATED, Json(category)))
}

#[utoipa::path(
    put,
    path = "/v1/categories/{id}",
    request_body = CategoryRequest,
    params(
        ("id" = String, Path, description = "Category id"),
        ("header-update-category" = String, Header, description = "API key")
    ),
    responses(
        (status = 200, description = "Category updated.", body = Category),
        (status = 400, description = "Missing or invalid field.", body = String),
        (status = 401, description = "Missing API key.", body = String),
        (status = 403, description = "Invalid API key.", body = String),
        (status = 404, description = "Category or operator not found.", body = String),
        (status = 409, description = "Category name already exists.", body = String),
    ),
    tag = "categories"
)]
#[instrument(skip(headers, keys, pool, payload))]
pub async fn update_category(
    Path(id): Path<String>,
    headers: HeaderMap,
    Extension(keys): Extension<Arc<ApiKeys>>,
    Extension(pool): Extension<PgPool>,
    payload: Result<Json<CategoryRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    keys.verify(ApiKeyRoute::CategoriesUpdate, &headers)?;
    let id = parse_id(&id, "id")?;
    let (name, operator_id) = validate(json_body(payload)?)?;

    if !storage::category_exists(&pool, id).await? {
        return Err(ApiError::NotFound("Category not found."));
    }
    if storage::name_taken(&pool, &name, Some(id)).await? {
        return Err(ApiError::Conflict("Category name already exists."));
    }
    require_operator(&pool, operator_id, Clearance::AnyUser).await?;

    let category = storage::update_category(&pool, id, &name, operator_id)
        .await?
        .ok_or(ApiError::NotFound("Category not found."))?;

    info!(category_id = %category.id, %operator_id, "category updated");
    Ok(Json(category))
}

#[utoipa::path(
    delete,
    path = "/v1/categories/{id}",
    params(
        ("id" = String, Path, description = "Category id"),
        ("header-delete-category" = String, Header, description = "API key")
    ),
    responses(
        (status = 200, description = "Category deleted.", body = MessageResponse),
        (status = 400, description = "Invalid id.", body = String),
        (status = 401, description = "Missing API key.", body = String),
        (status = 403, description = "Invalid API key.", body = String),
        (status = 404, description = "Category not found.", body = String),
        (status = 409, description = "Category still has products.", body = String),
    ),
    tag = "categories"
)]
#[instrument(skip(headers, keys, pool))]
pub async fn delete_category(
    Path(id): Path<String>,
    headers: HeaderMap,
    Extension(keys): Extension<Arc<ApiKeys>>,
    Extension(pool): Extension<PgPool>,
) -> Result<impl IntoResponse, ApiError> {
    keys.verify(ApiKeyRoute::CategoriesDelete, &headers)?;
    let id = parse_id(&id, "id")?;

    if !storage::category_exists(&pool, id).await? {
        return Err(ApiError::NotFound("Category not found."));
    }

    let products = storage::product_count(&pool, id).await?;
    if products > 0 {
        debug!(category_id = %id, products, "category still referenced");
        return Err(ApiError::Conflict("Category still has products."));
    }

    // ON DELETE RESTRICT still guards a product inserted in between.
    if !storage::delete_category(&pool, id).await? {
        return Err(ApiError::NotFound("Category not found."));
    }

    info!(category_id = %id, "category deleted");
    Ok(Json(MessageResponse::new("Category deleted successfully")))
}
