//! Product endpoints.
//!
//! Every product belongs to an existing category. Price (`NUMERIC(12,2)`) and
//! quantity are non-negative; updates overlay the provided fields on the
//! stored row and re-validate the result.

mod storage;
mod types;

pub use types::{CreateProductRequest, Product, UpdateProductRequest};

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use rust_decimal::Decimal;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use super::{
    categories::storage::category_exists,
    json_body, normalize_optional,
    operator::{require_operator, Clearance},
    parse_id, require_fields, ApiError, DataResponse, MessageResponse,
};
use crate::api::{ApiKeyRoute, ApiKeys};
use types::ProductFields;

const PRICE_SCALE: u32 = 2;
// NUMERIC(12,2) holds at most ten integer digits.
const PRICE_LIMIT: i64 = 10_000_000_000;

fn validate_price(price: Decimal) -> Result<Decimal, ApiError> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(ApiError::bad_request("price must not be negative."));
    }
    if price.normalize().scale() > PRICE_SCALE {
        return Err(ApiError::bad_request(
            "price must have at most two decimal places.",
        ));
    }
    if price >= Decimal::from(PRICE_LIMIT) {
        return Err(ApiError::bad_request("price is out of range."));
    }
    Ok(price)
}

fn validate_quantity(quantity: i64) -> Result<i32, ApiError> {
    if quantity < 0 {
        return Err(ApiError::bad_request("quantity must not be negative."));
    }
    i32::try_from(quantity).map_err(|_| ApiError::bad_request("quantity is out of range."))
}

/// A provided-but-blank name is rejected, an absent one yields `None`.
fn validate_name(name: Option<String>) -> Result<Option<String>, ApiError> {
    match name {
        Some(name) => normalize_optional(Some(name))
            .map(Some)
            .ok_or_else(|| ApiError::bad_request("Name must not be empty.")),
        None => Ok(None),
    }
}

/// Same rule for the category on update: blank is an error, absent keeps the stored one.
fn validate_category_id(category_id: Option<String>) -> Result<Option<Uuid>, ApiError> {
    match category_id {
        Some(raw) => {
            let raw = normalize_optional(Some(raw))
                .ok_or_else(|| ApiError::bad_request("category_id must not be empty."))?;
            parse_id(&raw, "category_id").map(Some)
        }
        None => Ok(None),
    }
}

async fn ensure_category(pool: &PgPool, category_id: Uuid) -> Result<(), ApiError> {
    if category_exists(pool, category_id).await? {
        Ok(())
    } else {
        Err(ApiError::NotFound("Category not found."))
    }
}

#[utoipa::path(
    get,
    path = "/v1/products",
    params(("header-get-products" = String, Header, description = "API key")),
    responses(
        (status = 200, description = "All products, oldest first.", body = [Product]),
        (status = 401, description = "Missing API key.", body = String),
        (status = 403, description = "Invalid API key.", body = String),
        (status = 404, description = "No products found.", body = String),
    ),
    tag = "products"
)]
#[instrument(skip_all)]
pub async fn list_products(
    headers: HeaderMap,
    Extension(keys): Extension<Arc<ApiKeys>>,
    Extension(pool): Extension<PgPool>,
) -> Result<impl IntoResponse, ApiError> {
    keys.verify(ApiKeyRoute::ProductsList, &headers)?;

    let products = storage::list_products(&pool).await?;
    if products.is_empty() {
        return Err(ApiError::NotFound("No products found."));
    }
    Ok(Json(products))
}

#[utoipa::path(
    get,
    path = "/v1/products/{id}",
    params(
        ("id" = String, Path, description = "Product id"),
        ("header-get-products" = String, Header, description = "API key")
    ),
    responses(
        (status = 200, description = "Product detail.", body = DataResponse<Product>),
        (status = 400, description = "Invalid id.", body = String),
        (status = 401, description = "Missing API key.", body = String),
        (status = 403, description = "Invalid API key.", body = String),
        (status = 404, description = "Product not found.", body = String),
    ),
    tag = "products"
)]
#[instrument(skip(headers, keys, pool))]
pub async fn get_product(
    Path(id): Path<String>,
    headers: HeaderMap,
    Extension(keys): Extension<Arc<ApiKeys>>,
    Extension(pool): Extension<PgPool>,
) -> Result<impl IntoResponse, ApiError> {
    keys.verify(ApiKeyRoute::ProductsGet, &headers)?;
    let id = parse_id(&id, "id")?;

    let product = storage::fetch_product(&pool, id)
        .await?
        .ok_or(ApiError::NotFound("Product not found."))?;
    Ok(Json(DataResponse { data: product }))
}

#[utoipa::path(
    post,
    path = "/v1/products",
    request_body = CreateProductRequest,
    params(("header-add-product" = String, Header, description = "API key")),
    responses(
        (status = 201, description = "Product created.", body = Product),
        (status = 400, description = "Missing or invalid field.", body = String),
        (status = 401, description = "Missing API key.", body = String),
        (status = 403, description = "Invalid API key.", body = String),
        (status = 404, description = "Category or operator not found.", body = String),
    ),
    tag = "products"
)]
#[instrument(skip_all)]
pub async fn create_product(
    headers: HeaderMap,
    Extension(keys): Extension<Arc<ApiKeys>>,
    Extension(pool): Extension<PgPool>,
    payload: Result<Json<CreateProductRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    keys.verify(ApiKeyRoute::ProductsCreate, &headers)?;
    let request = json_body(payload)?;

    let name = normalize_optional(request.name);
    let category_id = normalize_optional(request.category_id);
    let last_op_id = normalize_optional(request.last_op_id);

    require_fields(&[
        ("name", name.is_some()),
        ("category_id", category_id.is_some()),
        ("price", request.price.is_some()),
        ("quantity", request.quantity.is_some()),
        ("last_op_id", last_op_id.is_some()),
    ])?;
    let (Some(name), Some(category_id), Some(price), Some(quantity), Some(last_op_id)) = (
        name,
        category_id,
        request.price,
        request.quantity,
        last_op_id,
    ) else {
        return Err(ApiError::bad_request("Missing required fields."));
    };

    let fields = ProductFields {
        name,
        category_id: parse_id(&category_id, "category_id")?,
        price: validate_price(price)?,
        quantity: validate_quantity(quantity)?,
    };
    let operator_id = parse_id(&last_op_id, "last_op_id")?;

    ensure_category(&pool, fields.category_id).await?;
    require_operator(&pool, operator_id, Clearance::AnyUser).await?;

    let product = storage::insert_product(&pool, &fields, operator_id).await?;

    info!(product_id = %product.id, %operator_id, "product created");
    Ok((StatusCode::CREATED, Json(product)))
}

#[utoipa::path(
    put,
    path = "/v1/products/{id}",
    request_body = UpdateProductRequest,
    params(
        ("id" = String, Path, description = "Product id"),
        ("header-update-product" = String, Header, description = "API key")
    ),
    responses(
        (status = 200, description = "Product updated.", body = Product),
        (status = 400, description = "Missing or invalid field.", body = String),
        (status = 401, description = "Missing API key.", body = String),
        (status = 403, description = "Invalid API key.", body = String),
        (status = 404, description = "Product, category or operator not found.", body = String),
    ),
    tag = "products"
)]
#[instrument(skip(headers, keys, pool, payload))]
pub async fn update_product(
    Path(id): Path<String>,
    headers: HeaderMap,
    Extension(keys): Extension<Arc<ApiKeys>>,
    Extension(pool): Extension<PgPool>,
    payload: Result<Json<UpdateProductRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    keys.verify(ApiKeyRoute::ProductsUpdate, &headers)?;
    let id = parse_id(&id, "id")?;
    let request = json_body(payload)?;

    let last_op_id = normalize_optional(request.last_op_id);
    require_fields(&[("last_op_id", last_op_id.is_some())])?;
    let operator_id = parse_id(last_op_id.as_deref().unwrap_or_default(), "last_op_id")?;

    let name = validate_name(request.name)?;
    let category_id = validate_category_id(request.category_id)?;
    let price = request.price.map(validate_price).transpose()?;
    let quantity = request.quantity.map(validate_quantity).transpose()?;

    let current = storage::fetch_product(&pool, id)
        .await?
        .ok_or(ApiError::NotFound("Product not found."))?;

    if let Some(category_id) = category_id {
        ensure_category(&pool, category_id).await?;
    }
    require_operator(&pool, operator_id, Clearance::AnyUser).await?;

    let fields = ProductFields {
        name: name.unwrap_or(current.name),
        category_id: category_id.unwrap_or(current.category_id),
        price: price.unwrap_or(current.price),
        quantity: quantity.unwrap_or(current.quantity),
    };

    let product = storage::update_product(&pool, id, &fields, operator_id)
        .await?
        .ok_or(ApiError::NotFound("Product not found."))?;

    info!(product_id = %product.id, %operator_id, "product updated");
    Ok(Json(product))
}

#[utoipa::path(
    delete,
    path = "/v1/products/{id}",
    params(
        ("id" = String, Path, description = "Product id"),
        ("header-delete-product" = String, Header, description = "API key")
    ),
    responses(
        (status = 200, description = "Product deleted.", body = MessageResponse),
        (status = 400, description = "Invalid id.", body = String),
        (status = 401, description = "Missing API key.", body = String),
        (status = 403, description = "Invalid API key.", body = String),
        (status = 404, description = "Product not found.", body = String),
    ),
    tag = "products"
)]
#[instrument(skip(headers, keys, pool))]
pub async fn delete_product(
    Path(id): Path<String>,
    headers: HeaderMap,
    Extension(keys): Extension<Arc<ApiKeys>>,
    Extension(pool): Extension<PgPool>,
) -> Result<impl IntoResponse, ApiError> {
    keys.verify(ApiKeyRoute::ProductsDelete, &headers)?;
    let id = parse_id(&id, "id")?;

    if !storage::delete_product(&pool, id).await? {
        return Err(ApiError::NotFound("Product not found."));
    }

    info!(product_id = %id, "product deleted");
    Ok(Json(MessageResponse::new("Product deleted successfully")))
}
