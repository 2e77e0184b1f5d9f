//! Static API keys, one header per route.
//!
//! Every resource route names the header its caller must send. The expected
//! values come from configuration: a default key plus optional per-route
//! overrides. Missing headers are `401`, mismatches are `403`.

use axum::http::HeaderMap;
use secrecy::{ExposeSecret, SecretString};
use std::{collections::HashMap, fmt};
use subtle::ConstantTimeEq;
use tracing::debug;

use crate::api::handlers::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiKeyRoute {
    UsersList,
    UsersGet,
    UsersCreate,
    UsersUpdate,
    UsersPassword,
    UsersDelete,
    CategoriesList,
    CategoriesGet,
    CategoriesCreate,
    CategoriesUpdate,
    CategoriesDelete,
    ProductsList,
    ProductsGet,
    ProductsCreate,
    ProductsUpdate,
    ProductsDelete,
}

impl ApiKeyRoute {
    pub const ALL: [Self; 16] = [
        Self::UsersList,
        Self::UsersGet,
        Self::UsersCreate,
        Self::UsersUpdate,
        Self::UsersPassword,
        Self::UsersDelete,
        Self::CategoriesList,
        Self::CategoriesGet,
        Self::CategoriesCreate,
        Self::CategoriesUpdate,
        Self::CategoriesDelete,
        Self::ProductsList,
        Self::ProductsGet,
        Self::ProductsCreate,
        Self::ProductsUpdate,
        Self::ProductsDelete,
    ];

    /// Request header carrying the key. These names are part of the public API.
    #[must_use]
    pub const fn header(self) -> &'static str {
        match self {
            Self::UsersList | Self::UsersGet => "get-user-header",
            Self::UsersCreate => "add-user-header",
            Self::UsersUpdate => "update-user-header",
            Self::UsersPassword => "edit-password-header",
            Self::UsersDelete => "delete-user-header",
            Self::CategoriesList | Self::CategoriesGet => "header-get-category",
            Self::CategoriesCreate => "header-add-category",
            Self::CategoriesUpdate => "header-update-category",
            Self::CategoriesDelete => "header-delete-category",
            Self::ProductsList | Self::ProductsGet => "header-get-products",
            Self::ProductsCreate => "header-add-product",
            Self::ProductsUpdate => "header-update-product",
            Self::ProductsDelete => "header-delete-product",
        }
    }

    /// Kebab-case route name, e.g. `users-list`.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::UsersList => "users-list",
            Self::UsersGet => "users-get",
            Self::UsersCreate => "users-create",
            Self::UsersUpdate => "users-update",
            Self::UsersPassword => "users-password",
            Self::UsersDelete => "users-delete",
            Self::CategoriesList => "categories-list",
            Self::CategoriesGet => "categories-get",
            Self::CategoriesCreate => "categories-create",
            Self::CategoriesUpdate => "categories-update",
            Self::CategoriesDelete => "categories-delete",
            Self::ProductsList => "products-list",
            Self::ProductsGet => "products-get",
            Self::ProductsCreate => "products-create",
            Self::ProductsUpdate => "products-update",
            Self::ProductsDelete => "products-delete",
        }
    }

    /// CLI argument id and long flag, e.g. `api-key-users-list`.
    #[must_use]
    pub const fn arg_id(self) -> &'static str {
        match self {
            Self::UsersList => "api-key-users-list",
            Self::UsersGet => "api-key-users-get",
            Self::UsersCreate => "api-key-users-create",
            Self::UsersUpdate => "api-key-users-update",
            Self::UsersPassword => "api-key-users-password",
            Self::UsersDelete => "api-key-users-delete",
            Self::CategoriesList => "api-key-categories-list",
            Self::CategoriesGet => "api-key-categories-get",
            Self::CategoriesCreate => "api-key-categories-create",
            Self::CategoriesUpdate => "api-key-categories-update",
            Self::CategoriesDelete => "api-key-categories-delete",
            Self::ProductsList => "api-key-products-list",
            Self::ProductsGet => "api-key-products-get",
            Self::ProductsCreate => "api-key-products-create",
            Self::ProductsUpdate => "api-key-products-update",
            Self::ProductsDelete => "api-key-products-delete",
        }
    }

    /// Environment fallback, e.g. `STOREKEEPER_API_KEY_USERS_LIST`.
    #[must_use]
    pub const fn env_var(self) -> &'static str {
        match self {
            Self::UsersList => "STOREKEEPER_API_KEY_USERS_LIST",
            Self::UsersGet => "STOREKEEPER_API_KEY_USERS_GET",
            Self::UsersCreate => "STOREKEEPER_API_KEY_USERS_CREATE",
            Self::UsersUpdate => "STOREKEEPER_API_KEY_USERS_UPDATE",
            Self::UsersPassword => "STOREKEEPER_API_KEY_USERS_PASSWORD",
            Self::UsersDelete => "STOREKEEPER_API_KEY_USERS_DELETE",
            Self::CategoriesList => "STOREKEEPER_API_KEY_CATEGORIES_LIST",
            Self::CategoriesGet => "STOREKEEPER_API_KEY_CATEGORIES_GET",
            Self::CategoriesCreate => "STOREKEEPER_API_KEY_CATEGORIES_CREATE",
            Self::CategoriesUpdate => "STOREKEEPER_API_KEY_CATEGORIES_UPDATE",
            Self::CategoriesDelete => "STOREKEEPER_API_KEY_CATEGORIES_DELETE",
            Self::ProductsList => "STOREKEEPER_API_KEY_PRODUCTS_LIST",
            Self::ProductsGet => "STOREKEEPER_API_KEY_PRODUCTS_GET",
            Self::ProductsCreate => "STOREKEEPER_API_KEY_PRODUCTS_CREATE",
            Self::ProductsUpdate => "STOREKEEPER_API_KEY_PRODUCTS_UPDATE",
            Self::ProductsDelete => "STOREKEEPER_API_KEY_PRODUCTS_DELETE",
        }
    }

    /// Human readable route, used in `--help`.
    #[must_use]
    pub const fn describe(self) -> &'static str {
        match self {
            Self::UsersList => "GET /v1/users",
            Self::UsersGet => "GET /v1/users/{id}",
            Self::UsersCreate => "POST /v1/users",
            Self::UsersUpdate => "PUT /v1/users/{id}",
            Self::UsersPassword => "PUT /v1/users/{id}/password",
            Self::UsersDelete => "DELETE /v1/users/{id}",
            Self::CategoriesList => "GET /v1/categories",
            Self::CategoriesGet => "GET /v1/categories/{id}",
            Self::CategoriesCreate => "POST /v1/categories",
            Self::CategoriesUpdate => "PUT /v1/categories/{id}",
            Self::CategoriesDelete => "DELETE /v1/categories/{id}",
            Self::ProductsList => "GET /v1/products",
            Self::ProductsGet => "GET /v1/products/{id}",
            Self::ProductsCreate => "POST /v1/products",
            Self::ProductsUpdate => "PUT /v1/products/{id}",
            Self::ProductsDelete => "DELETE /v1/products/{id}",
        }
    }
}

impl fmt::Display for ApiKeyRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Expected key per route.
#[derive(Clone)]
pub struct ApiKeys {
    default: SecretString,
    overrides: HashMap<ApiKeyRoute, SecretString>,
}

impl ApiKeys {
    #[must_use]
    pub fn new(default: SecretString) -> Self {
        Self {
            default,
            overrides: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_override(mut self, route: ApiKeyRoute, key: SecretString) -> Self {
        self.overrides.insert(route, key);
        self
    }

    /// Key a caller of `route` has to present.
    #[must_use]
    pub fn expected(&self, route: ApiKeyRoute) -> &SecretString {
        self.overrides.get(&route).unwrap_or(&self.default)
    }

    /// Check the route header against the configured key.
    ///
    /// # Errors
    /// `MissingApiKey` when the header is absent, `InvalidApiKey` when its
    /// bytes do not match.
    pub fn verify(&self, route: ApiKeyRoute, headers: &HeaderMap) -> Result<(), ApiError> {
        let Some(presented) = headers.get(route.header()) else {
            debug!(route = %route, "missing api key header");
            return Err(ApiError::MissingApiKey);
        };

        let expected = self.expected(route).expose_secret().as_bytes();
        if bool::from(presented.as_bytes().ct_eq(expected)) {
            Ok(())
        } else {
            debug!(route = %route, "api key mismatch");
            Err(ApiError::InvalidApiKey)
        }
    }

    /// Distinct header names, for the CORS allow list.
    #[must_use]
    pub fn header_names() -> Vec<&'static str> {
        let mut names: Vec<&'static str> = ApiKeyRoute::ALL.iter().map(|r| r.header()).collect();
        names.dedup();
        names
    }
}

impl fmt::Debug for ApiKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut routes: Vec<&str> = self.overrides.keys().map(|route| route.name()).collect();
        routes.sort_unstable();
        f.debug_struct("ApiKeys")
            .field("default", &"[REDACTED]")
            .field("overrides", &routes)
            .finish()
    }
}
