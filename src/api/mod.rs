use anyhow::{anyhow, Context, Result};
use axum::{
    body::Body,
    extract::MatchedPath,
    http::{header::CONTENT_TYPE, HeaderName, HeaderValue, Method, Request},
    routing::options,
    Extension, Router,
};
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{sync::Arc, time::Duration};
use tokio::{net::TcpListener, signal};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::PropagateRequestIdLayer,
    set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{debug, error, info, info_span, Span};
use ulid::Ulid;
use url::Url;
use utoipa_axum::router::OpenApiRouter;

mod api_key;
pub(crate) mod handlers;
// OpenAPI router wiring and route registration live in openapi.rs.
mod openapi;

pub use api_key::{ApiKeyRoute, ApiKeys};
pub use handlers::{users::bootstrap_admin, ApiError};
pub use openapi::openapi;

/// Build the API router with all documented routes registered.
#[must_use]
pub fn router() -> OpenApiRouter {
    openapi::api_router()
}

/// Connect the shared pool.
///
/// # Errors
/// Returns an error if the database cannot be reached.
pub async fn connect(dsn: &str, max_connections: u32) -> Result<PgPool> {
    PgPoolOptions::new()
        .min_connections(1)
        .max_connections(max_connections)
        .max_lifetime(Duration::from_secs(60 * 2))
        .test_before_acquire(true)
        .connect(dsn)
        .await
        .context("Failed to connect to database")
}

/// DSN with the password masked, safe for logs.
#[must_use]
pub fn redact_dsn(dsn: &str) -> String {
    match Url::parse(dsn) {
        Ok(mut url) => {
            if url.password().is_some() {
                let _ = url.set_password(Some("*****"));
            }
            url.to_string()
        }
        Err(_) => "<unparseable dsn>".to_string(),
    }
}

/// CORS for a single browser origin; the API key headers must be allowed or
/// preflights fail.
///
/// # Errors
/// Returns an error if the origin is not an absolute URL with a host.
pub fn cors_layer(allowed_origin: &str) -> Result<CorsLayer> {
    let parsed = Url::parse(allowed_origin)
        .with_context(|| format!("Invalid allowed origin: {allowed_origin}"))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| anyhow!("Allowed origin must include a valid host: {allowed_origin}"))?;
    let port = parsed
        .port()
        .map_or_else(String::new, |port| format!(":{port}"));
    let origin = HeaderValue::from_str(&format!("{}://{}{}", parsed.scheme(), host, port))
        .context("Failed to build allowed origin header")?;

    let headers = std::iter::once(CONTENT_TYPE).chain(
        ApiKeys::header_names()
            .into_iter()
            .map(HeaderName::from_static),
    );

    Ok(CorsLayer::new()
        .allow_headers(headers.collect::<Vec<_>>())
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_origin(AllowOrigin::exact(origin)))
}

/// The full application: documented routes, preflight-only `OPTIONS /health`
/// and the request-id, tracing and CORS layers.
#[must_use]
pub fn app(pool: PgPool, api_keys: Arc<ApiKeys>, cors: Option<CorsLayer>) -> Router {
    // The OpenAPI half of the split stays in openapi.rs for the `openapi` binary.
    let (router, _openapi) = router().split_for_parts();
    let router = router
        .route("/health", options(handlers::health::health))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(Extension(api_keys))
                .layer(Extension(pool)),
        );

    match cors {
        Some(cors) => router.layer(cors),
        None => router,
    }
}

/// Start the server
/// # Errors
/// Return error if failed to start the server
pub async fn new(
    port: u16,
    pool: PgPool,
    api_keys: ApiKeys,
    allowed_origin: Option<&str>,
) -> Result<()> {
    let cors = allowed_origin.map(cors_layer).transpose()?;
    let app = app(pool, Arc::new(api_keys), cors);

    // Dual-stack when the host has IPv6, IPv4 only otherwise.
    let listener = match TcpListener::bind(("::", port)).await {
        Ok(listener) => listener,
        Err(err) => {
            debug!("IPv6 bind failed ({err}), falling back to 0.0.0.0");
            TcpListener::bind(("0.0.0.0", port))
                .await
                .with_context(|| format!("Failed to bind port {port}"))?
        }
    };

    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                error!("Failed to listen for SIGTERM: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Gracefully shutdown");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redact_dsn_masks_password() {
        assert_eq!(
            redact_dsn("postgres://storekeeper:hunter2@db:5432/storekeeper"),
            "postgres://storekeeper:*****@db:5432/storekeeper"
        );
        assert_eq!(
            redact_dsn("postgres://db:5432/storekeeper"),
            "postgres://db:5432/storekeeper"
        );
        assert_eq!(redact_dsn("not a url"), "<unparseable dsn>");
    }

    #[test]
    fn cors_layer_requires_host() {
        assert!(cors_layer("https://admin.example.com:8443/app").is_ok());
        assert!(cors_layer("admin.example.com").is_err());
    }
}
