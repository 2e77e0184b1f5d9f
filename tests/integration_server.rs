//! End-to-end test of the `storekeeper` binary.
//!
//! Starts a Postgres container, applies the schema, creates the first admin
//! with `bootstrap-admin`, then runs `server` as a child process and talks to
//! it over HTTP.

use anyhow::{bail, Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::{
    net::TcpListener,
    process::{Child, Command, Stdio},
    time::Duration,
};
use test_support::{postgres::PostgresContainer, runtime};
use tokio::time::sleep;

const SCHEMA_SQL: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/sql/schema.sql"));
const API_KEY: &str = "integration-key";
const ADD_PRODUCT_KEY: &str = "addProductTest";

struct ChildGuard(Child);

impl Drop for ChildGuard {
    fn drop(&mut self) {
        let _ = self.0.kill();
        let _ = self.0.wait();
    }
}

fn pick_port() -> Result<u16> {
    let listener = TcpListener::bind("127.0.0.1:0").context("Failed to bind a local port")?;
    Ok(listener
        .local_addr()
        .context("Failed to read local port")?
        .port())
}

fn storekeeper() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_storekeeper"));
    // Keep stdout free of log lines; bootstrap-admin prints the id there.
    command.env_remove("RUST_LOG");
    command.env_remove("STOREKEEPER_LOG_LEVEL");
    command.env_remove("OTEL_EXPORTER_OTLP_ENDPOINT");
    command
}

fn bootstrap_admin(dsn: &str) -> Result<String> {
    let output = storekeeper()
        .args([
            "bootstrap-admin",
            "--dsn",
            dsn,
            "--email",
            "root@example.com",
            "--name",
            "root",
        ])
        .env("STOREKEEPER_ADMIN_PASSWORD", "root-password")
        .output()
        .context("Failed to run bootstrap-admin")?;

    if !output.status.success() {
        bail!(
            "bootstrap-admin failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
    }

    String::from_utf8(output.stdout)?
        .lines()
        .map(str::trim)
        .rfind(|line| !line.is_empty())
        .map(str::to_string)
        .context("bootstrap-admin printed no id")
}

async fn wait_for_ready(client: &reqwest::Client, base: &str) -> Result<()> {
    for _ in 0..40 {
        match client.get(format!("{base}/health")).send().await {
            Ok(resp) if resp.status().is_success() => return Ok(()),
            _ => sleep(Duration::from_millis(250)).await,
        }
    }

    bail!("storekeeper did not become ready at {base}");
}

fn id_of(value: &Value) -> Result<String> {
    value["id"]
        .as_str()
        .map(str::to_string)
        .context("missing id in response")
}

#[tokio::test]
async fn server_serves_catalog_lifecycle() -> Result<()> {
    if let Err(err) = runtime::ensure_container_runtime() {
        eprintln!("Skipping integration test: {err}");
        return Ok(());
    }

    let postgres = PostgresContainer::start().await?;
    postgres.wait_until_ready().await?;
    postgres.apply_schema(SCHEMA_SQL).await?;
    let dsn = postgres.dsn();

    let admin_id = bootstrap_admin(&dsn)?;

    let port = pick_port()?;
    let _child = ChildGuard(
        storekeeper()
            .args(["-vv", "server", "--port", &port.to_string(), "--dsn", &dsn])
            .env("STOREKEEPER_API_KEY", API_KEY)
            .env("STOREKEEPER_API_KEY_PRODUCTS_CREATE", ADD_PRODUCT_KEY)
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .context("Failed to spawn storekeeper binary")?,
    );

    let base = format!("http://127.0.0.1:{port}");
    let client = reqwest::Client::new();
    wait_for_ready(&client, &base).await?;

    let health = client.get(format!("{base}/health")).send().await?;
    assert_eq!(health.status(), StatusCode::OK);
    assert!(health.headers().contains_key("x-app"));
    assert!(health.headers().contains_key("x-request-id"));
    let health: Value = health.json().await?;
    assert_eq!(health["database"], json!("ok"));

    let unauthorized = client.get(format!("{base}/v1/products")).send().await?;
    assert_eq!(unauthorized.status(), StatusCode::UNAUTHORIZED);

    let category = client
        .post(format!("{base}/v1/categories"))
        .header("header-add-category", API_KEY)
        .json(&json!({ "name": "Tools", "last_op_id": admin_id }))
        .send()
        .await?;
    assert_eq!(category.status(), StatusCode::CREATED);
    let category_id = id_of(&category.json().await?)?;

    // The per-route key replaces the default one for this route.
    let default_key = client
        .post(format!("{base}/v1/products"))
        .header("header-add-product", API_KEY)
        .json(&json!({}))
        .send()
        .await?;
    assert_eq!(default_key.status(), StatusCode::FORBIDDEN);

    let product = client
        .post(format!("{base}/v1/products"))
        .header("header-add-product", ADD_PRODUCT_KEY)
        .json(&json!({
            "name": "Hammer",
            "category_id": category_id,
            "price": "12.50",
            "quantity": 10,
            "last_op_id": admin_id
        }))
        .send()
        .await?;
    assert_eq!(product.status(), StatusCode::CREATED);
    let product_id = id_of(&product.json().await?)?;

    let updated = client
        .put(format!("{base}/v1/products/{product_id}"))
        .header("header-update-product", API_KEY)
        .json(&json!({ "quantity": 7, "last_op_id": admin_id }))
        .send()
        .await?;
    assert_eq!(updated.status(), StatusCode::OK);
    let updated: Value = updated.json().await?;
    assert_eq!(updated["quantity"], json!(7));
    assert_eq!(updated["price"], json!("12.50"));

    let fetched = client
        .get(format!("{base}/v1/products/{product_id}"))
        .header("header-get-products", API_KEY)
        .send()
        .await?;
    assert_eq!(fetched.status(), StatusCode::OK);
    let fetched: Value = fetched.json().await?;
    assert_eq!(fetched["data"]["name"], json!("Hammer"));

    let deleted = client
        .delete(format!("{base}/v1/products/{product_id}"))
        .header("header-delete-product", API_KEY)
        .send()
        .await?;
    assert_eq!(deleted.status(), StatusCode::OK);

    let listed = client
        .get(format!("{base}/v1/products"))
        .header("header-get-products", API_KEY)
        .send()
        .await?;
    assert_eq!(listed.status(), StatusCode::NOT_FOUND);
    assert_eq!(listed.text().await?, "No products found.");

    Ok(())
}
