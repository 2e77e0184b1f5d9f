use crate::api::{self, ApiKeys};
use anyhow::Result;
use tracing::debug;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub db_max_connections: u32,
    pub allowed_origin: Option<String>,
    pub api_keys: ApiKeys,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the database is unreachable or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    debug!(
        port = args.port,
        dsn = %api::redact_dsn(&args.dsn),
        db_max_connections = args.db_max_connections,
        "starting server"
    );

    let pool = api::connect(&args.dsn, args.db_max_connections).await?;

    api::new(
        args.port,
        pool,
        args.api_keys,
        args.allowed_origin.as_deref(),
    )
    .await
}
