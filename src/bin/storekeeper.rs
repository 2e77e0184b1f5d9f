use anyhow::Result;
use storekeeper::cli;

#[tokio::main]
async fn main() -> Result<()> {
    let action = cli::start()?;

    let result = action.execute().await;

    // Flush spans even when the action failed
    cli::telemetry::shutdown_tracer();

    result
}
