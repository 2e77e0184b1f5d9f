use crate::api;
use anyhow::{Context, Result};
use secrecy::SecretString;
use tracing::info;

#[derive(Debug)]
pub struct Args {
    pub dsn: String,
    pub email: String,
    pub name: String,
    pub password: SecretString,
}

/// Create the first admin user.
/// # Errors
/// Returns an error if the database is unreachable or the admin fails validation.
pub async fn execute(args: Args) -> Result<()> {
    let pool = api::connect(&args.dsn, 1).await?;

    let admin = api::bootstrap_admin(&pool, &args.email, &args.name, &args.password)
        .await
        .context("Failed to create the admin user")?;

    info!(id = %admin.id, "admin user created");
    println!("{}", admin.id);

    Ok(())
}
