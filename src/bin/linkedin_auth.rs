//! One-time LinkedIn OAuth helper: prints the values the agent needs in `.env`.

use anyhow::{Context, Result};
use linkedin_news_agent::auth::{random_state, wait_for_callback, AuthConfig, CALLBACK_ADDR};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_target(false))
        .init();

    let cfg = AuthConfig::from_env()?;
    let state = random_state();
    let url = cfg.authorization_url(&state)?;

    let listener = tokio::net::TcpListener::bind(CALLBACK_ADDR)
        .await
        .with_context(|| format!("binding callback listener on {CALLBACK_ADDR}"))?;

    println!("\nOpen this URL in your browser:\n\n  {url}\n");
    println!("Waiting for LinkedIn to redirect back...");

    let creds = wait_for_callback(listener, cfg, reqwest::Client::new(), &state).await?;

    println!("\nAuthorization complete");
    if let Some(name) = &creds.name {
        println!("  Name: {name}");
    }
    println!("  Token expires in: ~{} days", creds.expires_in_days);
    println!("\nCopy these values into your .env file:\n\n{}\n", creds.env_lines());
    Ok(())
}
