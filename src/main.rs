//! LinkedIn news agent: run the pipeline once (`RUN_NOW=true`) or on a cron schedule.

use std::process::ExitCode;
use std::sync::Arc;

use linkedin_news_agent::metrics::Metrics;
use linkedin_news_agent::scheduler::{exit_status, run_trigger};
use linkedin_news_agent::{Agent, AgentConfig};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("linkedin_news_agent=info,warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env if present; real environment variables take precedence.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = match AgentConfig::load_default() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "failed to load configuration");
            return ExitCode::FAILURE;
        }
    };
    tracing::debug!(config = ?cfg, "configuration loaded");

    let agent = match Agent::from_config(&cfg) {
        Ok(a) => a,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "failed to build agent");
            return ExitCode::FAILURE;
        }
    };

    let _metrics_server = match cfg.metrics_addr.as_deref().filter(|_| !cfg.run_now) {
        Some(addr) => {
            let served = match Metrics::init() {
                Ok(m) => m.serve(addr).await,
                Err(e) => Err(e),
            };
            match served {
                Ok(h) => Some(h),
                Err(e) => {
                    tracing::error!(error = %format!("{e:#}"), "metrics endpoint disabled");
                    None
                }
            }
        }
        None => None,
    };

    let result = run_trigger(cfg.run_now, &cfg.schedule, Arc::new(agent), ctrl_c()).await;
    if let Err(e) = &result {
        tracing::error!(error = %e, "fatal error");
    }
    ExitCode::from(exit_status(&result))
}
