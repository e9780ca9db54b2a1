//! Frontdesk - human-in-the-loop question answering
//!
//! Answers from learned knowledge or an AI oracle, and escalates the rest to
//! a supervisor whose answers are learned.

use frontdesk::cli;
use tracing_subscriber::EnvFilter;

/// `RUST_LOG` when set and valid, INFO otherwise
fn log_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter())
        .init();

    cli::run().await
}
