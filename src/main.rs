//! usagebridge - replay Adobe Analytics usage audit logs into a report suite.

use anyhow::Result;
use usagebridge::cli;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    cli::init_tracing();
    cli::run().await
}
