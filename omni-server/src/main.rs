//! `omni-server` - serve the Omni Coder API
//!
//! Usage:
//!   omni-server [--host 0.0.0.0] [--port 3000] [--provider groq|gemini|openai]
//!
//! API keys come from `GROQ_API_KEY` / `GEMINI_API_KEY`, read from the
//! environment, `.env.local` or `.env`.

use anyhow::Result;
use clap::Parser;
use omni_server::{load_dotenv, ServerConfig};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let (loaded, failures) = load_dotenv();
    let config = ServerConfig::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    for path in &loaded {
        debug!(path = %path.display(), "loaded environment file");
    }
    for failure in &failures {
        warn!(%failure, "could not read environment file");
    }

    omni_server::serve(config).await
}
