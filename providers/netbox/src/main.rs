//! NetBox provider plugin binary
//!
//! Speaks the line-delimited JSON plugin protocol on stdin/stdout. Logs go to
//! stderr, filtered by `TF_LOG` or `RUST_LOG` (default `info`).

use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_env("TF_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    info!("Starting NetBox provider v{}", env!("CARGO_PKG_VERSION"));

    let provider = terraform_provider_netbox::provider();
    provider_sdk::serve_stdio(&provider).await?;

    info!("NetBox provider stopped");
    Ok(())
}
