//! Launches a local onionnet: directory, relays and user endpoints.
//!
//! Configuration comes from the TOML file named by `ONIONNET_CONFIG` (if set),
//! then `ONIONNET_*` overrides.

use onionnet_routing::{launch_network, OnionNetConfig};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("onionnet=info,onionnet_routing=info")),
        )
        .init();

    let mut config = match std::env::var("ONIONNET_CONFIG") {
        Ok(path) => {
            info!(path = %path, "Loading configuration");
            OnionNetConfig::from_file(&path)?
        }
        Err(_) => OnionNetConfig::default(),
    };
    config.apply_env_overrides()?;
    config.validate()?;

    let mut network = launch_network(&config).await?;
    info!(
        registry = %config.network.registry_url(),
        relays = config.network.relays,
        users = config.network.users,
        escrow = config.directory.key_escrow,
        "onionnet running, press Ctrl+C to stop"
    );

    tokio::signal::ctrl_c().await?;
    network.shutdown().await;
    Ok(())
}
