//! Chat client entry point
//!
//! Run with:
//! ```bash
//! CHAT_TOKEN=... cargo run -p chat-client
//! ```
//!
//! Configuration is loaded from environment variables. Every event is logged until Ctrl-C.

use anyhow::Context;
use chat_client::ChatClient;
use chat_common::{try_init_tracing_with_config, ClientConfig, TracingConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = try_init_tracing_with_config(TracingConfig::for_environment(config.env)) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    if let Err(e) = run(config).await {
        error!(error = ?e, "Client failed");
        std::process::exit(1);
    }
}

async fn run(config: ClientConfig) -> anyhow::Result<()> {
    info!(env = ?config.env, api = %config.api_base_url, "Configuration loaded");

    let client = ChatClient::new(config)
        .await
        .context("failed to build client")?;
    let mut events = client.subscribe();
    client.connect().context("failed to connect")?;

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(event) => info!(
                    shard = event.shard(),
                    event_type = event.event_type(),
                    guild_id = ?event.guild_id(),
                    "Event"
                ),
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                break;
            }
        }
    }

    client.close().await;
    Ok(())
}
