//! Connects to the Discord gateway and logs every event until the session ends.
//!
//! Run with tracing enabled:
//! ```sh
//! DISCORD_TOKEN=... RUST_LOG=info cargo run --example gateway --features tracing
//! ```

use discord_gateway::gateway::{Client, Config, Event};
use futures::StreamExt as _;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let token = std::env::var("DISCORD_TOKEN")?;
    let config = Config::builder()
        .token(token)
        .maybe_url(std::env::var("DISCORD_GATEWAY_URL").ok())
        .build();
    let client = Client::new(config)?;

    let mut events = Box::pin(client.events());
    client.connect().await?;
    info!(state = ?client.state(), "Connected");

    loop {
        tokio::select! {
            event = events.next() => {
                let Some(event) = event else { break };
                match event {
                    Ok(Event::Ready) => {
                        let session = client.session();
                        info!(session_id = ?session.session_id, "Session ready");
                    }
                    Ok(Event::Message { event, payload }) => {
                        info!(event = %event, size = payload.to_string().len(), "Dispatch");
                    }
                    Ok(Event::Fatal { code, reason }) => {
                        error!(%code, %reason, "Gateway rejected the session");
                        break;
                    }
                    Ok(other) => info!(event = ?other),
                    Err(e) => {
                        warn!(error = %e, "Event stream ended");
                        break;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                break;
            }
        }
    }

    client.disconnect()?;
    info!(latency = ?client.session().latency, "Disconnected");

    Ok(())
}
