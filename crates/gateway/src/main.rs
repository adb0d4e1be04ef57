use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use vibe_core::runtime::ShutdownGuard;
use vibe_gateway::config::GatewayCfg;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = GatewayCfg::from_env();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if cfg.is_production() {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_target(true))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true))
            .init();
    }

    let shutdown = ShutdownGuard::new();
    shutdown.spawn_signal_listener();

    vibe_gateway::run(cfg, shutdown.token()).await?;
    Ok(())
}
