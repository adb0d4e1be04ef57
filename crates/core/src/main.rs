use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use vibe_core::config::EngineCfg;
use vibe_core::runtime::host::{HeadlessShell, NoGamepad, TraceSink};
use vibe_core::runtime::{Runtime, ShutdownGuard};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_target(true))
        .init();

    let cfg = EngineCfg::from_env();
    tracing::info!(?cfg, "engine config loaded");

    let shutdown = ShutdownGuard::new();
    shutdown.spawn_signal_listener();

    let (mut runtime, _keys) = Runtime::new(
        cfg,
        shutdown.clone(),
        Box::new(NoGamepad),
        Box::new(TraceSink),
        Box::new(HeadlessShell::new(shutdown.token())),
    );
    runtime.run().await;
    Ok(())
}
