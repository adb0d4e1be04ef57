pub mod config;
pub mod error;
pub mod http;
pub mod hub;
pub mod mock;
pub mod store;
pub mod upstream;

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use config::GatewayCfg;
use error::GatewayError;
use http::AppState;
use hub::Hub;
use mock::MockFeed;
use store::StateStore;
use upstream::Upstream;

/// Bind to the configured address and serve until `cancel` fires.
pub async fn run(cfg: GatewayCfg, cancel: CancellationToken) -> Result<(), GatewayError> {
    let addr = cfg.bind_addr()?;
    let listener = TcpListener::bind(addr).await.map_err(GatewayError::Bind)?;
    serve(cfg, listener, Arc::new(StateStore::new()), cancel).await
}

/// Serve on an already-bound listener with the given store.
pub async fn serve(
    cfg: GatewayCfg,
    listener: TcpListener,
    store: Arc<StateStore>,
    cancel: CancellationToken,
) -> Result<(), GatewayError> {
    let hub = Arc::new(Hub::new(cfg.subscriber_buffer));
    let (relay_tx, relay_rx) = upstream::relay_channel();

    let mut upstream = Upstream::new(
        cfg.backend_url.clone(),
        cfg.upstream_retry_ms,
        store.clone(),
        hub.clone(),
        relay_rx,
    );
    if cfg.mocks_allowed() {
        upstream = upstream.with_mock(MockFeed::new(cfg.mock_interval_ms));
    }
    let upstream_task = tokio::spawn(upstream.run(cancel.child_token()));

    let app = http::router(AppState {
        store,
        hub,
        relay: relay_tx,
        shutdown: cancel.clone(),
    });

    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, backend = %cfg.backend_url, env = ?cfg.env, "gateway listening");
    }
    let shutdown = cancel.clone();
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(GatewayError::Serve);

    cancel.cancel();
    if let Err(e) = upstream_task.await {
        tracing::warn!(error = %e, "upstream task failed");
    }
    tracing::info!("gateway stopped");
    served
}
