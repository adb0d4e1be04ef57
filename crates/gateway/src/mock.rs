//! Synthetic backend stand-in for development without the analysis service.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

use crate::hub::Hub;
use crate::store::StateStore;

/// One calm, randomized state frame.
pub fn mock_state<R: Rng>(rng: &mut R) -> Value {
    json!({
        "bpm": 120.0,
        "low_energy": rng.gen_range(0.1_f32..0.5),
        "mid_energy": rng.gen_range(0.1_f32..0.4),
        "high_energy": rng.gen_range(0.1_f32..0.3),
        "glitch_factor": if rng.gen_bool(0.1) { 1.0 } else { 0.0 },
        "genre": "Ambient",
        "state": "Chill",
        "is_mock": true,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    })
}

/// Start/stop handle for the synthetic feed. Starting twice is a no-op.
#[derive(Debug)]
pub struct MockFeed {
    interval: Duration,
    running: Option<CancellationToken>,
}

impl MockFeed {
    pub fn new(interval_ms: u64) -> Self {
        Self {
            interval: Duration::from_millis(interval_ms),
            running: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Spawn the generator under `parent`; it also stops when `parent` is cancelled.
    pub fn start(&mut self, store: Arc<StateStore>, hub: Arc<Hub>, parent: &CancellationToken) {
        if self.running.is_some() {
            return;
        }
        let cancel = parent.child_token();
        self.running = Some(cancel.clone());
        let interval = self.interval;
        tracing::warn!(interval_ms = interval.as_millis() as u64, "mock feed started, publishing synthetic state");

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(interval) => {}
                }
                let state = mock_state(&mut rand::thread_rng());
                hub.broadcast(&state.to_string());
                store.update(state);
            }
        });
    }

    pub fn stop(&mut self) {
        if let Some(cancel) = self.running.take() {
            cancel.cancel();
            tracing::info!("mock feed stopped");
        }
    }
}

impl Drop for MockFeed {
    fn drop(&mut self) {
        self.stop();
    }
}
