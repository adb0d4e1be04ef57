use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::UplinkError;
use crate::types::VisualMetrics;

/// Periodically posts the render loop's frame metrics to the gateway.
pub struct TelemetryReporter {
    client: reqwest::Client,
    url: String,
}

impl TelemetryReporter {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }

    pub async fn post(&self, metrics: &VisualMetrics) -> Result<(), UplinkError> {
        self.client
            .post(&self.url)
            .json(metrics)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    /// Spawn the reporting loop. Each cycle sends the latest metrics; failures
    /// are logged and the next cycle tries again.
    pub fn spawn(
        self,
        interval_ms: u64,
        metrics: watch::Receiver<VisualMetrics>,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let interval = Duration::from_millis(interval_ms);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(interval) => {}
                }

                let snapshot = metrics.borrow().clone();
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    res = self.post(&snapshot) => {
                        if let Err(e) = res {
                            tracing::debug!(error = %e, "visual telemetry post failed");
                        }
                    }
                }
            }
            tracing::info!("telemetry reporter shutting down");
        })
    }
}
