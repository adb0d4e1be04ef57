use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use crate::error::GatewayError;
use crate::hub::Hub;
use crate::mock::MockFeed;
use crate::store::StateStore;

/// Frames queued for the backend while the link is up.
const RELAY_BUFFER: usize = 16;

/// Sender half of the explicit downstream → backend relay path.
pub type RelaySender = mpsc::Sender<String>;

pub fn relay_channel() -> (RelaySender, mpsc::Receiver<String>) {
    mpsc::channel(RELAY_BUFFER)
}

/// Cache one backend frame and push it verbatim to every subscriber.
/// Frames that are not JSON are rejected and touch nothing.
pub fn handle_frame(store: &StateStore, hub: &Hub, text: &str) -> Result<usize, GatewayError> {
    let state: serde_json::Value = serde_json::from_str(text)?;
    store.update(state);
    Ok(hub.broadcast(text))
}

/// The single backend connection. Reconnects after a fixed delay forever.
pub struct Upstream {
    url: String,
    retry: Duration,
    store: Arc<StateStore>,
    hub: Arc<Hub>,
    relay_rx: mpsc::Receiver<String>,
    mock: Option<MockFeed>,
}

enum SessionEnd {
    Closed,
    Failed,
    Cancelled,
}

impl Upstream {
    pub fn new(
        url: String,
        retry_ms: u64,
        store: Arc<StateStore>,
        hub: Arc<Hub>,
        relay_rx: mpsc::Receiver<String>,
    ) -> Self {
        Self {
            url,
            retry: Duration::from_millis(retry_ms),
            store,
            hub,
            relay_rx,
            mock: None,
        }
    }

    /// Enable the synthetic fallback feed for link errors.
    pub fn with_mock(mut self, feed: MockFeed) -> Self {
        self.mock = Some(feed);
        self
    }

    pub async fn run(mut self, cancel: CancellationToken) {
        let mut attempt: u64 = 0;
        loop {
            attempt += 1;
            tracing::info!(url = %self.url, attempt, "connecting to backend");
            let connected = tokio::select! {
                _ = cancel.cancelled() => break,
                res = tokio_tungstenite::connect_async(self.url.as_str()) => res,
            };

            let failed = match connected {
                Ok((ws, _)) => {
                    tracing::info!(url = %self.url, "backend link established");
                    attempt = 0;
                    if let Some(feed) = self.mock.as_mut() {
                        feed.stop();
                    }
                    while self.relay_rx.try_recv().is_ok() {}
                    match self.session(ws, &cancel).await {
                        SessionEnd::Cancelled => break,
                        SessionEnd::Closed => false,
                        SessionEnd::Failed => true,
                    }
                }
                Err(e) => {
                    tracing::error!(error = %GatewayError::from(e), attempt, "backend link error");
                    true
                }
            };

            if failed {
                if let Some(feed) = self.mock.as_mut() {
                    feed.start(self.store.clone(), self.hub.clone(), &cancel);
                }
            }
            tracing::warn!(retry_ms = self.retry.as_millis() as u64, attempt, "backend link lost, retrying");
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.retry) => {}
            }
        }

        if let Some(feed) = self.mock.as_mut() {
            feed.stop();
        }
        tracing::info!("upstream task shutting down");
    }

    async fn session<S>(
        &mut self,
        ws: tokio_tungstenite::WebSocketStream<S>,
        cancel: &CancellationToken,
    ) -> SessionEnd
    where
        S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
    {
        let (mut sink, mut stream) = ws.split();
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    let _ = sink.send(Message::Close(None)).await;
                    return SessionEnd::Cancelled;
                }
                frame = stream.next() => match frame {
                    Some(Ok(Message::Text(text))) => {
                        if let Err(e) = handle_frame(&self.store, &self.hub, text.as_str()) {
                            tracing::error!(error = %e, "failed to parse backend message");
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => return SessionEnd::Closed,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::error!(error = %e, "backend link error");
                        return SessionEnd::Failed;
                    }
                },
                Some(text) = self.relay_rx.recv() => {
                    if let Err(e) = sink.send(Message::Text(text.into())).await {
                        tracing::error!(error = %e, "backend relay write failed");
                        return SessionEnd::Failed;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_is_cached_and_broadcast_verbatim() {
        let store = StateStore::new();
        let hub = Hub::new(4);
        let mut sub = hub.subscribe();
        let text = r#"{"genre":"Techno",  "bpm":128}"#;
        assert_eq!(handle_frame(&store, &hub, text).unwrap(), 1);
        assert_eq!(sub.rx.try_recv().unwrap(), text);
        assert_eq!(store.latest().unwrap()["genre"], "Techno");
    }

    #[test]
    fn malformed_frame_is_rejected() {
        let store = StateStore::new();
        let hub = Hub::new(4);
        let mut sub = hub.subscribe();
        assert!(handle_frame(&store, &hub, "{oops").is_err());
        assert!(sub.rx.try_recv().is_err());
        assert!(store.latest().is_none());
    }
}
