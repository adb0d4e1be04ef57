use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use super::{Backoff, UplinkError};
use crate::types::{BoredomMessage, ConnectionState, GlobalState};

/// Outbound boredom reports buffered between the render loop and the socket.
const BOREDOM_BUFFER: usize = 8;

/// Connection bookkeeping shared by every session of one uplink.
///
/// Pure state transitions; the socket task drives them and the watch
/// channels publish the results to the render loop.
#[derive(Debug)]
pub struct LinkState {
    state_tx: watch::Sender<GlobalState>,
    status_tx: watch::Sender<ConnectionState>,
    backoff: Backoff,
    attempt: u32,
}

impl LinkState {
    pub fn new(
        backoff: Backoff,
    ) -> (Self, watch::Receiver<GlobalState>, watch::Receiver<ConnectionState>) {
        let (state_tx, state_rx) = watch::channel(GlobalState::offline());
        let (status_tx, status_rx) = watch::channel(ConnectionState::Disconnected);
        let link = Self {
            state_tx,
            status_tx,
            backoff,
            attempt: 0,
        };
        (link, state_rx, status_rx)
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn status(&self) -> ConnectionState {
        *self.status_tx.borrow()
    }

    pub fn on_open(&mut self) {
        self.attempt = 0;
        self.status_tx.send_replace(ConnectionState::Connected);
        tracing::info!("uplink connected");
    }

    /// Replace the state with a decoded frame. A malformed frame leaves the
    /// previous state in place.
    pub fn on_message(&mut self, text: &str) -> Result<(), UplinkError> {
        let state: GlobalState = serde_json::from_str(text)?;
        self.state_tx.send_replace(state);
        Ok(())
    }

    /// Reset to the offline state, mark the link disconnected and return
    /// how long to wait before the next attempt.
    pub fn on_close(&mut self, reason: &str) -> Duration {
        self.state_tx.send_replace(GlobalState::offline());
        self.status_tx.send_replace(ConnectionState::Disconnected);
        let delay = self.backoff.delay(self.attempt);
        self.attempt = self.attempt.saturating_add(1);
        tracing::warn!(
            attempt = self.attempt,
            delay_ms = delay.as_millis() as u64,
            reason,
            "uplink lost, scheduling reconnect"
        );
        delay
    }

    /// The backoff elapsed and a new connection attempt starts.
    pub fn on_retry(&mut self) {
        self.status_tx.send_replace(ConnectionState::Reconnecting);
        tracing::debug!(attempt = self.attempt, "uplink reconnecting");
    }
}

/// Render-side view of the uplink.
#[derive(Debug, Clone)]
pub struct UplinkHandle {
    state_rx: watch::Receiver<GlobalState>,
    status_rx: watch::Receiver<ConnectionState>,
    boredom_tx: mpsc::Sender<BoredomMessage>,
}

impl UplinkHandle {
    /// Latest backend state (the offline state while disconnected).
    pub fn state(&self) -> GlobalState {
        self.state_rx.borrow().clone()
    }

    pub fn status(&self) -> ConnectionState {
        *self.status_rx.borrow()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<ConnectionState> {
        self.status_rx.clone()
    }

    /// Queue a boredom report. Best effort: dropped unless connected or when the buffer is full.
    pub fn send_boredom(&self, score: f32) -> bool {
        if self.status() != ConnectionState::Connected {
            return false;
        }
        self.boredom_tx.try_send(BoredomMessage::new(score)).is_ok()
    }
}

/// Spawn the uplink task. It connects to `url`, reconnects with `backoff`
/// after every close, and exits when `cancel` fires.
pub fn spawn(
    url: String,
    backoff: Backoff,
    cancel: CancellationToken,
) -> (UplinkHandle, JoinHandle<()>) {
    let (link, state_rx, status_rx) = LinkState::new(backoff);
    let (boredom_tx, boredom_rx) = mpsc::channel(BOREDOM_BUFFER);
    let task = tokio::spawn(run(url, link, boredom_rx, cancel));
    let handle = UplinkHandle {
        state_rx,
        status_rx,
        boredom_tx,
    };
    (handle, task)
}

enum SessionEnd {
    Closed(String),
    Cancelled,
}

async fn run(
    url: String,
    mut link: LinkState,
    mut boredom_rx: mpsc::Receiver<BoredomMessage>,
    cancel: CancellationToken,
) {
    loop {
        if link.attempt() > 0 {
            link.on_retry();
        }
        let connected = tokio::select! {
            _ = cancel.cancelled() => break,
            res = tokio_tungstenite::connect_async(url.as_str()) => res,
        };

        let reason = match connected {
            Ok((ws, _)) => {
                link.on_open();
                // Reports queued while offline describe a stale scene.
                while boredom_rx.try_recv().is_ok() {}
                match session(ws, &mut link, &mut boredom_rx, &cancel).await {
                    SessionEnd::Cancelled => break,
                    SessionEnd::Closed(reason) => reason,
                }
            }
            Err(e) => UplinkError::from(e).to_string(),
        };

        let delay = link.on_close(&reason);
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(delay) => {}
        }
    }
    tracing::info!("uplink task shutting down");
}

async fn session<S>(
    ws: tokio_tungstenite::WebSocketStream<S>,
    link: &mut LinkState,
    boredom_rx: &mut mpsc::Receiver<BoredomMessage>,
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
                    if let Err(e) = link.on_message(text.as_str()) {
                        tracing::warn!(error = %e, "dropping uplink frame");
                    }
                }
                Some(Ok(Message::Close(_))) => return SessionEnd::Closed("closed by peer".into()),
                None => return SessionEnd::Closed("stream ended".into()),
                Some(Ok(_)) => {}
                Some(Err(e)) => return SessionEnd::Closed(format!("read failed: {e}")),
            },
            Some(report) = boredom_rx.recv() => {
                let text = match serde_json::to_string(&report) {
                    Ok(text) => text,
                    Err(e) => {
                        tracing::warn!(error = %e, "failed to encode boredom report");
                        continue;
                    }
                };
                if let Err(e) = sink.send(Message::Text(text.into())).await {
                    return SessionEnd::Closed(format!("write failed: {e}"));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(genre: &str, bpm: f32) -> String {
        serde_json::json!({
            "bpm": bpm,
            "low_energy": 0.5,
            "mid_energy": 0.4,
            "high_energy": 0.3,
            "genre": genre,
            "state": "Groove",
        })
        .to_string()
    }

    #[test]
    fn starts_offline_and_disconnected() {
        let (link, state_rx, status_rx) = LinkState::new(Backoff::default());
        assert!(state_rx.borrow().is_offline());
        assert_eq!(*status_rx.borrow(), ConnectionState::Disconnected);
        assert_eq!(link.attempt(), 0);
    }

    #[test]
    fn message_replaces_state_wholesale() {
        let (mut link, state_rx, _) = LinkState::new(Backoff::default());
        link.on_open();
        link.on_message(&frame("Techno", 128.0)).unwrap();
        assert_eq!(state_rx.borrow().genre, "Techno");
        link.on_message(&frame("Ambient", 70.0)).unwrap();
        let s = state_rx.borrow().clone();
        assert_eq!(s.genre, "Ambient");
        assert_eq!(s.bpm, 70.0);
    }

    #[test]
    fn malformed_frame_keeps_previous_state() {
        let (mut link, state_rx, _) = LinkState::new(Backoff::default());
        link.on_message(&frame("DnB", 174.0)).unwrap();
        assert!(link.on_message("not json").is_err());
        assert!(link.on_message(r#"{"type":"WELCOME","message":"hi"}"#).is_err());
        assert_eq!(state_rx.borrow().genre, "DnB");
    }

    #[test]
    fn close_resets_state_and_backs_off() {
        let (mut link, state_rx, status_rx) = LinkState::new(Backoff::default());
        link.on_open();
        link.on_message(&frame("Dubstep", 140.0)).unwrap();

        let delays: Vec<u64> = (0..5)
            .map(|_| link.on_close("closed by peer").as_millis() as u64)
            .collect();
        assert_eq!(delays, vec![1000, 2000, 4000, 8000, 8000]);
        assert_eq!(*state_rx.borrow(), GlobalState::offline());
        assert_eq!(*status_rx.borrow(), ConnectionState::Disconnected);
    }

    #[test]
    fn close_marks_disconnected_until_retry() {
        let (mut link, _, status_rx) = LinkState::new(Backoff::default());
        link.on_open();
        link.on_close("stream ended");
        assert_eq!(*status_rx.borrow(), ConnectionState::Disconnected);
        link.on_retry();
        assert_eq!(*status_rx.borrow(), ConnectionState::Reconnecting);
        assert_eq!(link.attempt(), 1);
        link.on_open();
        assert_eq!(*status_rx.borrow(), ConnectionState::Connected);
    }

    #[test]
    fn open_resets_attempt_counter() {
        let (mut link, _, status_rx) = LinkState::new(Backoff::default());
        link.on_close("refused");
        link.on_close("refused");
        assert_eq!(link.attempt(), 2);
        link.on_open();
        assert_eq!(link.attempt(), 0);
        assert_eq!(*status_rx.borrow(), ConnectionState::Connected);
        assert_eq!(link.on_close("refused"), Duration::from_millis(1000));
    }

    #[tokio::test]
    async fn boredom_is_dropped_while_offline() {
        let token = CancellationToken::new();
        // Nothing listens on port 9; the task just cycles through backoff.
        let (handle, task) = spawn("ws://127.0.0.1:9/ws".into(), Backoff::default(), token.clone());
        assert!(!handle.send_boredom(0.7));
        assert!(handle.state().is_offline());
        token.cancel();
        task.await.unwrap();
    }
}
