use std::collections::HashMap;
use std::sync::Mutex;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use uuid::Uuid;

/// Handle returned to a subscriber connection.
#[derive(Debug)]
pub struct Subscription {
    pub id: Uuid,
    pub rx: mpsc::Receiver<String>,
}

/// Fan-out of text frames to every open downstream subscriber.
///
/// Each subscriber owns a bounded queue drained by its own socket task, so a
/// slow or broken peer never stalls a broadcast.
#[derive(Debug)]
pub struct Hub {
    subscribers: Mutex<HashMap<Uuid, mpsc::Sender<String>>>,
    buffer: usize,
}

impl Hub {
    pub fn new(buffer: usize) -> Self {
        Self {
            subscribers: Mutex::new(HashMap::new()),
            buffer: buffer.max(1),
        }
    }

    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::channel(self.buffer);
        let id = Uuid::new_v4();
        if let Ok(mut subs) = self.subscribers.lock() {
            subs.insert(id, tx);
            tracing::info!(%id, count = subs.len(), "subscriber connected");
        }
        Subscription { id, rx }
    }

    pub fn unsubscribe(&self, id: Uuid) {
        if let Ok(mut subs) = self.subscribers.lock() {
            if subs.remove(&id).is_some() {
                tracing::info!(%id, count = subs.len(), "subscriber disconnected");
            }
        }
    }

    pub fn len(&self) -> usize {
        self.subscribers.lock().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver `text` to every subscriber. Returns the number reached.
    pub fn broadcast(&self, text: &str) -> usize {
        self.fan_out(text, None)
    }

    /// Deliver `text` to every subscriber except `origin`.
    pub fn broadcast_except(&self, origin: Uuid, text: &str) -> usize {
        self.fan_out(text, Some(origin))
    }

    fn fan_out(&self, text: &str, skip: Option<Uuid>) -> usize {
        let Ok(mut subs) = self.subscribers.lock() else {
            return 0;
        };
        let mut delivered = 0;
        let mut closed = Vec::new();
        for (id, tx) in subs.iter() {
            if Some(*id) == skip {
                continue;
            }
            match tx.try_send(text.to_owned()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    tracing::warn!(%id, "subscriber queue full, frame dropped");
                }
                Err(TrySendError::Closed(_)) => closed.push(*id),
            }
        }
        for id in closed {
            subs.remove(&id);
            tracing::debug!(%id, "pruned closed subscriber");
        }
        delivered
    }
}
