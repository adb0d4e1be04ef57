use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use vibe_core::types::VisualMetrics;

/// Latest visual metrics with the time they were received.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisualSnapshot {
    pub fps: f32,
    pub resolution: String,
    pub timestamp: DateTime<Utc>,
}

impl VisualSnapshot {
    fn new(metrics: VisualMetrics) -> Self {
        Self {
            fps: metrics.fps,
            resolution: metrics.resolution,
            timestamp: Utc::now(),
        }
    }
}

/// Read-mostly cache of the last upstream state and the last visual metrics.
///
/// One instance per gateway, owned by the caller and shared via `Arc`.
#[derive(Debug)]
pub struct StateStore {
    latest: RwLock<Option<Value>>,
    visual: RwLock<VisualSnapshot>,
    started: DateTime<Utc>,
}

impl StateStore {
    pub fn new() -> Self {
        Self {
            latest: RwLock::new(None),
            visual: RwLock::new(VisualSnapshot::new(VisualMetrics::default())),
            started: Utc::now(),
        }
    }

    /// Replace the cached state wholesale.
    pub fn update(&self, state: Value) {
        if let Ok(mut slot) = self.latest.write() {
            *slot = Some(state);
        }
    }

    /// Snapshot of the cached state, `None` until the first frame arrives.
    pub fn latest(&self) -> Option<Value> {
        self.latest.read().ok().and_then(|slot| slot.clone())
    }

    pub fn record_visual(&self, metrics: VisualMetrics) -> VisualSnapshot {
        let snapshot = VisualSnapshot::new(metrics);
        if let Ok(mut slot) = self.visual.write() {
            *slot = snapshot.clone();
        }
        snapshot
    }

    pub fn visual(&self) -> Option<VisualSnapshot> {
        self.visual.read().ok().map(|slot| slot.clone())
    }

    pub fn uptime_secs(&self) -> f64 {
        (Utc::now() - self.started).num_milliseconds() as f64 / 1000.0
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_until_first_update() {
        let store = StateStore::new();
        assert!(store.latest().is_none());
        store.update(json!({"genre": "Techno"}));
        store.update(json!({"genre": "Ambient"}));
        assert_eq!(store.latest(), Some(json!({"genre": "Ambient"})));
    }

    #[test]
    fn independent_instances() {
        let a = StateStore::new();
        let b = StateStore::new();
        a.update(json!({"bpm": 120}));
        assert!(b.latest().is_none());
    }

    #[test]
    fn visual_defaults_then_records() {
        let store = StateStore::new();
        let initial = store.visual().unwrap();
        assert_eq!(initial.fps, 0.0);
        assert_eq!(initial.resolution, "0x0");

        let saved = store.record_visual(VisualMetrics { fps: 59.5, resolution: "1920x1080".into() });
        assert_eq!(store.visual().unwrap(), saved);
    }
}
