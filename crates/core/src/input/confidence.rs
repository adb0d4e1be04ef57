/// Trust in live human input: 1 on activity, held for `hold_ms`,
/// then decayed linearly to 0 over `decay_ms`.
#[derive(Debug, Clone)]
pub struct ConfidenceTracker {
    value: f32,
    last_activity_ms: Option<u64>,
    hold_ms: u64,
    decay_ms: u64,
}

impl ConfidenceTracker {
    pub fn new(hold_ms: u64, decay_ms: u64) -> Self {
        Self {
            value: 0.0,
            last_activity_ms: None,
            hold_ms,
            decay_ms: decay_ms.max(1),
        }
    }

    /// Register qualifying activity at `now_ms`.
    pub fn record_activity(&mut self, now_ms: u64) {
        self.last_activity_ms = Some(now_ms);
        self.value = 1.0;
    }

    /// Forget the last activity so confidence drops to 0 on the next update.
    pub fn clear(&mut self) {
        self.last_activity_ms = None;
        self.value = 0.0;
    }

    /// Advance to `now_ms` and return the current value.
    pub fn update(&mut self, now_ms: u64) -> f32 {
        self.value = match self.last_activity_ms {
            Some(at) => confidence_at(now_ms.saturating_sub(at), self.hold_ms, self.decay_ms),
            None => 0.0,
        };
        self.value
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn last_activity_ms(&self) -> Option<u64> {
        self.last_activity_ms
    }
}

/// Confidence `elapsed_ms` after the last activity.
pub fn confidence_at(elapsed_ms: u64, hold_ms: u64, decay_ms: u64) -> f32 {
    if elapsed_ms <= hold_ms {
        return 1.0;
    }
    let progress = (elapsed_ms - hold_ms) as f64 / decay_ms.max(1) as f64;
    (1.0 - progress).max(0.0) as f32
}
