use std::collections::VecDeque;

/// Frames per second over a rolling one-second window.
#[derive(Debug, Default)]
pub struct FrameMeter {
    stamps: VecDeque<u64>,
}

const WINDOW_MS: u64 = 1000;

impl FrameMeter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a presented frame at `now_ms`.
    pub fn record(&mut self, now_ms: u64) {
        self.stamps.push_back(now_ms);
        while let Some(&front) = self.stamps.front() {
            if now_ms.saturating_sub(front) < WINDOW_MS {
                break;
            }
            self.stamps.pop_front();
        }
    }

    pub fn fps(&self) -> f32 {
        self.stamps.len() as f32
    }
}
