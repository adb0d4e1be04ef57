/// A cancellable one-shot deadline on the engine's monotonic millisecond clock.
///
/// The owner polls [`Deadline::fire`] from its tick; once fired or cancelled it
/// stays inert until re-armed, so nothing can run after teardown cancels it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Deadline {
    at_ms: Option<u64>,
}

impl Deadline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm (or re-arm) to fire `delay_ms` after `now_ms`, replacing any pending deadline.
    pub fn arm(&mut self, now_ms: u64, delay_ms: u64) {
        self.at_ms = Some(now_ms.saturating_add(delay_ms));
    }

    pub fn cancel(&mut self) {
        self.at_ms = None;
    }

    pub fn is_armed(&self) -> bool {
        self.at_ms.is_some()
    }

    /// Returns true exactly once when `now_ms` reaches the deadline, then disarms.
    pub fn fire(&mut self, now_ms: u64) -> bool {
        match self.at_ms {
            Some(at) if now_ms >= at => {
                self.at_ms = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_once() {
        let mut d = Deadline::new();
        d.arm(100, 800);
        assert!(!d.fire(899));
        assert!(d.fire(900));
        assert!(!d.fire(901));
        assert!(!d.is_armed());
    }

    #[test]
    fn cancel_prevents_firing() {
        let mut d = Deadline::new();
        d.arm(0, 10);
        d.cancel();
        assert!(!d.fire(1_000));
    }

    #[test]
    fn rearm_replaces_pending() {
        let mut d = Deadline::new();
        d.arm(0, 10);
        d.arm(5, 100);
        assert!(!d.fire(50));
        assert!(d.fire(105));
    }
}
