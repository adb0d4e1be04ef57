use std::time::Duration;

/// Exponential reconnect delay: `min(base * 2^attempt, max)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub base_ms: u64,
    pub max_ms: u64,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            base_ms: 1000,
            max_ms: 8000,
        }
    }
}

impl Backoff {
    pub fn new(base_ms: u64, max_ms: u64) -> Self {
        Self { base_ms, max_ms }
    }

    pub fn delay_ms(&self, attempt: u32) -> u64 {
        let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
        self.base_ms.saturating_mul(factor).min(self.max_ms)
    }

    pub fn delay(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.delay_ms(attempt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doubles_then_caps() {
        let b = Backoff::default();
        let seq: Vec<u64> = (0..6).map(|a| b.delay_ms(a)).collect();
        assert_eq!(seq, vec![1000, 2000, 4000, 8000, 8000, 8000]);
    }

    #[test]
    fn huge_attempt_does_not_overflow() {
        let b = Backoff::default();
        assert_eq!(b.delay_ms(64), 8000);
        assert_eq!(b.delay_ms(u32::MAX), 8000);
        assert_eq!(b.delay(2), Duration::from_millis(4000));
    }
}
