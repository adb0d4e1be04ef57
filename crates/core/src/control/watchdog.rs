//! Entropy watchdog: flags a visually static autopilot and runs chaos injections.

use rand::Rng;

use super::crossfader::{Crossfader, Position};
use crate::timer::Deadline;
use crate::types::InputVector;

/// Smoothed-position travel that counts as significant movement.
pub const MOVEMENT_THRESHOLD: f32 = 0.5;
/// Confidence above which a human is considered present.
pub const PRESENCE_CONFIDENCE: f32 = 0.1;
/// Directive label that requests a chaos injection.
pub const CHAOS_DIRECTIVE: &str = "CHAOS_INJECTION";

/// Watchdog timing parameters.
#[derive(Debug, Clone, Copy)]
pub struct WatchdogCfg {
    pub boredom_window_ms: u64,
    pub report_interval_ms: u64,
    pub chaos_window_ms: u64,
}

impl Default for WatchdogCfg {
    fn default() -> Self {
        Self {
            boredom_window_ms: 12_000,
            report_interval_ms: 1000,
            chaos_window_ms: 800,
        }
    }
}

#[derive(Debug)]
pub struct EntropyWatchdog {
    cfg: WatchdogCfg,
    reference: Position,
    last_movement_ms: u64,
    last_report_ms: Option<u64>,
    score: f32,
    chaos_active: bool,
    chaos_release: Deadline,
}

impl EntropyWatchdog {
    pub fn new(cfg: WatchdogCfg, now_ms: u64) -> Self {
        Self {
            cfg,
            reference: Position::new(0.0, 0.0, 0.0),
            last_movement_ms: now_ms,
            last_report_ms: None,
            score: 0.0,
            chaos_active: false,
            chaos_release: Deadline::new(),
        }
    }

    /// Last computed boredom score.
    pub fn score(&self) -> f32 {
        self.score
    }

    pub fn chaos_active(&self) -> bool {
        self.chaos_active
    }

    /// Evaluate staleness of `smoothed` at `now_ms`.
    /// Returns the score when a report is due (at most once per report interval).
    pub fn observe(
        &mut self,
        now_ms: u64,
        smoothed: Position,
        confidence: f32,
        controller_connected: bool,
    ) -> Option<f32> {
        self.score = if confidence > PRESENCE_CONFIDENCE || controller_connected {
            self.last_movement_ms = now_ms;
            0.0
        } else if smoothed.distance(&self.reference) > MOVEMENT_THRESHOLD {
            self.last_movement_ms = now_ms;
            self.reference = smoothed;
            0.0
        } else {
            let elapsed = now_ms.saturating_sub(self.last_movement_ms);
            (elapsed as f64 / self.cfg.boredom_window_ms.max(1) as f64).min(1.0) as f32
        };
        self.report(now_ms)
    }

    fn report(&mut self, now_ms: u64) -> Option<f32> {
        let due = match self.last_report_ms {
            Some(last) => now_ms.saturating_sub(last) >= self.cfg.report_interval_ms,
            None => true,
        };
        if !due {
            return None;
        }
        self.last_report_ms = Some(now_ms);
        Some(self.score)
    }

    /// Start a chaos injection: hard-cut the autopilot to a random point and
    /// force glitch/blow-out until the window elapses. Ignored while one is running.
    pub fn inject_chaos<R: Rng>(&mut self, now_ms: u64, xf: &mut Crossfader, rng: &mut R) -> bool {
        if self.chaos_active {
            return false;
        }
        let target = Position::new(
            rng.gen_range(-4.0_f32..4.0),
            rng.gen_range(-3.0_f32..3.0),
            -2.0 - rng.gen_range(0.0_f32..6.0),
        );
        xf.cut_to(target);
        self.chaos_active = true;
        self.chaos_release.arm(now_ms, self.cfg.chaos_window_ms);
        tracing::info!(x = target.x, y = target.y, z = target.z, "chaos injection started");
        true
    }

    /// Release an expired injection. Call once per tick.
    pub fn tick(&mut self, now_ms: u64) {
        if self.chaos_release.fire(now_ms) {
            self.chaos_active = false;
            self.last_movement_ms = now_ms;
            tracing::debug!("chaos injection released");
        }
    }

    /// Apply the injection override to `input` without touching confidence.
    pub fn apply_override(&self, mut input: InputVector) -> InputVector {
        if self.chaos_active {
            input.glitch = 1.0;
            input.int_blow = 1.0;
        }
        input
    }

    /// Drop any pending release; used at shutdown.
    pub fn cancel(&mut self) {
        self.chaos_release.cancel();
        self.chaos_active = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn still() -> Position {
        Position::new(0.1, 0.0, 0.0)
    }

    #[test]
    fn boredom_reaches_one_after_window() {
        let mut w = EntropyWatchdog::new(WatchdogCfg::default(), 0);
        w.observe(0, still(), 0.0, false);
        w.observe(6000, still(), 0.0, false);
        assert_eq!(w.score(), 0.5);
        w.observe(12_000, still(), 0.0, false);
        assert_eq!(w.score(), 1.0);
        w.observe(30_000, still(), 0.0, false);
        assert_eq!(w.score(), 1.0);
    }

    #[test]
    fn movement_resets_on_next_tick() {
        let mut w = EntropyWatchdog::new(WatchdogCfg::default(), 0);
        w.observe(12_000, still(), 0.0, false);
        assert_eq!(w.score(), 1.0);
        w.observe(12_016, Position::new(0.7, 0.0, 0.0), 0.0, false);
        assert_eq!(w.score(), 0.0);
        // The new position is the reference; staying there accumulates again.
        w.observe(18_016, Position::new(0.7, 0.0, 0.0), 0.0, false);
        assert_eq!(w.score(), 0.5);
    }

    #[test]
    fn human_presence_zeroes_score() {
        let mut w = EntropyWatchdog::new(WatchdogCfg::default(), 0);
        w.observe(11_000, still(), 0.5, false);
        assert_eq!(w.score(), 0.0);
        w.observe(12_000, still(), 0.0, true);
        assert_eq!(w.score(), 0.0);
        w.observe(18_000, still(), 0.0, false);
        assert_eq!(w.score(), 0.5);
    }

    #[test]
    fn reports_are_throttled_to_interval() {
        let mut w = EntropyWatchdog::new(WatchdogCfg::default(), 0);
        assert!(w.observe(0, still(), 0.0, false).is_some());
        let reports = (1..=60)
            .filter_map(|i| w.observe(i * 16, still(), 0.0, false))
            .count();
        assert_eq!(reports, 0);
        assert!(w.observe(1000, still(), 0.0, false).is_some());
        assert!(w.observe(1016, still(), 0.0, false).is_none());
    }

    #[test]
    fn chaos_injection_is_one_shot() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut xf = Crossfader::new();
        let mut w = EntropyWatchdog::new(WatchdogCfg::default(), 0);

        assert!(w.inject_chaos(1000, &mut xf, &mut rng));
        let cut = xf.smoothed();
        assert!((-4.0..4.0).contains(&cut.x));
        assert!((-3.0..3.0).contains(&cut.y));
        assert!(cut.z <= -2.0 && cut.z > -8.0);

        // Re-entry is ignored while active.
        assert!(!w.inject_chaos(1100, &mut xf, &mut rng));
        assert_eq!(xf.smoothed(), cut);

        let forced = w.apply_override(InputVector::default());
        assert_eq!(forced.glitch, 1.0);
        assert_eq!(forced.int_blow, 1.0);

        w.tick(1799);
        assert!(w.chaos_active());
        w.tick(1800);
        assert!(!w.chaos_active());
        assert_eq!(w.apply_override(InputVector::default()), InputVector::default());

        // Release counts as movement.
        w.observe(1800, xf.smoothed(), 0.0, false);
        assert_eq!(w.score(), 0.0);
    }

    #[test]
    fn cancel_drops_pending_release() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut xf = Crossfader::new();
        let mut w = EntropyWatchdog::new(WatchdogCfg::default(), 0);
        w.inject_chaos(0, &mut xf, &mut rng);
        w.cancel();
        assert!(!w.chaos_active());
        w.tick(10_000);
        assert!(!w.chaos_active());
    }
}
