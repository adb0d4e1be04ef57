use rand::SeedableRng;
use rand::rngs::StdRng;

use super::host::{HostCommand, KeyCommand, Overlay};
use crate::config::EngineCfg;
use crate::control::autopilot::EnergyState;
use crate::control::watchdog::CHAOS_DIRECTIVE;
use crate::control::{Crossfader, EntropyWatchdog, WatchdogCfg};
use crate::input::normalizer::{self, ActionSnapshot, Edges, RawSample};
use crate::input::{Action, ButtonMapping, ConfidenceTracker, RemapSession};
use crate::types::{GlobalState, HybridControlState, InputVector};

/// Result of one render tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub control: HybridControlState,
    /// Boredom score to report upstream, when the throttle allows one.
    pub boredom: Option<f32>,
}

/// The arbitration engine's whole mutable state.
///
/// Both periodic loops call into the same instance from one task, so the
/// shared input vector, confidence and mapping need no locking.
#[derive(Debug)]
pub struct Engine {
    mapping: ButtonMapping,
    remap: RemapSession,
    confidence: ConfidenceTracker,
    prev: ActionSnapshot,
    input: InputVector,
    crossfader: Crossfader,
    watchdog: EntropyWatchdog,
    overlay: Overlay,
    controller_connected: bool,
    started_ms: u64,
    rng: StdRng,
}

impl Engine {
    pub fn new(cfg: &EngineCfg, now_ms: u64) -> Self {
        Self::with_rng(cfg, now_ms, StdRng::from_entropy())
    }

    /// Build with an explicit RNG, for reproducible chaos injections.
    pub fn with_rng(cfg: &EngineCfg, now_ms: u64, rng: StdRng) -> Self {
        let watchdog_cfg = WatchdogCfg {
            boredom_window_ms: cfg.boredom_window_ms,
            report_interval_ms: cfg.boredom_report_ms,
            chaos_window_ms: cfg.chaos_window_ms,
        };
        Self {
            mapping: ButtonMapping::default(),
            remap: RemapSession::new(),
            confidence: ConfidenceTracker::new(cfg.hold_ms, cfg.decay_ms),
            prev: ActionSnapshot::default(),
            input: InputVector::default(),
            crossfader: Crossfader::new(),
            watchdog: EntropyWatchdog::new(watchdog_cfg, now_ms),
            overlay: Overlay::default(),
            controller_connected: false,
            started_ms: now_ms,
            rng,
        }
    }

    pub fn mapping(&self) -> &ButtonMapping {
        &self.mapping
    }

    pub fn remap(&self) -> &RemapSession {
        &self.remap
    }

    pub fn overlay(&self) -> Overlay {
        self.overlay
    }

    pub fn input(&self) -> InputVector {
        self.input
    }

    pub fn confidence(&self) -> f32 {
        self.confidence.value()
    }

    pub fn controller_connected(&self) -> bool {
        self.controller_connected
    }

    pub fn watchdog(&self) -> &EntropyWatchdog {
        &self.watchdog
    }

    pub fn crossfader(&self) -> &Crossfader {
        &self.crossfader
    }

    /// Input-poll tick. `sample` is `None` while no controller is attached.
    /// Returns the host commands triggered by this tick's button edges.
    pub fn poll_input(&mut self, sample: Option<&RawSample>, now_ms: u64) -> Vec<HostCommand> {
        let Some(sample) = sample else {
            if self.controller_connected {
                tracing::info!("controller disconnected");
            }
            self.controller_connected = false;
            self.input = InputVector::default();
            self.prev = ActionSnapshot::default();
            self.confidence.clear();
            self.confidence.update(now_ms);
            return Vec::new();
        };
        if !self.controller_connected {
            tracing::info!(buttons = sample.buttons.len(), "controller connected");
            self.controller_connected = true;
        }

        // Capture runs before normalization so this tick's snapshot already
        // uses the new binding; a held capture button then has no rising edge.
        let outcome = self.remap.poll(&sample.buttons, &mut self.mapping);

        let norm = normalizer::normalize(sample, &self.mapping);
        if norm.activity {
            self.confidence.record_activity(now_ms);
        }
        self.confidence.update(now_ms);

        let edges = Edges::new(self.prev, norm.snapshot);
        self.prev = norm.snapshot;
        self.input = norm.input;

        if outcome.suppresses_dispatch() {
            self.input.glitch = 0.0;
            return Vec::new();
        }
        self.dispatch(&edges)
    }

    fn dispatch(&mut self, edges: &Edges) -> Vec<HostCommand> {
        let mut commands = Vec::new();
        let held = edges.curr;

        self.input.swap = held.is_pressed(Action::Swap);
        self.input.hud = held.is_pressed(Action::HudToggle);
        self.input.chaos = held.is_pressed(Action::Chaos);

        if edges.rising(Action::HudToggle) {
            self.overlay.hud_visible = !self.overlay.hud_visible;
        }
        if edges.rising(Action::ExitModal) {
            self.overlay.exit_modal = !self.overlay.exit_modal;
        }
        if edges.rising(Action::SettingsModal) {
            self.overlay.settings_modal = !self.overlay.settings_modal;
        }

        if self.overlay.exit_modal {
            if edges.confirm_rising() {
                tracing::info!("exit confirmed from controller");
                commands.push(HostCommand::Close);
            }
            if edges.rising(Action::Cancel) {
                self.overlay.exit_modal = false;
            }
        }
        if self.overlay.settings_modal && edges.rising(Action::Cancel) {
            self.close_settings();
        }
        commands
    }

    /// Handle a keyboard shortcut from the host.
    pub fn key(&mut self, key: KeyCommand) -> Option<HostCommand> {
        match key {
            KeyCommand::ToggleHud => {
                self.overlay.hud_visible = !self.overlay.hud_visible;
                None
            }
            KeyCommand::ToggleSettings => {
                self.overlay.settings_modal = !self.overlay.settings_modal;
                None
            }
            KeyCommand::Exit => Some(HostCommand::Close),
            KeyCommand::Fullscreen => Some(HostCommand::Maximize),
            KeyCommand::Minimize => Some(HostCommand::Minimize),
        }
    }

    /// Start (or, for the same action, cancel) capturing a new button for `action`.
    pub fn begin_remap(&mut self, action: Action) {
        self.remap.toggle(action);
    }

    pub fn close_settings(&mut self) {
        self.overlay.settings_modal = false;
        self.remap.cancel();
    }

    pub fn cancel_exit(&mut self) {
        self.overlay.exit_modal = false;
    }

    /// Exit confirmed from the modal's button rather than the controller.
    pub fn confirm_exit(&mut self) -> HostCommand {
        self.overlay.exit_modal = false;
        HostCommand::Close
    }

    /// Render tick: arbitrate autopilot against human input for `state`.
    pub fn render(&mut self, state: &GlobalState, now_ms: u64) -> Frame {
        if state.ai_directive == CHAOS_DIRECTIVE {
            self.watchdog.inject_chaos(now_ms, &mut self.crossfader, &mut self.rng);
        }
        self.watchdog.tick(now_ms);

        let confidence = self.confidence.update(now_ms);
        let t = now_ms.saturating_sub(self.started_ms) as f64 / 1000.0;
        let energy = EnergyState::from(state);
        let input = self.watchdog.apply_override(self.input);
        let control = self.crossfader.tick(&state.genre, t, &energy, &input, confidence);

        let boredom = self.watchdog.observe(
            now_ms,
            self.crossfader.smoothed(),
            confidence,
            self.controller_connected,
        );
        Frame { control, boredom }
    }

    /// Stop pending deferred work; nothing fires after this.
    pub fn shutdown(&mut self) {
        self.watchdog.cancel();
        self.remap.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ControlMode;

    fn engine() -> Engine {
        Engine::with_rng(&EngineCfg::default(), 0, StdRng::seed_from_u64(42))
    }

    fn sample(pressed: &[usize]) -> RawSample {
        let mut buttons = vec![false; 17];
        for &i in pressed {
            buttons[i] = true;
        }
        RawSample { buttons, ..RawSample::default() }
    }

    fn stick(x: f32) -> RawSample {
        RawSample { left_x: x, buttons: vec![false; 17], ..RawSample::default() }
    }

    #[test]
    fn activity_raises_confidence_and_switches_to_manual() {
        let mut e = engine();
        let state = GlobalState::offline();
        assert_eq!(e.render(&state, 0).control.mode, ControlMode::Autopilot);

        e.poll_input(Some(&stick(0.8)), 100);
        assert_eq!(e.confidence(), 1.0);
        assert_eq!(e.render(&state, 116).control.mode, ControlMode::Manual);

        // Stick released: hold then decay back to autopilot.
        e.poll_input(Some(&stick(0.0)), 200);
        e.poll_input(Some(&stick(0.0)), 6100);
        assert_eq!(e.confidence(), 0.5);
        e.poll_input(Some(&stick(0.0)), 7100);
        assert_eq!(e.confidence(), 0.0);
        assert_eq!(e.render(&state, 7116).control.mode, ControlMode::Autopilot);
    }

    #[test]
    fn hud_toggles_on_press_not_hold() {
        let mut e = engine();
        for t in 0..5 {
            e.poll_input(Some(&sample(&[12])), t * 16);
        }
        assert!(e.overlay().hud_visible);
        e.poll_input(Some(&sample(&[])), 100);
        e.poll_input(Some(&sample(&[12])), 116);
        assert!(!e.overlay().hud_visible);
    }

    #[test]
    fn exit_modal_confirm_closes_host() {
        let mut e = engine();
        assert!(e.poll_input(Some(&sample(&[9])), 0).is_empty());
        assert!(e.overlay().exit_modal);
        e.poll_input(Some(&sample(&[])), 16);
        assert_eq!(e.poll_input(Some(&sample(&[0])), 32), vec![HostCommand::Close]);
        // Holding confirm does not repeat.
        assert!(e.poll_input(Some(&sample(&[0])), 48).is_empty());
    }

    #[test]
    fn exit_modal_cancel_closes_modal() {
        let mut e = engine();
        e.poll_input(Some(&sample(&[9])), 0);
        e.poll_input(Some(&sample(&[1])), 16);
        assert!(!e.overlay().exit_modal);
    }

    #[test]
    fn confirm_outside_exit_modal_does_nothing() {
        let mut e = engine();
        assert!(e.poll_input(Some(&sample(&[0])), 0).is_empty());
    }

    #[test]
    fn settings_cancel_aborts_remap() {
        let mut e = engine();
        e.poll_input(Some(&sample(&[8])), 0);
        assert!(e.overlay().settings_modal);
        e.begin_remap(Action::Swap);
        e.close_settings();
        assert!(!e.overlay().settings_modal);
        assert_eq!(e.remap().state(), crate::input::remap::RemapState::Idle);

        e.poll_input(Some(&sample(&[])), 16);
        e.poll_input(Some(&sample(&[8])), 32);
        e.poll_input(Some(&sample(&[1])), 48);
        assert!(!e.overlay().settings_modal);
    }

    #[test]
    fn remap_capture_suppresses_dispatch() {
        let mut e = engine();
        e.begin_remap(Action::HudToggle);
        // Button 9 is EXIT_MODAL by default; captured, it must not open the modal.
        assert!(e.poll_input(Some(&sample(&[9])), 0).is_empty());
        assert!(!e.overlay().exit_modal);
        assert_eq!(e.mapping().index(Action::HudToggle), 9);

        // Still held on the next tick: no rising edge for the new binding either.
        e.poll_input(Some(&sample(&[9])), 16);
        assert!(!e.overlay().hud_visible);

        e.poll_input(Some(&sample(&[])), 32);
        e.poll_input(Some(&sample(&[9])), 48);
        assert!(e.overlay().hud_visible);
    }

    #[test]
    fn waiting_capture_suppresses_glitch() {
        let mut e = engine();
        e.begin_remap(Action::Chaos);
        e.poll_input(Some(&stick(0.5)), 0);
        assert_eq!(e.input().glitch, 0.0);
        assert!(e.input().orbital_x > 0.0);
    }

    #[test]
    fn disconnect_zeroes_input_and_history() {
        let mut e = engine();
        e.poll_input(Some(&stick(1.0)), 0);
        assert!(e.controller_connected());
        e.poll_input(None, 16);
        assert!(!e.controller_connected());
        assert_eq!(e.input(), InputVector::default());
        assert_eq!(e.confidence(), 0.0);

        let frame = e.render(&GlobalState::offline(), 32);
        assert_eq!(frame.control.mode, ControlMode::Autopilot);
        assert_eq!(frame.control.confidence, 0.0);
        assert_eq!(e.render(&GlobalState::offline(), 4000).control.mode, ControlMode::Autopilot);
    }

    #[test]
    fn connected_controller_keeps_boredom_at_zero() {
        let mut e = engine();
        let state = GlobalState::offline();
        e.poll_input(Some(&sample(&[])), 0);
        let frame = e.render(&state, 20_000);
        assert_eq!(frame.boredom, Some(0.0));
    }

    #[test]
    fn chaos_directive_cuts_and_releases() {
        let mut e = engine();
        let mut state = GlobalState::offline();
        state.ai_directive = CHAOS_DIRECTIVE.into();
        e.render(&state, 1000);
        assert!(e.watchdog().chaos_active());
        // Override never counts as human activity.
        assert_eq!(e.confidence(), 0.0);

        state.ai_directive = "HOLD".into();
        e.render(&state, 1500);
        assert!(e.watchdog().chaos_active());
        e.render(&state, 1800);
        assert!(!e.watchdog().chaos_active());
    }

    #[test]
    fn keyboard_shortcuts() {
        let mut e = engine();
        assert_eq!(e.key(KeyCommand::ToggleHud), None);
        assert!(e.overlay().hud_visible);
        e.key(KeyCommand::ToggleSettings);
        assert!(e.overlay().settings_modal);
        assert_eq!(e.key(KeyCommand::Exit), Some(HostCommand::Close));
        assert_eq!(e.key(KeyCommand::Fullscreen), Some(HostCommand::Maximize));
        assert_eq!(e.key(KeyCommand::Minimize), Some(HostCommand::Minimize));
    }
}
