use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::engine::Engine;
use super::frame_meter::FrameMeter;
use super::host::{GamepadSource, HostShell, KeyCommand, RenderSink};
use super::shutdown::ShutdownGuard;
use crate::config::EngineCfg;
use crate::types::{ConnectionState, VisualMetrics};
use crate::uplink::telemetry::TelemetryReporter;
use crate::uplink::{self, Backoff, UplinkHandle};

/// Drives the input-poll and render loops on one task, alongside the
/// uplink and telemetry background tasks.
pub struct Runtime {
    cfg: EngineCfg,
    shutdown: ShutdownGuard,
    engine: Engine,
    gamepad: Box<dyn GamepadSource>,
    sink: Box<dyn RenderSink>,
    shell: Box<dyn HostShell>,
    key_rx: mpsc::Receiver<KeyCommand>,
    meter: FrameMeter,
    clock: Instant,
    frame_count: u64,
}

impl Runtime {
    /// Create a runtime. Send keyboard shortcuts into the returned sender.
    pub fn new(
        cfg: EngineCfg,
        shutdown: ShutdownGuard,
        gamepad: Box<dyn GamepadSource>,
        sink: Box<dyn RenderSink>,
        shell: Box<dyn HostShell>,
    ) -> (Self, mpsc::Sender<KeyCommand>) {
        let (key_tx, key_rx) = mpsc::channel(16);
        let runtime = Self {
            engine: Engine::new(&cfg, 0),
            cfg,
            shutdown,
            gamepad,
            sink,
            shell,
            key_rx,
            meter: FrameMeter::new(),
            clock: Instant::now(),
            frame_count: 0,
        };
        (runtime, key_tx)
    }

    /// Returns the cancellation token for spawning child tasks.
    pub fn token(&self) -> CancellationToken {
        self.shutdown.token()
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    fn now_ms(&self) -> u64 {
        self.clock.elapsed().as_millis() as u64
    }

    /// Run until the token is cancelled, then tear down every background task.
    pub async fn run(&mut self) {
        let token = self.shutdown.token();
        let backoff = Backoff::new(self.cfg.reconnect_base_ms, self.cfg.reconnect_max_ms);
        let (link, uplink_task) = uplink::client::spawn(
            self.cfg.gateway_ws_url.clone(),
            backoff,
            token.child_token(),
        );

        let (metrics_tx, metrics_rx) = watch::channel(VisualMetrics::default());
        let telemetry_task = TelemetryReporter::new(self.cfg.telemetry_url.clone()).spawn(
            self.cfg.telemetry_interval_ms,
            metrics_rx,
            token.child_token(),
        );

        let mut input_tick = tokio::time::interval(Duration::from_millis(self.cfg.input_poll_ms));
        input_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut frame_tick = tokio::time::interval(Duration::from_millis(self.cfg.frame_ms));
        frame_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut status_rx = link.subscribe_status();

        tracing::info!(url = %self.cfg.gateway_ws_url, "arbitration engine started");

        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    tracing::info!(frames = self.frame_count, "shutdown signal received, exiting loops");
                    break;
                }
                _ = input_tick.tick() => self.input_tick(),
                _ = frame_tick.tick() => self.frame_tick(&link, &metrics_tx),
                Some(key) = self.key_rx.recv() => {
                    if let Some(cmd) = self.engine.key(key) {
                        self.shell.dispatch(cmd);
                    }
                }
                Ok(()) = status_rx.changed() => {
                    let status = *status_rx.borrow_and_update();
                    if status == ConnectionState::Connected {
                        tracing::info!(%status, "uplink status changed");
                    } else {
                        tracing::warn!(%status, "uplink status changed");
                    }
                }
            }
        }

        self.engine.shutdown();
        let grace = Duration::from_secs(self.cfg.shutdown_timeout_secs);
        for (name, task) in [("uplink", uplink_task), ("telemetry", telemetry_task)] {
            match tokio::time::timeout(grace, task).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::warn!(task = name, error = %e, "background task failed"),
                Err(_) => tracing::warn!(task = name, "background task did not stop in time"),
            }
        }
        tracing::info!("arbitration engine stopped");
    }

    fn input_tick(&mut self) {
        let now = self.now_ms();
        let sample = self.gamepad.poll();
        for cmd in self.engine.poll_input(sample.as_ref(), now) {
            self.shell.dispatch(cmd);
        }
    }

    fn frame_tick(&mut self, link: &UplinkHandle, metrics_tx: &watch::Sender<VisualMetrics>) {
        let now = self.now_ms();
        let state = link.state();
        let frame = self.engine.render(&state, now);
        self.sink.submit(&frame.control);
        self.frame_count += 1;

        if let Some(score) = frame.boredom {
            link.send_boredom(score);
        }

        self.meter.record(now);
        metrics_tx.send_replace(VisualMetrics {
            fps: self.meter.fps(),
            resolution: self.sink.resolution(),
        });
    }
}
