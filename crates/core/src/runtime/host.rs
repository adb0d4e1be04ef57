use crate::input::RawSample;
use crate::types::HybridControlState;

/// Window actions the engine requests from the host shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostCommand {
    Close,
    Minimize,
    Maximize,
}

/// Keyboard shortcuts forwarded by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCommand {
    ToggleHud,
    ToggleSettings,
    /// Escape: leave immediately.
    Exit,
    Fullscreen,
    Minimize,
}

/// Window lifecycle owned by the host. Calls are fire-and-forget.
pub trait HostShell: Send {
    fn close(&mut self);
    fn minimize(&mut self);
    fn maximize(&mut self);

    fn dispatch(&mut self, cmd: HostCommand) {
        match cmd {
            HostCommand::Close => self.close(),
            HostCommand::Minimize => self.minimize(),
            HostCommand::Maximize => self.maximize(),
        }
    }
}

/// Receives one control snapshot per render tick.
pub trait RenderSink: Send {
    fn submit(&mut self, state: &HybridControlState);

    /// Current output size as `WIDTHxHEIGHT`.
    fn resolution(&self) -> String {
        "0x0".into()
    }
}

/// Controller device layer. `None` means no controller is attached.
pub trait GamepadSource: Send {
    fn poll(&mut self) -> Option<RawSample>;
}

/// Overlay UI flags driven by edge-triggered actions and shortcuts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Overlay {
    pub hud_visible: bool,
    pub exit_modal: bool,
    pub settings_modal: bool,
}

/// Host shell with no window: logs requests, and `close` fires the shutdown token.
#[derive(Debug)]
pub struct HeadlessShell {
    token: tokio_util::sync::CancellationToken,
}

impl HeadlessShell {
    pub fn new(token: tokio_util::sync::CancellationToken) -> Self {
        Self { token }
    }
}

impl HostShell for HeadlessShell {
    fn close(&mut self) {
        tracing::info!("close requested by host command");
        self.token.cancel();
    }

    fn minimize(&mut self) {
        tracing::debug!("minimize ignored without a window");
    }

    fn maximize(&mut self) {
        tracing::debug!("maximize ignored without a window");
    }
}

/// Render sink that traces every control state.
#[derive(Debug, Default)]
pub struct TraceSink;

impl RenderSink for TraceSink {
    fn submit(&mut self, state: &HybridControlState) {
        tracing::trace!(
            cam_x = state.cam_x,
            cam_y = state.cam_y,
            cam_z = state.cam_z,
            intensity = state.intensity,
            glitch = state.glitch,
            mode = ?state.mode,
            "frame"
        );
    }
}

/// Gamepad source for installations without a controller.
#[derive(Debug, Default)]
pub struct NoGamepad;

impl GamepadSource for NoGamepad {
    fn poll(&mut self) -> Option<RawSample> {
        None
    }
}
