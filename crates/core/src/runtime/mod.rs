mod engine;
mod frame_meter;
pub mod host;
mod scheduler;
mod shutdown;

pub use engine::{Engine, Frame};
pub use frame_meter::FrameMeter;
pub use host::{GamepadSource, HostCommand, HostShell, KeyCommand, Overlay, RenderSink};
pub use scheduler::Runtime;
pub use shutdown::ShutdownGuard;
