pub mod autopilot;
pub mod crossfader;
pub mod watchdog;

pub use autopilot::{AutopilotTarget, EnergyState, GenreProfile};
pub use crossfader::{Crossfader, Position};
pub use watchdog::{EntropyWatchdog, WatchdogCfg};
