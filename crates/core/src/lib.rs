pub mod config;
pub mod control;
pub mod input;
pub mod runtime;
pub mod timer;
pub mod types;
pub mod uplink;
