pub mod backoff;
pub mod client;
pub mod telemetry;

pub use backoff::Backoff;
pub use client::{LinkState, UplinkHandle};

/// Error type for uplink operations.
#[derive(Debug, thiserror::Error)]
pub enum UplinkError {
    #[error("connect failed: {0}")]
    Connect(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("malformed state frame: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("telemetry post failed: {0}")]
    Telemetry(#[from] reqwest::Error),
}
