use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// All engine parameters. Loaded from `VIBE_*` environment variables at startup;
/// any missing or unparseable key falls back to its default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineCfg {
    // endpoints
    pub gateway_ws_url: String,
    pub telemetry_url: String,

    // uplink backoff (ms)
    pub reconnect_base_ms: u64,
    pub reconnect_max_ms: u64,

    // confidence
    pub hold_ms: u64,
    pub decay_ms: u64,

    // entropy watchdog
    pub boredom_window_ms: u64,
    pub boredom_report_ms: u64,
    pub chaos_window_ms: u64,

    // loop periods (ms)
    pub frame_ms: u64,
    pub input_poll_ms: u64,
    pub telemetry_interval_ms: u64,

    // shutdown
    pub shutdown_timeout_secs: u64,
}

impl Default for EngineCfg {
    fn default() -> Self {
        Self {
            gateway_ws_url: "ws://localhost:3001/ws".into(),
            telemetry_url: "http://localhost:3001/api/v1/telemetry/visual".into(),
            reconnect_base_ms: 1000,
            reconnect_max_ms: 8000,
            hold_ms: 5000,
            decay_ms: 2000,
            boredom_window_ms: 12_000,
            boredom_report_ms: 1000,
            chaos_window_ms: 800,
            frame_ms: 16,
            input_poll_ms: 16,
            telemetry_interval_ms: 2000,
            shutdown_timeout_secs: 5,
        }
    }
}

impl EngineCfg {
    /// Load config from the process environment.
    pub fn from_env() -> Self {
        let map: HashMap<String, String> = std::env::vars().collect();
        Self::from_map(&map)
    }

    pub fn from_map(m: &HashMap<String, String>) -> Self {
        let d = Self::default();
        Self {
            gateway_ws_url: get_or(m, "VIBE_GATEWAY_WS_URL", d.gateway_ws_url),
            telemetry_url: get_or(m, "VIBE_TELEMETRY_URL", d.telemetry_url),
            reconnect_base_ms: get_or(m, "VIBE_RECONNECT_BASE_MS", d.reconnect_base_ms),
            reconnect_max_ms: get_or(m, "VIBE_RECONNECT_MAX_MS", d.reconnect_max_ms),
            hold_ms: get_or(m, "VIBE_HOLD_MS", d.hold_ms),
            decay_ms: get_or(m, "VIBE_DECAY_MS", d.decay_ms).max(1),
            boredom_window_ms: get_or(m, "VIBE_BOREDOM_WINDOW_MS", d.boredom_window_ms).max(1),
            boredom_report_ms: get_or(m, "VIBE_BOREDOM_REPORT_MS", d.boredom_report_ms),
            chaos_window_ms: get_or(m, "VIBE_CHAOS_WINDOW_MS", d.chaos_window_ms),
            frame_ms: get_or(m, "VIBE_FRAME_MS", d.frame_ms).max(1),
            input_poll_ms: get_or(m, "VIBE_INPUT_POLL_MS", d.input_poll_ms).max(1),
            telemetry_interval_ms: get_or(m, "VIBE_TELEMETRY_INTERVAL_MS", d.telemetry_interval_ms).max(1),
            shutdown_timeout_secs: get_or(m, "VIBE_SHUTDOWN_TIMEOUT_SECS", d.shutdown_timeout_secs),
        }
    }
}

/// Parse `key` from the map, falling back to `default` when absent or invalid.
pub fn get_or<T: std::str::FromStr>(map: &HashMap<String, String>, key: &str, default: T) -> T {
    map.get(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
