use std::collections::HashMap;
use std::net::SocketAddr;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use vibe_core::config::get_or;

/// Deployment environment, from `VIBE_ENV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
    Test,
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            "test" => Ok(Self::Test),
            other => Err(format!("unknown environment: {other}")),
        }
    }
}

/// Gateway parameters, loaded from the environment at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayCfg {
    pub bind_host: String,
    pub port: u16,
    pub backend_url: String,
    pub upstream_retry_ms: u64,
    pub env: Environment,
    pub enable_mocks: bool,
    pub subscriber_buffer: usize,
    pub mock_interval_ms: u64,
}

impl Default for GatewayCfg {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".into(),
            port: 3001,
            backend_url: "ws://127.0.0.1:3000/ws".into(),
            upstream_retry_ms: 5000,
            env: Environment::Development,
            enable_mocks: false,
            subscriber_buffer: 64,
            mock_interval_ms: 2000,
        }
    }
}

impl GatewayCfg {
    pub fn from_env() -> Self {
        let map: HashMap<String, String> = std::env::vars().collect();
        Self::from_map(&map)
    }

    pub fn from_map(m: &HashMap<String, String>) -> Self {
        let d = Self::default();
        Self {
            bind_host: get_or(m, "VIBE_BIND_HOST", d.bind_host),
            port: get_or(m, "PORT", d.port),
            backend_url: get_or(m, "BACKEND_URL", d.backend_url),
            upstream_retry_ms: get_or(m, "VIBE_UPSTREAM_RETRY_MS", d.upstream_retry_ms).max(1),
            env: get_or(m, "VIBE_ENV", d.env),
            enable_mocks: get_or(m, "ENABLE_MOCKS", d.enable_mocks),
            subscriber_buffer: get_or(m, "VIBE_SUBSCRIBER_BUFFER", d.subscriber_buffer).max(1),
            mock_interval_ms: get_or(m, "VIBE_MOCK_INTERVAL_MS", d.mock_interval_ms).max(1),
        }
    }

    /// The synthetic feed is strictly opt-in and never runs outside development.
    pub fn mocks_allowed(&self) -> bool {
        self.env == Environment::Development && self.enable_mocks
    }

    pub fn is_production(&self) -> bool {
        self.env == Environment::Production
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.bind_host, self.port).parse()
    }
}
