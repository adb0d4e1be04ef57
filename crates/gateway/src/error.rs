/// Error type for gateway operations.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("invalid bind address: {0}")]
    Address(#[from] std::net::AddrParseError),
    #[error("failed to bind listener: {0}")]
    Bind(std::io::Error),
    #[error("server error: {0}")]
    Serve(std::io::Error),
    #[error("upstream connect failed: {0}")]
    Upstream(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("malformed upstream frame: {0}")]
    Malformed(#[from] serde_json::Error),
}
