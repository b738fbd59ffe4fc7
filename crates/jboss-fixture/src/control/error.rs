//! Error types for management console calls.

use jboss_config::EndpointError;
use thiserror::Error;

/// Errors raised while talking to the management console.
#[derive(Debug, Error)]
pub enum ControlError {
    #[error("invalid management request: {reason}")]
    InvalidRequest { reason: &'static str },
    #[error("failed to resolve management endpoint: {source}")]
    Endpoint {
        #[from]
        source: EndpointError,
    },
    #[error("failed to build management HTTP client: {source}")]
    Client {
        #[source]
        source: reqwest::Error,
    },
    #[error("management call to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("management console at {url} answered HTTP {status}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },
}

impl ControlError {
    /// Returns true when the call failed at the network or HTTP status level,
    /// as opposed to a request that was never sent.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Status { .. })
    }
}
