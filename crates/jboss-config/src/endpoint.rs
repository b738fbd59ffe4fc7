//! Location of the server's management console.

use std::fmt;

use thiserror::Error;
use url::Url;

/// Path of the JMX console adaptor servlet on the management port.
pub const CONSOLE_PATH: &str = "/jmx-console/HtmlAdaptor";

/// Host and port of the HTTP management interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagementEndpoint {
    host: String,
    port: u16,
}

impl ManagementEndpoint {
    /// Builds an endpoint from a host name (or IP literal) and port.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Host name or IP literal.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// TCP port of the console.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Resolves the URL that management requests are posted to.
    pub fn console_url(&self) -> Result<Url, EndpointError> {
        let base = self.to_string();
        let parsed = Url::parse(&base).map_err(|source| EndpointError::InvalidHost {
            host: self.host.clone(),
            source,
        })?;
        parsed
            .join(CONSOLE_PATH)
            .map_err(|source| EndpointError::InvalidHost {
                host: self.host.clone(),
                source,
            })
    }
}

impl fmt::Display for ManagementEndpoint {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Bare IPv6 literals need brackets to form a valid authority.
        if self.host.contains(':') && !self.host.starts_with('[') {
            write!(formatter, "http://[{}]:{}", self.host, self.port)
        } else {
            write!(formatter, "http://{}:{}", self.host, self.port)
        }
    }
}

/// Errors raised while resolving the console URL.
#[derive(Debug, Error)]
pub enum EndpointError {
    /// The host could not form a valid HTTP URL.
    #[error("invalid management host '{host}': {source}")]
    InvalidHost {
        host: String,
        #[source]
        source: url::ParseError,
    },
}
