//! HTTP transport for the JMX console.

use std::time::Duration;

use jboss_config::ManagementEndpoint;
use reqwest::blocking::Client;
use tracing::{debug, warn};
use url::Url;

use super::error::ControlError;
use super::request::ManagementRequest;
use super::{CONTROL_TARGET, ManagementClient};

/// Default bound on a single management call.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Posts form-encoded requests to the console adaptor and returns the body.
#[derive(Debug, Clone)]
pub struct HttpConsole {
    client: Client,
    url: Url,
}

impl HttpConsole {
    /// Builds a console client for `endpoint` with a per-call `timeout`.
    pub fn new(endpoint: &ManagementEndpoint, timeout: Duration) -> Result<Self, ControlError> {
        let url = endpoint.console_url()?;
        // The console normally lives on the local machine; an ambient
        // HTTP_PROXY must not intercept it.
        let client = Client::builder()
            .timeout(timeout)
            .no_proxy()
            .build()
            .map_err(|source| ControlError::Client { source })?;
        Ok(Self { client, url })
    }

    /// URL requests are posted to.
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }
}

impl ManagementClient for HttpConsole {
    fn call(&self, request: &ManagementRequest) -> Result<String, ControlError> {
        debug!(
            target: CONTROL_TARGET,
            action = %request.action(),
            bean = request.target(),
            method = ?request.method(),
            "issuing management call"
        );
        let transport = |source| ControlError::Transport {
            url: self.url.to_string(),
            source,
        };
        let response = self
            .client
            .post(self.url.clone())
            .form(&request.form())
            .send()
            .map_err(transport)?;
        let status = response.status();
        let body = response.text().map_err(transport)?;
        if !status.is_success() {
            warn!(
                target: CONTROL_TARGET,
                status = status.as_u16(),
                body = %body,
                "management console rejected call"
            );
            return Err(ControlError::Status {
                url: self.url.to_string(),
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}
