//! Management console client.
//!
//! Every control operation is a single synchronous request/response exchange
//! with the server's JMX console:
//! - [`request`] builds the outbound calls.
//! - [`response`] classifies bodies as successful or started.
//! - [`http`] carries calls over HTTP.
//! - [`artifact`] interprets deployable locations.

mod artifact;
mod error;
mod http;
mod request;
mod response;

pub use artifact::{Artifact, ArtifactError};
pub use error::ControlError;
pub use http::{DEFAULT_REQUEST_TIMEOUT, HttpConsole};
pub use request::{
    Action, DEPLOYER_BEAN, DeploymentAction, ManagementRequest, SERVER_BEAN,
};
pub use response::{JmxConsoleStatus, ManagementResponse, SUCCESS_MARKER, StatusParser};

#[cfg(test)]
pub(crate) use response::fixtures;

pub(crate) const CONTROL_TARGET: &str = concat!(env!("CARGO_CRATE_NAME"), "::control");

/// Sends one management request and returns the response body.
///
/// Implementations fail only when the exchange itself fails; whether the
/// server carried out the operation is decided from the body.
pub trait ManagementClient: Send + Sync {
    /// Performs `request`, returning the raw page on any 2xx response.
    fn call(&self, request: &ManagementRequest) -> Result<String, ControlError>;
}

/// Asks the console whether the server has finished booting.
pub fn check_started(
    client: &dyn ManagementClient,
    parser: &dyn StatusParser,
) -> Result<bool, ControlError> {
    let body = client.call(&ManagementRequest::server_status()?)?;
    Ok(ManagementResponse::new(body).is_started(parser))
}

/// Requests a clean shutdown; `false` means the server declined.
pub fn request_shutdown(client: &dyn ManagementClient) -> Result<bool, ControlError> {
    let body = client.call(&ManagementRequest::server_shutdown()?)?;
    Ok(ManagementResponse::new(body).is_success())
}

/// Runs a deployer operation; `false` means the server declined.
pub fn invoke_deployer(
    client: &dyn ManagementClient,
    action: DeploymentAction,
    artifact: &Artifact,
) -> Result<bool, ControlError> {
    let body = client.call(&ManagementRequest::deployer(action, artifact.url())?)?;
    Ok(ManagementResponse::new(body).is_success())
}
