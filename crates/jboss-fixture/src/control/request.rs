//! Outbound management requests.
//!
//! A request names an action understood by the JMX console adaptor, the
//! management bean it targets, and a flat set of string parameters. Requests
//! are built per call and never stored.

use std::collections::BTreeMap;
use std::fmt;

use url::Url;

use super::error::ControlError;

/// Management bean exposing the server's state and shutdown operation.
pub const SERVER_BEAN: &str = "jboss.system:type=Server";

/// Management bean responsible for (re)deploying artifacts.
pub const DEPLOYER_BEAN: &str = "jboss.system:service=MainDeployer";

const SHUTDOWN_METHOD: &str = "shutdown";
const URL_ARG_TYPE: &str = "java.net.URL";

/// Actions accepted by the console adaptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Invoke a named operation on a bean.
    InvokeOperation,
    /// Render a bean's attributes.
    InspectBean,
}

impl Action {
    /// Wire name of the action.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvokeOperation => "invokeOpByName",
            Self::InspectBean => "inspectMBean",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Deployer operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeploymentAction {
    /// Deploy the artifact, replacing any previous deployment of it.
    Deploy,
    /// Remove the artifact.
    Undeploy,
}

impl DeploymentAction {
    /// Operation name invoked on the deployer bean.
    #[must_use]
    pub const fn method_name(self) -> &'static str {
        match self {
            Self::Deploy => "redeploy",
            Self::Undeploy => "undeploy",
        }
    }
}

impl fmt::Display for DeploymentAction {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deploy => formatter.write_str("deploy"),
            Self::Undeploy => formatter.write_str("undeploy"),
        }
    }
}

/// A single call to the management console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagementRequest {
    action: Action,
    target: String,
    params: BTreeMap<&'static str, String>,
}

impl ManagementRequest {
    /// Requests the attribute page of `target`.
    pub fn inspect(target: impl Into<String>) -> Result<Self, ControlError> {
        let target = non_empty(target.into(), "target bean must not be empty")?;
        Ok(Self::from_parts(Action::InspectBean, target))
    }

    /// Invokes the parameterless operation `method` on `target`.
    pub fn invoke(
        target: impl Into<String>,
        method: impl Into<String>,
    ) -> Result<Self, ControlError> {
        let target = non_empty(target.into(), "target bean must not be empty")?;
        let method = non_empty(method.into(), "operation name must not be empty")?;
        let mut request = Self::from_parts(Action::InvokeOperation, target);
        request.params.insert("methodName", method);
        Ok(request)
    }

    /// Invokes `method` on `target` with a single URL argument.
    pub fn invoke_with_url(
        target: impl Into<String>,
        method: impl Into<String>,
        url: &Url,
    ) -> Result<Self, ControlError> {
        let mut request = Self::invoke(target, method)?;
        request.params.insert("argType", URL_ARG_TYPE.to_string());
        request.params.insert("arg0", url.to_string());
        Ok(request)
    }

    /// Inspects the server bean; its `Started` attribute signals readiness.
    ///
    /// # Errors
    ///
    /// Never fails in practice; the bean name is validated like any other.
    pub fn server_status() -> Result<Self, ControlError> {
        Self::inspect(SERVER_BEAN)
    }

    /// Asks the server bean to shut down cleanly.
    ///
    /// # Errors
    ///
    /// As for [`ManagementRequest::server_status`].
    pub fn server_shutdown() -> Result<Self, ControlError> {
        Self::invoke(SERVER_BEAN, SHUTDOWN_METHOD)
    }

    /// Runs a deployer operation against `url`.
    ///
    /// # Errors
    ///
    /// As for [`ManagementRequest::server_status`].
    pub fn deployer(action: DeploymentAction, url: &Url) -> Result<Self, ControlError> {
        Self::invoke_with_url(DEPLOYER_BEAN, action.method_name(), url)
    }

    fn from_parts(action: Action, target: String) -> Self {
        Self {
            action,
            target,
            params: BTreeMap::new(),
        }
    }

    /// Console action this request performs.
    #[must_use]
    pub const fn action(&self) -> Action {
        self.action
    }

    /// Name of the targeted management bean.
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Operation name for invoke requests.
    #[must_use]
    pub fn method(&self) -> Option<&str> {
        self.param("methodName")
    }

    /// Value of the form parameter `name`, if set.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Form fields sent to the console: `action`, `name`, then the parameters.
    #[must_use]
    pub fn form(&self) -> Vec<(&str, &str)> {
        let mut fields = Vec::with_capacity(self.params.len() + 2);
        fields.push(("action", self.action.as_str()));
        fields.push(("name", self.target.as_str()));
        fields.extend(
            self.params
                .iter()
                .map(|(name, value)| (*name, value.as_str())),
        );
        fields
    }
}

fn non_empty(value: String, reason: &'static str) -> Result<String, ControlError> {
    if value.trim().is_empty() {
        return Err(ControlError::InvalidRequest { reason });
    }
    Ok(value)
}
