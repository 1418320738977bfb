//! Device sessions over the Junos REST API.

use std::future::Future;
use std::time::Duration;

use reqwest::{StatusCode, Url, header};
use tracing::{debug, trace};

use crate::config::ModuleConfig;
use crate::document::{DocumentError, Element};

/// Error type for device session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Invalid target '{target}': {reason}")]
    InvalidTarget { target: String, reason: String },
    #[error("Connection failed: {0}")]
    Connect(String),
    #[error("Request timed out: {0}")]
    Timeout(String),
    #[error("Authentication failed for {target}")]
    Authentication { target: String },
    #[error("RPC {rpc} failed with HTTP {status}: {message}")]
    Rpc {
        rpc: &'static str,
        status: u16,
        message: String,
    },
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Malformed reply: {0}")]
    Document(#[from] DocumentError),
}

impl From<reqwest::Error> for SessionError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            SessionError::Timeout(e.to_string())
        } else if e.is_connect() {
            SessionError::Connect(e.to_string())
        } else {
            SessionError::Transport(e.to_string())
        }
    }
}

/// Operational RPCs the exporter issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rpc {
    InterfaceInformation,
    EnvironmentInformation,
    VirtualChassisInformation,
    VirtualChassisPortInformation,
    RouteEngineInformation,
    SystemStorage,
    BgpSummaryInformation,
}

impl Rpc {
    /// The Junos RPC name.
    pub fn name(&self) -> &'static str {
        match self {
            Rpc::InterfaceInformation => "get-interface-information",
            Rpc::EnvironmentInformation => "get-environment-information",
            Rpc::VirtualChassisInformation => "get-virtual-chassis-information",
            Rpc::VirtualChassisPortInformation => "get-virtual-chassis-port-information",
            Rpc::RouteEngineInformation => "get-route-engine-information",
            Rpc::SystemStorage => "get-system-storage",
            Rpc::BgpSummaryInformation => "get-bgp-summary-information",
        }
    }

    /// RPC arguments as name/value pairs; flags have an empty value.
    pub fn parameters(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            Rpc::InterfaceInformation => &[("extensive", "")],
            _ => &[],
        }
    }
}

/// An open session to one device.
pub trait DeviceSession: Send {
    /// Issue an RPC and return the root element of its reply.
    fn rpc(&mut self, rpc: Rpc) -> impl Future<Output = Result<Element, SessionError>> + Send;

    /// Release the session.
    fn close(self) -> impl Future<Output = ()> + Send;
}

/// Opens device sessions.
pub trait Connector: Send + Sync + 'static {
    type Session: DeviceSession;

    /// Open a session to `target` with the module's credentials and transport.
    fn open(
        &self,
        target: &str,
        module: &ModuleConfig,
    ) -> impl Future<Output = Result<Self::Session, SessionError>> + Send;
}

/// Connector for the Junos REST API.
#[derive(Debug, Clone, Default)]
pub struct RestConnector;

impl RestConnector {
    pub fn new() -> Self {
        Self
    }
}

impl Connector for RestConnector {
    type Session = RestSession;

    async fn open(&self, target: &str, module: &ModuleConfig) -> Result<RestSession, SessionError> {
        let base = base_url(target, module)?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(module.rest.timeout_secs))
            .danger_accept_invalid_certs(module.rest.skip_verify)
            .build()
            .map_err(|e| SessionError::Transport(e.to_string()))?;

        debug!(device = %target, url = %base, "Opened device session");

        Ok(RestSession {
            client,
            base,
            target: target.to_string(),
            username: module.auth.username.clone(),
            password: module.auth.password.clone(),
        })
    }
}

/// Build `<scheme>://<target>[:port]/rpc/` for a target, applying the
/// module port when the target carries none.
fn base_url(target: &str, module: &ModuleConfig) -> Result<Url, SessionError> {
    let invalid = |reason: String| SessionError::InvalidTarget {
        target: target.to_string(),
        reason,
    };

    if target.is_empty() || target.contains('/') {
        return Err(invalid("expected host or host:port".to_string()));
    }

    let mut url = Url::parse(&format!("{}://{}/rpc/", module.rest.scheme.as_str(), target))
        .map_err(|e| invalid(e.to_string()))?;

    if url.host_str().is_none() {
        return Err(invalid("missing host".to_string()));
    }

    if url.port().is_none() {
        url.set_port(Some(module.rest.port))
            .map_err(|_| invalid("cannot set port".to_string()))?;
    }

    Ok(url)
}

/// A session to one device over the REST API.
#[derive(Debug)]
pub struct RestSession {
    client: reqwest::Client,
    base: Url,
    target: String,
    username: String,
    password: String,
}

impl RestSession {
    fn rpc_url(&self, rpc: Rpc) -> Result<Url, SessionError> {
        let mut url = self
            .base
            .join(rpc.name())
            .map_err(|e| SessionError::Transport(e.to_string()))?;

        let parameters = rpc.parameters();
        if !parameters.is_empty() {
            url.query_pairs_mut().extend_pairs(parameters.iter());
        }
        Ok(url)
    }
}

impl DeviceSession for RestSession {
    async fn rpc(&mut self, rpc: Rpc) -> Result<Element, SessionError> {
        let url = self.rpc_url(rpc)?;
        trace!(device = %self.target, rpc = rpc.name(), url = %url, "Issuing RPC");

        let response = self
            .client
            .get(url)
            .basic_auth(&self.username, Some(&self.password))
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(SessionError::Authentication {
                target: self.target.clone(),
            });
        }

        let body = response.text().await?;
        if !status.is_success() {
            return Err(SessionError::Rpc {
                rpc: rpc.name(),
                status: status.as_u16(),
                message: body.trim().chars().take(200).collect(),
            });
        }

        Ok(Element::parse(&body)?)
    }

    async fn close(self) {
        // The REST API is stateless; dropping the client releases pooled connections
        debug!(device = %self.target, "Closed device session");
    }
}
