//! Deployer that pushes configuration to the Ultron Eye server over HTTP.

use std::{fmt, time::Duration};

use async_trait::async_trait;
use hyper::body::to_bytes;
use hyper::header::{AUTHORIZATION, CONTENT_TYPE};
use hyper::{Body, Request, StatusCode, Uri};
use serde::Deserialize;
use tokio::time::timeout;
use tracing::{info, warn};

use crate::deploy::{DeployError, DeployReceipt, DeployRequest, DeployResult, Deployer};
use crate::http_client::{HyperClient, build_deploy_client};

const DEPLOY_PATH: &str = "api/v1/config/deploy";

/// Settings for [`HttpDeployer`].
#[derive(Clone)]
pub struct HttpDeployerConfig {
    base_url: String,
    api_token: Option<String>,
    timeout: Duration,
}

impl fmt::Debug for HttpDeployerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpDeployerConfig")
            .field("base_url", &self.base_url)
            .field("api_token", &self.api_token.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl HttpDeployerConfig {
    /// Creates a configuration targeting the given server root.
    ///
    /// # Errors
    ///
    /// Returns [`DeployError::Rejected`] when the URL is empty or lacks an
    /// `http`/`https` scheme.
    pub fn new(base_url: impl AsRef<str>) -> DeployResult<Self> {
        Ok(Self {
            base_url: sanitize_base_url(base_url.as_ref())?,
            api_token: None,
            timeout: Duration::from_secs(30),
        })
    }

    /// Sends `Authorization: Bearer <token>` with every request.
    #[must_use]
    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the normalised base URL (always ends with `/`).
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Deployer backed by the server's configuration endpoint.
pub struct HttpDeployer {
    client: HyperClient,
    endpoint: Uri,
    api_token: Option<String>,
    timeout: Duration,
}

impl fmt::Debug for HttpDeployer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpDeployer")
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl HttpDeployer {
    /// Constructs a deployer from the supplied configuration.
    ///
    /// # Errors
    ///
    /// Returns [`DeployError::Rejected`] if the endpoint URI is invalid.
    #[allow(clippy::needless_pass_by_value)]
    pub fn new(config: HttpDeployerConfig) -> DeployResult<Self> {
        let endpoint = format!("{}{DEPLOY_PATH}", config.base_url)
            .parse::<Uri>()
            .map_err(|err| DeployError::rejected(format!("invalid deploy endpoint: {err}")))?;

        Ok(Self {
            client: build_deploy_client(config.timeout),
            endpoint,
            api_token: config.api_token.clone(),
            timeout: config.timeout,
        })
    }

    /// Returns the endpoint requests are posted to.
    #[must_use]
    pub fn endpoint(&self) -> &Uri {
        &self.endpoint
    }

    fn build_request(&self, request: &DeployRequest) -> DeployResult<Request<Body>> {
        let body = serde_json::to_vec(request)
            .map_err(|err| DeployError::rejected(format!("failed to encode request: {err}")))?;

        let mut builder = Request::post(self.endpoint.clone()).header(CONTENT_TYPE, "application/json");
        if let Some(token) = &self.api_token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }

        builder
            .body(Body::from(body))
            .map_err(|err| DeployError::network(format!("failed to build request: {err}")))
    }
}

#[async_trait]
impl Deployer for HttpDeployer {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn deploy(&self, request: DeployRequest) -> DeployResult<DeployReceipt> {
        let req = self.build_request(&request)?;

        let response = timeout(self.timeout, self.client.request(req))
            .await
            .map_err(|_| DeployError::network("deploy request timed out"))?
            .map_err(|err| DeployError::network(format!("deploy request failed: {err}")))?;

        let status = response.status();
        let bytes = to_bytes(response.into_body())
            .await
            .map_err(|err| DeployError::network(format!("failed to read response: {err}")))?;

        if !status.is_success() {
            let error = classify_status(status, &String::from_utf8_lossy(&bytes));
            warn!(deployment_id = %request.deployment_id(), %status, "server refused deployment");
            return Err(error);
        }

        let mut receipt = DeployReceipt::accepted(request.deployment_id());
        if let Ok(DeployResponse {
            message: Some(message),
        }) = serde_json::from_slice::<DeployResponse>(&bytes)
        {
            receipt = receipt.with_message(message);
        }

        info!(deployment_id = %request.deployment_id(), "server accepted deployment");
        Ok(receipt)
    }
}

#[derive(Debug, Deserialize)]
struct DeployResponse {
    #[serde(default)]
    message: Option<String>,
}

/// Maps a non-success status to the deployment error taxonomy.
fn classify_status(status: StatusCode, body: &str) -> DeployError {
    let reason = if body.trim().is_empty() {
        status.to_string()
    } else {
        format!("{status}: {}", body.trim())
    };

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => DeployError::Unauthorized { reason },
        s if s.is_client_error() => DeployError::Rejected { reason },
        _ => DeployError::Network { reason },
    }
}

fn sanitize_base_url(base_url: &str) -> DeployResult<String> {
    let trimmed = base_url.trim();
    if trimmed.is_empty() {
        return Err(DeployError::rejected("server url cannot be empty"));
    }
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(DeployError::rejected(format!(
            "server url must start with http:// or https://: {trimmed}"
        )));
    }

    let mut url = trimmed.to_owned();
    if !url.ends_with('/') {
        url.push('/');
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use eye_primitives::DeploymentId;

    use super::*;

    #[test]
    fn base_url_gains_trailing_slash() {
        let config = HttpDeployerConfig::new(" http://localhost:8000 ").unwrap();
        assert_eq!(config.base_url(), "http://localhost:8000/");
    }

    #[test]
    fn base_url_requires_scheme() {
        assert!(HttpDeployerConfig::new("localhost:8000").is_err());
        assert!(HttpDeployerConfig::new("   ").is_err());
    }

    #[test]
    fn config_debug_redacts_token() {
        let config = HttpDeployerConfig::new("http://localhost:8000")
            .unwrap()
            .with_api_token("s3cret");
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("s3cret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[tokio::test]
    async fn request_targets_deploy_endpoint_with_token() {
        let config = HttpDeployerConfig::new("https://console.example.com/eye")
            .unwrap()
            .with_api_token("abc");
        let deployer = HttpDeployer::new(config).unwrap();
        assert_eq!(
            deployer.endpoint().to_string(),
            "https://console.example.com/eye/api/v1/config/deploy"
        );

        let request = DeployRequest::new(DeploymentId::random(), "agent:\n");
        let built = deployer.build_request(&request).unwrap();
        assert_eq!(built.headers()[AUTHORIZATION], "Bearer abc");
        assert_eq!(built.headers()[CONTENT_TYPE], "application/json");
    }

    #[test]
    fn statuses_map_to_taxonomy() {
        assert!(matches!(
            classify_status(StatusCode::UNAUTHORIZED, ""),
            DeployError::Unauthorized { .. }
        ));
        assert!(matches!(
            classify_status(StatusCode::FORBIDDEN, "nope"),
            DeployError::Unauthorized { .. }
        ));
        assert!(matches!(
            classify_status(StatusCode::UNPROCESSABLE_ENTITY, "bad yaml"),
            DeployError::Rejected { reason } if reason.contains("bad yaml")
        ));
        assert!(matches!(
            classify_status(StatusCode::BAD_GATEWAY, ""),
            DeployError::Network { .. }
        ));
    }
}
