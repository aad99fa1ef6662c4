//! Session settings and their sources.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::error::{ConfigError, ConfigResult};

/// Prefix shared by every environment variable read by [`WorkflowSettings::from_env`].
pub const ENV_PREFIX: &str = "ULTRON_";

/// Tunables for one configuration workflow session.
#[derive(Clone, PartialEq, Eq)]
pub struct WorkflowSettings {
    deploy_delay: Duration,
    copied_indicator: Duration,
    request_timeout: Duration,
    server_url: Option<String>,
    operator: String,
    api_token: Option<String>,
}

impl fmt::Debug for WorkflowSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkflowSettings")
            .field("deploy_delay", &self.deploy_delay)
            .field("copied_indicator", &self.copied_indicator)
            .field("request_timeout", &self.request_timeout)
            .field("server_url", &self.server_url)
            .field("operator", &self.operator)
            .field("api_token", &self.api_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            deploy_delay: Duration::from_millis(2000),
            copied_indicator: Duration::from_millis(2000),
            request_timeout: Duration::from_secs(30),
            server_url: None,
            operator: "admin@company.com".to_owned(),
            api_token: None,
        }
    }
}

impl WorkflowSettings {
    /// Reads `ULTRON_*` variables from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when a numeric variable does not
    /// parse.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from an arbitrary key lookup, applying defaults for
    /// missing keys. Keys are the full variable names, e.g.
    /// `ULTRON_DEPLOY_DELAY_MS`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when a numeric value does not
    /// parse.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(&format!("{ENV_PREFIX}{name}"))
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
        };
        let millis = |name: &str| -> ConfigResult<Option<u64>> {
            get(name)
                .map(|raw| {
                    raw.parse::<u64>().map_err(|err| ConfigError::InvalidValue {
                        key: format!("{ENV_PREFIX}{name}"),
                        reason: err.to_string(),
                    })
                })
                .transpose()
        };

        let overrides = SettingsFile {
            deploy_delay_ms: millis("DEPLOY_DELAY_MS")?,
            copied_indicator_ms: millis("COPIED_INDICATOR_MS")?,
            request_timeout_ms: millis("REQUEST_TIMEOUT_MS")?,
            server_url: get("SERVER_URL"),
            operator: get("OPERATOR"),
            api_token: get("API_TOKEN"),
        };

        let settings = Self::default().merge(overrides);
        debug!(?settings, "loaded settings from environment");
        Ok(settings)
    }

    /// Loads settings from a JSON file; absent fields keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the file cannot be read and
    /// [`ConfigError::Parse`] when it is not valid settings JSON.
    pub fn from_json_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    /// Parses settings from JSON text; absent fields keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the text is not valid settings JSON.
    pub fn from_json_str(raw: &str) -> ConfigResult<Self> {
        let file: SettingsFile = serde_json::from_str(raw)?;
        Ok(Self::default().merge(file))
    }

    /// Overrides the simulated deploy delay.
    #[must_use]
    pub fn with_deploy_delay(mut self, delay: Duration) -> Self {
        self.deploy_delay = delay;
        self
    }

    /// Overrides how long the "copied" indicator stays lit.
    #[must_use]
    pub fn with_copied_indicator(mut self, duration: Duration) -> Self {
        self.copied_indicator = duration;
        self
    }

    /// Sets the server receiving deployments.
    #[must_use]
    pub fn with_server_url(mut self, url: impl Into<String>) -> Self {
        self.server_url = Some(url.into());
        self
    }

    /// Sets the operator recorded in deployment history.
    #[must_use]
    pub fn with_operator(mut self, operator: impl Into<String>) -> Self {
        self.operator = operator.into();
        self
    }

    /// Delay used by the simulated deployer.
    #[must_use]
    pub const fn deploy_delay(&self) -> Duration {
        self.deploy_delay
    }

    /// Lifetime of the "copied" indicator.
    #[must_use]
    pub const fn copied_indicator(&self) -> Duration {
        self.copied_indicator
    }

    /// Timeout for HTTP deploy requests.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Server root for live deployments; `None` means simulate.
    #[must_use]
    pub fn server_url(&self) -> Option<&str> {
        self.server_url.as_deref()
    }

    /// Operator identity recorded alongside deployments.
    #[must_use]
    pub fn operator(&self) -> &str {
        &self.operator
    }

    /// Bearer token for the deploy endpoint.
    #[must_use]
    pub fn api_token(&self) -> Option<&str> {
        self.api_token.as_deref()
    }

    fn merge(mut self, file: SettingsFile) -> Self {
        if let Some(ms) = file.deploy_delay_ms {
            self.deploy_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = file.copied_indicator_ms {
            self.copied_indicator = Duration::from_millis(ms);
        }
        if let Some(ms) = file.request_timeout_ms {
            self.request_timeout = Duration::from_millis(ms);
        }
        if file.server_url.is_some() {
            self.server_url = file.server_url;
        }
        if let Some(operator) = file.operator {
            self.operator = operator;
        }
        if file.api_token.is_some() {
            self.api_token = file.api_token;
        }
        self
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SettingsFile {
    #[serde(default)]
    deploy_delay_ms: Option<u64>,
    #[serde(default)]
    copied_indicator_ms: Option<u64>,
    #[serde(default)]
    request_timeout_ms: Option<u64>,
    #[serde(default)]
    server_url: Option<String>,
    #[serde(default)]
    operator: Option<String>,
    #[serde(default)]
    api_token: Option<String>,
}
