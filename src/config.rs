use thiserror::Error;

use crate::route::{InfraExclusions, RouteAllowlist, RouteClass};

const DEFAULT_LOGIN_PATH: &str = "/login";

/// Routing configuration injected into the [`GateController`](crate::GateController).
///
/// Built once at process start and never mutated afterwards. The defaults
/// are the compiled-in allowlist and exclusions.
///
/// # Examples
///
/// ```
/// use auth_gate::{GateConfig, RouteClass};
///
/// let config = GateConfig::builder()
///     .public_prefix("/invite")
///     .build()
///     .expect("login path is public");
///
/// assert_eq!(config.allowlist().classify("/invite/abc"), RouteClass::Public);
/// assert_eq!(config.allowlist().classify("/login"), RouteClass::Public);
/// assert_eq!(config.login_path(), "/login");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateConfig {
    allowlist: RouteAllowlist,
    exclusions: InfraExclusions,
    login_path: String,
}

impl GateConfig {
    /// Starts a builder seeded with the compiled-in defaults.
    pub fn builder() -> GateConfigBuilder {
        GateConfigBuilder {
            allowlist: RouteAllowlist::default(),
            exclusions: InfraExclusions::default(),
            login_path: DEFAULT_LOGIN_PATH.to_string(),
        }
    }

    /// Returns the public route allowlist.
    pub fn allowlist(&self) -> &RouteAllowlist {
        &self.allowlist
    }

    /// Returns the infrastructure exclusions.
    pub fn exclusions(&self) -> &InfraExclusions {
        &self.exclusions
    }

    /// Returns the login page path used for redirects.
    pub fn login_path(&self) -> &str {
        &self.login_path
    }
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            allowlist: RouteAllowlist::default(),
            exclusions: InfraExclusions::default(),
            login_path: DEFAULT_LOGIN_PATH.to_string(),
        }
    }
}

/// Builder for [`GateConfig`].
#[derive(Debug, Clone)]
pub struct GateConfigBuilder {
    allowlist: RouteAllowlist,
    exclusions: InfraExclusions,
    login_path: String,
}

impl GateConfigBuilder {
    /// Replaces the allowlist entirely.
    pub fn allowlist(mut self, allowlist: RouteAllowlist) -> Self {
        self.allowlist = allowlist;
        self
    }

    /// Adds one public prefix to the allowlist.
    pub fn public_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.allowlist.push(prefix);
        self
    }

    /// Replaces the infrastructure exclusions.
    pub fn exclusions(mut self, exclusions: InfraExclusions) -> Self {
        self.exclusions = exclusions;
        self
    }

    /// Sets the login page path.
    pub fn login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = path.into();
        self
    }

    /// Validates and builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the login path is not absolute or is not
    /// covered by the allowlist. A protected login page would redirect to
    /// itself forever.
    pub fn build(self) -> Result<GateConfig, ConfigError> {
        if !self.login_path.starts_with('/') {
            return Err(ConfigError::LoginPathNotAbsolute(self.login_path));
        }
        let login_route = self
            .login_path
            .split_once('?')
            .map_or(self.login_path.as_str(), |(path, _)| path);
        if self.allowlist.classify(login_route) != RouteClass::Public {
            return Err(ConfigError::LoginPathNotPublic(self.login_path));
        }

        Ok(GateConfig {
            allowlist: self.allowlist,
            exclusions: self.exclusions,
            login_path: self.login_path,
        })
    }
}

/// Invalid gate configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The login path does not start with `/`.
    #[error("login path must be absolute, got '{0}'")]
    LoginPathNotAbsolute(String),
    /// The login path would itself be gated.
    #[error("login path '{0}' is not covered by the public allowlist")]
    LoginPathNotPublic(String),
}
