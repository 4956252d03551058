//! Process environment snapshot.
//!
//! The snapshot is derived once from environment variables at process start
//! and shared read-only by every request. Nothing in the gate mutates it.

use std::fmt;

use crate::secret::Secret;

/// Environment variable holding the identity backend endpoint URL.
pub const IDENTITY_BACKEND_URL_VAR: &str = "IDENTITY_BACKEND_URL";
/// Environment variable holding the identity backend public API key.
pub const IDENTITY_BACKEND_PUBLIC_KEY_VAR: &str = "IDENTITY_BACKEND_PUBLIC_KEY";
/// Environment variable naming the runtime mode.
pub const RUNTIME_MODE_VAR: &str = "APP_ENV";
/// Environment variable enabling the development bypass.
pub const DEV_BYPASS_VAR: &str = "DEV_AUTH_BYPASS";

/// Runtime mode of the hosting process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuntimeMode {
    /// Local development (`APP_ENV=development`).
    Development,
    /// Production deployment (`APP_ENV=production`).
    Production,
    /// Anything else, including an unset variable.
    Other,
}

impl RuntimeMode {
    /// Parses a mode name. Matching is exact: `"Development"` is `Other`.
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("development") => RuntimeMode::Development,
            Some("production") => RuntimeMode::Production,
            _ => RuntimeMode::Other,
        }
    }
}

impl fmt::Display for RuntimeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeMode::Development => write!(f, "development"),
            RuntimeMode::Production => write!(f, "production"),
            RuntimeMode::Other => write!(f, "other"),
        }
    }
}

/// Read-only view of the configuration values the gate depends on.
///
/// # Examples
///
/// ```
/// use auth_gate::{EnvironmentSnapshot, RuntimeMode};
///
/// let env = EnvironmentSnapshot::from_lookup(|key| match key {
///     "IDENTITY_BACKEND_URL" => Some("https://id.example.com".to_string()),
///     "IDENTITY_BACKEND_PUBLIC_KEY" => Some("anon-key".to_string()),
///     "APP_ENV" => Some("production".to_string()),
///     _ => None,
/// });
///
/// assert_eq!(env.runtime_mode(), RuntimeMode::Production);
/// assert!(env.identity_backend_configured());
/// assert!(!env.dev_bypass_flag());
///
/// // The key never shows up in debug output
/// assert!(!format!("{:?}", env).contains("anon-key"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentSnapshot {
    runtime_mode: RuntimeMode,
    dev_bypass_flag: bool,
    identity_backend_url: Option<String>,
    identity_backend_public_key: Option<Secret<String>>,
}

impl EnvironmentSnapshot {
    /// Builds a snapshot from explicit values.
    pub fn new(
        runtime_mode: RuntimeMode,
        dev_bypass_flag: bool,
        identity_backend_url: Option<String>,
        identity_backend_public_key: Option<String>,
    ) -> Self {
        Self {
            runtime_mode,
            dev_bypass_flag,
            identity_backend_url,
            identity_backend_public_key: identity_backend_public_key.map(Secret::new),
        }
    }

    /// Reads the snapshot from the process environment.
    pub fn from_env() -> Self {
        let snapshot = Self::from_lookup(|key| std::env::var(key).ok());
        tracing::info!(
            runtime_mode = %snapshot.runtime_mode,
            dev_bypass_flag = snapshot.dev_bypass_flag,
            identity_backend_configured = snapshot.identity_backend_configured(),
            "environment snapshot loaded"
        );
        snapshot
    }

    /// Reads the snapshot through an arbitrary variable lookup.
    ///
    /// Only the exact string `"true"` enables the bypass flag.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let runtime_mode = RuntimeMode::parse(lookup(RUNTIME_MODE_VAR).as_deref());
        let dev_bypass_flag = lookup(DEV_BYPASS_VAR).as_deref() == Some("true");

        Self::new(
            runtime_mode,
            dev_bypass_flag,
            lookup(IDENTITY_BACKEND_URL_VAR),
            lookup(IDENTITY_BACKEND_PUBLIC_KEY_VAR),
        )
    }

    /// Returns the runtime mode.
    pub fn runtime_mode(&self) -> RuntimeMode {
        self.runtime_mode
    }

    /// Returns whether the development bypass flag is set.
    pub fn dev_bypass_flag(&self) -> bool {
        self.dev_bypass_flag
    }

    /// Returns the identity backend URL, if set.
    pub fn identity_backend_url(&self) -> Option<&str> {
        self.identity_backend_url.as_deref()
    }

    /// Returns the identity backend public key, if set.
    pub fn identity_backend_public_key(&self) -> Option<&Secret<String>> {
        self.identity_backend_public_key.as_ref()
    }

    /// True when both the endpoint URL and the public key are present and non-empty.
    pub fn identity_backend_configured(&self) -> bool {
        let url_present = self
            .identity_backend_url
            .as_deref()
            .is_some_and(|url| !url.trim().is_empty());
        let key_present = self
            .identity_backend_public_key
            .as_ref()
            .is_some_and(|key| !key.expose_secret().trim().is_empty());
        url_present && key_present
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn snapshot(vars: &[(&str, &str)]) -> EnvironmentSnapshot {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        EnvironmentSnapshot::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn runtime_mode_parsing_is_exact() {
        assert_eq!(RuntimeMode::parse(Some("development")), RuntimeMode::Development);
        assert_eq!(RuntimeMode::parse(Some("production")), RuntimeMode::Production);
        assert_eq!(RuntimeMode::parse(Some("Development")), RuntimeMode::Other);
        assert_eq!(RuntimeMode::parse(Some("dev")), RuntimeMode::Other);
        assert_eq!(RuntimeMode::parse(Some("test")), RuntimeMode::Other);
        assert_eq!(RuntimeMode::parse(None), RuntimeMode::Other);
    }

    #[test]
    fn bypass_flag_only_accepts_exact_true() {
        assert!(snapshot(&[(DEV_BYPASS_VAR, "true")]).dev_bypass_flag());

        for value in ["TRUE", "True", "1", "yes", "on", " true", ""] {
            assert!(!snapshot(&[(DEV_BYPASS_VAR, value)]).dev_bypass_flag(), "{value:?}");
        }
        assert!(!snapshot(&[]).dev_bypass_flag());
    }

    #[test]
    fn configured_requires_both_values() {
        let both = snapshot(&[
            (IDENTITY_BACKEND_URL_VAR, "https://id.example.com"),
            (IDENTITY_BACKEND_PUBLIC_KEY_VAR, "key"),
        ]);
        assert!(both.identity_backend_configured());

        let url_only = snapshot(&[(IDENTITY_BACKEND_URL_VAR, "https://id.example.com")]);
        assert!(!url_only.identity_backend_configured());

        let key_only = snapshot(&[(IDENTITY_BACKEND_PUBLIC_KEY_VAR, "key")]);
        assert!(!key_only.identity_backend_configured());
    }

    #[test]
    fn empty_values_count_as_missing() {
        let blank_url = snapshot(&[
            (IDENTITY_BACKEND_URL_VAR, ""),
            (IDENTITY_BACKEND_PUBLIC_KEY_VAR, "key"),
        ]);
        assert!(!blank_url.identity_backend_configured());

        let blank_key = snapshot(&[
            (IDENTITY_BACKEND_URL_VAR, "https://id.example.com"),
            (IDENTITY_BACKEND_PUBLIC_KEY_VAR, "   "),
        ]);
        assert!(!blank_key.identity_backend_configured());
    }

    #[test]
    fn debug_output_redacts_public_key() {
        let env = snapshot(&[
            (IDENTITY_BACKEND_URL_VAR, "https://id.example.com"),
            (IDENTITY_BACKEND_PUBLIC_KEY_VAR, "very-secret-key"),
        ]);

        let debug = format!("{:?}", env);
        assert!(!debug.contains("very-secret-key"));
        assert!(debug.contains("[REDACTED]"));
    }
}
