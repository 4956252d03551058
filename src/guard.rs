use crate::bypass::is_bypass_permitted;
use crate::disposition::{GateDisposition, Rejection, SERVICE_UNAVAILABLE};
use crate::env::{
    EnvironmentSnapshot, DEV_BYPASS_VAR, IDENTITY_BACKEND_PUBLIC_KEY_VAR,
    IDENTITY_BACKEND_URL_VAR, RUNTIME_MODE_VAR,
};
use crate::mutation::ResponseMutations;

/// Result of checking whether the identity backend is usable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// The backend is configured; evaluation continues.
    Configured,
    /// The backend is not configured; this is the final disposition.
    Unconfigured(GateDisposition),
}

/// Returns true when the identity backend URL and public key are both set.
pub fn identity_backend_configured(env: &EnvironmentSnapshot) -> bool {
    env.identity_backend_configured()
}

/// Checks backend configuration and settles unconfigured requests.
///
/// When the backend is not configured the session resolver must not be
/// called. The request is allowed only if the development bypass is
/// permitted; otherwise it is rejected with 503 and a message explaining how
/// to fix the deployment. There is no other outcome.
///
/// The decision itself is logged by the controller with the request id.
///
/// # Examples
///
/// ```
/// use auth_gate::{
///     check_configuration, EnvironmentSnapshot, GateDisposition, GuardDecision, RuntimeMode,
/// };
///
/// let prod = EnvironmentSnapshot::new(RuntimeMode::Production, false, None, None);
/// match check_configuration(&prod) {
///     GuardDecision::Unconfigured(GateDisposition::Reject(rejection)) => {
///         assert_eq!(rejection.status(), 503);
///     }
///     other => panic!("expected rejection, got {other:?}"),
/// }
/// ```
pub fn check_configuration(env: &EnvironmentSnapshot) -> GuardDecision {
    if identity_backend_configured(env) {
        return GuardDecision::Configured;
    }

    if is_bypass_permitted(env) {
        return GuardDecision::Unconfigured(GateDisposition::Allow(ResponseMutations::new()));
    }

    GuardDecision::Unconfigured(GateDisposition::Reject(Rejection::new(
        SERVICE_UNAVAILABLE,
        remediation_message(),
    )))
}

fn remediation_message() -> String {
    format!(
        "Authentication is unavailable: the identity backend is not configured. \
         Set {IDENTITY_BACKEND_URL_VAR} and {IDENTITY_BACKEND_PUBLIC_KEY_VAR}, \
         or for local development only set {RUNTIME_MODE_VAR}=development \
         and {DEV_BYPASS_VAR}=true."
    )
}

#[cfg(test)]
mod tests {
    use tracing::Level;

    use super::*;
    use crate::env::RuntimeMode;
    use crate::logging::LevelRecorder;

    fn unconfigured(mode: RuntimeMode, flag: bool) -> EnvironmentSnapshot {
        EnvironmentSnapshot::new(mode, flag, None, None)
    }

    #[test]
    fn configured_backend_passes_through() {
        let env = EnvironmentSnapshot::new(
            RuntimeMode::Production,
            false,
            Some("https://id.example.com".to_string()),
            Some("key".to_string()),
        );

        assert_eq!(check_configuration(&env), GuardDecision::Configured);
    }

    #[test]
    fn configured_backend_ignores_bypass() {
        let env = EnvironmentSnapshot::new(
            RuntimeMode::Development,
            true,
            Some("https://id.example.com".to_string()),
            Some("key".to_string()),
        );

        assert_eq!(check_configuration(&env), GuardDecision::Configured);
    }

    #[test]
    fn unconfigured_with_bypass_allows_without_mutations() {
        let decision = check_configuration(&unconfigured(RuntimeMode::Development, true));

        assert_eq!(
            decision,
            GuardDecision::Unconfigured(GateDisposition::Allow(ResponseMutations::new()))
        );
    }

    #[test]
    fn unconfigured_without_bypass_rejects() {
        for (mode, flag) in [
            (RuntimeMode::Development, false),
            (RuntimeMode::Production, true),
            (RuntimeMode::Production, false),
            (RuntimeMode::Other, true),
        ] {
            match check_configuration(&unconfigured(mode, flag)) {
                GuardDecision::Unconfigured(GateDisposition::Reject(rejection)) => {
                    assert_eq!(rejection.status(), 503);
                }
                other => panic!("{mode} flag={flag}: unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn bypass_decision_warns_once() {
        let recorder = LevelRecorder::default();

        recorder.record(|| check_configuration(&unconfigured(RuntimeMode::Development, true)));

        // Only the bypass policy's own warning; the controller adds the request-scoped one.
        assert_eq!(recorder.count(Level::WARN), 1);
        assert_eq!(recorder.count(Level::ERROR), 0);
    }

    #[test]
    fn rejection_is_left_to_the_controller_to_log() {
        let recorder = LevelRecorder::default();

        recorder.record(|| check_configuration(&unconfigured(RuntimeMode::Production, false)));

        assert_eq!(recorder.count(Level::WARN), 0);
        assert_eq!(recorder.count(Level::ERROR), 0);
    }

    #[test]
    fn remediation_names_every_variable() {
        let message = remediation_message();

        assert!(message.contains(IDENTITY_BACKEND_URL_VAR));
        assert!(message.contains(IDENTITY_BACKEND_PUBLIC_KEY_VAR));
        assert!(message.contains(RUNTIME_MODE_VAR));
        assert!(message.contains(DEV_BYPASS_VAR));
    }
}
