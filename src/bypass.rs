use crate::env::{EnvironmentSnapshot, RuntimeMode};

/// Decides whether the developer bypass is currently permitted.
///
/// Returns true only when the runtime mode is development **and** the bypass
/// flag is set. Either condition alone is not enough. The snapshot is
/// consulted on every call; the result is never cached.
///
/// A permitted bypass is logged at warn level.
///
/// # Examples
///
/// ```
/// use auth_gate::{is_bypass_permitted, EnvironmentSnapshot, RuntimeMode};
///
/// let dev_with_flag = EnvironmentSnapshot::new(RuntimeMode::Development, true, None, None);
/// assert!(is_bypass_permitted(&dev_with_flag));
///
/// let dev_without_flag = EnvironmentSnapshot::new(RuntimeMode::Development, false, None, None);
/// assert!(!is_bypass_permitted(&dev_without_flag));
///
/// let prod_with_flag = EnvironmentSnapshot::new(RuntimeMode::Production, true, None, None);
/// assert!(!is_bypass_permitted(&prod_with_flag));
/// ```
pub fn is_bypass_permitted(env: &EnvironmentSnapshot) -> bool {
    let permitted = env.runtime_mode() == RuntimeMode::Development && env.dev_bypass_flag();
    if permitted {
        tracing::warn!(
            runtime_mode = %env.runtime_mode(),
            "development auth bypass is active; requests are not authenticated"
        );
    }
    permitted
}
