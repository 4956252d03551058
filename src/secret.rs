use std::fmt;

/// A wrapper that keeps credentials out of logs and error output.
///
/// The identity backend's public API key is held in a `Secret` inside the
/// [`EnvironmentSnapshot`](crate::EnvironmentSnapshot). Because the snapshot
/// is logged at startup and shows up in `Debug` output, the key itself must
/// never be rendered.
///
/// # Examples
///
/// ```
/// use auth_gate::Secret;
///
/// let key = Secret::new("anon-key-123".to_string());
///
/// assert_eq!(format!("{:?}", key), "[REDACTED]");
/// assert_eq!(format!("{}", key), "[REDACTED]");
/// assert_eq!(key.expose_secret(), "anon-key-123");
/// ```
// Do NOT derive Debug, Display or Default: they would render or fabricate the value.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret<T> {
    // Must remain private; access goes through expose_secret().
    inner: T,
}

impl<T> Secret<T> {
    /// Wraps a sensitive value.
    pub fn new(value: T) -> Self {
        Self { inner: value }
    }

    /// Explicitly exposes the wrapped value.
    ///
    /// The verbose name is deliberate. Never pass the result to a logger.
    pub fn expose_secret(&self) -> &T {
        &self.inner
    }
}

impl<T> fmt::Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl<T> fmt::Display for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_redacts_debug() {
        let key = Secret::new("eyJhbGciOi.public".to_string());
        let debug_output = format!("{:?}", key);

        assert_eq!(debug_output, "[REDACTED]");
        assert!(!debug_output.contains("eyJ"));
        assert!(!debug_output.contains("String")); // No type leak
    }

    #[test]
    fn secret_redacts_inside_containers() {
        let key = Some(Secret::new("sk-1234567890"));
        let debug_output = format!("{:?}", key);

        assert_eq!(debug_output, "Some([REDACTED])");
    }

    #[test]
    fn secret_exposes_when_explicit() {
        let key = Secret::new("abc".to_string());
        assert_eq!(key.expose_secret(), "abc");
    }
}
